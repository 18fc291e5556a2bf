//! Product Categories
//!
//! A sorted, de-duplicated set of category slugs attached to products and cart items.

use std::{cmp::Ordering, string::ToString};

use smallvec::SmallVec;

/// A set of category slugs backed by `SmallVec<[String; 5]>`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Categories {
    slugs: SmallVec<[String; 5]>,
}

impl Categories {
    /// Create a new category set, sorting and de-duplicating the slugs.
    #[must_use]
    pub fn new(slugs: SmallVec<[String; 5]>) -> Self {
        let mut categories = Self { slugs };

        categories.slugs.sort();
        categories.slugs.dedup();

        categories
    }

    /// Create an empty category set.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            slugs: SmallVec::with_capacity(0),
        }
    }

    /// Create a category set from string slices.
    pub fn from_strs(slugs: &[&str]) -> Self {
        Self::new(
            slugs
                .iter()
                .map(ToString::to_string)
                .collect::<SmallVec<[String; 5]>>(),
        )
    }

    /// Returns the slugs in sorted order.
    #[must_use]
    pub fn to_strs(&self) -> SmallVec<[String; 5]> {
        self.slugs.clone()
    }

    /// Returns true if both sets share at least one slug.
    pub fn intersects(&self, other: &Self) -> bool {
        // Both sides are sorted, so walk them together.
        let mut left = self.slugs.iter();
        let mut right = other.slugs.iter();
        let mut left_slug = left.next();
        let mut right_slug = right.next();

        while let (Some(l), Some(r)) = (left_slug, right_slug) {
            match l.cmp(r) {
                Ordering::Equal => return true,
                Ordering::Less => left_slug = left.next(),
                Ordering::Greater => right_slug = right.next(),
            }
        }

        false
    }

    /// Returns true if the set contains the slug.
    pub fn contains(&self, slug: &str) -> bool {
        self.slugs
            .binary_search_by(|probe| probe.as_str().cmp(slug))
            .is_ok()
    }

    /// Returns true if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.slugs.is_empty()
    }

    /// Number of slugs in the set.
    pub fn len(&self) -> usize {
        self.slugs.len()
    }

    /// Add a slug, keeping the set sorted.
    pub fn add(&mut self, slug: &str) {
        if let Err(pos) = self.slugs.binary_search_by(|probe| probe.as_str().cmp(slug)) {
            self.slugs.insert(pos, slug.to_string());
        }
    }
}

impl From<Vec<String>> for Categories {
    fn from(slugs: Vec<String>) -> Self {
        Self::new(SmallVec::from_vec(slugs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_sorts_and_dedups() {
        let categories = Categories::from_strs(&["shoes", "apparel", "shoes"]);

        assert_eq!(categories.len(), 2);
        assert_eq!(categories.to_strs().as_slice(), ["apparel", "shoes"]);
    }

    #[test]
    fn intersects_finds_shared_slug() {
        let left = Categories::from_strs(&["apparel", "sale"]);
        let right = Categories::from_strs(&["digital", "sale"]);
        let other = Categories::from_strs(&["books"]);

        assert!(left.intersects(&right));
        assert!(!left.intersects(&other));
        assert!(!left.intersects(&Categories::empty()));
    }

    #[test]
    fn contains_and_add() {
        let mut categories = Categories::empty();

        assert!(categories.is_empty());

        categories.add("music");
        categories.add("books");
        categories.add("music");

        assert!(categories.contains("music"));
        assert!(!categories.contains("film"));
        assert_eq!(categories.to_strs().as_slice(), ["books", "music"]);
    }
}
