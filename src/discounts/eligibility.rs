//! Item Eligibility

use smallvec::SmallVec;

use crate::{
    cart::{Cart, CartItem},
    coupons::{Coupon, CouponPolicy},
};

/// Indexes of the cart items a coupon may discount, in cart order.
pub(crate) type EligibleItems = SmallVec<[usize; 8]>;

/// Collect the indexes of items the coupon applies to.
pub(crate) fn applicable_items(
    items: &[CartItem<'_>],
    coupon: &Coupon<'_>,
    cart: &Cart<'_>,
    policy: &dyn CouponPolicy,
) -> EligibleItems {
    items
        .iter()
        .enumerate()
        .filter(|(_, item)| is_applicable(item, coupon, cart, policy))
        .map(|(idx, _)| idx)
        .collect()
}

fn is_applicable(
    item: &CartItem<'_>,
    coupon: &Coupon<'_>,
    cart: &Cart<'_>,
    policy: &dyn CouponPolicy,
) -> bool {
    if item.is_locked() || policy.skip_item(item, coupon, cart) {
        return false;
    }

    let conditions = coupon.conditions();
    let product = item.product();

    if conditions.excluded_products.contains(&product) {
        return false;
    }

    if !conditions.included_products.is_empty() && !conditions.included_products.contains(&product)
    {
        return false;
    }

    if !conditions.included_categories.is_empty()
        && !conditions.included_categories.intersects(item.categories())
    {
        return false;
    }

    if conditions.excluded_categories.intersects(item.categories()) {
        return false;
    }

    if conditions.email_restrictions.is_empty() {
        return true;
    }

    cart.email()
        .is_some_and(|email| conditions.email_restrictions.allows(email))
}

#[cfg(test)]
mod tests {
    use decimal_percentage::Percentage;
    use rusty_money::{Money, iso::USD};
    use slotmap::SlotMap;
    use smallvec::smallvec;
    use testresult::TestResult;

    use crate::{
        categories::Categories,
        coupons::{AllowAll, CouponConditions, CouponKey, CouponKind, EmailRestrictions},
        products::ProductKey,
    };

    use super::*;

    #[derive(Debug)]
    struct SkipExpensive;

    impl CouponPolicy for SkipExpensive {
        fn skip_item(&self, item: &CartItem<'_>, _coupon: &Coupon<'_>, _cart: &Cart<'_>) -> bool {
            item.unit_price().to_minor_units() > 5_000
        }
    }

    fn fixture() -> (Vec<ProductKey>, Vec<CartItem<'static>>) {
        let mut keys = SlotMap::<ProductKey, ()>::with_key();
        let products: Vec<ProductKey> = (0..4).map(|_| keys.insert(())).collect();

        let items = products
            .iter()
            .zip([
                ("Shirt", 2_000, &["apparel"][..]),
                ("Album", 1_500, &["music"][..]),
                ("Jacket", 9_000, &["apparel", "sale"][..]),
                ("Gift card", 5_000, &[][..]),
            ])
            .map(|(product, (name, price, categories))| {
                CartItem::new(*product, name, Money::from_minor(price, USD), 1)
                    .with_categories(Categories::from_strs(categories))
            })
            .collect();

        (products, items)
    }

    fn coupon(conditions: CouponConditions<'static>) -> Coupon<'static> {
        Coupon::new(
            CouponKey::default(),
            "TEN",
            CouponKind::Percentage(Percentage::from(0.1)),
        )
        .with_conditions(conditions)
    }

    #[test]
    fn unrestricted_coupon_covers_every_unlocked_item() -> TestResult {
        let (_, mut items) = fixture();

        if let Some(card) = items.pop() {
            items.push(card.locked(true));
        }

        let cart = Cart::with_items(items.clone(), USD)?;
        let eligible = applicable_items(&items, &coupon(CouponConditions::default()), &cart, &AllowAll);

        assert_eq!(eligible.as_slice(), [0, 1, 2]);

        Ok(())
    }

    #[test]
    fn product_lists_filter_items() -> TestResult {
        let (products, items) = fixture();
        let cart = Cart::with_items(items.clone(), USD)?;

        let included = coupon(CouponConditions {
            included_products: products.iter().take(2).copied().collect(),
            excluded_products: products.iter().skip(1).take(1).copied().collect(),
            ..CouponConditions::default()
        });

        let eligible = applicable_items(&items, &included, &cart, &AllowAll);

        assert_eq!(eligible.as_slice(), [0]);

        Ok(())
    }

    #[test]
    fn category_lists_filter_items() -> TestResult {
        let (_, items) = fixture();
        let cart = Cart::with_items(items.clone(), USD)?;

        let apparel_not_on_sale = coupon(CouponConditions {
            included_categories: Categories::from_strs(&["apparel"]),
            excluded_categories: Categories::from_strs(&["sale"]),
            ..CouponConditions::default()
        });

        let eligible = applicable_items(&items, &apparel_not_on_sale, &cart, &AllowAll);

        assert_eq!(eligible.as_slice(), [0]);

        Ok(())
    }

    #[test]
    fn email_restrictions_need_matching_cart_email() -> TestResult {
        let (_, items) = fixture();
        let staff_only = coupon(CouponConditions {
            email_restrictions: EmailRestrictions::parse("*@staff.example")?,
            ..CouponConditions::default()
        });

        let anonymous = Cart::with_items(items.clone(), USD)?;
        let customer = Cart::with_items(items.clone(), USD)?.with_email("ada@example.com");
        let staff = Cart::with_items(items.clone(), USD)?.with_email("Grace@Staff.Example");

        assert!(applicable_items(&items, &staff_only, &anonymous, &AllowAll).is_empty());
        assert!(applicable_items(&items, &staff_only, &customer, &AllowAll).is_empty());
        assert_eq!(
            applicable_items(&items, &staff_only, &staff, &AllowAll).len(),
            4
        );

        Ok(())
    }

    #[test]
    fn policy_can_skip_items() -> TestResult {
        let (_, items) = fixture();
        let cart = Cart::with_items(items.clone(), USD)?;

        let eligible = applicable_items(
            &items,
            &coupon(CouponConditions::default()),
            &cart,
            &SkipExpensive,
        );

        let expected: EligibleItems = smallvec![0, 1, 3];

        assert_eq!(eligible, expected);

        Ok(())
    }
}
