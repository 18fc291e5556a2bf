//! Rebate CLI
//!
//! Loads a fixture set, applies coupon codes to its cart and prints the
//! discounted receipt.

use std::{
    io::{self, Write},
    time::Instant,
};

use anyhow::Result;
use clap::Parser;
use humanize_duration::{Truncate, prelude::DurationExt};
use tracing::{info, warn};

use rebate::{
    cli::{CliArgs, init_logging},
    discounts::{CouponResult, DiscountError, DiscountService},
    fixtures::Fixture,
    receipt::Receipt,
};

fn main() -> Result<()> {
    let args = CliArgs::parse();

    init_logging(&args.logging)?;

    let fixture = Fixture::from_set_in(&args.fixtures_dir, &args.fixture)?;
    let mut cart = fixture.cart()?;

    if let Some(email) = args.email.as_deref() {
        cart = cart.with_email(email);
    }

    let mut service =
        DiscountService::new(cart, fixture.coupons()).with_usage_ledger(fixture.usage());

    if let Some(now) = args.now {
        service = service.at(now);
    }

    let start = Instant::now();

    let outcome = if args.revalidate {
        service.revalidate_coupons()
    } else {
        service.apply_coupon_codes(&args.codes)
    };

    let elapsed = start.elapsed();

    match outcome {
        Ok(outcome) => {
            for (code, result) in &outcome.coupon_results {
                if let CouponResult::Rejected(rejection) = result {
                    warn!(code, reason = rejection.code(), "{rejection}");
                }
            }

            info!(applied = ?outcome.applied_codes, "coupons applied");
        }
        Err(DiscountError::NoValidCoupons { rejections }) => {
            for (code, rejection) in &rejections {
                warn!(code, reason = rejection.code(), "{rejection}");
            }

            warn!("no coupon could be applied");
        }
        Err(err) => warn!(error = %err, "coupons not applied"),
    }

    let receipt = Receipt::from_cart(&service.into_cart())?;

    let stdout = io::stdout();
    let mut handle = stdout.lock();

    receipt.write_to(&mut handle)?;

    writeln!(
        handle,
        " {} ({}s)",
        elapsed.human(Truncate::Nano),
        elapsed.as_secs_f32()
    )?;

    Ok(())
}
