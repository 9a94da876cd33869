//! Property-based tests for the fixed point core and the margin model.
//!
//! These tests verify invariants hold under random inputs.

use options_vault_core::*;
use proptest::prelude::*;

const EXPIRY: u64 = 1_000;

// Strategies for generating test data
fn fp_strategy() -> impl Strategy<Value = FixedPoint> {
    // up to 100k units at 8 decimals, either sign
    (0u128..10_000_000_000_000u128, any::<bool>()).prop_map(|(raw, negative)| {
        let value = FixedPoint::from_scaled_uint(raw, 8).unwrap();
        if negative {
            FixedPoint::ZERO.checked_sub(value).unwrap()
        } else {
            value
        }
    })
}

fn divisor_strategy() -> impl Strategy<Value = FixedPoint> {
    // at least one whole unit so quotients stay in range
    (100_000_000u128..10_000_000_000_000u128, any::<bool>()).prop_map(|(raw, negative)| {
        let value = FixedPoint::from_scaled_uint(raw, 8).unwrap();
        if negative {
            FixedPoint::ZERO.checked_sub(value).unwrap()
        } else {
            value
        }
    })
}

fn strike_strategy() -> impl Strategy<Value = u64> {
    1u64..=500u64 // $1 to $500
}

fn size_strategy() -> impl Strategy<Value = u64> {
    1u64..=10u64
}

fn weth() -> Address {
    Address::from_low_u64(1)
}

fn usdc() -> Address {
    Address::from_low_u64(2)
}

// wrapped stable at 0.02 USDC, a put collateral other than the strike asset
fn cusdc() -> Address {
    Address::from_low_u64(3)
}

fn cusdc_price() -> Price {
    Price::new(2_000_000)
}

fn short_otoken() -> Address {
    Address::from_low_u64(100)
}

fn long_otoken() -> Address {
    Address::from_low_u64(101)
}

fn collateral_for(is_put: bool, cross: bool) -> Address {
    match (is_put, cross) {
        (true, true) => cusdc(),
        (true, false) => usdc(),
        (false, _) => weth(),
    }
}

fn option(strike: u64, is_put: bool, collateral_asset: Address) -> OtokenDescriptor {
    OtokenDescriptor {
        underlying: weth(),
        strike_asset: usdc(),
        collateral_asset,
        strike_price: Price::from_units(strike),
        expiry: Timestamp::from_secs(EXPIRY),
        is_put,
    }
}

/// Post exactly the live requirement for the given position, then check the
/// vault at expiry. Returns (live margin, expired margin).
fn margin_at_expiry(
    is_put: bool,
    collateral_asset: Address,
    short_strike: u64,
    short_size: u64,
    long: Option<(u64, u64)>,
    expiry_price: u64,
) -> (ExcessMargin, ExcessMargin) {
    let mut bank = TokenBank::new(Address::from_low_u64(0x9001));
    bank.register_otoken(short_otoken(), option(short_strike, is_put, collateral_asset));

    let mut vault = Vault::new();
    vault.short_otokens.push(short_otoken());
    vault.short_amounts.push(Amount::from_units(short_size));
    if let Some((strike, size)) = long {
        bank.register_otoken(long_otoken(), option(strike, is_put, collateral_asset));
        vault.long_otokens.push(long_otoken());
        vault.long_amounts.push(Amount::from_units(size));
    }

    let mut oracle = InMemoryOracle::default();
    oracle.set_spot_price(weth(), Price::from_units(300));
    oracle.set_spot_price(usdc(), Price::from_units(1));
    oracle.set_spot_price(cusdc(), cusdc_price());
    let live = {
        let calc = MarginCalculator::new(&oracle, &bank, Timestamp::from_secs(0));
        let need = calc.excess_margin(&vault, collateral_asset).unwrap();
        if !need.is_excess {
            vault.collateral_assets.push(collateral_asset);
            vault.collateral_amounts.push(need.amount);
        }
        calc.excess_margin(&vault, collateral_asset).unwrap()
    };

    let expiry = Timestamp::from_secs(EXPIRY);
    oracle.set_time(expiry);
    oracle.set_expiry_price(weth(), expiry, Price::from_units(expiry_price)).unwrap();
    oracle.set_expiry_price(usdc(), expiry, Price::from_units(1)).unwrap();
    oracle.set_expiry_price(cusdc(), expiry, cusdc_price()).unwrap();
    let calc = MarginCalculator::new(&oracle, &bank, expiry);
    let expired = calc.excess_margin(&vault, collateral_asset).unwrap();

    (live, expired)
}

proptest! {
    /// Adding then subtracting the same value is lossless
    #[test]
    fn add_sub_inverse(a in fp_strategy(), b in fp_strategy()) {
        let back = a.checked_add(b).unwrap().checked_sub(b).unwrap();
        prop_assert_eq!(back, a);
    }

    /// Multiplication commutes
    #[test]
    fn mul_commutes(a in fp_strategy(), b in fp_strategy()) {
        prop_assert_eq!(a.checked_mul(b).unwrap(), b.checked_mul(a).unwrap());
    }

    /// ONE is the identity for mul and div
    #[test]
    fn one_is_identity(a in fp_strategy()) {
        prop_assert_eq!(a.checked_mul(FixedPoint::ONE).unwrap(), a);
        prop_assert_eq!(a.checked_div(FixedPoint::ONE).unwrap(), a);
    }

    /// Products of 8-decimal values are exact, so dividing back recovers the input
    #[test]
    fn mul_div_recovers(a in fp_strategy(), b in divisor_strategy()) {
        let product = a.checked_mul(b).unwrap();
        prop_assert_eq!(product.checked_div(b).unwrap(), a);
    }

    /// Division truncates toward zero, so negating the dividend negates the quotient
    #[test]
    fn div_truncates_toward_zero(a in fp_strategy(), b in divisor_strategy()) {
        let neg_a = FixedPoint::ZERO.checked_sub(a).unwrap();
        let q = a.checked_div(b).unwrap();
        let neg_q = neg_a.checked_div(b).unwrap();
        prop_assert_eq!(neg_q, FixedPoint::ZERO.checked_sub(q).unwrap());
    }

    /// Rounding up never lands below rounding down, and never more than one unit above
    #[test]
    fn rounding_brackets_value(a in fp_strategy(), b in divisor_strategy()) {
        let q = a.checked_div(b).unwrap().abs().unwrap();
        let down = q.to_scaled_uint(8, true).unwrap();
        let up = q.to_scaled_uint(8, false).unwrap();
        prop_assert!(down <= up);
        prop_assert!(up - down <= 1);
    }

    /// min and max pick one of the inputs, in order
    #[test]
    fn min_max_order(a in fp_strategy(), b in fp_strategy()) {
        let lo = a.min(b);
        let hi = a.max(b);
        prop_assert!(lo <= hi);
        prop_assert!(lo == a || lo == b);
        prop_assert!(hi == a || hi == b);
    }

    /// A naked vault posting exactly the live requirement survives any expiry price
    #[test]
    fn naked_requirement_covers_expiry(
        is_put in any::<bool>(),
        cross in any::<bool>(),
        strike in strike_strategy(),
        size in size_strategy(),
        price in 1u64..=1_000u64,
    ) {
        let collateral = collateral_for(is_put, cross);
        let (live, expired) = margin_at_expiry(is_put, collateral, strike, size, None, price);
        prop_assert_eq!(live, ExcessMargin { amount: Amount::zero(), is_excess: true });
        prop_assert!(expired.is_excess, "expired deficit {} at price {}", expired.amount, price);
    }

    /// Same for spreads of any shape
    #[test]
    fn spread_requirement_covers_expiry(
        is_put in any::<bool>(),
        cross in any::<bool>(),
        short_strike in strike_strategy(),
        long_strike in strike_strategy(),
        short_size in size_strategy(),
        long_size in size_strategy(),
        price in 1u64..=1_000u64,
    ) {
        let (live, expired) = margin_at_expiry(
            is_put,
            collateral_for(is_put, cross),
            short_strike,
            short_size,
            Some((long_strike, long_size)),
            price,
        );
        prop_assert!(live.is_excess);
        prop_assert!(expired.is_excess, "expired deficit {} at price {}", expired.amount, price);
    }

    /// A put spread at its worst case uses up the collateral exactly
    #[test]
    fn put_spread_worst_case_is_exact(
        long_strike in 1u64..=400u64,
        width in 1u64..=100u64,
        size in size_strategy(),
        price_pick in 0u64..=400u64,
    ) {
        let short_strike = long_strike + width;
        let price = 1 + price_pick % long_strike;
        let (_, expired) = margin_at_expiry(true, usdc(), short_strike, size, Some((long_strike, size)), price);
        prop_assert_eq!(expired, ExcessMargin { amount: Amount::zero(), is_excess: true });
    }

    /// Calls backed by anything but the underlying, and puts backed by the
    /// underlying, are refused before any requirement is computed
    #[test]
    fn unbounded_collateral_is_refused(
        is_put in any::<bool>(),
        strike in strike_strategy(),
        size in size_strategy(),
    ) {
        let collateral = if is_put { weth() } else { usdc() };
        let mut bank = TokenBank::new(Address::from_low_u64(0x9001));
        bank.register_otoken(short_otoken(), option(strike, is_put, collateral));

        let mut vault = Vault::new();
        vault.short_otokens.push(short_otoken());
        vault.short_amounts.push(Amount::from_units(size));

        let oracle = InMemoryOracle::default();
        let calc = MarginCalculator::new(&oracle, &bank, Timestamp::from_secs(0));
        prop_assert_eq!(calc.excess_margin(&vault, collateral), Err(CalculatorError::CollateralNotMarginable));
    }
}
