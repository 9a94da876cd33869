//! Margin calculator fixtures.
//!
//! Known vault shapes with hand-computed requirements, cash values and payouts.

use options_vault_core::*;
use rust_decimal_macros::dec;

const EXPIRY: u64 = 1_000;

fn weth() -> Address {
    Address::from_low_u64(1)
}

fn usdc() -> Address {
    Address::from_low_u64(2)
}

fn cusdc() -> Address {
    Address::from_low_u64(3)
}

fn otoken(id: u64) -> Address {
    Address::from_low_u64(id)
}

fn units(value: rust_decimal::Decimal) -> Amount {
    Amount::from_decimal(value).unwrap()
}

fn option(strike: u64, is_put: bool, collateral: Address, expiry: u64) -> OtokenDescriptor {
    OtokenDescriptor {
        underlying: weth(),
        strike_asset: usdc(),
        collateral_asset: collateral,
        strike_price: Price::from_units(strike),
        expiry: Timestamp::from_secs(expiry),
        is_put,
    }
}

fn put(strike: u64) -> OtokenDescriptor {
    option(strike, true, usdc(), EXPIRY)
}

fn call(strike: u64) -> OtokenDescriptor {
    option(strike, false, weth(), EXPIRY)
}

struct Fixture {
    oracle: InMemoryOracle,
    bank: TokenBank,
    now: Timestamp,
}

impl Fixture {
    fn new(otokens: &[(u64, OtokenDescriptor)]) -> Self {
        let mut bank = TokenBank::new(Address::from_low_u64(0x9001));
        for (id, terms) in otokens {
            bank.register_otoken(otoken(*id), *terms);
        }
        let mut oracle = InMemoryOracle::default();
        oracle.set_spot_price(weth(), Price::from_units(300));
        oracle.set_spot_price(usdc(), Price::from_units(1));
        Self {
            oracle,
            bank,
            now: Timestamp::from_secs(0),
        }
    }

    // moves past expiry and reports the given settlement prices
    fn expire(&mut self, prices: &[(Address, Price)]) {
        self.now = Timestamp::from_secs(EXPIRY);
        self.oracle.set_time(self.now);
        for (asset, price) in prices {
            self.oracle.set_expiry_price(*asset, self.now, *price).unwrap();
        }
    }

    fn calc(&self) -> MarginCalculator<'_, InMemoryOracle, TokenBank> {
        MarginCalculator::new(&self.oracle, &self.bank, self.now)
    }

    fn margin(&self, vault: &Vault, collateral: Address) -> ExcessMargin {
        self.calc().excess_margin(vault, collateral).unwrap()
    }
}

fn vault(short: Option<(u64, Amount)>, long: Option<(u64, Amount)>, collateral: Option<(Address, Amount)>) -> Vault {
    let mut vault = Vault::new();
    if let Some((id, amount)) = short {
        vault.short_otokens.push(otoken(id));
        vault.short_amounts.push(amount);
    }
    if let Some((id, amount)) = long {
        vault.long_otokens.push(otoken(id));
        vault.long_amounts.push(amount);
    }
    if let Some((asset, amount)) = collateral {
        vault.collateral_assets.push(asset);
        vault.collateral_amounts.push(amount);
    }
    vault
}

fn excess(amount: Amount) -> ExcessMargin {
    ExcessMargin { amount, is_excess: true }
}

fn deficit(amount: Amount) -> ExcessMargin {
    ExcessMargin { amount, is_excess: false }
}

// ========== puts ==========

#[test]
fn naked_put_exactly_covered() {
    let f = Fixture::new(&[(100, put(250))]);
    let v = vault(Some((100, Amount::from_units(1))), None, Some((usdc(), Amount::from_units(250))));
    assert_eq!(f.margin(&v, usdc()), excess(Amount::zero()));
}

#[test]
fn naked_put_over_covered() {
    let f = Fixture::new(&[(100, put(250))]);
    let v = vault(Some((100, Amount::from_units(1))), None, Some((usdc(), Amount::from_units(300))));
    assert_eq!(f.margin(&v, usdc()), excess(Amount::from_units(50)));
}

#[test]
fn naked_put_under_covered() {
    let f = Fixture::new(&[(100, put(250))]);
    let v = vault(Some((100, Amount::from_units(1))), None, Some((usdc(), Amount::from_units(100))));
    assert_eq!(f.margin(&v, usdc()), deficit(Amount::from_units(150)));
}

#[test]
fn put_spread_needs_strike_difference() {
    let f = Fixture::new(&[(100, put(250)), (101, put(200))]);

    let bare = vault(Some((100, Amount::from_units(1))), Some((101, Amount::from_units(1))), None);
    assert_eq!(f.margin(&bare, usdc()), deficit(Amount::from_units(50)));

    let funded = vault(
        Some((100, Amount::from_units(1))),
        Some((101, Amount::from_units(1))),
        Some((usdc(), Amount::from_units(50))),
    );
    assert_eq!(f.margin(&funded, usdc()), excess(Amount::zero()));
}

#[test]
fn higher_long_put_covers_the_short() {
    let f = Fixture::new(&[(100, put(200)), (101, put(250))]);
    let v = vault(Some((100, Amount::from_units(1))), Some((101, Amount::from_units(1))), None);
    assert_eq!(f.margin(&v, usdc()), excess(Amount::zero()));
}

#[test]
fn partially_hedged_put() {
    // 2 short 250 puts, 1 long 200 put: 500 - 200
    let f = Fixture::new(&[(100, put(250)), (101, put(200))]);
    let v = vault(
        Some((100, Amount::from_units(2))),
        Some((101, Amount::from_units(1))),
        Some((usdc(), Amount::from_units(300))),
    );
    assert_eq!(f.margin(&v, usdc()), excess(Amount::zero()));
}

// ========== calls ==========

#[test]
fn call_spread_requires_relative_strike_gap() {
    let f = Fixture::new(&[(200, call(200)), (201, call(250))]);

    let bare = vault(Some((200, Amount::from_units(1))), Some((201, Amount::from_units(1))), None);
    assert_eq!(f.margin(&bare, weth()), deficit(units(dec!(0.2))));

    let funded = vault(
        Some((200, Amount::from_units(1))),
        Some((201, Amount::from_units(1))),
        Some((weth(), units(dec!(0.2)))),
    );
    assert_eq!(f.margin(&funded, weth()), excess(Amount::zero()));
}

#[test]
fn call_with_lower_long_strike_needs_uncovered_amount() {
    // 3 short 250 calls vs 1 long 200 call: two calls are naked
    let f = Fixture::new(&[(200, call(250)), (201, call(200))]);
    let v = vault(Some((200, Amount::from_units(3))), Some((201, Amount::from_units(1))), None);
    assert_eq!(f.margin(&v, weth()), deficit(Amount::from_units(2)));
}

#[test]
fn call_uncovered_amount_beats_spread() {
    // 4 short 100 calls vs 1 long 300 call: spread term 2.67 < uncovered 3
    let f = Fixture::new(&[(200, call(100)), (201, call(300))]);
    let v = vault(Some((200, Amount::from_units(4))), Some((201, Amount::from_units(1))), None);
    assert_eq!(f.margin(&v, weth()), deficit(Amount::from_units(3)));
}

#[test]
fn call_partial_cover() {
    // 2 short 200 calls vs 1 long 250 call: spread term 0.4 < uncovered 1
    let f = Fixture::new(&[(200, call(200)), (201, call(250))]);
    let v = vault(Some((200, Amount::from_units(2))), Some((201, Amount::from_units(1))), None);
    assert_eq!(f.margin(&v, weth()), deficit(Amount::from_units(1)));
}

#[test]
fn naked_call_needs_one_underlying_each() {
    let f = Fixture::new(&[(200, call(200))]);
    let v = vault(Some((200, Amount::from_units(5))), None, Some((weth(), Amount::from_units(5))));
    assert_eq!(f.margin(&v, weth()), excess(Amount::zero()));
}

// ========== cross collateral ==========

#[test]
fn put_collateralized_in_other_asset_uses_spot_prices() {
    let mut f = Fixture::new(&[(100, option(300, true, cusdc(), EXPIRY))]);
    f.oracle.set_spot_price(cusdc(), Price::from_decimal(dec!(0.02)).unwrap());

    let bare = vault(Some((100, Amount::from_units(1))), None, None);
    assert_eq!(f.calc().denomination(&bare).unwrap(), Some(cusdc()));
    assert_eq!(f.margin(&bare, cusdc()), deficit(Amount::from_units(15_000)));

    let funded = vault(Some((100, Amount::from_units(1))), None, Some((cusdc(), Amount::from_units(15_000))));
    assert_eq!(f.margin(&funded, cusdc()), excess(Amount::zero()));
}

#[test]
fn missing_spot_price_is_an_oracle_error() {
    let f = Fixture::new(&[(100, option(300, true, cusdc(), EXPIRY))]);
    let bare = vault(Some((100, Amount::from_units(1))), None, None);
    assert_eq!(
        f.calc().excess_margin(&bare, cusdc()),
        Err(CalculatorError::Oracle(OracleError::MissingPrice(cusdc())))
    );
}

// ========== rounding ==========

#[test]
fn dust_deficit_rounds_up() {
    let dust_put = OtokenDescriptor {
        strike_price: Price::new(1),
        ..put(250)
    };
    let f = Fixture::new(&[(100, dust_put)]);
    let v = vault(Some((100, Amount::new(1))), None, None);
    assert_eq!(f.margin(&v, usdc()), deficit(Amount::new(1)));
}

#[test]
fn collateral_without_options_is_all_excess() {
    let f = Fixture::new(&[]);
    let v = vault(None, None, Some((usdc(), Amount::from_units(42))));
    assert_eq!(f.margin(&v, usdc()), excess(Amount::from_units(42)));
}

// ========== expiry ==========

#[test]
fn cash_values() {
    let mut f = Fixture::new(&[(100, put(250))]);
    f.expire(&[(weth(), Price::from_units(200)), (usdc(), Price::from_units(1))]);

    let calc = f.calc();
    assert_eq!(calc.expired_cash_value(Address::ZERO).unwrap(), FixedPoint::ZERO);
    assert_eq!(calc.expired_cash_value(otoken(999)).unwrap(), FixedPoint::ZERO);
    assert_eq!(calc.expired_cash_value(otoken(100)).unwrap(), FixedPoint::from_unscaled_int(50));
}

#[test]
fn call_cash_values() {
    let mut f = Fixture::new(&[(200, call(250))]);
    f.expire(&[(weth(), Price::from_units(300)), (usdc(), Price::from_units(1))]);
    assert_eq!(f.calc().expired_cash_value(otoken(200)).unwrap(), FixedPoint::from_unscaled_int(50));

    let mut f = Fixture::new(&[(200, call(250))]);
    f.expire(&[(weth(), Price::from_units(200)), (usdc(), Price::from_units(1))]);
    assert_eq!(f.calc().expired_cash_value(otoken(200)).unwrap(), FixedPoint::ZERO);
}

#[test]
fn out_of_the_money_put_is_worthless() {
    let mut f = Fixture::new(&[(100, put(250))]);
    f.expire(&[(weth(), Price::from_units(300)), (usdc(), Price::from_units(1))]);
    assert_eq!(f.calc().expired_cash_value(otoken(100)).unwrap(), FixedPoint::ZERO);
}

#[test]
fn expired_put_vault_keeps_the_rest() {
    let mut f = Fixture::new(&[(100, put(250))]);
    f.expire(&[(weth(), Price::from_units(200)), (usdc(), Price::from_units(1))]);
    let v = vault(Some((100, Amount::from_units(1))), None, Some((usdc(), Amount::from_units(250))));
    assert_eq!(f.margin(&v, usdc()), excess(Amount::from_units(200)));
}

#[test]
fn expired_call_vault_converts_at_expiry_price() {
    let mut f = Fixture::new(&[(200, call(200))]);
    f.expire(&[(weth(), Price::from_units(300)), (usdc(), Price::from_units(1))]);
    // owes 100 USDC = 1/3 WETH out of 1 WETH
    let v = vault(Some((200, Amount::from_units(1))), None, Some((weth(), Amount::from_units(1))));
    assert_eq!(f.margin(&v, weth()), excess(Amount::new(66_666_666)));
}

#[test]
fn expired_long_only_vault_is_credited() {
    let mut f = Fixture::new(&[(100, put(250))]);
    f.expire(&[(weth(), Price::from_units(220)), (usdc(), Price::from_units(1))]);
    let v = vault(None, Some((100, Amount::from_units(2))), None);
    assert_eq!(f.margin(&v, usdc()), excess(Amount::from_units(60)));
}

#[test]
fn call_payout_rate_in_collateral() {
    let mut f = Fixture::new(&[(200, call(200))]);
    f.expire(&[(weth(), Price::from_units(400)), (usdc(), Price::from_units(1))]);
    let calc = f.calc();
    assert_eq!(calc.expired_payout_rate(otoken(200)).unwrap(), units(dec!(0.5)));
    assert_eq!(calc.expired_payout(otoken(200), Amount::from_units(3)).unwrap(), units(dec!(1.5)));
}

#[test]
fn unreported_expiry_price_is_not_final() {
    let mut f = Fixture::new(&[(100, put(250))]);
    f.expire(&[]);
    let v = vault(Some((100, Amount::from_units(1))), None, Some((usdc(), Amount::from_units(250))));
    assert_eq!(
        f.calc().excess_margin(&v, usdc()),
        Err(CalculatorError::PriceNotFinalized { asset: weth(), expiry: Timestamp::from_secs(EXPIRY) })
    );
}

#[test]
fn disputed_price_is_not_final() {
    let mut f = Fixture::new(&[(100, put(250))]);
    f.oracle = InMemoryOracle::new(OracleConfig { locking_period_secs: 0, dispute_period_secs: 60 });
    f.expire(&[(weth(), Price::from_units(200)), (usdc(), Price::from_units(1))]);
    assert!(matches!(
        f.calc().expired_cash_value(otoken(100)),
        Err(CalculatorError::PriceNotFinalized { .. })
    ));

    f.now = f.now.saturating_add(60);
    f.oracle.set_time(f.now);
    assert_eq!(f.calc().expired_cash_value(otoken(100)).unwrap(), FixedPoint::from_unscaled_int(50));
}

// ========== marginability ==========

#[test]
fn long_with_other_expiry_not_marginable() {
    let f = Fixture::new(&[(100, put(250)), (101, option(200, true, usdc(), EXPIRY + 1))]);
    let v = vault(Some((100, Amount::from_units(1))), Some((101, Amount::from_units(1))), None);
    assert_eq!(f.calc().excess_margin(&v, usdc()), Err(CalculatorError::LongNotMarginable));
}

#[test]
fn long_of_other_type_not_marginable() {
    let f = Fixture::new(&[(100, put(250)), (101, option(200, false, usdc(), EXPIRY))]);
    let v = vault(Some((100, Amount::from_units(1))), Some((101, Amount::from_units(1))), None);
    assert_eq!(f.calc().excess_margin(&v, usdc()), Err(CalculatorError::LongNotMarginable));
}

#[test]
fn same_otoken_long_not_marginable() {
    let f = Fixture::new(&[(100, put(250))]);
    let v = vault(Some((100, Amount::from_units(1))), Some((100, Amount::from_units(1))), None);
    assert_eq!(f.calc().excess_margin(&v, usdc()), Err(CalculatorError::LongNotMarginable));
}

#[test]
fn foreign_collateral_not_marginable() {
    let f = Fixture::new(&[(100, put(250))]);
    let v = vault(Some((100, Amount::from_units(1))), None, Some((weth(), Amount::from_units(1))));
    assert_eq!(f.calc().excess_margin(&v, weth()), Err(CalculatorError::CollateralNotMarginable));
}

#[test]
fn call_collateralized_in_strike_asset_not_marginable() {
    let f = Fixture::new(&[(200, option(250, false, usdc(), EXPIRY))]);
    let v = vault(Some((200, Amount::from_units(1))), None, Some((usdc(), Amount::from_units(300))));
    assert_eq!(f.calc().excess_margin(&v, usdc()), Err(CalculatorError::CollateralNotMarginable));

    let bare = vault(Some((200, Amount::from_units(1))), None, None);
    assert_eq!(f.calc().excess_margin(&bare, usdc()), Err(CalculatorError::CollateralNotMarginable));
}

#[test]
fn put_collateralized_in_underlying_not_marginable() {
    let f = Fixture::new(&[(100, option(250, true, weth(), EXPIRY))]);
    let v = vault(Some((100, Amount::from_units(1))), None, Some((weth(), Amount::from_units(1))));
    assert_eq!(f.calc().excess_margin(&v, weth()), Err(CalculatorError::CollateralNotMarginable));
}

#[test]
fn long_only_call_in_strike_asset_still_valued() {
    let mut f = Fixture::new(&[(200, option(250, false, usdc(), EXPIRY))]);
    f.expire(&[(weth(), Price::from_units(300)), (usdc(), Price::from_units(1))]);
    let v = vault(None, Some((200, Amount::from_units(2))), None);
    assert_eq!(f.margin(&v, usdc()), excess(Amount::from_units(100)));
}

#[test]
fn repeated_queries_agree() {
    let f = Fixture::new(&[(100, put(250)), (101, put(200))]);
    let v = vault(
        Some((100, Amount::from_units(3))),
        Some((101, Amount::from_units(1))),
        Some((usdc(), Amount::from_units(400))),
    );
    let first = f.margin(&v, usdc());
    for _ in 0..5 {
        assert_eq!(f.margin(&v, usdc()), first);
    }
}
