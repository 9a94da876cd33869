//! Margin requirements and post-expiry valuation for a single vault.
//!
//! Two regimes, picked by the expiry of the vault's option:
//!
//! * **Live**: the requirement is the worst-case loss of the short net of the
//!   long. Puts need `max(0, Ks*s - Kl*min(s, l))` of strike asset; calls
//!   need `max(0, (Kl - Ks)*s/Kl, s - l)` of underlying (just `max(0, s - l)`
//!   without a long). If the vault is collateralized in some other asset the
//!   requirement is converted through oracle spot prices.
//! * **Expired**: each option is worth its cash value at the finalized expiry
//!   price. Excess is `collateral + long_cash*l - short_cash*s`, converted from
//!   strike asset into collateral at expiry prices.
//!
//! All math runs on [`FixedPoint`]. The final amount is rounded down when it
//! is an excess and up when it is a deficit, so the vault never gets credit
//! for dust it does not hold.

use serde::{Deserialize, Serialize};

use crate::fixed_point::{FixedPoint, MathError};
use crate::oracle::{Oracle, OracleError};
use crate::otoken::{OptionTokens, OtokenDescriptor};
use crate::types::{Address, Amount, Price, Timestamp, BASE_DECIMALS};
use crate::vault::{Vault, MAX_ASSETS_PER_SLOT};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExcessMargin {
    pub amount: Amount,
    pub is_excess: bool,
}

impl ExcessMargin {
    fn surplus(amount: Amount) -> Self {
        Self { amount, is_excess: true }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CalculatorError {
    #[error("too many short otokens in the vault")]
    TooManyShorts,

    #[error("too many long otokens in the vault")]
    TooManyLongs,

    #[error("too many collateral assets in the vault")]
    TooManyCollaterals,

    #[error("short otoken and amount lengths differ")]
    ShortLengthMismatch,

    #[error("long otoken and amount lengths differ")]
    LongLengthMismatch,

    #[error("collateral asset and amount lengths differ")]
    CollateralLengthMismatch,

    #[error("long otoken is not marginable against the short")]
    LongNotMarginable,

    #[error("collateral asset is not marginable")]
    CollateralNotMarginable,

    #[error("vault is denominated in {expected}, not {given}")]
    WrongDenomination { expected: Address, given: Address },

    #[error("{0} is not a known otoken")]
    UnknownOtoken(Address),

    #[error("otoken {0} has not expired")]
    NotExpired(Address),

    #[error("price of {asset} at expiry {expiry} is not finalized")]
    PriceNotFinalized { asset: Address, expiry: Timestamp },

    #[error("oracle error: {0}")]
    Oracle(#[from] OracleError),

    #[error("math error: {0}")]
    Math(#[from] MathError),
}

#[derive(Debug, Clone, Copy)]
struct Leg {
    otoken: Address,
    terms: OtokenDescriptor,
    amount: FixedPoint,
}

#[derive(Debug, Clone, Copy)]
struct VaultDetails {
    short: Option<Leg>,
    long: Option<Leg>,
    collateral: Option<(Address, FixedPoint)>,
}

impl VaultDetails {
    // the option that decides expiry and denomination
    fn product(&self) -> Option<&Leg> {
        self.short.as_ref().or(self.long.as_ref())
    }

    fn denomination(&self) -> Option<Address> {
        self.collateral
            .map(|(asset, _)| asset)
            .or_else(|| self.product().map(|leg| leg.terms.collateral_asset))
    }
}

pub struct MarginCalculator<'a, O: ?Sized, T: ?Sized> {
    oracle: &'a O,
    tokens: &'a T,
    now: Timestamp,
}

impl<'a, O, T> MarginCalculator<'a, O, T>
where
    O: Oracle + ?Sized,
    T: OptionTokens + ?Sized,
{
    pub fn new(oracle: &'a O, tokens: &'a T, now: Timestamp) -> Self {
        Self { oracle, tokens, now }
    }

    /// Excess (or deficit) of collateral over what the vault's positions need,
    /// in units of `collateral_asset`.
    pub fn excess_margin(&self, vault: &Vault, collateral_asset: Address) -> Result<ExcessMargin, CalculatorError> {
        let details = self.vault_details(vault)?;

        // a vault without collateral can be measured in any asset the oracle prices
        if let Some((held, _)) = details.collateral {
            if held != collateral_asset {
                return Err(CalculatorError::WrongDenomination { expected: held, given: collateral_asset });
            }
        }

        let collateral = details.collateral.map(|(_, amount)| amount).unwrap_or(FixedPoint::ZERO);
        let product = match details.product() {
            Some(leg) => leg.terms,
            None => return Ok(ExcessMargin::surplus(to_amount(collateral, true)?)),
        };

        let excess = if product.has_expired(self.now) {
            self.expired_excess(&details, &product, collateral, collateral_asset)?
        } else {
            let required = self.live_requirement(&details, collateral_asset)?;
            collateral.checked_sub(required)?
        };

        if excess.is_negative() {
            Ok(ExcessMargin {
                amount: to_amount(excess.abs()?, false)?,
                is_excess: false,
            })
        } else {
            Ok(ExcessMargin::surplus(to_amount(excess, true)?))
        }
    }

    /// The asset a vault is measured in: its collateral if it has any,
    /// otherwise the collateral asset of its option. `None` for an empty vault.
    pub fn denomination(&self, vault: &Vault) -> Result<Option<Address>, CalculatorError> {
        Ok(self.vault_details(vault)?.denomination())
    }

    /// Cash value of one expired option in strike asset units.
    /// The zero address and unknown otokens are worth nothing.
    pub fn expired_cash_value(&self, otoken: Address) -> Result<FixedPoint, CalculatorError> {
        if otoken.is_zero() {
            return Ok(FixedPoint::ZERO);
        }
        match self.tokens.otoken(otoken) {
            Some(terms) => self.cash_value(otoken, &terms),
            None => Ok(FixedPoint::ZERO),
        }
    }

    /// Collateral paid out per whole option at expiry, rounded down.
    pub fn expired_payout_rate(&self, otoken: Address) -> Result<Amount, CalculatorError> {
        let terms = self.descriptor(otoken)?;
        let cash = self.cash_value(otoken, &terms)?;
        let rate = self.convert_on_expiry(cash, terms.strike_asset, terms.collateral_asset, terms.expiry)?;
        to_amount(rate, true)
    }

    pub fn expired_payout(&self, otoken: Address, amount: Amount) -> Result<Amount, CalculatorError> {
        let rate = to_fixed(self.expired_payout_rate(otoken)?)?;
        to_amount(rate.checked_mul(to_fixed(amount)?)?, true)
    }

    fn vault_details(&self, vault: &Vault) -> Result<VaultDetails, CalculatorError> {
        check_structure(vault)?;

        let short = match vault.short() {
            Some((otoken, amount)) => Some(self.leg(otoken, amount)?),
            None => None,
        };
        let long = match vault.long() {
            Some((otoken, amount)) => Some(self.leg(otoken, amount)?),
            None => None,
        };
        let collateral = match vault.collateral() {
            Some((asset, amount)) => Some((asset, to_fixed(amount)?)),
            None => None,
        };
        let details = VaultDetails { short, long, collateral };

        if let (Some(short), Some(long)) = (&details.short, &details.long) {
            if !is_marginable_long(short, long) {
                return Err(CalculatorError::LongNotMarginable);
            }
        }
        if let Some(short) = &details.short {
            if !has_bounded_obligation(&short.terms) {
                return Err(CalculatorError::CollateralNotMarginable);
            }
        }
        if let (Some((asset, _)), Some(product)) = (details.collateral, details.product()) {
            if asset != product.terms.collateral_asset {
                return Err(CalculatorError::CollateralNotMarginable);
            }
        }
        Ok(details)
    }

    fn live_requirement(&self, details: &VaultDetails, collateral_asset: Address) -> Result<FixedPoint, CalculatorError> {
        let short = match &details.short {
            Some(short) => short,
            None => return Ok(FixedPoint::ZERO),
        };
        let s = short.amount;
        let ks = strike(&short.terms)?;
        let (kl, l) = match &details.long {
            Some(long) => (strike(&long.terms)?, long.amount),
            None => (FixedPoint::ZERO, FixedPoint::ZERO),
        };

        let required = if short.terms.is_put {
            let gross = ks.checked_mul(s)?;
            let hedged = kl.checked_mul(s.min(l))?;
            gross.checked_sub(hedged)?.max(FixedPoint::ZERO)
        } else {
            let uncovered = s.checked_sub(l)?.max(FixedPoint::ZERO);
            if kl.is_zero() {
                uncovered
            } else {
                let spread = kl.checked_sub(ks)?.checked_mul(s)?.checked_div(kl)?;
                spread.max(uncovered).max(FixedPoint::ZERO)
            }
        };

        let natural = short.terms.natural_denomination();
        if natural == collateral_asset {
            return Ok(required);
        }
        let from = price_fixed(self.oracle.price(natural)?)?;
        let to = price_fixed(self.oracle.price(collateral_asset)?)?;
        Ok(required.checked_mul(from)?.checked_div(to)?)
    }

    fn expired_excess(
        &self,
        details: &VaultDetails,
        product: &OtokenDescriptor,
        collateral: FixedPoint,
        collateral_asset: Address,
    ) -> Result<FixedPoint, CalculatorError> {
        let owed = match &details.short {
            Some(short) => self.cash_value(short.otoken, &short.terms)?.checked_mul(short.amount)?,
            None => FixedPoint::ZERO,
        };
        let owned = match &details.long {
            Some(long) => self.cash_value(long.otoken, &long.terms)?.checked_mul(long.amount)?,
            None => FixedPoint::ZERO,
        };
        let net = owned.checked_sub(owed)?;
        let net = self.convert_on_expiry(net, product.strike_asset, collateral_asset, product.expiry)?;
        Ok(collateral.checked_add(net)?)
    }

    fn cash_value(&self, otoken: Address, terms: &OtokenDescriptor) -> Result<FixedPoint, CalculatorError> {
        if !terms.has_expired(self.now) {
            return Err(CalculatorError::NotExpired(otoken));
        }
        let underlying = self.finalized_price(terms.underlying, terms.expiry)?;
        let strike_asset = self.finalized_price(terms.strike_asset, terms.expiry)?;
        // underlying price quoted in strike asset
        let spot = underlying.checked_div(strike_asset)?;
        let k = strike(terms)?;

        let intrinsic = if terms.is_put {
            k.checked_sub(spot)?
        } else {
            spot.checked_sub(k)?
        };
        Ok(intrinsic.max(FixedPoint::ZERO))
    }

    fn convert_on_expiry(
        &self,
        amount: FixedPoint,
        from: Address,
        to: Address,
        expiry: Timestamp,
    ) -> Result<FixedPoint, CalculatorError> {
        if from == to || amount.is_zero() {
            return Ok(amount);
        }
        let from_price = self.finalized_price(from, expiry)?;
        let to_price = self.finalized_price(to, expiry)?;
        Ok(amount.checked_mul(from_price)?.checked_div(to_price)?)
    }

    fn finalized_price(&self, asset: Address, expiry: Timestamp) -> Result<FixedPoint, CalculatorError> {
        let (price, finalized) = self.oracle.expiry_price(asset, expiry)?;
        if !finalized || price.is_zero() {
            return Err(CalculatorError::PriceNotFinalized { asset, expiry });
        }
        price_fixed(price)
    }

    fn leg(&self, otoken: Address, amount: Amount) -> Result<Leg, CalculatorError> {
        Ok(Leg {
            otoken,
            terms: self.descriptor(otoken)?,
            amount: to_fixed(amount)?,
        })
    }

    fn descriptor(&self, otoken: Address) -> Result<OtokenDescriptor, CalculatorError> {
        self.tokens.otoken(otoken).ok_or(CalculatorError::UnknownOtoken(otoken))
    }
}

fn check_structure(vault: &Vault) -> Result<(), CalculatorError> {
    if vault.short_otokens.len() > MAX_ASSETS_PER_SLOT {
        return Err(CalculatorError::TooManyShorts);
    }
    if vault.long_otokens.len() > MAX_ASSETS_PER_SLOT {
        return Err(CalculatorError::TooManyLongs);
    }
    if vault.collateral_assets.len() > MAX_ASSETS_PER_SLOT {
        return Err(CalculatorError::TooManyCollaterals);
    }
    if vault.short_otokens.len() != vault.short_amounts.len() {
        return Err(CalculatorError::ShortLengthMismatch);
    }
    if vault.long_otokens.len() != vault.long_amounts.len() {
        return Err(CalculatorError::LongLengthMismatch);
    }
    if vault.collateral_assets.len() != vault.collateral_amounts.len() {
        return Err(CalculatorError::CollateralLengthMismatch);
    }
    Ok(())
}

// same underlying, strike asset, collateral, expiry and type, and not the short itself
fn is_marginable_long(short: &Leg, long: &Leg) -> bool {
    short.otoken != long.otoken
        && short.terms.underlying == long.terms.underlying
        && short.terms.strike_asset == long.terms.strike_asset
        && short.terms.collateral_asset == long.terms.collateral_asset
        && short.terms.expiry == long.terms.expiry
        && short.terms.is_put == long.terms.is_put
}

// obligation stays bounded in collateral units: calls in the underlying, puts in anything else
fn has_bounded_obligation(terms: &OtokenDescriptor) -> bool {
    if terms.is_put {
        terms.collateral_asset != terms.underlying
    } else {
        terms.collateral_asset == terms.underlying
    }
}

fn strike(terms: &OtokenDescriptor) -> Result<FixedPoint, CalculatorError> {
    price_fixed(terms.strike_price)
}

fn price_fixed(price: Price) -> Result<FixedPoint, CalculatorError> {
    Ok(FixedPoint::from_scaled_uint(price.raw(), BASE_DECIMALS)?)
}

fn to_fixed(amount: Amount) -> Result<FixedPoint, CalculatorError> {
    Ok(FixedPoint::from_scaled_uint(amount.raw(), BASE_DECIMALS)?)
}

fn to_amount(value: FixedPoint, round_down: bool) -> Result<Amount, CalculatorError> {
    Ok(Amount::new(value.to_scaled_uint(BASE_DECIMALS, round_down)?))
}
