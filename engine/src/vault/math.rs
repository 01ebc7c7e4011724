//! # Proportional Share Math
//!
//! The two conversions at the heart of the ledger, as pure functions. Both
//! floor: the deposit mint rounds the share grant down, the withdrawal
//! payout rounds the asset amount down. Repeated deposit/withdraw cycles can
//! therefore only lose value to rounding, never extract it -- the rounding
//! direction is the ledger's defense against share-inflation games, so it
//! is not negotiable.
//!
//! All intermediate products widen to `u128`; a result that does not fit
//! back into `u64` is an [`EngineError::Overflow`], as is division by a
//! zero denominator (a drained vault with live shares).

use crate::error::EngineError;

/// Computes `floor(a * b / d)` with a widened intermediate product.
pub fn mul_div_floor(a: u64, b: u64, d: u64) -> Result<u64, EngineError> {
    if d == 0 {
        return Err(EngineError::Overflow);
    }
    let wide = (a as u128) * (b as u128) / (d as u128);
    u64::try_from(wide).map_err(|_| EngineError::Overflow)
}

/// Shares minted for a deposit of `amount` against the pre-pull totals.
///
/// Bootstrap rule: an empty share supply mints 1:1 regardless of any assets
/// the vault already holds. A donation parked in the vault before the first
/// deposit is captured by that first depositor -- a documented risk of this
/// rule, preserved as specified rather than silently corrected.
pub fn shares_for_deposit(
    amount: u64,
    total_shares: u64,
    total_assets: u64,
) -> Result<u64, EngineError> {
    if total_shares == 0 {
        return Ok(amount);
    }
    mul_div_floor(amount, total_shares, total_assets)
}

/// Asset amount paid out for redeeming `shares` against the current totals.
pub fn assets_for_shares(
    shares: u64,
    total_shares: u64,
    total_assets: u64,
) -> Result<u64, EngineError> {
    mul_div_floor(shares, total_assets, total_shares)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mul_div_floor_exact() {
        assert_eq!(mul_div_floor(10, 6, 3).unwrap(), 20);
    }

    #[test]
    fn mul_div_floor_rounds_down() {
        assert_eq!(mul_div_floor(100, 100, 105).unwrap(), 95); // 95.238...
        assert_eq!(mul_div_floor(100, 205, 195).unwrap(), 105); // 105.128...
    }

    #[test]
    fn mul_div_floor_survives_u64_products() {
        // a * b overflows u64 but the quotient fits.
        assert_eq!(
            mul_div_floor(u64::MAX, 1_000, 1_000).unwrap(),
            u64::MAX
        );
    }

    #[test]
    fn mul_div_floor_zero_denominator_rejected() {
        assert!(matches!(
            mul_div_floor(1, 1, 0),
            Err(EngineError::Overflow)
        ));
    }

    #[test]
    fn mul_div_floor_oversized_quotient_rejected() {
        assert!(matches!(
            mul_div_floor(u64::MAX, 2, 1),
            Err(EngineError::Overflow)
        ));
    }

    #[test]
    fn bootstrap_mints_one_to_one() {
        assert_eq!(shares_for_deposit(100, 0, 0).unwrap(), 100);
        // Even with a pre-existing donation sitting in the vault.
        assert_eq!(shares_for_deposit(100, 0, 37).unwrap(), 100);
    }

    #[test]
    fn deposit_mint_is_proportional() {
        // Second depositor after 5% uplift: floor(100 * 100 / 105) = 95.
        assert_eq!(shares_for_deposit(100, 100, 105).unwrap(), 95);
    }

    #[test]
    fn payout_is_proportional() {
        // First holder exits after the above: floor(100 * 205 / 195) = 105.
        assert_eq!(assets_for_shares(100, 195, 205).unwrap(), 105);
    }

    #[test]
    fn payout_never_exceeds_exact_proportion() {
        for shares in [1u64, 3, 7, 99, 100] {
            let paid = assets_for_shares(shares, 195, 205).unwrap();
            // paid <= shares * 205 / 195 exactly.
            assert!((paid as u128) * 195 <= (shares as u128) * 205);
        }
    }
}
