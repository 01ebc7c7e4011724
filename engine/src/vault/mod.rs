//! # Vault Module -- Proportional Share Accounting
//!
//! Where the pooled value lives. A vault accepts deposits of one asset,
//! issues ownership shares priced by the current assets-per-share ratio,
//! and redeems them later against whatever the pool is worth by then --
//! including value sitting at a delegated yield source.
//!
//! ```text
//! math.rs   -- the two floor-division conversions, as pure functions
//! shares.rs -- ShareBook: per-user balances + total, conservation by
//!              construction
//! ledger.rs -- Vault: deposit/withdraw/forced-withdraw, adapter
//!              delegation, admin surface, receipts
//! ```

pub mod ledger;
pub mod math;
pub mod shares;

pub use ledger::{DepositReceipt, Vault, VaultId, WithdrawReceipt};
pub use math::{assets_for_shares, mul_div_floor, shares_for_deposit};
pub use shares::ShareBook;
