//! # Ports -- External Capability Boundaries
//!
//! The engine moves value only through three narrow capability traits. Each
//! is a trust boundary: the ledgers validate their own invariants before
//! calling out, and treat the port implementations as cooperating
//! components, not adversaries.
//!
//! ```text
//! asset_transfer.rs -- fungible-asset movement (balance_of/transfer/
//!                      transfer_from/approve) + the in-memory reference bank
//! yield_adapter.rs  -- idle-balance delegation to an external yield source
//! exchange.rs       -- asset-for-asset conversion used by reallocation
//! ```
//!
//! The reference implementations (`InMemoryBank`, `SimulatedYieldAdapter`,
//! `IdentityExchange`) back the test suites and the demo binary. A hosting
//! system supplies its own implementations for production use.

pub mod asset_transfer;
pub mod exchange;
pub mod yield_adapter;

pub use asset_transfer::{AssetTransferPort, InMemoryBank};
pub use exchange::{ExchangePort, IdentityExchange};
pub use yield_adapter::{SimulatedYieldAdapter, YieldAdapterPort};
