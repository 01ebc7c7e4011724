//! # Account Identity
//!
//! Every holder of value in COFFER -- a user, a vault's own treasury, a
//! yield adapter, the reallocation coordinator's custodian -- is addressed
//! by an [`AccountId`]. The engine does not interpret the identifier beyond
//! equality; key management and signature verification belong to the
//! hosting system.
//!
//! The empty identifier is reserved as the **null account**. It can never
//! send or receive: every operation that takes a receiver rejects it up
//! front, so value cannot be burned by a typo'd destination.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies a single account in the engine.
///
/// Wraps an opaque identifier string (e.g. `cof:a3b2c1...`). Accounts are
/// compared by exact string equality and used as map keys throughout the
/// share and reward tables.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountId(String);

impl AccountId {
    /// Creates an account id from an identifier string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the reserved null account.
    ///
    /// The null account is the designated "nowhere" destination. Operations
    /// reject it with `InvalidAddress` before touching any state.
    pub fn null() -> Self {
        Self(String::new())
    }

    /// Returns `true` if this is the null account.
    pub fn is_null(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the identifier string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for AccountId {
    /// The null account. A defaulted record field stays unroutable until
    /// explicitly assigned.
    fn default() -> Self {
        Self::null()
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "<null>")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

impl From<&str> for AccountId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_account_is_null() {
        assert!(AccountId::null().is_null());
        assert!(!AccountId::new("cof:alice").is_null());
    }

    #[test]
    fn display_marks_null() {
        assert_eq!(AccountId::null().to_string(), "<null>");
        assert_eq!(AccountId::new("cof:alice").to_string(), "cof:alice");
    }

    #[test]
    fn equality_is_exact() {
        assert_eq!(AccountId::new("cof:a"), AccountId::from("cof:a"));
        assert_ne!(AccountId::new("cof:a"), AccountId::new("cof:A"));
    }

    #[test]
    fn account_serialization_roundtrip() {
        let id = AccountId::new("cof:alice");
        let json = serde_json::to_string(&id).expect("serialize");
        let recovered: AccountId = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(id, recovered);
    }
}
