//! # Asset Identity
//!
//! Every fungible asset the engine accounts for -- the asset a vault pools,
//! the reward asset an accumulator pays out -- is referenced by an
//! [`AssetId`]. IDs are deterministic BLAKE3 hashes of the asset's canonical
//! properties (name, symbol, issuer), so the same asset always gets the same
//! ID regardless of where it is registered. No registry coordination needed.
//!
//! The engine never looks inside an asset; all balance movement goes through
//! the [`crate::ports::AssetTransferPort`] capability.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// AssetId
// ---------------------------------------------------------------------------

/// A unique, content-addressed identifier for a fungible asset.
///
/// Computed as `BLAKE3(name || 0x00 || symbol || 0x00 || issuer)`. The
/// separator bytes prevent ambiguity when one field's suffix matches another
/// field's prefix.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssetId([u8; 32]);

impl AssetId {
    /// Creates an `AssetId` from a raw 32-byte hash.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Returns the raw 32-byte identifier.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Returns the hex-encoded asset ID.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parses a hex-encoded asset ID.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s)?;
        if bytes.len() != 32 {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }

    /// Derives an `AssetId` from the asset's canonical properties.
    pub fn derive(name: &str, symbol: &str, issuer: &str) -> Self {
        let mut preimage = Vec::with_capacity(name.len() + symbol.len() + issuer.len() + 2);
        preimage.extend_from_slice(name.as_bytes());
        preimage.push(0x00);
        preimage.extend_from_slice(symbol.as_bytes());
        preimage.push(0x00);
        preimage.extend_from_slice(issuer.as_bytes());

        Self(*blake3::hash(&preimage).as_bytes())
    }
}

impl fmt::Debug for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AssetId({}...)", &self.to_hex()[..12])
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl std::str::FromStr for AssetId {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

// ---------------------------------------------------------------------------
// Serde helper for AssetId-keyed maps
// ---------------------------------------------------------------------------

/// Serializes a `HashMap<AssetId, V>` with hex-string keys.
///
/// Use with `#[serde(with = "asset_id_map")]` on any `AssetId`-keyed map
/// field. A bare `[u8; 32]` key would serialize as a byte array, which JSON
/// objects cannot key on; routing the keys through their hex form keeps the
/// registry and reward tables printable.
pub mod asset_id_map {
    use super::AssetId;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::HashMap;

    pub fn serialize<V, S>(map: &HashMap<AssetId, V>, serializer: S) -> Result<S::Ok, S::Error>
    where
        V: Serialize,
        S: Serializer,
    {
        use serde::ser::SerializeMap;
        let mut ser_map = serializer.serialize_map(Some(map.len()))?;
        for (key, value) in map {
            ser_map.serialize_entry(&key.to_hex(), value)?;
        }
        ser_map.end()
    }

    pub fn deserialize<'de, V, D>(deserializer: D) -> Result<HashMap<AssetId, V>, D::Error>
    where
        V: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        let string_map: HashMap<String, V> = HashMap::deserialize(deserializer)?;
        string_map
            .into_iter()
            .map(|(key, value)| {
                AssetId::from_hex(&key)
                    .map(|id| (id, value))
                    .map_err(serde::de::Error::custom)
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derivation_is_deterministic() {
        let a = AssetId::derive("Coffer USD", "cUSD", "cof:issuer");
        let b = AssetId::derive("Coffer USD", "cUSD", "cof:issuer");
        assert_eq!(a, b);
    }

    #[test]
    fn different_properties_produce_different_ids() {
        let base = AssetId::derive("Coffer USD", "cUSD", "cof:issuer");
        assert_ne!(base, AssetId::derive("Coffer EUR", "cUSD", "cof:issuer"));
        assert_ne!(base, AssetId::derive("Coffer USD", "cEUR", "cof:issuer"));
        assert_ne!(base, AssetId::derive("Coffer USD", "cUSD", "cof:other"));
    }

    #[test]
    fn separator_prevents_field_bleed() {
        // "ab" + "c" must not collide with "a" + "bc".
        let a = AssetId::derive("ab", "c", "i");
        let b = AssetId::derive("a", "bc", "i");
        assert_ne!(a, b);
    }

    #[test]
    fn hex_roundtrip() {
        let id = AssetId::derive("Coffer USD", "cUSD", "cof:issuer");
        let recovered = AssetId::from_hex(&id.to_hex()).unwrap();
        assert_eq!(id, recovered);
    }

    #[test]
    fn from_hex_rejects_bad_length() {
        assert!(AssetId::from_hex("deadbeef").is_err());
    }

    #[test]
    fn asset_id_map_roundtrip() {
        use serde::{Deserialize, Serialize};
        use std::collections::HashMap;

        #[derive(Serialize, Deserialize)]
        struct Holder {
            #[serde(with = "super::asset_id_map")]
            entries: HashMap<AssetId, u64>,
        }

        let mut entries = HashMap::new();
        entries.insert(AssetId::derive("A", "A", "i"), 7u64);
        entries.insert(AssetId::derive("B", "B", "i"), 11u64);
        let holder = Holder { entries };

        let json = serde_json::to_string(&holder).expect("serialize");
        let recovered: Holder = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(recovered.entries.len(), 2);
        assert_eq!(recovered.entries[&AssetId::derive("A", "A", "i")], 7);
    }
}
