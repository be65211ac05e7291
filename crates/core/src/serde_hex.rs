//! Serde helpers for opaque byte payloads, stored as hex strings

use serde::{Deserialize, Deserializer, Serializer};

/// Serialize bytes as a lowercase hex string
pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&hex::encode(bytes))
}

/// Deserialize bytes from a hex string (an optional `0x` prefix is accepted)
pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    let digits = s.strip_prefix("0x").unwrap_or(&s);
    hex::decode(digits).map_err(serde::de::Error::custom)
}
