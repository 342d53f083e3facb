// ── Core identity type ──
//
// Every record carries a server-assigned string id. Most backends hand out
// ObjectId-style hex strings, which double as a creation-order key: a larger
// hex value is a newer record.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Canonical identifier for any fleet entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the id parses as a base-16 integer.
    pub fn is_hex(&self) -> bool {
        hex_digits(&self.0).is_some()
    }

    /// Compare two ids as arbitrary-length base-16 integers.
    ///
    /// Returns `None` when either id has no numeric value.
    pub fn hex_cmp(&self, other: &Self) -> Option<Ordering> {
        let a = hex_digits(&self.0)?;
        let b = hex_digits(&other.0)?;
        Some(a.len().cmp(&b.len()).then_with(|| a.cmp(&b)))
    }

    /// Newest-first ordering on hex value.
    ///
    /// Ids without a numeric value sort after every hex id. Ties (equal
    /// numeric value, or two non-hex ids) fall back to the raw string so the
    /// order is total and deterministic.
    pub fn cmp_hex_desc(&self, other: &Self) -> Ordering {
        let by_value = match (self.is_hex(), other.is_hex()) {
            (true, true) => self
                .hex_cmp(other)
                .map_or(Ordering::Equal, Ordering::reverse),
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            (false, false) => Ordering::Equal,
        };
        by_value.then_with(|| self.0.cmp(&other.0))
    }
}

/// Lowercased digits with leading zeros stripped, or `None` if not hex.
fn hex_digits(raw: &str) -> Option<String> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let trimmed = raw.trim_start_matches('0');
    Some(trimmed.to_ascii_lowercase())
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for EntityId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl AsRef<str> for EntityId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
