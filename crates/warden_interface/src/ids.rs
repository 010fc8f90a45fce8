//! Platform identifiers.

use serde::{Deserialize, Serialize};

/// A platform snowflake id (user, channel, role, guild, ...).
///
/// Stored as `BIGINT` in PostgreSQL, so conversions to and from `i64` are
/// bit-preserving casts.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::From,
)]
#[display("{}", _0)]
#[serde(transparent)]
pub struct Snowflake(pub u64);

impl Snowflake {
    /// Raw id value.
    pub fn get(self) -> u64 {
        self.0
    }

    /// Id as stored in a signed database column.
    pub fn as_i64(self) -> i64 {
        self.0 as i64
    }

    /// Id read back from a signed database column.
    pub fn from_i64(value: i64) -> Self {
        Self(value as u64)
    }

    /// User mention markup, e.g. `<@1234>`.
    pub fn mention(self) -> String {
        format!("<@{}>", self.0)
    }
}

impl std::str::FromStr for Snowflake {
    type Err = std::num::ParseIntError;

    /// Accepts bare ids as well as `<@id>` / `<@!id>` mentions.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim_matches(|c| matches!(c, '<' | '@' | '!' | '>'));
        trimmed.parse::<u64>().map(Self)
    }
}
