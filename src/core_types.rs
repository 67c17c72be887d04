//! Core types used throughout the system
//!
//! Identifiers, the supported networks and the per-network balance snapshot.
//! Every other module builds on these.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// User ID - issued by the platform's identity service, carried as the JWT `sub`.
pub type UserId = i64;

/// Declares a ULID-backed identifier.
///
/// ULIDs are sortable by creation time and need no coordination between
/// gateway instances. Serialized as the canonical 26-char string.
macro_rules! ulid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(ulid::Ulid);

        impl $name {
            pub fn new() -> Self {
                Self(ulid::Ulid::new())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ulid::DecodeError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(ulid::Ulid::from_string(s)?))
            }
        }

        impl Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.0.to_string())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

ulid_id!(
    /// Liquidity position identifier
    PositionId
);

ulid_id!(
    /// Transaction record identifier, also the idempotency reference handed to the relay
    TransactionId
);

/// Supported settlement networks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Base,
    Solana,
}

impl Network {
    pub const ALL: [Network; 2] = [Network::Base, Network::Solana];

    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Base => "base",
            Network::Solana => "solana",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Network {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "base" => Ok(Network::Base),
            "solana" => Ok(Network::Solana),
            _ => Err(format!("Unsupported network: {}", s)),
        }
    }
}

/// Per-network balance snapshot of a position.
///
/// The total is always derived, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkBalances {
    pub base: Decimal,
    pub solana: Decimal,
}

impl NetworkBalances {
    pub fn new(base: Decimal, solana: Decimal) -> Self {
        Self { base, solana }
    }

    pub fn get(&self, network: Network) -> Decimal {
        match network {
            Network::Base => self.base,
            Network::Solana => self.solana,
        }
    }

    pub fn total(&self) -> Decimal {
        self.base + self.solana
    }
}
