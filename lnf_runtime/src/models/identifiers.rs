//! Prefixed identifiers shared by the owner, tag and session flows.
//!
//! Identifiers travel as plain strings. Their prefixes double as the
//! protected prefixes of [`crate::sanitize::mask_sensitive`].

use schemars::{json_schema, JsonSchema, Schema, SchemaGenerator};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

macro_rules! prefixed_identifier {
    (
        $(#[$meta:meta])*
        $name:ident {
            prefix: $prefix:literal,
            alphabet: $alphabet:literal,
            min: $min:literal,
            max: $max:literal,
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub const PREFIX: &'static str = $prefix;

            /// Anchored pattern the full identifier must match.
            pub fn pattern() -> String {
                format!("^{}[{}]{{{},{}}}$", $prefix, $alphabet, $min, $max)
            }

            /// The part after the prefix, if the prefix is present.
            pub fn suffix(&self) -> Option<&str> {
                self.0.strip_prefix($prefix)
            }
        }

        impl JsonSchema for $name {
            fn schema_name() -> Cow<'static, str> {
                stringify!($name).into()
            }

            fn json_schema(_: &mut SchemaGenerator) -> Schema {
                json_schema!({
                    "type": "string",
                    "pattern": Self::pattern(),
                    "minLength": $prefix.len() + $min,
                    "maxLength": $prefix.len() + $max,
                })
            }
        }
    };
}

prefixed_identifier! {
    /// `owner_` + url-safe base64 SHA-256 digest.
    OwnerHash {
        prefix: "owner_",
        alphabet: "A-Za-z0-9_-",
        min: 43,
        max: 43,
    }
}

prefixed_identifier! {
    /// Public code printed on a physical tag.
    TagCode {
        prefix: "tag_",
        alphabet: "A-Z0-9_-",
        min: 32,
        max: 64,
    }
}

prefixed_identifier! {
    /// Opaque session token handed to an authenticated owner.
    SessionToken {
        prefix: "sessiontok_",
        alphabet: "A-Za-z0-9_-",
        min: 43,
        max: 86,
    }
}

/// Prefixes of every identifier type above.
pub const IDENTIFIER_PREFIXES: [&str; 3] =
    [OwnerHash::PREFIX, TagCode::PREFIX, SessionToken::PREFIX];

/// Unix timestamp in seconds, bounded to 2025-01-01 ..= 2050-12-31.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub const MIN: i64 = 1_735_689_600;
    pub const MAX: i64 = 2_556_057_599;
}

impl JsonSchema for Timestamp {
    fn schema_name() -> Cow<'static, str> {
        "Timestamp".into()
    }

    fn json_schema(_: &mut SchemaGenerator) -> Schema {
        json_schema!({
            "type": "integer",
            "minimum": Self::MIN,
            "maximum": Self::MAX,
            "description": "Unix timestamp (seconds since epoch) between 2025-01-01 and 2050-12-31",
        })
    }
}

/// PEM-encoded public key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PublicKey(pub String);

impl JsonSchema for PublicKey {
    fn schema_name() -> Cow<'static, str> {
        "PublicKey".into()
    }

    fn json_schema(_: &mut SchemaGenerator) -> Schema {
        json_schema!({
            "type": "string",
            "pattern": "^-----BEGIN PUBLIC KEY-----(.|\\n)+-----END PUBLIC KEY-----\\n?$",
        })
    }
}
