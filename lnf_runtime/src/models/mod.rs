//! Platform data models.
//!
//! Every model derives (or hand-implements) [`schemars::JsonSchema`]; the
//! devtools registry picks them up by type, so adding a model here and
//! registering it is all it takes to publish it under `components.schemas`.

/// Declares a single-value discriminator type for a `kind` property.
///
/// The type serializes to the literal and publishes `{"type": "string",
/// "const": <literal>}` inline, so every model carrying it exposes a `kind`
/// property with a fixed value.
macro_rules! kind_tag {
    ($(#[$meta:meta])* $name:ident => $value:literal) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize,
        )]
        pub enum $name {
            #[default]
            #[serde(rename = $value)]
            Tag,
        }

        impl $name {
            /// Literal carried on the wire.
            pub const VALUE: &'static str = $value;
        }

        impl schemars::JsonSchema for $name {
            fn schema_name() -> std::borrow::Cow<'static, str> {
                stringify!($name).into()
            }

            fn inline_schema() -> bool {
                true
            }

            fn json_schema(_: &mut schemars::SchemaGenerator) -> schemars::Schema {
                schemars::json_schema!({ "type": "string", "const": $value })
            }
        }
    };
}

pub(crate) use kind_tag;

pub mod identifiers;
pub mod owner;
pub mod response;
