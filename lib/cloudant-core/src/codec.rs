//! Model codec helpers: open records, base64 byte fields and string enums.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::{Error, Result};

// ============================================================================
// Open Records
// ============================================================================

/// A record with declared fields plus a bag of arbitrary extra properties.
///
/// Extra properties are flattened into the same JSON object as the declared
/// fields. A property may never share a name with a declared field; the
/// setters reject such names, and decoding routes declared names to their
/// fields, so the two sets stay disjoint.
///
/// Implemented with `#[derive(OpenRecord)]`:
///
/// ```ignore
/// #[derive(Serialize, Deserialize, OpenRecord)]
/// pub struct Document {
///     #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
///     pub id: Option<String>,
///     #[serde(flatten)]
///     #[open(properties)]
///     properties: Map<String, Value>,
/// }
/// ```
pub trait OpenRecord {
    /// Wire names of the declared fields.
    const DECLARED_FIELDS: &'static [&'static str];

    /// Extra properties, in insertion order as received.
    fn properties(&self) -> &Map<String, Value>;

    #[doc(hidden)]
    fn properties_mut_unchecked(&mut self) -> &mut Map<String, Value>;

    /// Returns `true` if `name` is a declared field.
    #[must_use]
    fn is_declared(name: &str) -> bool {
        Self::DECLARED_FIELDS.contains(&name)
    }

    /// A single extra property.
    fn property(&self, name: &str) -> Option<&Value> {
        self.properties().get(name)
    }

    /// Set an extra property, returning the previous value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `name` is a declared field, or an
    /// encode error if `value` cannot be represented as JSON.
    fn set_property<V: Serialize>(
        &mut self,
        name: impl Into<String>,
        value: V,
    ) -> Result<Option<Value>> {
        let name = name.into();
        if Self::is_declared(&name) {
            return Err(Error::invalid_argument(format!(
                "`{name}` is a declared field and cannot be set as a property"
            )));
        }
        let value = serde_json::to_value(value)?;
        Ok(self.properties_mut_unchecked().insert(name, value))
    }

    /// Remove an extra property.
    fn remove_property(&mut self, name: &str) -> Option<Value> {
        self.properties_mut_unchecked().remove(name)
    }

    /// Builder-style [`OpenRecord::set_property`].
    ///
    /// # Errors
    ///
    /// Same as [`OpenRecord::set_property`].
    fn with_property<V: Serialize>(mut self, name: impl Into<String>, value: V) -> Result<Self>
    where
        Self: Sized,
    {
        self.set_property(name, value)?;
        Ok(self)
    }
}

// ============================================================================
// Base64 byte fields
// ============================================================================

/// Serde adapter for byte fields carried as standard base64 strings.
///
/// Use with `#[serde(with = "cloudant_core::base64_bytes")]` on a `Vec<u8>`.
pub mod base64_bytes {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer, Serializer};

    /// Encode bytes as a base64 string.
    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    /// Decode a base64 string into bytes.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = <std::borrow::Cow<'de, str>>::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }

    /// The same adapter for `Option<Vec<u8>>` fields.
    pub mod option {
        use super::STANDARD;
        use base64::Engine;
        use serde::{Deserialize, Deserializer, Serializer};

        /// Encode optional bytes as a base64 string.
        #[allow(clippy::ref_option)]
        pub fn serialize<S: Serializer>(
            bytes: &Option<Vec<u8>>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match bytes {
                Some(bytes) => serializer.serialize_str(&STANDARD.encode(bytes)),
                None => serializer.serialize_none(),
            }
        }

        /// Decode an optional base64 string into bytes.
        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<Vec<u8>>, D::Error> {
            <Option<String>>::deserialize(deserializer)?
                .map(|encoded| STANDARD.decode(encoded).map_err(serde::de::Error::custom))
                .transpose()
        }
    }
}

// ============================================================================
// String enums
// ============================================================================

/// Declare a forward-compatible string enum.
///
/// Each known variant maps to a wire string. Unrecognised strings decode into
/// an `Unknown(String)` variant instead of failing; encoding an `Unknown`
/// value fails, so unrecognised values are never sent back to the server.
///
/// ```
/// cloudant_core::string_enum! {
///     /// Replication state.
///     pub enum State {
///         /// Running.
///         Running => "running",
///         /// Done.
///         Completed => "completed",
///     }
/// }
///
/// let state: State = serde_json::from_str(r#""paused""#).unwrap();
/// assert!(state.is_unknown());
/// assert!(serde_json::to_string(&state).is_err());
/// assert_eq!(serde_json::to_string(&State::Running).unwrap(), r#""running""#);
/// ```
#[macro_export]
macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident => $value:literal
            ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        $vis enum $name {
            $(
                $(#[$variant_meta])*
                $variant,
            )+
            /// A value this version of the library does not recognise.
            Unknown(::std::string::String),
        }

        impl $name {
            /// Wire strings of every known variant.
            pub const KNOWN: &'static [&'static str] = &[$($value),+];

            /// The wire string of this value.
            #[must_use]
            pub fn as_str(&self) -> &str {
                match self {
                    $(Self::$variant => $value,)+
                    Self::Unknown(value) => value.as_str(),
                }
            }

            /// Returns `true` for values outside the known set.
            #[must_use]
            pub const fn is_unknown(&self) -> bool {
                matches!(self, Self::Unknown(_))
            }

            fn from_wire(value: &str) -> Self {
                match value {
                    $($value => Self::$variant,)+
                    other => Self::Unknown(other.to_owned()),
                }
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::std::convert::From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::from_wire(value)
            }
        }

        impl $crate::__private::serde::Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> ::std::result::Result<S::Ok, S::Error>
            where
                S: $crate::__private::serde::Serializer,
            {
                match self {
                    Self::Unknown(value) => ::std::result::Result::Err(
                        <S::Error as $crate::__private::serde::ser::Error>::custom(
                            ::std::format!(
                                "`{}` is not a known {} value",
                                value,
                                ::std::stringify!($name)
                            ),
                        ),
                    ),
                    known => serializer.serialize_str(known.as_str()),
                }
            }
        }

        impl<'de> $crate::__private::serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> ::std::result::Result<Self, D::Error>
            where
                D: $crate::__private::serde::Deserializer<'de>,
            {
                let value = <::std::string::String as $crate::__private::serde::Deserialize>::deserialize(
                    deserializer,
                )?;
                ::std::result::Result::Ok(Self::from_wire(&value))
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use assert2::{check, let_assert};
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Default, Serialize, Deserialize)]
    struct Record {
        #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        #[serde(flatten)]
        properties: Map<String, Value>,
    }

    impl OpenRecord for Record {
        const DECLARED_FIELDS: &'static [&'static str] = &["_id"];

        fn properties(&self) -> &Map<String, Value> {
            &self.properties
        }

        fn properties_mut_unchecked(&mut self) -> &mut Map<String, Value> {
            &mut self.properties
        }
    }

    crate::string_enum! {
        enum Color {
            Red => "red",
            Blue => "blue",
        }
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Attachment {
        #[serde(with = "crate::base64_bytes")]
        data: Vec<u8>,
        #[serde(default, with = "crate::base64_bytes::option", skip_serializing_if = "Option::is_none")]
        digest: Option<Vec<u8>>,
    }

    #[test]
    fn open_record_keeps_unknown_keys() {
        let record: Record =
            serde_json::from_str(r#"{"_id":"a","color":"red","legs":4}"#).expect("decode");

        check!(record.id.as_deref() == Some("a"));
        check!(record.property("color") == Some(&Value::from("red")));
        check!(record.property("_id").is_none());

        let encoded = serde_json::to_value(&record).expect("encode");
        check!(encoded == serde_json::json!({"_id": "a", "color": "red", "legs": 4}));
    }

    #[test]
    fn open_record_rejects_declared_names() {
        let mut record = Record::default();
        let result = record.set_property("_id", "other");

        let_assert!(Err(Error::InvalidArgument(message)) = result);
        check!(message.contains("_id"));
        check!(record.properties().is_empty());
    }

    #[test]
    fn open_record_builder_and_remove() {
        let mut record = Record::default()
            .with_property("name", "zebra")
            .expect("set");

        check!(record.set_property("name", "okapi").expect("set") == Some(Value::from("zebra")));
        check!(record.remove_property("name") == Some(Value::from("okapi")));
        check!(record.properties().is_empty());
    }

    #[test]
    fn string_enum_known_and_unknown() {
        let known: Color = serde_json::from_str(r#""blue""#).expect("decode");
        check!(known == Color::Blue);
        check!(serde_json::to_string(&known).expect("encode") == r#""blue""#);

        let unknown: Color = serde_json::from_str(r#""green""#).expect("decode");
        check!(unknown == Color::Unknown("green".to_string()));
        check!(unknown.is_unknown());
        check!(unknown.to_string() == "green");
        check!(Color::KNOWN == &["red", "blue"]);
    }

    #[test]
    fn string_enum_unknown_fails_to_encode() {
        let err = crate::to_json(&Color::from("green")).expect_err("should fail");
        check!(err.kind() == crate::ErrorKind::EncodeError);
        check!(err.to_string().contains("not a known Color value"));
    }

    #[test]
    fn base64_fields() {
        let attachment = Attachment {
            data: b"hello".to_vec(),
            digest: None,
        };
        let encoded = serde_json::to_string(&attachment).expect("encode");
        check!(encoded == r#"{"data":"aGVsbG8="}"#);

        let decoded: Attachment =
            serde_json::from_str(r#"{"data":"aGVsbG8=","digest":"AQI="}"#).expect("decode");
        check!(decoded.data == b"hello");
        check!(decoded.digest == Some(vec![1, 2]));

        let bad = serde_json::from_str::<Attachment>(r#"{"data":"!!"}"#);
        check!(bad.is_err());
    }
}
