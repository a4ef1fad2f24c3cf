//! Lookup keys and the persisted identity format.
//!
//! A resource identity in state is either a bare name or a composite of a
//! parent container id and a child name, joined by [`IDENTITY_DELIMITER`]:
//!
//! ```text
//! api123#mySource
//! ```
//!
//! The composite format is part of persisted state. Changing it requires a
//! state migration.
//!
//! # Example
//!
//! ```
//! use hemmer_provider_lookup::key::LookupKey;
//!
//! let key = LookupKey::decode_composite("api123#mySource").unwrap();
//! assert_eq!(key.container(), Some("api123"));
//! assert_eq!(key.name_part(), "mySource");
//! assert_eq!(key.encode(), "api123#mySource");
//! ```

use std::fmt;

use crate::error::KeyError;

/// Delimiter between the container id and the name of a composite identity.
pub const IDENTITY_DELIMITER: char = '#';

/// The shape of key a resource kind is addressed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyShape {
    /// A single name.
    Simple,
    /// A parent container id plus a child name.
    Composite,
}

/// Identifier used to request a single remote object.
///
/// Components are guaranteed non-empty, and composite components never
/// contain the delimiter, so `decode(encode(k)) == k` always holds. Keys can
/// only be built through the validating constructors:
///
/// ```compile_fail
/// use hemmer_provider_lookup::key::LookupKey;
///
/// let key = LookupKey::Name(String::new());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LookupKey(Repr);

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
enum Repr {
    Name(String),
    Composite { container: String, name: String },
}

impl LookupKey {
    /// Create a simple key.
    pub fn name(name: impl Into<String>) -> Result<Self, KeyError> {
        let name = name.into();
        if name.is_empty() {
            return Err(KeyError::Empty("name"));
        }
        Ok(Self(Repr::Name(name)))
    }

    /// Create a composite key.
    pub fn composite(
        container: impl Into<String>,
        name: impl Into<String>,
    ) -> Result<Self, KeyError> {
        let container = container.into();
        let name = name.into();
        if container.is_empty() {
            return Err(KeyError::Empty("container id"));
        }
        if name.is_empty() {
            return Err(KeyError::Empty("name"));
        }
        for part in [&container, &name] {
            if part.contains(IDENTITY_DELIMITER) {
                return Err(KeyError::DelimiterInComponent(part.clone()));
            }
        }
        Ok(Self(Repr::Composite { container, name }))
    }

    /// Decode an identity of the given shape.
    pub fn decode(identity: &str, shape: KeyShape) -> Result<Self, KeyError> {
        match shape {
            KeyShape::Simple => Self::name(identity),
            KeyShape::Composite => Self::decode_composite(identity),
        }
    }

    /// Decode a `<container-id>#<name>` identity.
    pub fn decode_composite(identity: &str) -> Result<Self, KeyError> {
        if identity.is_empty() {
            return Err(KeyError::Empty("identity"));
        }
        let parts: Vec<&str> = identity.split(IDENTITY_DELIMITER).collect();
        match parts.as_slice() {
            [_] => Err(KeyError::MissingDelimiter {
                identity: identity.to_string(),
                delimiter: IDENTITY_DELIMITER,
            }),
            [container, name] => Self::composite(*container, *name),
            _ => Err(KeyError::WrongArity {
                identity: identity.to_string(),
                expected: 2,
                found: parts.len(),
            }),
        }
    }

    /// Encode the key into its persisted identity form.
    pub fn encode(&self) -> String {
        self.to_string()
    }

    /// The shape of this key.
    pub fn shape(&self) -> KeyShape {
        match self.0 {
            Repr::Name(_) => KeyShape::Simple,
            Repr::Composite { .. } => KeyShape::Composite,
        }
    }

    /// The object name.
    pub fn name_part(&self) -> &str {
        match &self.0 {
            Repr::Name(name) | Repr::Composite { name, .. } => name,
        }
    }

    /// The container id, for composite keys.
    pub fn container(&self) -> Option<&str> {
        match &self.0 {
            Repr::Name(_) => None,
            Repr::Composite { container, .. } => Some(container),
        }
    }

    /// Require this key to have the given shape.
    pub fn expect_shape(&self, expected: KeyShape) -> Result<&Self, KeyError> {
        if self.shape() == expected {
            Ok(self)
        } else {
            Err(KeyError::ShapeMismatch {
                expected,
                found: self.shape(),
            })
        }
    }
}

impl fmt::Display for LookupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Repr::Name(name) => f.write_str(name),
            Repr::Composite { container, name } => {
                write!(f, "{}{}{}", container, IDENTITY_DELIMITER, name)
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_composite() {
        let key = LookupKey::decode_composite("api123#mySource").unwrap();
        assert_eq!(key.container(), Some("api123"));
        assert_eq!(key.name_part(), "mySource");
        assert_eq!(key.shape(), KeyShape::Composite);
        assert_eq!(key.encode(), "api123#mySource");
    }

    #[test]
    fn test_composite_round_trip() {
        for (container, name) in [("a", "b"), ("xyz-1", "source_2"), ("api", "my.source")] {
            let key = LookupKey::composite(container, name).unwrap();
            let decoded = LookupKey::decode_composite(&key.encode()).unwrap();
            assert_eq!(decoded, key);
        }
    }

    #[test]
    fn test_decode_missing_delimiter() {
        let err = LookupKey::decode_composite("api123").unwrap_err();
        assert!(matches!(err, KeyError::MissingDelimiter { .. }));
        assert!(err.to_string().contains("api123"));
    }

    #[test]
    fn test_decode_wrong_arity() {
        let err = LookupKey::decode_composite("a#b#c").unwrap_err();
        assert_eq!(
            err,
            KeyError::WrongArity {
                identity: "a#b#c".to_string(),
                expected: 2,
                found: 3,
            }
        );
    }

    #[test]
    fn test_decode_empty_parts() {
        assert_eq!(
            LookupKey::decode_composite("").unwrap_err(),
            KeyError::Empty("identity")
        );
        assert_eq!(
            LookupKey::decode_composite("#name").unwrap_err(),
            KeyError::Empty("container id")
        );
        assert_eq!(
            LookupKey::decode_composite("api#").unwrap_err(),
            KeyError::Empty("name")
        );
    }

    #[test]
    fn test_composite_rejects_delimiter_in_component() {
        let err = LookupKey::composite("api", "my#source").unwrap_err();
        assert_eq!(err, KeyError::DelimiterInComponent("my#source".to_string()));
    }

    #[test]
    fn test_invalid_components_never_produce_a_key() {
        assert_eq!(LookupKey::name("").unwrap_err(), KeyError::Empty("name"));
        assert_eq!(
            LookupKey::decode("", KeyShape::Simple).unwrap_err(),
            KeyError::Empty("name")
        );
        assert_eq!(
            LookupKey::composite("a#b", "c").unwrap_err(),
            KeyError::DelimiterInComponent("a#b".to_string())
        );
        assert_eq!(
            LookupKey::composite("", "c").unwrap_err(),
            KeyError::Empty("container id")
        );
    }

    #[test]
    fn test_simple_key() {
        let key = LookupKey::decode("missing-group", KeyShape::Simple).unwrap();
        assert_eq!(key, LookupKey::name("missing-group").unwrap());
        assert_eq!(key.container(), None);
        assert_eq!(key.to_string(), "missing-group");
        assert!(LookupKey::name("").is_err());
    }

    #[test]
    fn test_expect_shape() {
        let key = LookupKey::name("alice").unwrap();
        assert!(key.expect_shape(KeyShape::Simple).is_ok());
        assert_eq!(
            key.expect_shape(KeyShape::Composite).unwrap_err(),
            KeyError::ShapeMismatch {
                expected: KeyShape::Composite,
                found: KeyShape::Simple,
            }
        );
    }
}
