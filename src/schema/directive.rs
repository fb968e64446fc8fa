//! Per-field selection directives.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How a single field is resolved for one invocation.
///
/// Serialized as a plain string: `"disabled"`, `"random"`, or any other
/// text, which is taken literally.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Directive {
    /// Resolves to the empty string.
    #[default]
    Disabled,
    /// Draws one snippet from the field's category.
    Random,
    /// Used verbatim; still subject to wildcard expansion.
    Explicit(String),
}

impl Directive {
    /// Interpret a host-supplied value. Unknown values are explicit text.
    pub fn parse(value: &str) -> Directive {
        match value {
            "disabled" => Directive::Disabled,
            "random" => Directive::Random,
            other => Directive::Explicit(other.to_string()),
        }
    }

    pub fn is_disabled(&self) -> bool {
        matches!(self, Directive::Disabled)
    }
}

impl From<String> for Directive {
    fn from(value: String) -> Self {
        match value.as_str() {
            "disabled" => Directive::Disabled,
            "random" => Directive::Random,
            _ => Directive::Explicit(value),
        }
    }
}

impl From<&str> for Directive {
    fn from(value: &str) -> Self {
        Directive::parse(value)
    }
}

impl From<Directive> for String {
    fn from(directive: Directive) -> Self {
        directive.to_string()
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Directive::Disabled => f.write_str("disabled"),
            Directive::Random => f.write_str("random"),
            Directive::Explicit(text) => f.write_str(text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_keywords() {
        assert_eq!(Directive::parse("disabled"), Directive::Disabled);
        assert_eq!(Directive::parse("random"), Directive::Random);
    }

    #[test]
    fn unknown_value_is_explicit() {
        assert_eq!(
            Directive::parse("golden hour"),
            Directive::Explicit("golden hour".to_string())
        );
        // Keywords are case-sensitive, matching the host's option values.
        assert_eq!(
            Directive::parse("Random"),
            Directive::Explicit("Random".to_string())
        );
    }

    #[test]
    fn default_is_disabled() {
        assert!(Directive::default().is_disabled());
    }

    #[test]
    fn json_uses_plain_strings() {
        let directives: Vec<Directive> =
            serde_json::from_str(r#"["random", "disabled", "a red scarf"]"#).unwrap();
        assert_eq!(
            directives,
            vec![
                Directive::Random,
                Directive::Disabled,
                Directive::Explicit("a red scarf".to_string()),
            ]
        );
        let back = serde_json::to_string(&directives).unwrap();
        assert_eq!(back, r#"["random","disabled","a red scarf"]"#);
    }
}
