//! Template definitions — token structure plus per-key formatting rules.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

use crate::error::EngineError;

/// Name the legacy single-template shape is registered under, and the
/// preferred fallback when a requested template is unknown.
pub const DEFAULT_TEMPLATE: &str = "Default";

/// The single substitution point inside a formatting rule.
pub const VALUE_SLOT: &str = "{value}";

/// Free-text field supplied by the caller rather than a category.
pub const CUSTOM_TEXT_FIELD: &str = "custom_text";

/// Control tokens recognised out of the box.
pub const DEFAULT_RESERVED_MARKERS: &[&str] = &["BREAK_CLIPG", "BREAK_CLIPL"];

pub fn default_reserved_markers() -> FxHashSet<String> {
    DEFAULT_RESERVED_MARKERS
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// One element of a template's structure, classified once at load time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Token {
    /// `{key}` — resolved against the selected field `key`.
    Placeholder(String),
    /// Bare, unbracketed name of a free-text field (legacy form).
    FieldRef(String),
    /// Control marker such as `BREAK_CLIPG`.
    Reserved(String),
    /// Static text, emitted verbatim.
    Literal(String),
}

impl Token {
    /// Classify a raw structure entry.
    ///
    /// Only a token that is *entirely* `{key}` becomes a placeholder; text
    /// with braces embedded among other words stays literal.
    pub fn classify(raw: &str, reserved: &FxHashSet<String>) -> Token {
        let trimmed = raw.trim();
        if let Some(inner) = trimmed
            .strip_prefix('{')
            .and_then(|rest| rest.strip_suffix('}'))
        {
            let key = inner.trim();
            if !key.is_empty() && !key.contains(['{', '}']) {
                return Token::Placeholder(key.to_string());
            }
        }
        if reserved.contains(trimmed) {
            return Token::Reserved(trimmed.to_string());
        }
        if trimmed == CUSTOM_TEXT_FIELD {
            return Token::FieldRef(trimmed.to_string());
        }
        Token::Literal(raw.to_string())
    }

    /// Re-check a marker or literal against a different reserved set.
    /// Field tokens never change class.
    pub fn reclassify(self, reserved: &FxHashSet<String>) -> Token {
        match self {
            Token::Reserved(text) | Token::Literal(text) => Token::classify(&text, reserved),
            field => field,
        }
    }

    /// The field this token resolves, if any.
    pub fn field_key(&self) -> Option<&str> {
        match self {
            Token::Placeholder(key) | Token::FieldRef(key) => Some(key),
            Token::Reserved(_) | Token::Literal(_) => None,
        }
    }
}

/// A named, pre-classified template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub name: String,
    pub tokens: Vec<Token>,
    pub formatting: FxHashMap<String, String>,
}

/// On-disk shape of a single template.
#[derive(Debug, Deserialize)]
struct RawTemplate {
    structure: Vec<String>,
    #[serde(default)]
    formatting: FxHashMap<String, String>,
}

impl Template {
    /// Build a template from raw structure strings.
    pub fn parse<S: AsRef<str>>(
        name: &str,
        structure: &[S],
        formatting: FxHashMap<String, String>,
        reserved: &FxHashSet<String>,
    ) -> Template {
        Template {
            name: name.to_string(),
            tokens: structure
                .iter()
                .map(|raw| Token::classify(raw.as_ref(), reserved))
                .collect(),
            formatting,
        }
    }

    fn from_raw(name: &str, raw: RawTemplate, reserved: &FxHashSet<String>) -> Template {
        Self::parse(name, &raw.structure, raw.formatting, reserved)
    }

    /// Apply the formatting rule for `key`, if one exists.
    ///
    /// A rule without a `{value}` slot cannot carry the value, so the raw
    /// value is used instead.
    pub fn format_value(&self, key: &str, value: &str) -> String {
        match self.formatting.get(key) {
            Some(rule) if rule.contains(VALUE_SLOT) => rule.replacen(VALUE_SLOT, value, 1),
            Some(rule) => {
                warn!(
                    template = %self.name,
                    key,
                    rule = %rule,
                    "formatting rule has no {{value}} slot; using raw value"
                );
                value.to_string()
            }
            None => value.to_string(),
        }
    }

    /// True if any token resolves the given field.
    pub fn references_field(&self, key: &str) -> bool {
        self.tokens.iter().any(|t| t.field_key() == Some(key))
    }

    /// Keys referenced by `{key}` placeholders, in structure order.
    pub fn placeholder_keys(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().filter_map(|t| match t {
            Token::Placeholder(key) => Some(key.as_str()),
            _ => None,
        })
    }
}

/// All templates from one source, keyed by name. Never empty: every
/// constructor installs the hard-coded fallback when nothing usable loads.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateSet {
    templates: BTreeMap<String, Template>,
    fallback: Template,
}

impl TemplateSet {
    /// The minimal set installed when no usable source exists.
    pub fn fallback(reserved: &FxHashSet<String>) -> TemplateSet {
        Self::from_templates(Vec::new(), reserved)
    }

    fn fallback_template(reserved: &FxHashSet<String>) -> Template {
        Template::parse(
            DEFAULT_TEMPLATE,
            &["{subject}", "{style}"],
            FxHashMap::default(),
            reserved,
        )
    }

    /// Build a set from already-constructed templates, keyed by their names.
    pub fn from_templates<I>(templates: I, reserved: &FxHashSet<String>) -> TemplateSet
    where
        I: IntoIterator<Item = Template>,
    {
        let fallback = Self::fallback_template(reserved);
        let mut templates: BTreeMap<String, Template> = templates
            .into_iter()
            .map(|t| (t.name.clone(), t))
            .collect();
        if templates.is_empty() {
            templates.insert(DEFAULT_TEMPLATE.to_string(), fallback.clone());
        }
        TemplateSet {
            templates,
            fallback,
        }
    }

    /// Parse a JSON template source in either the legacy or named shape.
    pub fn parse_json(
        input: &str,
        reserved: &FxHashSet<String>,
    ) -> Result<TemplateSet, EngineError> {
        if input.trim().is_empty() {
            return Ok(Self::fallback(reserved));
        }
        let value: serde_json::Value = serde_json::from_str(input)?;
        if !value.is_object() {
            return Err(EngineError::Content(
                "template source must be an object".to_string(),
            ));
        }
        if value.get("structure").is_some() {
            let raw: RawTemplate = serde_json::from_value(value)?;
            return Ok(Self::from_legacy(raw, reserved));
        }
        let raw: BTreeMap<String, RawTemplate> = serde_json::from_value(value)?;
        Ok(Self::from_named(raw, reserved))
    }

    /// Parse a RON template source: either a single `(structure: .., formatting: ..)`
    /// struct or a map of name → struct.
    pub fn parse_ron(
        input: &str,
        reserved: &FxHashSet<String>,
    ) -> Result<TemplateSet, EngineError> {
        if input.trim().is_empty() {
            return Ok(Self::fallback(reserved));
        }
        if let Ok(raw) = ron::from_str::<RawTemplate>(input) {
            return Ok(Self::from_legacy(raw, reserved));
        }
        let raw: BTreeMap<String, RawTemplate> = ron::from_str(input)?;
        Ok(Self::from_named(raw, reserved))
    }

    fn from_legacy(raw: RawTemplate, reserved: &FxHashSet<String>) -> TemplateSet {
        let template = Template::from_raw(DEFAULT_TEMPLATE, raw, reserved);
        Self::from_templates([template], reserved)
    }

    fn from_named(
        raw: BTreeMap<String, RawTemplate>,
        reserved: &FxHashSet<String>,
    ) -> TemplateSet {
        if raw.is_empty() {
            warn!("template source defines no templates; installing fallback");
            return Self::fallback(reserved);
        }
        let templates: Vec<Template> = raw
            .into_iter()
            .map(|(name, raw)| Template::from_raw(&name, raw, reserved))
            .collect();
        Self::from_templates(templates, reserved)
    }

    /// Re-classify every template's markers against `reserved`.
    pub fn with_reserved(self, reserved: &FxHashSet<String>) -> TemplateSet {
        let reclassify = |template: Template| Template {
            tokens: template
                .tokens
                .into_iter()
                .map(|token| token.reclassify(reserved))
                .collect(),
            ..template
        };
        TemplateSet {
            templates: self
                .templates
                .into_iter()
                .map(|(name, template)| (name, reclassify(template)))
                .collect(),
            fallback: reclassify(self.fallback),
        }
    }

    /// Look up a template, falling back to [`DEFAULT_TEMPLATE`] and then to
    /// the alphabetically first template.
    pub fn resolve_name(&self, requested: &str) -> &Template {
        if let Some(template) = self.templates.get(requested) {
            return template;
        }
        let template = self
            .templates
            .get(DEFAULT_TEMPLATE)
            .or_else(|| self.templates.values().next())
            .unwrap_or(&self.fallback);
        if !requested.is_empty() {
            warn!(
                requested,
                using = %template.name,
                "unknown template; using fallback"
            );
        }
        template
    }

    pub fn get(&self, name: &str) -> Option<&Template> {
        self.templates.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Template> {
        self.templates.values()
    }

    pub fn names(&self) -> Vec<String> {
        self.templates.keys().cloned().collect()
    }
}
