//! Template assembly — walks a template's tokens and emits ordered parts
//! plus a selection log.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::schema::template::{Template, Token, CUSTOM_TEXT_FIELD};

/// What to do with reserved control markers such as `BREAK_CLIPG`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReservedMarkerPolicy {
    /// Skip the marker entirely.
    #[default]
    Drop,
    /// Emit the marker verbatim as its own part.
    PassThrough,
}

/// Output of one assembly pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Assembly {
    /// Free text placed ahead of the templated body, if any.
    pub lead: Option<String>,
    /// Body fragments in structure order.
    pub parts: Vec<String>,
    /// `"field: value"` lines, custom text first, then structure order.
    pub log: Vec<String>,
}

/// Walks template structure against resolved field values.
#[derive(Debug, Clone, Copy, Default)]
pub struct Assembler {
    reserved_policy: ReservedMarkerPolicy,
}

impl Assembler {
    pub fn new(reserved_policy: ReservedMarkerPolicy) -> Self {
        Self { reserved_policy }
    }

    /// Assemble `template` from `resolved` field values.
    ///
    /// Empty values contribute neither a part nor a log line. The custom
    /// text is placed inline when the template names it, and otherwise
    /// becomes the lead.
    pub fn assemble(
        &self,
        template: &Template,
        resolved: &BTreeMap<String, String>,
        custom_text: &str,
    ) -> Assembly {
        let mut assembly = Assembly::default();
        let custom_text = custom_text.trim();
        let custom_inline = template.references_field(CUSTOM_TEXT_FIELD);

        if !custom_inline && !custom_text.is_empty() {
            assembly.log.push(log_line(CUSTOM_TEXT_FIELD, custom_text));
            assembly.lead = Some(custom_text.to_string());
        }

        for token in &template.tokens {
            match token {
                Token::Reserved(marker) => {
                    if self.reserved_policy == ReservedMarkerPolicy::PassThrough {
                        assembly.parts.push(marker.clone());
                    }
                }
                Token::Placeholder(key) | Token::FieldRef(key) => {
                    let value = if key == CUSTOM_TEXT_FIELD {
                        custom_text
                    } else {
                        resolved.get(key).map(String::as_str).unwrap_or("")
                    };
                    if value.is_empty() {
                        continue;
                    }
                    assembly.log.push(log_line(key, value));
                    assembly.parts.push(template.format_value(key, value));
                }
                Token::Literal(text) => assembly.parts.push(text.clone()),
            }
        }

        assembly
    }
}

fn log_line(field: &str, value: &str) -> String {
    format!("{field}: {value}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::template::default_reserved_markers;
    use rustc_hash::FxHashMap;

    fn template(structure: &[&str], formatting: &[(&str, &str)]) -> Template {
        let formatting: FxHashMap<String, String> = formatting
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Template::parse("test", structure, formatting, &default_reserved_markers())
    }

    fn resolved(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn parts_follow_structure_order() {
        let t = template(&["{subject}", "painted in", "{style}", "style"], &[]);
        let a = Assembler::default().assemble(
            &t,
            &resolved(&[("style", "watercolor"), ("subject", "a fox")]),
            "",
        );
        assert_eq!(a.parts, vec!["a fox", "painted in", "watercolor", "style"]);
        assert_eq!(a.log, vec!["subject: a fox", "style: watercolor"]);
        assert_eq!(a.lead, None);
    }

    #[test]
    fn formatting_rule_applied() {
        let t = template(&["{lighting}"], &[("lighting", "illuminated by {value}")]);
        let a = Assembler::default().assemble(&t, &resolved(&[("lighting", "neon glow")]), "");
        assert_eq!(a.parts, vec!["illuminated by neon glow"]);
        // The log records the raw selection, not the formatted fragment.
        assert_eq!(a.log, vec!["lighting: neon glow"]);
    }

    #[test]
    fn empty_field_leaves_no_trace() {
        let t = template(&["{a}", "{b}"], &[("a", "with {value}")]);
        let a = Assembler::default().assemble(&t, &resolved(&[("a", ""), ("b", "dog")]), "");
        assert_eq!(a.parts, vec!["dog"]);
        assert_eq!(a.log, vec!["b: dog"]);
    }

    #[test]
    fn unresolved_placeholder_contributes_nothing() {
        let t = template(&["{missing}", "tail"], &[]);
        let a = Assembler::default().assemble(&t, &BTreeMap::new(), "");
        assert_eq!(a.parts, vec!["tail"]);
        assert!(a.log.is_empty());
    }

    #[test]
    fn reserved_marker_policies() {
        let t = template(&["{a}", "BREAK_CLIPG", "{b}"], &[]);
        let r = resolved(&[("a", "x"), ("b", "y")]);

        let dropped = Assembler::new(ReservedMarkerPolicy::Drop).assemble(&t, &r, "");
        assert_eq!(dropped.parts, vec!["x", "y"]);

        let passed = Assembler::new(ReservedMarkerPolicy::PassThrough).assemble(&t, &r, "");
        assert_eq!(passed.parts, vec!["x", "BREAK_CLIPG", "y"]);
        assert_eq!(passed.log, vec!["a: x", "b: y"]);
    }

    #[test]
    fn custom_text_leads_and_logs_first() {
        let t = template(&["{a}"], &[]);
        let a = Assembler::default().assemble(&t, &resolved(&[("a", "x")]), "  be bold  ");
        assert_eq!(a.lead.as_deref(), Some("be bold"));
        assert_eq!(a.parts, vec!["x"]);
        assert_eq!(a.log, vec!["custom_text: be bold", "a: x"]);
    }

    #[test]
    fn custom_text_inline_when_referenced() {
        let t = template(
            &["{a}", "custom_text"],
            &[("custom_text", "note: {value}")],
        );
        let a = Assembler::default().assemble(&t, &resolved(&[("a", "x")]), "tall");
        assert_eq!(a.lead, None);
        assert_eq!(a.parts, vec!["x", "note: tall"]);
        assert_eq!(a.log, vec!["a: x", "custom_text: tall"]);
    }

    #[test]
    fn blank_custom_text_ignored() {
        let t = template(&["{a}"], &[]);
        let a = Assembler::default().assemble(&t, &resolved(&[("a", "x")]), "   ");
        assert_eq!(a.lead, None);
        assert_eq!(a.log, vec!["a: x"]);
    }

    #[test]
    fn literals_never_logged() {
        let t = template(&["hello", ", ", "world"], &[]);
        let a = Assembler::default().assemble(&t, &BTreeMap::new(), "");
        assert_eq!(a.parts, vec!["hello", ", ", "world"]);
        assert!(a.log.is_empty());
    }
}
