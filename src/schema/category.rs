//! Category content — named pools of interchangeable text snippets.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

use crate::error::EngineError;

/// Category name → ordered snippets. Sorted by name so listings and
/// fallbacks are stable across runs.
pub type CategoryMap = BTreeMap<String, Vec<String>>;

/// File suffixes recognised as category sources, in load order. When the
/// same category exists in several formats the later suffix wins.
pub const CATEGORY_EXTENSIONS: &[&str] = &["json", "ron"];

/// One element of a category list as it appears on disk.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawEntry {
    Text(String),
    Bool(bool),
    Integer(i64),
    Unsigned(u64),
    Float(f64),
    Other(serde::de::IgnoredAny),
}

impl RawEntry {
    fn into_snippet(self) -> Option<String> {
        let text = match self {
            RawEntry::Text(s) => s,
            RawEntry::Bool(b) => b.to_string(),
            RawEntry::Integer(n) => n.to_string(),
            RawEntry::Unsigned(n) => n.to_string(),
            // Debug keeps the fraction: 1.0 stays "1.0", not "1".
            RawEntry::Float(f) => format!("{f:?}"),
            RawEntry::Other(_) => {
                debug!("dropping non-scalar category entry");
                return None;
            }
        };
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

fn collect_snippets(raw: Vec<RawEntry>) -> Vec<String> {
    raw.into_iter().filter_map(RawEntry::into_snippet).collect()
}

/// Parse a JSON array of snippets. Anything other than an array is an error.
pub fn parse_category_json(input: &str) -> Result<Vec<String>, EngineError> {
    let raw: Vec<RawEntry> = serde_json::from_str(input)?;
    Ok(collect_snippets(raw))
}

/// Parse a RON list of snippets, e.g. `["a fox", "an owl"]`.
pub fn parse_category_ron(input: &str) -> Result<Vec<String>, EngineError> {
    let raw: Vec<RawEntry> = ron::from_str(input)?;
    Ok(collect_snippets(raw))
}

/// Derive a category name from its file: the stem, provided the suffix is
/// one of [`CATEGORY_EXTENSIONS`].
pub fn category_name(path: &Path) -> Option<String> {
    let ext = path.extension()?.to_str()?;
    if !CATEGORY_EXTENSIONS.contains(&ext) {
        return None;
    }
    path.file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Load one category file, returning its name and snippets.
pub fn load_category_file(path: &Path) -> Result<(String, Vec<String>), EngineError> {
    let name = category_name(path)
        .ok_or_else(|| EngineError::UnsupportedFormat(path.display().to_string()))?;
    let contents = std::fs::read_to_string(path)?;
    let snippets = match path.extension().and_then(|s| s.to_str()) {
        Some("ron") => parse_category_ron(&contents)?,
        _ => parse_category_json(&contents)?,
    };
    Ok((name, snippets))
}
