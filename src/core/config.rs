//! Engine configuration, loadable from RON.

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::core::assembler::ReservedMarkerPolicy;
use crate::core::wildcard::MAX_WILDCARD_DEPTH;
use crate::error::EngineError;
use crate::schema::template::DEFAULT_RESERVED_MARKERS;

/// Where content lives and how assembly behaves.
///
/// ```ron
/// (
///     data_dir: "data",
///     templates_path: "templates.json",
///     max_wildcard_depth: 10,
///     reserved_markers: ["BREAK_CLIPG", "BREAK_CLIPL"],
///     reserved_policy: Drop,
///     joiner: " ",
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Directory scanned for category files.
    pub data_dir: PathBuf,
    /// Template source (`.json` or `.ron`).
    pub templates_path: PathBuf,
    pub max_wildcard_depth: usize,
    pub reserved_markers: Vec<String>,
    pub reserved_policy: ReservedMarkerPolicy,
    /// Separator placed between assembled parts before cleanup.
    pub joiner: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            templates_path: PathBuf::from("templates.json"),
            max_wildcard_depth: MAX_WILDCARD_DEPTH,
            reserved_markers: DEFAULT_RESERVED_MARKERS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            reserved_policy: ReservedMarkerPolicy::default(),
            joiner: " ".to_string(),
        }
    }
}

impl EngineConfig {
    /// Load a config from a RON file. Missing fields take their defaults.
    pub fn load_from_ron(path: &Path) -> Result<EngineConfig, EngineError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    pub fn parse_ron(input: &str) -> Result<EngineConfig, EngineError> {
        Ok(ron::from_str(input)?)
    }

    pub fn reserved_set(&self) -> FxHashSet<String> {
        self.reserved_markers.iter().cloned().collect()
    }
}
