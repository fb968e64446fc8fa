//! Recursive wildcard expansion of `{category}` markers inside resolved text.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use regex::{Captures, Regex};
use std::sync::LazyLock;
use tracing::debug;

use crate::schema::category::CategoryMap;

/// Default recursion cap for nested wildcards.
pub const MAX_WILDCARD_DEPTH: usize = 10;

static WILDCARD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([^{}]+)\}").expect("Invalid wildcard regex"));

/// Expands wildcard markers by drawing from the category library.
///
/// Bounded by depth only: categories that reference each other cycle
/// until the cap, then the remaining markers are left in place.
#[derive(Debug, Clone, Copy)]
pub struct WildcardResolver {
    max_depth: usize,
}

impl Default for WildcardResolver {
    fn default() -> Self {
        Self {
            max_depth: MAX_WILDCARD_DEPTH,
        }
    }
}

impl WildcardResolver {
    pub fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Expand every marker in `text`, left to right.
    ///
    /// Unknown or empty categories leave their marker verbatim, since it
    /// may be meant for a later consumer.
    pub fn resolve(&self, text: &str, categories: &CategoryMap, rng: &mut StdRng) -> String {
        self.resolve_at(text, categories, rng, 0)
    }

    fn resolve_at(
        &self,
        text: &str,
        categories: &CategoryMap,
        rng: &mut StdRng,
        depth: usize,
    ) -> String {
        if !text.contains('{') {
            return text.to_string();
        }
        if depth >= self.max_depth {
            debug!(depth, "wildcard depth cap reached; leaving markers unexpanded");
            return text.to_string();
        }

        WILDCARD_RE
            .replace_all(text, |caps: &Captures<'_>| {
                let name = caps[1].trim();
                match categories.get(name).and_then(|options| options.choose(rng)) {
                    Some(choice) => self.resolve_at(choice, categories, rng, depth + 1),
                    None => {
                        debug!(wildcard = name, "unresolved wildcard left in place");
                        caps[0].to_string()
                    }
                }
            })
            .into_owned()
    }
}

/// Category names referenced by markers in `text`, in order of appearance.
pub fn wildcard_refs(text: &str) -> impl Iterator<Item = &str> {
    WILDCARD_RE
        .captures_iter(text)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str().trim()))
}
