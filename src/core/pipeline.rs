//! The main prompt pipeline: directives → selection → expansion →
//! assembly → cleanup.

use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::debug;

use crate::core::assembler::{Assembler, ReservedMarkerPolicy};
use crate::core::cleaner;
use crate::core::config::EngineConfig;
use crate::core::selector::FieldSelector;
use crate::core::store::{CategoryStore, TemplateStore};
use crate::core::wildcard::WildcardResolver;
use crate::schema::adapter::AdapterList;
use crate::schema::category::CategoryMap;
use crate::schema::directive::Directive;
use crate::schema::template::{TemplateSet, CUSTOM_TEXT_FIELD};

/// Option values every field offers ahead of its snippets.
pub const FIELD_KEYWORDS: &[&str] = &["disabled", "random"];

/// Inputs for one generation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PromptRequest {
    pub seed: u64,
    /// Template to use; unknown names fall back (see [`TemplateSet::resolve_name`]).
    pub template: String,
    /// Free text placed ahead of the templated body.
    pub custom_text: String,
    pub directives: BTreeMap<String, Directive>,
    /// Passed through to the [`Generation`] untouched.
    pub adapters: AdapterList,
}

impl PromptRequest {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    pub fn template(mut self, name: &str) -> Self {
        self.template = name.to_string();
        self
    }

    pub fn custom_text(mut self, text: &str) -> Self {
        self.custom_text = text.to_string();
        self
    }

    pub fn directive(mut self, field: &str, directive: impl Into<Directive>) -> Self {
        self.directives.insert(field.to_string(), directive.into());
        self
    }

    pub fn adapters(mut self, adapters: AdapterList) -> Self {
        self.adapters = adapters;
        self
    }
}

/// Result of one generation. Always produced, even from missing content.
#[derive(Debug, Clone, PartialEq)]
pub struct Generation {
    pub text: String,
    /// Newline-joined `"field: value"` lines.
    pub selection_log: String,
    /// Name of the template actually used.
    pub template: String,
    /// Every field's final value after selection and wildcard expansion.
    pub fields: BTreeMap<String, String>,
    pub adapters: AdapterList,
}

/// The top-level prompt engine. Built via `PromptEngine::builder()`.
///
/// Safe to share across threads; each call to [`generate`](Self::generate)
/// works on its own snapshot of the content.
pub struct PromptEngine {
    categories: CategoryStore,
    templates: TemplateStore,
    resolver: WildcardResolver,
    assembler: Assembler,
    joiner: String,
}

/// Builder for constructing a `PromptEngine`.
pub struct PromptEngineBuilder {
    config: EngineConfig,
    /// Directly provided categories (for use without files).
    categories: Option<CategoryMap>,
    /// Directly provided templates (for use without files).
    templates: Option<TemplateSet>,
    /// Set once markers come from `reserved_markers` or `config`.
    reserved_overridden: bool,
}

impl PromptEngine {
    pub fn builder() -> PromptEngineBuilder {
        PromptEngineBuilder {
            config: EngineConfig::default(),
            categories: None,
            templates: None,
            reserved_overridden: false,
        }
    }

    /// Reload any content whose files changed. Returns whether anything
    /// was reloaded.
    pub fn refresh(&self) -> bool {
        let categories = self.categories.refresh_if_stale();
        let templates = self.templates.refresh_if_stale();
        categories || templates
    }

    /// Generate a prompt.
    pub fn generate(&self, request: &PromptRequest) -> Generation {
        self.refresh();
        let categories = self.categories.categories();
        let templates = self.templates.templates();
        let template = templates.resolve_name(&request.template);

        // Each field keeps one stream for its draw and its wildcard
        // expansion, so fields never perturb each other.
        let selector = FieldSelector::new(&categories, request.seed);
        let mut fields = BTreeMap::new();
        for (field, directive) in &request.directives {
            let mut rng = selector.rng_for(field);
            let selected = selector.select_field(field, directive, &mut rng);
            let expanded = self.resolver.resolve(&selected, &categories, &mut rng);
            fields.insert(field.clone(), expanded);
        }

        let custom_text = {
            let mut rng = selector.rng_for(CUSTOM_TEXT_FIELD);
            self.resolver
                .resolve(&request.custom_text, &categories, &mut rng)
        };

        let assembly = self.assembler.assemble(template, &fields, &custom_text);
        let body = cleaner::clean(&assembly.parts.join(&self.joiner));
        let text = match assembly.lead {
            Some(lead) if body.is_empty() => lead,
            Some(lead) => format!("{lead}\n\n{body}"),
            None => body,
        };

        debug!(
            seed = request.seed,
            template = %template.name,
            selections = assembly.log.len(),
            "prompt generated"
        );

        Generation {
            text,
            selection_log: assembly.log.join("\n"),
            template: template.name.clone(),
            fields,
            adapters: request.adapters.clone(),
        }
    }

    /// Category names, sorted.
    pub fn category_names(&self) -> Vec<String> {
        self.categories.categories().keys().cloned().collect()
    }

    /// Template names, sorted.
    pub fn template_names(&self) -> Vec<String> {
        self.templates.templates().names()
    }

    /// Choices a host should offer for `field`: the directive keywords,
    /// then the category's distinct snippets in sorted order.
    pub fn field_options(&self, field: &str) -> Option<Vec<String>> {
        let categories = self.categories.categories();
        let snippets = categories.get(field)?;
        let mut sorted: Vec<&String> = snippets.iter().collect();
        sorted.sort();
        sorted.dedup();
        let options = FIELD_KEYWORDS
            .iter()
            .map(|k| k.to_string())
            .chain(sorted.into_iter().cloned())
            .collect();
        Some(options)
    }
}

impl PromptEngineBuilder {
    /// Replace the whole configuration.
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self.reserved_overridden = true;
        self
    }

    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    pub fn templates_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.templates_path = path.into();
        self
    }

    pub fn reserved_markers(mut self, markers: &[&str]) -> Self {
        self.config.reserved_markers = markers.iter().map(|s| s.to_string()).collect();
        self.reserved_overridden = true;
        self
    }

    pub fn reserved_policy(mut self, policy: ReservedMarkerPolicy) -> Self {
        self.config.reserved_policy = policy;
        self
    }

    pub fn max_wildcard_depth(mut self, depth: usize) -> Self {
        self.config.max_wildcard_depth = depth;
        self
    }

    pub fn joiner(mut self, joiner: &str) -> Self {
        self.config.joiner = joiner.to_string();
        self
    }

    /// Provide categories directly (for use without files).
    pub fn with_categories(mut self, categories: CategoryMap) -> Self {
        self.categories = Some(categories);
        self
    }

    /// Provide templates directly (for use without files).
    ///
    /// The set keeps the markers it was parsed with, unless markers are
    /// also given through [`reserved_markers`](Self::reserved_markers) or
    /// [`config`](Self::config); then `build` re-classifies it against them.
    pub fn with_templates(mut self, templates: TemplateSet) -> Self {
        self.templates = Some(templates);
        self
    }

    pub fn build(self) -> PromptEngine {
        let categories = match self.categories {
            Some(map) => CategoryStore::from_map(map),
            None => CategoryStore::open(self.config.data_dir.clone()),
        };
        let templates = match self.templates {
            Some(set) if self.reserved_overridden => {
                TemplateStore::from_set(set.with_reserved(&self.config.reserved_set()))
            }
            Some(set) => TemplateStore::from_set(set),
            None => TemplateStore::open(
                self.config.templates_path.clone(),
                self.config.reserved_set(),
            ),
        };

        PromptEngine {
            categories,
            templates,
            resolver: WildcardResolver::new(self.config.max_wildcard_depth),
            assembler: Assembler::new(self.config.reserved_policy),
            joiner: self.config.joiner,
        }
    }
}
