//! Field selection — resolves each field's directive with its own
//! reproducible random stream.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::BTreeMap;
use tracing::debug;

use crate::schema::category::CategoryMap;
use crate::schema::directive::Directive;

/// Derive the seed for one field's stream.
///
/// `seed + Σ code(c_i) × (i + 1)` over the field name's characters. Not
/// collision-free, but pure in `(seed, field)`, so a field's draw never
/// depends on which other fields are present.
pub fn field_seed(seed: u64, field: &str) -> u64 {
    field
        .chars()
        .enumerate()
        .fold(seed, |acc, (i, c)| {
            acc.wrapping_add((c as u64).wrapping_mul(i as u64 + 1))
        })
}

/// Resolves directives against a category library for one global seed.
pub struct FieldSelector<'a> {
    categories: &'a CategoryMap,
    seed: u64,
}

impl<'a> FieldSelector<'a> {
    pub fn new(categories: &'a CategoryMap, seed: u64) -> Self {
        Self { categories, seed }
    }

    /// A fresh generator for `field`'s stream.
    pub fn rng_for(&self, field: &str) -> StdRng {
        StdRng::seed_from_u64(field_seed(self.seed, field))
    }

    /// Resolve one field, drawing from `rng` when the directive is random.
    ///
    /// Callers that go on to expand wildcards should keep using the same
    /// `rng` so expansion stays on the field's own stream.
    pub fn select_field(&self, field: &str, directive: &Directive, rng: &mut StdRng) -> String {
        match directive {
            Directive::Disabled => String::new(),
            Directive::Explicit(text) => text.clone(),
            Directive::Random => match self.categories.get(field) {
                Some(options) => match options.choose(rng) {
                    Some(choice) => choice.clone(),
                    None => {
                        debug!(field, "random draw from empty category");
                        String::new()
                    }
                },
                None => {
                    debug!(field, "random draw from unknown category");
                    String::new()
                }
            },
        }
    }

    /// Resolve every directive, each on its own stream.
    pub fn select(&self, directives: &BTreeMap<String, Directive>) -> BTreeMap<String, String> {
        directives
            .iter()
            .map(|(field, directive)| {
                let mut rng = self.rng_for(field);
                (field.clone(), self.select_field(field, directive, &mut rng))
            })
            .collect()
    }
}
