//! Data model: categories, templates, directives, and adapter lists.

pub mod adapter;
pub mod category;
pub mod directive;
pub mod template;
