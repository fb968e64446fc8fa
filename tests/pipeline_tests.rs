/// Pipeline integration tests — end-to-end prompt generation.
use prompt_engine::core::cleaner::clean;
use prompt_engine::core::config::EngineConfig;
use prompt_engine::core::pipeline::{PromptEngine, PromptRequest};
use prompt_engine::schema::category::CategoryMap;
use prompt_engine::schema::template::{default_reserved_markers, TemplateSet};
use std::path::Path;

fn fixture_engine() -> PromptEngine {
    let config = EngineConfig::load_from_ron(Path::new("tests/fixtures/engine.ron")).unwrap();
    PromptEngine::builder().config(config).build()
}

fn cats(pairs: &[(&str, &[&str])]) -> CategoryMap {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.iter().map(|s| s.to_string()).collect()))
        .collect()
}

fn templates(json: &str) -> TemplateSet {
    TemplateSet::parse_json(json, &default_reserved_markers()).unwrap()
}

#[test]
fn fox_painted_in_watercolor() {
    let engine = PromptEngine::builder()
        .with_categories(cats(&[("subject", &["a fox"]), ("style", &["watercolor"])]))
        .with_templates(templates(
            r#"{"Default": {"structure": ["{subject}", "painted in", "{style}", "style"], "formatting": {}}}"#,
        ))
        .build();

    for seed in [0, 1, 42, 9_999, u64::MAX] {
        let generation = engine.generate(
            &PromptRequest::new(seed)
                .template("Default")
                .directive("subject", "random")
                .directive("style", "random"),
        );
        assert_eq!(generation.text, "a fox painted in watercolor style");
        assert_eq!(generation.selection_log, "subject: a fox\nstyle: watercolor");
    }
}

#[test]
fn legacy_template_file_addressable_as_default() {
    let engine = PromptEngine::builder()
        .data_dir("tests/fixtures/data")
        .templates_path("tests/fixtures/legacy_templates.json")
        .build();

    assert_eq!(engine.template_names(), vec!["Default"]);
    let generation = engine.generate(
        &PromptRequest::new(3)
            .template("Default")
            .directive("subject", "a fox")
            .directive("style", "watercolor"),
    );
    assert_eq!(generation.template, "Default");
    assert_eq!(generation.text, "a fox painted in watercolor style");
}

#[test]
fn fixture_generation_is_deterministic() {
    let request = PromptRequest::new(7)
        .template("Portrait")
        .directive("subject", "random")
        .directive("lighting", "random")
        .directive("style", "random");

    let first = fixture_engine().generate(&request);
    let second = fixture_engine().generate(&request);
    assert_eq!(first, second);
    assert!(!first.text.is_empty());
    assert!(!first.text.contains("BREAK_CLIPG"));
}

#[test]
fn enabling_another_field_keeps_subject_draw() {
    let engine = fixture_engine();
    for seed in 0..30 {
        let alone = engine.generate(
            &PromptRequest::new(seed)
                .template("Portrait")
                .directive("subject", "random")
                .directive("lighting", "disabled"),
        );
        let together = engine.generate(
            &PromptRequest::new(seed)
                .template("Portrait")
                .directive("subject", "random")
                .directive("lighting", "random")
                .directive("style", "a pencil study"),
        );
        assert_eq!(alone.fields["subject"], together.fields["subject"]);
        let first_line = |log: &str| log.lines().next().map(str::to_string);
        assert_eq!(first_line(&alone.selection_log), first_line(&together.selection_log));
    }
}

#[test]
fn disabled_field_leaves_no_artifact() {
    let engine = PromptEngine::builder()
        .with_categories(CategoryMap::new())
        .with_templates(templates(r#"{"structure": ["{a}", ", ", "{b}"]}"#))
        .build();
    let generation = engine.generate(
        &PromptRequest::new(0)
            .directive("a", "disabled")
            .directive("b", "dog"),
    );
    assert_eq!(generation.text, "dog");
    assert_eq!(generation.selection_log, "b: dog");
}

#[test]
fn formatting_rule_applied_to_selection() {
    let engine = fixture_engine();
    let generation = engine.generate(
        &PromptRequest::new(0)
            .template("Portrait")
            .directive("lighting", "neon glow"),
    );
    assert_eq!(generation.text, "illuminated by neon glow, style");
    assert_eq!(generation.selection_log, "lighting: neon glow");
}

#[test]
fn cyclic_wildcards_terminate() {
    let engine = fixture_engine();
    let generation = engine.generate(&PromptRequest::new(11).directive("ping", "random"));
    let value = &generation.fields["ping"];
    // The drawn snippet plus ten expansions, ending in an unexpanded marker.
    assert_eq!(value.split_whitespace().count(), 12);
    assert!(value.ends_with("{ping}") || value.ends_with("{pong}"));
}

#[test]
fn nested_wildcards_fully_expand() {
    let engine = fixture_engine();
    for seed in 0..40 {
        let generation = engine.generate(
            &PromptRequest::new(seed)
                .template("Scene")
                .directive("subject", "a {animal} in a {garment}"),
        );
        let subject = &generation.fields["subject"];
        assert!(!subject.contains('{'), "unexpanded subject {subject:?}");
        assert!(subject.starts_with("a "));
    }
}

#[test]
fn generated_text_is_already_clean() {
    let engine = fixture_engine();
    for template in ["Portrait", "Scene"] {
        for seed in 0..50 {
            let generation = engine.generate(
                &PromptRequest::new(seed)
                    .template(template)
                    .directive("subject", "random")
                    .directive("lighting", if seed % 2 == 0 { "random" } else { "disabled" })
                    .directive("style", "random")
                    .directive("garment", if seed % 3 == 0 { "disabled" } else { "random" })
                    .directive("time", "random"),
            );
            assert_eq!(clean(&generation.text), generation.text);
        }
    }
}

#[test]
fn custom_text_inline_in_scene() {
    let engine = fixture_engine();
    let generation = engine.generate(
        &PromptRequest::new(0)
            .template("Scene")
            .custom_text("soft focus")
            .directive("subject", "a moth")
            .directive("garment", "a wool scarf")
            .directive("time", "dusk"),
    );
    assert_eq!(
        generation.text,
        "(soft focus) a moth wearing a wool scarf in dusk light"
    );
    assert_eq!(
        generation.selection_log,
        "custom_text: soft focus\nsubject: a moth\ngarment: a wool scarf\ntime: dusk"
    );
}

#[test]
fn omitted_garment_collapses_connectors() {
    let engine = fixture_engine();
    let generation = engine.generate(
        &PromptRequest::new(0)
            .template("Scene")
            .directive("subject", "a moth")
            .directive("garment", "disabled")
            .directive("time", "dusk"),
    );
    assert_eq!(generation.text, "a moth in dusk light");
}

#[test]
fn custom_text_prepended_for_portrait() {
    let engine = fixture_engine();
    let generation = engine.generate(
        &PromptRequest::new(0)
            .template("Portrait")
            .custom_text("a {time} study")
            .directive("subject", "a paper crane"),
    );
    let (lead, body) = generation.text.split_once("\n\n").unwrap();
    assert!(["a dawn study", "a noon study", "a dusk study"].contains(&lead));
    assert_eq!(body, "a paper crane, style");
    assert!(generation.selection_log.starts_with("custom_text: a "));
}

#[test]
fn unknown_template_uses_first_available() {
    let engine = fixture_engine();
    let generation = engine.generate(
        &PromptRequest::new(0)
            .template("Missing")
            .directive("subject", "a red fox"),
    );
    assert_eq!(generation.template, "Portrait");
}

#[test]
fn broken_and_sparse_categories_degrade() {
    let engine = fixture_engine();

    assert!(engine.category_names().contains(&"broken".to_string()));
    assert_eq!(
        engine.field_options("broken"),
        Some(vec!["disabled".to_string(), "random".to_string()])
    );
    let generation = engine.generate(
        &PromptRequest::new(0)
            .template("Portrait")
            .directive("broken", "random")
            .directive("subject", "a red fox"),
    );
    assert_eq!(generation.fields["broken"], "");

    let colors = engine.field_options("color").unwrap();
    assert_eq!(colors, vec!["disabled", "random", "crimson", "ochre", "teal"]);

    let styles = engine.field_options("style").unwrap();
    assert!(styles.contains(&"1984".to_string()));
}
