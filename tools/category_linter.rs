/// Category Linter — validates category libraries and templates.
///
/// Usage: category_linter <data_dir> [--templates <path>]
use prompt_engine::core::wildcard::wildcard_refs;
use prompt_engine::schema::category::{category_name, load_category_file, CategoryMap};
use prompt_engine::schema::template::{default_reserved_markers, TemplateSet, VALUE_SLOT};
use std::path::Path;
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        println!("Usage: category_linter <data_dir> [--templates <path>]");
        process::exit(0);
    }

    let data_dir = Path::new(&args[1]);
    let mut templates_path = None;

    let mut i = 2;
    while i < args.len() {
        if args[i] == "--templates" && i + 1 < args.len() {
            i += 1;
            templates_path = Some(args[i].clone());
        }
        i += 1;
    }

    if !data_dir.is_dir() {
        eprintln!("ERROR: Path '{}' is not a directory", data_dir.display());
        process::exit(1);
    }

    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    let categories = load_categories(data_dir, &mut errors);
    println!("Loaded {} categories", categories.len());

    let templates = templates_path.map(|path| {
        let path = Path::new(&path);
        match load_templates(path) {
            Ok(set) => {
                println!("Loaded {} templates", set.names().len());
                set
            }
            Err(e) => {
                eprintln!("ERROR: Failed to load templates: {}", e);
                process::exit(1);
            }
        }
    });

    lint_categories(&categories, &mut errors, &mut warnings);
    if let Some(ref templates) = templates {
        lint_templates(templates, &categories, &mut errors, &mut warnings);
    }

    // Print report
    println!("\n=== Category Lint Report ===\n");

    if errors.is_empty() && warnings.is_empty() {
        println!("All checks passed!");
    }

    for warning in &warnings {
        println!("WARNING: {}", warning);
    }

    for error in &errors {
        println!("ERROR: {}", error);
    }

    println!(
        "\nSummary: {} errors, {} warnings",
        errors.len(),
        warnings.len()
    );

    if errors.is_empty() {
        process::exit(0);
    } else {
        process::exit(1);
    }
}

fn load_categories(dir: &Path, errors: &mut Vec<String>) -> CategoryMap {
    let mut categories = CategoryMap::new();
    let Ok(entries) = std::fs::read_dir(dir) else {
        return categories;
    };
    let mut paths: Vec<_> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| category_name(path).is_some())
        .collect();
    paths.sort();

    for path in paths {
        match load_category_file(&path) {
            Ok((name, snippets)) => {
                println!("  Loaded: {}", path.display());
                categories.insert(name, snippets);
            }
            Err(e) => {
                errors.push(format!("Failed to load {}: {}", path.display(), e));
            }
        }
    }
    categories
}

fn load_templates(path: &Path) -> Result<TemplateSet, prompt_engine::EngineError> {
    let contents = std::fs::read_to_string(path)?;
    let reserved = default_reserved_markers();
    match path.extension().and_then(|s| s.to_str()) {
        Some("ron") => TemplateSet::parse_ron(&contents, &reserved),
        _ => TemplateSet::parse_json(&contents, &reserved),
    }
}

fn lint_categories(categories: &CategoryMap, errors: &mut Vec<String>, warnings: &mut Vec<String>) {
    for (name, snippets) in categories {
        if snippets.is_empty() {
            warnings.push(format!("Category '{}' has no usable snippets", name));
            continue;
        }

        // Unknown references are left verbatim at runtime, so they only warn.
        for snippet in snippets {
            for reference in wildcard_refs(snippet) {
                if !categories.contains_key(reference) {
                    warnings.push(format!(
                        "Category '{}' references unknown category '{{{}}}'",
                        name, reference
                    ));
                }
            }
        }

        // Every snippet refers back to itself: expansion only stops at the depth cap.
        let all_self_ref = snippets
            .iter()
            .all(|s| wildcard_refs(s).any(|r| r == name));
        if all_self_ref {
            errors.push(format!(
                "Category '{}' has no non-recursive snippet (expansion always hits the depth cap)",
                name
            ));
        }
    }
}

fn lint_templates(
    templates: &TemplateSet,
    categories: &CategoryMap,
    errors: &mut Vec<String>,
    warnings: &mut Vec<String>,
) {
    for template in templates.iter() {
        for key in template.placeholder_keys() {
            if !categories.contains_key(key) {
                warnings.push(format!(
                    "Template '{}' uses '{{{}}}' which has no category (explicit values only)",
                    template.name, key
                ));
            }
        }

        for (key, rule) in &template.formatting {
            if rule.matches(VALUE_SLOT).count() != 1 {
                errors.push(format!(
                    "Template '{}' formatting rule for '{}' must contain exactly one {}: {:?}",
                    template.name, key, VALUE_SLOT, rule
                ));
            }
        }
    }
}
