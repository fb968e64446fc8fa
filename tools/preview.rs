/// Preview — interactive shell for trying categories and templates.
///
/// Usage: preview [--config <file.ron>] [--data <dir>] [--templates <path>] [--seed <n>]
///
/// Commands:
///   gen                       — generate with the current settings
///   set <field> <directive>   — set a field: disabled, random, or literal text
///   unset <field>             — drop a field's directive
///   template <name>           — choose a template
///   custom <text>             — set custom text ('custom' alone clears it)
///   seed <n>                  — set RNG seed
///   bulk <n>                  — generate n prompts on consecutive seeds with variety stats
///   fields                    — list categories and current directives
///   templates                 — list templates
///   options <field>           — list the choices a host would offer for a field
///   reload                    — re-check content files for changes
///   help                      — list commands
///   quit                      — exit
use prompt_engine::core::config::EngineConfig;
use prompt_engine::core::pipeline::{PromptEngine, PromptRequest};
use prompt_engine::schema::directive::Directive;
use std::collections::HashSet;
use std::io::{self, BufRead, Write};
use std::path::Path;
use tracing_subscriber::EnvFilter;

fn main() {
    init_logging();

    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return;
    }

    let mut config = EngineConfig::default();
    let mut seed: u64 = 42;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" if i + 1 < args.len() => {
                i += 1;
                match EngineConfig::load_from_ron(Path::new(&args[i])) {
                    Ok(loaded) => config = loaded,
                    Err(e) => {
                        eprintln!("ERROR: failed to load config '{}': {}", args[i], e);
                        std::process::exit(1);
                    }
                }
            }
            "--data" if i + 1 < args.len() => {
                i += 1;
                config.data_dir = args[i].clone().into();
            }
            "--templates" if i + 1 < args.len() => {
                i += 1;
                config.templates_path = args[i].clone().into();
            }
            "--seed" if i + 1 < args.len() => {
                i += 1;
                seed = args[i].parse().unwrap_or(42);
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    let engine = PromptEngine::builder().config(config.clone()).build();

    println!(
        "Loaded {} categories from {}",
        engine.category_names().len(),
        config.data_dir.display()
    );
    println!("Templates: {}", engine.template_names().join(", "));
    println!("Seed: {}", seed);
    println!("Type 'help' for commands.\n");

    // Session state
    let mut request = PromptRequest::new(seed);

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("preview> ");
        stdout.flush().ok();

        let mut line = String::new();
        if stdin.lock().read_line(&mut line).is_err() || line.is_empty() {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let (cmd, rest) = match line.split_once(char::is_whitespace) {
            Some((cmd, rest)) => (cmd.to_lowercase(), rest.trim()),
            None => (line.to_lowercase(), ""),
        };

        match cmd.as_str() {
            "quit" | "exit" | "q" => {
                println!("Goodbye.");
                break;
            }
            "help" | "h" | "?" => {
                print_help();
            }
            "gen" | "g" => {
                let generation = engine.generate(&request);
                println!("\n--- Prompt ({}) ---", generation.template);
                println!("{}", generation.text);
                println!("--- Selections ---");
                if generation.selection_log.is_empty() {
                    println!("(none)");
                } else {
                    println!("{}", generation.selection_log);
                }
                println!("--- End ---\n");
            }
            "set" => {
                let Some((field, value)) = rest.split_once(char::is_whitespace) else {
                    println!("Usage: set <field> <disabled|random|text>");
                    continue;
                };
                let directive = Directive::parse(value.trim());
                println!("{} = {}", field, directive);
                request.directives.insert(field.to_string(), directive);
            }
            "unset" => {
                if rest.is_empty() {
                    println!("Usage: unset <field>");
                    continue;
                }
                if request.directives.remove(rest).is_none() {
                    println!("Field '{}' has no directive.", rest);
                }
            }
            "template" => {
                if rest.is_empty() {
                    println!("Current template: {:?}", request.template);
                    continue;
                }
                if !engine.template_names().iter().any(|n| n == rest) {
                    println!("Template '{}' not found; the fallback will be used.", rest);
                }
                request.template = rest.to_string();
            }
            "custom" => {
                request.custom_text = rest.to_string();
                if rest.is_empty() {
                    println!("Custom text cleared.");
                }
            }
            "seed" => {
                if rest.is_empty() {
                    println!("Current seed: {}", request.seed);
                    continue;
                }
                match rest.parse::<u64>() {
                    Ok(s) => {
                        request.seed = s;
                        println!("Seed set to {}", s);
                    }
                    Err(_) => {
                        println!("Invalid seed: {}", rest);
                    }
                }
            }
            "bulk" => {
                let count: u64 = match rest.parse() {
                    Ok(n) if n > 0 => n,
                    _ => {
                        println!("Usage: bulk <n>");
                        continue;
                    }
                };
                run_bulk(&engine, &request, count);
            }
            "fields" => {
                for name in engine.category_names() {
                    let directive = request
                        .directives
                        .get(&name)
                        .cloned()
                        .unwrap_or_default();
                    println!("  {:<20} {}", name, directive);
                }
            }
            "templates" => {
                for name in engine.template_names() {
                    println!("  {}", name);
                }
            }
            "options" => match engine.field_options(rest) {
                Some(options) => {
                    for option in options {
                        println!("  {}", option);
                    }
                }
                None => println!("Unknown category: {}", rest),
            },
            "reload" => {
                if engine.refresh() {
                    println!("Content reloaded.");
                } else {
                    println!("No changes.");
                }
            }
            _ => {
                println!("Unknown command: {}. Type 'help' for commands.", cmd);
            }
        }
    }
}

fn run_bulk(engine: &PromptEngine, base: &PromptRequest, count: u64) {
    let mut unique = HashSet::new();
    let mut total_words = 0usize;

    for offset in 0..count {
        let mut request = base.clone();
        request.seed = base.seed.wrapping_add(offset);
        let generation = engine.generate(&request);
        println!("[{}] {}", request.seed, generation.text);
        total_words += generation.text.split_whitespace().count();
        unique.insert(generation.text);
    }

    println!("\n--- Variety ---");
    println!("Prompts:        {}", count);
    println!("Unique prompts: {}", unique.len());
    println!(
        "Avg words:      {:.1}",
        total_words as f64 / count as f64
    );
}

fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_usage() {
    println!(
        "Usage: preview [--config <file.ron>] [--data <dir>] [--templates <path>] [--seed <n>]"
    );
}

fn print_help() {
    println!("Commands:");
    println!("  gen                      generate with the current settings");
    println!("  set <field> <directive>  disabled, random, or literal text");
    println!("  unset <field>            drop a field's directive");
    println!("  template <name>          choose a template");
    println!("  custom <text>            set custom text (empty clears)");
    println!("  seed <n>                 set RNG seed");
    println!("  bulk <n>                 generate n prompts with variety stats");
    println!("  fields                   list categories and directives");
    println!("  templates                list templates");
    println!("  options <field>          list a field's choices");
    println!("  reload                   re-check content files");
    println!("  help                     this list");
    println!("  quit                     exit");
}
