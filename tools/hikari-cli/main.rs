use clap::Parser;
use hikari::conditions::ConditionDefinition;
use hikari::prelude::*;
use std::fs;
use std::io::{self, Write};
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// Runs node scripts and display conditions against a data model snapshot
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the script definition JSON file
    script_path: Option<String>,
    /// Path to the data model JSON file, an object keyed by module id
    data_path: Option<String>,

    /// Optional path to a display condition definition JSON file
    #[arg(short, long)]
    condition: Option<String>,

    /// Optional path to an engine configuration JSON file
    #[arg(long)]
    config: Option<String>,

    /// Number of evaluation passes to run
    #[arg(short, long, default_value_t = 1)]
    passes: u32,

    /// Run in interactive mode to be prompted for inputs
    #[arg(short = 'i', long, help = "Run in interactive 'human' mode")]
    human: bool,
}

struct RunOptions {
    script_path: String,
    data_path: String,
    condition_path: Option<String>,
    config_path: Option<String>,
    passes: u32,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let options = if cli.human {
        prompt_options()
    } else {
        RunOptions {
            script_path: cli.script_path.unwrap_or_else(|| {
                exit_with_error("Script path is required in non-interactive mode.")
            }),
            data_path: cli.data_path.unwrap_or_else(|| {
                exit_with_error("Data model path is required in non-interactive mode.")
            }),
            condition_path: cli.condition,
            config_path: cli.config,
            passes: cli.passes,
        }
    };
    run(options);
}

fn run(options: RunOptions) {
    let total_start = Instant::now();

    // --- 1. File Loading ---
    let config = match &options.config_path {
        Some(path) => EngineConfig::from_file(path)
            .unwrap_or_else(|e| exit_with_error(&format!("Failed to load config: {}", e))),
        None => EngineConfig::default(),
    };
    let script_json = read_file(&options.script_path, "script");
    let data_json = read_file(&options.data_path, "data model");
    let condition = options.condition_path.as_deref().map(|path| {
        ConditionDefinition::from_json(&read_file(path, "condition"))
            .unwrap_or_else(|e| exit_with_error(&format!("Failed to load condition: {}", e)))
    });

    // --- 2. Modules ---
    let data: serde_json::Value = serde_json::from_str(&data_json)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to parse data model JSON: {}", e)));
    let serde_json::Value::Object(modules_json) = data else {
        exit_with_error("Data model JSON must be an object keyed by module id.");
    };
    let modules = Arc::new(ModuleRegistry::new());
    for (id, model) in &modules_json {
        modules.add(Module::new(id.clone(), id.clone(), DataModel::from_json(model)));
    }
    println!("Loaded {} module(s).", modules_json.len());

    // --- 3. Script ---
    let profile = Profile::with_config("cli", Arc::clone(&modules), config);
    let definition = ScriptDefinition::from_json(&script_json)
        .unwrap_or_else(|e| exit_with_error(&e.to_string()));
    let mut script = NodeScript::from_definition(&definition, &NodeRegistry::new(), &profile)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to build script: {}", e)));
    println!(
        "Built script '{}' with {} node(s) and {} connection(s).",
        script.name(),
        script.nodes().len(),
        script.connections().len()
    );

    // --- 4. Evaluation ---
    let eval_start = Instant::now();
    for pass in 1..=options.passes.max(1) {
        modules.update(profile.config().frame_delta().as_secs_f64());
        if let Err(e) = script.evaluate(&profile) {
            exit_with_error(&format!("Pass {} failed: {}", pass, e));
        }
    }
    let eval_duration = eval_start.elapsed();

    // --- 5. Results ---
    println!("\nOutputs after {} pass(es):", options.passes.max(1));
    for node in script.nodes() {
        for pin in node.outputs() {
            println!("  {} [{}] {} = {}", node.name(), node.id(), pin.name(), pin.cell());
        }
    }

    if let Some(condition) = condition {
        let tree = ConditionTree::from_definition(condition);
        let verdict = tree.evaluate(profile.data_models());
        println!("\nDisplay condition: {}", if verdict { "shown" } else { "hidden" });
    }

    println!("\n--- Performance Summary ---");
    println!("Evaluation:           {:?}", eval_duration);
    println!("Total Execution:      {:?}", total_start.elapsed());
}

fn prompt_options() -> RunOptions {
    println!("--- Hikari Interactive Mode ---");
    let script_path = prompt_for_input("Enter script definition path", Some("data/script.json"));
    let data_path = prompt_for_input("Enter data model path", Some("data/data_model.json"));
    let condition_path = prompt_for_input("Enter condition path (optional)", None);
    let passes = loop {
        let answer = prompt_for_input("Number of passes", Some("1"));
        match answer.parse::<u32>() {
            Ok(passes) if passes > 0 => break passes,
            _ => println!("Please enter a positive number."),
        }
    };
    RunOptions {
        script_path,
        data_path,
        condition_path: (!condition_path.is_empty()).then_some(condition_path),
        config_path: None,
        passes,
    }
}

fn read_file(path: &str, what: &str) -> String {
    fs::read_to_string(path)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to read {} file '{}': {}", what, path, e)))
}

/// A helper function to prompt the user and read a line of input.
fn prompt_for_input(prompt_text: &str, default: Option<&str>) -> String {
    let mut line = String::new();
    let default_prompt = default.map_or(String::new(), |d| format!(" [default: {}]", d));

    print!("> {}{}: ", prompt_text, default_prompt);
    if io::stdout().flush().is_err() || io::stdin().read_line(&mut line).is_err() {
        exit_with_error("Failed to read from the terminal.");
    }
    let trimmed = line.trim().to_string();

    if trimmed.is_empty() {
        default.unwrap_or("").to_string()
    } else {
        trimmed
    }
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}
