//! rasterfn CLI - inspect raster functions and dry-run run files.

use anyhow::{bail, Context, Result};
use rasterfn::prelude::*;

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        print_usage(&args[0]);
        return;
    }

    let result = match args[1].as_str() {
        "list" => {
            list_functions();
            Ok(())
        }
        "info" => match args.get(2) {
            Some(id) => function_info(id),
            None => Err(anyhow::anyhow!("Please specify a function ID")),
        },
        "check" => match args.get(2) {
            Some(path) => check_run(path),
            None => Err(anyhow::anyhow!("Please specify a run file")),
        },
        "help" | "--help" | "-h" => {
            print_usage(&args[0]);
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {}", other);
            print_usage(&args[0]);
            std::process::exit(2);
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn print_usage(program: &str) {
    println!("rasterfn v{}", rasterfn::VERSION);
    println!();
    println!("Usage: {} <command> [options]", program);
    println!();
    println!("Commands:");
    println!("  list              List all available functions");
    println!("  info <function>   Show detailed info about a function");
    println!("  check <run.toml>  Prepare a run and print its configuration and output info");
    println!("  help              Show this help message");
    println!();
    println!("Set RUST_LOG=debug for configuration and negotiation details.");
}

fn list_functions() {
    let registry = FunctionRegistry::with_builtins();

    println!("Available functions ({} total):", registry.len());
    println!();
    for (id, entry) in registry.functions() {
        println!("  {} [{}] - {}", id, entry.metadata.category.display_name(), entry.metadata.description);
    }
}

fn function_info(id: &str) -> Result<()> {
    let registry = FunctionRegistry::with_builtins();
    let Some(metadata) = registry.get_metadata(id) else {
        bail!("Function not found: {} (use 'list' to see available functions)", id);
    };

    println!("Function: {}", metadata.name);
    println!("ID: {}", metadata.id);
    println!("Category: {}", metadata.category.display_name());
    println!("Version: {}", metadata.version);
    println!();
    println!("Description:");
    println!("  {}", metadata.description);
    println!();

    if !metadata.parameters.is_empty() {
        println!("Parameters:");
        for param in &metadata.parameters {
            let required = if param.required { " (required)" } else { "" };
            println!("  {} [{}] = {}{}", param.name, param.param_type, param.default_value, required);
            if let Some(domain) = &param.domain {
                println!("    one of: {}", domain.join(", "));
            }
            if !param.description.is_empty() {
                println!("    {}", param.description);
            }
        }
    }
    Ok(())
}

fn check_run(path: &str) -> Result<()> {
    let config = RunConfig::from_file(path).with_context(|| format!("Failed to load run file {}", path))?;
    let plan = config
        .prepare()
        .with_context(|| format!("Failed to prepare '{}'", config.function))?;

    println!("Configuration:");
    println!("{}", serde_json::to_string_pretty(&plan.configuration)?);
    println!();
    println!("Output info:");
    println!("{}", serde_json::to_string_pretty(&plan.output_info)?);
    Ok(())
}
