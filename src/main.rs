//! Command-line front end.
//!
//! ```text
//! ptwalk <scenario.json> [--output <dir>] [--format terminal|html|both|json|interactive]
//!        [--quiet] [--tree]
//! ```
//!
//! Exit codes: 0 on success, 1 for a missing scenario file or a
//! configuration error, 2 for any other failure.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};

use ptwalk::render::{html, terminal};
use ptwalk::report;
use ptwalk::scenario::{Scenario, ScenarioError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Print the trace and summary to stdout
    Terminal,
    /// Write a standalone HTML page
    Html,
    /// Terminal output plus HTML and JSON files
    Both,
    /// Write the result JSON only
    Json,
    /// Write the result JSON plus a reusable browser viewer
    Interactive,
}

#[derive(Debug, Parser)]
#[command(
    name = "ptwalk",
    about = "ARMv9 two-stage page table walk simulator",
    after_help = "Examples:\n  \
        ptwalk scenarios/scenario_a_success.json\n  \
        ptwalk scenarios/scenario_a_success.json --format html --output results/\n  \
        ptwalk scenarios/scenario_a_success.json --format both"
)]
struct Cli {
    /// Path to the scenario JSON file
    scenario: PathBuf,

    /// Output directory for generated files
    #[arg(short, long, default_value = "results")]
    output: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value = "terminal")]
    format: OutputFormat,

    /// Suppress terminal output (useful with --format json)
    #[arg(short, long)]
    quiet: bool,

    /// Show the nested tree view instead of the flat table (terminal only)
    #[arg(long)]
    tree: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {}", err);
            let config_error = err
                .downcast_ref::<ScenarioError>()
                .map(ScenarioError::is_configuration)
                .unwrap_or(false);
            if config_error {
                ExitCode::from(1)
            } else {
                ExitCode::from(2)
            }
        }
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let scenario = Scenario::load(&cli.scenario)?;
    let result = scenario.run();
    let document = report::build_report(&scenario, &result, &report::timestamp_utc());

    let show_terminal =
        matches!(cli.format, OutputFormat::Terminal | OutputFormat::Both) && !cli.quiet;
    let save_html = matches!(cli.format, OutputFormat::Html | OutputFormat::Both);
    let save_json = matches!(cli.format, OutputFormat::Json | OutputFormat::Both);

    if show_terminal {
        if cli.tree {
            terminal::print_tree(&result);
        } else {
            terminal::print_walk(&result);
        }
    }

    if save_html {
        let html_path = html::save(&scenario, &result, &cli.output)?;
        if !cli.quiet {
            println!("HTML saved to: {}", html_path.display());
        }
    }

    if cli.format == OutputFormat::Interactive {
        let (template_path, json_path) =
            html::write_interactive(&document, &scenario.name, &cli.output)?;
        if !cli.quiet {
            println!("Generated JSON data: {}", json_path.display());
            println!("Visualizer template: {}", template_path.display());
            println!(
                "Open {} in a browser, then load {}",
                template_path.display(),
                json_path.display()
            );
        }
    }

    if save_json {
        let json_path = cli.output.join(format!("{}.json", scenario.name));
        report::save_json(&document, &json_path)?;
        if !cli.quiet {
            println!("JSON saved to: {}", json_path.display());
        }
    }

    Ok(())
}
