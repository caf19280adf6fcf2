//! SmartShopper - South African grocery deal finder
//!
//! CLI entry point: one-shot runs, listings, and the interactive UI.

use std::fs;
use std::path::PathBuf;

use clap::Parser;
use colored::Colorize;
use eyre::{Context, Result};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use smartshopper::cli::{Cli, Command, OutputFormat, collect_items, get_log_path};
use smartshopper::config::Config;
use smartshopper::domain::{LOYALTY_PROGRAMS, Region, ShoppingReport};
use smartshopper::pipeline::{Pipeline, PipelineError, PipelineEvent, PipelineStatus};
use smartshopper::prompts::PromptLoader;
use smartshopper::{AgentRole, tui};

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    let log_path = get_log_path();
    let log_dir = log_path.parent().map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."));
    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // Priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::File::create(&log_path).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Log level from config before the full load, so the load itself is logged
    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    info!(
        llm = %config.llm.provider,
        model = config.llm.model(),
        search = %config.search.provider,
        "SmartShopper loaded config"
    );

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Some(Command::Run {
            items,
            file,
            region,
            format,
        }) => cmd_run(&config, &items, file.as_deref(), region, format).await,
        Some(Command::Regions) => cmd_regions(&config),
        Some(Command::Agents) => cmd_agents(&config),
        None => cmd_tui(&config).await,
    }
}

/// Run the pipeline once and print the report
async fn cmd_run(
    config: &Config,
    items: &[String],
    file: Option<&std::path::Path>,
    region: Option<Region>,
    format: OutputFormat,
) -> Result<()> {
    debug!(count = items.len(), ?file, ?region, %format, "cmd_run: called");
    let list = collect_items(items, file)?;
    if list.is_empty() {
        eprintln!("{}", PipelineError::EmptyList.to_string().red());
        std::process::exit(1);
    }

    config.validate().context("Invalid configuration")?;
    let region = region.unwrap_or(config.shopping.default_region);
    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    let pipeline = Pipeline::from_config(config, &PromptLoader::new(&cwd))?;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let printer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            print_event(&event);
        }
    });

    let result = pipeline.run(&list, region, Some(&tx)).await;
    drop(tx);
    if let Err(e) = printer.await {
        warn!(error = %e, "cmd_run: progress printer failed");
    }

    match result {
        Ok(report) => {
            match format {
                OutputFormat::Text => print_report(&report),
                OutputFormat::Markdown => println!("{}", report.to_markdown()),
                OutputFormat::Json => {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&report).context("Failed to serialize report")?
                    )
                }
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("{} {}", "An error occurred during processing:".red(), e);
            std::process::exit(1);
        }
    }
}

/// Progress goes to stderr so stdout stays clean for the report
fn print_event(event: &PipelineEvent) {
    match event {
        PipelineEvent::StatusChanged(PipelineStatus::Done) => {
            eprintln!("{} {}", "✓".green(), PipelineStatus::Done.label());
        }
        PipelineEvent::StatusChanged(status) if status.is_running() => {
            eprintln!("{} {}", "→".cyan(), status.label());
        }
        PipelineEvent::SearchingItem { index, total, item } => {
            eprintln!("  {} {}", format!("[{}/{}]", index, total).dimmed(), item);
        }
        _ => {}
    }
}

fn print_report(report: &ShoppingReport) {
    println!();
    println!("{}", format!("Shopping Analysis for {}", report.region).bright_cyan().bold());
    println!();
    println!("{}", "Recommended Shopping Plan".yellow().bold());
    println!(
        "{}",
        "Prices shown include standard loyalty program discounts where applicable".dimmed()
    );
    println!("{}", report.plan.trim_end());
    println!();
    println!("{}", "Loyalty Program Benefits".yellow().bold());
    for program in LOYALTY_PROGRAMS {
        println!("  {}: {}", program.name.bold(), program.summary);
    }
    println!();
    println!("{}", "Price Analysis".yellow().bold());
    println!("{}", report.analysis.trim_end());
    println!();
    println!("{}", "Raw Price Data".yellow().bold());
    println!("{}", report.raw_prices.trim_end().dimmed());
}

/// List the selectable regions
fn cmd_regions(config: &Config) -> Result<()> {
    debug!("cmd_regions: called");
    println!("Available regions:");
    for region in Region::ALL {
        if region == config.shopping.default_region {
            println!("  {} {}", region.name(), "(default)".dimmed());
        } else {
            println!("  {}", region.name());
        }
    }
    Ok(())
}

/// List the agents with their model and functions
fn cmd_agents(config: &Config) -> Result<()> {
    debug!("cmd_agents: called");
    println!("Agents ({} via {}):", config.llm.model(), config.llm.provider);
    println!();
    for role in AgentRole::ALL {
        let functions: Vec<&str> = role.capabilities().iter().map(|c| c.name()).collect();
        println!("  {}", role.display_name().bold());
        println!("    Role: {}", role);
        println!("    Prompt: {}.pmt", role.template_name());
        if functions.is_empty() {
            println!("    Functions: {}", "none".dimmed());
        } else {
            println!("    Functions: {}", functions.join(", ").yellow());
        }
        println!();
    }
    Ok(())
}

/// Launch the interactive UI
async fn cmd_tui(config: &Config) -> Result<()> {
    debug!("cmd_tui: called");
    config.validate().context("Invalid configuration")?;
    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    let pipeline = Pipeline::from_config(config, &PromptLoader::new(&cwd))?;
    tui::run(pipeline, config.shopping.default_region).await
}
