use anyhow::{Context, Result};
use clap::Parser;
use pathway_planner::{config::Config, domain::PlanningData, model::EmissionControl, telemetry, Planner};
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Planning data (.json, .yaml or .yml)
    #[arg(short, long, required_unless_present = "print_config")]
    input: Option<PathBuf>,

    /// TOML configuration; defaults to config/default.toml
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write the plan and its reporting as pretty JSON
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Override the configured emission control (cap, carbon-price, unconstrained)
    #[arg(long)]
    emission_control: Option<EmissionControl>,

    /// JSON log lines
    #[arg(long)]
    log_json: bool,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    print_config: bool,
}

#[derive(Serialize)]
struct Output<'a> {
    plan: &'a pathway_planner::results::PlanResult,
    report: &'a pathway_planner::results::PlanReport,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut cfg = match &cli.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => Config::load().context("loading config")?,
    };
    if let Some(mode) = cli.emission_control {
        cfg.model.emission_control = mode;
    }

    if cli.print_config {
        println!("{}", toml::to_string_pretty(&cfg).context("rendering config")?);
        return Ok(());
    }

    telemetry::init_tracing(cli.log_json || cfg.telemetry.json);

    let input = cli.input.as_deref().context("--input is required")?;
    let data = PlanningData::from_path(input)
        .with_context(|| format!("reading planning data {}", input.display()))?;
    info!(
        sites = data.sites.len(),
        technologies = data.technologies.len(),
        years = data.years.len(),
        emission_control = %cfg.model.emission_control,
        "planning data loaded"
    );

    let planner = Planner::from_config(&cfg);
    let (plan, report) = planner.plan_with_report(&data).context("planning failed")?;

    println!("{}", plan.summary());
    println!(
        "present value @ {:.1}%: {:.2}",
        report.discount_rate * 100.0,
        report.present_value
    );

    if let Some(path) = &cli.output {
        let json = serde_json::to_string_pretty(&Output {
            plan: &plan,
            report: &report,
        })?;
        std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
        info!(path = %path.display(), "results written");
    }

    Ok(())
}
