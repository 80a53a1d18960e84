mod settings;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use spheresweep_config::Credentials;
use spheresweep_datasphere::DatasphereClient;
use spheresweep_engine::{
    CommunityOutcome, CommunityReport, DiscoveredCommunity, ProjectListing, SweepReport, Sweeper,
};
use std::io::Write;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sweep")]
#[command(about = "Bulk-delete Datasphere communities together with their projects", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Which communities to work on
#[derive(Args)]
struct Target {
    /// OAuth token exchanged for an IAM token
    #[arg(long, env = "AUTH_TOKEN", hide_env_values = true)]
    auth_token: Option<String>,

    /// Organization owning the communities
    #[arg(long = "organization", env = "ORGANIZATION_ID")]
    organization_id: Option<String>,

    /// Substring matched against community names and descriptions
    #[arg(long = "filter", env = "COMMUNITY_SUBSTR")]
    community_filter: Option<String>,
}

impl Target {
    fn credentials(self) -> anyhow::Result<Credentials> {
        Ok(Credentials::from_parts(
            self.auth_token,
            self.organization_id,
            self.community_filter,
        )?)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Delete every matching community and its projects
    Run {
        #[command(flatten)]
        target: Target,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// List matching communities and their projects without deleting anything
    List {
        #[command(flatten)]
        target: Target,
    },
    /// Show version information
    Version,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let dotenv = spheresweep_config::load_dotenv();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Some(path) = dotenv {
        tracing::debug!("Loaded environment from {}", path.display());
    }

    match cli.command {
        Commands::Run { target, yes, json } => run(target.credentials()?, yes, json).await,
        Commands::List { target } => list(target.credentials()?).await,
        Commands::Version => {
            println!("sweep {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

async fn connect_sweeper(credentials: &Credentials) -> anyhow::Result<Sweeper<DatasphereClient>> {
    let file_config =
        spheresweep_config::load_file_config().context("Failed to load config file")?;

    let client = DatasphereClient::connect(
        settings::endpoints(&file_config.endpoints),
        &credentials.auth_token,
    )
    .await
    .context("Failed to obtain an IAM token")?;

    Ok(Sweeper::new(
        Arc::new(client),
        settings::sweep_settings(&file_config),
    ))
}

async fn discover(
    sweeper: &Sweeper<DatasphereClient>,
    credentials: &Credentials,
) -> anyhow::Result<Vec<DiscoveredCommunity>> {
    let discovered = sweeper
        .discover(&credentials.organization_id, &credentials.community_filter)
        .await?;
    Ok(discovered)
}

async fn list(credentials: Credentials) -> anyhow::Result<()> {
    let sweeper = connect_sweeper(&credentials).await?;
    let discovered = discover(&sweeper, &credentials).await?;

    if discovered.is_empty() {
        println!("{}", "No matching communities".yellow());
        return Ok(());
    }

    for entry in &discovered {
        println!("{}", entry.community.to_string().bold());
        match &entry.projects {
            ProjectListing::Listed(projects) => {
                for project in projects {
                    println!("\t{} {}", project.id, project.name.dimmed());
                }
            }
            ProjectListing::Failed(reason) => {
                println!("\t{} {}", "projects unavailable:".red(), reason);
            }
        }
    }

    print_plan(&discovered);
    Ok(())
}

async fn run(credentials: Credentials, yes: bool, json: bool) -> anyhow::Result<()> {
    let sweeper = connect_sweeper(&credentials).await?;
    let discovered = discover(&sweeper, &credentials).await?;

    if discovered.is_empty() {
        println!("{}", "No matching communities".yellow());
        return Ok(());
    }

    print_plan(&discovered);
    if !yes && !confirm()? {
        println!("Aborted");
        return Ok(());
    }

    tokio::spawn(handle_interrupts(sweeper.cancellation_token()));

    let report = sweeper.sweep(discovered).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    if !report.is_success() {
        tracing::warn!(
            "{} of {} communities were not deleted",
            report.total() - report.deleted(),
            report.total()
        );
    }
    Ok(())
}

/// First Ctrl-C stops new deletions, the second one exits at once
async fn handle_interrupts(cancel: CancellationToken) {
    if tokio::signal::ctrl_c().await.is_err() {
        return;
    }
    tracing::warn!("Interrupted, no further deletions are started (Ctrl-C again to exit now)");
    cancel.cancel();

    if tokio::signal::ctrl_c().await.is_ok() {
        eprintln!("{}", "Aborted, some deletions may still be in progress".red().bold());
        std::process::exit(130);
    }
}

fn print_plan(discovered: &[DiscoveredCommunity]) {
    let projects: usize = discovered.iter().map(DiscoveredCommunity::project_count).sum();
    println!(
        "{}",
        format!(
            "{} communities and {} projects matched",
            discovered.len(),
            projects
        )
        .bold()
    );
}

fn confirm() -> anyhow::Result<bool> {
    print!("Delete them all? [y/N] ");
    std::io::stdout().flush()?;

    let mut answer = String::new();
    std::io::stdin().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}

fn print_report(report: &SweepReport) {
    println!();
    println!("{}", "Statistic - (total|deleted|failed) Projects".bold());
    for community in &report.communities {
        println!(
            "\tCommunity {} ({}|{}|{}) {}",
            community.community.id,
            community.total,
            community.succeeded,
            community.failed,
            outcome_label(community)
        );
    }

    let summary = format!(
        "Communities deleted {}/{} in {:.1}s",
        report.deleted(),
        report.total(),
        report.duration_ms as f64 / 1000.0
    );
    if report.is_success() {
        println!("{}", summary.green().bold());
    } else {
        println!("{}", summary.red().bold());
    }
}

fn outcome_label(community: &CommunityReport) -> colored::ColoredString {
    match &community.outcome {
        Some(outcome @ CommunityOutcome::Deleted) => outcome.to_string().green(),
        Some(outcome @ (CommunityOutcome::Retained | CommunityOutcome::Abandoned)) => {
            outcome.to_string().yellow()
        }
        Some(outcome) => outcome.to_string().red(),
        None => "unresolved".red(),
    }
}
