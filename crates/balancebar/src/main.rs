//! balancebar - OpenRouter balance and spending pace from the command line

mod cli;

use anyhow::{Context, Result};
use balancebar_core::types::Balance;
use balancebar_core::{
    compute_pacing, verify_key, AppState, BalanceView, Clock, OpenRouterClient, Settings,
    SystemClock,
};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "balancebar",
    version,
    about = "OpenRouter balance and spending pace",
    long_about = "Shows the monthly OpenRouter credit balance of the active API key and\n\
                  whether spending is on pace for the month, week and day.\n\
                  \n\
                  Examples:\n\
                    balancebar                              # Fetch and show the active key\n\
                    balancebar --json                       # Same, as JSON\n\
                    balancebar pace --limit 100 --usage-month 40 --at 2024-04-16\n\
                    balancebar keys                         # List configured keys (masked)\n\
                    balancebar check sk-or-v1-...           # Verify a key against OpenRouter\n\
                  \n\
                  Environment Variables:\n\
                    OPENROUTER_API_KEY                      # Key to use instead of the active one\n\
                    BALANCEBAR_SETTINGS                     # Settings file path\n\
                    BALANCEBAR_NO_COLOR                     # Disable ANSI colors\n\
                    BALANCEBAR_LOG                          # Log filter, e.g. debug"
)]
struct Cli {
    #[command(subcommand)]
    mode: Option<Mode>,

    /// Settings file (default: ~/.config/bpesc-balance/settings.json)
    #[arg(long, env = "BALANCEBAR_SETTINGS", global = true)]
    settings: Option<PathBuf>,

    /// API key to use; selected if already configured, added in memory otherwise
    #[arg(long, env = "OPENROUTER_API_KEY", hide_env_values = true, global = true)]
    api_key: Option<String>,

    /// Pace warn threshold in percent over target
    #[arg(long, global = true)]
    warn: Option<f64>,

    /// Pace over threshold in percent over target
    #[arg(long, global = true)]
    over: Option<f64>,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Disable ANSI colors (log-friendly)
    #[arg(long, env = "BALANCEBAR_NO_COLOR", global = true)]
    no_color: bool,
}

#[derive(Subcommand)]
enum Mode {
    /// Fetch the active key's balance and show it with pacing (default)
    Status,
    /// Compute pacing offline from given figures
    Pace {
        /// Monthly credit limit in dollars (omit for an unlimited key)
        #[arg(long)]
        limit: Option<f64>,
        /// Usage so far this month
        #[arg(long)]
        usage_month: Option<f64>,
        /// Usage so far this week
        #[arg(long)]
        usage_week: Option<f64>,
        /// Usage so far today
        #[arg(long)]
        usage_day: Option<f64>,
        /// Local time to evaluate at: YYYY-MM-DD [HH:MM[:SS]] (default: now)
        #[arg(long)]
        at: Option<String>,
    },
    /// List configured API keys
    Keys,
    /// Verify an API key against OpenRouter
    Check {
        /// Key to verify
        key: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();

    let mut settings = cli::load_settings(cli.settings.as_deref())?;
    if let Some(key) = cli.api_key.as_deref() {
        cli::apply_api_key(&mut settings, key)?;
    }
    if cli.warn.is_some() || cli.over.is_some() {
        let warn = cli.warn.unwrap_or(settings.pace.warn());
        let over = cli.over.unwrap_or(settings.pace.over());
        settings.set_pace_thresholds(warn, over);
    }

    let json = cli.json;
    let no_color = cli.no_color;

    match cli.mode.unwrap_or(Mode::Status) {
        Mode::Status => {
            run_status(settings, json, no_color).await?;
        }
        Mode::Pace {
            limit,
            usage_month,
            usage_week,
            usage_day,
            at,
        } => {
            let balance = Balance {
                usage_weekly: usage_week,
                usage_daily: usage_day,
                ..Balance::from_limit_and_usage(limit, usage_month, None)
            };
            run_pace(settings, balance, at, json, no_color)?;
        }
        Mode::Keys => {
            println!("{}", cli::format_keys(&settings, json, no_color));
        }
        Mode::Check { key } => {
            run_check(&key, json, no_color).await?;
        }
    }

    Ok(())
}

/// Logs go to stderr so JSON on stdout stays clean
fn init_tracing() {
    let filter = EnvFilter::try_from_env("BALANCEBAR_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run_status(settings: Settings, json: bool, no_color: bool) -> Result<()> {
    let client = OpenRouterClient::new()?;
    let mut state = AppState::new(settings);

    if let Err(e) = state.refresh(&client, &SystemClock).await {
        let context = match e.suggestion() {
            Some(hint) => format!("Failed to fetch balance ({})", hint),
            None => "Failed to fetch balance".to_string(),
        };
        return Err(anyhow::Error::new(e).context(context));
    }

    println!("{}", cli::format_balance_view(&state.view(), json, no_color));
    Ok(())
}

fn run_pace(
    settings: Settings,
    balance: Balance,
    at: Option<String>,
    json: bool,
    no_color: bool,
) -> Result<()> {
    let now = match at {
        Some(at) => cli::parse_at(&at)?,
        None => SystemClock.now(),
    };

    let report = compute_pacing(&balance, &settings.pace, &now);
    let view = BalanceView::build(Some(&balance), &report, &settings);
    println!("{}", cli::format_balance_view(&view, json, no_color));
    Ok(())
}

async fn run_check(key: &str, json: bool, no_color: bool) -> Result<()> {
    let client = OpenRouterClient::new()?;
    let balance = verify_key(&client, key)
        .await
        .context("API key verification failed")?;

    let mut settings = Settings::default();
    let label = balance.label.clone().unwrap_or_default();
    settings.credentials.add(key, &label)?;

    let report = compute_pacing(&balance, &settings.pace, &SystemClock.now());
    let view = BalanceView::build(Some(&balance), &report, &settings);
    if !json {
        println!("Key is valid.");
    }
    println!("{}", cli::format_balance_view(&view, json, no_color));
    Ok(())
}
