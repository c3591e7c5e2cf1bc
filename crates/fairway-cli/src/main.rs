//! `fairway`: operator CLI over the contest engines.
//!
//! Reads JSON files, runs one engine, prints pretty JSON to stdout. Logs go
//! to stderr and honour `RUST_LOG`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use fairway_engine::{
    PricingEngine, ResolvedWindow, derive_window, registration_close, resolve_contest,
    validate_lineup,
};
use fairway_types::{
    Contest, ContestFormat, ContestState, FairwayConfig, Pick, Player, PlayerId, Tournament,
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "fairway", version)]
#[command(about = "Fantasy golf contest engines: pricing, lifecycle and lineup checks")]
struct Cli {
    /// JSON config file; defaults apply when omitted
    #[arg(long, global = true, env = "FAIRWAY_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Price a field of players from their rankings and form
    Price {
        /// JSON array of players
        #[arg(long)]
        players: PathBuf,

        /// Field size used for the scarcity multiplier; defaults to the
        /// number of players
        #[arg(long)]
        field_size: Option<usize>,
    },

    /// Resolve a contest's state at an instant
    State {
        /// JSON contest
        #[arg(long)]
        contest: PathBuf,

        /// JSON tournament the contest belongs to; its window is checked
        /// against this one
        #[arg(long)]
        tournament: PathBuf,

        /// RFC 3339 instant; defaults to now
        #[arg(long)]
        now: Option<DateTime<Utc>>,
    },

    /// Validate a lineup against a salary cap
    Lineup {
        /// JSON `{ "picks": [...], "captain": "...", "salary_cap": 60000 }`
        #[arg(long)]
        lineup: PathBuf,
    },

    /// Derive the registration window of a format in a tournament
    Schedule {
        /// JSON tournament
        #[arg(long)]
        tournament: PathBuf,

        #[arg(long, value_enum, default_value = "standard")]
        format: FormatArg,

        /// RFC 3339 registration open; when omitted only the close is shown
        #[arg(long)]
        reg_open: Option<DateTime<Utc>>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    Standard,
    HeadToHead,
}

impl From<FormatArg> for ContestFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Standard => Self::Standard,
            FormatArg::HeadToHead => Self::HeadToHead,
        }
    }
}

#[derive(Debug, Deserialize)]
struct LineupInput {
    picks: Vec<Pick>,
    #[serde(default)]
    captain: Option<PlayerId>,
    #[serde(default)]
    salary_cap: Option<i64>,
}

#[derive(Debug, Serialize)]
struct StateOutput {
    contest: String,
    now: DateTime<Utc>,
    state: ContestState,
    cached_state: Option<ContestState>,
    cache_stale: bool,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Price {
            players,
            field_size,
        } => {
            let players: Vec<Player> = read_json(&players)?;
            let field_size = field_size.unwrap_or(players.len());
            let engine = PricingEngine::new(config.pricing);
            let report = engine.calculate_all_salaries(&players, field_size)?;
            info!(
                players = players.len(),
                field_size,
                rescaled = report.needs_scaling,
                "Field priced"
            );
            print_json(&report)
        }
        Command::State {
            contest,
            tournament,
            now,
        } => {
            let contest: Contest = read_json(&contest)?;
            let tournament: Tournament = read_json(&tournament)?;
            let now = now.unwrap_or_else(Utc::now);
            let state = resolve_contest(&contest, &tournament, &config.registration, now)?;
            print_json(&StateOutput {
                contest: contest.id.to_string(),
                now,
                state,
                cached_state: contest.cached_state,
                cache_stale: contest.cached_state.is_some_and(|c| c != state),
            })
        }
        Command::Lineup { lineup } => {
            let input: LineupInput = read_json(&lineup)?;
            let rules = match input.salary_cap {
                Some(cap) => config.lineup.with_cap(cap),
                None => config.lineup,
            };
            print_json(&validate_lineup(&input.picks, input.captain, &rules))
        }
        Command::Schedule {
            tournament,
            format,
            reg_open,
        } => {
            let tournament: Tournament = read_json(&tournament)?;
            let format = ContestFormat::from(format);
            let policy = &config.registration;
            match reg_open {
                Some(open) => {
                    let window = derive_window(&tournament, format, open, policy)?;
                    print_json(&ResolvedWindow::from_window(&window).map(|w| {
                        serde_json::json!({
                            "reg_open": w.reg_open,
                            "reg_close": w.reg_close,
                            "start": w.start,
                            "end": w.end,
                        })
                    })?)
                }
                None => print_json(&serde_json::json!({
                    "format": format.to_string(),
                    "gating_round": policy.gating_round(format).to_string(),
                    "reg_close": registration_close(&tournament, format, policy)?,
                })),
            }
        }
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("fairway=info")),
        )
        .init();
}

fn load_config(path: Option<&Path>) -> Result<FairwayConfig> {
    match path {
        Some(path) => FairwayConfig::load(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(FairwayConfig::default()),
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
