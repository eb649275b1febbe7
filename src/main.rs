mod backend;
mod config;
mod consts;
mod environment;
mod error_classifier;
mod events;
mod logging;
mod network;
mod portfolio;
mod pretty;
mod session;
mod sync;
mod ui;

use crate::config::{Config, get_config_path};
use crate::environment::Environment;
use crate::network::endpoint::{Params, endpoints};
use crate::portfolio::{Action, Feedback, Preferences, TradeOrder};
use crate::pretty::{print_cmd_error, print_cmd_info, print_cmd_warn};
use crate::session::{SessionData, print_section, resolve_server_url, setup_session};
use crate::sync::{Section, SectionState};
use clap::{Parser, Subcommand};
use std::error::Error;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
/// Terminal client for the portfolio management server
struct Args {
    /// Deployment to talk to (local, staging, production). Defaults to
    /// PORTFOLIO_ENVIRONMENT, then local.
    #[arg(long, global = true, value_name = "ENV")]
    env: Option<Environment>,

    /// Server URL, overriding the environment and the config file
    #[arg(long, global = true, value_name = "URL")]
    server_url: Option<String>,

    /// Config file [default: ~/.portfolio-view/config.json]
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Command to execute
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Interactive dashboard with one tab per section
    Dashboard {
        /// Disable background colors
        #[arg(long, action = clap::ArgAction::SetTrue)]
        no_background_color: bool,
    },
    /// Refresh periodically and print activity until Ctrl+C
    Watch,
    /// Fetch sections once and print them
    Refresh {
        /// Sections to refresh [default: the configured sections]
        #[arg(value_enum)]
        sections: Vec<Section>,
    },
    /// Buy shares
    Buy {
        symbol: String,
        quantity: f64,
        /// Purchase price [default: market price]
        #[arg(long)]
        price: Option<f64>,
        /// Purchase date, YYYY-MM-DD [default: today]
        #[arg(long)]
        date: Option<String>,
    },
    /// Sell part of a holding
    Sell {
        symbol: String,
        quantity: f64,
        /// Sell price [default: market price]
        #[arg(long)]
        price: Option<f64>,
        /// Sell date, YYYY-MM-DD [default: today]
        #[arg(long)]
        date: Option<String>,
    },
    /// Remove a holding entirely
    Remove { symbol: String },
    /// Rate a recommendation
    Rate {
        /// Recommendation type, e.g. buy, sell, rebalance
        #[arg(long = "type")]
        recommendation_type: String,
        /// Recommendation action text
        #[arg(long = "action")]
        recommendation_action: String,
        /// 1 to 5
        #[arg(long)]
        rating: u8,
        /// The recommendation was followed
        #[arg(long, action = clap::ArgAction::SetTrue)]
        followed: bool,
        #[arg(long)]
        comment: Option<String>,
    },
    /// Show or change investment preferences
    Preferences {
        #[command(subcommand)]
        command: PreferencesCommand,
    },
    /// Manage the config file
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand)]
enum PreferencesCommand {
    /// Print the stored preferences
    Show,
    /// Change some preferences, keeping the others
    Save {
        #[arg(long)]
        risk_tolerance: Option<String>,
        #[arg(long)]
        chart_period: Option<String>,
        #[arg(long)]
        notifications: Option<bool>,
        #[arg(long)]
        investment_goal: Option<String>,
        #[arg(long)]
        time_horizon: Option<String>,
        #[arg(long)]
        preferred_sectors: Option<String>,
        #[arg(long)]
        preferred_assets: Option<String>,
        #[arg(long)]
        tax_consideration: Option<bool>,
    },
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Print the effective configuration
    Show,
    /// Delete the config file
    Reset,
    /// Store connection settings
    Set {
        #[arg(long)]
        server_url: Option<String>,
        /// Cookie header value of a logged-in session
        #[arg(long)]
        session_cookie: Option<String>,
        #[arg(long)]
        refresh_interval_secs: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let environment = args.env.unwrap_or_else(Environment::from_env);
    let config_path = match args.config {
        Some(path) => path,
        None => get_config_path()?,
    };

    if !matches!(args.command, Command::Dashboard { .. }) {
        logging::init_stderr_logger();
    }

    match args.command {
        Command::Config { command } => run_config_command(command, &config_path),
        command => {
            let config = Config::load_or_default(&config_path)?;
            let server_url = resolve_server_url(args.server_url.as_deref(), &config, environment);
            let session = setup_session(&config, environment, server_url)?;
            run_session_command(command, session).await
        }
    }
}

fn run_config_command(command: ConfigCommand, config_path: &Path) -> Result<(), Box<dyn Error>> {
    match command {
        ConfigCommand::Show => {
            let config = Config::load_or_default(config_path)?;
            println!("# {}", config_path.display());
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        ConfigCommand::Reset => {
            println!("Removing {}...", config_path.display());
            Config::clear(config_path)?;
        }
        ConfigCommand::Set {
            server_url,
            session_cookie,
            refresh_interval_secs,
        } => {
            let mut config = Config::load_or_default(config_path)?;
            if server_url.is_some() {
                config.server_url = server_url;
            }
            if session_cookie.is_some() {
                config.session_cookie = session_cookie;
            }
            if let Some(secs) = refresh_interval_secs {
                config.refresh_interval_secs = secs;
            }
            config.save(config_path)?;
            println!("Saved {}", config_path.display());
        }
    }
    Ok(())
}

async fn run_session_command(
    command: Command,
    mut session: SessionData,
) -> Result<(), Box<dyn Error>> {
    match command {
        Command::Dashboard {
            no_background_color,
        } => session::run_tui_mode(session, !no_background_color).await,
        Command::Watch => session::run_headless_mode(session).await,
        Command::Refresh { sections } => {
            let sections = if sections.is_empty() {
                session.sections.clone()
            } else {
                sections
            };
            if sections.is_empty() {
                print_cmd_warn!("Nothing to refresh", "No sections are enabled");
                return Ok(());
            }
            let mut failed = 0;
            for section in &sections {
                session.renderer.refresh_now(*section).await;
                print_section(&session, *section);
                if matches!(session.renderer.state(*section), SectionState::Error { .. }) {
                    failed += 1;
                }
            }
            if failed == sections.len() {
                print_cmd_error!(
                    "Server unreachable",
                    "No section could be loaded from {}",
                    session.server_url
                );
                return Err(format!("{} of {} sections failed", failed, sections.len()).into());
            }
            Ok(())
        }
        Command::Buy {
            symbol,
            quantity,
            price,
            date,
        } => {
            let order = TradeOrder {
                price,
                date,
                ..TradeOrder::new(&symbol, quantity)
            };
            write_and_report(&mut session, Section::Performance, Action::Buy(order)).await
        }
        Command::Sell {
            symbol,
            quantity,
            price,
            date,
        } => {
            // Cap the sell at the held quantity
            session.renderer.request_holding(&symbol);
            session.renderer.settle().await;
            let order = TradeOrder {
                price,
                date,
                ..TradeOrder::new(&symbol, quantity)
            };
            write_and_report(&mut session, Section::Performance, Action::Sell(order)).await
        }
        Command::Remove { symbol } => {
            write_and_report(&mut session, Section::Performance, Action::RemoveAll { symbol })
                .await
        }
        Command::Rate {
            recommendation_type,
            recommendation_action,
            rating,
            followed,
            comment,
        } => {
            let feedback = Feedback {
                recommendation_type,
                recommendation_action,
                rating,
                was_followed: followed,
                comment,
            };
            write_and_report(&mut session, Section::Recommendations, Action::Rate(feedback)).await
        }
        Command::Preferences { command } => run_preferences_command(command, &session).await,
        Command::Config { .. } => Ok(()),
    }
}

/// Submits `action`, waits for the refreshes it triggers and prints the
/// affected sections.
async fn write_and_report(
    session: &mut SessionData,
    section: Section,
    action: Action,
) -> Result<(), Box<dyn Error>> {
    let description = action.describe();
    let affected: Vec<Section> = std::iter::once(section)
        .chain(action.dependent_sections().iter().copied())
        .fold(Vec::new(), |mut acc, s| {
            if !acc.contains(&s) {
                acc.push(s);
            }
            acc
        });

    match session.renderer.apply_action_now(section, action).await {
        Ok(ack) => {
            print_cmd_info!(
                "Done",
                "{}{}",
                description,
                ack.message.map(|m| format!(": {}", m)).unwrap_or_default()
            );
            session.renderer.settle().await;
            for section in affected {
                print_section(session, section);
            }
            Ok(())
        }
        Err(error) if error.is_ambiguous() => {
            print_cmd_warn!(
                "Outcome unknown",
                "{}: {}. Refresh before retrying.",
                description,
                error
            );
            Err(error.into())
        }
        Err(error) => {
            print_cmd_error!("Write failed", "{}: {}", description, error);
            Err(error.into())
        }
    }
}

async fn load_preferences(session: &SessionData) -> Result<Preferences, Box<dyn Error>> {
    let value = session
        .fetcher
        .lookup(&endpoints::PREFERENCES, &Params::new())
        .await?;
    Ok(serde_json::from_value(value)?)
}

async fn run_preferences_command(
    command: PreferencesCommand,
    session: &SessionData,
) -> Result<(), Box<dyn Error>> {
    match command {
        PreferencesCommand::Show => {
            let preferences = load_preferences(session).await?;
            println!("{}", serde_json::to_string_pretty(&preferences)?);
        }
        PreferencesCommand::Save {
            risk_tolerance,
            chart_period,
            notifications,
            investment_goal,
            time_horizon,
            preferred_sectors,
            preferred_assets,
            tax_consideration,
        } => {
            let mut preferences = load_preferences(session).await?;
            if let Some(v) = risk_tolerance {
                preferences.risk_tolerance = v;
            }
            if let Some(v) = chart_period {
                preferences.default_chart_period = v;
            }
            if let Some(v) = notifications {
                preferences.enable_notifications = v;
            }
            if let Some(v) = investment_goal {
                preferences.investment_goal = v;
            }
            if let Some(v) = time_horizon {
                preferences.time_horizon = v;
            }
            if let Some(v) = preferred_sectors {
                preferences.preferred_sectors = v;
            }
            if let Some(v) = preferred_assets {
                preferences.preferred_assets = v;
            }
            if let Some(v) = tax_consideration {
                preferences.tax_consideration = v;
            }
            let ack = session
                .fetcher
                .submit(&Action::SavePreferences(preferences))
                .await?;
            print_cmd_info!(
                "Preferences saved",
                "{}",
                ack.message.unwrap_or_else(|| "ok".to_string())
            );
        }
    }
    Ok(())
}
