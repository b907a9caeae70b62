//! Blindsjn Headless - Scripted Surface for the State Synchronization Core
//!
//! Drives the login screen and the board through one scripted session against
//! the in-process gateway, printing every published state as a JSON line on
//! stdout. Logs go to stderr.
//!
//! # Usage
//!
//! ```bash
//! # Default scripted session
//! blindsjn-headless
//!
//! # Exercise the offline path
//! blindsjn-headless --offline
//!
//! # Wrong password, with a config file
//! blindsjn-headless --password nope --config ./client.toml
//!
//! # Verbose logging
//! BLINDSJN_LOG=debug blindsjn-headless
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing::{info, warn};

use blindsjn_core::gateway::{MemoryAuth, MemoryBoard};
use blindsjn_core::{
    default_config_path, load_config_from_path, ClientConfig, ConfigOverrides, FetchOrdering,
    LoginOutcome, MemoryCredentialStore, Post, PostSynchronizer, ScreenScope, SessionMachine,
    StaticNetwork, TagSelection,
};

/// Account the in-process gateway accepts
const DEMO_PHONE: &str = "010-1234-5678";
const DEMO_PASSWORD: &str = "blindsjn";
const DEMO_USER: u64 = 1;

/// Blindsjn Headless - scripted login and board session
#[derive(Parser, Debug)]
#[command(name = "blindsjn-headless")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(short = 'c', long, env = "BLINDSJN_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Report the network as unavailable
    #[arg(long)]
    offline: bool,

    /// Phone number to type into the login form
    #[arg(long, default_value = DEMO_PHONE)]
    phone: String,

    /// Password to type into the login form
    #[arg(long, default_value = DEMO_PASSWORD)]
    password: String,

    /// Tick the auto-login checkbox before logging in
    #[arg(long)]
    auto_login: bool,

    /// Fetch ordering (last_write_wins, discard_stale)
    #[arg(long, value_name = "POLICY")]
    ordering: Option<FetchOrdering>,

    /// Log filter, overriding the config file and environment
    #[arg(short = 'l', long, value_name = "FILTER")]
    log_level: Option<String>,
}

/// Initialize logging with the resolved filter
///
/// `RUST_LOG` still wins when it is set.
fn init_logging(filter: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}

fn resolve_config(args: &Args) -> Result<ClientConfig> {
    let path = args.config.clone().or_else(default_config_path);
    let mut config = load_config_from_path(path).context("Failed to load configuration")?;

    let mut overrides = ConfigOverrides::new();
    if args.auto_login {
        overrides = overrides.with_auto_login_default(true);
    }
    if let Some(ordering) = args.ordering {
        overrides = overrides.with_fetch_ordering(ordering);
    }
    if let Some(filter) = &args.log_level {
        overrides = overrides.with_log_filter(filter.clone());
    }
    overrides.apply(&mut config);
    Ok(config)
}

/// Print one published state as a JSON line
fn emit(step: &str, state: &impl Serialize) -> Result<()> {
    let line = serde_json::json!({ "step": step, "state": state });
    println!("{}", serde_json::to_string(&line)?);
    Ok(())
}

fn demo_posts() -> Vec<Post> {
    vec![
        Post::new(3, "Card fees this quarter", "Anyone else see a jump?", 2, "Cafe")
            .with_likes(5, false),
        Post::new(2, "Night shift staffing", "How are you covering weekends?", 3, "Retail"),
        Post::new(1, "Flour supplier recommendations", "Looking for a new one", 4, "Bakery")
            .with_likes(2, false),
    ]
}

/// Login screen; returns whether the session ended authenticated
async fn run_login(
    args: &Args,
    config: &ClientConfig,
    network: Arc<StaticNetwork>,
) -> Result<bool> {
    let auth = Arc::new(MemoryAuth::with_account(
        DEMO_PHONE.replace('-', ""),
        DEMO_PASSWORD,
    ));
    let scope = ScreenScope::new(SessionMachine::new(
        auth,
        Arc::new(MemoryCredentialStore::new()),
        network,
        &config.session,
    ));
    let session = scope.machine();
    session.set_on_login_success(|_| info!("Navigating to the board"));

    let outcome = session.check_auto_login().await;
    emit("check_auto_login", &session.state())?;
    if outcome == LoginOutcome::Succeeded {
        return Ok(true);
    }

    session.update_phone_number(&args.phone);
    session.update_password(&args.password);
    // The store had nothing saved, so the checkbox starts from config again
    session.update_auto_login(config.session.auto_login_default);
    emit("fill_form", &session.state())?;

    let form = session.state();
    let outcome = scope
        .launch(move |m| async move { m.login(&form.phone_number, &form.password).await })
        .await
        .context("Login task was cancelled")?;
    emit("login", &session.state())?;

    match outcome {
        LoginOutcome::Succeeded => Ok(true),
        other => {
            warn!(outcome = ?other, "Login did not succeed");
            Ok(false)
        }
    }
}

/// Board screen: list, tag and post, like, report
async fn run_board(config: &ClientConfig) -> Result<()> {
    let scope = ScreenScope::new(PostSynchronizer::new(
        Arc::new(MemoryBoard::with_posts(demo_posts())),
        &config.posts,
    ));
    let board = scope.machine();

    board.load_posts().await;
    emit("load_posts", &board.state())?;

    let picker = TagSelection::new();
    picker.toggle_tag("Info");
    picker.toggle_tag("Questions/Advice");
    emit("select_tags", &picker.state())?;

    board
        .save_post("Hello from headless", "First post", DEMO_USER, &picker.industry())
        .await;
    picker.clear_selection();
    emit("save_post", &board.state())?;
    board.clear_status_message();

    let Some(first) = board.state().posts.first().map(|p| p.id) else {
        return Ok(());
    };
    board.load_post_by_id(first).await;
    emit("load_post", &board.state())?;

    let like = board.toggle_like(first, DEMO_USER).await;
    emit("toggle_like", &like)?;

    board.report_post(first, DEMO_USER, "spam").await;
    emit("report_post", &board.state())?;
    board.report_post(first, DEMO_USER, "spam").await;
    emit("report_post_again", &board.state())?;
    board.clear_report_result();

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = resolve_config(&args)?;

    init_logging(&config.log_filter);
    info!(version = env!("CARGO_PKG_VERSION"), "Blindsjn headless starting");
    info!(
        source = %config.source(),
        ordering = ?config.posts.fetch_ordering,
        "Configuration resolved"
    );

    let network = Arc::new(if args.offline {
        StaticNetwork::offline()
    } else {
        StaticNetwork::online()
    });

    if run_login(&args, &config, network).await? {
        run_board(&config).await?;
    }

    info!("Scripted session finished");
    Ok(())
}
