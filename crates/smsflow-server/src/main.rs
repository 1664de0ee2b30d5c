//! `server`: the smsflow webhook binary.
//!
//! Point the SMS provider's inbound webhook at `/sms/inbound` and its
//! fallback URL at `/sms/failed`. Settings come from a TOML file
//! (`--config`, default `config.toml`) overridden by `SMSFLOW_*` variables:
//!
//! ```toml
//! host       = "0.0.0.0"
//! port       = 5000
//! store_path = "~/.local/share/smsflow/smsflow.db"
//! # Both or neither:
//! # auth_username      = "twilio"
//! # auth_password_hash = "$argon2id$v=19$..."
//! ```
//!
//! `server --hash-password` reads a password on stdin and prints the value
//! for `auth_password_hash`.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
use clap::Parser;
use rand_core::OsRng;
use smsflow_core::engine::{Phase, StepEngine};
use smsflow_server::{AppState, ServerConfig, locks::SenderLocks};
use smsflow_store_sqlite::SqliteStore;
use smsflow_templates::Templates;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "SMS onboarding and resource-menu webhook")]
struct Cli {
  /// TOML settings file; missing is fine when `SMSFLOW_*` covers everything.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Hash a password from stdin for `auth_password_hash`, then exit.
  #[arg(long)]
  hash_password: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  if cli.hash_password {
    println!("{}", hash_password(&read_password_from_stdin()?)?);
    return Ok(());
  }

  let settings = load_settings(&cli.config)?;
  let state = build_state(&settings).await?;
  let address = format!("{}:{}", settings.host, settings.port);

  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;
  tracing::info!("answering webhooks on http://{address}");

  axum::serve(listener, smsflow_server::router(state))
    .await
    .context("server error")
}

fn load_settings(path: &Path) -> anyhow::Result<ServerConfig> {
  let settings: ServerConfig = config::Config::builder()
    .add_source(config::File::from(path).required(false))
    .add_source(config::Environment::with_prefix("SMSFLOW"))
    .build()
    .and_then(config::Config::try_deserialize)
    .with_context(|| format!("invalid settings (file {path:?}, SMSFLOW_* env)"))?;

  if settings.auth_username.is_some() != settings.auth_password_hash.is_some() {
    anyhow::bail!("auth_username and auth_password_hash must be set together");
  }
  Ok(settings)
}

/// Open the store and engine, and report anything odd about the tables.
async fn build_state(settings: &ServerConfig) -> anyhow::Result<AppState<SqliteStore>> {
  let store_path = expand_tilde(&settings.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let engine = StepEngine::builtin(Templates::builtin())
    .context("step tables reference unknown templates")?;

  for phase in [Phase::Onboarding, Phase::Chat] {
    for flagged in engine.table(phase).case_variant_keys() {
      tracing::warn!(
        table = %flagged.table,
        step  = flagged.step,
        keys  = ?flagged.keys,
        "transition keys differ only by case; replies are matched exactly"
      );
    }
  }

  let auth = settings.auth().map(Arc::new);
  if auth.is_none() {
    tracing::warn!("no auth configured; /sms/* routes are open");
  }

  Ok(AppState {
    store:  Arc::new(store),
    engine: Arc::new(engine),
    auth,
    locks:  SenderLocks::new(),
  })
}

fn hash_password(password: &str) -> anyhow::Result<String> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|hash| hash.to_string())
    .map_err(|e| anyhow::anyhow!("argon2 error: {e}"))
}

/// One line from stdin, without its line ending. Input is echoed.
fn read_password_from_stdin() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  eprint!("Password: ");
  io::stderr().flush().ok();
  let mut line = String::new();
  io::stdin().lock().read_line(&mut line)?;
  Ok(line.trim_end_matches(['\r', '\n']).to_owned())
}

/// `~/rest` → `$HOME/rest`; anything else unchanged.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
