//! weft server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), opens the
//! SQLite journal, replays it, and serves the ledger over HTTP.
//!
//! # Password hash generation
//!
//! To generate the argon2 PHC string for a `[[principals]]` entry:
//!
//! ```
//! cargo run -p weft-server -- --hash-password
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
use clap::Parser;
use rand_core::OsRng;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use weft_core::{primitives::SystemClock, store::LedgerStore};
use weft_server::{AppState, ServerConfig, auth::AuthConfig};
use weft_store_sqlite::SqliteStore;

#[derive(Parser)]
#[command(author, version, about = "weft traceability ledger server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Print the argon2 hash for a password entered on stdin and exit.
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
    let password = read_password()?;
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .map_err(|e| anyhow::anyhow!("argon2 error: {e}"))?
      .to_string();
    println!("{hash}");
    return Ok(());
  }

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("WEFT"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  let store_path = expand_tilde(&server_cfg.store_path);

  let store = SqliteStore::open(&store_path, &server_cfg.deployer, &server_cfg.ledger)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  // Never hand the ledger a time earlier than its last commit.
  let clock = match store.last_commit().await {
    Some(last) => SystemClock::starting_at(last),
    None => SystemClock::new(),
  };

  let auth = AuthConfig::new(server_cfg.principals.clone());
  if !auth.knows(&server_cfg.deployer) {
    tracing::warn!(
      deployer = %server_cfg.deployer,
      "deployer has no configured credentials; owner-gated operations are unreachable"
    );
  }

  let state = AppState {
    store: Arc::new(store),
    auth:  Arc::new(auth),
    clock: Arc::new(clock),
  };

  let app = weft_server::router(state);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Read a password from stdin.
fn read_password() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  print!("Password: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  io::stdin().lock().read_line(&mut line)?;
  Ok(line.trim_end_matches(['\n', '\r']).to_string())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
