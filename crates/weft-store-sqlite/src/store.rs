//! [`SqliteStore`] — the SQLite implementation of [`LedgerStore`].
//!
//! The database holds the deployment (`genesis`) and an append-only,
//! hash-chained journal of every committed command. Registry state lives in a
//! [`Ledger`] rebuilt by replaying the journal on open; all rules are enforced
//! by the ledger, never in SQL.

use std::{path::Path, sync::Arc};

use rusqlite::OptionalExtension as _;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use weft_core::{
  command::{Command, Outcome},
  ledger::{Ledger, LedgerConfig},
  primitives::{Clock, Context, Principal},
  store::LedgerStore,
};

use crate::{
  Error, Result,
  encode::{JOURNAL_COLUMNS, RawGenesis, RawJournalEntry, encode_u64},
  journal::{self, ChainHead, JournalEntry, JournalReport},
  schema::SCHEMA,
};

// ─── State ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct Genesis {
  deployer: Principal,
  config:   LedgerConfig,
  hash:     String,
}

#[derive(Debug)]
struct State {
  ledger:   Ledger,
  head:     ChainHead,
  genesis:  Genesis,
  poisoned: bool,
}

/// Re-apply `rows` in order on top of a fresh deployment, verifying the
/// chain as it goes.
fn replay(genesis: &Genesis, rows: Vec<RawJournalEntry>) -> Result<(Ledger, ChainHead)> {
  let mut ledger = Ledger::deploy(&genesis.deployer, &genesis.config);
  let mut head = ChainHead::genesis(genesis.hash.clone());

  for raw in rows {
    let next = head.advance(&raw)?;
    let entry = raw.decode()?;
    let ctx = Context::new(entry.caller, entry.at);
    ledger
      .apply(&ctx, entry.command)
      .map_err(|source| Error::Replay { seq: next.seq, source })?;
    head = next;
  }

  Ok((ledger, head))
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A weft ledger backed by a single SQLite file.
///
/// Cloning is cheap — the connection and the replayed state are shared.
#[derive(Clone)]
pub struct SqliteStore {
  conn:  tokio_rusqlite::Connection,
  state: Arc<RwLock<State>>,
}

impl SqliteStore {
  /// Open (or create) a store at `path`.
  ///
  /// On first open the deployment is recorded from `deployer` and `config`.
  /// On later opens the recorded deployment wins and the journal is replayed.
  pub async fn open(
    path: impl AsRef<Path>,
    deployer: &Principal,
    config: &LedgerConfig,
  ) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    Self::init(conn, deployer, config).await
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory(deployer: &Principal, config: &LedgerConfig) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    Self::init(conn, deployer, config).await
  }

  async fn init(
    conn: tokio_rusqlite::Connection,
    deployer: &Principal,
    config: &LedgerConfig,
  ) -> Result<Self> {
    conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;

    let genesis = Self::load_genesis(&conn, deployer, config).await?;
    let rows = Self::load_rows(&conn, 0, None).await?;
    let (ledger, head) = replay(&genesis, rows)?;
    info!(entries = head.seq, deployer = %genesis.deployer, "journal replayed");

    let state = State { ledger, head, genesis, poisoned: false };
    Ok(Self { conn, state: Arc::new(RwLock::new(state)) })
  }

  async fn read_genesis(conn: &tokio_rusqlite::Connection) -> Result<Option<RawGenesis>> {
    let raw = conn
      .call(|conn| {
        let raw = conn
          .query_row(
            "SELECT deployer, config_json, hash FROM genesis WHERE id = 1",
            [],
            |r| {
              Ok(RawGenesis {
                deployer:    r.get(0)?,
                config_json: r.get(1)?,
                hash:        r.get(2)?,
              })
            },
          )
          .optional()?;
        Ok(raw)
      })
      .await?;
    Ok(raw)
  }

  /// Read the recorded deployment, recording `deployer` and `config` first if
  /// there is none.
  async fn load_genesis(
    conn: &tokio_rusqlite::Connection,
    deployer: &Principal,
    config: &LedgerConfig,
  ) -> Result<Genesis> {
    let config_json = serde_json::to_string(config)?;
    let candidate = RawGenesis {
      deployer: deployer.as_str().to_owned(),
      hash: journal::genesis_hash(deployer.as_str(), &config_json),
      config_json,
    };

    let stored = match Self::read_genesis(conn).await? {
      Some(stored) => stored,
      None => {
        let row = candidate.clone();
        conn
          .call(move |conn| {
            conn.execute(
              "INSERT INTO genesis (id, deployer, config_json, hash) VALUES (1, ?1, ?2, ?3)",
              rusqlite::params![row.deployer, row.config_json, row.hash],
            )?;
            Ok(())
          })
          .await?;
        candidate
      }
    };

    if journal::genesis_hash(&stored.deployer, &stored.config_json) != stored.hash {
      return Err(Error::TamperDetected { seq: 0 });
    }

    let stored_config = stored.decode_config()?;
    if stored.deployer != deployer.as_str() || stored_config != *config {
      warn!(
        recorded_deployer = %stored.deployer,
        "configured deployment differs from the recorded one; using the recorded deployment"
      );
    }

    Ok(Genesis {
      deployer: Principal::new(stored.deployer),
      config:   stored_config,
      hash:     stored.hash,
    })
  }

  /// Rows with `seq > after`, in order, at most `limit` of them.
  async fn load_rows(
    conn: &tokio_rusqlite::Connection,
    after: u64,
    limit: Option<usize>,
  ) -> Result<Vec<RawJournalEntry>> {
    let after = encode_u64(after)?;
    // SQLite treats a negative LIMIT as unbounded.
    let limit = match limit {
      Some(n) => encode_u64(n as u64)?,
      None => -1,
    };

    let rows = conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {JOURNAL_COLUMNS} FROM journal WHERE seq > ?1 ORDER BY seq LIMIT ?2"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![after, limit], RawJournalEntry::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(rows)
  }

  async fn append(&self, raw: RawJournalEntry) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute(
          &format!("INSERT INTO journal ({JOURNAL_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"),
          rusqlite::params![
            raw.seq,
            raw.caller,
            raw.at,
            raw.operation,
            raw.command_json,
            raw.prev_hash,
            raw.entry_hash,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Journal access ────────────────────────────────────────────────────

  /// The current tip of the journal.
  pub async fn head(&self) -> ChainHead { self.state.read().await.head.clone() }

  /// Journal entries with `seq > after`, oldest first, at most `limit`.
  pub async fn journal(&self, after: u64, limit: usize) -> Result<Vec<JournalEntry>> {
    Self::load_rows(&self.conn, after, Some(limit))
      .await?
      .into_iter()
      .map(RawJournalEntry::decode)
      .collect()
  }

  /// Re-read the whole journal from disk and check every link of the chain,
  /// including that the stored tip matches the state being served.
  pub async fn verify_journal(&self) -> Result<JournalReport> {
    let state = self.state.read().await;

    let genesis = Self::read_genesis(&self.conn)
      .await?
      .ok_or(Error::TamperDetected { seq: 0 })?;
    if genesis.hash != state.genesis.hash
      || journal::genesis_hash(&genesis.deployer, &genesis.config_json) != genesis.hash
    {
      return Err(Error::TamperDetected { seq: 0 });
    }

    let mut head = ChainHead::genesis(genesis.hash.clone());
    for raw in Self::load_rows(&self.conn, 0, None).await? {
      head = head.advance(&raw)?;
    }
    if head != state.head {
      return Err(Error::TamperDetected { seq: head.seq.min(state.head.seq) + 1 });
    }

    Ok(JournalReport { entries: head.seq, genesis_hash: genesis.hash, head })
  }
}

impl LedgerStore for SqliteStore {
  type Error = Error;

  async fn commit<C: Clock + 'static>(
    &self,
    caller: Principal,
    clock: C,
    command: Command,
  ) -> Result<Outcome> {
    let mut state = self.state.write().await;
    if state.poisoned {
      return Err(Error::Poisoned);
    }

    let ctx = Context::at(caller, &clock);
    let seq = state.head.seq + 1;
    let operation = command.operation().to_string();
    let command_json = serde_json::to_string(&command)?;
    let (seq_sql, at_sql) = (encode_u64(seq)?, encode_u64(ctx.now.as_secs())?);

    let outcome = state.ledger.apply(&ctx, command)?;

    let entry_hash = journal::entry_hash(
      seq,
      ctx.caller.as_str(),
      ctx.now.as_secs(),
      &operation,
      &command_json,
      &state.head.hash,
    );
    let raw = RawJournalEntry {
      seq:          seq_sql,
      caller:       ctx.caller.as_str().to_owned(),
      at:           at_sql,
      operation:    operation.clone(),
      command_json,
      prev_hash:    state.head.hash.clone(),
      entry_hash:   entry_hash.clone(),
    };

    match self.append(raw).await {
      Ok(()) => {
        state.head = ChainHead { seq, hash: entry_hash };
        info!(seq, %operation, caller = %ctx.caller, "journal entry appended");
        Ok(outcome)
      }
      Err(err) => {
        // The ledger already holds the unjournaled effect; discard it.
        error!(%err, seq, "journal append failed; rebuilding ledger from journal");
        let genesis = state.genesis.clone();
        let rebuilt = Self::load_rows(&self.conn, 0, None)
          .await
          .and_then(|rows| replay(&genesis, rows));
        match rebuilt {
          Ok((ledger, head)) => {
            state.ledger = ledger;
            state.head = head;
          }
          Err(rebuild_err) => {
            error!(%rebuild_err, "ledger rebuild failed; refusing further writes");
            state.poisoned = true;
          }
        }
        Err(err)
      }
    }
  }

  async fn view<R, F>(&self, f: F) -> R
  where
    F: FnOnce(&Ledger) -> R + Send + 'static,
    R: Send + 'static,
  {
    let state = self.state.read().await;
    f(&state.ledger)
  }
}
