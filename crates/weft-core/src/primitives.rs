//! Identity, time and identifier primitives shared by every registry.

use std::{
  fmt,
  sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
  },
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ─── Identifiers ─────────────────────────────────────────────────────────────

/// A registry-scoped identifier. The first id issued by any arena is `1`.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct EntityId(pub u64);

impl EntityId {
  pub fn get(self) -> u64 { self.0 }
}

impl From<u64> for EntityId {
  fn from(raw: u64) -> Self { Self(raw) }
}

impl fmt::Display for EntityId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.0.fmt(f) }
}

/// The identity attributed to the originator of an operation.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Principal(String);

impl Principal {
  pub fn new(name: impl Into<String>) -> Self { Self(name.into()) }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for Principal {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

impl From<&str> for Principal {
  fn from(s: &str) -> Self { Self::new(s) }
}

// ─── Time ────────────────────────────────────────────────────────────────────

/// Seconds since the unix epoch, as supplied by the execution context.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Timestamp(pub u64);

impl Timestamp {
  pub const fn from_secs(secs: u64) -> Self { Self(secs) }

  pub const fn as_secs(self) -> u64 { self.0 }

  /// Pre-epoch instants clamp to zero.
  pub fn from_datetime(dt: DateTime<Utc>) -> Self {
    Self(u64::try_from(dt.timestamp()).unwrap_or(0))
  }

  pub fn to_datetime(self) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(i64::try_from(self.0).ok()?, 0)
  }

  pub fn saturating_add_secs(self, secs: u64) -> Self {
    Self(self.0.saturating_add(secs))
  }
}

impl fmt::Display for Timestamp {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.0.fmt(f) }
}

/// Source of the current time for the execution context.
pub trait Clock: Send + Sync {
  fn now(&self) -> Timestamp;
}

/// A fixed instant.
impl Clock for Timestamp {
  fn now(&self) -> Timestamp { *self }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
  fn now(&self) -> Timestamp { (**self).now() }
}

/// Wall-clock time that never runs backwards within the process.
#[derive(Debug, Default)]
pub struct SystemClock {
  floor: AtomicU64,
}

impl SystemClock {
  pub fn new() -> Self { Self::default() }

  /// A clock that never reports a time earlier than `floor`, e.g. the last
  /// commit recorded in a persisted ledger.
  pub fn starting_at(floor: Timestamp) -> Self {
    Self { floor: AtomicU64::new(floor.as_secs()) }
  }
}

impl Clock for SystemClock {
  fn now(&self) -> Timestamp {
    let wall = Timestamp::from_datetime(Utc::now()).as_secs();
    let prev = self.floor.fetch_max(wall, Ordering::SeqCst);
    Timestamp(prev.max(wall))
  }
}

/// A clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
  now: AtomicU64,
}

impl ManualClock {
  pub fn new(start: Timestamp) -> Self {
    Self { now: AtomicU64::new(start.as_secs()) }
  }

  pub fn set(&self, at: Timestamp) { self.now.store(at.as_secs(), Ordering::SeqCst); }

  pub fn advance(&self, secs: u64) { self.now.fetch_add(secs, Ordering::SeqCst); }
}

impl Clock for ManualClock {
  fn now(&self) -> Timestamp { Timestamp(self.now.load(Ordering::SeqCst)) }
}

// ─── Execution context ───────────────────────────────────────────────────────

/// Caller identity and commit time, bound once per mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Context {
  pub caller: Principal,
  pub now:    Timestamp,
}

impl Context {
  pub fn new(caller: impl Into<Principal>, now: Timestamp) -> Self {
    Self { caller: caller.into(), now }
  }

  pub fn at(caller: Principal, clock: &dyn Clock) -> Self {
    Self { caller, now: clock.now() }
  }
}

// ─── Snapshots ───────────────────────────────────────────────────────────────

/// An entity snapshot paired with the id it was issued.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record<T> {
  pub id:     EntityId,
  #[serde(flatten)]
  pub entity: T,
}

impl<T> Record<T> {
  pub fn new(id: EntityId, entity: T) -> Self { Self { id, entity } }
}
