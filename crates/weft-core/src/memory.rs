//! [`MemoryStore`] — a volatile [`LedgerStore`], useful for tests and for
//! embedding the ledger without persistence.

use std::sync::{PoisonError, RwLock};

use crate::{
  Result,
  command::{Command, Outcome},
  ledger::{Ledger, LedgerConfig},
  primitives::{Clock, Context, Principal},
  store::LedgerStore,
};

#[derive(Debug)]
pub struct MemoryStore {
  ledger: RwLock<Ledger>,
}

impl MemoryStore {
  pub fn deploy(deployer: &Principal, config: &LedgerConfig) -> Self {
    Self::from_ledger(Ledger::deploy(deployer, config))
  }

  pub fn from_ledger(ledger: Ledger) -> Self { Self { ledger: RwLock::new(ledger) } }
}

impl LedgerStore for MemoryStore {
  type Error = crate::Error;

  async fn commit<C: Clock + 'static>(
    &self,
    caller: Principal,
    clock: C,
    command: Command,
  ) -> Result<Outcome> {
    let mut ledger = self.ledger.write().unwrap_or_else(PoisonError::into_inner);
    let ctx = Context::at(caller, &clock);
    ledger.apply(&ctx, command)
  }

  async fn view<R, F>(&self, f: F) -> R
  where
    F: FnOnce(&Ledger) -> R + Send + 'static,
    R: Send + 'static,
  {
    let ledger = self.ledger.read().unwrap_or_else(PoisonError::into_inner);
    f(&ledger)
  }
}
