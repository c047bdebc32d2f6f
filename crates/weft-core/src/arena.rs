//! Entity arenas: a counter and the store it issues ids for, kept together so
//! an id is only ever consumed by a successful insert.

use std::collections::BTreeMap;

use crate::{
  Error, Result,
  kind::EntityKind,
  primitives::{EntityId, Record},
};

#[derive(Debug, Clone)]
pub struct Arena<T> {
  kind:    EntityKind,
  last:    u64,
  entries: BTreeMap<EntityId, T>,
}

impl<T> Arena<T> {
  pub fn new(kind: EntityKind) -> Self {
    Self { kind, last: 0, entries: BTreeMap::new() }
  }

  pub fn kind(&self) -> EntityKind { self.kind }

  /// Allocate the next id and store `value` under it.
  pub fn insert(&mut self, value: T) -> Result<EntityId> {
    let next = self
      .last
      .checked_add(1)
      .ok_or(Error::IdentifierSpaceExhausted(self.kind))?;
    let id = EntityId(next);
    self.last = next;
    self.entries.insert(id, value);
    Ok(id)
  }

  pub fn get(&self, id: EntityId) -> Option<&T> { self.entries.get(&id) }

  /// Like [`get`](Self::get), but absent ids become [`Error::NotFound`].
  pub fn require(&self, id: EntityId) -> Result<&T> {
    self.entries.get(&id).ok_or_else(|| Error::not_found(self.kind, id))
  }

  /// Mutable access for the one-way lifecycle flips; never exposed publicly.
  pub(crate) fn require_mut(&mut self, id: EntityId) -> Result<&mut T> {
    let kind = self.kind;
    self.entries.get_mut(&id).ok_or_else(|| Error::not_found(kind, id))
  }

  pub fn contains(&self, id: EntityId) -> bool { self.entries.contains_key(&id) }

  pub fn len(&self) -> usize { self.entries.len() }

  pub fn is_empty(&self) -> bool { self.entries.is_empty() }

  /// The most recently issued id, if any.
  pub fn last_id(&self) -> Option<EntityId> { (self.last > 0).then_some(EntityId(self.last)) }

  /// Entries in id order.
  pub fn iter(&self) -> impl Iterator<Item = (EntityId, &T)> {
    self.entries.iter().map(|(id, v)| (*id, v))
  }

  /// Cloned snapshots of every entry matching `pred`, in id order.
  pub fn select(&self, mut pred: impl FnMut(&T) -> bool) -> Vec<Record<T>>
  where
    T: Clone,
  {
    self
      .iter()
      .filter(|(_, v)| pred(v))
      .map(|(id, v)| Record::new(id, v.clone()))
      .collect()
  }
}
