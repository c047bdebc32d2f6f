//! Material sourcing — the leaf registry. Raw materials and the batches
//! harvested from them.

use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  access::{AccessControl, AccessPolicy, Operation},
  arena::Arena,
  directory::BatchDirectory,
  kind::EntityKind,
  primitives::{Context, EntityId, Principal, Record, Timestamp},
};

// ─── Entities ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Material {
  pub name:              String,
  pub origin:            String,
  pub harvest_date:      Timestamp,
  pub supplier:          Principal,
  pub organic:           bool,
  pub registered_by:     Principal,
  pub registration_date: Timestamp,
}

/// Caller-supplied fields of a [`Material`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMaterial {
  pub name:         String,
  pub origin:       String,
  pub harvest_date: Timestamp,
  pub supplier:     Principal,
  pub organic:      bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Batch {
  pub material_id:   EntityId,
  pub quantity:      u64,
  pub quality_grade: String,
  pub timestamp:     Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBatch {
  pub material_id:   EntityId,
  /// Must be non-zero.
  pub quantity:      u64,
  pub quality_grade: String,
}

// ─── Registry ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct MaterialSourcingRegistry {
  access:    AccessControl,
  materials: Arena<Material>,
  batches:   Arena<Batch>,
}

impl MaterialSourcingRegistry {
  pub fn new(owner: Principal, policy: AccessPolicy) -> Self {
    Self {
      access:    AccessControl::new(owner, policy),
      materials: Arena::new(EntityKind::Material),
      batches:   Arena::new(EntityKind::Batch),
    }
  }

  pub fn access(&self) -> &AccessControl { &self.access }

  pub fn set_contract_owner(&mut self, ctx: &Context, new_owner: Principal) -> Result<()> {
    self.access.set_owner(&ctx.caller, new_owner)
  }

  pub fn register_material(&mut self, ctx: &Context, input: NewMaterial) -> Result<EntityId> {
    self.access.authorize(&ctx.caller, Operation::RegisterMaterial)?;

    self.materials.insert(Material {
      name:              input.name,
      origin:            input.origin,
      harvest_date:      input.harvest_date,
      supplier:          input.supplier,
      organic:           input.organic,
      registered_by:     ctx.caller.clone(),
      registration_date: ctx.now,
    })
  }

  pub fn register_batch(&mut self, ctx: &Context, input: NewBatch) -> Result<EntityId> {
    self.access.authorize(&ctx.caller, Operation::RegisterBatch)?;
    self.materials.require(input.material_id)?;
    if input.quantity == 0 {
      return Err(Error::InvalidRange("batch quantity must be greater than zero".into()));
    }

    self.batches.insert(Batch {
      material_id:   input.material_id,
      quantity:      input.quantity,
      quality_grade: input.quality_grade,
      timestamp:     ctx.now,
    })
  }

  pub fn get_material(&self, id: EntityId) -> Option<&Material> { self.materials.get(id) }

  pub fn get_batch(&self, id: EntityId) -> Option<&Batch> { self.batches.get(id) }

  pub fn batches_of_material(&self, material_id: EntityId) -> Vec<Record<Batch>> {
    self.batches.select(|b| b.material_id == material_id)
  }

  pub fn material_count(&self) -> usize { self.materials.len() }

  pub fn batch_count(&self) -> usize { self.batches.len() }
}

impl BatchDirectory for MaterialSourcingRegistry {
  fn batch_exists(&self, id: EntityId) -> bool { self.batches.contains(id) }
}

#[cfg(test)]
mod tests {
  use super::*;

  const NOW: Timestamp = Timestamp::from_secs(1_617_984_000);

  fn owner() -> Context { Context::new("ST1PQHQKV0RJXZFY1DGX8MNSNYVE3VGZJSRTPGZGM", NOW) }

  fn registry() -> MaterialSourcingRegistry {
    MaterialSourcingRegistry::new(owner().caller, AccessPolicy::default())
  }

  fn cotton() -> NewMaterial {
    NewMaterial {
      name:         "Organic Cotton".into(),
      origin:       "India".into(),
      harvest_date: Timestamp::from_secs(1_617_900_000),
      supplier:     owner().caller,
      organic:      true,
    }
  }

  fn batch_of(material_id: u64, quantity: u64) -> NewBatch {
    NewBatch {
      material_id: EntityId(material_id),
      quantity,
      quality_grade: "A".into(),
    }
  }

  #[test]
  fn register_material_round_trips() {
    let mut reg = registry();
    let id = reg.register_material(&owner(), cotton()).unwrap();
    assert_eq!(id, EntityId(1));

    let material = reg.get_material(id).unwrap();
    assert_eq!(material.name, "Organic Cotton");
    assert_eq!(material.origin, "India");
    assert_eq!(material.harvest_date, Timestamp::from_secs(1_617_900_000));
    assert!(material.organic);
    assert_eq!(material.registered_by, owner().caller);
    assert_eq!(material.registration_date, NOW);
  }

  #[test]
  fn register_batch_references_material() {
    let mut reg = registry();
    reg.register_material(&owner(), cotton()).unwrap();

    let id = reg.register_batch(&owner(), batch_of(1, 1000)).unwrap();
    assert_eq!(id, EntityId(1));

    let batch = reg.get_batch(id).unwrap();
    assert_eq!(batch.material_id, EntityId(1));
    assert_eq!(batch.quantity, 1000);
    assert_eq!(batch.quality_grade, "A");
    assert_eq!(batch.timestamp, NOW);
    assert!(reg.batch_exists(id));
  }

  #[test]
  fn batch_for_unknown_material_is_rejected() {
    let mut reg = registry();
    reg.register_material(&owner(), cotton()).unwrap();

    let err = reg.register_batch(&owner(), batch_of(99, 1000)).unwrap_err();
    assert_eq!(err, Error::NotFound { kind: EntityKind::Material, id: EntityId(99) });
    assert_eq!(reg.batch_count(), 0);
  }

  #[test]
  fn zero_quantity_is_out_of_range() {
    let mut reg = registry();
    reg.register_material(&owner(), cotton()).unwrap();

    let err = reg.register_batch(&owner(), batch_of(1, 0)).unwrap_err();
    assert!(matches!(err, Error::InvalidRange(_)));
    assert_eq!(reg.batch_count(), 0);
  }

  #[test]
  fn non_owner_cannot_register() {
    let mut reg = registry();
    let stranger = Context::new("stranger", NOW);

    let err = reg.register_material(&stranger, cotton()).unwrap_err();
    assert!(matches!(err, Error::Unauthorized { operation: Operation::RegisterMaterial, .. }));
    assert_eq!(reg.material_count(), 0);
  }

  #[test]
  fn ids_are_issued_per_store() {
    let mut reg = registry();
    let m1 = reg.register_material(&owner(), cotton()).unwrap();
    let b1 = reg.register_batch(&owner(), batch_of(1, 10)).unwrap();
    let m2 = reg.register_material(&owner(), cotton()).unwrap();
    let b2 = reg.register_batch(&owner(), batch_of(2, 20)).unwrap();
    assert_eq!((m1, m2), (EntityId(1), EntityId(2)));
    assert_eq!((b1, b2), (EntityId(1), EntityId(2)));
  }

  #[test]
  fn failed_insert_does_not_consume_an_id() {
    let mut reg = registry();
    reg.register_material(&owner(), cotton()).unwrap();
    reg.register_batch(&owner(), batch_of(7, 10)).unwrap_err();
    assert_eq!(reg.register_batch(&owner(), batch_of(1, 10)).unwrap(), EntityId(1));
  }

  #[test]
  fn batches_are_listed_per_material() {
    let mut reg = registry();
    reg.register_material(&owner(), cotton()).unwrap();
    reg.register_material(&owner(), cotton()).unwrap();
    reg.register_batch(&owner(), batch_of(1, 10)).unwrap();
    reg.register_batch(&owner(), batch_of(2, 20)).unwrap();
    reg.register_batch(&owner(), batch_of(1, 30)).unwrap();

    let ids: Vec<_> = reg.batches_of_material(EntityId(1)).into_iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![EntityId(1), EntityId(3)]);
  }
}
