//! Certification — standards, products, and the certifications that bind a
//! product to a standard until they expire or are revoked.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  access::{AccessControl, AccessPolicy, Operation},
  arena::Arena,
  directory::{BatchDirectory, ProductDirectory},
  kind::EntityKind,
  lifecycle::{CertificationStatus, Transition},
  primitives::{Context, EntityId, Principal, Record, Timestamp},
};

// ─── Entities ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Standard {
  pub name:              String,
  pub description:       String,
  pub criteria:          Vec<String>,
  pub issuing_body:      String,
  pub registered_by:     Principal,
  pub registration_date: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewStandard {
  pub name:         String,
  pub description:  String,
  #[serde(default)]
  pub criteria:     Vec<String>,
  pub issuing_body: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
  pub name:              String,
  pub description:       String,
  pub manufacturer:      Principal,
  /// Grows only through [`CertificationRegistry::append_product_batches`].
  pub batch_ids:         BTreeSet<EntityId>,
  pub registered_by:     Principal,
  pub registration_date: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
  pub name:         String,
  pub description:  String,
  pub manufacturer: Principal,
  #[serde(default)]
  pub batch_ids:    BTreeSet<EntityId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certification {
  pub product_id:          EntityId,
  pub standard_id:         EntityId,
  pub issue_date:          Timestamp,
  pub expiry_date:         Timestamp,
  pub certifier:           Principal,
  /// Opaque reference to the evidence, e.g. an `ipfs://` URI.
  pub certification_proof: String,
  pub active:              bool,
}

impl Certification {
  /// Revocation dominates; otherwise valid strictly before `expiry_date`.
  pub fn status_at(&self, at: Timestamp) -> CertificationStatus {
    if !self.active {
      CertificationStatus::Revoked
    } else if at >= self.expiry_date {
      CertificationStatus::Expired
    } else {
      CertificationStatus::Active
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCertification {
  pub product_id:          EntityId,
  pub standard_id:         EntityId,
  pub expiry_date:         Timestamp,
  pub certification_proof: String,
}

// ─── Registry ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct CertificationRegistry {
  access:         AccessControl,
  standards:      Arena<Standard>,
  products:       Arena<Product>,
  certifications: Arena<Certification>,
}

impl CertificationRegistry {
  pub fn new(owner: Principal, policy: AccessPolicy) -> Self {
    Self {
      access:         AccessControl::new(owner, policy),
      standards:      Arena::new(EntityKind::Standard),
      products:       Arena::new(EntityKind::Product),
      certifications: Arena::new(EntityKind::Certification),
    }
  }

  pub fn access(&self) -> &AccessControl { &self.access }

  pub fn set_contract_owner(&mut self, ctx: &Context, new_owner: Principal) -> Result<()> {
    self.access.set_owner(&ctx.caller, new_owner)
  }

  pub fn register_standard(&mut self, ctx: &Context, input: NewStandard) -> Result<EntityId> {
    self.access.authorize(&ctx.caller, Operation::RegisterStandard)?;

    self.standards.insert(Standard {
      name:              input.name,
      description:       input.description,
      criteria:          input.criteria,
      issuing_body:      input.issuing_body,
      registered_by:     ctx.caller.clone(),
      registration_date: ctx.now,
    })
  }

  /// Register a product made from `input.batch_ids`, every one of which must
  /// already exist in `batches`.
  pub fn register_product(
    &mut self,
    ctx: &Context,
    batches: &impl BatchDirectory,
    input: NewProduct,
  ) -> Result<EntityId> {
    self.access.authorize(&ctx.caller, Operation::RegisterProduct)?;
    require_batches(batches, &input.batch_ids)?;

    self.products.insert(Product {
      name:              input.name,
      description:       input.description,
      manufacturer:      input.manufacturer,
      batch_ids:         input.batch_ids,
      registered_by:     ctx.caller.clone(),
      registration_date: ctx.now,
    })
  }

  /// Add batches to an existing product. Ids already present are absorbed.
  /// Returns the number of batch ids that were new.
  pub fn append_product_batches(
    &mut self,
    ctx: &Context,
    batches: &impl BatchDirectory,
    product_id: EntityId,
    batch_ids: BTreeSet<EntityId>,
  ) -> Result<usize> {
    self.access.authorize(&ctx.caller, Operation::AppendProductBatches)?;
    self.products.require(product_id)?;
    require_batches(batches, &batch_ids)?;

    let product = self.products.require_mut(product_id)?;
    let before = product.batch_ids.len();
    product.batch_ids.extend(batch_ids);
    Ok(product.batch_ids.len() - before)
  }

  pub fn issue_certification(
    &mut self,
    ctx: &Context,
    input: NewCertification,
  ) -> Result<EntityId> {
    self.access.authorize(&ctx.caller, Operation::IssueCertification)?;
    self.products.require(input.product_id)?;
    self.standards.require(input.standard_id)?;
    if input.expiry_date <= ctx.now {
      return Err(Error::InvalidRange(format!(
        "expiry date {} must be after issue date {}",
        input.expiry_date, ctx.now
      )));
    }

    self.certifications.insert(Certification {
      product_id:          input.product_id,
      standard_id:         input.standard_id,
      issue_date:          ctx.now,
      expiry_date:         input.expiry_date,
      certifier:           ctx.caller.clone(),
      certification_proof: input.certification_proof,
      active:              true,
    })
  }

  /// Deactivate a certification. Revoking twice is a no-op.
  pub fn revoke_certification(
    &mut self,
    ctx: &Context,
    certification_id: EntityId,
  ) -> Result<Transition> {
    self.access.authorize(&ctx.caller, Operation::RevokeCertification)?;
    let certification = self.certifications.require_mut(certification_id)?;
    Ok(Transition::flip(&mut certification.active, true))
  }

  pub fn get_standard(&self, id: EntityId) -> Option<&Standard> { self.standards.get(id) }

  pub fn get_product(&self, id: EntityId) -> Option<&Product> { self.products.get(id) }

  pub fn get_certification(&self, id: EntityId) -> Option<&Certification> {
    self.certifications.get(id)
  }

  pub fn certification_status(
    &self,
    id: EntityId,
    at: Timestamp,
  ) -> Option<CertificationStatus> {
    self.certifications.get(id).map(|c| c.status_at(at))
  }

  pub fn certifications_for_product(&self, product_id: EntityId) -> Vec<Record<Certification>> {
    self.certifications.select(|c| c.product_id == product_id)
  }

  pub fn standard_count(&self) -> usize { self.standards.len() }

  pub fn product_count(&self) -> usize { self.products.len() }

  pub fn certification_count(&self) -> usize { self.certifications.len() }
}

impl ProductDirectory for CertificationRegistry {
  fn product_exists(&self, id: EntityId) -> bool { self.products.contains(id) }
}

fn require_batches(batches: &impl BatchDirectory, ids: &BTreeSet<EntityId>) -> Result<()> {
  match ids.iter().find(|id| !batches.batch_exists(**id)) {
    Some(missing) => Err(Error::not_found(EntityKind::Batch, *missing)),
    None => Ok(()),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const NOW: Timestamp = Timestamp::from_secs(1_617_984_000);
  const ONE_YEAR: u64 = 31_536_000;

  struct KnownBatches(BTreeSet<EntityId>);

  impl BatchDirectory for KnownBatches {
    fn batch_exists(&self, id: EntityId) -> bool { self.0.contains(&id) }
  }

  fn batches() -> KnownBatches { KnownBatches([EntityId(1), EntityId(2), EntityId(3)].into()) }

  fn owner() -> Context { Context::new("certifier", NOW) }

  fn ids(raw: &[u64]) -> BTreeSet<EntityId> { raw.iter().copied().map(EntityId).collect() }

  fn gots() -> NewStandard {
    NewStandard {
      name:         "Global Organic Textile Standard".into(),
      description:  "Worldwide leading textile processing standard for organic fibers".into(),
      criteria:     vec![
        "Organic content".into(),
        "Environmental criteria".into(),
        "Social criteria".into(),
        "Quality assurance".into(),
      ],
      issuing_body: "GOTS".into(),
    }
  }

  fn t_shirt(batch_ids: &[u64]) -> NewProduct {
    NewProduct {
      name:         "Organic Cotton T-Shirt".into(),
      description:  "Sustainable t-shirt made from organic cotton".into(),
      manufacturer: Principal::new("maker"),
      batch_ids:    ids(batch_ids),
    }
  }

  fn cert_for(product: u64, standard: u64, expiry: Timestamp) -> NewCertification {
    NewCertification {
      product_id:          EntityId(product),
      standard_id:         EntityId(standard),
      expiry_date:         expiry,
      certification_proof: "ipfs://QmXoypizjW3WknFiJnKLwHCnL72vedxjQkDDP1mXWo6uco".into(),
    }
  }

  /// A registry holding standard 1 and product 1 (batches 1 and 2).
  fn seeded() -> CertificationRegistry {
    let mut reg = CertificationRegistry::new(owner().caller, AccessPolicy::default());
    reg.register_standard(&owner(), gots()).unwrap();
    reg.register_product(&owner(), &batches(), t_shirt(&[1, 2])).unwrap();
    reg
  }

  #[test]
  fn standard_and_product_round_trip() {
    let reg = seeded();
    let standard = reg.get_standard(EntityId(1)).unwrap();
    assert_eq!(standard.issuing_body, "GOTS");
    assert_eq!(standard.criteria.len(), 4);

    let product = reg.get_product(EntityId(1)).unwrap();
    assert_eq!(product.name, "Organic Cotton T-Shirt");
    assert_eq!(product.batch_ids, ids(&[1, 2]));
    assert_eq!(product.registered_by, owner().caller);
  }

  #[test]
  fn product_with_unknown_batch_is_rejected() {
    let mut reg = seeded();
    let err = reg.register_product(&owner(), &batches(), t_shirt(&[1, 99])).unwrap_err();
    assert_eq!(err, Error::NotFound { kind: EntityKind::Batch, id: EntityId(99) });
    assert_eq!(reg.product_count(), 1);
  }

  #[test]
  fn issue_then_revoke_is_one_way() {
    let mut reg = seeded();
    let expiry = NOW.saturating_add_secs(ONE_YEAR);

    let id = reg.issue_certification(&owner(), cert_for(1, 1, expiry)).unwrap();
    assert_eq!(id, EntityId(1));
    let cert = reg.get_certification(id).unwrap();
    assert!(cert.active);
    assert_eq!(cert.issue_date, NOW);
    assert_eq!(cert.expiry_date, expiry);
    assert_eq!(cert.certifier, owner().caller);

    assert_eq!(reg.revoke_certification(&owner(), id).unwrap(), Transition::Applied);
    assert!(!reg.get_certification(id).unwrap().active);

    assert_eq!(reg.revoke_certification(&owner(), id).unwrap(), Transition::AlreadyApplied);
    assert!(!reg.get_certification(id).unwrap().active);
  }

  #[test]
  fn expiry_must_follow_issue() {
    let mut reg = seeded();
    for expiry in [NOW, Timestamp::from_secs(NOW.as_secs() - 1)] {
      let err = reg.issue_certification(&owner(), cert_for(1, 1, expiry)).unwrap_err();
      assert!(matches!(err, Error::InvalidRange(_)));
    }
    assert_eq!(reg.certification_count(), 0);
  }

  #[test]
  fn certification_requires_product_and_standard() {
    let mut reg = seeded();
    let expiry = NOW.saturating_add_secs(ONE_YEAR);

    let err = reg.issue_certification(&owner(), cert_for(2, 1, expiry)).unwrap_err();
    assert_eq!(err, Error::NotFound { kind: EntityKind::Product, id: EntityId(2) });

    let err = reg.issue_certification(&owner(), cert_for(1, 2, expiry)).unwrap_err();
    assert_eq!(err, Error::NotFound { kind: EntityKind::Standard, id: EntityId(2) });
    assert_eq!(reg.certification_count(), 0);
  }

  #[test]
  fn non_owner_cannot_issue_or_revoke() {
    let mut reg = seeded();
    let expiry = NOW.saturating_add_secs(ONE_YEAR);
    let id = reg.issue_certification(&owner(), cert_for(1, 1, expiry)).unwrap();

    let stranger = Context::new("stranger", NOW);
    assert!(matches!(
      reg.issue_certification(&stranger, cert_for(1, 1, expiry)),
      Err(Error::Unauthorized { .. })
    ));
    assert!(matches!(
      reg.revoke_certification(&stranger, id),
      Err(Error::Unauthorized { .. })
    ));
    assert_eq!(reg.certification_count(), 1);
    assert!(reg.get_certification(id).unwrap().active);
  }

  #[test]
  fn status_is_computed_at_query_time() {
    let mut reg = seeded();
    let expiry = NOW.saturating_add_secs(ONE_YEAR);
    let id = reg.issue_certification(&owner(), cert_for(1, 1, expiry)).unwrap();

    assert_eq!(reg.certification_status(id, NOW), Some(CertificationStatus::Active));
    assert_eq!(reg.certification_status(id, expiry), Some(CertificationStatus::Expired));

    reg.revoke_certification(&owner(), id).unwrap();
    assert_eq!(reg.certification_status(id, NOW), Some(CertificationStatus::Revoked));
    assert_eq!(reg.certification_status(EntityId(7), NOW), None);
  }

  #[test]
  fn append_batches_is_additive() {
    let mut reg = seeded();

    let added = reg
      .append_product_batches(&owner(), &batches(), EntityId(1), ids(&[2, 3]))
      .unwrap();
    assert_eq!(added, 1);
    assert_eq!(reg.get_product(EntityId(1)).unwrap().batch_ids, ids(&[1, 2, 3]));

    let err = reg
      .append_product_batches(&owner(), &batches(), EntityId(1), ids(&[3, 4]))
      .unwrap_err();
    assert_eq!(err, Error::NotFound { kind: EntityKind::Batch, id: EntityId(4) });
    assert_eq!(reg.get_product(EntityId(1)).unwrap().batch_ids, ids(&[1, 2, 3]));
  }

  #[test]
  fn certifications_listed_per_product() {
    let mut reg = seeded();
    reg.register_product(&owner(), &batches(), t_shirt(&[3])).unwrap();
    let expiry = NOW.saturating_add_secs(ONE_YEAR);
    reg.issue_certification(&owner(), cert_for(1, 1, expiry)).unwrap();
    reg.issue_certification(&owner(), cert_for(2, 1, expiry)).unwrap();
    reg.issue_certification(&owner(), cert_for(1, 1, expiry)).unwrap();

    let listed: Vec<_> =
      reg.certifications_for_product(EntityId(1)).into_iter().map(|r| r.id).collect();
    assert_eq!(listed, vec![EntityId(1), EntityId(3)]);
  }
}
