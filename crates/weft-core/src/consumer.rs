//! Consumer verification — public verification records behind a product's QR
//! code, the scans consumers make of them, and the feedback they leave.

use std::{fmt, ops::RangeInclusive, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{
  Error, Result,
  access::{AccessControl, AccessPolicy, Operation},
  arena::Arena,
  directory::ProductDirectory,
  kind::EntityKind,
  primitives::{Context, EntityId, Principal, Record, Timestamp},
};

/// Accepted feedback ratings.
pub const RATING_RANGE: RangeInclusive<u8> = 1..=5;

// ─── QR-code hash ────────────────────────────────────────────────────────────

/// A 32-byte digest printed into a product's QR code. Rendered as `0x`-prefixed
/// lowercase hex; the prefix is optional when parsing.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct QrCodeHash([u8; 32]);

impl QrCodeHash {
  pub const fn from_bytes(bytes: [u8; 32]) -> Self { Self(bytes) }

  pub fn as_bytes(&self) -> &[u8; 32] { &self.0 }
}

impl FromStr for QrCodeHash {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    let mut bytes = [0u8; 32];
    hex::decode_to_slice(digits, &mut bytes)
      .map_err(|e| Error::MalformedHash(format!("{s:?}: {e}")))?;
    Ok(Self(bytes))
  }
}

impl fmt::Display for QrCodeHash {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "0x{}", hex::encode(self.0))
  }
}

impl fmt::Debug for QrCodeHash {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "QrCodeHash({self})")
  }
}

impl Serialize for QrCodeHash {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(self)
  }
}

impl<'de> Deserialize<'de> for QrCodeHash {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    let s = String::deserialize(deserializer)?;
    s.parse().map_err(serde::de::Error::custom)
  }
}

// ─── Policy ──────────────────────────────────────────────────────────────────

/// Whether product ids named by verifications and feedback must exist in the
/// certification registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductIntegrity {
  #[default]
  Enforced,
  Unchecked,
}

// ─── Entities ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductVerification {
  pub product_id:   EntityId,
  pub qr_code_hash: QrCodeHash,
  pub url:          String,
  pub timestamp:    Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProductVerification {
  pub product_id:   EntityId,
  pub qr_code_hash: QrCodeHash,
  pub url:          String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumerScan {
  pub verification_id: EntityId,
  pub consumer:        Principal,
  pub timestamp:       Timestamp,
  pub location:        String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewConsumerScan {
  pub verification_id: EntityId,
  pub location:        String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductFeedback {
  pub product_id: EntityId,
  pub consumer:   Principal,
  pub rating:     u8,
  pub comment:    String,
  pub timestamp:  Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProductFeedback {
  pub product_id: EntityId,
  pub rating:     u8,
  pub comment:    String,
}

/// Aggregate view over a product's feedback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackSummary {
  pub product_id:     EntityId,
  pub count:          usize,
  /// `None` when no feedback has been submitted.
  pub average_rating: Option<f64>,
}

// ─── Registry ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ConsumerVerificationRegistry {
  access:        AccessControl,
  integrity:     ProductIntegrity,
  verifications: Arena<ProductVerification>,
  scans:         Arena<ConsumerScan>,
  feedback:      Arena<ProductFeedback>,
}

impl ConsumerVerificationRegistry {
  pub fn new(owner: Principal, policy: AccessPolicy, integrity: ProductIntegrity) -> Self {
    Self {
      access: AccessControl::new(owner, policy),
      integrity,
      verifications: Arena::new(EntityKind::ProductVerification),
      scans: Arena::new(EntityKind::ConsumerScan),
      feedback: Arena::new(EntityKind::ProductFeedback),
    }
  }

  pub fn access(&self) -> &AccessControl { &self.access }

  pub fn integrity(&self) -> ProductIntegrity { self.integrity }

  pub fn set_contract_owner(&mut self, ctx: &Context, new_owner: Principal) -> Result<()> {
    self.access.set_owner(&ctx.caller, new_owner)
  }

  pub fn create_product_verification(
    &mut self,
    ctx: &Context,
    products: &impl ProductDirectory,
    input: NewProductVerification,
  ) -> Result<EntityId> {
    self.access.authorize(&ctx.caller, Operation::CreateProductVerification)?;
    self.require_product(products, input.product_id)?;

    self.verifications.insert(ProductVerification {
      product_id:   input.product_id,
      qr_code_hash: input.qr_code_hash,
      url:          input.url,
      timestamp:    ctx.now,
    })
  }

  /// Log a scan by the caller. Any principal may scan.
  pub fn record_consumer_scan(&mut self, ctx: &Context, input: NewConsumerScan) -> Result<EntityId> {
    self.access.authorize(&ctx.caller, Operation::RecordConsumerScan)?;
    self.verifications.require(input.verification_id)?;

    self.scans.insert(ConsumerScan {
      verification_id: input.verification_id,
      consumer:        ctx.caller.clone(),
      timestamp:       ctx.now,
      location:        input.location,
    })
  }

  pub fn submit_product_feedback(
    &mut self,
    ctx: &Context,
    products: &impl ProductDirectory,
    input: NewProductFeedback,
  ) -> Result<EntityId> {
    self.access.authorize(&ctx.caller, Operation::SubmitProductFeedback)?;
    self.require_product(products, input.product_id)?;
    if !RATING_RANGE.contains(&input.rating) {
      return Err(Error::InvalidRange(format!(
        "rating {} outside {}..={}",
        input.rating,
        RATING_RANGE.start(),
        RATING_RANGE.end()
      )));
    }

    self.feedback.insert(ProductFeedback {
      product_id: input.product_id,
      consumer:   ctx.caller.clone(),
      rating:     input.rating,
      comment:    input.comment,
      timestamp:  ctx.now,
    })
  }

  pub fn get_product_verification(&self, id: EntityId) -> Option<&ProductVerification> {
    self.verifications.get(id)
  }

  pub fn get_consumer_scan(&self, id: EntityId) -> Option<&ConsumerScan> { self.scans.get(id) }

  pub fn get_product_feedback(&self, id: EntityId) -> Option<&ProductFeedback> {
    self.feedback.get(id)
  }

  pub fn verifications_for_product(
    &self,
    product_id: EntityId,
  ) -> Vec<Record<ProductVerification>> {
    self.verifications.select(|v| v.product_id == product_id)
  }

  pub fn scans_for_verification(&self, verification_id: EntityId) -> Vec<Record<ConsumerScan>> {
    self.scans.select(|s| s.verification_id == verification_id)
  }

  pub fn feedback_for_product(&self, product_id: EntityId) -> Vec<Record<ProductFeedback>> {
    self.feedback.select(|f| f.product_id == product_id)
  }

  pub fn feedback_summary(&self, product_id: EntityId) -> FeedbackSummary {
    let (count, total) = self
      .feedback
      .iter()
      .filter(|(_, f)| f.product_id == product_id)
      .fold((0usize, 0u64), |(n, sum), (_, f)| (n + 1, sum + u64::from(f.rating)));

    FeedbackSummary {
      product_id,
      count,
      average_rating: (count > 0).then(|| total as f64 / count as f64),
    }
  }

  pub fn verification_count(&self) -> usize { self.verifications.len() }

  pub fn scan_count(&self) -> usize { self.scans.len() }

  pub fn feedback_count(&self) -> usize { self.feedback.len() }

  fn require_product(&self, products: &impl ProductDirectory, id: EntityId) -> Result<()> {
    match self.integrity {
      ProductIntegrity::Unchecked => Ok(()),
      ProductIntegrity::Enforced if products.product_exists(id) => Ok(()),
      ProductIntegrity::Enforced => Err(Error::not_found(EntityKind::Product, id)),
    }
  }
}
