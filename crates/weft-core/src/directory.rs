//! Read-only existence checks one registry exposes to another.
//!
//! Cross-registry references are plain ids resolved through these traits at
//! validation time; no registry ever touches another's arena directly.

use crate::primitives::EntityId;

/// Answers whether a batch has been registered.
pub trait BatchDirectory {
  fn batch_exists(&self, id: EntityId) -> bool;
}

/// Answers whether a product has been registered.
pub trait ProductDirectory {
  fn product_exists(&self, id: EntityId) -> bool;
}

impl<T: BatchDirectory + ?Sized> BatchDirectory for &T {
  fn batch_exists(&self, id: EntityId) -> bool { (**self).batch_exists(id) }
}

impl<T: ProductDirectory + ?Sized> ProductDirectory for &T {
  fn product_exists(&self, id: EntityId) -> bool { (**self).product_exists(id) }
}
