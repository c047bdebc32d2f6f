//! Router tests against a [`MemoryStore`] driven with `tower::ServiceExt`.

use std::sync::{
  Arc,
  atomic::{AtomicU64, Ordering},
};

use axum::{
  body::Body,
  http::{Method, Request, StatusCode, header},
};
use serde_json::{Value, json};
use tower::ServiceExt as _;
use weft_core::{
  ledger::LedgerConfig,
  memory::MemoryStore,
  primitives::{Clock, ManualClock, Principal, Timestamp},
  store::LedgerStore,
};

use crate::{ApiState, api_router};

const DEPLOYER: &str = "mill-operator";
const T0: u64 = 1_700_000_000;
const QR_HASH: &str = "0x1234567890abcdef1234567890abcdef1234567890abcdef1234567890abcdef";

struct Harness {
  state: ApiState<MemoryStore>,
  clock: Arc<ManualClock>,
}

impl Harness {
  fn new() -> Self {
    let store = Arc::new(MemoryStore::deploy(&Principal::new(DEPLOYER), &LedgerConfig::default()));
    let clock = Arc::new(ManualClock::new(Timestamp::from_secs(T0)));
    let state = ApiState::new(store, Arc::clone(&clock) as Arc<dyn Clock>);
    Self { state, clock }
  }

  async fn send(
    &self,
    method: Method,
    uri: &str,
    caller: Option<&str>,
    body: Option<Value>,
  ) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if body.is_some() {
      builder = builder.header(header::CONTENT_TYPE, "application/json");
    }
    let mut req = builder
      .body(body.map_or_else(Body::empty, |v| Body::from(v.to_string())))
      .unwrap();
    if let Some(caller) = caller {
      req.extensions_mut().insert(Principal::new(caller));
    }

    let resp = api_router(self.state.clone()).oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, value)
  }

  async fn post(&self, uri: &str, caller: &str, body: Value) -> (StatusCode, Value) {
    self.send(Method::POST, uri, Some(caller), Some(body)).await
  }

  async fn get(&self, uri: &str) -> (StatusCode, Value) {
    self.send(Method::GET, uri, None, None).await
  }

  /// Material 1, batch 1, standard 1, product 1 over batch 1.
  async fn seed(&self) {
    let steps = [
      ("/materials", json!({
        "name": "Organic Cotton", "origin": "India", "harvest_date": T0 - 86_400,
        "supplier": DEPLOYER, "organic": true
      })),
      ("/batches", json!({ "material_id": 1, "quantity": 1000, "quality_grade": "A" })),
      ("/standards", json!({
        "name": "GOTS", "description": "Global Organic Textile Standard",
        "criteria": ["Organic content"], "issuing_body": "GOTS"
      })),
      ("/products", json!({
        "name": "T-Shirt", "description": "Organic cotton tee",
        "manufacturer": DEPLOYER, "batch_ids": [1]
      })),
    ];
    for (uri, body) in steps {
      let (status, _) = self.post(uri, DEPLOYER, body).await;
      assert_eq!(status, StatusCode::CREATED, "seeding {uri}");
    }
  }
}

// ─── Authentication and authorisation ────────────────────────────────────────

#[tokio::test]
async fn anonymous_mutation_is_401() {
  let h = Harness::new();
  let (status, body) = h
    .send(Method::POST, "/standards", None, Some(json!({
      "name": "x", "description": "x", "criteria": [], "issuing_body": "x"
    })))
    .await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
  assert!(body["error"].is_string());
}

#[tokio::test]
async fn non_owner_mutation_is_403() {
  let h = Harness::new();
  let (status, body) = h
    .post("/standards", "stranger", json!({
      "name": "x", "description": "x", "criteria": [], "issuing_body": "x"
    }))
    .await;
  assert_eq!(status, StatusCode::FORBIDDEN);
  assert!(body["error"].as_str().unwrap().contains("stranger"));
}

// ─── Material sourcing ───────────────────────────────────────────────────────

#[tokio::test]
async fn register_and_read_material_and_batch() {
  let h = Harness::new();
  h.seed().await;

  let (status, material) = h.get("/materials/1").await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(material["id"], 1);
  assert_eq!(material["name"], "Organic Cotton");
  assert_eq!(material["registered_by"], DEPLOYER);

  let (status, batches) = h.get("/materials/1/batches").await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(batches.as_array().unwrap().len(), 1);
  assert_eq!(batches[0]["quantity"], 1000);
}

#[tokio::test]
async fn dangling_material_is_404_and_zero_quantity_is_422() {
  let h = Harness::new();
  h.seed().await;

  let (status, _) = h
    .post("/batches", DEPLOYER, json!({ "material_id": 9, "quantity": 10, "quality_grade": "B" }))
    .await;
  assert_eq!(status, StatusCode::NOT_FOUND);

  let (status, _) = h
    .post("/batches", DEPLOYER, json!({ "material_id": 1, "quantity": 0, "quality_grade": "B" }))
    .await;
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

  let (status, _) = h.get("/batches/2").await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

// ─── Processing ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn processing_is_recorded_by_anyone_and_verified_by_owner() {
  let h = Harness::new();
  h.seed().await;

  h.post("/processing-steps", DEPLOYER, json!({
    "name": "Dyeing", "description": "Plant dyes", "eco_friendly": true,
    "water_usage": 500, "energy_usage": 200
  }))
  .await;
  let (status, outcome) = h
    .post("/batch-processing", "dye-house", json!({
      "batch_id": 1, "step_id": 1, "processor": "dye-house", "location": "Mumbai"
    }))
    .await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(outcome, json!({ "outcome": "created", "id": 1 }));

  let (status, _) = h.post("/batch-processing/1/verify", "dye-house", Value::Null).await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  let (_, first) = h.post("/batch-processing/1/verify", DEPLOYER, Value::Null).await;
  assert_eq!(first["transition"], "applied");
  let (_, second) = h.post("/batch-processing/1/verify", DEPLOYER, Value::Null).await;
  assert_eq!(second["transition"], "already_applied");

  let (_, history) = h.get("/batches/1/processing").await;
  assert_eq!(history[0]["verified"], true);
  assert_eq!(history[0]["verifier"], DEPLOYER);
}

// ─── Certification ───────────────────────────────────────────────────────────

#[tokio::test]
async fn certification_status_follows_expiry_and_revocation() {
  let h = Harness::new();
  h.seed().await;

  let (status, _) = h
    .post("/certifications", DEPLOYER, json!({
      "product_id": 1, "standard_id": 1, "expiry_date": T0 + 1000,
      "certification_proof": "ipfs://proof"
    }))
    .await;
  assert_eq!(status, StatusCode::CREATED);

  let (_, cert) = h.get("/certifications/1").await;
  assert_eq!(cert["status"], "active");
  assert_eq!(cert["active"], true);

  let (_, cert) = h.get(&format!("/certifications/1?at={}", T0 + 1000)).await;
  assert_eq!(cert["status"], "expired");

  h.post("/certifications/1/revoke", DEPLOYER, Value::Null).await;
  let (_, list) = h.get("/products/1/certifications").await;
  assert_eq!(list[0]["status"], "revoked");
}

#[tokio::test]
async fn certification_expiring_now_is_422() {
  let h = Harness::new();
  h.seed().await;

  let (status, _) = h
    .post("/certifications", DEPLOYER, json!({
      "product_id": 1, "standard_id": 1, "expiry_date": T0, "certification_proof": "p"
    }))
    .await;
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn trace_walks_back_to_material() {
  let h = Harness::new();
  h.seed().await;

  let (status, trace) = h.get("/products/1/trace").await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(trace["product"]["id"], 1);
  assert_eq!(trace["batches"][0]["material"]["name"], "Organic Cotton");
  assert_eq!(trace["as_of"], T0);

  let (status, _) = h.get("/products/7/trace").await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

// ─── Consumer verification ───────────────────────────────────────────────────

#[tokio::test]
async fn verification_scan_and_feedback_flow() {
  let h = Harness::new();
  h.seed().await;

  let (status, _) = h
    .post("/verifications", DEPLOYER, json!({
      "product_id": 1, "qr_code_hash": QR_HASH, "url": "https://verify.example/1"
    }))
    .await;
  assert_eq!(status, StatusCode::CREATED);

  let (status, _) = h
    .post("/verifications/1/scans", "shopper", json!({ "location": "Berlin" }))
    .await;
  assert_eq!(status, StatusCode::CREATED);
  let (_, scans) = h.get("/verifications/1/scans").await;
  assert_eq!(scans[0]["consumer"], "shopper");

  for rating in [4, 5] {
    let (status, _) = h
      .post("/feedback", "shopper", json!({ "product_id": 1, "rating": rating, "comment": "ok" }))
      .await;
    assert_eq!(status, StatusCode::CREATED);
  }
  let (status, _) = h
    .post("/feedback", "shopper", json!({ "product_id": 1, "rating": 0, "comment": "bad" }))
    .await;
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

  let (_, page) = h.get("/products/1/feedback").await;
  assert_eq!(page["summary"]["count"], 2);
  assert_eq!(page["summary"]["average_rating"], 4.5);
  assert_eq!(page["feedback"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn malformed_qr_hash_is_rejected() {
  let h = Harness::new();
  h.seed().await;

  let (status, body) = h
    .post("/verifications", DEPLOYER, json!({
      "product_id": 1, "qr_code_hash": "0xnothex", "url": "https://verify.example/1"
    }))
    .await;
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
  assert!(body["error"].as_str().unwrap().contains("malformed qr-code hash"));
}

#[tokio::test]
async fn undecodable_bodies_use_the_error_shape() {
  let h = Harness::new();
  h.seed().await;

  let (status, body) = h
    .post("/feedback", "shopper", json!({ "product_id": 1, "rating": 300, "comment": "loud" }))
    .await;
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
  assert!(body["error"].is_string());

  let req = Request::builder()
    .method(Method::POST)
    .uri("/feedback")
    .header(header::CONTENT_TYPE, "application/json")
    .extension(Principal::new("shopper"))
    .body(Body::from("{ not json"))
    .unwrap();
  let resp = api_router(h.state.clone()).oneshot(req).await.unwrap();
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  let body: Value = serde_json::from_slice(&bytes).unwrap();
  assert!(body["error"].is_string());
}

#[tokio::test]
async fn product_listings_are_404_for_unknown_products() {
  let h = Harness::new();
  h.seed().await;

  for uri in ["/products/9/verifications", "/products/9/feedback", "/products/9/certifications"] {
    let (status, body) = h.get(uri).await;
    assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
    assert!(body["error"].is_string());
  }

  let (status, list) = h.get("/products/1/verifications").await;
  assert_eq!(status, StatusCode::OK);
  assert!(list.as_array().unwrap().is_empty());
  let (status, page) = h.get("/products/1/feedback").await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(page["summary"]["count"], 0);
}

// ─── Clock and ownership ─────────────────────────────────────────────────────

#[tokio::test]
async fn clock_regression_is_409() {
  let h = Harness::new();
  h.seed().await;

  h.clock.set(Timestamp::from_secs(T0 - 1));
  let (status, _) = h
    .post("/batches", DEPLOYER, json!({ "material_id": 1, "quantity": 5, "quality_grade": "C" }))
    .await;
  assert_eq!(status, StatusCode::CONFLICT);
}

/// Each read is one second later than the last.
struct TickingClock(AtomicU64);

impl Clock for TickingClock {
  fn now(&self) -> Timestamp { Timestamp::from_secs(self.0.fetch_add(1, Ordering::SeqCst)) }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_writes_are_stamped_in_commit_order() {
  let store = Arc::new(MemoryStore::deploy(&Principal::new(DEPLOYER), &LedgerConfig::default()));
  let clock: Arc<dyn Clock> = Arc::new(TickingClock(AtomicU64::new(T0)));
  let state = ApiState::new(store, clock);

  let writes = (0..200).map(|_| {
    let router = api_router(state.clone());
    tokio::spawn(async move {
      let body = json!({
        "name": "Organic Cotton", "origin": "India", "harvest_date": T0 - 86_400,
        "supplier": DEPLOYER, "organic": true
      });
      let req = Request::builder()
        .method(Method::POST)
        .uri("/materials")
        .header(header::CONTENT_TYPE, "application/json")
        .extension(Principal::new(DEPLOYER))
        .body(Body::from(body.to_string()))
        .unwrap();
      router.oneshot(req).await.unwrap().status()
    })
  });
  let writes: Vec<_> = writes.collect();

  for write in writes {
    assert_eq!(write.await.unwrap(), StatusCode::CREATED);
  }
  let count = state.store.view(|l| l.materials().material_count()).await;
  assert_eq!(count, 200);
}

#[tokio::test]
async fn ownership_transfer_is_per_registry() {
  let h = Harness::new();

  let (_, owner) = h.get("/registries/certification/owner").await;
  assert_eq!(owner["owner"], DEPLOYER);

  let (status, _) = h
    .send(
      Method::PUT,
      "/registries/certification/owner",
      Some(DEPLOYER),
      Some(json!({ "owner": "certifier" })),
    )
    .await;
  assert_eq!(status, StatusCode::OK);

  let (_, owner) = h.get("/registries/certification/owner").await;
  assert_eq!(owner["owner"], "certifier");
  let (_, owner) = h.get("/registries/material-sourcing/owner").await;
  assert_eq!(owner["owner"], DEPLOYER);

  let (status, _) = h.get("/registries/laundry/owner").await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}
