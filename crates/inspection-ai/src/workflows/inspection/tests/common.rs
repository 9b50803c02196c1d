use std::sync::mpsc::{Receiver, Sender};
use std::sync::{Arc, Mutex};

use axum::http::{Request, StatusCode};
use axum::response::Response;
use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value;

use crate::workflows::inspection::mapping::store::{MappingStore, MappingStoreError};
use crate::workflows::inspection::mapping::TradeMappingEntry;
use crate::workflows::inspection::router::{ROLE_HEADER, USER_HEADER};
use crate::workflows::inspection::{inspection_router, InspectionService, ReadinessPolicy, Trade};

pub(super) const EXPORT: &str = "\
property_id,jurisdiction,raw_trade_label,finding_code,severity,description,inspected_at
P1,VIC,Electrical,E-01,Minor,Loose cover plate,2025-03-02 09:00:00
P1,VIC,Plumbing,P-01,Minor,Dripping tap,2025-03-02 09:30:00
P2,VIC,Electrical,E-02,Critical,Exposed live wiring,2025-03-03 10:00:00
P2,VIC,Plumbing,P-02,Minor,Slow drain,2025-03-03 10:15:00
P3,VIC,Electrical,E-03,Minor,Missing switch plate,2025-03-04 11:00:00
P3,VIC,HVAC-old,H-01,Major,Unit noisy,2025-03-04 11:30:00
P3,VIC,Electrical,E-04,Severe,Unknown severity,2025-03-04 11:45:00
";

pub(super) fn evaluated_at() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 4, 1)
        .expect("valid date")
        .and_hms_opt(8, 0, 0)
        .expect("valid time")
}

pub(super) fn policy() -> ReadinessPolicy {
    ReadinessPolicy::default().with_expectation("VIC", [Trade::Electrical, Trade::Plumbing])
}

pub(super) fn build_service() -> (InspectionService<MemoryMappingStore>, Arc<MemoryMappingStore>) {
    let store = Arc::new(MemoryMappingStore::default());
    let service =
        InspectionService::from_store(store.clone(), policy()).expect("memory store loads");
    (service, store)
}

pub(super) fn inspection_router_with_service(
    service: InspectionService<MemoryMappingStore>,
) -> axum::Router {
    inspection_router(Arc::new(service))
}

pub(super) fn request(method: &str, uri: &str, role: Option<&str>) -> axum::http::request::Builder {
    let builder = Request::builder().method(method).uri(uri);
    match role {
        Some(role) => builder
            .header(USER_HEADER, "casey")
            .header(ROLE_HEADER, role),
        None => builder,
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) fn assert_forbidden(response: Response) {
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[derive(Default)]
pub(super) struct MemoryMappingStore {
    entries: Mutex<Vec<TradeMappingEntry>>,
    saves: Mutex<usize>,
}

impl MemoryMappingStore {
    pub(super) fn with_entries(entries: Vec<TradeMappingEntry>) -> Self {
        Self {
            entries: Mutex::new(entries),
            saves: Mutex::new(0),
        }
    }

    pub(super) fn saved(&self) -> Vec<TradeMappingEntry> {
        self.entries.lock().expect("store mutex poisoned").clone()
    }

    pub(super) fn save_count(&self) -> usize {
        *self.saves.lock().expect("store mutex poisoned")
    }
}

impl MappingStore for MemoryMappingStore {
    fn load_all(&self) -> Result<Vec<TradeMappingEntry>, MappingStoreError> {
        Ok(self.saved())
    }

    fn save_all(&self, entries: &[TradeMappingEntry]) -> Result<(), MappingStoreError> {
        *self.entries.lock().expect("store mutex poisoned") = entries.to_vec();
        *self.saves.lock().expect("store mutex poisoned") += 1;
        Ok(())
    }
}

/// Loads fine but refuses every write.
pub(super) struct ReadOnlyMappingStore;

impl MappingStore for ReadOnlyMappingStore {
    fn load_all(&self) -> Result<Vec<TradeMappingEntry>, MappingStoreError> {
        Ok(Vec::new())
    }

    fn save_all(&self, _entries: &[TradeMappingEntry]) -> Result<(), MappingStoreError> {
        Err(MappingStoreError::Unavailable("read only".to_string()))
    }
}

pub(super) struct UnavailableMappingStore;

impl MappingStore for UnavailableMappingStore {
    fn load_all(&self) -> Result<Vec<TradeMappingEntry>, MappingStoreError> {
        Err(MappingStoreError::Unavailable("mapping database offline".to_string()))
    }

    fn save_all(&self, _entries: &[TradeMappingEntry]) -> Result<(), MappingStoreError> {
        Err(MappingStoreError::Unavailable("mapping database offline".to_string()))
    }
}

/// Records saves like [`MemoryMappingStore`] but parks the first save until released.
pub(super) struct GatedMappingStore {
    inner: MemoryMappingStore,
    gate: Mutex<Option<(Sender<()>, Receiver<()>)>>,
}

impl GatedMappingStore {
    /// `entered` fires when the first save starts; the save returns once `release` yields.
    pub(super) fn new(entered: Sender<()>, release: Receiver<()>) -> Self {
        Self {
            inner: MemoryMappingStore::default(),
            gate: Mutex::new(Some((entered, release))),
        }
    }

    pub(super) fn saved(&self) -> Vec<TradeMappingEntry> {
        self.inner.saved()
    }
}

impl MappingStore for GatedMappingStore {
    fn load_all(&self) -> Result<Vec<TradeMappingEntry>, MappingStoreError> {
        self.inner.load_all()
    }

    fn save_all(&self, entries: &[TradeMappingEntry]) -> Result<(), MappingStoreError> {
        let gate = self.gate.lock().expect("gate mutex poisoned").take();
        if let Some((entered, release)) = gate {
            entered.send(()).expect("test waits for the first save");
            release.recv().expect("test releases the first save");
        }
        self.inner.save_all(entries)
    }
}
