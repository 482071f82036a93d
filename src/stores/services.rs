//! Service catalog store.

#[cfg(test)]
#[path = "services_test.rs"]
mod services_test;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{StoreCell, StoreState, unwrap_envelope};
use crate::net::{ApiClient, ApiError};

pub const SERVICES_PATH: &str = "/api/v1/services";
const STORE_NAME: &str = "services";

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Service {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub requirements: String,
    pub category: String,
    pub active: bool,
    pub date_created: String,
}

#[derive(Debug, Deserialize)]
struct ServiceRecord {
    id: i64,
    #[serde(default)]
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    requirements: String,
    #[serde(default)]
    category: String,
    #[serde(default)]
    active: serde_json::Value,
    #[serde(default)]
    date_created: String,
}

impl From<ServiceRecord> for Service {
    fn from(r: ServiceRecord) -> Self {
        Self {
            id: r.id,
            name: r.name,
            description: r.description,
            requirements: r.requirements,
            category: r.category,
            active: is_active(&r.active),
            date_created: r.date_created,
        }
    }
}

/// `1` (or `true`) means the service is offered.
#[allow(clippy::float_cmp)]
fn is_active(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Number(n) => n.as_f64() == Some(1.0),
        serde_json::Value::Bool(b) => *b,
        _ => false,
    }
}

fn parse_services(value: serde_json::Value) -> Result<Vec<Service>, ApiError> {
    serde_json::from_value::<Vec<ServiceRecord>>(unwrap_envelope(value))
        .map(|records| records.into_iter().map(Service::from).collect())
        .map_err(|e| ApiError::Decode(e.to_string()))
}

pub struct ServicesStore {
    api: Arc<ApiClient>,
    cell: StoreCell<Vec<Service>>,
}

impl ServicesStore {
    #[must_use]
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api, cell: StoreCell::new(Vec::new()) }
    }

    #[must_use]
    pub fn state(&self) -> StoreState<Vec<Service>> {
        self.cell.snapshot()
    }

    #[must_use]
    pub fn services(&self) -> Vec<Service> {
        self.cell.snapshot().data
    }

    /// Loaded services that are currently offered.
    #[must_use]
    pub fn active_services(&self) -> Vec<Service> {
        self.services().into_iter().filter(|s| s.active).collect()
    }

    pub async fn fetch(&self) {
        let _turn = self.cell.admit().await;
        self.cell.begin();
        let result = self.api.get_json::<serde_json::Value>(SERVICES_PATH).await.and_then(parse_services);
        if let Ok(services) = &result {
            tracing::debug!(count = services.len(), "services loaded");
        }
        self.cell.settle(STORE_NAME, result);
    }
}
