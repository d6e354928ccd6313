//! Component health for the liveness and readiness endpoints
//!
//! The store entry follows the outcome of the last storage access; the
//! predictor entry is fixed at startup by the model load.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Component names for health tracking
pub mod components {
    pub const STORE: &str = "store";
    pub const PREDICTOR: &str = "predictor";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    Healthy,
    Unhealthy,
}

impl ComponentStatus {
    pub fn is_operational(&self) -> bool {
        *self == ComponentStatus::Healthy
    }
}

/// Last known state of one component
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub status: ComponentStatus,
    /// Failure description, absent while healthy
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Unix seconds of the last status change
    pub updated_at: i64,
}

impl ComponentHealth {
    fn new(status: ComponentStatus, message: Option<String>) -> Self {
        Self {
            status,
            message,
            updated_at: chrono::Utc::now().timestamp(),
        }
    }
}

/// Body of `/healthz`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: ComponentStatus,
    pub components: HashMap<String, ComponentHealth>,
}

/// Body of `/readyz`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct HealthRegistry {
    components: Arc<RwLock<HashMap<String, ComponentHealth>>>,
    ready: Arc<RwLock<bool>>,
}

impl HealthRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a component, starting healthy
    pub async fn register(&self, name: &str) {
        self.set_healthy(name).await;
    }

    /// Mark healthy. Skips the write when nothing changes so hot request
    /// paths only take the read lock.
    pub async fn set_healthy(&self, name: &str) {
        let unchanged = matches!(
            self.components.read().await.get(name),
            Some(health) if health.status == ComponentStatus::Healthy
        );
        if !unchanged {
            self.set(name, ComponentHealth::new(ComponentStatus::Healthy, None))
                .await;
        }
    }

    pub async fn set_unhealthy(&self, name: &str, message: impl Into<String>) {
        let health = ComponentHealth::new(ComponentStatus::Unhealthy, Some(message.into()));
        self.set(name, health).await;
    }

    async fn set(&self, name: &str, health: ComponentHealth) {
        self.components
            .write()
            .await
            .insert(name.to_string(), health);
    }

    pub async fn set_ready(&self, ready: bool) {
        *self.ready.write().await = ready;
    }

    pub async fn component(&self, name: &str) -> Option<ComponentHealth> {
        self.components.read().await.get(name).cloned()
    }

    /// Unhealthy as soon as any component is
    pub async fn health(&self) -> HealthResponse {
        let components = self.components.read().await.clone();
        let status = if components.values().all(|h| h.status.is_operational()) {
            ComponentStatus::Healthy
        } else {
            ComponentStatus::Unhealthy
        };
        HealthResponse { status, components }
    }

    /// Ready once startup completed and the store is operational.
    ///
    /// A missing model only disables prediction; ingestion keeps working,
    /// so the predictor component does not gate readiness.
    pub async fn readiness(&self) -> ReadinessResponse {
        if !*self.ready.read().await {
            return ReadinessResponse {
                ready: false,
                reason: Some("Service not yet initialized".to_string()),
            };
        }

        match self.component(components::STORE).await {
            Some(store) if !store.status.is_operational() => ReadinessResponse {
                ready: false,
                reason: Some(format!(
                    "Telemetry store unhealthy: {}",
                    store.message.unwrap_or_default()
                )),
            },
            _ => ReadinessResponse {
                ready: true,
                reason: None,
            },
        }
    }
}
