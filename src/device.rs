//! Registered device identity.

use std::sync::{Arc, RwLock};

use tracing::{info, instrument};

use crate::api::{ApiError, MatchService};

/// Handle to the registered device identity.
///
/// An explicit context value shared by the controller and the background
/// tasks; the id can be renewed when the service forgets the device, so
/// every read takes a snapshot through the lock.
#[derive(Debug, Clone)]
pub struct DeviceHandle {
    id: Arc<RwLock<String>>,
    alias: Option<String>,
}

impl DeviceHandle {
    /// Registers with the service and returns the handle.
    ///
    /// Entry into any game mode is blocked until registration succeeds.
    #[instrument(skip(service))]
    pub async fn register(
        service: &dyn MatchService,
        alias: Option<&str>,
    ) -> Result<Self, ApiError> {
        let id = service.register_device(alias).await?;
        info!(device_id = %id, "device registered");
        Ok(Self {
            id: Arc::new(RwLock::new(id)),
            alias: alias.map(String::from),
        })
    }

    /// Wraps an already-known device id, for tests and resumed sessions.
    pub fn from_id(id: impl Into<String>, alias: Option<&str>) -> Self {
        Self {
            id: Arc::new(RwLock::new(id.into())),
            alias: alias.map(String::from),
        }
    }

    /// Snapshot of the current device id.
    pub fn id(&self) -> String {
        self.id.read().unwrap().clone()
    }

    /// Alias used at registration.
    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    /// Forgets the current id and registers again under the same alias.
    ///
    /// Used by keep-alive when a liveness probe fails.
    #[instrument(skip(self, service))]
    pub async fn renew(&self, service: &dyn MatchService) -> Result<String, ApiError> {
        let id = service.register_device(self.alias.as_deref()).await?;
        *self.id.write().unwrap() = id.clone();
        info!(device_id = %id, "device re-registered");
        Ok(id)
    }
}
