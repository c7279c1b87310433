use std::fmt::Debug;
use std::ops::Deref;
use std::sync::Arc;

use axum::async_trait;
use axum::extract::FromRequestParts;
use http::request::Parts;

use common::gate::Gate;

use crate::ServiceState;

#[async_trait]
pub trait DataSource {
    /// Perform various checks on the system to ensure its healthy and ready to accept requests.
    async fn is_ready(&self) -> Result<(), DataSourceError>;
}

#[derive(Debug, thiserror::Error)]
pub enum DataSourceError {
    #[error("access control document unavailable")]
    AclUnavailable,
}

pub type DynDataSource = Arc<dyn DataSource + Send + Sync>;

pub struct StateDataSource(DynDataSource);

impl Debug for StateDataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateDataSource").finish()
    }
}

impl StateDataSource {
    #[cfg(test)]
    pub fn new(dds: DynDataSource) -> Self {
        Self(dds)
    }
}

impl Deref for StateDataSource {
    type Target = DynDataSource;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Ready when the ACL document loads. Manifests are not checked here; a
///  missing one only affects the principals granted it.
struct AclSource {
    gate: Arc<Gate>,
}

#[async_trait]
impl DataSource for AclSource {
    async fn is_ready(&self) -> Result<(), DataSourceError> {
        let gate = self.gate.clone();
        tokio::task::spawn_blocking(move || gate.access().acl())
            .await
            .map_err(|_| DataSourceError::AclUnavailable)?
            .map_err(|e| {
                tracing::warn!(error = %e, "readiness: acl document unusable");
                DataSourceError::AclUnavailable
            })?;
        Ok(())
    }
}

#[async_trait]
impl FromRequestParts<ServiceState> for StateDataSource {
    type Rejection = ();

    async fn from_request_parts(
        _parts: &mut Parts,
        state: &ServiceState,
    ) -> Result<Self, Self::Rejection> {
        Ok(StateDataSource(Arc::new(AclSource {
            gate: state.gate().clone(),
        })))
    }
}
