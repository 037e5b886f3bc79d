use crate::declared::Declared;
use namespace_config_controller_k8s_api::{Namespace, NamespaceConfig};
use std::error::Error as StdError;

/// Reads and writes cluster state on behalf of the reconcilers.
///
/// Absent objects are reported as `Ok(None)` rather than as an error so that
/// callers can branch between create and update.
#[async_trait::async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetches a declared object by name. `namespace` is `None` for
    /// cluster-scoped kinds.
    async fn get<K: Declared>(
        &self,
        namespace: Option<&str>,
        name: &str,
    ) -> Result<Option<K>, StoreError>;

    async fn create<K: Declared>(&self, object: &K) -> Result<(), StoreError>;

    /// Replaces the stored object with `object`.
    async fn update<K: Declared>(&self, object: &K) -> Result<(), StoreError>;

    async fn get_namespace(&self, name: &str) -> Result<Option<Namespace>, StoreError>;

    async fn list_namespaces(&self) -> Result<Vec<Namespace>, StoreError>;

    async fn get_config(&self, name: &str) -> Result<Option<NamespaceConfig>, StoreError>;

    async fn list_configs(&self) -> Result<Vec<NamespaceConfig>, StoreError>;
}

/// Any store failure other than the object being absent.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct StoreError(Box<dyn StdError + Send + Sync + 'static>);

impl StoreError {
    pub fn new(error: impl Into<Box<dyn StdError + Send + Sync + 'static>>) -> Self {
        Self(error.into())
    }

    pub fn get_ref(&self) -> &(dyn StdError + Send + Sync + 'static) {
        self.0.as_ref()
    }
}
