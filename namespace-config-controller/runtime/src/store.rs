use crate::{
    core::{Declared, ObjectStore, StoreError},
    k8s::{Api, Client, ListParams, Namespace, NamespaceConfig, PostParams, ResourceExt},
};

/// An `ObjectStore` backed by the Kubernetes API. Every call reads fresh state
/// from the API server; nothing is cached.
#[derive(Clone)]
pub struct KubeStore {
    client: Client,
}

impl KubeStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl ObjectStore for KubeStore {
    async fn get<K: Declared>(
        &self,
        namespace: Option<&str>,
        name: &str,
    ) -> Result<Option<K>, StoreError> {
        K::api(self.client.clone(), namespace.unwrap_or_default())
            .get_opt(name)
            .await
            .map_err(StoreError::new)
    }

    async fn create<K: Declared>(&self, object: &K) -> Result<(), StoreError> {
        let namespace = object.namespace().unwrap_or_default();
        K::api(self.client.clone(), &namespace)
            .create(&PostParams::default(), object)
            .await
            .map_err(StoreError::new)?;
        Ok(())
    }

    async fn update<K: Declared>(&self, object: &K) -> Result<(), StoreError> {
        let namespace = object.namespace().unwrap_or_default();
        K::api(self.client.clone(), &namespace)
            .replace(&object.name_any(), &PostParams::default(), object)
            .await
            .map_err(StoreError::new)?;
        Ok(())
    }

    async fn get_namespace(&self, name: &str) -> Result<Option<Namespace>, StoreError> {
        Api::<Namespace>::all(self.client.clone())
            .get_opt(name)
            .await
            .map_err(StoreError::new)
    }

    async fn list_namespaces(&self) -> Result<Vec<Namespace>, StoreError> {
        let list = Api::<Namespace>::all(self.client.clone())
            .list(&ListParams::default())
            .await
            .map_err(StoreError::new)?;
        Ok(list.items)
    }

    async fn get_config(&self, name: &str) -> Result<Option<NamespaceConfig>, StoreError> {
        Api::<NamespaceConfig>::all(self.client.clone())
            .get_opt(name)
            .await
            .map_err(StoreError::new)
    }

    async fn list_configs(&self) -> Result<Vec<NamespaceConfig>, StoreError> {
        let list = Api::<NamespaceConfig>::all(self.client.clone())
            .list(&ListParams::default())
            .await
            .map_err(StoreError::new)?;
        Ok(list.items)
    }
}
