use crate::{
    apply::{apply_config, ApplyOutcome},
    store::{ObjectStore, StoreError},
};
use namespace_config_controller_k8s_api::{
    Labels, Namespace, NamespaceConfig, ResourceExt, SelectorError,
};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Failures that abort an entire reconcile pass.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("failed to get {kind} {name}: {source}")]
    Get {
        kind: &'static str,
        name: String,
        source: StoreError,
    },

    #[error("failed to list {kind}: {source}")]
    List {
        kind: &'static str,
        source: StoreError,
    },

    #[error("NamespaceConfig {name} has an invalid selector: {source}")]
    Selector { name: String, source: SelectorError },
}

/// The result of one reconcile pass.
#[derive(Debug, Default)]
pub struct Reconciled {
    targets: Vec<String>,
    outcome: ApplyOutcome,
}

/// Applies every `NamespaceConfig` that selects the namespace `name`.
///
/// Returns `Ok(None)` when the namespace no longer exists; objects created for
/// it are cleaned up by the garbage collector, not here.
pub async fn reconcile_namespace<S>(
    store: &S,
    name: &str,
) -> Result<Option<Reconciled>, ReconcileError>
where
    S: ObjectStore + ?Sized,
{
    let namespace = match store.get_namespace(name).await {
        Ok(Some(namespace)) => namespace,
        Ok(None) => {
            debug!(namespace = %name, "Namespace not found");
            return Ok(None);
        }
        Err(source) => {
            return Err(ReconcileError::Get {
                kind: "Namespace",
                name: name.to_string(),
                source,
            })
        }
    };

    let configs = selecting_configs(store, &namespace).await?;
    debug!(namespace = %name, configs = configs.len(), "Found matching configurations");

    let mut reconciled = Reconciled::default();
    for config in &configs {
        let outcome = apply_config(store, config, &namespace).await;
        reconciled.push(config.name_any(), outcome);
    }

    reconciled.report("namespace", name);
    Ok(Some(reconciled))
}

/// Applies the `NamespaceConfig` `name` to every namespace it selects.
///
/// Returns `Ok(None)` when the configuration no longer exists.
pub async fn reconcile_config<S>(
    store: &S,
    name: &str,
) -> Result<Option<Reconciled>, ReconcileError>
where
    S: ObjectStore + ?Sized,
{
    let config = match store.get_config(name).await {
        Ok(Some(config)) => config,
        Ok(None) => {
            debug!(config = %name, "NamespaceConfig not found");
            return Ok(None);
        }
        Err(source) => {
            return Err(ReconcileError::Get {
                kind: "NamespaceConfig",
                name: name.to_string(),
                source,
            })
        }
    };

    let selector = config
        .spec
        .selector()
        .map_err(|source| ReconcileError::Selector {
            name: name.to_string(),
            source,
        })?;

    let namespaces = store
        .list_namespaces()
        .await
        .map_err(|source| ReconcileError::List {
            kind: "Namespace",
            source,
        })?;

    let mut reconciled = Reconciled::default();
    for namespace in namespaces
        .iter()
        .filter(|ns| selector.matches(&Labels::of(*ns)))
    {
        let outcome = apply_config(store, &config, namespace).await;
        reconciled.push(namespace.name_any(), outcome);
    }

    reconciled.report("config", name);
    Ok(Some(reconciled))
}

async fn selecting_configs<S>(
    store: &S,
    namespace: &Namespace,
) -> Result<Vec<NamespaceConfig>, ReconcileError>
where
    S: ObjectStore + ?Sized,
{
    let configs = store
        .list_configs()
        .await
        .map_err(|source| ReconcileError::List {
            kind: "NamespaceConfig",
            source,
        })?;

    let labels = Labels::of(namespace);
    let mut selected = Vec::new();
    for config in configs {
        let selector = config
            .spec
            .selector()
            .map_err(|source| ReconcileError::Selector {
                name: config.name_any(),
                source,
            })?;
        if selector.matches(&labels) {
            selected.push(config);
        }
    }
    Ok(selected)
}

// === impl Reconciled ===

impl Reconciled {
    /// The names of the counterparts the pass applied: configurations for a
    /// namespace pass, namespaces for a configuration pass.
    pub fn targets(&self) -> &[String] {
        &self.targets
    }

    pub fn outcome(&self) -> &ApplyOutcome {
        &self.outcome
    }

    pub fn into_outcome(self) -> ApplyOutcome {
        self.outcome
    }

    fn push(&mut self, target: String, outcome: ApplyOutcome) {
        self.targets.push(target);
        self.outcome.extend(outcome);
    }

    fn report(&self, trigger: &'static str, name: &str) {
        if self.outcome.is_ok() {
            info!(
                %trigger,
                %name,
                targets = ?self.targets,
                applied = self.outcome.applied().len(),
                "Reconciled without errors"
            );
        } else {
            warn!(
                %trigger,
                %name,
                targets = ?self.targets,
                outcome = %self.outcome,
                "Reconciled with errors"
            );
        }
    }
}
