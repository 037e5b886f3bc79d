use crate::{
    declared::{Declared, DeclaredKind},
    owner::{set_controller_reference, OwnershipError},
    store::{ObjectStore, StoreError},
};
use namespace_config_controller_k8s_api::{
    ClusterRoleBinding, ConfigMap, LimitRange, Namespace, NamespaceConfig, NetworkPolicy,
    ObjectMeta, PodPreset, ResourceExt, ResourceQuota, RoleBinding, ServiceAccount,
};
use std::fmt;
use thiserror::Error;
use tracing::{debug, info};

/// A failure to apply a single declared object.
///
/// `namespace` is the namespace being reconciled. For cluster-scoped kinds it
/// is not the object's namespace.
#[derive(Debug)]
pub struct ApplyError {
    pub kind: DeclaredKind,
    pub name: String,
    pub namespace: String,
    pub cause: ApplyCause,
}

#[derive(Debug, Error)]
pub enum ApplyCause {
    #[error("failed to set owner: {0}")]
    Ownership(#[from] OwnershipError),

    #[error("failed to read: {0}")]
    Read(#[source] StoreError),

    #[error("failed to create: {0}")]
    Create(#[source] StoreError),

    #[error("failed to update: {0}")]
    Update(#[source] StoreError),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Write {
    Created,
    Updated,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Applied {
    pub kind: DeclaredKind,
    pub name: String,
    pub namespace: String,
    pub write: Write,
}

/// The result of applying configuration to a namespace. Every declared object
/// is attempted; failures are collected rather than returned early.
#[derive(Debug, Default)]
pub struct ApplyOutcome {
    applied: Vec<Applied>,
    errors: Vec<ApplyError>,
}

/// Upserts a copy of `declared` into `namespace`, owned by `owner`.
///
/// The declaration itself is never modified. If the object cannot be owned,
/// nothing is written. If it cannot be read for a reason other than being
/// absent, nothing is written.
pub async fn apply<K, S>(
    store: &S,
    owner: &NamespaceConfig,
    declared: &K,
    namespace: &str,
) -> Result<Write, ApplyError>
where
    K: Declared,
    S: ObjectStore + ?Sized,
{
    let name = declared.meta().name.clone().unwrap_or_default();
    let err = |cause: ApplyCause| ApplyError {
        kind: K::KIND,
        name: name.clone(),
        namespace: namespace.to_string(),
        cause,
    };

    let mut object = declared.clone();
    let namespaced = K::KIND.is_namespaced();
    {
        let meta = object.meta_mut();
        clear_server_fields(meta);
        meta.namespace = namespaced.then(|| namespace.to_string());
        set_controller_reference(owner, meta, namespaced)
            .map_err(|error| err(error.into()))?;
    }

    let scope = namespaced.then_some(namespace);
    match store.get::<K>(scope, &name).await {
        Ok(None) => {
            debug!(kind = %K::KIND, %name, %namespace, "Creating");
            store
                .create(&object)
                .await
                .map_err(|error| err(ApplyCause::Create(error)))?;
            Ok(Write::Created)
        }
        Ok(Some(_)) => {
            debug!(kind = %K::KIND, %name, %namespace, "Updating");
            store
                .update(&object)
                .await
                .map_err(|error| err(ApplyCause::Update(error)))?;
            Ok(Write::Updated)
        }
        Err(error) => Err(err(ApplyCause::Read(error))),
    }
}

/// Applies every object declared by `config` to `namespace`.
pub async fn apply_config<S>(
    store: &S,
    config: &NamespaceConfig,
    namespace: &Namespace,
) -> ApplyOutcome
where
    S: ObjectStore + ?Sized,
{
    let namespace = namespace.name_any();
    debug!(config = %config.name_any(), %namespace, "Applying configuration");

    let mut outcome = ApplyOutcome::default();
    apply_all::<NetworkPolicy, _>(store, config, &namespace, &mut outcome).await;
    apply_all::<ConfigMap, _>(store, config, &namespace, &mut outcome).await;
    apply_all::<LimitRange, _>(store, config, &namespace, &mut outcome).await;
    apply_all::<ClusterRoleBinding, _>(store, config, &namespace, &mut outcome).await;
    apply_all::<PodPreset, _>(store, config, &namespace, &mut outcome).await;
    apply_all::<ResourceQuota, _>(store, config, &namespace, &mut outcome).await;
    apply_all::<RoleBinding, _>(store, config, &namespace, &mut outcome).await;
    apply_all::<ServiceAccount, _>(store, config, &namespace, &mut outcome).await;
    outcome
}

async fn apply_all<K, S>(
    store: &S,
    config: &NamespaceConfig,
    namespace: &str,
    outcome: &mut ApplyOutcome,
) where
    K: Declared,
    S: ObjectStore + ?Sized,
{
    let declared = K::declared(&config.spec);
    if declared.is_empty() {
        return;
    }
    debug!(kind = %K::KIND, count = declared.len(), %namespace, "Applying declared objects");

    for object in declared {
        match apply(store, config, object, namespace).await {
            Ok(write) => outcome.applied.push(Applied {
                kind: K::KIND,
                name: object.name_any(),
                namespace: namespace.to_string(),
                write,
            }),
            Err(error) => {
                info!(%error, "Failed to apply");
                outcome.errors.push(error);
            }
        }
    }
}

// Metadata copied verbatim from a live object would make creates fail and
// turn replaces into conditional updates.
fn clear_server_fields(meta: &mut ObjectMeta) {
    meta.resource_version = None;
    meta.uid = None;
    meta.creation_timestamp = None;
    meta.deletion_timestamp = None;
    meta.deletion_grace_period_seconds = None;
    meta.generation = None;
    meta.managed_fields = None;
    meta.self_link = None;
}

// === impl ApplyError ===

impl fmt::Display for ApplyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self {
            kind,
            name,
            namespace,
            cause,
        } = self;
        if kind.is_namespaced() {
            write!(f, "{kind} {namespace}/{name}: {cause}")
        } else {
            write!(f, "{kind} {name} (for namespace {namespace}): {cause}")
        }
    }
}

impl std::error::Error for ApplyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.cause)
    }
}

// === impl ApplyCause ===

impl ApplyCause {
    /// A short name for the step that failed.
    pub fn step(&self) -> &'static str {
        match self {
            Self::Ownership(_) => "ownership",
            Self::Read(_) => "read",
            Self::Create(_) => "create",
            Self::Update(_) => "update",
        }
    }
}

// === impl ApplyOutcome ===

impl ApplyOutcome {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn applied(&self) -> &[Applied] {
        &self.applied
    }

    pub fn errors(&self) -> &[ApplyError] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<ApplyError> {
        self.errors
    }

    pub fn extend(&mut self, other: ApplyOutcome) {
        self.applied.extend(other.applied);
        self.errors.extend(other.errors);
    }
}

impl fmt::Display for ApplyOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} applied, {} failed",
            self.applied.len(),
            self.errors.len()
        )?;
        for error in &self.errors {
            write!(f, "; {error}")?;
        }
        Ok(())
    }
}
