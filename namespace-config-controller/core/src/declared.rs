use namespace_config_controller_k8s_api::{
    Api, Client, ClusterRoleBinding, ConfigMap, LimitRange, NamespaceConfigSpec, NetworkPolicy,
    PodPreset, Resource, ResourceQuota, RoleBinding, ServiceAccount,
};
use serde::{de::DeserializeOwned, Serialize};
use std::fmt;

/// The kinds of objects a `NamespaceConfig` may declare.
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum DeclaredKind {
    NetworkPolicy,
    ConfigMap,
    ResourceQuota,
    LimitRange,
    RoleBinding,
    ClusterRoleBinding,
    PodPreset,
    ServiceAccount,
}

/// An object kind that can be upserted from a `NamespaceConfig`.
///
/// Each implementation is a row in the table of supported kinds: where the
/// declarations live in the spec and how the kind is addressed in the API.
pub trait Declared:
    Resource<DynamicType = ()>
    + Clone
    + fmt::Debug
    + Serialize
    + DeserializeOwned
    + Send
    + Sync
    + 'static
{
    const KIND: DeclaredKind;

    fn declared(spec: &NamespaceConfigSpec) -> &[Self];

    /// Builds an API handle for objects of this kind in `namespace`. The
    /// namespace is ignored for cluster-scoped kinds.
    fn api(client: Client, namespace: &str) -> Api<Self>;
}

// === impl DeclaredKind ===

impl DeclaredKind {
    pub const ALL: [Self; 8] = [
        Self::NetworkPolicy,
        Self::ConfigMap,
        Self::ResourceQuota,
        Self::LimitRange,
        Self::RoleBinding,
        Self::ClusterRoleBinding,
        Self::PodPreset,
        Self::ServiceAccount,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NetworkPolicy => "NetworkPolicy",
            Self::ConfigMap => "ConfigMap",
            Self::ResourceQuota => "ResourceQuota",
            Self::LimitRange => "LimitRange",
            Self::RoleBinding => "RoleBinding",
            Self::ClusterRoleBinding => "ClusterRoleBinding",
            Self::PodPreset => "PodPreset",
            Self::ServiceAccount => "ServiceAccount",
        }
    }

    pub fn is_namespaced(&self) -> bool {
        !matches!(self, Self::ClusterRoleBinding)
    }
}

impl fmt::Display for DeclaredKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// === impl Declared ===

macro_rules! namespaced {
    ($ty:ident, $field:ident) => {
        impl Declared for $ty {
            const KIND: DeclaredKind = DeclaredKind::$ty;

            fn declared(spec: &NamespaceConfigSpec) -> &[Self] {
                &spec.$field
            }

            fn api(client: Client, namespace: &str) -> Api<Self> {
                Api::namespaced(client, namespace)
            }
        }
    };
}

namespaced!(NetworkPolicy, network_policies);
namespaced!(ConfigMap, configmaps);
namespaced!(ResourceQuota, quotas);
namespaced!(LimitRange, limit_ranges);
namespaced!(RoleBinding, role_bindings);
namespaced!(PodPreset, pod_presets);
namespaced!(ServiceAccount, service_accounts);

impl Declared for ClusterRoleBinding {
    const KIND: DeclaredKind = DeclaredKind::ClusterRoleBinding;

    fn declared(spec: &NamespaceConfigSpec) -> &[Self] {
        &spec.cluster_role_bindings
    }

    fn api(client: Client, _namespace: &str) -> Api<Self> {
        Api::all(client)
    }
}
