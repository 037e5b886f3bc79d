#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod labels;
pub mod namespace_config;
pub mod pod_preset;

pub use self::{
    labels::{Labels, Selector, SelectorError},
    namespace_config::{NamespaceConfig, NamespaceConfigSpec},
    pod_preset::{PodPreset, PodPresetSpec},
};
pub use k8s_openapi::{
    api::{
        self,
        core::v1::{ConfigMap, LimitRange, Namespace, Pod, ResourceQuota, ServiceAccount},
        networking::v1::NetworkPolicy,
        rbac::v1::{ClusterRoleBinding, RoleBinding},
    },
    apimachinery::{self, pkg::apis::meta::v1::OwnerReference},
};
pub use kube::{
    api::{Api, ListParams, ObjectMeta, PostParams, ResourceExt},
    Client, Error, Resource,
};
