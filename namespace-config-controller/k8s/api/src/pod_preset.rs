use crate::api::core::v1::{EnvFromSource, EnvVar, Volume, VolumeMount};
use crate::apimachinery::pkg::apis::meta::v1::LabelSelector;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// PodPreset injects environment, volumes and mounts into pods selected at
/// admission time.
///
/// The `settings.k8s.io/v1alpha1` API is no longer shipped by `k8s-openapi`, so
/// the type is described here. Clusters that do not serve it reject writes
/// like any other unknown kind.
#[derive(Clone, Debug, Default, PartialEq, CustomResource, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "settings.k8s.io",
    version = "v1alpha1",
    kind = "PodPreset",
    namespaced,
    derive = "Default",
    derive = "PartialEq"
)]
#[serde(rename_all = "camelCase")]
pub struct PodPresetSpec {
    /// Selects the pods the preset is injected into.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<LabelSelector>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env: Option<Vec<EnvVar>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env_from: Option<Vec<EnvFromSource>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volumes: Option<Vec<Volume>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_mounts: Option<Vec<VolumeMount>>,
}
