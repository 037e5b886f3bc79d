use crate::{
    api::{
        core::v1::{ConfigMap, LimitRange, ResourceQuota, ServiceAccount},
        networking::v1::NetworkPolicy,
        rbac::v1::{ClusterRoleBinding, RoleBinding},
    },
    apimachinery::pkg::apis::meta::v1::LabelSelector,
    labels::{Selector, SelectorError},
    pod_preset::PodPreset,
};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Declares a set of objects that must exist in every namespace matched by
/// `selector`.
///
/// The declared objects carry a name but no namespace; the namespace is filled
/// in when the object is applied.
#[derive(Clone, Debug, Default, PartialEq, CustomResource, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "namespaceconfig.systems",
    version = "v1alpha1",
    kind = "NamespaceConfig",
    shortname = "nsconfig",
    derive = "Default",
    derive = "PartialEq"
)]
pub struct NamespaceConfigSpec {
    #[serde(default)]
    pub selector: LabelSelector,

    #[serde(default, rename = "networkpolicies", skip_serializing_if = "Vec::is_empty")]
    pub network_policies: Vec<NetworkPolicy>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub configmaps: Vec<ConfigMap>,

    #[serde(default, rename = "podpresets", skip_serializing_if = "Vec::is_empty")]
    pub pod_presets: Vec<PodPreset>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub quotas: Vec<ResourceQuota>,

    #[serde(default, rename = "limitranges", skip_serializing_if = "Vec::is_empty")]
    pub limit_ranges: Vec<LimitRange>,

    // Older resources were written with the misspelled `rolebingings` key.
    #[serde(
        default,
        rename = "rolebindings",
        alias = "rolebingings",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub role_bindings: Vec<RoleBinding>,

    #[serde(
        default,
        rename = "clusterrolebindings",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub cluster_role_bindings: Vec<ClusterRoleBinding>,

    #[serde(
        default,
        rename = "serviceaccounts",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub service_accounts: Vec<ServiceAccount>,
}

impl NamespaceConfigSpec {
    /// Builds the validated namespace selector.
    pub fn selector(&self) -> Result<Selector, SelectorError> {
        Selector::try_from(&self.selector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{labels::Labels, ObjectMeta};
    use maplit::btreemap;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_persisted_layout() {
        let config: NamespaceConfig = serde_json::from_value(serde_json::json!({
            "apiVersion": "namespaceconfig.systems/v1alpha1",
            "kind": "NamespaceConfig",
            "metadata": { "name": "prod-defaults" },
            "spec": {
                "selector": { "matchLabels": { "env": "prod" } },
                "configmaps": [{
                    "apiVersion": "v1",
                    "kind": "ConfigMap",
                    "metadata": { "name": "cm-a" },
                    "data": { "key": "value" },
                }],
                "rolebingings": [{
                    "apiVersion": "rbac.authorization.k8s.io/v1",
                    "kind": "RoleBinding",
                    "metadata": { "name": "viewers" },
                    "roleRef": {
                        "apiGroup": "rbac.authorization.k8s.io",
                        "kind": "ClusterRole",
                        "name": "view",
                    },
                }],
                "podpresets": [{
                    "apiVersion": "settings.k8s.io/v1alpha1",
                    "kind": "PodPreset",
                    "metadata": { "name": "proxy-env" },
                    "spec": { "env": [{ "name": "HTTP_PROXY", "value": "http://proxy:3128" }] },
                }],
            },
        }))
        .expect("config must parse");

        let spec = &config.spec;
        assert_eq!(spec.configmaps.len(), 1);
        assert_eq!(spec.configmaps[0].metadata.name.as_deref(), Some("cm-a"));
        assert_eq!(spec.role_bindings.len(), 1);
        assert_eq!(spec.role_bindings[0].role_ref.name, "view");
        assert_eq!(spec.pod_presets.len(), 1);
        assert!(spec.network_policies.is_empty());
        assert!(spec.service_accounts.is_empty());

        let selector = spec.selector().expect("selector must be valid");
        assert!(selector.matches(&Labels::from_iter([("env", "prod")])));
        assert!(!selector.matches(&Labels::from_iter([("env", "dev")])));
    }

    #[test]
    fn writes_corrected_role_binding_key() {
        let spec = NamespaceConfigSpec {
            role_bindings: vec![RoleBinding {
                metadata: ObjectMeta {
                    name: Some("viewers".to_string()),
                    ..Default::default()
                },
                ..Default::default()
            }],
            ..Default::default()
        };
        let value = serde_json::to_value(&spec).expect("spec must serialize");
        assert!(value.get("rolebindings").is_some());
        assert!(value.get("rolebingings").is_none());
        assert!(value.get("configmaps").is_none());
    }

    #[test]
    fn missing_selector_selects_everything() {
        let config: NamespaceConfig = serde_json::from_value(serde_json::json!({
            "apiVersion": "namespaceconfig.systems/v1alpha1",
            "kind": "NamespaceConfig",
            "metadata": { "name": "everywhere" },
            "spec": {},
        }))
        .expect("config must parse");
        let selector = config.spec.selector().expect("selector must be valid");
        assert!(selector.is_empty());
        assert!(selector.matches(&Labels::from(btreemap! {
            "anything".to_string() => "goes".to_string(),
        })));
    }
}
