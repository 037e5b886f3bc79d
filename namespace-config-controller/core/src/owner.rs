use namespace_config_controller_k8s_api::{ObjectMeta, OwnerReference, Resource};
use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum OwnershipError {
    #[error("{kind} owner has no name")]
    MissingName { kind: String },

    #[error("{kind} owner {name} has no uid")]
    MissingUid { kind: String, name: String },

    #[error(
        "cluster-scoped resource must not have a namespace-scoped owner, owner's namespace {owner_namespace}"
    )]
    ClusterScopedDependent { owner_namespace: String },

    #[error(
        "cross-namespace owner references are disallowed, owner's namespace {owner_namespace}, obj's namespace {namespace}"
    )]
    CrossNamespace {
        owner_namespace: String,
        namespace: String,
    },

    #[error("object is already owned by another {kind} controller {name}")]
    AlreadyOwned { kind: String, name: String },
}

/// Marks `owner` as the managing controller of the object described by
/// `object`, enabling cascading deletion when the owner is removed.
///
/// A namespaced owner may only own objects in its own namespace. An object
/// that is already controlled by a different owner is left untouched.
pub fn set_controller_reference<O>(
    owner: &O,
    object: &mut ObjectMeta,
    namespaced: bool,
) -> Result<(), OwnershipError>
where
    O: Resource<DynamicType = ()>,
{
    let kind = O::kind(&()).into_owned();
    let meta = owner.meta();
    let name = meta
        .name
        .clone()
        .ok_or_else(|| OwnershipError::MissingName { kind: kind.clone() })?;
    let uid = meta.uid.clone().ok_or_else(|| OwnershipError::MissingUid {
        kind: kind.clone(),
        name: name.clone(),
    })?;

    if let Some(owner_namespace) = meta.namespace.as_deref().filter(|ns| !ns.is_empty()) {
        if !namespaced {
            return Err(OwnershipError::ClusterScopedDependent {
                owner_namespace: owner_namespace.to_string(),
            });
        }
        let namespace = object.namespace.as_deref().unwrap_or_default();
        if namespace != owner_namespace {
            return Err(OwnershipError::CrossNamespace {
                owner_namespace: owner_namespace.to_string(),
                namespace: namespace.to_string(),
            });
        }
    }

    let reference = OwnerReference {
        api_version: O::api_version(&()).into_owned(),
        kind,
        name,
        uid,
        controller: Some(true),
        block_owner_deletion: Some(true),
    };

    let refs = object.owner_references.get_or_insert_with(Vec::new);
    if let Some(other) = refs
        .iter()
        .find(|r| r.controller == Some(true) && !refers_to_same(r, &reference))
    {
        return Err(OwnershipError::AlreadyOwned {
            kind: other.kind.clone(),
            name: other.name.clone(),
        });
    }

    match refs.iter_mut().find(|r| refers_to_same(r, &reference)) {
        Some(existing) => *existing = reference,
        None => refs.push(reference),
    }
    Ok(())
}

// References are compared by group, kind and name; the version may differ.
fn refers_to_same(a: &OwnerReference, b: &OwnerReference) -> bool {
    fn group(api_version: &str) -> &str {
        api_version
            .split_once('/')
            .map(|(group, _)| group)
            .unwrap_or_default()
    }

    group(&a.api_version) == group(&b.api_version) && a.kind == b.kind && a.name == b.name
}

#[cfg(test)]
mod tests {
    use super::*;
    use namespace_config_controller_k8s_api::{NamespaceConfig, NamespaceConfigSpec};

    fn mk_config(namespace: Option<&str>) -> NamespaceConfig {
        NamespaceConfig {
            metadata: ObjectMeta {
                name: Some("defaults".to_string()),
                namespace: namespace.map(Into::into),
                uid: Some("uid-defaults".to_string()),
                ..Default::default()
            },
            spec: NamespaceConfigSpec::default(),
        }
    }

    fn mk_meta(namespace: &str) -> ObjectMeta {
        ObjectMeta {
            name: Some("child".to_string()),
            namespace: Some(namespace.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn appends_controller_reference() {
        let mut meta = mk_meta("ns-0");
        meta.owner_references = Some(vec![OwnerReference {
            api_version: "apps/v1".to_string(),
            kind: "Deployment".to_string(),
            name: "web".to_string(),
            uid: "uid-web".to_string(),
            controller: None,
            block_owner_deletion: None,
        }]);

        set_controller_reference(&mk_config(None), &mut meta, true).expect("must set owner");

        let refs = meta.owner_references.expect("owner references must be set");
        assert_eq!(refs.len(), 2);
        assert_eq!(
            refs[1],
            OwnerReference {
                api_version: "namespaceconfig.systems/v1alpha1".to_string(),
                kind: "NamespaceConfig".to_string(),
                name: "defaults".to_string(),
                uid: "uid-defaults".to_string(),
                controller: Some(true),
                block_owner_deletion: Some(true),
            }
        );
    }

    #[test]
    fn replaces_reference_to_same_owner() {
        let config = mk_config(None);
        let mut meta = mk_meta("ns-0");
        meta.owner_references = Some(vec![OwnerReference {
            api_version: "namespaceconfig.systems/v1beta1".to_string(),
            kind: "NamespaceConfig".to_string(),
            name: "defaults".to_string(),
            uid: "stale-uid".to_string(),
            controller: Some(true),
            block_owner_deletion: None,
        }]);

        set_controller_reference(&config, &mut meta, true).expect("must set owner");
        set_controller_reference(&config, &mut meta, true).expect("must be idempotent");

        let refs = meta.owner_references.expect("owner references must be set");
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].uid, "uid-defaults");
        assert_eq!(refs[0].api_version, "namespaceconfig.systems/v1alpha1");
    }

    #[test]
    fn rejects_object_controlled_by_another_owner() {
        let mut meta = mk_meta("ns-0");
        meta.owner_references = Some(vec![OwnerReference {
            api_version: "namespaceconfig.systems/v1alpha1".to_string(),
            kind: "NamespaceConfig".to_string(),
            name: "other".to_string(),
            uid: "uid-other".to_string(),
            controller: Some(true),
            block_owner_deletion: Some(true),
        }]);
        let before = meta.clone();

        let err = set_controller_reference(&mk_config(None), &mut meta, true)
            .expect_err("must not steal ownership");
        assert_eq!(
            err,
            OwnershipError::AlreadyOwned {
                kind: "NamespaceConfig".to_string(),
                name: "other".to_string(),
            }
        );
        assert_eq!(meta, before);
    }

    #[test]
    fn namespaced_owner_scope_rules() {
        let config = mk_config(Some("ns-0"));

        set_controller_reference(&config, &mut mk_meta("ns-0"), true)
            .expect("same namespace must be allowed");

        assert_eq!(
            set_controller_reference(&config, &mut mk_meta("ns-1"), true),
            Err(OwnershipError::CrossNamespace {
                owner_namespace: "ns-0".to_string(),
                namespace: "ns-1".to_string(),
            })
        );

        assert_eq!(
            set_controller_reference(&config, &mut ObjectMeta::default(), false),
            Err(OwnershipError::ClusterScopedDependent {
                owner_namespace: "ns-0".to_string(),
            })
        );
    }

    #[test]
    fn cluster_scoped_owner_owns_anything() {
        let config = mk_config(None);
        set_controller_reference(&config, &mut mk_meta("ns-1"), true).expect("namespaced child");
        set_controller_reference(&config, &mut ObjectMeta::default(), false)
            .expect("cluster-scoped child");
    }

    #[test]
    fn owner_must_be_persisted() {
        let mut config = mk_config(None);
        config.metadata.uid = None;
        assert!(matches!(
            set_controller_reference(&config, &mut mk_meta("ns-0"), true),
            Err(OwnershipError::MissingUid { .. })
        ));
    }
}
