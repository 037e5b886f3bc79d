#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

//! Applies `NamespaceConfig` resources to the namespaces they select.
//!
//! Reconciliation can be triggered from either side: a namespace changed
//! ([`reconcile_namespace`]) or a configuration changed ([`reconcile_config`]).
//! Both converge on [`apply_config`], which upserts every declared object into
//! the target namespace.

mod apply;
mod declared;
mod owner;
mod reconcile;
mod store;


pub use self::{
    apply::{apply, apply_config, Applied, ApplyCause, ApplyError, ApplyOutcome, Write},
    declared::{Declared, DeclaredKind},
    owner::{set_controller_reference, OwnershipError},
    reconcile::{reconcile_config, reconcile_namespace, ReconcileError, Reconciled},
    store::{ObjectStore, StoreError},
};
pub use namespace_config_controller_k8s_api as k8s;
