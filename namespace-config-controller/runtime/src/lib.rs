pub use namespace_config_controller_core as core;
pub use namespace_config_controller_k8s_api as k8s;

mod args;
mod controller;
mod metrics;
mod store;

pub use self::{
    args::Args,
    controller::{ApplyErrorPolicy, Error, Policy},
    metrics::ControllerMetrics,
    store::KubeStore,
};
