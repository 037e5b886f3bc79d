use crate::{
    core::{self, ReconcileError, Reconciled},
    k8s::{Api, Client, Namespace, NamespaceConfig, Pod, ResourceExt},
    metrics::ControllerMetrics,
    store::KubeStore,
};
use futures::prelude::*;
use kube::runtime::{controller::Action, watcher, Controller};
use std::{sync::Arc, time::Duration};
use tracing::{debug, info_span, instrument, warn, Instrument};

const NAMESPACES: &str = "namespaces";
const NAMESPACE_CONFIGS: &str = "namespaceconfigs";

/// Determines how a pass that finished with per-object apply errors is
/// reported to the work queue.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ApplyErrorPolicy {
    /// Report success; errors are only logged and counted.
    #[default]
    Ignore,

    /// Report failure so that the request is retried.
    Requeue,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Reconcile(#[from] ReconcileError),

    #[error("{count} declared objects failed to apply")]
    Apply { count: usize },
}

/// Decides what each finished pass means for the work queue.
#[derive(Clone, Debug)]
pub struct Policy {
    apply_errors: ApplyErrorPolicy,
    requeue_after: Duration,
    metrics: ControllerMetrics,
}

struct Context {
    store: KubeStore,
    policy: Policy,
}

/// Spawns the namespace-triggered and configuration-triggered controllers.
pub fn spawn(client: Client, policy: Policy, pod_triggers: bool) {
    let ctx = Arc::new(Context {
        store: KubeStore::new(client.clone()),
        policy,
    });

    let mut namespaces = Controller::new(
        Api::<Namespace>::all(client.clone()),
        watcher::Config::default(),
    );
    let mut configs = Controller::new(
        Api::<NamespaceConfig>::all(client.clone()),
        watcher::Config::default(),
    );
    if pod_triggers {
        namespaces = namespaces.owns(Api::<Pod>::all(client.clone()), watcher::Config::default());
        configs = configs.owns(Api::<Pod>::all(client), watcher::Config::default());
    }

    tokio::spawn(
        namespaces
            .run(reconcile_namespace, error_policy, ctx.clone())
            .for_each(log_result)
            .instrument(info_span!("namespaces")),
    );
    tokio::spawn(
        configs
            .run(reconcile_config, error_policy, ctx)
            .for_each(log_result)
            .instrument(info_span!("namespaceconfigs")),
    );
}

#[instrument(skip_all, fields(namespace = %ns.name_any()))]
async fn reconcile_namespace(ns: Arc<Namespace>, ctx: Arc<Context>) -> Result<Action, Error> {
    let result = core::reconcile_namespace(&ctx.store, &ns.name_any()).await;
    ctx.policy.finish(NAMESPACES, result)
}

#[instrument(skip_all, fields(config = %config.name_any()))]
async fn reconcile_config(
    config: Arc<NamespaceConfig>,
    ctx: Arc<Context>,
) -> Result<Action, Error> {
    let result = core::reconcile_config(&ctx.store, &config.name_any()).await;
    ctx.policy.finish(NAMESPACE_CONFIGS, result)
}

fn error_policy<K>(object: Arc<K>, error: &Error, ctx: Arc<Context>) -> Action
where
    K: ResourceExt,
{
    warn!(name = %object.name_any(), %error, "Reconcile failed");
    ctx.policy.on_error()
}

async fn log_result<T, E>(result: Result<T, E>)
where
    T: std::fmt::Debug,
    E: std::fmt::Display,
{
    match result {
        Ok(reconciled) => debug!(?reconciled),
        Err(error) => debug!(%error, "Controller error"),
    }
}

// === impl Policy ===

impl Policy {
    pub fn new(
        apply_errors: ApplyErrorPolicy,
        requeue_after: Duration,
        metrics: ControllerMetrics,
    ) -> Self {
        Self {
            apply_errors,
            requeue_after,
            metrics,
        }
    }

    fn finish(
        &self,
        controller: &'static str,
        result: Result<Option<Reconciled>, ReconcileError>,
    ) -> Result<Action, Error> {
        let failed = match result {
            Ok(None) => 0,
            Ok(Some(reconciled)) => {
                self.metrics.record_outcome(controller, reconciled.outcome());
                reconciled.outcome().errors().len()
            }
            Err(error) => {
                self.metrics.reconciled(controller, false);
                return Err(error.into());
            }
        };
        self.metrics.reconciled(controller, failed == 0);
        self.decide(failed)
    }

    fn decide(&self, failed: usize) -> Result<Action, Error> {
        if failed > 0 && self.apply_errors == ApplyErrorPolicy::Requeue {
            return Err(Error::Apply { count: failed });
        }
        Ok(Action::await_change())
    }

    fn on_error(&self) -> Action {
        Action::requeue(self.requeue_after)
    }
}
