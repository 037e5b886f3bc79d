use crate::{
    controller::{self, ApplyErrorPolicy, Policy},
    metrics::ControllerMetrics,
};
use anyhow::{bail, Result};
use clap::Parser;
use prometheus_client::registry::Registry;
use std::time::Duration;
use tracing::info;

#[derive(Debug, Parser)]
#[clap(
    name = "namespace-config",
    about = "Applies NamespaceConfig resources to the namespaces they select"
)]
pub struct Args {
    #[clap(
        long,
        default_value = "namespace_config=info,warn",
        env = "NAMESPACE_CONFIG_CONTROLLER_LOG"
    )]
    log_level: kubert::LogFilter,

    #[clap(long, default_value = "plain")]
    log_format: kubert::LogFormat,

    #[clap(flatten)]
    client: kubert::ClientArgs,

    #[clap(flatten)]
    admin: kubert::AdminArgs,

    /// How to report a pass in which some declared objects failed to apply.
    #[clap(long, value_enum, default_value = "ignore")]
    apply_error_policy: ApplyErrorPolicy,

    /// Seconds to wait before retrying a pass that failed outright.
    #[clap(long, default_value = "5")]
    error_requeue_secs: u64,

    /// Disables reconciling when a pod owned by a namespace or a
    /// NamespaceConfig changes.
    #[clap(long)]
    pod_triggers_disabled: bool,
}

impl Args {
    #[inline]
    pub async fn parse_and_run() -> Result<()> {
        Self::parse().run().await
    }

    pub async fn run(self) -> Result<()> {
        let Self {
            admin,
            client,
            log_level,
            log_format,
            apply_error_policy,
            error_requeue_secs,
            pod_triggers_disabled,
        } = self;

        let mut prom = <Registry>::default();
        let metrics =
            ControllerMetrics::register(prom.sub_registry_with_prefix("namespace_config"));
        let rt_metrics = kubert::RuntimeMetrics::register(prom.sub_registry_with_prefix("kube"));

        let runtime = kubert::Runtime::builder()
            .with_log(log_level, log_format)
            .with_metrics(rt_metrics)
            .with_admin(admin.into_builder().with_prometheus(prom))
            .with_client(client)
            .build()
            .await?;

        info!(
            version = env!("CARGO_PKG_VERSION"),
            ?apply_error_policy,
            pod_triggers = !pod_triggers_disabled,
            "Starting namespace-config-controller"
        );

        let policy = Policy::new(
            apply_error_policy,
            Duration::from_secs(error_requeue_secs),
            metrics,
        );
        controller::spawn(runtime.client(), policy, !pod_triggers_disabled);

        // Block the main thread on the shutdown signal.
        if runtime.run().await.is_err() {
            bail!("Aborted");
        }

        Ok(())
    }
}
