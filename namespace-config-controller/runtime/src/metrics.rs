use crate::core::{ApplyOutcome, DeclaredKind};
use prometheus_client::{
    encoding::EncodeLabelSet,
    metrics::{counter::Counter, family::Family},
    registry::Registry,
};

#[derive(Clone, Debug)]
pub struct ControllerMetrics {
    reconciles: Family<ReconcileLabels, Counter>,
    applied: Family<KindLabels, Counter>,
    apply_errors: Family<StepLabels, Counter>,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
struct ReconcileLabels {
    controller: &'static str,
    result: &'static str,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
struct KindLabels {
    controller: &'static str,
    kind: &'static str,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
struct StepLabels {
    controller: &'static str,
    kind: &'static str,
    step: &'static str,
}

// === impl ControllerMetrics ===

impl ControllerMetrics {
    pub fn register(reg: &mut Registry) -> Self {
        let reconciles = Family::<ReconcileLabels, Counter>::default();
        reg.register(
            "reconciles",
            "Count of reconcile passes by controller and result",
            reconciles.clone(),
        );

        let applied = Family::<KindLabels, Counter>::default();
        reg.register(
            "applied_objects",
            "Count of declared objects created or replaced",
            applied.clone(),
        );

        let apply_errors = Family::<StepLabels, Counter>::default();
        reg.register(
            "apply_errors",
            "Count of declared objects that could not be applied",
            apply_errors.clone(),
        );

        Self {
            reconciles,
            applied,
            apply_errors,
        }
    }

    pub(crate) fn reconciled(&self, controller: &'static str, ok: bool) {
        let result = if ok { "ok" } else { "error" };
        self.reconciles
            .get_or_create(&ReconcileLabels { controller, result })
            .inc();
    }

    pub(crate) fn record_outcome(&self, controller: &'static str, outcome: &ApplyOutcome) {
        for applied in outcome.applied() {
            self.applied_object(controller, applied.kind);
        }
        for error in outcome.errors() {
            self.apply_error(controller, error.kind, error.cause.step());
        }
    }

    fn applied_object(&self, controller: &'static str, kind: DeclaredKind) {
        self.applied
            .get_or_create(&KindLabels {
                controller,
                kind: kind.as_str(),
            })
            .inc();
    }

    fn apply_error(&self, controller: &'static str, kind: DeclaredKind, step: &'static str) {
        self.apply_errors
            .get_or_create(&StepLabels {
                controller,
                kind: kind.as_str(),
                step,
            })
            .inc();
    }
}
