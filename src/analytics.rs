//! Analytics gating.
//!
//! Loading analytics instrumentation is the one side effect that hangs off
//! the consent outcome. The gate owns the only code path that triggers it:
//! instrumentation loads if and only if the current decision opts in, and at
//! most once per session no matter how often the gate is re-evaluated.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::debug;

use crate::state::ConsentState;

/// The injectable instrumentation loader (script injection, SDK init, ...).
/// Implementations must tolerate being called from any thread.
pub trait AnalyticsSink: Send + Sync {
    fn load_instrumentation(&self);
}

/// Idempotent trigger for the analytics side effect.
pub struct AnalyticsGate {
    sink: Arc<dyn AnalyticsSink>,
    fired: AtomicBool,
}

impl AnalyticsGate {
    pub fn new(sink: Arc<dyn AnalyticsSink>) -> Self {
        Self {
            sink,
            fired: AtomicBool::new(false),
        }
    }

    /// Re-evaluates the gate against the current state.
    ///
    /// Fires the sink only when a decision exists with analytics enabled, and
    /// only on the first such call. Returns whether the sink fired this call.
    pub fn evaluate(&self, state: &ConsentState) -> bool {
        let enabled = state
            .decision()
            .map(|d| d.analytics_enabled())
            .unwrap_or(false);
        if !enabled {
            return false;
        }

        // swap() guards against duplicate loads when evaluated repeatedly.
        if self.fired.swap(true, Ordering::SeqCst) {
            return false;
        }

        debug!("consent granted, loading analytics instrumentation");
        self.sink.load_instrumentation();
        true
    }

    /// Whether the instrumentation has been loaded this session.
    pub fn has_fired(&self) -> bool {
        self.fired.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decision::{ConsentCategory, ConsentDecision};
    use std::sync::atomic::AtomicUsize;

    #[derive(Default)]
    struct CountingSink {
        loads: AtomicUsize,
    }

    impl AnalyticsSink for CountingSink {
        fn load_instrumentation(&self) {
            self.loads.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn gate() -> (AnalyticsGate, Arc<CountingSink>) {
        let sink = Arc::new(CountingSink::default());
        (AnalyticsGate::new(sink.clone()), sink)
    }

    #[test]
    fn fires_once_for_opted_in_state() {
        let (gate, sink) = gate();
        let state = ConsentState::decided(ConsentDecision::new(ConsentCategory::All, true));

        assert!(gate.evaluate(&state));
        assert!(!gate.evaluate(&state));
        assert!(!gate.evaluate(&state));
        assert_eq!(sink.loads.load(Ordering::SeqCst), 1);
        assert!(gate.has_fired());
    }

    #[test]
    fn silent_noop_without_decision() {
        let (gate, sink) = gate();
        assert!(!gate.evaluate(&ConsentState::undecided()));
        assert_eq!(sink.loads.load(Ordering::SeqCst), 0);
        assert!(!gate.has_fired());
    }

    #[test]
    fn silent_noop_when_opted_out() {
        let (gate, sink) = gate();
        let state = ConsentState::decided(ConsentDecision::new(ConsentCategory::Essential, false));
        assert!(!gate.evaluate(&state));
        assert_eq!(sink.loads.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn opted_out_evaluations_do_not_burn_the_guard() {
        let (gate, sink) = gate();
        gate.evaluate(&ConsentState::undecided());

        let state = ConsentState::decided(ConsentDecision::new(ConsentCategory::Custom, true));
        assert!(gate.evaluate(&state));
        assert_eq!(sink.loads.load(Ordering::SeqCst), 1);
    }
}
