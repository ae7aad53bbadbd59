//! Consent engine facade.
//!
//! Ties the reconciler, the analytics gate, and the remote reporter together
//! behind the operations a UI collaborator calls. The engine renders nothing;
//! it owns the session's [`ConsentState`] and keeps both storage backends and
//! the analytics side effect consistent with it.
//!
//! All operations run synchronously to completion on the caller's thread.
//! The only detached work is the best-effort remote report.

use std::sync::Arc;

use crate::analytics::{AnalyticsGate, AnalyticsSink};
use crate::config::ConsentConfig;
use crate::decision::{ConsentCategory, ConsentDecision};
use crate::events::{ConsentBus, ConsentCommand, ConsentEvent, Subscription};
use crate::reconciler::ConsentReconciler;
use crate::state::ConsentState;
use crate::store::ConsentStoreHandle;
use crate::sync::{RemoteSync, TokenSource};

pub struct ConsentEngine {
    state: ConsentState,
    reconciler: ConsentReconciler,
    gate: AnalyticsGate,
    sync: Option<RemoteSync>,
    bus: ConsentBus,
}

impl ConsentEngine {
    /// Creates the engine and reconciles both backends into the initial
    /// state.
    ///
    /// If `config` is `None`, [`ConsentConfig::default`] is used. Remote
    /// reporting is active only when the config carries an endpoint. A stored
    /// opt-in loads analytics immediately, before any user interaction.
    pub fn new(
        config: Option<ConsentConfig>,
        cookie: ConsentStoreHandle,
        local: ConsentStoreHandle,
        sink: Arc<dyn AnalyticsSink>,
        tokens: Arc<dyn TokenSource>,
    ) -> Self {
        let resolved_config = config.unwrap_or_default();
        let reconciler = ConsentReconciler::new(cookie, local);
        let gate = AnalyticsGate::new(sink);
        let sync = resolved_config
            .report_endpoint
            .map(|endpoint| RemoteSync::new(endpoint, tokens));

        let state = reconciler.load();
        let bus = ConsentBus::default();
        if gate.evaluate(&state) {
            bus.publish(ConsentEvent::AnalyticsLoaded);
        }

        Self {
            state,
            reconciler,
            gate,
            sync,
            bus,
        }
    }

    /// Current state snapshot. Read-only; mutations go through the
    /// operations below.
    pub fn state(&self) -> &ConsentState {
        &self.state
    }

    /// Subscribe to consent change notifications.
    pub fn subscribe(&self) -> Subscription {
        self.bus.subscribe()
    }

    /// User accepted all cookie categories.
    pub fn accept(&mut self) {
        self.save(ConsentCategory::All, true);
    }

    /// User declined everything but essential cookies.
    pub fn accept_essential_only(&mut self) {
        self.save(ConsentCategory::Essential, false);
    }

    /// User saved a custom selection from the preferences panel. Closes the
    /// panel as part of the save.
    pub fn save_custom(&mut self, analytics_enabled: bool) {
        self.save(ConsentCategory::Custom, analytics_enabled);
        if self.state.panel_visible() {
            self.state.set_panel_visible(false);
            self.bus.publish(ConsentEvent::PanelClosed);
        }
    }

    /// Shows the preferences panel. The panel never opens on its own, not
    /// even on a first visit; this call (or a [`ConsentCommand::OpenPanel`])
    /// is the only way in.
    pub fn open_panel(&mut self) {
        if !self.state.panel_visible() {
            self.state.set_panel_visible(true);
            self.bus.publish(ConsentEvent::PanelOpened);
        }
    }

    /// Hides the preferences panel without saving anything.
    pub fn close_panel(&mut self) {
        if self.state.panel_visible() {
            self.state.set_panel_visible(false);
            self.bus.publish(ConsentEvent::PanelClosed);
        }
    }

    /// Executes a command on behalf of an external collaborator, e.g. a
    /// page-level "open consent preferences" broadcast.
    pub fn handle_command(&mut self, command: ConsentCommand) {
        match command {
            ConsentCommand::OpenPanel => self.open_panel(),
        }
    }

    /// Save path shared by all three decision operations: build the immutable
    /// decision, persist it (cookie jar first), transition the state,
    /// re-evaluate the gate, then fire the detached report.
    fn save(&mut self, category: ConsentCategory, analytics_enabled: bool) {
        let decision = ConsentDecision::new(category, analytics_enabled);

        self.reconciler.persist(&decision);
        self.state.record(decision.clone());

        if self.gate.evaluate(&self.state) {
            self.bus.publish(ConsentEvent::AnalyticsLoaded);
        }
        if let Some(sync) = &self.sync {
            sync.report(&decision);
        }
        self.bus.publish(ConsentEvent::DecisionRecorded {
            category: decision.category(),
            analytics_enabled: decision.analytics_enabled(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{ConsentStore, LocalValueStore, KEY_ANALYTICS, KEY_CONSENT};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingSink {
        loads: AtomicUsize,
    }

    impl AnalyticsSink for CountingSink {
        fn load_instrumentation(&self) {
            self.loads.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct NoToken;
    impl TokenSource for NoToken {
        fn token(&self) -> Option<String> {
            None
        }
    }

    struct BrokenStore;
    impl ConsentStore for BrokenStore {
        fn read(&self, _key: &str) -> Option<String> {
            None
        }
        fn write(&self, _key: &str, _value: &str) -> anyhow::Result<()> {
            Err(anyhow::anyhow!("quota exceeded"))
        }
    }

    fn mem() -> ConsentStoreHandle {
        Arc::new(LocalValueStore::in_memory())
    }

    fn engine_with(
        cookie: ConsentStoreHandle,
        local: ConsentStoreHandle,
    ) -> (ConsentEngine, Arc<CountingSink>) {
        let sink = Arc::new(CountingSink::default());
        let engine = ConsentEngine::new(None, cookie, local, sink.clone(), Arc::new(NoToken));
        (engine, sink)
    }

    #[test]
    fn fresh_session_accept_all_flow() {
        let cookie = mem();
        let local = mem();
        let (mut engine, sink) = engine_with(cookie.clone(), local.clone());

        assert!(!engine.state().has_decision());
        assert!(!engine.state().panel_visible());

        engine.accept();

        let d = engine.state().decision().unwrap();
        assert_eq!(d.category(), ConsentCategory::All);
        assert!(d.analytics_enabled());
        for store in [&cookie, &local] {
            assert_eq!(store.read(KEY_CONSENT).as_deref(), Some("all"));
            assert_eq!(store.read(KEY_ANALYTICS).as_deref(), Some("true"));
        }
        assert_eq!(sink.loads.load(Ordering::SeqCst), 1);

        // Re-saving must not reload instrumentation.
        engine.accept();
        assert_eq!(sink.loads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn essential_only_never_enables_analytics() {
        let (mut engine, sink) = engine_with(mem(), mem());
        engine.accept();
        engine.accept_essential_only();

        let d = engine.state().decision().unwrap();
        assert_eq!(d.category(), ConsentCategory::Essential);
        assert!(!d.analytics_enabled());
        // Instrumentation loaded on the earlier opt-in stays loaded; the gate
        // just never fires again.
        assert_eq!(sink.loads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn essential_only_from_fresh_session_loads_nothing() {
        let (mut engine, sink) = engine_with(mem(), mem());
        engine.accept_essential_only();
        assert_eq!(sink.loads.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn stored_opt_in_loads_analytics_at_startup() {
        let cookie = mem();
        cookie.write(KEY_CONSENT, "all").unwrap();
        cookie.write(KEY_ANALYTICS, "true").unwrap();

        let (engine, sink) = engine_with(cookie, mem());
        assert!(engine.state().has_decision());
        assert!(!engine.state().panel_visible());
        assert_eq!(sink.loads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn save_custom_survives_local_store_failure() {
        let cookie = mem();
        let (mut engine, _) = engine_with(cookie.clone(), Arc::new(BrokenStore));

        engine.open_panel();
        engine.save_custom(true);

        assert!(engine.state().has_decision());
        assert_eq!(cookie.read(KEY_CONSENT).as_deref(), Some("custom"));
    }

    #[test]
    fn save_custom_closes_the_panel() {
        let (mut engine, _) = engine_with(mem(), mem());
        engine.open_panel();
        assert!(engine.state().panel_visible());

        engine.save_custom(false);
        assert!(!engine.state().panel_visible());
    }

    #[test]
    fn accept_leaves_the_panel_alone() {
        let (mut engine, _) = engine_with(mem(), mem());
        engine.open_panel();
        engine.accept();
        assert!(engine.state().panel_visible());
    }

    #[test]
    fn open_command_shows_the_panel() {
        let (mut engine, _) = engine_with(mem(), mem());
        engine.handle_command(ConsentCommand::OpenPanel);
        assert!(engine.state().panel_visible());

        engine.close_panel();
        assert!(!engine.state().panel_visible());
    }

    #[tokio::test]
    async fn operations_publish_events() {
        let (mut engine, _) = engine_with(mem(), mem());
        let mut rx = engine.subscribe();

        engine.open_panel();
        engine.save_custom(true);

        assert!(matches!(rx.recv().await.unwrap(), ConsentEvent::PanelOpened));
        assert!(matches!(rx.recv().await.unwrap(), ConsentEvent::AnalyticsLoaded));
        assert!(matches!(
            rx.recv().await.unwrap(),
            ConsentEvent::DecisionRecorded {
                category: ConsentCategory::Custom,
                analytics_enabled: true,
            }
        ));
        assert!(matches!(rx.recv().await.unwrap(), ConsentEvent::PanelClosed));
    }

    #[test]
    fn decision_survives_reload_from_cookie_alone() {
        let cookie = mem();
        let (mut engine, _) = engine_with(cookie.clone(), mem());
        engine.accept();

        // New session where the local store has failed entirely.
        let (reloaded, sink) = engine_with(cookie, Arc::new(BrokenStore));
        let d = reloaded.state().decision().unwrap();
        assert_eq!(d.category(), ConsentCategory::All);
        assert!(d.analytics_enabled());
        assert_eq!(sink.loads.load(Ordering::SeqCst), 1);
    }
}
