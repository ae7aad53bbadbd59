use consent_engine::analytics::AnalyticsSink;
use consent_engine::events::ConsentCommand;
use consent_engine::store::{CookieJarStore, LocalValueStore};
use consent_engine::sync::TokenSource;
use consent_engine::{ConsentConfig, ConsentEngine};

use std::sync::Arc;

/// Stand-in for the real script injector a host application would provide.
struct PrintlnSink;

impl AnalyticsSink for PrintlnSink {
    fn load_instrumentation(&self) {
        println!("[analytics] instrumentation loaded");
    }
}

/// In a web host this token comes from a page-level meta tag.
struct StaticToken;

impl TokenSource for StaticToken {
    fn token(&self) -> Option<String> {
        Some("demo-csrf-token".to_string())
    }
}

#[tokio::main]
async fn main() {
    env_logger::init();

    let config = ConsentConfig {
        cookie_ttl_days: 365,
        // No endpoint configured: remote reporting stays off in this demo.
        report_endpoint: None,
    };

    // Both consent backends. The cookie jar is the authoritative one; the
    // local store is the redundancy layer. Swap in the `with_file` variants
    // to persist across runs.
    let cookie = Arc::new(CookieJarStore::in_memory(config.cookie_ttl_days));
    let local = Arc::new(LocalValueStore::in_memory());

    let mut engine = ConsentEngine::new(
        Some(config),
        cookie,
        local,
        Arc::new(PrintlnSink),
        Arc::new(StaticToken),
    );

    // Watch what the engine does. In a real host this drives UI updates.
    let mut events = engine.subscribe();
    let watcher = tokio::spawn(async move {
        while let Ok(ev) = events.recv().await {
            println!("[event] {ev:?}");
        }
    });

    println!(
        "fresh session: has_decision={}, panel_visible={}",
        engine.state().has_decision(),
        engine.state().panel_visible()
    );

    // A page-level broadcast asks for the preferences panel.
    engine.handle_command(ConsentCommand::OpenPanel);

    // The user saves a custom selection with analytics enabled. This writes
    // both backends, loads instrumentation once, and closes the panel.
    engine.save_custom(true);

    let decision = engine.state().decision().expect("decision just saved");
    println!(
        "decided: category={}, analytics={}, at={}",
        decision.category().as_str(),
        decision.analytics_enabled(),
        decision.decided_at_rfc3339()
    );

    // Give the watcher a moment to drain, then stop it.
    tokio::task::yield_now().await;
    watcher.abort();
}
