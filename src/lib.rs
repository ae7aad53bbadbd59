pub mod analytics;
pub mod config;
pub mod decision;
pub mod engine;
pub mod errors;
pub mod events;
pub mod reconciler;
pub mod state;
pub mod store;
pub mod sync;

pub use config::ConsentConfig;
pub use engine::*;
