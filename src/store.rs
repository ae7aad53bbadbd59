//! Consent storage infrastructure.
//!
//! The consent signal is written redundantly to two independent backends:
//! - [`CookieJarStore`]: scoped, expiring records modeled after a browser
//!   cookie jar. Server-readable, therefore authoritative at merge time.
//! - [`LocalValueStore`]: plain key/value records with no expiry, modeled
//!   after `localStorage`.
//!
//! Both implement the same [`ConsentStore`] capability so the reconciler can
//! merge and fan out without per-backend logic.
//!
//! ## Design notes
//! - Stores are `Send + Sync` and internally synchronized; trait methods take
//!   `&self`.
//! - Reads **fail soft**: absent, expired, or unparseable backing data reads
//!   as `None`, never an error. A backend that cannot be read at all behaves
//!   like an empty one.
//! - Writes return `Result` so callers can decide how much a failure matters;
//!   for the consent engine every write is best-effort.

mod cookie;
mod local;

use anyhow::Result;
use std::sync::Arc;

pub use cookie::CookieJarStore;
pub use local::LocalValueStore;

/// Key under which the selected cookie category is stored.
pub const KEY_CONSENT: &str = "cookie-consent";
/// Key under which the analytics opt-in flag is stored (`"true"`/`"false"`).
pub const KEY_ANALYTICS: &str = "cookie-analytics";
/// Key under which the decision timestamp is stored (RFC 3339).
pub const KEY_DECIDED_AT: &str = "cookie-consent-date";

/// Object-safe key/value capability shared by both consent backends.
pub trait ConsentStore: Send + Sync {
    /// Retrieves the value for `key`, or `None` if it is absent, expired, or
    /// unreadable.
    fn read(&self, key: &str) -> Option<String>;

    /// Sets the value for `key`, overwriting any existing value.
    fn write(&self, key: &str, value: &str) -> Result<()>;
}

/// A handle to a type-erased consent store.
pub type ConsentStoreHandle = Arc<dyn ConsentStore>;
