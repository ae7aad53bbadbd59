//! Dual-backend consent reconciliation.
//!
//! The consent signal is written redundantly to the cookie jar and the local
//! store. The two backends are independent and never updated transactionally,
//! so this module owns the only logic that reads or writes both:
//!
//! - **load**: merge both backends into one [`ConsentState`]. The cookie jar
//!   wins any conflict because it is the server-readable backend. The losing
//!   backend is *not* repaired at read time; it converges on the next save.
//! - **persist**: fan a new decision out to both backends, cookie jar first.
//!   Both writes are best-effort; a failure is logged and swallowed so the
//!   state transition never depends on storage health.

use log::{debug, warn};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::decision::{ConsentCategory, ConsentDecision};
use crate::errors::ConsentError;
use crate::state::ConsentState;
use crate::store::{ConsentStoreHandle, KEY_ANALYTICS, KEY_CONSENT, KEY_DECIDED_AT};

/// One backend's view of the consent signal, parsed leniently: any field that
/// does not parse reads as absent.
#[derive(Debug)]
struct StoredRecord {
    category: ConsentCategory,
    analytics_enabled: bool,
    decided_at: Option<OffsetDateTime>,
}

impl StoredRecord {
    /// Reads the three consent keys from one backend. `None` when the
    /// category is absent or malformed; a record without a valid category is
    /// no record at all.
    fn load_from(store: &ConsentStoreHandle) -> Option<Self> {
        let raw = store.read(KEY_CONSENT)?;
        let Some(category) = ConsentCategory::parse(&raw) else {
            debug!(
                "{}",
                ConsentError::MalformedRecord {
                    key: KEY_CONSENT.to_string(),
                    value: raw,
                }
            );
            return None;
        };

        let analytics_enabled = match store.read(KEY_ANALYTICS).as_deref() {
            Some("true") => true,
            // "false", absent, or malformed all read as opted out.
            _ => false,
        };

        let decided_at = store
            .read(KEY_DECIDED_AT)
            .and_then(|s| OffsetDateTime::parse(&s, &Rfc3339).ok());

        Some(Self {
            category,
            analytics_enabled,
            decided_at,
        })
    }

    fn into_decision(self) -> ConsentDecision {
        // A missing or malformed timestamp falls back to load time; the
        // category and flag are still a usable decision.
        let decided_at = self.decided_at.unwrap_or_else(OffsetDateTime::now_utc);
        ConsentDecision::at(self.category, self.analytics_enabled, decided_at)
    }
}

/// Merges the two consent backends on load and fans writes out on save.
pub struct ConsentReconciler {
    cookie: ConsentStoreHandle,
    local: ConsentStoreHandle,
}

impl ConsentReconciler {
    pub fn new(cookie: ConsentStoreHandle, local: ConsentStoreHandle) -> Self {
        Self { cookie, local }
    }

    /// Merge both backends into a fresh session state.
    ///
    /// The cookie record wins whenever both backends hold one; the analytics
    /// flag and timestamp always come from the winning record, never mixed
    /// across backends. The panel is hidden regardless of the outcome.
    pub fn load(&self) -> ConsentState {
        let record = StoredRecord::load_from(&self.cookie)
            .or_else(|| StoredRecord::load_from(&self.local));

        match record {
            Some(record) => ConsentState::decided(record.into_decision()),
            None => ConsentState::undecided(),
        }
    }

    /// Write `decision` to both backends, cookie jar first.
    ///
    /// The cookie jar is authoritative, so it gets the first attempt and its
    /// outcome never depends on the local write. Either failure is logged and
    /// swallowed: with both backends down the decision still lives in memory
    /// for the rest of the session.
    pub fn persist(&self, decision: &ConsentDecision) {
        if let Err(e) = write_record(&self.cookie, decision) {
            warn!("consent cookie write failed: {e:#}");
        }
        if let Err(e) = write_record(&self.local, decision) {
            warn!("consent local write failed: {e:#}");
        }
    }
}

fn write_record(store: &ConsentStoreHandle, decision: &ConsentDecision) -> anyhow::Result<()> {
    store.write(KEY_CONSENT, decision.category().as_str())?;
    store.write(
        KEY_ANALYTICS,
        if decision.analytics_enabled() { "true" } else { "false" },
    )?;
    store.write(KEY_DECIDED_AT, &decision.decided_at_rfc3339())?;
    Ok(())
}
