//! Consent decision value types.
//!
//! A [`ConsentDecision`] is the immutable record of a single user choice:
//! which cookie category was selected, whether analytics may run, and when
//! the choice was made. Saving a new choice always builds a new value;
//! nothing in the engine mutates a decision after construction.

use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// Cookie category selected by the user.
///
/// Wire encoding (both storage backends and the report payload) is the
/// lowercase string form: `"essential"`, `"all"`, `"custom"`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ConsentCategory {
    Essential,
    All,
    Custom,
}

impl ConsentCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConsentCategory::Essential => "essential",
            ConsentCategory::All => "all",
            ConsentCategory::Custom => "custom",
        }
    }

    /// Parses the stored string form. Anything unknown is a malformed record
    /// and reads as `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "essential" => Some(ConsentCategory::Essential),
            "all" => Some(ConsentCategory::All),
            "custom" => Some(ConsentCategory::Custom),
            _ => None,
        }
    }
}

/// A single, immutable consent decision.
///
/// Invariant: `analytics_enabled` is always `false` when the category is
/// [`ConsentCategory::Essential`]. The constructor clamps the flag, so the
/// invariant holds for every construction path, including records
/// reconstructed from storage.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsentDecision {
    category: ConsentCategory,
    analytics_enabled: bool,
    decided_at: OffsetDateTime,
}

impl ConsentDecision {
    /// Builds a decision made right now.
    pub fn new(category: ConsentCategory, analytics_enabled: bool) -> Self {
        Self::at(category, analytics_enabled, OffsetDateTime::now_utc())
    }

    /// Builds a decision with an explicit timestamp. Used when rebuilding a
    /// decision from stored records.
    pub fn at(category: ConsentCategory, analytics_enabled: bool, decided_at: OffsetDateTime) -> Self {
        Self {
            category,
            // Essential-only consent can never carry an analytics opt-in.
            analytics_enabled: analytics_enabled && category != ConsentCategory::Essential,
            decided_at,
        }
    }

    pub fn category(&self) -> ConsentCategory {
        self.category
    }

    pub fn analytics_enabled(&self) -> bool {
        self.analytics_enabled
    }

    pub fn decided_at(&self) -> OffsetDateTime {
        self.decided_at
    }

    /// RFC 3339 form of the decision timestamp, as written to both stores and
    /// the report payload.
    pub fn decided_at_rfc3339(&self) -> String {
        self.decided_at
            .format(&Rfc3339)
            .unwrap_or_else(|_| String::new())
    }
}
