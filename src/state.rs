//! Session-lifetime consent state.
//!
//! [`ConsentState`] is the in-memory source of truth for the rest of the
//! application during one session. It is created by the reconciler at load
//! time and mutated only through the engine operations. Only the decision is
//! durable; the state object itself (and the panel flag) never outlives the
//! session.

use crate::decision::ConsentDecision;

/// In-memory consent state for one session.
///
/// Two states: `Undecided` (no decision) and `Decided` (holds a decision).
/// The only transition is `Undecided -> Decided` via a save operation; the
/// engine offers no way back. `panel_visible` is an orthogonal UI flag,
/// never persisted, always `false` after initialization.
#[derive(Debug, Clone, Default)]
pub struct ConsentState {
    decision: Option<ConsentDecision>,
    panel_visible: bool,
}

impl ConsentState {
    /// Fresh state with no recorded decision and the panel hidden.
    pub fn undecided() -> Self {
        Self::default()
    }

    /// State rebuilt from a stored decision. The panel starts hidden
    /// regardless of how the decision was recovered.
    pub fn decided(decision: ConsentDecision) -> Self {
        Self {
            decision: Some(decision),
            panel_visible: false,
        }
    }

    /// True iff a decision has been recorded in any backing store or made
    /// during this session.
    pub fn has_decision(&self) -> bool {
        self.decision.is_some()
    }

    pub fn decision(&self) -> Option<&ConsentDecision> {
        self.decision.as_ref()
    }

    pub fn panel_visible(&self) -> bool {
        self.panel_visible
    }

    /// Records a new decision, replacing any previous one. The old decision
    /// value is dropped, never edited.
    pub(crate) fn record(&mut self, decision: ConsentDecision) {
        self.decision = Some(decision);
    }

    pub(crate) fn set_panel_visible(&mut self, visible: bool) {
        self.panel_visible = visible;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decision::{ConsentCategory, ConsentDecision};

    #[test]
    fn undecided_starts_clean() {
        let s = ConsentState::undecided();
        assert!(!s.has_decision());
        assert!(s.decision().is_none());
        assert!(!s.panel_visible());
    }

    #[test]
    fn decided_hides_panel() {
        let s = ConsentState::decided(ConsentDecision::new(ConsentCategory::All, true));
        assert!(s.has_decision());
        assert!(!s.panel_visible());
    }

    #[test]
    fn record_replaces_decision() {
        let mut s = ConsentState::undecided();
        s.record(ConsentDecision::new(ConsentCategory::Essential, false));
        assert_eq!(s.decision().unwrap().category(), ConsentCategory::Essential);

        s.record(ConsentDecision::new(ConsentCategory::All, true));
        assert_eq!(s.decision().unwrap().category(), ConsentCategory::All);
        assert!(s.decision().unwrap().analytics_enabled());
    }
}
