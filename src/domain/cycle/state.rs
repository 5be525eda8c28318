//! Cycle state as a set of tags.
//!
//! A cycle's condition is a small set of tags rather than a single status:
//! `stopped` and `unhealthy` coexist when a cycle halts on a fatal error.
//! The set is always replaced whole and renders as a sorted list.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::domain::foundation::ValidationError;

/// One state tag.
///
/// Declaration order matches the lexicographic order of the wire names so
/// that the derived `Ord` yields a sorted rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StateTag {
    #[serde(rename = "coolDown")]
    CoolDown,
    #[serde(rename = "running")]
    Running,
    #[serde(rename = "starting")]
    Starting,
    #[serde(rename = "stopped")]
    Stopped,
    #[serde(rename = "unhealthy")]
    Unhealthy,
}

impl StateTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            StateTag::CoolDown => "coolDown",
            StateTag::Running => "running",
            StateTag::Starting => "starting",
            StateTag::Stopped => "stopped",
            StateTag::Unhealthy => "unhealthy",
        }
    }
}

impl fmt::Display for StateTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validated set of state tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<StateTag>", into = "Vec<StateTag>")]
pub struct CycleState(BTreeSet<StateTag>);

impl CycleState {
    /// Builds a state from tags, enforcing the tag invariants.
    pub fn new(tags: impl IntoIterator<Item = StateTag>) -> Result<Self, ValidationError> {
        let tags: BTreeSet<StateTag> = tags.into_iter().collect();

        if tags.contains(&StateTag::Starting) && tags.contains(&StateTag::Running) {
            return Err(ValidationError::invalid_format(
                "state",
                "starting and running are mutually exclusive",
            ));
        }
        if tags.contains(&StateTag::Running) && tags.contains(&StateTag::Stopped) {
            return Err(ValidationError::invalid_format(
                "state",
                "a running cycle cannot be stopped",
            ));
        }

        Ok(Self(tags))
    }

    pub fn starting() -> Self {
        Self(BTreeSet::from([StateTag::Starting]))
    }

    pub fn running() -> Self {
        Self(BTreeSet::from([StateTag::Running]))
    }

    pub fn cool_down() -> Self {
        Self(BTreeSet::from([StateTag::CoolDown]))
    }

    pub fn stopped() -> Self {
        Self(BTreeSet::from([StateTag::Stopped]))
    }

    /// Terminal error state.
    pub fn unhealthy() -> Self {
        Self(BTreeSet::from([StateTag::Stopped, StateTag::Unhealthy]))
    }

    pub fn contains(&self, tag: StateTag) -> bool {
        self.0.contains(&tag)
    }

    pub fn is_stopped(&self) -> bool {
        self.contains(StateTag::Stopped)
    }

    pub fn is_unhealthy(&self) -> bool {
        self.contains(StateTag::Unhealthy)
    }

    /// Tags in sorted order.
    pub fn tags(&self) -> Vec<StateTag> {
        self.0.iter().copied().collect()
    }

    /// Wire names in sorted order.
    pub fn to_strings(&self) -> Vec<String> {
        self.0.iter().map(|t| t.as_str().to_string()).collect()
    }
}

impl Default for CycleState {
    fn default() -> Self {
        Self::stopped()
    }
}

impl TryFrom<Vec<StateTag>> for CycleState {
    type Error = ValidationError;

    fn try_from(tags: Vec<StateTag>) -> Result<Self, Self::Error> {
        CycleState::new(tags)
    }
}

impl From<CycleState> for Vec<StateTag> {
    fn from(state: CycleState) -> Self {
        state.tags()
    }
}

impl fmt::Display for CycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.to_strings().join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn unhealthy_renders_sorted() {
        assert_eq!(CycleState::unhealthy().to_strings(), vec!["stopped", "unhealthy"]);
    }

    #[test]
    fn starting_and_running_are_exclusive() {
        assert!(CycleState::new([StateTag::Starting, StateTag::Running]).is_err());
    }

    #[test]
    fn running_cannot_be_stopped() {
        assert!(CycleState::new([StateTag::Running, StateTag::Stopped]).is_err());
    }

    #[test]
    fn stopped_and_unhealthy_is_legal() {
        let state = CycleState::new([StateTag::Unhealthy, StateTag::Stopped]).unwrap();
        assert_eq!(state, CycleState::unhealthy());
    }

    #[test]
    fn serializes_as_sorted_list() {
        let json = serde_json::to_string(&CycleState::unhealthy()).unwrap();
        assert_eq!(json, r#"["stopped","unhealthy"]"#);
    }

    #[test]
    fn deserialization_deduplicates_and_validates() {
        let state: CycleState = serde_json::from_str(r#"["running","running"]"#).unwrap();
        assert_eq!(state.to_strings(), vec!["running"]);

        assert!(serde_json::from_str::<CycleState>(r#"["running","stopped"]"#).is_err());
        assert!(serde_json::from_str::<CycleState>(r#"["paused"]"#).is_err());
    }

    fn any_tag() -> impl Strategy<Value = StateTag> {
        prop_oneof![
            Just(StateTag::CoolDown),
            Just(StateTag::Running),
            Just(StateTag::Starting),
            Just(StateTag::Stopped),
            Just(StateTag::Unhealthy),
        ]
    }

    proptest! {
        #[test]
        fn accepted_states_render_sorted_without_duplicates(tags in prop::collection::vec(any_tag(), 0..8)) {
            if let Ok(state) = CycleState::new(tags) {
                let rendered = state.to_strings();
                let mut sorted = rendered.clone();
                sorted.sort();
                sorted.dedup();
                prop_assert_eq!(rendered, sorted);
                prop_assert!(!(state.contains(StateTag::Running) && state.is_stopped()));
                prop_assert!(!(state.contains(StateTag::Running) && state.contains(StateTag::Starting)));
            }
        }
    }
}
