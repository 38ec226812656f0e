//! # Hook Names
//!
//! Plugins key their handlers by string. Each key is classified exactly once,
//! at registration, into one of three kinds:
//!
//! | Key | Kind | Runs |
//! |-----|------|------|
//! | `trackStart` | [`HookKind::Phase`] | in the shared start waterfall |
//! | `track` | [`HookKind::Delivery`] | once, on this plugin's private payload |
//! | `track:ga` | [`HookKind::Targeted`] | only while building the payload for `ga` |
//! | `trackComplete` | [`HookKind::Phase`] | in the shared complete waterfall |
//!
//! Dispatch code switches on [`HookKind`] and never re-parses strings.

use crate::error::HookNameError;
use std::{fmt, str::FromStr};

/// Separator between action and target namespace in targeted hooks.
pub const TARGET_SEPARATOR: char = ':';

/// A lifecycle phase that runs as a shared waterfall.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Runs before any delivery; produces the ready payload.
    Start,
    /// Runs after every delivery, seeded from the ready payload.
    Complete,
}

impl Phase {
    /// All phases, in execution order.
    pub const ALL: [Phase; 2] = [Phase::Start, Phase::Complete];

    /// The suffix appended to an action name.
    pub const fn suffix(self) -> &'static str {
        match self {
            Phase::Start => "Start",
            Phase::Complete => "Complete",
        }
    }

    /// The hook name for this phase of `action`, e.g. `trackStart`.
    pub fn hook_name(self, action: &str) -> String {
        format!("{action}{}", self.suffix())
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

/// The classification of a hook name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HookKind {
    /// `<action>Start` / `<action>Complete`.
    Phase(Phase),
    /// Exactly `<action>`.
    Delivery,
    /// `<action>:<target>`, carrying the target namespace.
    Targeted(String),
}

/// A classified hook name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HookName {
    raw: String,
    action: String,
    kind: HookKind,
}

impl HookName {
    /// Classify a raw hook key.
    ///
    /// Keys containing `:` are targeted hooks and split on the first `:`.
    /// Otherwise a trailing `Start`/`Complete` (with a non-empty action in
    /// front of it) marks a phase hook, and anything else is a delivery hook.
    pub fn parse(raw: &str) -> Result<Self, HookNameError> {
        if raw.is_empty() {
            return Err(HookNameError::Empty);
        }

        if let Some((action, target)) = raw.split_once(TARGET_SEPARATOR) {
            if action.is_empty() {
                return Err(HookNameError::MissingAction(raw.to_string()));
            }
            if target.is_empty() {
                return Err(HookNameError::MissingTarget(raw.to_string()));
            }
            return Ok(Self::targeted(action, target));
        }

        for phase in Phase::ALL {
            if let Some(action) = raw.strip_suffix(phase.suffix()) {
                if !action.is_empty() {
                    return Ok(Self::phase(action, phase));
                }
            }
        }

        Ok(Self::delivery(raw))
    }

    /// The phase hook `<action><Suffix>`.
    pub fn phase(action: &str, phase: Phase) -> Self {
        Self {
            raw: phase.hook_name(action),
            action: action.to_string(),
            kind: HookKind::Phase(phase),
        }
    }

    /// The delivery hook `<action>`.
    pub fn delivery(action: &str) -> Self {
        Self {
            raw: action.to_string(),
            action: action.to_string(),
            kind: HookKind::Delivery,
        }
    }

    /// The targeted enrichment hook `<action>:<target>`.
    pub fn targeted(action: &str, target: &str) -> Self {
        Self {
            raw: format!("{action}{TARGET_SEPARATOR}{target}"),
            action: action.to_string(),
            kind: HookKind::Targeted(target.to_string()),
        }
    }

    /// The action this hook belongs to.
    pub fn action(&self) -> &str {
        &self.action
    }

    /// The classification.
    pub fn kind(&self) -> &HookKind {
        &self.kind
    }

    /// The target namespace of a targeted hook.
    pub fn target(&self) -> Option<&str> {
        match &self.kind {
            HookKind::Targeted(target) => Some(target),
            _ => None,
        }
    }

    /// The original key.
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl FromStr for HookName {
    type Err = HookNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for HookName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_hooks() {
        let start: HookName = "initializeStart".parse().unwrap();
        assert_eq!(start.action(), "initialize");
        assert_eq!(start.kind(), &HookKind::Phase(Phase::Start));

        let complete = HookName::parse("trackComplete").unwrap();
        assert_eq!(complete.action(), "track");
        assert_eq!(complete.kind(), &HookKind::Phase(Phase::Complete));
        assert_eq!(complete.as_str(), "trackComplete");
    }

    #[test]
    fn test_delivery_hooks() {
        let track = HookName::parse("track").unwrap();
        assert_eq!(track.action(), "track");
        assert_eq!(track.kind(), &HookKind::Delivery);

        // A bare suffix is an action name in its own right.
        let bare = HookName::parse("Start").unwrap();
        assert_eq!(bare.kind(), &HookKind::Delivery);
        assert_eq!(bare.action(), "Start");

        // Suffixes are case sensitive.
        let restart = HookName::parse("restart").unwrap();
        assert_eq!(restart.kind(), &HookKind::Delivery);
    }

    #[test]
    fn test_targeted_hooks() {
        let hook = HookName::parse("track:google-analytics").unwrap();
        assert_eq!(hook.action(), "track");
        assert_eq!(hook.target(), Some("google-analytics"));

        // Only the first separator splits.
        let nested = HookName::parse("page:scope:inner").unwrap();
        assert_eq!(nested.action(), "page");
        assert_eq!(nested.target(), Some("scope:inner"));
    }

    #[test]
    fn test_invalid_names() {
        assert_eq!(HookName::parse(""), Err(HookNameError::Empty));
        assert_eq!(
            HookName::parse(":target"),
            Err(HookNameError::MissingAction(":target".into()))
        );
        assert_eq!(
            HookName::parse("track:"),
            Err(HookNameError::MissingTarget("track:".into()))
        );
    }

    #[test]
    fn test_constructors_round_trip_through_parse() {
        for hook in [
            HookName::phase("identify", Phase::Start),
            HookName::delivery("identify"),
            HookName::targeted("identify", "crm"),
        ] {
            assert_eq!(HookName::parse(hook.as_str()).unwrap(), hook);
        }
    }
}
