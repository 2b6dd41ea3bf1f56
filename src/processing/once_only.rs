//! Once-only suppression
//!
//! Each rule of a logger owns one flag that moves from armed to fired on the
//! first matching message. The transition is a single atomic swap, so when
//! requests race on the same rule exactly one of them sees it armed.

use crate::config::{OnceOnlyRule, Pattern};
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleState {
    Armed,
    Fired,
}

/// Runtime state of one once-only rule
#[derive(Debug)]
pub struct OnceOnlyFilter {
    pattern: Option<Pattern>,
    fired: AtomicBool,
}

impl OnceOnlyFilter {
    pub fn new(rule: &OnceOnlyRule) -> Self {
        Self {
            pattern: rule.pattern.clone(),
            fired: AtomicBool::new(false),
        }
    }

    /// A rule without a pattern matches every message
    pub fn matches(&self, message: &str) -> bool {
        self.pattern.as_ref().map_or(true, |p| p.is_match(message))
    }

    pub fn state(&self) -> RuleState {
        if self.fired.load(Ordering::Acquire) {
            RuleState::Fired
        } else {
            RuleState::Armed
        }
    }

    /// Fire the rule; true only for the caller that found it armed
    pub fn fire(&self) -> bool {
        !self.fired.swap(true, Ordering::AcqRel)
    }
}

/// Ordered once-only rules of one logger
#[derive(Debug, Default)]
pub struct OnceOnlySet {
    filters: Vec<OnceOnlyFilter>,
}

impl OnceOnlySet {
    pub fn new(rules: &[OnceOnlyRule]) -> Self {
        Self {
            filters: rules.iter().map(OnceOnlyFilter::new).collect(),
        }
    }

    /// Whether `message` may pass
    ///
    /// Only the first matching rule is consulted. The message that fires it
    /// passes; every later match is suppressed.
    pub fn check(&self, message: &str) -> bool {
        match self.filters.iter().find(|f| f.matches(message)) {
            Some(filter) => filter.fire(),
            None => true,
        }
    }

    pub fn filters(&self) -> &[OnceOnlyFilter] {
        &self.filters
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}
