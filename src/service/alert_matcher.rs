// src/service/alert_matcher.rs
//! Alert matcher
//!
//! Decides whether one alert rule cares about one event. Predicates run in a
//! fixed order and the first failing one rejects the rule:
//! 1. eligibility (not suspended, Ready condition true)
//! 2. exclusion list against the event message
//! 3. event sources, then minimum severity
//!
//! Evaluation is pure. Exclusion patterns that fail to compile are returned
//! to the caller for reporting instead of being logged here.

use regex::Regex;

use crate::domain::model::alert::{AlertRule, EventSource};
use crate::domain::model::event::Event;

/// Exclusion pattern that could not be compiled and was ignored.
#[derive(Debug, Clone)]
pub struct InvalidPattern {
    pub pattern: String,
    pub error: regex::Error,
}

/// Why a rule was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    Suspended,
    NotReady,
    Excluded,
    NoMatchingSource,
    SeverityBelowMinimum,
}

/// Result of evaluating one rule against one event.
#[derive(Debug, Clone)]
pub struct MatchEvaluation {
    /// Source iterations that accepted the event. Every one of them queues
    /// a delivery.
    pub acceptances: usize,
    pub rejection: Option<Rejection>,
    pub invalid_patterns: Vec<InvalidPattern>,
}

impl MatchEvaluation {
    fn rejected(rejection: Rejection, invalid_patterns: Vec<InvalidPattern>) -> Self {
        Self {
            acceptances: 0,
            rejection: Some(rejection),
            invalid_patterns,
        }
    }

    pub fn is_match(&self) -> bool {
        self.acceptances > 0
    }
}

/// Stateless matcher for alert rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlertMatcher;

impl AlertMatcher {
    pub fn new() -> Self {
        Self
    }

    pub fn matches(&self, event: &Event, rule: &AlertRule) -> bool {
        self.evaluate(event, rule).is_match()
    }

    pub fn evaluate(&self, event: &Event, rule: &AlertRule) -> MatchEvaluation {
        if rule.spec.suspend {
            return MatchEvaluation::rejected(Rejection::Suspended, Vec::new());
        }
        if !rule.is_ready() {
            return MatchEvaluation::rejected(Rejection::NotReady, Vec::new());
        }

        let mut invalid_patterns = Vec::new();
        for pattern in &rule.spec.exclusion_list {
            match Regex::new(pattern) {
                Ok(re) if re.is_match(&event.message) => {
                    return MatchEvaluation::rejected(Rejection::Excluded, invalid_patterns);
                }
                Ok(_) => {}
                Err(error) => invalid_patterns.push(InvalidPattern {
                    pattern: pattern.clone(),
                    error,
                }),
            }
        }

        let mut acceptances = 0;
        let mut source_matched = false;
        for source in &rule.spec.event_sources {
            if !source_matches(source, &rule.namespace, event) {
                continue;
            }
            source_matched = true;
            if rule.spec.event_severity.accepts(&event.severity) {
                acceptances += 1;
            }
        }

        let rejection = match (acceptances, source_matched) {
            (0, false) => Some(Rejection::NoMatchingSource),
            (0, true) => Some(Rejection::SeverityBelowMinimum),
            _ => None,
        };

        MatchEvaluation {
            acceptances,
            rejection,
            invalid_patterns,
        }
    }
}

fn source_matches(source: &EventSource, rule_namespace: &str, event: &Event) -> bool {
    let namespace = if source.namespace.is_empty() {
        rule_namespace
    } else {
        source.namespace.as_str()
    };
    let object = &event.involved_object;

    (source.name == EventSource::ANY_NAME || object.name == source.name)
        && object.namespace == namespace
        && object.kind == source.kind
}
