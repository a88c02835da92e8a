//! Bot/human classification subsystem.
//!
//! # Data Flow
//! ```text
//! IncomingRequest (user-agent, headers, source address)
//!     → keywords.rs (bot keywords, browser / automation markers)
//!     → header presence (accept, accept-language, accept-encoding)
//!     → rdns.rs (PTR lookup, search engine suffix match, bounded timeout)
//!     → classifier.rs (rule order, short-circuit on first bot signal)
//!     → Classification { verdict, signal }
//! ```
//!
//! # Design Decisions
//! - One classifier, rule set selected by configuration
//! - A false "not bot" costs more than a false "bot", so bot rules run first
//! - DNS failures never fail classification
//! - Verdicts are recomputed per request, never persisted

pub mod classifier;
pub mod keywords;
pub mod rdns;
pub mod referrer;

use std::fmt;

pub use classifier::{Classifier, ClassifierRules};
pub use rdns::{DnsError, ReverseLookup, SystemResolver};
pub use referrer::ReferrerHeuristic;

/// Tri-state outcome of classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verdict {
    DefinitelyBot,
    LikelyHuman,
    Indeterminate,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::DefinitelyBot => "definitely-bot",
            Verdict::LikelyHuman => "likely-human",
            Verdict::Indeterminate => "indeterminate",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The rule that produced a verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal {
    BotKeyword(String),
    MissingHeader(&'static str),
    SearchEngineHost(String),
    NoSourceAddress,
    NoBrowserMarker,
    AutomationMarker(String),
    MissingReferrer,
    MissingCookie,
    HumanSignals,
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::BotKeyword(k) => write!(f, "bot_keyword:{}", k),
            Signal::MissingHeader(h) => write!(f, "missing_header:{}", h),
            Signal::SearchEngineHost(h) => write!(f, "search_engine_host:{}", h),
            Signal::NoSourceAddress => f.write_str("no_source_address"),
            Signal::NoBrowserMarker => f.write_str("no_browser_marker"),
            Signal::AutomationMarker(m) => write!(f, "automation_marker:{}", m),
            Signal::MissingReferrer => f.write_str("missing_referrer"),
            Signal::MissingCookie => f.write_str("missing_cookie"),
            Signal::HumanSignals => f.write_str("human_signals"),
        }
    }
}

/// Verdict plus the evidence for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub verdict: Verdict,
    pub signal: Signal,
}

impl Classification {
    pub fn new(verdict: Verdict, signal: Signal) -> Self {
        Self { verdict, signal }
    }
}
