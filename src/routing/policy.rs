//! Routing policy shapes.

use std::collections::HashSet;
use std::fmt;

use crate::classify::{Classification, Verdict};
use crate::config::{PolicyConfig, PolicyShape};
use crate::geo::{normalize_country_code, GeoResult};
use crate::reputation::ReputationMatch;

/// Where a request is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Destination {
    Primary,
    Decoy,
}

impl Destination {
    pub fn as_str(&self) -> &'static str {
        match self {
            Destination::Primary => "primary",
            Destination::Decoy => "decoy",
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything collected about a request before routing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evidence {
    pub geo: GeoResult,
    pub classification: Classification,
    pub blocked: bool,
    pub reputation_match: Option<ReputationMatch>,
    pub referrer_suspicious: bool,
}

impl Evidence {
    pub fn verdict(&self) -> Verdict {
        self.classification.verdict
    }
}

/// The routing outcome and the evidence behind it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingDecision {
    pub destination: Destination,
    pub evidence: Evidence,
}

/// A routing strategy. Implementations are pure: the same evidence always
/// yields the same destination.
pub trait RoutingPolicy: Send + Sync {
    fn name(&self) -> &'static str;

    fn route(&self, evidence: &Evidence) -> Destination;

    fn decide(&self, evidence: Evidence) -> RoutingDecision {
        RoutingDecision {
            destination: self.route(&evidence),
            evidence,
        }
    }
}

/// Primary only for allowed-country, likely-human, clean-reputation requests.
#[derive(Debug, Clone)]
pub struct AllowListPolicy {
    allowed_countries: HashSet<String>,
}

impl AllowListPolicy {
    pub fn new<I, S>(countries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            allowed_countries: countries
                .into_iter()
                .filter_map(|c| normalize_country_code(c.as_ref()))
                .collect(),
        }
    }

    fn country_allowed(&self, geo: &GeoResult) -> bool {
        geo.country_code
            .as_deref()
            .is_some_and(|c| self.allowed_countries.contains(c))
    }
}

impl RoutingPolicy for AllowListPolicy {
    fn name(&self) -> &'static str {
        "allow_list"
    }

    fn route(&self, evidence: &Evidence) -> Destination {
        if self.country_allowed(&evidence.geo)
            && evidence.verdict() == Verdict::LikelyHuman
            && !evidence.blocked
        {
            Destination::Primary
        } else {
            Destination::Decoy
        }
    }
}

/// Decoy only for definite bots and suspicious referrers. No geo gating.
#[derive(Debug, Clone, Default)]
pub struct DenyListPolicy;

impl RoutingPolicy for DenyListPolicy {
    fn name(&self) -> &'static str {
        "deny_list"
    }

    fn route(&self, evidence: &Evidence) -> Destination {
        if evidence.verdict() == Verdict::DefinitelyBot || evidence.referrer_suspicious {
            Destination::Decoy
        } else {
            Destination::Primary
        }
    }
}

/// Build the configured policy shape.
pub fn from_config(config: &PolicyConfig) -> Box<dyn RoutingPolicy> {
    match config.shape {
        PolicyShape::AllowList => Box::new(AllowListPolicy::new(&config.allowed_countries)),
        PolicyShape::DenyList => Box::new(DenyListPolicy),
    }
}
