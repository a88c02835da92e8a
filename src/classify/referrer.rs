//! Referrer suspicion heuristic used by the deny-list policy.

use crate::config::PolicyConfig;
use crate::http::request::IncomingRequest;

#[derive(Debug, Clone)]
pub struct ReferrerHeuristic {
    tokens: Vec<String>,
    flag_missing: bool,
}

impl ReferrerHeuristic {
    pub fn new(config: &PolicyConfig) -> Self {
        Self {
            tokens: config
                .suspicious_referrers
                .iter()
                .map(|t| t.trim().to_lowercase())
                .filter(|t| !t.is_empty())
                .collect(),
            flag_missing: config.decoy_on_missing_referrer,
        }
    }

    /// True when the referrer points at ad-review or crawler infrastructure,
    /// or is missing and missing referrers are configured as suspicious.
    pub fn is_suspicious(&self, request: &IncomingRequest) -> bool {
        match request.referrer() {
            Some(referrer) => {
                let referrer = referrer.to_lowercase();
                self.tokens.iter().any(|t| referrer.contains(t.as_str()))
            }
            None => self.flag_missing,
        }
    }
}
