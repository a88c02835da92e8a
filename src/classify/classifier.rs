//! Bot/human classification.
//!
//! Rules run in priority order and stop at the first bot signal:
//!
//! 1. user-agent contains a bot keyword
//! 2. a baseline content-negotiation header is missing
//! 3. reverse DNS of the source address lands in a search engine domain
//! 4. browser marker, no automation marker, referrer (and cookie, when the
//!    rule set asks for it) all present → likely human
//!
//! Anything that is neither a bot nor passes rule 4 is indeterminate.

use std::sync::Arc;
use std::time::Duration;

use crate::classify::keywords::{
    KeywordSet, AUTOMATION_MARKERS, BASELINE_HEADERS, BOT_KEYWORDS, BROWSER_MARKERS,
};
use crate::classify::rdns::{reverse_with_timeout, ReverseLookup, SearchEngineDomains};
use crate::classify::{Classification, Signal, Verdict};
use crate::config::ClassifierConfig;
use crate::http::request::IncomingRequest;
use crate::observability::metrics;

/// Variant switches that distinguish one deployment's rule set from another.
#[derive(Debug, Clone)]
pub struct ClassifierRules {
    pub require_referrer: bool,
    pub require_cookie: bool,
    pub verify_search_engine_dns: bool,
    pub dns_timeout: Duration,
}

impl From<&ClassifierConfig> for ClassifierRules {
    fn from(config: &ClassifierConfig) -> Self {
        Self {
            require_referrer: config.require_referrer,
            require_cookie: config.require_cookie,
            verify_search_engine_dns: config.verify_search_engine_dns,
            dns_timeout: Duration::from_millis(config.dns_timeout_ms),
        }
    }
}

/// Classifies requests as bot, human or indeterminate.
pub struct Classifier {
    rules: ClassifierRules,
    bot_keywords: KeywordSet,
    browser_markers: KeywordSet,
    automation_markers: KeywordSet,
    search_engines: SearchEngineDomains,
    dns: Arc<dyn ReverseLookup>,
}

impl Classifier {
    pub fn new(config: &ClassifierConfig, dns: Arc<dyn ReverseLookup>) -> Self {
        Self {
            rules: ClassifierRules::from(config),
            bot_keywords: KeywordSet::new(BOT_KEYWORDS, &config.extra_bot_keywords),
            browser_markers: KeywordSet::new(BROWSER_MARKERS, &[]),
            automation_markers: KeywordSet::new(
                AUTOMATION_MARKERS,
                &config.extra_automation_markers,
            ),
            search_engines: SearchEngineDomains::new(&config.search_engine_suffixes),
            dns,
        }
    }

    pub fn rules(&self) -> &ClassifierRules {
        &self.rules
    }

    /// Classify a request. Never fails: DNS problems count as "not a
    /// search engine".
    pub async fn classify(&self, request: &IncomingRequest) -> Classification {
        let user_agent = request.user_agent().to_lowercase();

        if let Some(keyword) = self.bot_keywords.find_in(&user_agent) {
            return Classification::new(Verdict::DefinitelyBot, Signal::BotKeyword(keyword.to_string()));
        }

        if let Some(missing) = BASELINE_HEADERS.iter().find(|h| !request.has_header(h)) {
            return Classification::new(Verdict::DefinitelyBot, Signal::MissingHeader(*missing));
        }

        let Some(source) = request.source() else {
            return Classification::new(Verdict::Indeterminate, Signal::NoSourceAddress);
        };

        if self.rules.verify_search_engine_dns {
            if let Some(host) = self.search_engine_host(request, source).await {
                return Classification::new(Verdict::DefinitelyBot, Signal::SearchEngineHost(host));
            }
        }

        self.human_signals(request, &user_agent)
    }

    async fn search_engine_host(
        &self,
        request: &IncomingRequest,
        source: std::net::IpAddr,
    ) -> Option<String> {
        match reverse_with_timeout(self.dns.as_ref(), source, self.rules.dns_timeout).await {
            Ok(hostnames) => hostnames
                .into_iter()
                .find(|host| self.search_engines.matching_suffix(host).is_some()),
            Err(e) => {
                tracing::warn!(
                    request_id = %request.request_id(),
                    source = %source,
                    error = %e,
                    "Reverse DNS failed, treating as not a search engine"
                );
                metrics::record_dns_failure();
                None
            }
        }
    }

    fn human_signals(&self, request: &IncomingRequest, user_agent: &str) -> Classification {
        if self.browser_markers.find_in(user_agent).is_none() {
            return Classification::new(Verdict::Indeterminate, Signal::NoBrowserMarker);
        }
        if let Some(marker) = self.automation_markers.find_in(user_agent) {
            return Classification::new(
                Verdict::Indeterminate,
                Signal::AutomationMarker(marker.to_string()),
            );
        }
        if self.rules.require_referrer && request.referrer().is_none() {
            return Classification::new(Verdict::Indeterminate, Signal::MissingReferrer);
        }
        if self.rules.require_cookie && !request.has_header("cookie") {
            return Classification::new(Verdict::Indeterminate, Signal::MissingCookie);
        }
        Classification::new(Verdict::LikelyHuman, Signal::HumanSignals)
    }
}
