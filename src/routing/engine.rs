//! Per-request decision pipeline.

use std::sync::Arc;
use std::time::Duration;

use crate::classify::{Classifier, ReferrerHeuristic, ReverseLookup, SystemResolver};
use crate::config::RouterConfig;
use crate::geo::{GeoResolver, GeoResult};
use crate::http::request::IncomingRequest;
use crate::observability::metrics;
use crate::reputation::ReputationHandle;
use crate::routing::delay::DelayWindow;
use crate::routing::policy::{self, Evidence, RoutingDecision, RoutingPolicy};

/// Collects evidence for a request and applies the routing policy.
pub struct DecisionEngine {
    classifier: Classifier,
    geo: GeoResolver,
    reputation: ReputationHandle,
    reputation_enabled: bool,
    referrer: ReferrerHeuristic,
    policy: Box<dyn RoutingPolicy>,
    delay: DelayWindow,
}

impl DecisionEngine {
    /// Wire the engine with the system resolver and HTTP geo providers.
    pub fn from_config(
        config: &RouterConfig,
        reputation: ReputationHandle,
        http: reqwest::Client,
    ) -> Self {
        let dns = Arc::new(SystemResolver::new(Duration::from_millis(
            config.classifier.dns_timeout_ms,
        )));
        let geo = GeoResolver::from_config(&config.geo, http);
        Self::new(config, dns, geo, reputation)
    }

    /// Wire the engine around explicit collaborators.
    pub fn new(
        config: &RouterConfig,
        dns: Arc<dyn ReverseLookup>,
        geo: GeoResolver,
        reputation: ReputationHandle,
    ) -> Self {
        Self {
            classifier: Classifier::new(&config.classifier, dns),
            geo,
            reputation,
            reputation_enabled: config.reputation.enabled,
            referrer: ReferrerHeuristic::new(&config.policy),
            policy: policy::from_config(&config.policy),
            delay: DelayWindow::from_config(&config.policy),
        }
    }

    pub fn policy_name(&self) -> &'static str {
        self.policy.name()
    }

    /// Decide where a request goes. Evidence collection runs alongside the
    /// random delay; the decision is returned only once both are done.
    pub async fn decide(&self, request: &IncomingRequest) -> RoutingDecision {
        let delay = self.delay.sample();
        let (evidence, ()) = tokio::join!(
            self.collect_evidence(request),
            tokio::time::sleep(delay)
        );

        let decision = self.policy.decide(evidence);
        self.log_decision(request, &decision, delay);
        metrics::record_decision(
            decision.destination.as_str(),
            decision.evidence.verdict().as_str(),
        );
        decision
    }

    async fn collect_evidence(&self, request: &IncomingRequest) -> Evidence {
        let (classification, geo) = tokio::join!(
            self.classifier.classify(request),
            self.geo.resolve(request.source(), request.user_agent())
        );

        let reputation_match = self.reputation_check(&geo);

        Evidence {
            blocked: reputation_match.is_some(),
            reputation_match,
            referrer_suspicious: self.referrer.is_suspicious(request),
            classification,
            geo,
        }
    }

    fn reputation_check(&self, geo: &GeoResult) -> Option<crate::reputation::ReputationMatch> {
        if !self.reputation_enabled {
            return None;
        }
        self.reputation
            .current()
            .find_match(geo.asn.as_deref(), geo.organization.as_deref())
    }

    // Absent values leave the field out rather than logging `None`.
    fn log_decision(&self, request: &IncomingRequest, decision: &RoutingDecision, delay: Duration) {
        let evidence = &decision.evidence;
        tracing::info!(
            target: "decision",
            request_id = %request.request_id(),
            source = request.source().map(tracing::field::display),
            user_agent = %request.user_agent(),
            country = evidence.geo.country_code.as_deref(),
            asn = evidence.geo.asn.as_deref(),
            org = evidence.geo.organization.as_deref(),
            verdict = %evidence.verdict(),
            signal = %evidence.classification.signal,
            blocked = evidence.blocked,
            referrer_suspicious = evidence.referrer_suspicious,
            policy = self.policy.name(),
            destination = %decision.destination,
            delay_ms = delay.as_millis() as u64,
            "Routing decision"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{DnsError, Verdict};
    use crate::config::PolicyShape;
    use crate::geo::{GeoError, GeoProvider};
    use crate::reputation::parse_dataset;
    use crate::routing::policy::Destination;
    use async_trait::async_trait;
    use axum::http::{HeaderMap, HeaderValue, Method, Uri};
    use std::net::IpAddr;
    use std::time::Instant;

    struct NoDns;

    #[async_trait]
    impl ReverseLookup for NoDns {
        async fn reverse(&self, _ip: IpAddr) -> Result<Vec<String>, DnsError> {
            Ok(vec!["host.example.net".into()])
        }
    }

    struct FixedGeo(GeoResult);

    #[async_trait]
    impl GeoProvider for FixedGeo {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn lookup(&self, _ip: IpAddr) -> Result<GeoResult, GeoError> {
            Ok(self.0.clone())
        }
    }

    fn config(shape: PolicyShape, delay_ms: u64) -> RouterConfig {
        let mut config = RouterConfig::default();
        config.policy.shape = shape;
        config.policy.delay_min_ms = delay_ms;
        config.policy.delay_max_ms = delay_ms;
        config
    }

    fn engine(config: &RouterConfig, geo: GeoResult, dataset: &str) -> DecisionEngine {
        let resolver = GeoResolver::new(&config.geo, Arc::new(FixedGeo(geo)), None);
        DecisionEngine::new(
            config,
            Arc::new(NoDns),
            resolver,
            ReputationHandle::new(parse_dataset(dataset)),
        )
    }

    fn uae_geo(asn: &str, org: &str) -> GeoResult {
        GeoResult {
            country_code: Some("AE".into()),
            asn: Some(asn.into()),
            organization: Some(org.into()),
        }
    }

    fn browser_request(referrer: Option<&str>) -> IncomingRequest {
        let mut headers = HeaderMap::new();
        headers.insert(
            "user-agent",
            HeaderValue::from_static("Mozilla/5.0 (Windows NT 10.0) Chrome/120.0 Safari/537.36"),
        );
        headers.insert("accept", HeaderValue::from_static("text/html"));
        headers.insert("accept-language", HeaderValue::from_static("en-US"));
        headers.insert("accept-encoding", HeaderValue::from_static("gzip"));
        if let Some(referrer) = referrer {
            headers.insert("referer", HeaderValue::from_str(referrer).unwrap());
        }
        IncomingRequest::new(
            Method::GET,
            Uri::from_static("/landing?x=1"),
            headers,
            Some("203.0.113.20".parse().unwrap()),
        )
    }

    #[tokio::test]
    async fn test_allow_list_human_from_allowed_country() {
        let config = config(PolicyShape::AllowList, 0);
        let engine = engine(&config, uae_geo("AS5384", "Emirates Telecommunications"), "");

        let decision = engine.decide(&browser_request(Some("https://www.google.com/"))).await;
        assert_eq!(decision.destination, Destination::Primary);
        assert_eq!(decision.evidence.verdict(), Verdict::LikelyHuman);
        assert!(!decision.evidence.blocked);
    }

    #[tokio::test]
    async fn test_reputation_block_sends_to_decoy() {
        let config = config(PolicyShape::AllowList, 0);
        let engine = engine(&config, uae_geo("AS16509", "Amazon.com, Inc."), "AS16509,Amazon,cloud\n");

        let decision = engine.decide(&browser_request(Some("https://www.google.com/"))).await;
        assert_eq!(decision.destination, Destination::Decoy);
        assert!(decision.evidence.blocked);
        assert!(decision.evidence.reputation_match.is_some());
    }

    #[tokio::test]
    async fn test_disabled_reputation_never_blocks() {
        let mut config = config(PolicyShape::AllowList, 0);
        config.reputation.enabled = false;
        let engine = engine(&config, uae_geo("AS16509", "Amazon.com, Inc."), "AS16509,Amazon,cloud\n");

        let decision = engine.decide(&browser_request(Some("https://www.google.com/"))).await;
        assert!(!decision.evidence.blocked);
        assert_eq!(decision.destination, Destination::Primary);
    }

    #[tokio::test]
    async fn test_deny_list_suspicious_referrer() {
        let config = config(PolicyShape::DenyList, 0);
        let engine = engine(&config, GeoResult::empty(), "");

        let clean = engine.decide(&browser_request(None)).await;
        assert_eq!(clean.destination, Destination::Primary);

        let suspicious = engine
            .decide(&browser_request(Some("https://www.googleadservices.com/pagead")))
            .await;
        assert!(suspicious.evidence.referrer_suspicious);
        assert_eq!(suspicious.destination, Destination::Decoy);
    }

    #[tokio::test]
    async fn test_delay_floor_is_observed() {
        let config = config(PolicyShape::DenyList, 60);
        let engine = engine(&config, GeoResult::empty(), "");

        let started = Instant::now();
        engine.decide(&browser_request(None)).await;
        assert!(started.elapsed() >= Duration::from_millis(60));
    }

    #[derive(Clone, Default)]
    struct Captured(Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for Captured {
        type Writer = Captured;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    impl Captured {
        fn decision_fields(&self) -> serde_json::Map<String, serde_json::Value> {
            let output = String::from_utf8(self.0.lock().unwrap().clone()).unwrap();
            output
                .lines()
                .filter_map(|line| serde_json::from_str::<serde_json::Value>(line).ok())
                .find(|event| event["target"] == "decision")
                .and_then(|event| event["fields"].as_object().cloned())
                .expect("no decision event logged")
        }
    }

    async fn logged_decision(geo: GeoResult) -> serde_json::Map<String, serde_json::Value> {
        let captured = Captured::default();
        let subscriber = tracing_subscriber::fmt()
            .json()
            .with_max_level(tracing::Level::INFO)
            .with_writer(captured.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let config = config(PolicyShape::AllowList, 0);
        engine(&config, geo, "").decide(&browser_request(None)).await;
        captured.decision_fields()
    }

    #[tokio::test]
    async fn test_decision_log_records_plain_values() {
        let fields = logged_decision(uae_geo("AS5384", "Emirates Telecommunications")).await;

        assert_eq!(fields["source"], "203.0.113.20");
        assert_eq!(fields["country"], "AE");
        assert_eq!(fields["asn"], "AS5384");
        assert_eq!(fields["org"], "Emirates Telecommunications");
        assert_eq!(fields["destination"], "primary");
    }

    #[tokio::test]
    async fn test_decision_log_omits_unknown_geo() {
        let fields = logged_decision(GeoResult::empty()).await;

        for name in ["country", "asn", "org"] {
            assert!(!fields.contains_key(name), "{} logged without a value", name);
        }
        assert!(!serde_json::to_string(&fields).unwrap().contains("Some("));
        assert_eq!(fields["destination"], "decoy");
    }
}
