//! Decision pipeline: turns navigation, request and download events from the
//! host into decision events.
//!
//! The pipeline never touches the browser. Page signals come from a
//! `PageSignalCollector`, allowed hosts from an `ExceptionStore`, and every
//! decision goes out through an `Actuator`.

pub mod actuator;
pub mod events;
pub mod exceptions;

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use crate::config::PipelineSettings;
use crate::download::{DownloadCandidate, DownloadRiskScorer};
use crate::ir::{hostname_of, DetectionInput, Millis, PageSignals, RawRequest, RequestRecord, TabId};
use crate::rules::{DecisionLevel, ScoreEngine};
use crate::window::{SharedRequestWindow, Stats};

pub use actuator::{ActuatorEvent, ChannelActuator};
pub use events::{DecisionEvent, DecisionReason, DownloadDecisionEvent, Effect, Interstitial};
pub use exceptions::{normalize_host, InMemoryExceptionStore};

/// Score attached to a forced block.
pub const FORCED_BLOCK_SCORE: u32 = 999;

/// URL prefixes of browser-internal pages that are never inspected.
const INTERNAL_PAGE_PREFIXES: &[&str] = &["chrome://", "chrome-extension://", "edge://", "about:"];

/// Collects signals from the page loaded in a tab.
#[async_trait]
pub trait PageSignalCollector: Send + Sync {
    /// Collect signals for `tab_id`. Failures are reported through
    /// `PageSignals::collection_error`, never by panicking.
    async fn collect(&self, tab_id: TabId) -> PageSignals;
}

/// Read-only view of the user's exception list.
pub trait ExceptionStore: Send + Sync {
    fn allowed_hosts(&self) -> HashSet<String>;

    fn is_allowed(&self, host: &str) -> bool {
        self.allowed_hosts().contains(host)
    }
}

/// Applies decisions in the browser (closing tabs, cancelling downloads,
/// showing the interstitial).
pub trait Actuator: Send + Sync {
    fn apply(&self, event: &DecisionEvent);

    fn apply_download(&self, event: &DownloadDecisionEvent);
}

pub struct DecisionPipeline {
    window: SharedRequestWindow,
    engine: ScoreEngine,
    downloads: DownloadRiskScorer,
    collector: Arc<dyn PageSignalCollector>,
    exceptions: Arc<dyn ExceptionStore>,
    actuator: Arc<dyn Actuator>,
    settings: PipelineSettings,
}

impl DecisionPipeline {
    pub fn new(
        window: SharedRequestWindow,
        collector: Arc<dyn PageSignalCollector>,
        exceptions: Arc<dyn ExceptionStore>,
        actuator: Arc<dyn Actuator>,
    ) -> Self {
        Self {
            window,
            engine: ScoreEngine::new(),
            downloads: DownloadRiskScorer::new(),
            collector,
            exceptions,
            actuator,
            settings: PipelineSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: PipelineSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_engine(mut self, engine: ScoreEngine) -> Self {
        self.engine = engine;
        self
    }

    /// Record an outbound request observed by the host.
    pub fn on_request(&self, raw: RawRequest) {
        let now = now_millis();
        let record = RequestRecord::from_raw(raw, now);
        let tab_id = record.tab_id;
        let held = self.window.record(record, now);
        tracing::trace!(tab_id, held, "request recorded");
    }

    /// Evaluate a completed navigation and emit exactly one decision event.
    pub async fn on_navigation_completed(&self, tab_id: TabId, url: &str) -> DecisionEvent {
        let hostname = hostname_of(url);

        if is_internal_page(url) {
            tracing::debug!(tab_id, url, "internal page, not inspected");
            return self.emit(DecisionEvent::unscored(
                Some(tab_id),
                url,
                hostname,
                DecisionReason::InternalPage,
            ));
        }

        if self.exceptions.is_allowed(&hostname) {
            tracing::debug!(tab_id, host = %hostname, "host is allow-listed, skipping detection");
            return self.emit(DecisionEvent::unscored(
                Some(tab_id),
                url,
                hostname,
                DecisionReason::AllowListed,
            ));
        }

        let requests =
            self.window
                .recent_for_tab(tab_id, self.settings.recent_request_limit, now_millis());
        tracing::debug!(tab_id, requests = requests.len(), "collected recent requests");

        let signals = self.collect_signals(tab_id).await;
        let input = DetectionInput::assemble(url, signals, &requests);
        let report = self.engine.evaluate(&input);
        let event = DecisionEvent::scored(Some(tab_id), report, hostname, self.settings.warn_clear_ms);

        match event.level {
            DecisionLevel::Allow => {
                tracing::debug!(tab_id, host = %event.hostname, score = event.score, "navigation allowed")
            }
            level => tracing::info!(
                tab_id,
                host = %event.hostname,
                score = event.score,
                level = %level,
                "suspicious navigation"
            ),
        }

        self.emit(event)
    }

    /// Score a new download and emit its cancel/proceed decision.
    pub fn on_download_created(&self, candidate: &DownloadCandidate) -> DownloadDecisionEvent {
        let result = self.downloads.score(candidate);
        let event = DownloadDecisionEvent::new(candidate, result);

        if event.should_cancel {
            tracing::info!(
                download_id = event.download_id,
                filename = %candidate.filename,
                risk = event.risk_score,
                "cancelling risky download"
            );
        }

        self.actuator.apply_download(&event);
        event
    }

    /// Emit a block for `url` without scoring.
    pub fn force_block(&self, url: &str) -> DecisionEvent {
        self.emit(DecisionEvent::forced_block(url, FORCED_BLOCK_SCORE))
    }

    pub fn stats(&self) -> Stats {
        self.window.stats(now_millis(), self.settings.top_initiators)
    }

    // The collector runs as its own task raced against a timer. On timeout
    // the join handle is dropped: the task keeps running and whatever it
    // returns later is discarded.
    async fn collect_signals(&self, tab_id: TabId) -> PageSignals {
        let collector = Arc::clone(&self.collector);
        let task = tokio::spawn(async move { collector.collect(tab_id).await });

        match tokio::time::timeout(self.settings.collect_timeout(), task).await {
            Ok(Ok(signals)) => {
                if let Some(error) = &signals.collection_error {
                    tracing::warn!(tab_id, error = %error, "page signal collection failed");
                }
                signals
            }
            Ok(Err(e)) => {
                tracing::warn!(tab_id, error = %e, "page signal collector task failed");
                PageSignals::collection_failed(format!("collector task failed: {e}"))
            }
            Err(_) => {
                tracing::warn!(
                    tab_id,
                    timeout_ms = self.settings.collect_timeout_ms,
                    "page signal collection timed out"
                );
                PageSignals::timed_out()
            }
        }
    }

    fn emit(&self, event: DecisionEvent) -> DecisionEvent {
        self.actuator.apply(&event);
        event
    }
}

fn is_internal_page(url: &str) -> bool {
    INTERNAL_PAGE_PREFIXES.iter().any(|p| url.starts_with(p))
}

fn now_millis() -> Millis {
    Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::ScriptSummary;
    use crate::rules::{Category, Extractor, ExtractorMetadata, SignalHit};
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct FixedCollector {
        signals: PageSignals,
        delay: Duration,
        calls: AtomicUsize,
    }

    impl FixedCollector {
        fn new(signals: PageSignals) -> Arc<Self> {
            Self::delayed(signals, Duration::ZERO)
        }

        fn delayed(signals: PageSignals, delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                signals,
                delay,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl PageSignalCollector for FixedCollector {
        async fn collect(&self, _tab_id: TabId) -> PageSignals {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.signals.clone()
        }
    }

    struct PanickingCollector;

    #[async_trait]
    impl PageSignalCollector for PanickingCollector {
        async fn collect(&self, _tab_id: TabId) -> PageSignals {
            panic!("frame went away");
        }
    }

    #[derive(Default)]
    struct RecordingActuator {
        decisions: Mutex<Vec<DecisionEvent>>,
        downloads: Mutex<Vec<DownloadDecisionEvent>>,
    }

    impl Actuator for RecordingActuator {
        fn apply(&self, event: &DecisionEvent) {
            self.decisions.lock().push(event.clone());
        }

        fn apply_download(&self, event: &DownloadDecisionEvent) {
            self.downloads.lock().push(event.clone());
        }
    }

    struct CountingExtractor {
        calls: Arc<AtomicUsize>,
    }

    impl Extractor for CountingExtractor {
        fn metadata(&self) -> ExtractorMetadata {
            ExtractorMetadata {
                id: "TEST-001".into(),
                name: "Counting".into(),
                description: "Counts invocations".into(),
                category: Category::Url,
                signals: vec![],
            }
        }

        fn run(&self, _input: &DetectionInput) -> Vec<SignalHit> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Vec::new()
        }
    }

    fn pipeline(
        collector: Arc<dyn PageSignalCollector>,
        allowed: &[&str],
    ) -> (DecisionPipeline, Arc<RecordingActuator>) {
        let actuator = Arc::new(RecordingActuator::default());
        let pipeline = DecisionPipeline::new(
            SharedRequestWindow::new(),
            collector,
            Arc::new(InMemoryExceptionStore::from_entries(allowed.iter().copied())),
            actuator.clone(),
        );
        (pipeline, actuator)
    }

    fn phishing_page() -> PageSignals {
        PageSignals {
            title: "Verify your account".into(),
            has_password_field: true,
            scripts: vec![ScriptSummary {
                is_external: false,
                inline_length: 300,
            }],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn ip_login_page_emits_single_warning() {
        let (pipeline, actuator) = pipeline(FixedCollector::new(phishing_page()), &[]);

        let event = pipeline.on_navigation_completed(4, "http://192.168.0.1/login").await;

        assert_eq!(event.level, DecisionLevel::Warn);
        assert_eq!(event.score, 52);
        assert_eq!(event.hostname, "192.168.0.1");
        assert_eq!(event.effect, Effect::TransientWarning { clear_after_ms: 6000 });
        assert_eq!(actuator.decisions.lock().len(), 1);
    }

    #[tokio::test]
    async fn block_carries_interstitial() {
        let mut page = phishing_page();
        page.body_text_sample = "Urgent: verify now or lose access".into();
        page.iframe_count = 12;
        page.inline_handler_count = 60;
        page.granted_permissions = vec!["clipboard-read".into()];
        let (pipeline, _) = pipeline(FixedCollector::new(page), &[]);

        let event = pipeline.on_navigation_completed(9, "http://10.0.0.8/secure").await;

        // ip, password, title, body text, iframes, inline handlers, clipboard
        assert_eq!(event.score, 30 + 10 + 12 + 12 + 8 + 10 + 10);
        assert_eq!(event.level, DecisionLevel::Block);
        let page = event.interstitial().unwrap();
        assert_eq!(page.host, "10.0.0.8");
        assert_eq!(page.url, "http://10.0.0.8/secure");
        assert_eq!(page.score, event.score);
    }

    #[tokio::test]
    async fn allow_listed_host_skips_all_scoring() {
        let collector = FixedCollector::new(phishing_page());
        let calls = Arc::new(AtomicUsize::new(0));
        let (pipeline, actuator) = pipeline(collector.clone(), &["192.168.0.1"]);
        let pipeline = pipeline.with_engine(ScoreEngine::with_extractors(vec![Box::new(
            CountingExtractor {
                calls: calls.clone(),
            },
        )]));

        let event = pipeline.on_navigation_completed(4, "http://192.168.0.1/login").await;

        assert_eq!(event.level, DecisionLevel::Allow);
        assert_eq!(event.reason, DecisionReason::AllowListed);
        assert_eq!(collector.calls.load(Ordering::SeqCst), 0);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(actuator.decisions.lock().len(), 1);
    }

    #[tokio::test]
    async fn slow_collector_times_out_with_fixed_penalty() {
        let collector = FixedCollector::delayed(phishing_page(), Duration::from_millis(500));
        let (pipeline, actuator) = pipeline(collector.clone(), &[]);
        let pipeline = pipeline.with_settings(PipelineSettings {
            collect_timeout_ms: 20,
            ..Default::default()
        });

        let event = pipeline.on_navigation_completed(1, "https://news.example/").await;

        // only the timeout penalty; the late phishing signals are ignored
        assert_eq!(event.score, 8);
        assert_eq!(event.level, DecisionLevel::Allow);
        assert_eq!(event.hits.len(), 1);
        assert_eq!(collector.calls.load(Ordering::SeqCst), 1);
        assert_eq!(actuator.decisions.lock().len(), 1);
    }

    #[tokio::test]
    async fn panicking_collector_is_penalized_not_fatal() {
        let (pipeline, _) = pipeline(Arc::new(PanickingCollector), &[]);

        let event = pipeline.on_navigation_completed(1, "https://news.example/").await;

        assert_eq!(event.score, 8);
        assert_eq!(event.reason, DecisionReason::Scored);
    }

    #[tokio::test]
    async fn internal_pages_are_not_inspected() {
        let collector = FixedCollector::new(phishing_page());
        let (pipeline, _) = pipeline(collector.clone(), &[]);

        let event = pipeline.on_navigation_completed(1, "chrome://settings/").await;

        assert_eq!(event.reason, DecisionReason::InternalPage);
        assert_eq!(collector.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn recorded_requests_feed_network_score() {
        let (pipeline, _) = pipeline(FixedCollector::new(PageSignals::default()), &[]);
        for i in 0..15 {
            pipeline.on_request(RawRequest {
                tab_id: Some(3),
                url: Some(format!("https://ads{i}.example/px")),
                method: Some("GET".into()),
                ..Default::default()
            });
        }
        pipeline.on_request(RawRequest {
            tab_id: Some(3),
            url: Some("https://shop.example/upload".into()),
            method: Some("POST".into()),
            request_body_byte_size: Some(600_000),
            ..Default::default()
        });
        // another tab's traffic is not attributed to tab 3
        pipeline.on_request(RawRequest {
            tab_id: Some(8),
            url: Some("https://pastebin.com/raw/z".into()),
            ..Default::default()
        });

        let event = pipeline.on_navigation_completed(3, "https://shop.example/").await;

        assert_eq!(event.score, 12 + 25);
        let stats = pipeline.stats();
        assert_eq!(stats.requests_in_window, 17);
        assert_eq!(stats.total_requests_ever, 17);
    }

    #[tokio::test]
    async fn concurrent_tabs_each_get_one_decision() {
        let collector = FixedCollector::delayed(PageSignals::default(), Duration::from_millis(10));
        let (pipeline, actuator) = pipeline(collector, &[]);
        let pipeline = Arc::new(pipeline);

        let handles: Vec<_> = (0..8)
            .map(|tab| {
                let pipeline = Arc::clone(&pipeline);
                tokio::spawn(async move {
                    pipeline
                        .on_navigation_completed(tab, "https://news.example/")
                        .await
                })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.await.unwrap().level, DecisionLevel::Allow);
        }

        assert_eq!(actuator.decisions.lock().len(), 8);
    }

    #[test]
    fn download_decision_is_emitted() {
        let (pipeline, actuator) = pipeline(FixedCollector::new(PageSignals::default()), &[]);

        let event = pipeline.on_download_created(&DownloadCandidate {
            id: 77,
            filename: "invoice.pdf.exe".into(),
            source_url: "https://mail.example/att/invoice.pdf.exe".into(),
            referrer: None,
        });

        assert!(event.should_cancel);
        assert_eq!(event.download_id, 77);
        let page = event.interstitial.as_ref().unwrap();
        assert_eq!(page.host, "Download");
        assert_eq!(actuator.downloads.lock().len(), 1);
    }

    #[test]
    fn force_block_emits_max_score() {
        let (pipeline, actuator) = pipeline(FixedCollector::new(PageSignals::default()), &[]);
        let event = pipeline.force_block("https://tab.example/");
        assert_eq!(event.score, FORCED_BLOCK_SCORE);
        assert_eq!(actuator.decisions.lock()[0].reason, DecisionReason::Forced);
    }
}
