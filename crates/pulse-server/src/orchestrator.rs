//! Polling Orchestrator
//!
//! Owns the display state and the notification watermark. A fetch cycle
//! runs analysis and prices side by side, applies each result on its own,
//! then hands newly seen items to the notifier one at a time.
//!
//! ```text
//!  settle ──▶ fetch ──▶ fetch ──▶ fetch ...   (timer, fixed period)
//!              ▲          ▲
//!        manual refresh / provider switch (timer is not reset)
//! ```
//!
//! Fetches are not serialized against each other: whichever finishes last
//! owns the display state.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{Mutex, RwLock, mpsc, oneshot};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{Instant, MissedTickBehavior, interval_at, sleep};
use tracing::{debug, error, info, warn};

use pulse_core::{
    MarketItem, MarketReport, NotificationWatermark, NotifyPlan, ProviderKind, PulseError,
    SettingsStore,
};
use pulse_market::PriceFeed;
use pulse_notify::Notifier;
use pulse_runtime::AnalysisService;

use crate::state::{DisplayState, Status};

pub struct Orchestrator {
    analysis: AnalysisService,
    prices: Arc<dyn PriceFeed>,
    notifier: Arc<dyn Notifier>,
    settings: Arc<SettingsStore>,
    notify_pause: Duration,
    display: RwLock<DisplayState>,
    watermark: Mutex<NotificationWatermark>,
}

impl Orchestrator {
    pub fn new(
        analysis: AnalysisService,
        prices: Arc<dyn PriceFeed>,
        notifier: Arc<dyn Notifier>,
        settings: Arc<SettingsStore>,
        notify_pause: Duration,
    ) -> Self {
        let provider = analysis.default_provider();
        Self {
            analysis,
            prices,
            notifier,
            settings,
            notify_pause,
            display: RwLock::new(DisplayState::new(provider)),
            watermark: Mutex::new(NotificationWatermark::new(Utc::now())),
        }
    }

    pub async fn snapshot(&self) -> DisplayState {
        self.display.read().await.clone()
    }

    pub async fn selected_provider(&self) -> ProviderKind {
        self.display.read().await.provider
    }

    /// Select `kind`; `false` when it was already selected
    pub async fn select_provider(&self, kind: ProviderKind) -> bool {
        let mut state = self.display.write().await;
        let previous = state.provider;
        if previous == kind {
            return false;
        }
        state.provider = kind;
        info!(from = %previous, to = %kind, "provider switched");
        true
    }

    /// Whether a key resolves for `kind` with the current settings
    pub fn has_credential(&self, kind: ProviderKind) -> bool {
        self.analysis.has_credential(kind, &self.settings.api_keys())
    }

    /// One complete refresh: analysis and prices, then notifications
    pub async fn fetch_cycle(&self) {
        let kind = self.selected_provider().await;
        let keys = self.settings.api_keys();

        if !self.analysis.has_credential(kind, &keys) {
            warn!(provider = %kind, "no API key configured, skipping refresh");
            let mut display = self.display.write().await;
            display.status = Status::Error;
            display.sentiment = PulseError::MissingCredential(kind).user_message();
            return;
        }

        {
            let mut display = self.display.write().await;
            display.status = Status::Loading;
            display.sentiment = format!("Connecting to {} API for analysis...", kind.label());
        }

        let (report, prices) = tokio::join!(
            self.analysis.analyze(kind, &keys),
            self.prices.top_coins()
        );

        let fresh = {
            let mut display = self.display.write().await;
            display.prices = prices;
            match report {
                Ok(MarketReport {
                    items,
                    overall_sentiment,
                    last_updated,
                    ..
                }) => {
                    info!(provider = %kind, items = items.len(), "report applied");
                    display.status = Status::Idle;
                    display.sentiment = if overall_sentiment.trim().is_empty() {
                        format!("{} analysis complete", kind.label())
                    } else {
                        overall_sentiment
                    };
                    display.last_updated = Some(last_updated);
                    display.items.clone_from(&items);
                    Some(items)
                }
                Err(e) => {
                    display.status = Status::Error;
                    display.sentiment = e.user_message();
                    None
                }
            }
        };

        if let Some(items) = fresh {
            self.notify_new_items(&items).await;
        }
    }

    /// Diff `items` against the watermark and send what is new.
    ///
    /// Only runs while a complete Telegram target is configured; the first
    /// batch seen primes the watermark instead of sending.
    async fn notify_new_items(&self, items: &[MarketItem]) {
        let Some(target) = self.settings.telegram().target() else {
            return;
        };

        let mut watermark = self.watermark.lock().await;
        match watermark.plan(items) {
            NotifyPlan::Prime { to } => {
                watermark.prime(to);
                info!(watermark = %watermark.last_notified(), "notification watermark primed");
            }
            NotifyPlan::Send(fresh) => {
                if !fresh.is_empty() {
                    info!(count = fresh.len(), "sending notifications");
                }
                for (index, item) in fresh.iter().enumerate() {
                    if index > 0 {
                        sleep(self.notify_pause).await;
                    }
                    self.notifier.notify(&target, item).await;
                    watermark.advance(item.timestamp);
                }
            }
        }
    }

    #[cfg(test)]
    pub async fn watermark(&self) -> NotificationWatermark {
        *self.watermark.lock().await
    }
}

/// Why an out-of-schedule fetch was requested
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Trigger {
    Manual,
    ProviderSwitch,
}

/// Cloneable trigger side of the polling loop
#[derive(Clone)]
pub struct PollerHandle {
    triggers: mpsc::Sender<Trigger>,
}

impl PollerHandle {
    /// Request an immediate fetch; `false` when the loop is gone or busy
    pub fn trigger(&self, reason: Trigger) -> bool {
        match self.triggers.try_send(reason) {
            Ok(()) => true,
            Err(e) => {
                warn!(?reason, error = %e, "refresh trigger dropped");
                false
            }
        }
    }
}

/// Owner of the polling task; dropping it without `shutdown` also stops
/// the loop
pub struct Poller {
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl Poller {
    /// Start polling: one fetch after `settle_delay`, then one every
    /// `period` counted from now.
    pub fn spawn(
        orchestrator: Arc<Orchestrator>,
        settle_delay: Duration,
        period: Duration,
    ) -> (Self, PollerHandle) {
        let (trigger_tx, trigger_rx) = mpsc::channel(16);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let task = tokio::spawn(run(
            orchestrator,
            settle_delay,
            period,
            trigger_rx,
            shutdown_rx,
        ));
        (
            Self {
                shutdown: shutdown_tx,
                task,
            },
            PollerHandle {
                triggers: trigger_tx,
            },
        )
    }

    /// Stop the timer and abort in-flight fetches
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(());
        if let Err(e) = self.task.await {
            error!(error = %e, "poller task failed");
        }
    }
}

async fn run(
    orchestrator: Arc<Orchestrator>,
    settle_delay: Duration,
    period: Duration,
    mut triggers: mpsc::Receiver<Trigger>,
    mut shutdown: oneshot::Receiver<()>,
) {
    let start = Instant::now();
    let settle = sleep(settle_delay);
    tokio::pin!(settle);
    let mut settled = false;

    let mut ticker = interval_at(start + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut fetches = JoinSet::new();
    let spawn_fetch = |fetches: &mut JoinSet<()>| {
        let orchestrator = orchestrator.clone();
        fetches.spawn(async move { orchestrator.fetch_cycle().await });
    };

    info!(period_ms = period.as_millis(), "poller started");
    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            () = &mut settle, if !settled => {
                settled = true;
                debug!("initial fetch");
                spawn_fetch(&mut fetches);
            }
            _ = ticker.tick() => {
                debug!("scheduled refresh");
                spawn_fetch(&mut fetches);
            }
            Some(reason) = triggers.recv() => {
                debug!(?reason, "triggered refresh");
                spawn_fetch(&mut fetches);
            }
            Some(joined) = fetches.join_next() => {
                if let Err(e) = joined {
                    error!(error = %e, "fetch task failed");
                }
            }
        }
    }

    fetches.shutdown().await;
    info!("poller stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{DateTime, TimeZone};
    use pulse_core::{
        AnalysisProvider, ApiKeys, PromptBuilder, Result, Settings, Signal, TelegramTarget,
        error::CONNECTION_INTERRUPTED,
    };
    use pulse_market::{CoinPrice, MockPriceFeed};
    use std::collections::VecDeque;
    use std::sync::Mutex as StdMutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn t(minutes: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap() + chrono::Duration::minutes(minutes)
    }

    fn item(id: &str, ts: DateTime<Utc>) -> MarketItem {
        MarketItem {
            id: id.into(),
            timestamp: ts,
            title: id.into(),
            summary: String::new(),
            source: String::new(),
            related_coins: Vec::new(),
            on_chain_insight: None,
            signal: Signal::Hold,
            confidence: 50,
            source_credibility: 5,
            url: None,
        }
    }

    /// Hands out queued batches; an empty queue is an upstream failure
    struct ScriptedProvider {
        batches: StdMutex<VecDeque<Vec<MarketItem>>>,
        calls: AtomicUsize,
    }

    impl ScriptedProvider {
        fn new(batches: Vec<Vec<MarketItem>>) -> Arc<Self> {
            Arc::new(Self {
                batches: StdMutex::new(batches.into()),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl AnalysisProvider for ScriptedProvider {
        fn kind(&self) -> ProviderKind {
            ProviderKind::Gemini
        }

        async fn produce_report(&self, _prompt: &str, _credential: &str) -> Result<MarketReport> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let batch = self
                .batches
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| PulseError::Transport("scripted outage".into()))?;
            Ok(MarketReport {
                items: batch,
                overall_sentiment: String::new(),
                last_updated: Utc::now(),
                provider: ProviderKind::Gemini,
            })
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        sent: StdMutex<Vec<String>>,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn send_test(&self, _target: &TelegramTarget) -> bool {
            true
        }

        async fn notify(&self, _target: &TelegramTarget, item: &MarketItem) {
            self.sent.lock().unwrap().push(item.id.clone());
        }
    }

    #[derive(Default)]
    struct CountingFeed {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl PriceFeed for CountingFeed {
        async fn top_coins(&self) -> Vec<CoinPrice> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            MockPriceFeed::new().top_coins().await
        }

        fn name(&self) -> &str {
            "counting"
        }
    }

    struct Harness {
        orchestrator: Arc<Orchestrator>,
        provider: Arc<ScriptedProvider>,
        notifier: Arc<RecordingNotifier>,
        feed: Arc<CountingFeed>,
        _dir: tempfile::TempDir,
    }

    fn env_keys(gemini: Option<&str>) -> ApiKeys {
        let mut keys = ApiKeys::default();
        if let Some(key) = gemini {
            keys.set(ProviderKind::Gemini, key);
        }
        keys
    }

    fn harness(
        batches: Vec<Vec<MarketItem>>,
        gemini_env_key: Option<&str>,
        telegram: bool,
    ) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let settings = Arc::new(SettingsStore::open(dir.path()));
        if telegram {
            let mut s = Settings::default();
            s.telegram.enabled = true;
            s.telegram.bot_token = "123:abc".into();
            s.telegram.chat_id = "42".into();
            settings.save(s).unwrap();
        }

        let provider = ScriptedProvider::new(batches);
        let mut analysis = AnalysisService::new(PromptBuilder::default(), ProviderKind::Gemini)
            .with_env_keys(env_keys(gemini_env_key));
        analysis.register(provider.clone());

        let notifier = Arc::new(RecordingNotifier::default());
        let feed = Arc::new(CountingFeed::default());
        let orchestrator = Arc::new(Orchestrator::new(
            analysis,
            feed.clone(),
            notifier.clone(),
            settings,
            Duration::from_millis(500),
        ));
        Harness {
            orchestrator,
            provider,
            notifier,
            feed,
            _dir: dir,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn first_batch_primes_then_only_newer_items_are_sent() {
        let h = harness(
            vec![
                vec![item("t1", t(1)), item("t3", t(3)), item("t2", t(2))],
                vec![item("t4", t(4)), item("t2", t(2))],
            ],
            Some("env-key"),
            true,
        );

        h.orchestrator.fetch_cycle().await;
        assert!(h.notifier.sent.lock().unwrap().is_empty());
        assert_eq!(h.orchestrator.watermark().await.last_notified(), t(3));

        h.orchestrator.fetch_cycle().await;
        assert_eq!(*h.notifier.sent.lock().unwrap(), ["t4"]);
        assert_eq!(h.orchestrator.watermark().await.last_notified(), t(4));
    }

    #[tokio::test(start_paused = true)]
    async fn sends_oldest_first_with_pause_between() {
        let h = harness(
            vec![
                vec![item("t1", t(1))],
                vec![item("t7", t(7)), item("t5", t(5)), item("t6", t(6))],
            ],
            Some("env-key"),
            true,
        );
        h.orchestrator.fetch_cycle().await;

        let started = Instant::now();
        h.orchestrator.fetch_cycle().await;
        assert_eq!(*h.notifier.sent.lock().unwrap(), ["t5", "t6", "t7"]);
        assert_eq!(started.elapsed(), Duration::from_millis(1000));
    }

    #[tokio::test]
    async fn no_notifications_without_a_telegram_target() {
        let h = harness(
            vec![vec![item("a", t(1))], vec![item("b", t(9))]],
            Some("env-key"),
            false,
        );
        h.orchestrator.fetch_cycle().await;
        h.orchestrator.fetch_cycle().await;

        assert!(h.notifier.sent.lock().unwrap().is_empty());
        assert!(!h.orchestrator.watermark().await.is_primed());
    }

    #[tokio::test]
    async fn missing_key_skips_all_network_work() {
        let h = harness(vec![vec![item("a", t(1))]], None, false);

        h.orchestrator.fetch_cycle().await;

        assert_eq!(h.provider.calls(), 0);
        assert_eq!(h.feed.calls.load(Ordering::SeqCst), 0);
        let display = h.orchestrator.snapshot().await;
        assert_eq!(display.status, Status::Error);
        assert!(display.sentiment.contains("GEMINI"));
    }

    #[tokio::test]
    async fn failure_keeps_items_and_still_applies_prices() {
        let h = harness(vec![vec![item("a", t(1))]], Some("env-key"), false);

        h.orchestrator.fetch_cycle().await;
        let first = h.orchestrator.snapshot().await;
        assert_eq!(first.status, Status::Idle);
        assert_eq!(first.sentiment, "GEMINI analysis complete");
        assert_eq!(first.items.len(), 1);

        h.orchestrator.fetch_cycle().await;
        let second = h.orchestrator.snapshot().await;
        assert_eq!(second.status, Status::Error);
        assert_eq!(second.sentiment, CONNECTION_INTERRUPTED);
        assert_eq!(second.items.len(), 1);
        assert!(!second.prices.is_empty());
        assert_eq!(h.feed.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn switching_to_the_same_provider_is_a_no_op() {
        let h = harness(Vec::new(), None, false);
        assert!(!h.orchestrator.select_provider(ProviderKind::Gemini).await);
        assert!(h.orchestrator.select_provider(ProviderKind::Qwen).await);
        assert_eq!(h.orchestrator.selected_provider().await, ProviderKind::Qwen);
    }

    #[tokio::test(start_paused = true)]
    async fn poller_settles_ticks_and_accepts_triggers() {
        let batches = (0..10).map(|i| vec![item("x", t(i))]).collect();
        let h = harness(batches, Some("env-key"), false);
        let (poller, handle) = Poller::spawn(
            h.orchestrator.clone(),
            Duration::from_millis(500),
            Duration::from_secs(10),
        );

        sleep(Duration::from_millis(499)).await;
        assert_eq!(h.provider.calls(), 0);
        sleep(Duration::from_millis(2)).await;
        assert_eq!(h.provider.calls(), 1);

        sleep(Duration::from_millis(9_500)).await;
        assert_eq!(h.provider.calls(), 2);

        // manual trigger does not move the next tick
        assert!(handle.trigger(Trigger::Manual));
        sleep(Duration::from_millis(1)).await;
        assert_eq!(h.provider.calls(), 3);
        sleep(Duration::from_millis(9_990)).await;
        assert_eq!(h.provider.calls(), 3);
        sleep(Duration::from_millis(20)).await;
        assert_eq!(h.provider.calls(), 4);

        poller.shutdown().await;
        sleep(Duration::from_secs(60)).await;
        assert_eq!(h.provider.calls(), 4);
        assert!(!handle.trigger(Trigger::Manual));
    }
}
