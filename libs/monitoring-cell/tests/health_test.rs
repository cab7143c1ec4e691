use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use async_trait::async_trait;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

use alerting_cell::{AlertAction, AlertDispatcher, ChannelKind, ChannelRegistry, DispatchError};
use monitoring_cell::{
    CheckOutcome, ConnectivityCheck, HealthMonitor, HealthStatus, ProbePipeline, ServiceRegistry,
    TickLoop,
};
use shared_models::{Alert, AlertSubject};
use shared_utils::test_utils::TestService;
use shared_utils::RetryPolicy;

const CHANNEL: &str = "counter";

#[derive(Default)]
struct CountingDispatcher {
    triggers: AtomicU32,
    resolves: AtomicU32,
}

#[async_trait]
impl AlertDispatcher for CountingDispatcher {
    fn kind(&self) -> ChannelKind {
        ChannelKind::IncidentApi
    }

    async fn trigger(&self, _subject: &AlertSubject, _alert: &Alert) -> Result<(), DispatchError> {
        self.triggers.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn resolve(&self, _subject: &AlertSubject, _alert: &Alert) -> Result<(), DispatchError> {
        self.resolves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct FixedConnectivity(AtomicBool);

#[async_trait]
impl ConnectivityCheck for FixedConnectivity {
    async fn is_online(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

struct Harness {
    registry: Arc<ServiceRegistry>,
    monitor: Arc<HealthMonitor>,
    dispatcher: Arc<CountingDispatcher>,
    online: Arc<FixedConnectivity>,
}

impl Harness {
    fn new(url: &str) -> Self {
        let dispatcher = Arc::new(CountingDispatcher::default());
        let mut channels = ChannelRegistry::new();
        channels.register(CHANNEL, dispatcher.clone());

        let definitions = vec![TestService::new("svc-1", url)
            .code("svc")
            .owner("Ada", "+15551112222")
            .alerter(CHANNEL)
            .build()];
        let registry = Arc::new(
            ServiceRegistry::from_config(&definitions, &channels).expect("Registry builds"),
        );

        let probe = ProbePipeline::new()
            .expect("HTTP clients build")
            .with_retry_policy(RetryPolicy {
                initial_interval: Duration::from_millis(10),
                multiplier: 2.0,
                randomization_factor: 0.0,
                max_interval: Duration::from_millis(50),
                max_elapsed: Duration::from_secs(1),
            });
        let online = Arc::new(FixedConnectivity(AtomicBool::new(true)));
        let monitor = Arc::new(HealthMonitor::new(probe, online.clone()));

        Self {
            registry,
            monitor,
            dispatcher,
            online,
        }
    }

    fn tick_loop(&self) -> TickLoop {
        TickLoop::new(self.registry.clone(), self.monitor.clone(), Duration::from_secs(60))
    }

    fn triggers(&self) -> u32 {
        self.dispatcher.triggers.load(Ordering::SeqCst)
    }

    fn resolves(&self) -> u32 {
        self.dispatcher.resolves.load(Ordering::SeqCst)
    }
}

async fn respond_with(server: &MockServer, status: u16) {
    server.reset().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_three_failures_trigger_once_then_recovery_resolves_once() {
    let server = MockServer::start().await;
    let harness = Harness::new(&server.uri());
    let ticks = harness.tick_loop();

    respond_with(&server, 500).await;
    for _ in 0..3 {
        ticks.tick().await;
    }
    assert_eq!(harness.triggers(), 1);
    assert_eq!(harness.resolves(), 0);

    respond_with(&server, 200).await;
    let summary = ticks.tick().await;

    assert_eq!(summary.resolved, 1);
    assert_eq!(harness.triggers(), 1);
    assert_eq!(harness.resolves(), 1);

    let status = harness.registry.get("svc").unwrap().status().await;
    assert_eq!(status.status, HealthStatus::Healthy);
    assert!(status.last_error.is_none());
}

#[tokio::test]
async fn test_healthy_service_never_dispatches() {
    let server = MockServer::start().await;
    respond_with(&server, 200).await;
    let harness = Harness::new(&server.uri());
    let ticks = harness.tick_loop();

    ticks.tick().await;
    ticks.tick().await;

    assert_eq!(harness.triggers(), 0);
    assert_eq!(harness.resolves(), 0);
    let service = harness.registry.get("svc").unwrap();
    assert_eq!(service.snapshot().await.last_result, HealthStatus::Healthy);
}

#[tokio::test]
async fn test_failure_while_offline_changes_nothing() {
    let server = MockServer::start().await;
    respond_with(&server, 200).await;
    let harness = Harness::new(&server.uri());
    let service = harness.registry.get("svc").unwrap();

    harness.monitor.check_service(&service).await;
    let before = service.snapshot().await;

    respond_with(&server, 503).await;
    harness.online.0.store(false, Ordering::SeqCst);
    let outcome = harness.monitor.check_service(&service).await;

    assert_eq!(outcome, CheckOutcome::Suppressed);
    assert_eq!(service.snapshot().await, before);
    assert_eq!(harness.triggers(), 0);
}

#[tokio::test]
async fn test_disabled_service_is_not_probed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;
    let harness = Harness::new(&server.uri());
    let service = harness.registry.get("svc").unwrap();
    service.set_enabled(false).await;

    let summary = harness.tick_loop().tick().await;

    assert_eq!(summary.skipped, 1);
    assert_eq!(harness.triggers(), 0);
    assert_eq!(service.snapshot().await.last_result, HealthStatus::Unknown);
}

#[tokio::test]
async fn test_result_is_discarded_when_disabled_mid_check() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_delay(Duration::from_millis(300)))
        .mount(&server)
        .await;
    let harness = Harness::new(&server.uri());
    let service = harness.registry.get("svc").unwrap();

    let check = {
        let monitor = harness.monitor.clone();
        let service = service.clone();
        tokio::spawn(async move { monitor.check_service(&service).await })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;
    service.set_enabled(false).await;

    let outcome = check.await.expect("Check task completes");

    assert_eq!(outcome, CheckOutcome::Discarded);
    assert_eq!(harness.triggers(), 0);
    assert_eq!(service.snapshot().await.last_result, HealthStatus::Unknown);
}

#[tokio::test]
async fn test_overlapping_checks_of_one_service_are_skipped() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(200)))
        .mount(&server)
        .await;
    let harness = Harness::new(&server.uri());
    let service = harness.registry.get("svc").unwrap();

    let (first, second) = tokio::join!(harness.monitor.check_service(&service), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        harness.monitor.check_service(&service).await
    });

    assert_matches!(first, CheckOutcome::Checked { status: HealthStatus::Healthy, action: None });
    assert_eq!(second, CheckOutcome::InFlight);
}

#[tokio::test]
async fn test_first_failure_triggers_from_unknown() {
    let server = MockServer::start().await;
    respond_with(&server, 404).await;
    let harness = Harness::new(&server.uri());
    let service = harness.registry.get("svc").unwrap();

    let outcome = harness.monitor.check_service(&service).await;

    assert_eq!(
        outcome,
        CheckOutcome::Checked {
            status: HealthStatus::Failing,
            action: Some(AlertAction::Trigger)
        }
    );
    let state = service.snapshot().await;
    assert_eq!(state.last_error.as_deref(), Some("HTTP status was 404"));
    assert!(state.last_checked.is_some());
}

#[tokio::test]
async fn test_tick_loop_stops_on_shutdown() {
    let server = MockServer::start().await;
    respond_with(&server, 200).await;
    let harness = Harness::new(&server.uri());

    let handle = harness.tick_loop().spawn();
    tokio::time::sleep(Duration::from_millis(200)).await;

    tokio::time::timeout(Duration::from_secs(2), handle.shutdown())
        .await
        .expect("Loop should stop promptly");

    let service = harness.registry.get("svc").unwrap();
    assert_eq!(service.snapshot().await.last_result, HealthStatus::Healthy);
}

#[tokio::test]
async fn test_shutdown_abandons_a_tick_in_progress() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;
    let harness = Harness::new(&server.uri());

    let handle = harness.tick_loop().spawn();
    tokio::time::sleep(Duration::from_millis(100)).await;

    tokio::time::timeout(Duration::from_millis(300), handle.shutdown())
        .await
        .expect("Shutdown should not wait for the probe budget");

    let service = harness.registry.get("svc").unwrap();
    assert_eq!(service.snapshot().await.last_result, HealthStatus::Unknown);
    assert_eq!(harness.triggers(), 0);
}
