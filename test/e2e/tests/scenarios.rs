//! Scenarios run end to end against the simulated control plane.
//!
//! ## Running
//!
//! ```bash
//! cargo test -p roast-e2e --test scenarios
//! ```

use std::sync::Arc;
use std::time::Duration;

use roast_compute::{ComputeClient, ComputeError, ServerStatus};
use roast_e2e::{pause, stacktach, suspend, RunOptions, ScenarioError};
use roast_events::InMemoryEventStore;
use roast_poll::{PollConfig, PollError};
use roast_testing::{
    init_test_tracing, RoastConfig, Services, SimulatedCompute, SuiteContext, TagFilter,
};

fn config() -> RoastConfig {
    RoastConfig::from_toml(
        r#"
        image_ref = "img-1"
        flavor_ref = "2"
        "#,
    )
    .unwrap()
}

struct Harness {
    sim: Arc<SimulatedCompute>,
    services: Services,
}

impl Harness {
    fn new(with_events: bool) -> Self {
        init_test_tracing();
        let store = with_events.then(|| Arc::new(InMemoryEventStore::new()));
        let mut sim = SimulatedCompute::new();
        if let Some(store) = &store {
            sim = sim.with_events(Arc::clone(store));
        }
        let sim = Arc::new(sim);
        let services = Services::simulated(Arc::clone(&sim), store);
        Self { sim, services }
    }

    fn suite(&self, name: &str) -> SuiteContext {
        self.suite_with(name, &config())
    }

    fn suite_with(&self, name: &str, config: &RoastConfig) -> SuiteContext {
        SuiteContext::new(name, config, self.services.clone()).unwrap()
    }
}

#[tokio::test(start_paused = true)]
async fn pause_unpause_returns_server_to_active() {
    let harness = Harness::new(false);
    let ctx = harness.suite("pause");

    pause::pause_unpause_server(&ctx).await.unwrap();

    let server = ctx.server().await.unwrap();
    assert_eq!(
        ctx.client().get_status(&server.id).await.unwrap(),
        ServerStatus::Active
    );
    let actions: Vec<String> = harness.sim.actions().into_iter().map(|(_, a)| a).collect();
    assert_eq!(actions, vec!["pause", "unpause"]);

    assert!(ctx.teardown().await.is_clean());
    assert_eq!(harness.sim.server_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn paused_status_observed_within_a_minute() {
    let harness = Harness::new(false);
    let ctx = harness.suite("pause");
    let id = ctx.server().await.unwrap().id.clone();
    let minute = PollConfig::new(Duration::from_secs(60), Duration::from_secs(5));

    ctx.client().pause(&id).await.unwrap();
    let start = tokio::time::Instant::now();
    ctx.behaviors()
        .wait_for_server_status_with(&id, ServerStatus::Paused, &minute)
        .await
        .unwrap();
    assert!(start.elapsed() <= minute.timeout + minute.interval);

    ctx.teardown().await;
}

#[tokio::test(start_paused = true)]
async fn suspend_resume_restores_reachability() {
    let harness = Harness::new(false);
    let ctx = harness.suite("suspend");

    suspend::suspend_resume_server(&ctx).await.unwrap();

    let server = ctx.server().await.unwrap();
    let addr = ctx.accessible_ip(server).unwrap();
    ctx.reachability()
        .wait_until_reachable(addr, &PollConfig::new(Duration::ZERO, Duration::from_secs(1)))
        .await
        .unwrap();
    ctx.teardown().await;
}

#[tokio::test(start_paused = true)]
async fn hard_reboot_of_suspended_server_is_refused() {
    let harness = Harness::new(false);
    let ctx = harness.suite("suspend-negative");

    suspend::suspend_reboot_hard_server(&ctx).await.unwrap();

    let server = ctx.server().await.unwrap();
    assert_eq!(
        ctx.client().get_status(&server.id).await.unwrap(),
        ServerStatus::Suspended
    );
    let actions: Vec<String> = harness.sim.actions().into_iter().map(|(_, a)| a).collect();
    assert_eq!(actions, vec!["suspend"]);
    ctx.teardown().await;
}

#[tokio::test(start_paused = true)]
async fn status_that_never_arrives_times_out() {
    let harness = Harness::new(false);
    let mut config = config();
    config.server_status_timeout_secs = 30;
    let ctx = harness.suite_with("pause", &config);

    let id = ctx.server().await.unwrap().id.clone();
    harness.sim.set_status(&id, ServerStatus::Shutoff).unwrap();

    let err = ctx
        .behaviors()
        .wait_for_server_status(&id, ServerStatus::Active)
        .await
        .unwrap_err();
    match err {
        ComputeError::Wait(PollError::Timeout { last_observed, .. }) => {
            assert_eq!(last_observed.as_deref(), Some("SHUTOFF"));
        }
        other => panic!("expected a timeout, got {other:?}"),
    }
    ctx.teardown().await;
}

#[tokio::test(start_paused = true)]
async fn error_status_fails_pause_scenario_early() {
    let harness = Harness::new(false);
    let ctx = harness.suite("pause");
    let id = ctx.server().await.unwrap().id.clone();
    harness.sim.set_status(&id, ServerStatus::Error).unwrap();

    let err = pause::pause_unpause_server(&ctx).await.unwrap_err();
    // The simulated API refuses to pause an ERROR server.
    assert!(matches!(
        err,
        ScenarioError::Compute(ComputeError::ActionInProgress { .. })
    ));
    ctx.teardown().await;
}

#[tokio::test(start_paused = true)]
async fn created_server_has_expected_usage_records() {
    let harness = Harness::new(true);
    let ctx = harness.suite("stacktach");

    stacktach::launch_entry_on_create_server_response(&ctx)
        .await
        .unwrap();
    stacktach::launch_entry_fields_on_create_server_response(&ctx)
        .await
        .unwrap();
    stacktach::no_delete_entry_on_create_server_response(&ctx)
        .await
        .unwrap();
    stacktach::no_exist_entry_on_create_server_response(&ctx)
        .await
        .unwrap();

    assert_eq!(harness.sim.server_count(), 1);
    ctx.teardown().await;
}

#[tokio::test(start_paused = true)]
async fn usage_scenarios_need_an_event_store() {
    let harness = Harness::new(false);
    let ctx = harness.suite("stacktach");

    let err = stacktach::no_delete_entry_on_create_server_response(&ctx)
        .await
        .unwrap_err();
    assert!(matches!(err, ScenarioError::MissingEventStore));
    ctx.teardown().await;
}

#[tokio::test(start_paused = true)]
async fn full_catalog_passes_and_cleans_up() {
    let harness = Harness::new(true);

    let report = roast_e2e::run(
        &roast_e2e::catalog(),
        &config(),
        &harness.services,
        RunOptions::default(),
    )
    .await
    .unwrap();

    let failures: Vec<_> = report.outcomes.iter().filter(|o| !o.passed).collect();
    assert!(failures.is_empty(), "failed scenarios: {failures:?}");
    assert_eq!(report.passed(), 7);
    assert!(report.is_success());
    assert_eq!(harness.sim.server_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn smoke_without_network_selects_pause_and_usage_scenarios() {
    let harness = Harness::new(true);
    let filter: TagFilter = "type=smoke,net=no".parse().unwrap();
    let selected = roast_e2e::select(&filter);

    let report = roast_e2e::run(&selected, &config(), &harness.services, RunOptions::default())
        .await
        .unwrap();

    let suites: Vec<&str> = report.outcomes.iter().map(|o| o.suite).collect();
    assert_eq!(
        suites,
        vec!["pause", "stacktach", "stacktach", "stacktach", "stacktach"]
    );
    assert!(report.is_success());
}

#[tokio::test(start_paused = true)]
async fn fail_fast_stops_at_first_failure_and_still_cleans_up() {
    let harness = Harness::new(false);

    let report = roast_e2e::run(
        &roast_e2e::catalog(),
        &config(),
        &harness.services,
        RunOptions { fail_fast: true },
    )
    .await
    .unwrap();

    assert!(report.stopped_early);
    assert_eq!(report.outcomes.len(), 4);
    assert_eq!(report.failed(), 1);
    assert_eq!(
        report.outcomes.last().map(|o| o.name),
        Some("stacktach::launch_entry_on_create_server_response")
    );
    assert_eq!(harness.sim.server_count(), 0);
}
