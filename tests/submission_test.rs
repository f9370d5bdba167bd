use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use futures::FutureExt;
use tokio::sync::Barrier;

use rater::coach::mock::ScriptedCoach;
use rater::coach::{Coach, FAILURE_FALLBACK, FeedbackGenerator};
use rater::events::EventBus;
use rater::leaderboard::Leaderboard;
use rater::score::Score;
use rater::store::sqlite::SqliteStore;
use rater::store::supabase::SupabaseStore;
use rater::store::{Record, RemoteStore, StoreError};
use rater::submission::{Form, Orchestrator, Phase, SubmissionOutcome, SubmitError};

/// Local store with switchable failures and call counters.
struct TestStore {
    inner: SqliteStore,
    available: AtomicBool,
    fail_insert: AtomicBool,
    fail_list: AtomicBool,
    panic_list: AtomicBool,
    inserts: AtomicUsize,
    lists: AtomicUsize,
}

impl TestStore {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: SqliteStore::in_memory().unwrap(),
            available: AtomicBool::new(true),
            fail_insert: AtomicBool::new(false),
            fail_list: AtomicBool::new(false),
            panic_list: AtomicBool::new(false),
            inserts: AtomicUsize::new(0),
            lists: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.inserts.load(Ordering::SeqCst) + self.lists.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteStore for TestStore {
    fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    async fn insert(&self, name: &str, score: Score) -> Result<(), StoreError> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        if self.fail_insert.load(Ordering::SeqCst) {
            return Err(StoreError::Status {
                status: 401,
                body: "invalid api key".to_string(),
            });
        }
        self.inner.insert(name, score).await
    }

    async fn list(&self) -> Result<Vec<Record>, StoreError> {
        self.lists.fetch_add(1, Ordering::SeqCst);
        if self.panic_list.load(Ordering::SeqCst) {
            panic!("list cursor exploded");
        }
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(StoreError::Transport("connection reset".to_string()));
        }
        self.inner.list().await
    }

    fn table(&self) -> Option<&str> {
        Some("clasificacion")
    }

    fn describe(&self) -> String {
        "test".to_string()
    }
}

/// Lets a test keep a handle on the coach it hands to the generator.
struct Shared(Arc<ScriptedCoach>);

#[async_trait]
impl Coach for Shared {
    async fn comment(&self, name: &str, score: Score) -> Result<String> {
        self.0.comment(name, score).await
    }

    fn describe(&self) -> String {
        self.0.describe()
    }
}

fn build(store: Arc<dyn RemoteStore>, coach: Arc<ScriptedCoach>) -> Orchestrator {
    build_with(store, Box::new(Shared(coach)))
}

fn build_with(store: Arc<dyn RemoteStore>, coach: Box<dyn Coach>) -> Orchestrator {
    let events = Arc::new(EventBus::default());
    let leaderboard = Arc::new(Leaderboard::new(Arc::clone(&store), Arc::clone(&events)));
    Orchestrator::new(store, FeedbackGenerator::new(coach), leaderboard, events)
}

const ANA_COMMENT: &str = "¡Excelente ritmo, Ana! Sigue así.";

#[tokio::test]
async fn successful_submission_shows_comment_and_refreshes() {
    let store = TestStore::new();
    let coach = Arc::new(ScriptedCoach::always(ANA_COMMENT));
    let orch = build(store.clone(), coach);

    let outcome = orch.submit("Ana", 87).await;

    match &outcome {
        SubmissionOutcome::Success { comment, form } => {
            assert_eq!(comment, ANA_COMMENT);
            assert_eq!(form, &Form::default());
        }
        other => panic!("expected Success, got {other:?}"),
    }

    assert_eq!(orch.leaderboard().refresh_count(), 1);
    let snapshot = orch.leaderboard().snapshot();
    assert_eq!(snapshot[0].name, "Ana");
    assert_eq!(snapshot[0].score, 87);
    assert_eq!(orch.phase(), Phase::Idle);
}

#[tokio::test]
async fn new_record_lands_at_the_head() {
    let store = TestStore::new();
    let orch = build(store.clone(), Arc::new(ScriptedCoach::always("ok")));

    assert!(orch.submit("Luis", 40).await.is_success());
    assert!(orch.submit("Ana", 87).await.is_success());

    let snapshot = orch.leaderboard().snapshot();
    let names: Vec<_> = snapshot.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["Ana", "Luis"]);
}

#[tokio::test]
async fn blank_name_makes_no_remote_call() {
    let store = TestStore::new();
    let coach = Arc::new(ScriptedCoach::always("never"));
    let orch = build(store.clone(), coach.clone());

    for name in ["", "   ", "\t\n"] {
        let outcome = orch.submit(name, 50).await;
        assert!(matches!(
            outcome,
            SubmissionOutcome::Failure(SubmitError::Validation)
        ));
    }

    assert_eq!(store.calls(), 0);
    assert_eq!(coach.calls(), 0);
    assert_eq!(orch.leaderboard().refresh_count(), 0);
}

#[tokio::test]
async fn unavailable_store_is_a_config_error_without_calls() {
    let store = TestStore::new();
    store.available.store(false, Ordering::SeqCst);
    let coach = Arc::new(ScriptedCoach::always("never"));
    let orch = build(store.clone(), coach.clone());

    let outcome = orch.submit("Luis", 40).await;

    assert!(matches!(outcome, SubmissionOutcome::Failure(SubmitError::Config)));
    assert_eq!(store.calls(), 0);
    assert_eq!(coach.calls(), 0);
}

#[tokio::test]
async fn unconfigured_supabase_fails_immediately() {
    let store = Arc::new(SupabaseStore::new(None, Duration::from_secs(1)).unwrap());
    let coach = Arc::new(ScriptedCoach::always("never"));
    let orch = build(store, coach.clone());

    let outcome = orch.submit("Luis", 40).await;

    assert!(matches!(outcome, SubmissionOutcome::Failure(SubmitError::Config)));
    assert_eq!(coach.calls(), 0);
}

#[tokio::test]
async fn failed_insert_discards_generated_comment() {
    let store = TestStore::new();
    store.fail_insert.store(true, Ordering::SeqCst);
    let coach = Arc::new(ScriptedCoach::always(ANA_COMMENT));
    let orch = build(store.clone(), coach.clone());

    let outcome = orch.submit("Ana", 87).await;

    assert!(!outcome.is_success());
    assert!(outcome.comment().is_none());
    assert!(!outcome.message().contains(ANA_COMMENT));
    match outcome.error() {
        Some(SubmitError::Store { source, table }) => {
            assert!(matches!(source, StoreError::Status { status: 401, .. }));
            assert_eq!(table, "clasificacion");
        }
        other => panic!("expected Store error, got {other:?}"),
    }
    assert!(outcome.message().contains("credenciales"));

    // The comment was still generated, just not shown.
    assert_eq!(coach.calls(), 1);
    assert_eq!(orch.leaderboard().refresh_count(), 0);
}

#[tokio::test]
async fn coach_timeout_still_succeeds_with_fallback() {
    let store = TestStore::new();
    let coach = Arc::new(ScriptedCoach::new(vec![Err(anyhow::anyhow!(
        "operation timed out"
    ))]));
    let orch = build(store.clone(), coach);

    let outcome = orch.submit("Ana", 87).await;

    assert_eq!(outcome.comment(), Some(FAILURE_FALLBACK));
    assert_eq!(orch.leaderboard().snapshot().len(), 1);
}

#[tokio::test]
async fn scores_are_clamped_before_storing() {
    let store = TestStore::new();
    let orch = build(store.clone(), Arc::new(ScriptedCoach::always("ok")));

    assert!(orch.submit("Alto", 150).await.is_success());
    assert!(orch.submit("Bajo", -10).await.is_success());

    let snapshot = orch.leaderboard().snapshot();
    let score_of = |name: &str| snapshot.iter().find(|r| r.name == name).unwrap().score;
    assert_eq!(score_of("Alto"), 100);
    assert_eq!(score_of("Bajo"), 0);
}

#[tokio::test]
async fn name_is_trimmed_before_storing() {
    let store = TestStore::new();
    let orch = build(store.clone(), Arc::new(ScriptedCoach::always("ok")));

    assert!(orch.submit("  Ana  ", 60).await.is_success());
    assert_eq!(orch.leaderboard().snapshot()[0].name, "Ana");
}

#[tokio::test]
async fn failed_refresh_after_success_keeps_previous_snapshot() {
    let store = TestStore::new();
    let orch = build(store.clone(), Arc::new(ScriptedCoach::always("ok")));

    assert!(orch.submit("Luis", 40).await.is_success());
    let before = orch.leaderboard().snapshot();

    store.fail_list.store(true, Ordering::SeqCst);
    let outcome = orch.submit("Ana", 87).await;

    assert!(outcome.is_success());
    assert_eq!(orch.leaderboard().refresh_count(), 2);
    assert_eq!(orch.leaderboard().snapshot(), before);
    assert!(!orch.leaderboard().is_fetching());
}

#[tokio::test]
async fn panicking_refresh_does_not_escape_submit() {
    let store = TestStore::new();
    let orch = build(store.clone(), Arc::new(ScriptedCoach::always(ANA_COMMENT)));

    assert!(orch.submit("Luis", 40).await.is_success());
    let before = orch.leaderboard().snapshot();

    store.panic_list.store(true, Ordering::SeqCst);
    let outcome = AssertUnwindSafe(orch.submit("Ana", 87))
        .catch_unwind()
        .await
        .expect("refresh panic reached the caller");

    assert_eq!(outcome.comment(), Some(ANA_COMMENT));
    assert_eq!(orch.leaderboard().refresh_count(), 2);
    assert_eq!(orch.leaderboard().snapshot(), before);
    assert!(!orch.leaderboard().is_fetching());
    assert_eq!(orch.phase(), Phase::Idle);
}

/// Store and coach that each wait for the other to have started.
struct Rendezvous {
    barrier: Arc<Barrier>,
}

#[async_trait]
impl RemoteStore for Rendezvous {
    fn is_available(&self) -> bool {
        true
    }
    async fn insert(&self, _name: &str, _score: Score) -> Result<(), StoreError> {
        self.barrier.wait().await;
        Ok(())
    }
    async fn list(&self) -> Result<Vec<Record>, StoreError> {
        Ok(vec![])
    }
    fn describe(&self) -> String {
        "rendezvous".to_string()
    }
}

#[async_trait]
impl Coach for Rendezvous {
    async fn comment(&self, _name: &str, _score: Score) -> Result<String> {
        self.barrier.wait().await;
        Ok("juntos".to_string())
    }
    fn describe(&self) -> String {
        "rendezvous".to_string()
    }
}

#[tokio::test]
async fn comment_and_insert_run_concurrently() {
    let barrier = Arc::new(Barrier::new(2));
    let store = Arc::new(Rendezvous {
        barrier: Arc::clone(&barrier),
    });
    let coach = Box::new(Rendezvous { barrier });
    let orch = build_with(store, coach);

    // Sequential execution would leave each branch waiting on the other forever.
    let outcome = tokio::time::timeout(Duration::from_secs(5), orch.submit("Ana", 87))
        .await
        .expect("branches did not overlap");

    assert_eq!(outcome.comment(), Some("juntos"));
}

/// Coach that records when it finished.
struct SlowCoach {
    finished: Arc<AtomicBool>,
}

#[async_trait]
impl Coach for SlowCoach {
    async fn comment(&self, _name: &str, _score: Score) -> Result<String> {
        tokio::time::sleep(Duration::from_millis(100)).await;
        self.finished.store(true, Ordering::SeqCst);
        Ok("tarde".to_string())
    }
    fn describe(&self) -> String {
        "slow".to_string()
    }
}

#[tokio::test]
async fn failed_insert_does_not_cancel_comment() {
    let store = TestStore::new();
    store.fail_insert.store(true, Ordering::SeqCst);
    let finished = Arc::new(AtomicBool::new(false));
    let orch = build_with(
        store,
        Box::new(SlowCoach {
            finished: Arc::clone(&finished),
        }),
    );

    let outcome = orch.submit("Ana", 87).await;

    assert!(!outcome.is_success());
    assert!(finished.load(Ordering::SeqCst));
}

#[tokio::test]
async fn slow_coach_delays_but_does_not_break_success() {
    let store = TestStore::new();
    let coach = Arc::new(ScriptedCoach::always("paciencia").with_delay(Duration::from_millis(50)));
    let orch = build(store, coach);

    let outcome = orch.submit("Ana", 87).await;
    assert_eq!(outcome.comment(), Some("paciencia"));
}
