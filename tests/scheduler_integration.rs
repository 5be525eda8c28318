//! Integration tests for the scheduler running real cycles.
//!
//! These tests wire the in-memory native store, the native publish task and
//! the object-store checkpoint writer together and drive them on paused time:
//! 1. Whole-collection cycles pace, checkpoint and resume
//! 2. Fatal conditions leave cycles unhealthy
//! 3. Enable-flag transitions stop and restart every cycle
//! 4. Stopped cycles never notify again

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use serde_json::json;

use publish_carousel::adapters::metadata::ObjectStoreMetadataReadWriter;
use publish_carousel::adapters::native::InMemoryNativeStore;
use publish_carousel::adapters::storage::InMemoryObjectStore;
use publish_carousel::application::{
    CycleDeps, NativeContentPublishTask, NativeReader, Scheduler, Toggles,
};
use publish_carousel::domain::content::Content;
use publish_carousel::domain::cycle::{CycleConfig, CycleState, CycleType};
use publish_carousel::domain::filter::{BlacklistFilter, FilterChain};
use publish_carousel::ports::{Notifier, NotifierError};

// =============================================================================
// Test Infrastructure
// =============================================================================

#[derive(Debug, Clone)]
struct Notification {
    origin: String,
    tid: String,
    uuid: String,
}

/// Notifier recording every call
#[derive(Default)]
struct RecordingNotifier {
    calls: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    fn count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn calls(&self) -> Vec<Notification> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(
        &self,
        origin: &str,
        tid: &str,
        content: &Content,
        _hash: &str,
    ) -> Result<(), NotifierError> {
        let uuid = content.uuid().unwrap_or_default().to_string();
        self.calls.lock().unwrap().push(Notification {
            origin: origin.to_string(),
            tid: tid.to_string(),
            uuid,
        });
        Ok(())
    }

    async fn gtg(&self) -> Result<(), NotifierError> {
        Ok(())
    }
}

struct Harness {
    store: Arc<InMemoryNativeStore>,
    objects: Arc<InMemoryObjectStore>,
    notifier: Arc<RecordingNotifier>,
}

impl Harness {
    fn new() -> Self {
        Self {
            store: Arc::new(InMemoryNativeStore::new()),
            objects: Arc::new(InMemoryObjectStore::new()),
            notifier: Arc::new(RecordingNotifier::default()),
        }
    }

    async fn seed(&self, count: usize) {
        let now = Utc::now();
        for i in 0..count {
            let uuid = format!("00000000-0000-0000-0000-{:012}", i);
            self.store
                .insert(
                    "methode",
                    &uuid,
                    json!({"uuid": uuid, "type": "Article"}),
                    now - ChronoDuration::minutes(i as i64),
                )
                .await;
        }
    }

    fn scheduler(&self, filters: FilterChain) -> Scheduler {
        let publisher =
            NativeContentPublishTask::new(NativeReader::new(self.store.clone()), self.notifier.clone());
        Scheduler::new(
            CycleDeps {
                store: self.store.clone(),
                publisher: Arc::new(publisher),
                filters,
            },
            Arc::new(ObjectStoreMetadataReadWriter::new(self.objects.clone())),
            Duration::from_secs(1),
            Toggles {
                automatic_enabled: true,
                manual_enabled: true,
            },
        )
    }
}

fn archive(name: &str) -> CycleConfig {
    CycleConfig {
        name: name.to_string(),
        cycle_type: CycleType::ThrottledWholeCollection,
        origin: "methode-web-pub".to_string(),
        collection: "methode".to_string(),
        cool_down: Some(Duration::from_secs(60)),
        throttle: Some(Duration::from_secs(1)),
        time_window: None,
        minimum_throttle: None,
        maximum_throttle: None,
    }
}

// =============================================================================
// Whole-collection pacing and checkpoints
// =============================================================================

#[tokio::test(start_paused = true)]
async fn whole_collection_cycle_checkpoints_and_resumes() {
    let harness = Harness::new();
    harness.seed(12).await;

    let scheduler = harness.scheduler(FilterChain::new());
    let cycle = scheduler.add_cycle(archive("archive")).await.unwrap();
    scheduler.start().await.unwrap();

    tokio::time::sleep(Duration::from_millis(5_500)).await;

    let metadata = cycle.metadata().await;
    assert!((4..=6).contains(&metadata.completed), "completed {}", metadata.completed);
    assert_eq!(metadata.state, CycleState::running());
    assert_eq!(metadata.errors, 0);
    assert_eq!(metadata.total, 12);
    assert_eq!(harness.objects.write_count().await, 5);

    scheduler.shutdown().await;
    assert_eq!(harness.objects.write_count().await, 6);
    let checkpointed = cycle.metadata().await.completed;
    assert!(cycle.metadata().await.state.is_stopped());

    // A fresh process over the same checkpoint store picks up where it stopped.
    let restarted = harness.scheduler(FilterChain::new());
    let resumed = restarted.add_cycle(archive("archive")).await.unwrap();
    restarted.restore_previous_state().await;
    assert_eq!(resumed.metadata().await.completed, checkpointed);

    restarted.start().await.unwrap();
    tokio::time::sleep(Duration::from_millis(1_500)).await;
    assert_eq!(resumed.metadata().await.completed, checkpointed + 1);

    // The resumed pass continues with ids not yet published.
    let calls = harness.notifier.calls();
    let last = &calls[calls.len() - 1];
    assert_eq!(last.uuid, format!("00000000-0000-0000-0000-{:012}", checkpointed));
    assert!(calls.iter().all(|c| c.origin == "methode-web-pub"));
    restarted.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn changed_definition_discards_checkpoint() {
    let harness = Harness::new();
    harness.seed(12).await;

    let scheduler = harness.scheduler(FilterChain::new());
    scheduler.add_cycle(archive("archive")).await.unwrap();
    scheduler.start().await.unwrap();
    tokio::time::sleep(Duration::from_millis(3_500)).await;
    scheduler.shutdown().await;

    let mut changed = archive("archive");
    changed.throttle = Some(Duration::from_secs(2));
    let restarted = harness.scheduler(FilterChain::new());
    let cycle = restarted.add_cycle(changed).await.unwrap();
    restarted.restore_previous_state().await;

    assert_eq!(cycle.metadata().await.completed, 0);
}

#[tokio::test(start_paused = true)]
async fn empty_collection_is_fatal_without_notifying() {
    let harness = Harness::new();

    let scheduler = harness.scheduler(FilterChain::new());
    let cycle = scheduler.add_cycle(archive("archive")).await.unwrap();
    scheduler.start().await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(cycle.metadata().await.state, CycleState::unhealthy());
    assert_eq!(harness.notifier.count(), 0);
    scheduler.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn blacklisted_ids_are_never_published() {
    let harness = Harness::new();
    harness.seed(4).await;
    let blacklist = BlacklistFilter::from_lines(
        "00000000-0000-0000-0000-000000000000\n00000000-0000-0000-0000-000000000002\n",
    );

    let scheduler = harness.scheduler(FilterChain::new().with(Arc::new(blacklist)));
    let cycle = scheduler.add_cycle(archive("archive")).await.unwrap();
    scheduler.start().await.unwrap();
    tokio::time::sleep(Duration::from_millis(2_500)).await;

    let published: Vec<String> = harness.notifier.calls().into_iter().map(|c| c.uuid).collect();
    assert_eq!(
        published,
        vec![
            "00000000-0000-0000-0000-000000000001".to_string(),
            "00000000-0000-0000-0000-000000000003".to_string(),
        ]
    );
    assert_eq!(cycle.metadata().await.total, 2);
    scheduler.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn generated_tids_carry_the_carousel_marker() {
    let harness = Harness::new();
    harness
        .store
        .insert(
            "methode",
            "a1",
            json!({"uuid": "a1", "publishReference": "tid_1234"}),
            Utc::now(),
        )
        .await;
    harness
        .store
        .insert("methode", "b2", json!({"uuid": "b2"}), Utc::now() - ChronoDuration::hours(1))
        .await;

    let scheduler = harness.scheduler(FilterChain::new());
    scheduler.add_cycle(archive("archive")).await.unwrap();
    scheduler.start().await.unwrap();
    tokio::time::sleep(Duration::from_millis(2_500)).await;
    scheduler.shutdown().await;

    let calls = harness.notifier.calls();
    assert_eq!(calls.len(), 2);

    let referenced = &calls[0].tid;
    assert!(referenced.starts_with("tid_1234_carousel_"), "{}", referenced);
    let stamp = referenced.trim_start_matches("tid_1234_carousel_");
    assert_eq!(stamp.len(), 10);
    assert!(stamp.chars().all(|c| c.is_ascii_digit()));

    let generated = &calls[1].tid;
    assert!(generated.starts_with("tid_"), "{}", generated);
    assert!(generated.ends_with("_gentx"), "{}", generated);
    assert!(generated.contains("_carousel_"));
}

// =============================================================================
// Enable flags
// =============================================================================

#[tokio::test(start_paused = true)]
async fn automatic_flag_flip_stops_and_restarts_every_cycle_once() {
    let harness = Harness::new();
    harness.seed(12).await;

    let scheduler = harness.scheduler(FilterChain::new());
    let first = scheduler.add_cycle(archive("first")).await.unwrap();
    let second = scheduler.add_cycle(archive("second")).await.unwrap();
    scheduler.start().await.unwrap();
    tokio::time::sleep(Duration::from_millis(1_500)).await;

    scheduler.automatic_toggle_handler("false").await;
    assert!(!scheduler.is_running().await);
    for cycle in [&first, &second] {
        assert!(!cycle.is_running().await);
        assert!(cycle.metadata().await.state.is_stopped());
    }

    scheduler.automatic_toggle_handler("true").await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(scheduler.is_running().await);
    for cycle in [&first, &second] {
        assert!(cycle.is_running().await);
        assert_eq!(cycle.metadata().await.attempts, 2);
    }
    scheduler.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn unrecognised_toggle_value_disables() {
    let harness = Harness::new();
    harness.seed(3).await;

    let scheduler = harness.scheduler(FilterChain::new());
    let cycle = scheduler.add_cycle(archive("archive")).await.unwrap();
    scheduler.start().await.unwrap();

    scheduler.manual_toggle_handler("yes please").await;

    assert!(!scheduler.toggles().await.manual_enabled);
    assert!(!cycle.is_running().await);
}

#[tokio::test(start_paused = true)]
async fn stopped_scheduler_never_notifies_again() {
    let harness = Harness::new();
    harness.seed(12).await;

    let scheduler = harness.scheduler(FilterChain::new());
    let cycle = scheduler.add_cycle(archive("archive")).await.unwrap();
    scheduler.start().await.unwrap();
    tokio::time::sleep(Duration::from_millis(2_500)).await;

    scheduler.shutdown().await;
    let published = harness.notifier.count();

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(harness.notifier.count(), published);
    assert!(cycle.metadata().await.state.is_stopped());
}
