//! Workflow orchestration tests against in-memory collaborators.
//!
//! All tests run with paused time, so the multi-second poll intervals
//! elapse instantly.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use assert_matches::assert_matches;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use reelgen_core::poll::PollPolicy;
use reelgen_core::scene::SceneStyle;
use reelgen_core::types::DbId;
use reelgen_pipeline::{
    ArtifactError, ArtifactStore, BalanceError, BalanceStore, GenerateError, GenerationProvider,
    NewGenerationRecord, OperationHandle, OperationOutput, OperationState, ProviderError,
    RecordError, RecordStore, Reservation, SceneRequest, SceneWorkflow, WorkflowConfig,
};

// ---------------------------------------------------------------------------
// Fakes
// ---------------------------------------------------------------------------

#[derive(Default)]
struct BalanceState {
    credits: Mutex<HashMap<DbId, i64>>,
    refunds: AtomicU32,
    fail_refund: bool,
}

#[derive(Clone, Default)]
struct FakeBalance(Arc<BalanceState>);

impl FakeBalance {
    fn with_credits(user_id: DbId, credits: i64) -> Self {
        let fake = Self::default();
        fake.0.credits.lock().unwrap().insert(user_id, credits);
        fake
    }

    fn failing_refund(user_id: DbId, credits: i64) -> Self {
        let fake = Self(Arc::new(BalanceState {
            fail_refund: true,
            ..Default::default()
        }));
        fake.0.credits.lock().unwrap().insert(user_id, credits);
        fake
    }

    fn credits(&self, user_id: DbId) -> i64 {
        *self.0.credits.lock().unwrap().get(&user_id).unwrap()
    }

    fn refunds(&self) -> u32 {
        self.0.refunds.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BalanceStore for FakeBalance {
    async fn reserve(&self, user_id: DbId) -> Result<Reservation, BalanceError> {
        let mut credits = self.0.credits.lock().unwrap();
        let balance = credits.get_mut(&user_id).ok_or(BalanceError::UserNotFound)?;
        if *balance <= 0 {
            return Err(BalanceError::InsufficientCredits);
        }
        *balance -= 1;
        Ok(Reservation {
            remaining: *balance,
        })
    }

    async fn refund(&self, user_id: DbId) -> Result<(), BalanceError> {
        if self.0.fail_refund {
            return Err(BalanceError::Unavailable("ledger down".to_string()));
        }
        let mut credits = self.0.credits.lock().unwrap();
        *credits.entry(user_id).or_insert(0) += 1;
        self.0.refunds.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Default)]
struct ProviderState {
    /// States returned by successive polls; once drained, polls report
    /// `Pending` forever.
    polls: Mutex<VecDeque<Result<OperationState, ProviderError>>>,
    poll_count: AtomicU32,
    fail_submit: bool,
    fail_fetch: bool,
}

#[derive(Clone, Default)]
struct FakeProvider(Arc<ProviderState>);

impl FakeProvider {
    fn scripted(polls: Vec<Result<OperationState, ProviderError>>) -> Self {
        Self(Arc::new(ProviderState {
            polls: Mutex::new(polls.into_iter().collect()),
            ..Default::default()
        }))
    }

    fn done_after(pending_polls: usize) -> Self {
        let mut polls: Vec<Result<OperationState, ProviderError>> = Vec::new();
        for _ in 0..pending_polls {
            polls.push(Ok(OperationState::Pending));
        }
        polls.push(Ok(OperationState::Done(output())));
        Self::scripted(polls)
    }

    fn never_done() -> Self {
        Self::scripted(Vec::new())
    }

    fn poll_count(&self) -> u32 {
        self.0.poll_count.load(Ordering::SeqCst)
    }
}

fn output() -> OperationOutput {
    OperationOutput {
        media_url: "https://provider.example/v/abc".to_string(),
        content_type: "video/mp4".to_string(),
    }
}

#[async_trait]
impl GenerationProvider for FakeProvider {
    async fn submit(&self, _request: &SceneRequest) -> Result<OperationHandle, ProviderError> {
        if self.0.fail_submit {
            return Err(ProviderError("submission rejected".to_string()));
        }
        Ok(OperationHandle("op-1".to_string()))
    }

    async fn poll(&self, _handle: &OperationHandle) -> Result<OperationState, ProviderError> {
        self.0.poll_count.fetch_add(1, Ordering::SeqCst);
        self.0
            .polls
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(OperationState::Pending))
    }

    async fn fetch(&self, _output: &OperationOutput) -> Result<Vec<u8>, ProviderError> {
        if self.0.fail_fetch {
            return Err(ProviderError("HTTP 500 from output url".to_string()));
        }
        Ok(b"video-bytes".to_vec())
    }
}

#[derive(Default)]
struct ArtifactState {
    objects: Mutex<Vec<(String, usize, String)>>,
    fail: bool,
}

#[derive(Clone, Default)]
struct FakeArtifacts(Arc<ArtifactState>);

impl FakeArtifacts {
    fn failing() -> Self {
        Self(Arc::new(ArtifactState {
            fail: true,
            ..Default::default()
        }))
    }

    fn keys(&self) -> Vec<String> {
        self.0
            .objects
            .lock()
            .unwrap()
            .iter()
            .map(|(k, _, _)| k.clone())
            .collect()
    }
}

#[async_trait]
impl ArtifactStore for FakeArtifacts {
    async fn put(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, ArtifactError> {
        if self.0.fail {
            return Err(ArtifactError("bucket unavailable".to_string()));
        }
        self.0
            .objects
            .lock()
            .unwrap()
            .push((key.to_string(), bytes.len(), content_type.to_string()));
        Ok(format!("https://cdn.example.com/{key}"))
    }
}

#[derive(Default)]
struct RecordState {
    rows: Mutex<Vec<NewGenerationRecord>>,
    fail: bool,
}

#[derive(Clone, Default)]
struct FakeRecords(Arc<RecordState>);

impl FakeRecords {
    fn failing() -> Self {
        Self(Arc::new(RecordState {
            fail: true,
            ..Default::default()
        }))
    }

    fn count(&self) -> usize {
        self.0.rows.lock().unwrap().len()
    }
}

#[async_trait]
impl RecordStore for FakeRecords {
    async fn insert(&self, record: NewGenerationRecord) -> Result<DbId, RecordError> {
        if self.0.fail {
            return Err(RecordError("insert failed".to_string()));
        }
        let mut rows = self.0.rows.lock().unwrap();
        rows.push(record);
        Ok(rows.len() as DbId)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

type TestWorkflow = SceneWorkflow<FakeBalance, FakeProvider, FakeArtifacts, FakeRecords>;

fn workflow(balance: FakeBalance, provider: FakeProvider) -> (TestWorkflow, FakeArtifacts, FakeRecords) {
    workflow_with(balance, provider, FakeArtifacts::default(), FakeRecords::default())
}

fn workflow_with(
    balance: FakeBalance,
    provider: FakeProvider,
    artifacts: FakeArtifacts,
    records: FakeRecords,
) -> (TestWorkflow, FakeArtifacts, FakeRecords) {
    let config = WorkflowConfig {
        poll: PollPolicy::new(Duration::from_secs(5), 3),
    };
    (
        SceneWorkflow::new(balance, provider, artifacts.clone(), records.clone(), config),
        artifacts,
        records,
    )
}

fn request(user_id: DbId) -> SceneRequest {
    SceneRequest {
        user_id,
        prompt: "a fox running through snow".to_string(),
        style: SceneStyle::Anime,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

/// Credits 1, operation done on the first poll: remaining 0, one
/// artifact, one record, no refund.
#[tokio::test(start_paused = true)]
async fn success_spends_exactly_one_credit() {
    let balance = FakeBalance::with_credits(1, 1);
    let (wf, artifacts, records) = workflow(balance.clone(), FakeProvider::done_after(0));

    let result = wf.generate(request(1), &CancellationToken::new()).await.unwrap();

    assert_eq!(result.remaining_credits, 0);
    assert_eq!(result.generation_id, 1);
    assert!(result.video_url.starts_with("https://cdn.example.com/generated-scenes/1/"));
    assert_eq!(balance.credits(1), 0);
    assert_eq!(balance.refunds(), 0);
    assert_eq!(artifacts.keys().len(), 1);
    assert_eq!(records.count(), 1);
}

/// Credits 0: fails with `InsufficientCredits` and nothing else happens.
#[tokio::test(start_paused = true)]
async fn insufficient_credits_touches_nothing() {
    let balance = FakeBalance::with_credits(1, 0);
    let provider = FakeProvider::done_after(0);
    let (wf, artifacts, records) = workflow(balance.clone(), provider.clone());

    let err = wf.generate(request(1), &CancellationToken::new()).await.unwrap_err();

    assert_matches!(err, GenerateError::InsufficientCredits);
    assert!(!err.refundable());
    assert_eq!(balance.credits(1), 0);
    assert_eq!(balance.refunds(), 0);
    assert_eq!(provider.poll_count(), 0);
    assert!(artifacts.keys().is_empty());
    assert_eq!(records.count(), 0);
}

/// Unknown account: `UserNotFound`, no refund attempted.
#[tokio::test(start_paused = true)]
async fn missing_account_is_not_refunded() {
    let balance = FakeBalance::default();
    let (wf, _, _) = workflow(balance.clone(), FakeProvider::done_after(0));

    let err = wf.generate(request(42), &CancellationToken::new()).await.unwrap_err();

    assert_matches!(err, GenerateError::UserNotFound);
    assert_eq!(balance.refunds(), 0);
}

/// Provider reports failure on the first poll: generic failure to the
/// caller, balance restored to its pre-call value.
#[tokio::test(start_paused = true)]
async fn provider_failure_refunds_the_credit() {
    let balance = FakeBalance::with_credits(1, 3);
    let provider = FakeProvider::scripted(vec![Ok(OperationState::Failed(
        "quota exceeded".to_string(),
    ))]);
    let (wf, artifacts, records) = workflow(balance.clone(), provider);

    let err = wf.generate(request(1), &CancellationToken::new()).await.unwrap_err();

    assert_matches!(err, GenerateError::GenerationFailed(detail) if detail == "quota exceeded");
    assert_eq!(balance.credits(1), 3);
    assert_eq!(balance.refunds(), 1);
    assert!(artifacts.keys().is_empty());
    assert_eq!(records.count(), 0);
}

/// Submission itself failing also refunds.
#[tokio::test(start_paused = true)]
async fn submit_failure_refunds_the_credit() {
    let balance = FakeBalance::with_credits(1, 2);
    let provider = FakeProvider(Arc::new(ProviderState {
        fail_submit: true,
        ..Default::default()
    }));
    let (wf, _, _) = workflow(balance.clone(), provider);

    let err = wf.generate(request(1), &CancellationToken::new()).await.unwrap_err();

    assert_matches!(err, GenerateError::GenerationFailed(_));
    assert_eq!(balance.credits(1), 2);
    assert_eq!(balance.refunds(), 1);
}

/// Download failure: `DownloadFailed`, refund, no artifact persisted.
#[tokio::test(start_paused = true)]
async fn download_failure_refunds_and_stores_nothing() {
    let balance = FakeBalance::with_credits(1, 2);
    let provider = FakeProvider(Arc::new(ProviderState {
        polls: Mutex::new(VecDeque::from([Ok(OperationState::Done(output()))])),
        fail_fetch: true,
        ..Default::default()
    }));
    let (wf, artifacts, records) = workflow(balance.clone(), provider);

    let err = wf.generate(request(1), &CancellationToken::new()).await.unwrap_err();

    assert_matches!(err, GenerateError::DownloadFailed(_));
    assert_eq!(balance.credits(1), 2);
    assert_eq!(balance.refunds(), 1);
    assert!(artifacts.keys().is_empty());
    assert_eq!(records.count(), 0);
}

/// Upload failure: `UploadFailed` with a refund.
#[tokio::test(start_paused = true)]
async fn upload_failure_refunds() {
    let balance = FakeBalance::with_credits(1, 2);
    let (wf, _, records) = workflow_with(
        balance.clone(),
        FakeProvider::done_after(0),
        FakeArtifacts::failing(),
        FakeRecords::default(),
    );

    let err = wf.generate(request(1), &CancellationToken::new()).await.unwrap_err();

    assert_matches!(err, GenerateError::UploadFailed(_));
    assert_eq!(balance.credits(1), 2);
    assert_eq!(records.count(), 0);
}

/// Record-write failure: the artifact already exists (accepted orphan),
/// but the caller sees a failure and the credit comes back.
#[tokio::test(start_paused = true)]
async fn record_failure_refunds_despite_orphaned_artifact() {
    let balance = FakeBalance::with_credits(1, 2);
    let (wf, artifacts, _) = workflow_with(
        balance.clone(),
        FakeProvider::done_after(0),
        FakeArtifacts::default(),
        FakeRecords::failing(),
    );

    let err = wf.generate(request(1), &CancellationToken::new()).await.unwrap_err();

    assert_matches!(err, GenerateError::PersistenceError(_));
    assert_eq!(balance.credits(1), 2);
    assert_eq!(balance.refunds(), 1);
    assert_eq!(artifacts.keys().len(), 1);
}

/// An operation that never completes hits the attempt cap, fails with
/// `GenerationTimeout`, and refunds -- it is not left suspended.
#[tokio::test(start_paused = true)]
async fn timeout_bounds_polling_and_refunds() {
    let balance = FakeBalance::with_credits(1, 1);
    let provider = FakeProvider::never_done();
    let (wf, _, _) = workflow(balance.clone(), provider.clone());

    let err = wf.generate(request(1), &CancellationToken::new()).await.unwrap_err();

    assert_matches!(err, GenerateError::GenerationTimeout(wait) if wait == Duration::from_secs(15));
    assert_eq!(provider.poll_count(), 3);
    assert_eq!(balance.credits(1), 1);
    assert_eq!(balance.refunds(), 1);
}

/// A transient poll transport error is retried; the next successful
/// poll completes the workflow.
#[tokio::test(start_paused = true)]
async fn transient_poll_error_is_retried() {
    let balance = FakeBalance::with_credits(1, 1);
    let provider = FakeProvider::scripted(vec![
        Err(ProviderError("connection reset".to_string())),
        Ok(OperationState::Done(output())),
    ]);
    let (wf, _, records) = workflow(balance.clone(), provider.clone());

    let result = wf.generate(request(1), &CancellationToken::new()).await.unwrap();

    assert_eq!(result.remaining_credits, 0);
    assert_eq!(provider.poll_count(), 2);
    assert_eq!(records.count(), 1);
}

/// Cancellation during polling still completes the refund obligation.
#[tokio::test(start_paused = true)]
async fn cancellation_refunds_the_credit() {
    let balance = FakeBalance::with_credits(1, 1);
    let (wf, _, records) = workflow(balance.clone(), FakeProvider::never_done());

    let cancel = CancellationToken::new();
    cancel.cancel();
    let err = wf.generate(request(1), &cancel).await.unwrap_err();

    assert_matches!(err, GenerateError::Cancelled);
    assert_eq!(balance.credits(1), 1);
    assert_eq!(balance.refunds(), 1);
    assert_eq!(records.count(), 0);
}

/// When the refund itself fails, the caller still sees the original
/// workflow error; the gap is alerted, not propagated.
#[tokio::test(start_paused = true)]
async fn refund_failure_does_not_mask_the_original_error() {
    let balance = FakeBalance::failing_refund(1, 2);
    let provider = FakeProvider::scripted(vec![Ok(OperationState::Failed("oom".to_string()))]);
    let (wf, _, _) = workflow(balance.clone(), provider);

    let err = wf.generate(request(1), &CancellationToken::new()).await.unwrap_err();

    assert_matches!(err, GenerateError::GenerationFailed(_));
    // The debit stands until manual reconciliation.
    assert_eq!(balance.credits(1), 1);
}

/// Two concurrent generations against a balance of 1: exactly one
/// succeeds, the other fails before spending anything.
#[tokio::test(start_paused = true)]
async fn concurrent_generations_cannot_both_win_last_credit() {
    let balance = FakeBalance::with_credits(1, 1);
    let (wf_a, _, _) = workflow(balance.clone(), FakeProvider::done_after(1));
    let (wf_b, _, _) = workflow(balance.clone(), FakeProvider::done_after(1));

    let cancel = CancellationToken::new();
    let (a, b) = tokio::join!(wf_a.generate(request(1), &cancel), wf_b.generate(request(1), &cancel));

    let successes = [a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count();
    assert_eq!(successes, 1);
    let failure = if a.is_err() { a.unwrap_err() } else { b.unwrap_err() };
    assert_matches!(failure, GenerateError::InsufficientCredits);
    assert_eq!(balance.credits(1), 0);
    assert_eq!(balance.refunds(), 0);
}

/// N successful generations produce N distinct artifact keys and
/// record ids for the same user.
#[tokio::test(start_paused = true)]
async fn repeated_generations_produce_distinct_keys_and_ids() {
    let balance = FakeBalance::with_credits(1, 3);
    let artifacts = FakeArtifacts::default();
    let records = FakeRecords::default();
    let (wf, artifacts, records) = workflow_with(
        balance,
        FakeProvider::scripted(vec![
            Ok(OperationState::Done(output())),
            Ok(OperationState::Done(output())),
            Ok(OperationState::Done(output())),
        ]),
        artifacts,
        records,
    );

    let cancel = CancellationToken::new();
    let mut ids = Vec::new();
    for _ in 0..3 {
        ids.push(wf.generate(request(1), &cancel).await.unwrap().generation_id);
    }

    let keys = artifacts.keys();
    assert_eq!(keys.len(), 3);
    let mut deduped = keys.clone();
    deduped.sort();
    deduped.dedup();
    assert_eq!(deduped.len(), 3);

    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 3);
    assert_eq!(records.count(), 3);
}
