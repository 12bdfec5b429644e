mod common;

use std::sync::{mpsc, Mutex};
use std::time::Duration;

use common::{
    completed_response, failed_with, init_logging, network_error, snapshot, ScriptedApi,
};
use nurture_client::{
    poll_analysis, ApiError, ApiErrorKind, ChannelStatusObserver, PollError, PollSettings,
    StatusObserver, DEFAULT_FAILURE_MESSAGE,
};
use nurture_core::{AnalysisStatus, StatusSnapshot};
use pretty_assertions::assert_eq;
use tokio::time::Instant;

const INTERVAL: Duration = Duration::from_millis(10);

#[derive(Default)]
struct RecordingObserver {
    seen: Mutex<Vec<StatusSnapshot>>,
}

impl RecordingObserver {
    fn statuses(&self) -> Vec<AnalysisStatus> {
        self.seen.lock().unwrap().iter().map(|s| s.status).collect()
    }
}

impl StatusObserver for RecordingObserver {
    fn observe(&self, snapshot: &StatusSnapshot) {
        self.seen.lock().unwrap().push(snapshot.clone());
    }
}

fn settings(max_attempts: u32) -> PollSettings {
    PollSettings {
        max_attempts,
        poll_interval: INTERVAL,
    }
}

#[test]
fn defaults_match_the_documented_budget() {
    let defaults = PollSettings::default();
    assert_eq!(defaults.max_attempts, 30);
    assert_eq!(defaults.poll_interval, Duration::from_millis(2000));
}

#[tokio::test(start_paused = true)]
async fn resolves_after_observing_completed_and_fetching_result() {
    init_logging();
    let api = ScriptedApi::with_statuses([
        Ok(snapshot(1, AnalysisStatus::Pending)),
        Ok(snapshot(1, AnalysisStatus::Analyzing)),
        Ok(snapshot(1, AnalysisStatus::Completed)),
    ]);
    api.set_result(Ok(completed_response(1, 7, 88.0)));
    let observer = RecordingObserver::default();

    let started = Instant::now();
    let response = poll_analysis(&api, 1, &observer, settings(3)).await.unwrap();

    assert_eq!(response, completed_response(1, 7, 88.0));
    assert_eq!(api.status_calls(), 3);
    assert_eq!(api.result_calls(), 1);
    assert_eq!(
        observer.statuses(),
        vec![
            AnalysisStatus::Pending,
            AnalysisStatus::Analyzing,
            AnalysisStatus::Completed
        ]
    );
    // Two waits: after the first and second fetch, none before the first.
    let elapsed = started.elapsed();
    assert!(elapsed >= INTERVAL * 2 && elapsed < INTERVAL * 3, "{elapsed:?}");
}

#[tokio::test(start_paused = true)]
async fn times_out_after_exactly_max_attempts() {
    init_logging();
    let api = ScriptedApi::with_statuses([
        Ok(snapshot(2, AnalysisStatus::Analyzing)),
        Ok(snapshot(2, AnalysisStatus::Analyzing)),
    ]);
    let observer = RecordingObserver::default();

    let started = Instant::now();
    let err = poll_analysis(&api, 2, &observer, settings(2)).await.unwrap_err();

    assert_eq!(err, PollError::TimedOut { attempts: 2 });
    // A wait follows every non-terminal fetch, the last one included.
    let elapsed = started.elapsed();
    assert!(elapsed >= INTERVAL * 2 && elapsed < INTERVAL * 3, "{elapsed:?}");
    assert_eq!(api.status_calls(), 2);
    assert_eq!(api.result_calls(), 0);
    assert_eq!(observer.statuses().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn never_exceeds_budget_when_server_keeps_analyzing() {
    init_logging();
    // The scripted api answers `analyzing` forever once its script runs out.
    let api = ScriptedApi::with_statuses(Vec::new());
    let observer = RecordingObserver::default();

    let err = poll_analysis(&api, 3, &observer, settings(30)).await.unwrap_err();

    assert_eq!(err, PollError::TimedOut { attempts: 30 });
    assert_eq!(api.status_calls(), 30);
}

#[tokio::test(start_paused = true)]
async fn failed_status_rejects_immediately_with_server_message() {
    init_logging();
    let api = ScriptedApi::with_statuses([Ok(failed_with(4, "not enough feeding records"))]);
    let observer = RecordingObserver::default();

    let err = poll_analysis(&api, 4, &observer, settings(5)).await.unwrap_err();

    assert_eq!(
        err,
        PollError::AnalysisFailed {
            message: "not enough feeding records".to_string()
        }
    );
    assert_eq!(api.status_calls(), 1);
    assert_eq!(api.result_calls(), 0);
    assert_eq!(observer.statuses(), vec![AnalysisStatus::Failed]);
}

#[tokio::test(start_paused = true)]
async fn failed_status_without_message_uses_default() {
    init_logging();
    let api = ScriptedApi::with_statuses([Ok(snapshot(4, AnalysisStatus::Failed))]);

    let err = poll_analysis(&api, 4, &|_: &StatusSnapshot| {}, settings(5))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        PollError::AnalysisFailed {
            message: DEFAULT_FAILURE_MESSAGE.to_string()
        }
    );
}

#[tokio::test(start_paused = true)]
async fn transient_error_is_retried_and_not_observed() {
    init_logging();
    let api = ScriptedApi::with_statuses([
        Ok(snapshot(5, AnalysisStatus::Analyzing)),
        Err(network_error()),
        Ok(snapshot(5, AnalysisStatus::Completed)),
    ]);
    api.set_result(Ok(completed_response(5, 7, 70.0)));
    let observer = RecordingObserver::default();

    let response = poll_analysis(&api, 5, &observer, settings(3)).await.unwrap();

    assert_eq!(response.analysis_id, 5);
    assert_eq!(api.status_calls(), 3);
    assert_eq!(
        observer.statuses(),
        vec![AnalysisStatus::Analyzing, AnalysisStatus::Completed]
    );
}

#[tokio::test(start_paused = true)]
async fn error_on_final_attempt_propagates_instead_of_timeout() {
    init_logging();
    let api = ScriptedApi::with_statuses([
        Ok(snapshot(6, AnalysisStatus::Analyzing)),
        Ok(snapshot(6, AnalysisStatus::Analyzing)),
        Err(network_error()),
    ]);

    let err = poll_analysis(&api, 6, &|_: &StatusSnapshot| {}, settings(3))
        .await
        .unwrap_err();

    assert_eq!(err, PollError::Api(network_error()));
    assert_eq!(api.status_calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn business_error_ends_polling_without_spending_budget() {
    init_logging();
    let rejected = ApiError::new(ApiErrorKind::Business { code: 4003 }, "no permission");
    let api = ScriptedApi::with_statuses([Err(rejected.clone())]);

    let err = poll_analysis(&api, 7, &|_: &StatusSnapshot| {}, settings(10))
        .await
        .unwrap_err();

    assert_eq!(err, PollError::Api(rejected));
    assert_eq!(api.status_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn transient_result_fetch_failure_is_retried_on_next_attempt() {
    init_logging();
    let api = ScriptedApi::with_statuses([
        Ok(snapshot(8, AnalysisStatus::Completed)),
        Ok(snapshot(8, AnalysisStatus::Completed)),
    ]);
    api.script_results([Err(network_error()), Ok(completed_response(8, 7, 75.0))]);
    let observer = RecordingObserver::default();

    let started = Instant::now();
    let response = poll_analysis(&api, 8, &observer, settings(3)).await.unwrap();

    assert_eq!(response, completed_response(8, 7, 75.0));
    assert_eq!(api.status_calls(), 2);
    assert_eq!(api.result_calls(), 2);
    assert_eq!(
        observer.statuses(),
        vec![AnalysisStatus::Completed, AnalysisStatus::Completed]
    );
    assert!(started.elapsed() >= INTERVAL);
}

#[tokio::test(start_paused = true)]
async fn result_fetch_failure_on_final_attempt_propagates() {
    init_logging();
    let api = ScriptedApi::with_statuses([
        Ok(snapshot(8, AnalysisStatus::Analyzing)),
        Ok(snapshot(8, AnalysisStatus::Completed)),
    ]);
    api.set_result(Err(network_error()));

    let err = poll_analysis(&api, 8, &|_: &StatusSnapshot| {}, settings(2))
        .await
        .unwrap_err();

    assert_eq!(err, PollError::Api(network_error()));
    assert_eq!(api.status_calls(), 2);
    assert_eq!(api.result_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn non_transient_result_fetch_failure_propagates_at_once() {
    init_logging();
    let api = ScriptedApi::with_statuses([Ok(snapshot(8, AnalysisStatus::Completed))]);
    let missing = ApiError::new(ApiErrorKind::NotFound, "analysis record missing");
    api.set_result(Err(missing.clone()));

    let err = poll_analysis(&api, 8, &|_: &StatusSnapshot| {}, settings(5))
        .await
        .unwrap_err();

    assert_eq!(err, PollError::Api(missing));
    assert_eq!(api.status_calls(), 1);
    assert_eq!(api.result_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn zero_attempts_times_out_without_fetching() {
    init_logging();
    let api = ScriptedApi::with_statuses([Ok(snapshot(9, AnalysisStatus::Completed))]);

    let err = poll_analysis(&api, 9, &|_: &StatusSnapshot| {}, settings(0))
        .await
        .unwrap_err();

    assert_eq!(err, PollError::TimedOut { attempts: 0 });
    assert_eq!(api.status_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn channel_observer_emits_one_event_per_fetch() {
    init_logging();
    let api = ScriptedApi::with_statuses([
        Ok(StatusSnapshot {
            progress: Some(10),
            message: Some("loading records".to_string()),
            ..snapshot(10, AnalysisStatus::Analyzing)
        }),
        Ok(StatusSnapshot {
            progress: Some(90),
            message: Some("writing summary".to_string()),
            ..snapshot(10, AnalysisStatus::Analyzing)
        }),
        Ok(snapshot(10, AnalysisStatus::Completed)),
    ]);
    api.set_result(Ok(completed_response(10, 7, 99.0)));
    let (tx, rx) = mpsc::channel();

    poll_analysis(&api, 10, &ChannelStatusObserver::new(tx), settings(5))
        .await
        .unwrap();

    let events: Vec<_> = rx
        .try_iter()
        .map(|s| (s.status, s.progress, s.message))
        .collect();
    assert_eq!(
        events,
        vec![
            (
                AnalysisStatus::Analyzing,
                Some(10),
                Some("loading records".to_string())
            ),
            (
                AnalysisStatus::Analyzing,
                Some(90),
                Some("writing summary".to_string())
            ),
            (AnalysisStatus::Completed, None, None),
        ]
    );
}
