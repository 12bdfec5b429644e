use std::sync::mpsc;
use std::time::Duration;

use nurture_core::{AnalysisId, AnalysisResponse, AnalysisStatus, StatusSnapshot};
use nurture_logging::{nurture_debug, nurture_error, nurture_info};

use crate::{AnalysisApi, PollError};

/// Message used when the server fails an analysis without saying why.
pub const DEFAULT_FAILURE_MESSAGE: &str = "analysis failed";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    /// Upper bound on status fetches, errors included.
    pub max_attempts: u32,
    /// Pause after each non-terminal fetch. Fetch latency is not subtracted.
    pub poll_interval: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            max_attempts: 30,
            poll_interval: Duration::from_millis(2000),
        }
    }
}

/// Receives every successful status observation, in fetch order.
pub trait StatusObserver: Send + Sync {
    fn observe(&self, snapshot: &StatusSnapshot);
}

impl<F> StatusObserver for F
where
    F: Fn(&StatusSnapshot) + Send + Sync,
{
    fn observe(&self, snapshot: &StatusSnapshot) {
        self(snapshot)
    }
}

/// Forwards observations to a channel so another task can consume them as events.
pub struct ChannelStatusObserver {
    tx: mpsc::Sender<StatusSnapshot>,
}

impl ChannelStatusObserver {
    pub fn new(tx: mpsc::Sender<StatusSnapshot>) -> Self {
        Self { tx }
    }
}

impl StatusObserver for ChannelStatusObserver {
    fn observe(&self, snapshot: &StatusSnapshot) {
        let _ = self.tx.send(snapshot.clone());
    }
}

/// Polls an analysis until it reaches a terminal status or the attempt budget runs out.
///
/// On `completed` the full record is fetched and returned. Transient errors,
/// from either fetch, use up an attempt and are retried after `poll_interval`;
/// the error of the final attempt is returned as is. Non-transient errors end
/// the loop immediately.
pub async fn poll_analysis(
    api: &dyn AnalysisApi,
    analysis_id: AnalysisId,
    observer: &dyn StatusObserver,
    settings: PollSettings,
) -> Result<AnalysisResponse, PollError> {
    for attempt in 1..=settings.max_attempts {
        let last_attempt = attempt == settings.max_attempts;
        match api.analysis_status(analysis_id).await {
            Ok(snapshot) => {
                observer.observe(&snapshot);
                match snapshot.status {
                    AnalysisStatus::Completed => match api.analysis_result(analysis_id).await {
                        Ok(response) => {
                            nurture_info!(
                                "Analysis {} completed after {} attempts",
                                analysis_id,
                                attempt
                            );
                            return Ok(response);
                        }
                        Err(err) => {
                            nurture_error!(
                                "Fetching result of analysis {} failed (attempt {}): {}",
                                analysis_id,
                                attempt,
                                err
                            );
                            if last_attempt || !err.is_transient() {
                                return Err(err.into());
                            }
                        }
                    },
                    AnalysisStatus::Failed => {
                        let message = snapshot
                            .message
                            .unwrap_or_else(|| DEFAULT_FAILURE_MESSAGE.to_string());
                        nurture_info!("Analysis {} failed: {}", analysis_id, message);
                        return Err(PollError::AnalysisFailed { message });
                    }
                    AnalysisStatus::Pending | AnalysisStatus::Analyzing => {
                        nurture_debug!(
                            "Analysis {} is {} (progress {:?}, attempt {})",
                            analysis_id,
                            snapshot.status,
                            snapshot.progress,
                            attempt
                        );
                    }
                }
            }
            Err(err) => {
                nurture_error!(
                    "Polling analysis {} failed (attempt {}): {}",
                    analysis_id,
                    attempt,
                    err
                );
                if last_attempt || !err.is_transient() {
                    return Err(err.into());
                }
            }
        }

        tokio::time::sleep(settings.poll_interval).await;
    }

    Err(PollError::TimedOut {
        attempts: settings.max_attempts,
    })
}
