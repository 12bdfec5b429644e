use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use nurture_core::{
    attention_items, overview, update, AnalysisId, AnalysisOverview, AnalysisRecord,
    AnalysisResponse, AnalysisStats, AnalysisStore, AnalysisType, AttentionItem, BabyId,
    BatchAnalysisResponse, CreateAnalysisRequest, DailyTip, Effect, Msg, StatusSnapshot,
};
use nurture_logging::{nurture_info, nurture_warn};

use crate::poll::{poll_analysis, PollSettings, StatusObserver};
use crate::{AnalysisApi, ApiError, ApiErrorKind, PollError};

/// Store shared between the service, its pollers and any front-end.
pub type SharedStore = Arc<Mutex<AnalysisStore>>;

pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Reconciles the remote analysis API into a local [`AnalysisStore`].
#[derive(Clone)]
pub struct AnalysisService {
    api: Arc<dyn AnalysisApi>,
    store: SharedStore,
    clock: Clock,
}

impl AnalysisService {
    pub fn new(api: Arc<dyn AnalysisApi>, store: SharedStore) -> Self {
        Self {
            api,
            store,
            clock: Arc::new(Utc::now),
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn store(&self) -> SharedStore {
        self.store.clone()
    }

    /// Applies a message to the shared store and returns the resulting effects.
    pub fn dispatch(&self, msg: Msg) -> Vec<Effect> {
        dispatch(&self.store, msg)
    }

    /// Submits a new analysis and mirrors it locally.
    ///
    /// The returned effects tell the caller whether a poller should be attached.
    pub async fn create_analysis(
        &self,
        request: CreateAnalysisRequest,
    ) -> Result<(AnalysisRecord, Vec<Effect>), ApiError> {
        let response = self.api.create_analysis(&request).await?;
        nurture_info!(
            "Created {} analysis {} for baby {}",
            request.analysis_type,
            response.analysis_id,
            request.baby_id
        );
        let record = AnalysisRecord::from_created(&response, &request);
        let effects = self.dispatch(Msg::AnalysisCreated { request, response });
        Ok((record, effects))
    }

    /// Runs the poller for `analysis_id`, mirroring each observation and the outcome.
    ///
    /// `observer`, when given, sees every observation after the store does.
    pub async fn track(
        &self,
        analysis_id: AnalysisId,
        settings: PollSettings,
        observer: Option<&dyn StatusObserver>,
    ) -> Result<AnalysisResponse, PollError> {
        let store = self.store.clone();
        let clock = self.clock.clone();
        let mirror = move |snapshot: &StatusSnapshot| {
            dispatch(
                &store,
                Msg::StatusObserved {
                    snapshot: snapshot.clone(),
                    now: clock().to_rfc3339(),
                },
            );
            if let Some(observer) = observer {
                observer.observe(snapshot);
            }
        };

        match poll_analysis(self.api.as_ref(), analysis_id, &mirror, settings).await {
            Ok(response) => {
                self.dispatch(Msg::ResultFetched {
                    response: response.clone(),
                    now: self.now(),
                });
                Ok(response)
            }
            Err(err) => {
                nurture_warn!("Tracking analysis {} ended: {}", analysis_id, err);
                self.dispatch(Msg::PollFailed {
                    analysis_id,
                    now: self.now(),
                });
                Err(err)
            }
        }
    }

    /// Creates an analysis and follows it to a terminal state.
    pub async fn create_and_track(
        &self,
        request: CreateAnalysisRequest,
        settings: PollSettings,
        observer: Option<&dyn StatusObserver>,
    ) -> Result<AnalysisResponse, PollError> {
        let (record, effects) = self.create_analysis(request).await?;
        let mut outcome = None;
        for effect in effects {
            match effect {
                Effect::StartPolling { analysis_id } => {
                    outcome = Some(self.track(analysis_id, settings, observer).await);
                }
            }
        }
        match outcome {
            Some(result) => result,
            // Already terminal at creation time; nothing to poll.
            None => Ok(self.refresh_result(record.id).await?),
        }
    }

    /// Fetches the full record directly and mirrors it.
    pub async fn refresh_result(
        &self,
        analysis_id: AnalysisId,
    ) -> Result<AnalysisResponse, ApiError> {
        let response = self.api.analysis_result(analysis_id).await?;
        self.dispatch(Msg::ResultFetched {
            response: response.clone(),
            now: self.now(),
        });
        Ok(response)
    }

    /// Latest analysis with a result for a baby; `None` when the server has none.
    pub async fn latest_analysis(
        &self,
        baby_id: BabyId,
        analysis_type: AnalysisType,
    ) -> Result<Option<AnalysisRecord>, ApiError> {
        let response = match self.api.latest_analysis(baby_id, Some(analysis_type)).await {
            Ok(response) => response,
            Err(err) if err.kind == ApiErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err),
        };
        if response.result.is_none() {
            return Ok(None);
        }
        let analysis_id = response.analysis_id;
        self.dispatch(Msg::LatestFetched {
            baby_id,
            analysis_type,
            response,
        });
        Ok(self.lock().get(analysis_id).cloned())
    }

    pub async fn batch_analysis(
        &self,
        baby_id: BabyId,
        start_date: &str,
        end_date: &str,
    ) -> Result<BatchAnalysisResponse, ApiError> {
        let batch = self
            .api
            .batch_analysis(baby_id, start_date, end_date)
            .await?;
        let now = self.now();
        for response in batch.analyses.iter().filter(|r| r.result.is_some()) {
            self.dispatch(Msg::ResultFetched {
                response: response.clone(),
                now: now.clone(),
            });
        }
        Ok(batch)
    }

    pub async fn analysis_stats(
        &self,
        baby_id: BabyId,
        days: u32,
    ) -> Result<AnalysisStats, ApiError> {
        let stats = self.api.analysis_stats(baby_id, days).await?;
        self.dispatch(Msg::StatsFetched {
            baby_id,
            stats: stats.clone(),
        });
        Ok(stats)
    }

    /// Tips for `date` (today when `None`), served from the store when cached.
    pub async fn daily_tips(
        &self,
        baby_id: BabyId,
        date: Option<&str>,
    ) -> Result<Vec<DailyTip>, ApiError> {
        let target = date.map(str::to_string).unwrap_or_else(|| self.today());
        if let Some(tips) = self.lock().daily_tips(&target).filter(|t| !t.is_empty()) {
            return Ok(tips.to_vec());
        }

        let response = self.api.daily_tips(baby_id, date).await?;
        self.dispatch(Msg::DailyTipsFetched {
            date: target,
            tips: response.tips.clone(),
        });
        Ok(response.tips)
    }

    pub async fn generate_daily_tips(
        &self,
        baby_id: BabyId,
        date: Option<&str>,
    ) -> Result<Vec<DailyTip>, ApiError> {
        let response = self.api.generate_daily_tips(baby_id, date).await?;
        let target = date.map(str::to_string).unwrap_or_else(|| self.today());
        self.dispatch(Msg::DailyTipsFetched {
            date: target,
            tips: response.tips.clone(),
        });
        Ok(response.tips)
    }

    pub fn clear_cache(&self, analysis_id: Option<AnalysisId>) {
        self.dispatch(Msg::CacheCleared { analysis_id });
    }

    pub fn clear_daily_tips(&self, date: Option<String>) {
        self.dispatch(Msg::DailyTipsCleared { date });
    }

    /// Whether any cached tips are still within their day, per the service clock.
    pub fn has_unexpired_tips(&self) -> bool {
        self.lock().has_unexpired_tips((self.clock)())
    }

    pub fn overview(&self, baby_id: BabyId) -> AnalysisOverview {
        overview(&self.lock(), baby_id)
    }

    pub fn attention_items(&self, baby_id: BabyId) -> Vec<AttentionItem> {
        attention_items(&self.lock(), baby_id)
    }

    fn lock(&self) -> MutexGuard<'_, AnalysisStore> {
        lock_store(&self.store)
    }

    fn now(&self) -> String {
        (self.clock)().to_rfc3339()
    }

    fn today(&self) -> String {
        (self.clock)().format("%Y-%m-%d").to_string()
    }
}

fn lock_store(store: &SharedStore) -> MutexGuard<'_, AnalysisStore> {
    // A panic elsewhere cannot leave the map half-written; keep serving it.
    store.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn dispatch(store: &SharedStore, msg: Msg) -> Vec<Effect> {
    let mut guard = lock_store(store);
    let current = std::mem::take(&mut *guard);
    let (next, effects) = update(current, msg);
    *guard = next;
    effects
}
