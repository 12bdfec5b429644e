#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Mutex, Once};

use nurture_client::{AnalysisApi, ApiError, ApiErrorKind};
use nurture_core::{
    AnalysisId, AnalysisResponse, AnalysisResult, AnalysisStats, AnalysisStatus, AnalysisType,
    BabyId, BatchAnalysisResponse, CreateAnalysisRequest, DailyTip, DailyTipsResponse, Priority,
    StatusSnapshot,
};

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(nurture_logging::initialize_for_tests);
}

pub fn snapshot(id: AnalysisId, status: AnalysisStatus) -> StatusSnapshot {
    StatusSnapshot {
        analysis_id: id,
        status,
        progress: (status == AnalysisStatus::Analyzing).then_some(50),
        message: None,
        updated_at: None,
    }
}

pub fn failed_with(id: AnalysisId, message: &str) -> StatusSnapshot {
    StatusSnapshot {
        message: Some(message.to_string()),
        ..snapshot(id, AnalysisStatus::Failed)
    }
}

pub fn network_error() -> ApiError {
    ApiError::new(ApiErrorKind::Network, "connection reset")
}

pub fn completed_response(id: AnalysisId, baby_id: BabyId, score: f64) -> AnalysisResponse {
    AnalysisResponse {
        analysis_id: id,
        status: AnalysisStatus::Completed,
        result: Some(AnalysisResult {
            analysis_id: id,
            baby_id,
            analysis_type: AnalysisType::Feeding,
            score: Some(score),
            insights: Vec::new(),
            alerts: Vec::new(),
            patterns: Vec::new(),
            predictions: Vec::new(),
            metadata: None,
            user_friendly: None,
        }),
        created_at: "2026-10-08T08:00:00Z".to_string(),
    }
}

pub fn tip(id: &str) -> DailyTip {
    DailyTip {
        id: id.to_string(),
        icon: String::new(),
        title: format!("tip {id}"),
        description: String::new(),
        kind: "general".to_string(),
        priority: Priority::Low,
        action_url: None,
    }
}

/// In-memory [`AnalysisApi`] replaying scripted status responses.
#[derive(Default)]
pub struct ScriptedApi {
    statuses: Mutex<VecDeque<Result<StatusSnapshot, ApiError>>>,
    results: Mutex<VecDeque<Result<AnalysisResponse, ApiError>>>,
    pub result: Mutex<Option<Result<AnalysisResponse, ApiError>>>,
    pub created: Mutex<Option<AnalysisResponse>>,
    pub latest: Mutex<Option<Result<AnalysisResponse, ApiError>>>,
    pub tips: Mutex<Vec<DailyTip>>,
    status_calls: Mutex<u32>,
    result_calls: Mutex<u32>,
    tips_calls: Mutex<u32>,
}

impl ScriptedApi {
    pub fn with_statuses(
        statuses: impl IntoIterator<Item = Result<StatusSnapshot, ApiError>>,
    ) -> Self {
        Self {
            statuses: Mutex::new(statuses.into_iter().collect()),
            ..Self::default()
        }
    }

    pub fn set_result(&self, result: Result<AnalysisResponse, ApiError>) {
        *self.result.lock().unwrap() = Some(result);
    }

    /// Answers for the next result fetches, ahead of the fixed `result`.
    pub fn script_results(
        &self,
        results: impl IntoIterator<Item = Result<AnalysisResponse, ApiError>>,
    ) {
        self.results.lock().unwrap().extend(results);
    }

    pub fn status_calls(&self) -> u32 {
        *self.status_calls.lock().unwrap()
    }

    pub fn result_calls(&self) -> u32 {
        *self.result_calls.lock().unwrap()
    }

    pub fn tips_calls(&self) -> u32 {
        *self.tips_calls.lock().unwrap()
    }
}

#[async_trait::async_trait]
impl AnalysisApi for ScriptedApi {
    async fn create_analysis(
        &self,
        _request: &CreateAnalysisRequest,
    ) -> Result<AnalysisResponse, ApiError> {
        self.created
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| ApiError::new(ApiErrorKind::HttpStatus(500), "no create scripted"))
    }

    async fn analysis_result(&self, _id: AnalysisId) -> Result<AnalysisResponse, ApiError> {
        *self.result_calls.lock().unwrap() += 1;
        if let Some(scripted) = self.results.lock().unwrap().pop_front() {
            return scripted;
        }
        self.result
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Err(ApiError::new(ApiErrorKind::NotFound, "no result scripted")))
    }

    async fn analysis_status(&self, id: AnalysisId) -> Result<StatusSnapshot, ApiError> {
        *self.status_calls.lock().unwrap() += 1;
        self.statuses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(snapshot(id, AnalysisStatus::Analyzing)))
    }

    async fn latest_analysis(
        &self,
        _baby_id: BabyId,
        _analysis_type: Option<AnalysisType>,
    ) -> Result<AnalysisResponse, ApiError> {
        self.latest
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Err(ApiError::new(ApiErrorKind::NotFound, "none")))
    }

    async fn batch_analysis(
        &self,
        _baby_id: BabyId,
        _start_date: &str,
        _end_date: &str,
    ) -> Result<BatchAnalysisResponse, ApiError> {
        Err(ApiError::new(ApiErrorKind::HttpStatus(501), "not scripted"))
    }

    async fn analysis_stats(
        &self,
        _baby_id: BabyId,
        _days: u32,
    ) -> Result<AnalysisStats, ApiError> {
        Err(ApiError::new(ApiErrorKind::HttpStatus(501), "not scripted"))
    }

    async fn generate_daily_tips(
        &self,
        _baby_id: BabyId,
        _date: Option<&str>,
    ) -> Result<DailyTipsResponse, ApiError> {
        self.daily_tips(0, None).await
    }

    async fn daily_tips(
        &self,
        _baby_id: BabyId,
        _date: Option<&str>,
    ) -> Result<DailyTipsResponse, ApiError> {
        *self.tips_calls.lock().unwrap() += 1;
        Ok(DailyTipsResponse {
            tips: self.tips.lock().unwrap().clone(),
            generated_at: String::new(),
            expired_at: String::new(),
        })
    }
}
