use std::time::Duration;

use nurture_core::{
    AnalysisId, AnalysisResponse, AnalysisStats, AnalysisType, BabyId, BatchAnalysisResponse,
    CreateAnalysisRequest, DailyTipsResponse, StatusSnapshot,
};
use serde::Serialize;

use crate::{ApiClient, ApiError, RequestOptions};

const CREATE_RETRY: RequestOptions = RequestOptions::retrying(2, Duration::from_millis(1000));
const STATUS_RETRY: RequestOptions = RequestOptions::retrying(1, Duration::from_millis(500));
const NO_RETRY: RequestOptions = RequestOptions::retrying(0, Duration::from_millis(1000));

/// The AI analysis endpoints of the backend.
#[async_trait::async_trait]
pub trait AnalysisApi: Send + Sync {
    async fn create_analysis(
        &self,
        request: &CreateAnalysisRequest,
    ) -> Result<AnalysisResponse, ApiError>;

    /// Full record; idempotent once the job is completed.
    async fn analysis_result(&self, id: AnalysisId) -> Result<AnalysisResponse, ApiError>;

    async fn analysis_status(&self, id: AnalysisId) -> Result<StatusSnapshot, ApiError>;

    async fn latest_analysis(
        &self,
        baby_id: BabyId,
        analysis_type: Option<AnalysisType>,
    ) -> Result<AnalysisResponse, ApiError>;

    async fn batch_analysis(
        &self,
        baby_id: BabyId,
        start_date: &str,
        end_date: &str,
    ) -> Result<BatchAnalysisResponse, ApiError>;

    async fn analysis_stats(&self, baby_id: BabyId, days: u32)
        -> Result<AnalysisStats, ApiError>;

    async fn generate_daily_tips(
        &self,
        baby_id: BabyId,
        date: Option<&str>,
    ) -> Result<DailyTipsResponse, ApiError>;

    async fn daily_tips(
        &self,
        baby_id: BabyId,
        date: Option<&str>,
    ) -> Result<DailyTipsResponse, ApiError>;
}

#[derive(Serialize)]
struct BatchRequest<'a> {
    baby_id: BabyId,
    start_date: &'a str,
    end_date: &'a str,
}

#[derive(Serialize)]
struct TipsRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    date: Option<&'a str>,
}

/// [`AnalysisApi`] over HTTP.
#[derive(Clone)]
pub struct HttpAnalysisApi {
    client: ApiClient,
}

impl HttpAnalysisApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }
}

#[async_trait::async_trait]
impl AnalysisApi for HttpAnalysisApi {
    async fn create_analysis(
        &self,
        request: &CreateAnalysisRequest,
    ) -> Result<AnalysisResponse, ApiError> {
        self.client.post("/ai-analysis", request, CREATE_RETRY).await
    }

    async fn analysis_result(&self, id: AnalysisId) -> Result<AnalysisResponse, ApiError> {
        self.client
            .get(&format!("/ai-analysis/{id}"), &[], NO_RETRY)
            .await
    }

    async fn analysis_status(&self, id: AnalysisId) -> Result<StatusSnapshot, ApiError> {
        self.client
            .get(&format!("/ai-analysis/{id}/status"), &[], STATUS_RETRY)
            .await
    }

    async fn latest_analysis(
        &self,
        baby_id: BabyId,
        analysis_type: Option<AnalysisType>,
    ) -> Result<AnalysisResponse, ApiError> {
        self.client
            .get(
                &format!("/ai-analysis/baby/{baby_id}/latest"),
                &[("type", analysis_type.map(|kind| kind.to_string()))],
                NO_RETRY,
            )
            .await
    }

    async fn batch_analysis(
        &self,
        baby_id: BabyId,
        start_date: &str,
        end_date: &str,
    ) -> Result<BatchAnalysisResponse, ApiError> {
        let body = BatchRequest {
            baby_id,
            start_date,
            end_date,
        };
        self.client
            .post("/ai-analysis/batch", &body, CREATE_RETRY)
            .await
    }

    async fn analysis_stats(
        &self,
        baby_id: BabyId,
        days: u32,
    ) -> Result<AnalysisStats, ApiError> {
        self.client
            .get(
                &format!("/ai-analysis/baby/{baby_id}/history"),
                &[("days", Some(days.to_string()))],
                NO_RETRY,
            )
            .await
    }

    async fn generate_daily_tips(
        &self,
        baby_id: BabyId,
        date: Option<&str>,
    ) -> Result<DailyTipsResponse, ApiError> {
        self.client
            .post(
                &format!("/ai-analysis/daily-tips/{baby_id}/generate"),
                &TipsRequest { date },
                NO_RETRY,
            )
            .await
    }

    async fn daily_tips(
        &self,
        baby_id: BabyId,
        date: Option<&str>,
    ) -> Result<DailyTipsResponse, ApiError> {
        self.client
            .get(
                &format!("/ai-analysis/daily-tips/{baby_id}"),
                &[("date", date.map(str::to_string))],
                NO_RETRY,
            )
            .await
    }
}
