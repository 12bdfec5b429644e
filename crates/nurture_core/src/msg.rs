use crate::state::StoreSnapshot;
use crate::types::{
    AnalysisId, AnalysisResponse, AnalysisStats, AnalysisType, BabyId, CreateAnalysisRequest,
    DailyTip, StatusSnapshot,
};

/// Everything that can change the local analysis store.
///
/// `now` fields carry the caller's clock as RFC 3339 so `update` stays pure.
#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// The server accepted a new analysis job.
    AnalysisCreated {
        request: CreateAnalysisRequest,
        response: AnalysisResponse,
    },
    /// A poller observed the job's status.
    StatusObserved {
        snapshot: StatusSnapshot,
        now: String,
    },
    /// The full record was fetched, either at the end of polling or directly.
    ResultFetched {
        response: AnalysisResponse,
        now: String,
    },
    /// The "latest analysis" endpoint returned a record.
    LatestFetched {
        baby_id: BabyId,
        analysis_type: AnalysisType,
        response: AnalysisResponse,
    },
    /// Polling ended in an error of any kind.
    PollFailed { analysis_id: AnalysisId, now: String },
    /// Drop one analysis, or every analysis when `None`.
    CacheCleared { analysis_id: Option<AnalysisId> },
    DailyTipsFetched { date: String, tips: Vec<DailyTip> },
    /// Drop the tips of one date, or all of them when `None`.
    DailyTipsCleared { date: Option<String> },
    StatsFetched { baby_id: BabyId, stats: AnalysisStats },
    /// Restore records persisted by an earlier run.
    Restore(StoreSnapshot),
}
