//! Nurture core: analysis domain types, the local analysis store and view models.
mod effect;
mod msg;
mod state;
mod types;
mod update;
mod view_model;

pub use effect::Effect;
pub use msg::Msg;
pub use state::{AnalysisRecord, AnalysisStore, StoreSnapshot};
pub use types::{
    Alert, AlertLevel, AnalysisId, AnalysisResponse, AnalysisResult, AnalysisStats,
    AnalysisStatus, AnalysisType, BabyId, BatchAnalysisResponse, CreateAnalysisRequest, DailyTip,
    DailyTipsResponse, Insight, Pattern, Prediction, Priority, StatusSnapshot,
};
pub use update::update;
pub use view_model::{
    attention_items, overview, AnalysisOverview, AnalysisRowView, AttentionItem, AttentionKind,
    StoreViewModel, LOW_SCORE_THRESHOLD,
};
