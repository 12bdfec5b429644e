use crate::types::{AlertLevel, AnalysisId, AnalysisStatus, AnalysisType, BabyId};
use crate::AnalysisStore;

/// Scores below this are surfaced as attention items.
pub const LOW_SCORE_THRESHOLD: f64 = 60.0;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct StoreViewModel {
    pub total: usize,
    pub in_flight: Vec<AnalysisId>,
    pub rows: Vec<AnalysisRowView>,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisRowView {
    pub id: AnalysisId,
    pub baby_id: BabyId,
    pub analysis_type: AnalysisType,
    pub status: AnalysisStatus,
    pub progress: Option<u8>,
    pub score: Option<f64>,
    pub updated_at: String,
}

/// Per-baby counts over the cached analyses.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AnalysisOverview {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
    pub failed: usize,
    /// Mean over records that carry a score; 0 when none do.
    pub average_score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttentionKind {
    Alert,
    LowScore,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttentionItem {
    pub kind: AttentionKind,
    pub title: String,
    pub description: String,
    pub level: AlertLevel,
    pub analysis_type: AnalysisType,
    pub score: Option<f64>,
}

pub fn overview(store: &AnalysisStore, baby_id: BabyId) -> AnalysisOverview {
    let mut summary = AnalysisOverview::default();
    let mut score_sum = 0.0;
    let mut scored = 0usize;

    for record in store.records().filter(|r| r.baby_id == baby_id) {
        summary.total += 1;
        match record.status {
            AnalysisStatus::Completed => summary.completed += 1,
            AnalysisStatus::Failed => summary.failed += 1,
            AnalysisStatus::Pending | AnalysisStatus::Analyzing => summary.pending += 1,
        }
        if let Some(score) = record.score {
            score_sum += score;
            scored += 1;
        }
    }

    if scored > 0 {
        summary.average_score = score_sum / scored as f64;
    }
    summary
}

/// Things a caregiver should look at for one baby, most urgent first.
///
/// Only completed analyses contribute: their critical and warning alerts, and a
/// low-score item when the score falls under [`LOW_SCORE_THRESHOLD`].
pub fn attention_items(store: &AnalysisStore, baby_id: BabyId) -> Vec<AttentionItem> {
    let mut items = Vec::new();

    for record in store
        .records()
        .filter(|r| r.baby_id == baby_id && r.status == AnalysisStatus::Completed)
    {
        if let Some(result) = &record.result {
            items.extend(
                result
                    .alerts
                    .iter()
                    .filter(|alert| matches!(alert.level, AlertLevel::Critical | AlertLevel::Warning))
                    .map(|alert| AttentionItem {
                        kind: AttentionKind::Alert,
                        title: alert.title.clone(),
                        description: alert.description.clone(),
                        level: alert.level,
                        analysis_type: record.analysis_type,
                        score: None,
                    }),
            );
        }

        if let Some(score) = record.score.filter(|score| *score < LOW_SCORE_THRESHOLD) {
            items.push(AttentionItem {
                kind: AttentionKind::LowScore,
                title: format!("{} analysis scored low", record.analysis_type),
                description: format!("score is {score}, worth keeping an eye on"),
                level: AlertLevel::Warning,
                analysis_type: record.analysis_type,
                score: Some(score),
            });
        }
    }

    // Stable: equal levels keep record order.
    items.sort_by(|a, b| b.level.priority().cmp(&a.level.priority()));
    items
}
