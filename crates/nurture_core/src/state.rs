use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{
    AnalysisId, AnalysisResponse, AnalysisResult, AnalysisStats, AnalysisStatus, AnalysisType,
    BabyId, CreateAnalysisRequest, DailyTip, StatusSnapshot,
};
use crate::view_model::{AnalysisRowView, StoreViewModel};

/// Last-known local mirror of one server-side analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub id: AnalysisId,
    pub baby_id: BabyId,
    pub analysis_type: AnalysisType,
    pub status: AnalysisStatus,
    #[serde(default)]
    pub progress: Option<u8>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub end_date: String,
    #[serde(default)]
    pub result: Option<AnalysisResult>,
    #[serde(default)]
    pub score: Option<f64>,
    pub created_at: String,
    pub updated_at: String,
}

impl AnalysisRecord {
    pub fn from_created(response: &AnalysisResponse, request: &CreateAnalysisRequest) -> Self {
        let mut record = Self {
            id: response.analysis_id,
            baby_id: request.baby_id,
            analysis_type: request.analysis_type,
            status: response.status,
            progress: None,
            message: None,
            start_date: request.start_date.clone(),
            end_date: request.end_date.clone(),
            result: None,
            score: None,
            created_at: response.created_at.clone(),
            updated_at: response.created_at.clone(),
        };
        record.apply_response(response, &response.created_at);
        record
    }

    /// Builds a record when only the server response is known; needs a result to
    /// learn which baby and analysis type it belongs to.
    pub fn from_result(response: &AnalysisResponse, now: &str) -> Option<Self> {
        let result = response.result.as_ref()?;
        let mut record = Self {
            id: response.analysis_id,
            baby_id: result.baby_id,
            analysis_type: result.analysis_type,
            status: response.status,
            progress: None,
            message: None,
            start_date: String::new(),
            end_date: String::new(),
            result: None,
            score: None,
            created_at: response.created_at.clone(),
            updated_at: now.to_string(),
        };
        record.apply_response(response, now);
        Some(record)
    }

    pub(crate) fn apply_snapshot(&mut self, snapshot: &StatusSnapshot, now: &str) {
        self.status = snapshot.status;
        self.progress = match snapshot.status {
            AnalysisStatus::Analyzing => snapshot.progress.map(|p| p.min(100)),
            _ => None,
        };
        self.message = snapshot.message.clone();
        self.updated_at = now.to_string();
    }

    pub(crate) fn apply_response(&mut self, response: &AnalysisResponse, now: &str) {
        self.status = response.status;
        if response.status != AnalysisStatus::Analyzing {
            self.progress = None;
        }
        // A result only ever accompanies a completed analysis.
        match (&response.result, response.status) {
            (Some(result), AnalysisStatus::Completed) => {
                self.score = result.score;
                self.result = Some(result.clone());
            }
            (_, AnalysisStatus::Completed) => {}
            _ => {
                self.result = None;
                self.score = None;
            }
        }
        self.updated_at = now.to_string();
    }

    pub(crate) fn mark_failed(&mut self, now: &str) {
        self.status = AnalysisStatus::Failed;
        self.progress = None;
        self.result = None;
        self.score = None;
        self.updated_at = now.to_string();
    }
}

const TIPS_DATE_FORMAT: &str = "%Y-%m-%d";

/// Serializable subset of the store kept between runs.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StoreSnapshot {
    #[serde(default)]
    pub analyses: Vec<AnalysisRecord>,
    #[serde(default)]
    pub daily_tips: BTreeMap<String, Vec<DailyTip>>,
}

/// Owned local cache of analyses, daily tips and stats.
///
/// Mutated only through [`crate::update`]; no eviction, entries leave only on
/// an explicit clear.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AnalysisStore {
    analyses: BTreeMap<AnalysisId, AnalysisRecord>,
    in_flight: BTreeSet<AnalysisId>,
    daily_tips: BTreeMap<String, Vec<DailyTip>>,
    stats: BTreeMap<BabyId, AnalysisStats>,
    dirty: bool,
}

impl AnalysisStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: AnalysisId) -> Option<&AnalysisRecord> {
        self.analyses.get(&id)
    }

    pub fn records(&self) -> impl Iterator<Item = &AnalysisRecord> {
        self.analyses.values()
    }

    pub fn len(&self) -> usize {
        self.analyses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.analyses.is_empty()
    }

    pub fn completed(&self) -> Vec<&AnalysisRecord> {
        self.with_status(|status| status == AnalysisStatus::Completed)
    }

    /// Records still waiting on the server: pending or analyzing.
    pub fn pending(&self) -> Vec<&AnalysisRecord> {
        self.with_status(|status| !status.is_terminal())
    }

    pub fn failed(&self) -> Vec<&AnalysisRecord> {
        self.with_status(|status| status == AnalysisStatus::Failed)
    }

    pub fn is_in_flight(&self, id: AnalysisId) -> bool {
        self.in_flight.contains(&id)
    }

    pub fn has_active_analysis(&self) -> bool {
        !self.in_flight.is_empty()
    }

    /// Newest completed analysis of the given type, by `created_at`.
    pub fn latest_by_type(&self, analysis_type: AnalysisType) -> Option<&AnalysisRecord> {
        self.analyses
            .values()
            .filter(|record| {
                record.analysis_type == analysis_type
                    && record.status == AnalysisStatus::Completed
            })
            .max_by(|a, b| compare_timestamps(&a.created_at, &b.created_at))
    }

    pub fn daily_tips(&self, date: &str) -> Option<&[DailyTip]> {
        self.daily_tips.get(date).map(Vec::as_slice)
    }

    /// Tips cached for the UTC day of `now`; empty when none are.
    pub fn today_tips(&self, now: DateTime<Utc>) -> &[DailyTip] {
        let today = now.format(TIPS_DATE_FORMAT).to_string();
        self.daily_tips(&today).unwrap_or_default()
    }

    /// A date's tips stay valid for 24 hours from its UTC midnight.
    pub fn has_unexpired_tips(&self, now: DateTime<Utc>) -> bool {
        let today = now.date_naive();
        self.daily_tips.iter().any(|(date, tips)| {
            !tips.is_empty()
                && NaiveDate::parse_from_str(date, TIPS_DATE_FORMAT).is_ok_and(|day| today <= day)
        })
    }

    pub fn stats(&self, baby_id: BabyId) -> Option<&AnalysisStats> {
        self.stats.get(&baby_id)
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            analyses: self.analyses.values().cloned().collect(),
            daily_tips: self.daily_tips.clone(),
        }
    }

    pub fn view(&self) -> StoreViewModel {
        StoreViewModel {
            total: self.analyses.len(),
            in_flight: self.in_flight.iter().copied().collect(),
            rows: self
                .analyses
                .values()
                .map(|record| AnalysisRowView {
                    id: record.id,
                    baby_id: record.baby_id,
                    analysis_type: record.analysis_type,
                    status: record.status,
                    progress: record.progress,
                    score: record.score,
                    updated_at: record.updated_at.clone(),
                })
                .collect(),
            dirty: self.dirty,
        }
    }

    /// Returns whether anything changed since the last call and resets the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn insert(&mut self, record: AnalysisRecord) {
        self.analyses.insert(record.id, record);
        self.dirty = true;
    }

    pub(crate) fn record_mut(&mut self, id: AnalysisId) -> Option<&mut AnalysisRecord> {
        let record = self.analyses.get_mut(&id)?;
        self.dirty = true;
        Some(record)
    }

    pub(crate) fn set_in_flight(&mut self, id: AnalysisId, in_flight: bool) {
        let changed = if in_flight {
            self.in_flight.insert(id)
        } else {
            self.in_flight.remove(&id)
        };
        self.dirty |= changed;
    }

    pub(crate) fn remove(&mut self, id: AnalysisId) {
        let removed = self.analyses.remove(&id).is_some();
        self.dirty |= removed;
    }

    pub(crate) fn clear_analyses(&mut self) {
        if !self.analyses.is_empty() {
            self.analyses.clear();
            self.dirty = true;
        }
    }

    pub(crate) fn set_daily_tips(&mut self, date: String, tips: Vec<DailyTip>) {
        self.daily_tips.insert(date, tips);
        self.dirty = true;
    }

    pub(crate) fn clear_daily_tips(&mut self, date: Option<&str>) {
        let changed = match date {
            Some(date) => self.daily_tips.remove(date).is_some(),
            None => {
                let had_any = !self.daily_tips.is_empty();
                self.daily_tips.clear();
                had_any
            }
        };
        self.dirty |= changed;
    }

    pub(crate) fn set_stats(&mut self, baby_id: BabyId, stats: AnalysisStats) {
        self.stats.insert(baby_id, stats);
        self.dirty = true;
    }

    pub(crate) fn restore(&mut self, snapshot: StoreSnapshot) {
        for record in snapshot.analyses {
            self.analyses.entry(record.id).or_insert(record);
        }
        for (date, tips) in snapshot.daily_tips {
            self.daily_tips.entry(date).or_insert(tips);
        }
        self.dirty = true;
    }

    fn with_status(&self, predicate: impl Fn(AnalysisStatus) -> bool) -> Vec<&AnalysisRecord> {
        self.analyses
            .values()
            .filter(|record| predicate(record.status))
            .collect()
    }
}

/// Orders RFC 3339 timestamps chronologically, falling back to text order.
fn compare_timestamps(a: &str, b: &str) -> std::cmp::Ordering {
    match (
        chrono::DateTime::parse_from_rfc3339(a),
        chrono::DateTime::parse_from_rfc3339(b),
    ) {
        (Ok(a), Ok(b)) => a.cmp(&b),
        _ => a.cmp(b),
    }
}
