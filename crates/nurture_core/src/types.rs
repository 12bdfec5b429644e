use std::fmt;
use std::marker::PhantomData;

use serde::de::{self, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

pub type AnalysisId = u64;
pub type BabyId = u64;

/// Server-side lifecycle of an analysis job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisStatus {
    #[default]
    Pending,
    Analyzing,
    Completed,
    Failed,
}

impl AnalysisStatus {
    /// `Completed` and `Failed` admit no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, AnalysisStatus::Completed | AnalysisStatus::Failed)
    }

    /// Position in the forward-only lifecycle; both terminal states share the top rank.
    pub fn rank(self) -> u8 {
        match self {
            AnalysisStatus::Pending => 0,
            AnalysisStatus::Analyzing => 1,
            AnalysisStatus::Completed | AnalysisStatus::Failed => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AnalysisStatus::Pending => "pending",
            AnalysisStatus::Analyzing => "analyzing",
            AnalysisStatus::Completed => "completed",
            AnalysisStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for AnalysisStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisType {
    Feeding,
    Sleep,
    Growth,
    Health,
    Behavior,
}

impl AnalysisType {
    pub const ALL: [AnalysisType; 5] = [
        AnalysisType::Feeding,
        AnalysisType::Sleep,
        AnalysisType::Growth,
        AnalysisType::Health,
        AnalysisType::Behavior,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AnalysisType::Feeding => "feeding",
            AnalysisType::Sleep => "sleep",
            AnalysisType::Growth => "growth",
            AnalysisType::Health => "health",
            AnalysisType::Behavior => "behavior",
        }
    }
}

impl fmt::Display for AnalysisType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AnalysisType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AnalysisType::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown analysis type {s:?}"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Critical,
    Warning,
    Info,
    #[serde(other)]
    Unknown,
}

impl AlertLevel {
    /// Higher is more urgent.
    pub fn priority(self) -> u8 {
        match self {
            AlertLevel::Critical => 3,
            AlertLevel::Warning => 2,
            AlertLevel::Info => 1,
            AlertLevel::Unknown => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
    #[serde(other)]
    Unknown,
}

/// One observation returned by the status endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    #[serde(deserialize_with = "deserialize_id")]
    pub analysis_id: AnalysisId,
    pub status: AnalysisStatus,
    #[serde(default)]
    pub progress: Option<u8>,
    #[serde(default, deserialize_with = "deserialize_non_empty")]
    pub message: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Body of the create, result and latest endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResponse {
    #[serde(deserialize_with = "deserialize_id")]
    pub analysis_id: AnalysisId,
    pub status: AnalysisStatus,
    #[serde(default)]
    pub result: Option<AnalysisResult>,
    #[serde(default)]
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(deserialize_with = "deserialize_id")]
    pub analysis_id: AnalysisId,
    pub baby_id: BabyId,
    pub analysis_type: AnalysisType,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub insights: Vec<Insight>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub alerts: Vec<Alert>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub patterns: Vec<Pattern>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub predictions: Vec<Prediction>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
    #[serde(default)]
    pub user_friendly: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    #[serde(rename = "type", default)]
    pub kind: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub priority: Priority,
    #[serde(default)]
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub level: AlertLevel,
    #[serde(rename = "type", default)]
    pub kind: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub suggestion: String,
    #[serde(default)]
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pattern {
    pub pattern_type: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub frequency: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub prediction_type: String,
    pub value: String,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub time_frame: String,
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateAnalysisRequest {
    pub baby_id: BabyId,
    pub analysis_type: AnalysisType,
    pub start_date: String,
    pub end_date: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchAnalysisResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub analyses: Vec<AnalysisResponse>,
    pub total_count: u32,
    pub completed_count: u32,
    pub failed_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisStats {
    pub total_analyses: u32,
    pub completed_analyses: u32,
    pub failed_analyses: u32,
    #[serde(default)]
    pub average_score: Option<f64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub analysis_type_counts: std::collections::BTreeMap<String, u32>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub recent_analyses: Vec<AnalysisResponse>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyTip {
    pub id: String,
    #[serde(default)]
    pub icon: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub priority: Priority,
    #[serde(default)]
    pub action_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyTipsResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub tips: Vec<DailyTip>,
    #[serde(default)]
    pub generated_at: String,
    #[serde(default)]
    pub expired_at: String,
}

/// The status endpoint sends ids as strings, the others as numbers.
fn deserialize_id<'de, D>(deserializer: D) -> Result<AnalysisId, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(AnalysisId),
        Text(String),
    }

    match RawId::deserialize(deserializer)? {
        RawId::Number(id) => Ok(id),
        RawId::Text(text) => text.trim().parse().map_err(serde::de::Error::custom),
    }
}

/// Unset collections arrive as `null` rather than being omitted.
///
/// Goes through `deserialize_any` so formats with explicit option syntax
/// (the RON cache) still read a plain sequence or map.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    struct NullOr<T>(PhantomData<T>);

    impl<'de, T> Visitor<'de> for NullOr<T>
    where
        T: Deserialize<'de> + Default,
    {
        type Value = T;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a collection or null")
        }

        fn visit_unit<E: de::Error>(self) -> Result<T, E> {
            Ok(T::default())
        }

        fn visit_none<E: de::Error>(self) -> Result<T, E> {
            Ok(T::default())
        }

        fn visit_some<D2: Deserializer<'de>>(self, deserializer: D2) -> Result<T, D2::Error> {
            T::deserialize(deserializer)
        }

        fn visit_seq<A: SeqAccess<'de>>(self, seq: A) -> Result<T, A::Error> {
            T::deserialize(de::value::SeqAccessDeserializer::new(seq))
        }

        fn visit_map<A: MapAccess<'de>>(self, map: A) -> Result<T, A::Error> {
            T::deserialize(de::value::MapAccessDeserializer::new(map))
        }
    }

    deserializer.deserialize_any(NullOr(PhantomData))
}

fn deserialize_non_empty<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.filter(|text| !text.trim().is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_snapshot_accepts_string_ids_and_drops_blank_messages() {
        let snapshot: StatusSnapshot = serde_json::from_str(
            r#"{"analysis_id":"42","status":"analyzing","progress":40,"message":"  "}"#,
        )
        .unwrap();
        assert_eq!(snapshot.analysis_id, 42);
        assert_eq!(snapshot.status, AnalysisStatus::Analyzing);
        assert_eq!(snapshot.progress, Some(40));
        assert_eq!(snapshot.message, None);
    }

    #[test]
    fn terminal_states_share_the_top_rank() {
        assert!(AnalysisStatus::Pending.rank() < AnalysisStatus::Analyzing.rank());
        assert_eq!(AnalysisStatus::Completed.rank(), AnalysisStatus::Failed.rank());
        assert!(AnalysisStatus::Failed.is_terminal());
        assert!(!AnalysisStatus::Analyzing.is_terminal());
    }

    #[test]
    fn null_collections_decode_as_empty() {
        let response: AnalysisResponse = serde_json::from_str(
            r#"{
                "analysis_id": 12,
                "status": "completed",
                "created_at": "2026-10-08T08:00:00Z",
                "result": {
                    "analysis_id": 12,
                    "baby_id": 3,
                    "analysis_type": "feeding",
                    "score": 82,
                    "insights": null,
                    "alerts": null,
                    "patterns": null,
                    "predictions": null,
                    "metadata": null
                }
            }"#,
        )
        .unwrap();
        let result = response.result.unwrap();
        assert_eq!(result.score, Some(82.0));
        assert!(result.insights.is_empty() && result.alerts.is_empty());
        assert!(result.patterns.is_empty() && result.predictions.is_empty());
        assert_eq!(result.metadata, None);

        let tips: DailyTipsResponse = serde_json::from_str(r#"{"tips":null}"#).unwrap();
        assert!(tips.tips.is_empty());

        let stats: AnalysisStats = serde_json::from_str(
            r#"{"total_analyses":0,"completed_analyses":0,"failed_analyses":0,
                "analysis_type_counts":null,"recent_analyses":null}"#,
        )
        .unwrap();
        assert!(stats.analysis_type_counts.is_empty());
        assert!(stats.recent_analyses.is_empty());
    }

    #[test]
    fn unexpected_levels_and_priorities_do_not_reject_the_payload() {
        let alert: Alert =
            serde_json::from_str(r#"{"level":"severe","type":"sleep","title":"late nap"}"#)
                .unwrap();
        assert_eq!(alert.level, AlertLevel::Unknown);
        assert_eq!(alert.level.priority(), 0);

        let insight: Insight =
            serde_json::from_str(r#"{"type":"sleep","title":"steady","priority":"urgent"}"#)
                .unwrap();
        assert_eq!(insight.priority, Priority::Unknown);
    }

    #[test]
    fn analysis_type_parses_case_insensitively() {
        assert_eq!("Sleep".parse::<AnalysisType>(), Ok(AnalysisType::Sleep));
        assert!("nap".parse::<AnalysisType>().is_err());
    }
}
