use crate::types::AnalysisId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// A freshly created analysis needs a poller attached.
    StartPolling { analysis_id: AnalysisId },
}
