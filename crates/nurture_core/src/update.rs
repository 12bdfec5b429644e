use crate::state::AnalysisRecord;
use crate::{AnalysisStore, Effect, Msg};

/// Pure update function: applies a message to the store and returns any effects.
///
/// Concurrent writers to the same id resolve by last write wins; there is no merge.
pub fn update(mut store: AnalysisStore, msg: Msg) -> (AnalysisStore, Vec<Effect>) {
    let effects = match msg {
        Msg::AnalysisCreated { request, response } => {
            let record = AnalysisRecord::from_created(&response, &request);
            let analysis_id = record.id;
            let needs_polling = !record.status.is_terminal();
            store.insert(record);
            if needs_polling {
                store.set_in_flight(analysis_id, true);
                vec![Effect::StartPolling { analysis_id }]
            } else {
                Vec::new()
            }
        }
        Msg::StatusObserved { snapshot, now } => {
            // Observations for ids nobody asked about are ignored, and so are
            // stale ones that would move the record back along its lifecycle.
            let current = store.get(snapshot.analysis_id).map(|record| record.status);
            if current.is_some_and(|status| snapshot.status.rank() >= status.rank()) {
                if let Some(record) = store.record_mut(snapshot.analysis_id) {
                    record.apply_snapshot(&snapshot, &now);
                }
            }
            Vec::new()
        }
        Msg::ResultFetched { response, now } => {
            let analysis_id = response.analysis_id;
            if let Some(record) = store.record_mut(analysis_id) {
                record.apply_response(&response, &now);
            } else if let Some(record) = AnalysisRecord::from_result(&response, &now) {
                store.insert(record);
            }
            if response.status.is_terminal() {
                store.set_in_flight(analysis_id, false);
            }
            Vec::new()
        }
        Msg::LatestFetched {
            baby_id,
            analysis_type,
            response,
        } => {
            if let Some(mut record) = AnalysisRecord::from_result(&response, &response.created_at) {
                record.baby_id = baby_id;
                record.analysis_type = analysis_type;
                store.insert(record);
            }
            Vec::new()
        }
        Msg::PollFailed { analysis_id, now } => {
            if let Some(record) = store.record_mut(analysis_id) {
                record.mark_failed(&now);
            }
            store.set_in_flight(analysis_id, false);
            Vec::new()
        }
        Msg::CacheCleared { analysis_id } => {
            match analysis_id {
                Some(id) => store.remove(id),
                None => store.clear_analyses(),
            }
            Vec::new()
        }
        Msg::DailyTipsFetched { date, tips } => {
            store.set_daily_tips(date, tips);
            Vec::new()
        }
        Msg::DailyTipsCleared { date } => {
            store.clear_daily_tips(date.as_deref());
            Vec::new()
        }
        Msg::StatsFetched { baby_id, stats } => {
            store.set_stats(baby_id, stats);
            Vec::new()
        }
        Msg::Restore(snapshot) => {
            store.restore(snapshot);
            Vec::new()
        }
    };

    (store, effects)
}
