use std::path::Path;

use nurture_client::{read_optional, write_atomic};
use nurture_core::StoreSnapshot;
use nurture_logging::{nurture_error, nurture_info, nurture_warn};

/// Loads the cached store; a missing or unreadable file yields an empty snapshot.
pub(crate) fn load_snapshot(path: &Path) -> StoreSnapshot {
    let content = match read_optional(path) {
        Ok(Some(text)) => text,
        Ok(None) => return StoreSnapshot::default(),
        Err(err) => {
            nurture_warn!("Failed to read cached analyses from {:?}: {}", path, err);
            return StoreSnapshot::default();
        }
    };

    match ron::from_str::<StoreSnapshot>(&content) {
        Ok(snapshot) => {
            nurture_info!(
                "Loaded {} cached analyses from {:?}",
                snapshot.analyses.len(),
                path
            );
            snapshot
        }
        Err(err) => {
            nurture_warn!("Failed to parse cached analyses from {:?}: {}", path, err);
            StoreSnapshot::default()
        }
    }
}

pub(crate) fn save_snapshot(path: &Path, snapshot: &StoreSnapshot) {
    let pretty = ron::ser::PrettyConfig::new();
    let content = match ron::ser::to_string_pretty(snapshot, pretty) {
        Ok(text) => text,
        Err(err) => {
            nurture_error!("Failed to serialize cached analyses: {}", err);
            return;
        }
    };

    if let Err(err) = write_atomic(path, content.as_bytes()) {
        nurture_error!("Failed to write cached analyses to {:?}: {}", path, err);
    }
}
