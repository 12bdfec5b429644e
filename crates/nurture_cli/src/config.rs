use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use nurture_client::{read_optional, ClientSettings, PollSettings};
use nurture_logging::nurture_info;
use serde::Deserialize;

use crate::cli::{Cli, PollArgs};

const DEFAULT_CACHE_FILE: &str = ".nurture_cache.ron";

/// On-disk configuration; every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    client: ClientSettings,
    poll_max_attempts: Option<u32>,
    poll_interval_ms: Option<u64>,
    cache_file: Option<PathBuf>,
}

/// Resolved settings: defaults, then the config file, then env/flags.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub client: ClientSettings,
    pub poll: PollSettings,
    pub cache_file: PathBuf,
}

impl AppConfig {
    pub fn load(cli: &Cli) -> anyhow::Result<Self> {
        let file = load_file(&cli.config)?;
        let mut client = file.client;
        if let Some(base_url) = &cli.base_url {
            client.base_url = base_url.clone();
        }
        if let Some(token) = &cli.token {
            client.token = Some(token.clone());
        }

        let defaults = PollSettings::default();
        let poll = PollSettings {
            max_attempts: file.poll_max_attempts.unwrap_or(defaults.max_attempts),
            poll_interval: file
                .poll_interval_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.poll_interval),
        };

        Ok(Self {
            client,
            poll,
            cache_file: file
                .cache_file
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CACHE_FILE)),
        })
    }

    /// Poll settings with any per-command overrides applied.
    pub fn poll_with(&self, args: &PollArgs) -> PollSettings {
        PollSettings {
            max_attempts: args.max_attempts.unwrap_or(self.poll.max_attempts),
            poll_interval: args
                .interval_ms
                .map(Duration::from_millis)
                .unwrap_or(self.poll.poll_interval),
        }
    }
}

fn load_file(path: &Path) -> anyhow::Result<FileConfig> {
    let Some(text) = read_optional(path)
        .with_context(|| format!("reading config file {}", path.display()))?
    else {
        return Ok(FileConfig::default());
    };
    let config = ron::from_str(&text)
        .with_context(|| format!("parsing config file {}", path.display()))?;
    nurture_info!("Loaded configuration from {:?}", path);
    Ok(config)
}
