use std::path::PathBuf;

use clap::{Parser, Subcommand};
use nurture_core::{AnalysisId, AnalysisType, BabyId};

/// Submit and follow AI analyses of a baby's care records.
#[derive(Debug, Parser)]
#[command(name = "nurture", version, about)]
pub struct Cli {
    /// RON configuration file.
    #[arg(long, global = true, default_value = "nurture.ron")]
    pub config: PathBuf,

    /// API base URL; overrides the config file.
    #[arg(long, global = true, env = "NURTURE_API_BASE_URL")]
    pub base_url: Option<String>,

    /// Bearer token; overrides the config file.
    #[arg(long, global = true, env = "NURTURE_API_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Also write logs to this file.
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Do not log to the terminal.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// More log detail; repeat for trace output.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, clap::Args)]
pub struct PollArgs {
    /// Status fetches before giving up.
    #[arg(long)]
    pub max_attempts: Option<u32>,

    /// Pause between status fetches, in milliseconds.
    #[arg(long)]
    pub interval_ms: Option<u64>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Submit a new analysis and, unless --no-wait, follow it to completion.
    Create {
        baby_id: BabyId,
        analysis_type: AnalysisType,
        /// First day covered (YYYY-MM-DD); defaults to a week before --end-date.
        #[arg(long)]
        start_date: Option<String>,
        /// Last day covered (YYYY-MM-DD); defaults to today.
        #[arg(long)]
        end_date: Option<String>,
        #[arg(long)]
        no_wait: bool,
        #[command(flatten)]
        poll: PollArgs,
    },
    /// Follow an existing analysis until it finishes.
    Poll {
        analysis_id: AnalysisId,
        #[command(flatten)]
        poll: PollArgs,
    },
    /// Fetch the full record of an analysis.
    Result { analysis_id: AnalysisId },
    /// Fetch the newest analysis of a type for a baby.
    Latest {
        baby_id: BabyId,
        analysis_type: AnalysisType,
    },
    /// Run a batch of analyses over a date range.
    Batch {
        baby_id: BabyId,
        start_date: String,
        end_date: String,
    },
    /// Server-side analysis statistics.
    Stats {
        baby_id: BabyId,
        #[arg(long, default_value_t = 30)]
        days: u32,
    },
    /// Daily care tips.
    Tips {
        baby_id: BabyId,
        #[arg(long)]
        date: Option<String>,
        /// Ask the server to generate fresh tips.
        #[arg(long)]
        generate: bool,
    },
    /// Summarize cached analyses for a baby.
    Overview { baby_id: BabyId },
    /// List cached analyses.
    List,
    /// Drop cached analyses (all, or one id) and optionally daily tips.
    ClearCache {
        analysis_id: Option<AnalysisId>,
        #[arg(long)]
        tips: bool,
    },
}
