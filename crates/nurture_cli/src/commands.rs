use anyhow::Context;
use chrono::{Days, NaiveDate, Utc};
use nurture_client::{AnalysisService, StatusObserver};
use nurture_core::{
    AnalysisRecord, AnalysisResponse, AnalysisStatus, AttentionKind, CreateAnalysisRequest,
    StatusSnapshot,
};

use crate::cli::Command;
use crate::config::AppConfig;

const DATE_FORMAT: &str = "%Y-%m-%d";
const DEFAULT_RANGE_DAYS: u64 = 7;

pub(crate) async fn run(
    service: &AnalysisService,
    config: &AppConfig,
    command: Command,
) -> anyhow::Result<()> {
    match command {
        Command::Create {
            baby_id,
            analysis_type,
            start_date,
            end_date,
            no_wait,
            poll,
        } => {
            let observer: &dyn StatusObserver = &print_progress;
            let (start_date, end_date) = date_range(start_date, end_date)?;
            let request = CreateAnalysisRequest {
                baby_id,
                analysis_type,
                start_date,
                end_date,
            };
            if no_wait {
                let (record, _effects) = service.create_analysis(request).await?;
                println!("analysis {} submitted ({})", record.id, record.status);
            } else {
                let response = service
                    .create_and_track(request, config.poll_with(&poll), Some(observer))
                    .await?;
                print_response(&response);
            }
        }
        Command::Poll { analysis_id, poll } => {
            let observer: &dyn StatusObserver = &print_progress;
            let response = service
                .track(analysis_id, config.poll_with(&poll), Some(observer))
                .await?;
            print_response(&response);
        }
        Command::Result { analysis_id } => {
            let response = service.refresh_result(analysis_id).await?;
            print_response(&response);
        }
        Command::Latest {
            baby_id,
            analysis_type,
        } => match service.latest_analysis(baby_id, analysis_type).await? {
            Some(record) => print_record(&record),
            None => println!("no {analysis_type} analysis for baby {baby_id}"),
        },
        Command::Batch {
            baby_id,
            start_date,
            end_date,
        } => {
            let batch = service
                .batch_analysis(baby_id, &start_date, &end_date)
                .await?;
            println!(
                "batch: {} total, {} completed, {} failed",
                batch.total_count, batch.completed_count, batch.failed_count
            );
            for response in &batch.analyses {
                println!("  #{} {}", response.analysis_id, response.status);
            }
        }
        Command::Stats { baby_id, days } => {
            let stats = service.analysis_stats(baby_id, days).await?;
            println!(
                "last {days} days: {} analyses, {} completed, {} failed",
                stats.total_analyses, stats.completed_analyses, stats.failed_analyses
            );
            if let Some(average) = stats.average_score {
                println!("average score: {average:.1}");
            }
            for (kind, count) in &stats.analysis_type_counts {
                println!("  {kind}: {count}");
            }
        }
        Command::Tips {
            baby_id,
            date,
            generate,
        } => {
            let tips = if generate {
                service.generate_daily_tips(baby_id, date.as_deref()).await?
            } else {
                service.daily_tips(baby_id, date.as_deref()).await?
            };
            if tips.is_empty() {
                println!("no tips");
            }
            for tip in tips {
                println!("[{:?}] {}: {}", tip.priority, tip.title, tip.description);
            }
        }
        Command::Overview { baby_id } => {
            let overview = service.overview(baby_id);
            println!(
                "{} analyses: {} completed, {} pending, {} failed, average score {:.1}",
                overview.total,
                overview.completed,
                overview.pending,
                overview.failed,
                overview.average_score
            );
            for item in service.attention_items(baby_id) {
                let marker = match item.kind {
                    AttentionKind::Alert => "alert",
                    AttentionKind::LowScore => "score",
                };
                println!(
                    "  {marker} {:?} [{}] {}: {}",
                    item.level, item.analysis_type, item.title, item.description
                );
            }
        }
        Command::List => {
            let store = service.store();
            let view = store
                .lock()
                .map_err(|_| anyhow::anyhow!("analysis store is poisoned"))?
                .view();
            if view.rows.is_empty() {
                println!("no cached analyses");
            }
            for row in view.rows {
                let busy = if view.in_flight.contains(&row.id) {
                    " (in flight)"
                } else {
                    ""
                };
                println!(
                    "#{} baby {} {} {}{} score {} updated {}",
                    row.id,
                    row.baby_id,
                    row.analysis_type,
                    row.status,
                    busy,
                    format_score(row.score),
                    row.updated_at
                );
            }
        }
        Command::ClearCache { analysis_id, tips } => {
            service.clear_cache(analysis_id);
            if tips {
                service.clear_daily_tips(None);
            }
            println!("cache cleared");
        }
    }
    Ok(())
}

/// Fills in missing bounds: the range ends today and spans a week.
fn date_range(
    start_date: Option<String>,
    end_date: Option<String>,
) -> anyhow::Result<(String, String)> {
    let end = match end_date {
        Some(text) => NaiveDate::parse_from_str(&text, DATE_FORMAT)
            .with_context(|| format!("invalid end date {text:?}"))?,
        None => Utc::now().date_naive(),
    };
    let start = match start_date {
        Some(text) => NaiveDate::parse_from_str(&text, DATE_FORMAT)
            .with_context(|| format!("invalid start date {text:?}"))?,
        None => end
            .checked_sub_days(Days::new(DEFAULT_RANGE_DAYS))
            .context("end date too early")?,
    };
    anyhow::ensure!(start <= end, "start date {start} is after end date {end}");
    Ok((
        start.format(DATE_FORMAT).to_string(),
        end.format(DATE_FORMAT).to_string(),
    ))
}

fn print_progress(snapshot: &StatusSnapshot) {
    match (snapshot.status, snapshot.progress) {
        (AnalysisStatus::Analyzing, Some(progress)) => {
            eprintln!("analysis {}: analyzing {}%", snapshot.analysis_id, progress)
        }
        (status, _) => eprintln!("analysis {}: {}", snapshot.analysis_id, status),
    }
}

fn print_response(response: &AnalysisResponse) {
    println!("analysis {}: {}", response.analysis_id, response.status);
    if let Some(result) = &response.result {
        println!("score: {}", format_score(result.score));
        for insight in &result.insights {
            println!("  insight: {}", insight.title);
        }
        for alert in &result.alerts {
            println!("  alert {:?}: {}", alert.level, alert.title);
        }
    }
}

fn print_record(record: &AnalysisRecord) {
    println!(
        "analysis {} ({}) for baby {}: {} score {}",
        record.id,
        record.analysis_type,
        record.baby_id,
        record.status,
        format_score(record.score)
    );
}

fn format_score(score: Option<f64>) -> String {
    score.map_or_else(|| "-".to_string(), |s| format!("{s:.1}"))
}
