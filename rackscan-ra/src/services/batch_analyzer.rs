//! Parallel batch analysis
//!
//! Each file is analyzed end-to-end on a blocking worker thread; at most
//! `workers` files are in flight at once via
//! `futures::stream::buffer_unordered`. Workers share only the read-only
//! [`RackAnalyzer`]; every worker owns its document and result, so one
//! failing file never affects another.

use crate::error::AnalyzerError;
use crate::types::AnalysisReport;
use crate::RackAnalyzer;
use futures::stream::{self, StreamExt};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

/// Outcome of analyzing one file in a batch
#[derive(Debug)]
pub struct BatchOutcome {
    pub path: PathBuf,
    pub result: Result<AnalysisReport, AnalyzerError>,
}

impl BatchOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Analyze `files` with up to `workers` concurrent workers
///
/// Outcomes are returned sorted by path, independent of completion order.
pub async fn analyze_batch(
    analyzer: Arc<RackAnalyzer>,
    files: Vec<PathBuf>,
    workers: usize,
) -> Vec<BatchOutcome> {
    let workers = workers.max(1);
    let total = files.len();
    let start = Instant::now();

    tracing::info!(file_count = total, workers, "Starting batch analysis");

    let mut outcomes: Vec<BatchOutcome> = stream::iter(files)
        .map(|path| {
            let analyzer = Arc::clone(&analyzer);
            async move {
                let worker_path = path.clone();
                let joined =
                    tokio::task::spawn_blocking(move || analyzer.analyze_file(&worker_path)).await;

                let result = match joined {
                    Ok(Ok(report)) => Ok(report),
                    Ok(Err(e)) => Err(AnalyzerError::Decode(e)),
                    Err(e) => {
                        tracing::error!(path = %path.display(), error = %e, "Analysis worker failed");
                        Err(AnalyzerError::Worker(e.to_string()))
                    }
                };
                BatchOutcome { path, result }
            }
        })
        .buffer_unordered(workers)
        .collect()
        .await;

    outcomes.sort_by(|a, b| a.path.cmp(&b.path));

    let failed = outcomes.iter().filter(|o| !o.is_ok()).count();
    tracing::info!(
        file_count = total,
        failed,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Batch analysis complete"
    );

    outcomes
}
