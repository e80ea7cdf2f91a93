use std::sync::Arc;
use std::time::{Duration, Instant};

use backoff::ExponentialBackoff;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::{
    AccessDuration, Error, Result,
    client::TradingView,
    models::{AccessDetails, BulkReport, Status},
};

/// Tuning for bulk sweeps. Batches bound how many operations are in
/// flight between delays, the semaphore bounds concurrent requests.
#[derive(Debug, Clone)]
pub struct BulkOptions {
    pub batch_size: usize,
    pub delay: Duration,
    pub max_concurrent: usize,
}

#[bon::bon]
impl BulkOptions {
    #[builder]
    pub fn new(
        batch_size: Option<usize>,
        delay_ms: Option<u64>,
        max_concurrent: Option<usize>,
    ) -> Self {
        Self {
            batch_size: batch_size.unwrap_or(10),
            delay: Duration::from_millis(delay_ms.unwrap_or(500)),
            max_concurrent: max_concurrent.unwrap_or(15),
        }
    }
}

impl Default for BulkOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl TradingView {
    /// Grants `duration` of access to every user for every Pine script,
    /// in rate-limited batches. Individual failures are counted, never
    /// abort the sweep.
    #[tracing::instrument(skip(self, usernames, pine_ids, options))]
    pub async fn bulk_grant_access(
        &self,
        usernames: &[&str],
        pine_ids: &[&str],
        duration: AccessDuration,
        options: &BulkOptions,
    ) -> Result<BulkReport> {
        self.init().await?;

        let start = Instant::now();
        let mut report = BulkReport {
            total: usernames.len() * pine_ids.len(),
            ..Default::default()
        };
        info!(total = report.total, "bulk grant started");

        let semaphore = Arc::new(Semaphore::new(options.max_concurrent));
        let batches = usernames.chunks(options.batch_size.max(1));
        let batch_count = batches.len();

        for (index, batch) in batches.enumerate() {
            let mut tasks: Vec<JoinHandle<Result<AccessDetails>>> = Vec::new();
            for username in batch {
                for pine_id in pine_ids {
                    let tv = self.clone();
                    let username = (*username).to_owned();
                    let pine_id = (*pine_id).to_owned();
                    let semaphore = Arc::clone(&semaphore);

                    tasks.push(tokio::spawn(async move {
                        let _permit = semaphore.acquire().await.unwrap();
                        grant_with_retry(&tv, &username, &pine_id, duration).await
                    }));
                }
            }

            for task in tasks {
                match task.await? {
                    Ok(details) if details.status != Status::Failure => report.success += 1,
                    Ok(_) => report.errors += 1,
                    Err(e) => {
                        warn!("bulk grant operation failed: {e}");
                        report.errors += 1;
                    }
                }
            }

            info!(
                batch = index + 1,
                batches = batch_count,
                success = report.success,
                errors = report.errors,
                "bulk grant progress"
            );

            if index + 1 < batch_count && !options.delay.is_zero() {
                sleep(options.delay).await;
            }
        }

        report.elapsed_ms = start.elapsed().as_millis() as u64;
        info!(
            total = report.total,
            success = report.success,
            errors = report.errors,
            success_rate = report.success_rate(),
            "bulk grant complete"
        );
        Ok(report)
    }

    /// Bulk twin of [`TradingView::remove_access`].
    #[tracing::instrument(skip(self, usernames, pine_ids, options))]
    pub async fn bulk_remove_access(
        &self,
        usernames: &[&str],
        pine_ids: &[&str],
        options: &BulkOptions,
    ) -> Result<BulkReport> {
        self.init().await?;

        let start = Instant::now();
        let mut report = BulkReport {
            total: usernames.len() * pine_ids.len(),
            ..Default::default()
        };
        info!(total = report.total, "bulk remove started");

        let semaphore = Arc::new(Semaphore::new(options.max_concurrent));
        let batches = usernames.chunks(options.batch_size.max(1));
        let batch_count = batches.len();

        for (index, batch) in batches.enumerate() {
            let mut tasks: Vec<JoinHandle<Result<AccessDetails>>> = Vec::new();
            for username in batch {
                for pine_id in pine_ids {
                    let tv = self.clone();
                    let username = (*username).to_owned();
                    let pine_id = (*pine_id).to_owned();
                    let semaphore = Arc::clone(&semaphore);

                    tasks.push(tokio::spawn(async move {
                        let _permit = semaphore.acquire().await.unwrap();
                        remove_with_retry(&tv, &username, &pine_id).await
                    }));
                }
            }

            for task in tasks {
                match task.await? {
                    Ok(details) if details.status != Status::Failure => report.success += 1,
                    Ok(_) => report.errors += 1,
                    Err(e) => {
                        warn!("bulk remove operation failed: {e}");
                        report.errors += 1;
                    }
                }
            }

            info!(
                batch = index + 1,
                batches = batch_count,
                success = report.success,
                errors = report.errors,
                "bulk remove progress"
            );

            if index + 1 < batch_count && !options.delay.is_zero() {
                sleep(options.delay).await;
            }
        }

        report.elapsed_ms = start.elapsed().as_millis() as u64;
        info!(
            total = report.total,
            success = report.success,
            errors = report.errors,
            success_rate = report.success_rate(),
            "bulk remove complete"
        );
        Ok(report)
    }
}

fn retry_policy() -> ExponentialBackoff {
    ExponentialBackoff {
        max_elapsed_time: Some(Duration::from_secs(30)),
        ..ExponentialBackoff::default()
    }
}

fn classify(e: Error) -> backoff::Error<Error> {
    match e {
        Error::RequestError(_) => {
            warn!("transient request error, retrying: {e}");
            backoff::Error::transient(e)
        }
        other => backoff::Error::permanent(other),
    }
}

async fn grant_with_retry(
    tv: &TradingView,
    username: &str,
    pine_id: &str,
    duration: AccessDuration,
) -> Result<AccessDetails> {
    backoff::future::retry(retry_policy(), || async {
        tv.grant_access(username, pine_id, duration)
            .await
            .map_err(classify)
    })
    .await
}

async fn remove_with_retry(tv: &TradingView, username: &str, pine_id: &str) -> Result<AccessDetails> {
    backoff::future::retry(retry_policy(), || async {
        tv.remove_access(username, pine_id).await.map_err(classify)
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_defaults() {
        let options = BulkOptions::default();
        assert_eq!(options.batch_size, 10);
        assert_eq!(options.delay, Duration::from_millis(500));
        assert_eq!(options.max_concurrent, 15);
    }

    #[test]
    fn options_builder_overrides() {
        let options = BulkOptions::builder()
            .batch_size(3)
            .delay_ms(0)
            .max_concurrent(1)
            .build();
        assert_eq!(options.batch_size, 3);
        assert!(options.delay.is_zero());
        assert_eq!(options.max_concurrent, 1);
    }

    #[test]
    fn transient_classification() {
        let e = classify(Error::Generic("nope".to_owned()));
        assert!(matches!(e, backoff::Error::Permanent(_)));
    }
}
