use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use tokio::select;
use tokio::time::interval;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::widgets::anniversary::AnniversaryCounter;

pub const REFRESH_PERIOD: Duration = Duration::from_secs(60 * 60);

/// Log every anniversary phrase right away and then once per `period`.
///
/// Returns the number of refreshes performed before cancellation. With no
/// anniversaries configured the task returns immediately.
pub async fn run(
    counter: AnniversaryCounter,
    period: Duration,
    cancel: CancellationToken,
) -> Result<u64> {
    if counter.is_empty() {
        debug!("no anniversaries configured");
        return Ok(0);
    }
    let mut ticker = interval(period);
    let mut refreshes = 0;
    loop {
        select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                for (label, phrase) in counter.phrases(Utc::now()) {
                    info!(label = %label, elapsed = %phrase, "anniversary counter");
                }
                refreshes += 1;
            }
        }
    }
    Ok(refreshes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnniversaryConfig;
    use chrono::NaiveDate;

    fn counter() -> AnniversaryCounter {
        AnniversaryCounter::new(vec![AnniversaryConfig {
            label: "married".into(),
            since: NaiveDate::from_ymd_opt(2023, 6, 10).unwrap(),
        }])
    }

    #[tokio::test(start_paused = true)]
    async fn refreshes_immediately_and_then_every_period() {
        let cancel = CancellationToken::new();
        let task = tokio::spawn(run(counter(), REFRESH_PERIOD, cancel.clone()));

        tokio::time::sleep(REFRESH_PERIOD + Duration::from_secs(1)).await;
        cancel.cancel();
        assert_eq!(task.await.unwrap().unwrap(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn exits_promptly_when_cancelled() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let refreshes = run(counter(), REFRESH_PERIOD, cancel).await.unwrap();
        assert!(refreshes <= 1);
    }

    #[tokio::test(start_paused = true)]
    async fn without_anniversaries_returns_at_once() {
        let cancel = CancellationToken::new();
        let refreshes = run(AnniversaryCounter::default(), REFRESH_PERIOD, cancel)
            .await
            .unwrap();
        assert_eq!(refreshes, 0);
    }
}
