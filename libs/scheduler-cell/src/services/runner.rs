use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{Duration as ChronoDuration, Local, NaiveDate, NaiveDateTime, NaiveTime};
use tokio::sync::RwLock;
use tracing::{debug, error, info, instrument, warn};

use notification_cell::{deliver, notifier_from_config, NotificationSender};
use shared_config::AppConfig;

use crate::services::report::{render_report, DailyReportService};

/// Upper bound on a single sleep so shutdown is noticed promptly.
const MAX_SLEEP: Duration = Duration::from_secs(60);

/// Background loop that sends the admin the day's agenda once a day.
pub struct ScheduledTaskRunner {
    config: Arc<AppConfig>,
    notifier: Arc<dyn NotificationSender>,
    is_shutdown: RwLock<bool>,
}

impl ScheduledTaskRunner {
    pub fn new(config: Arc<AppConfig>) -> Self {
        let notifier = notifier_from_config(&config);
        Self::with_notifier(config, notifier)
    }

    pub fn with_notifier(config: Arc<AppConfig>, notifier: Arc<dyn NotificationSender>) -> Self {
        Self {
            config,
            notifier,
            is_shutdown: RwLock::new(false),
        }
    }

    #[instrument(skip(self), fields(hour = self.config.daily_report_hour))]
    pub async fn start(&self) {
        if !self.config.has_admin_recipient() {
            warn!("No admin recipient configured, daily agenda report disabled");
            return;
        }

        info!("Daily agenda report scheduled at {:02}:00", self.config.daily_report_hour);

        loop {
            let next_run = next_run_after(Local::now().naive_local(), self.config.daily_report_hour);
            debug!("Next daily report at {}", next_run);

            if !self.sleep_until(next_run).await {
                info!("Scheduled task runner stopped");
                return;
            }

            match self.run_daily_report(next_run.date()).await {
                Ok(true) => info!("Daily report for {} delivered", next_run.date()),
                Ok(false) => warn!("Daily report for {} was not delivered", next_run.date()),
                Err(e) => error!("Daily report for {} failed: {:#}", next_run.date(), e),
            }
        }
    }

    pub async fn shutdown(&self) {
        *self.is_shutdown.write().await = true;
    }

    /// Build the report for `date` and send it to the admin. Returns whether the
    /// provider accepted the message.
    #[instrument(skip(self))]
    pub async fn run_daily_report(&self, date: NaiveDate) -> Result<bool> {
        let report = DailyReportService::new(&self.config)
            .generate(date)
            .await
            .context("building daily report")?;

        let message = render_report(&report);
        Ok(deliver(self.notifier.as_ref(), &self.config.admin_whatsapp_number, &message).await)
    }

    /// Sleeps in short chunks until `deadline`; false if shutdown was requested.
    async fn sleep_until(&self, deadline: NaiveDateTime) -> bool {
        loop {
            if *self.is_shutdown.read().await {
                return false;
            }

            let remaining = deadline - Local::now().naive_local();
            let Ok(remaining) = remaining.to_std() else {
                return true;
            };
            if remaining.is_zero() {
                return true;
            }

            tokio::time::sleep(remaining.min(MAX_SLEEP)).await;
        }
    }
}

/// First `hour:00` strictly after `now`.
pub fn next_run_after(now: NaiveDateTime, hour: u32) -> NaiveDateTime {
    let at = NaiveTime::from_hms_opt(hour.min(23), 0, 0).unwrap_or(NaiveTime::MIN);
    let today = now.date().and_time(at);

    if today > now {
        today
    } else {
        today + ChronoDuration::days(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(day: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2030, 6, day).unwrap().and_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_next_run_later_today() {
        assert_eq!(next_run_after(at(3, 6, 30), 8), at(3, 8, 0));
    }

    #[test]
    fn test_next_run_tomorrow_once_passed() {
        assert_eq!(next_run_after(at(3, 8, 0), 8), at(4, 8, 0));
        assert_eq!(next_run_after(at(3, 21, 15), 8), at(4, 8, 0));
    }

    #[test]
    fn test_next_run_crosses_month() {
        assert_eq!(next_run_after(at(30, 9, 0), 8), NaiveDate::from_ymd_opt(2030, 7, 1).unwrap().and_hms_opt(8, 0, 0).unwrap());
    }
}
