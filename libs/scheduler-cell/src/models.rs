use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use consultation_cell::AppointmentStatus;

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct StatusCounts {
    pub scheduled: usize,
    pub confirmed: usize,
    pub completed: usize,
    pub canceled: usize,
}

impl StatusCounts {
    pub fn record(&mut self, status: AppointmentStatus) {
        match status {
            AppointmentStatus::Scheduled => self.scheduled += 1,
            AppointmentStatus::Confirmed => self.confirmed += 1,
            AppointmentStatus::Completed => self.completed += 1,
            AppointmentStatus::Canceled => self.canceled += 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ReportEntry {
    pub scheduled_at: NaiveDateTime,
    pub client_name: String,
    pub consultation_name: String,
    pub status: AppointmentStatus,
    pub amount_charged: f64,
}

/// Snapshot of one day's agenda sent to the admin each morning.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DailyReport {
    pub date: NaiveDate,
    pub total: usize,
    pub counts: StatusCounts,
    /// Sum charged over every appointment that is not canceled.
    pub expected_revenue: f64,
    pub entries: Vec<ReportEntry>,
}
