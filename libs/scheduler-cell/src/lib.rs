pub mod models;
pub mod services;

pub use models::*;
pub use services::report::{build_daily_report, render_report, DailyReportService};
pub use services::runner::{next_run_after, ScheduledTaskRunner};
