use std::collections::HashMap;
use std::fmt::Write as _;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use tracing::{debug, instrument};
use uuid::Uuid;

use consultation_cell::{Appointment, AppointmentBookingService, ConsultationCatalogService};
use shared_config::AppConfig;
use shared_utils::validation::round_cents;

use crate::models::{DailyReport, ReportEntry, StatusCounts};

pub struct DailyReportService {
    booking: AppointmentBookingService,
    catalog: ConsultationCatalogService,
}

impl DailyReportService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            booking: AppointmentBookingService::new(config),
            catalog: ConsultationCatalogService::new(config),
        }
    }

    #[instrument(skip(self))]
    pub async fn generate(&self, date: NaiveDate) -> Result<DailyReport> {
        let appointments = self
            .booking
            .get_agenda(date)
            .await
            .with_context(|| format!("loading agenda for {}", date))?;

        let names: HashMap<Uuid, String> = self
            .catalog
            .list_all()
            .await
            .context("loading consultation types")?
            .into_iter()
            .map(|t| (t.id, t.name))
            .collect();

        debug!("Building report over {} appointments", appointments.len());
        Ok(build_daily_report(date, appointments, &names))
    }
}

pub fn build_daily_report(
    date: NaiveDate,
    mut appointments: Vec<Appointment>,
    consultation_names: &HashMap<Uuid, String>,
) -> DailyReport {
    appointments.sort_by_key(|a| a.scheduled_at);

    let mut counts = StatusCounts::default();
    let mut revenue = 0.0;
    for appointment in &appointments {
        counts.record(appointment.status);
        if appointment.status != consultation_cell::AppointmentStatus::Canceled {
            revenue += appointment.amount_charged;
        }
    }

    let entries = appointments
        .into_iter()
        .map(|a| ReportEntry {
            consultation_name: consultation_names
                .get(&a.consultation_type_id)
                .cloned()
                .unwrap_or_else(|| "Consulta".to_string()),
            scheduled_at: a.scheduled_at,
            client_name: a.client_name,
            status: a.status,
            amount_charged: a.amount_charged,
        })
        .collect::<Vec<_>>();

    DailyReport {
        date,
        total: entries.len(),
        counts,
        expected_revenue: round_cents(revenue),
        entries,
    }
}

fn status_label(entry: &ReportEntry) -> &'static str {
    use consultation_cell::AppointmentStatus::*;
    match entry.status {
        Scheduled => "agendado",
        Confirmed => "confirmado",
        Completed => "concluído",
        Canceled => "cancelado",
    }
}

/// WhatsApp text for the admin.
pub fn render_report(report: &DailyReport) -> String {
    let mut message = format!("Agenda de {}\n", report.date.format("%d/%m/%Y"));

    if report.entries.is_empty() {
        message.push_str("Nenhum atendimento marcado para hoje.");
        return message;
    }

    let _ = writeln!(
        message,
        "{} atendimentos: {} agendados, {} confirmados, {} concluídos, {} cancelados",
        report.total,
        report.counts.scheduled,
        report.counts.confirmed,
        report.counts.completed,
        report.counts.canceled
    );
    let _ = writeln!(message, "Receita prevista: R$ {:.2}", report.expected_revenue);

    for entry in &report.entries {
        let _ = write!(
            message,
            "\n{} - {} ({}) [{}]",
            entry.scheduled_at.format("%H:%M"),
            entry.client_name,
            entry.consultation_name,
            status_label(entry)
        );
    }

    message
}
