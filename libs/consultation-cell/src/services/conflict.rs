use std::collections::HashSet;
use std::sync::Arc;

use chrono::{Duration, NaiveDate, NaiveDateTime, Timelike};
use tracing::debug;

use shared_database::SupabaseClient;

use crate::error::BookingError;
use crate::models::Appointment;

/// Finds which generated slots are already held by an active appointment.
pub struct ConflictDetectionService {
    supabase: Arc<SupabaseClient>,
}

impl ConflictDetectionService {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    /// Scheduled or confirmed appointments on `date`, earliest first.
    pub async fn active_appointments_on(&self, date: NaiveDate) -> Result<Vec<Appointment>, BookingError> {
        let path = format!(
            "/rest/v1/appointments?{}&status=in.(scheduled,confirmed)&order=scheduled_at.asc",
            day_range_filter(date)
        );
        let appointments: Vec<Appointment> = self.supabase.select(&path).await?;
        debug!("{} active appointments on {}", appointments.len(), date);

        Ok(appointments)
    }

    /// `candidates` minus occupied times, order preserved.
    pub async fn free_slots(
        &self,
        date: NaiveDate,
        candidates: Vec<NaiveDateTime>,
    ) -> Result<Vec<NaiveDateTime>, BookingError> {
        if candidates.is_empty() {
            return Ok(candidates);
        }

        let booked = self.active_appointments_on(date).await?;
        Ok(remove_occupied(candidates, &booked))
    }

    pub async fn is_slot_free(&self, slot: NaiveDateTime) -> Result<bool, BookingError> {
        let booked = self.active_appointments_on(slot.date()).await?;
        Ok(!remove_occupied(vec![slot], &booked).is_empty())
    }
}

/// PostgREST filter selecting `scheduled_at` within the calendar day.
pub fn day_range_filter(date: NaiveDate) -> String {
    let next = date + Duration::days(1);
    format!(
        "scheduled_at=gte.{}T00:00:00&scheduled_at=lt.{}T00:00:00",
        date.format("%Y-%m-%d"),
        next.format("%Y-%m-%d")
    )
}

/// Drop every candidate an active appointment sits on. Canceled and completed
/// appointments are ignored even if present in `appointments`.
pub fn remove_occupied(candidates: Vec<NaiveDateTime>, appointments: &[Appointment]) -> Vec<NaiveDateTime> {
    let occupied: HashSet<NaiveDateTime> = appointments
        .iter()
        .filter(|a| a.status.blocks_slot())
        .map(|a| normalize_to_minute(a.scheduled_at))
        .collect();

    candidates
        .into_iter()
        .filter(|slot| !occupied.contains(&normalize_to_minute(*slot)))
        .collect()
}

pub fn normalize_to_minute(value: NaiveDateTime) -> NaiveDateTime {
    value
        .with_second(0)
        .and_then(|v| v.with_nanosecond(0))
        .unwrap_or(value)
}
