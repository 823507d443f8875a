use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike, Utc};
use serde_json::{json, Map, Value};
use tracing::{debug, info};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::SupabaseClient;

use crate::error::BookingError;
use crate::models::{
    AvailabilityResponse, AvailabilityTemplate, CreateTemplateRequest, TimeSlot, UpdateTemplateRequest,
};
use crate::services::conflict::ConflictDetectionService;
use crate::services::slots::{day_index, generate_slots};

pub struct AvailabilityService {
    supabase: Arc<SupabaseClient>,
    conflict_service: ConflictDetectionService,
}

impl AvailabilityService {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_client(Arc::new(SupabaseClient::new(config)))
    }

    pub fn with_client(supabase: Arc<SupabaseClient>) -> Self {
        Self {
            conflict_service: ConflictDetectionService::new(Arc::clone(&supabase)),
            supabase,
        }
    }

    // ==========================================================================
    // SLOT QUERIES
    // ==========================================================================

    /// Free slots for `date`, each marked available.
    pub async fn get_available_slots(&self, date: NaiveDate) -> Result<AvailabilityResponse, BookingError> {
        let generated = self.generated_slots(date).await?;
        let free = self.conflict_service.free_slots(date, generated).await?;

        let slots: Vec<TimeSlot> = free.into_iter().map(TimeSlot::open).collect();
        debug!("{} free slots on {}", slots.len(), date);

        Ok(AvailabilityResponse {
            date,
            total: slots.len(),
            slots,
        })
    }

    /// Every slot the templates define for `date`, booked or not.
    pub async fn generated_slots(&self, date: NaiveDate) -> Result<Vec<NaiveDateTime>, BookingError> {
        let templates = self.active_templates_for(date).await?;
        generate_slots(date, &templates)
    }

    async fn active_templates_for(&self, date: NaiveDate) -> Result<Vec<AvailabilityTemplate>, BookingError> {
        let path = format!(
            "/rest/v1/availability_templates?active=eq.true&day_of_week=eq.{}",
            day_index(date)
        );
        Ok(self.supabase.select(&path).await?)
    }

    // ==========================================================================
    // TEMPLATE ADMINISTRATION
    // ==========================================================================

    pub async fn list_templates(&self) -> Result<Vec<AvailabilityTemplate>, BookingError> {
        let templates = self
            .supabase
            .select("/rest/v1/availability_templates?order=day_of_week.asc,start_time.asc")
            .await?;
        Ok(templates)
    }

    pub async fn get_template(&self, template_id: Uuid) -> Result<AvailabilityTemplate, BookingError> {
        let path = format!("/rest/v1/availability_templates?id=eq.{}", template_id);
        let mut rows: Vec<AvailabilityTemplate> = self.supabase.select(&path).await?;
        rows.pop().ok_or(BookingError::TemplateNotFound)
    }

    pub async fn create_template(&self, request: CreateTemplateRequest) -> Result<AvailabilityTemplate, BookingError> {
        validate_template(request.day_of_week, request.start_time, request.end_time, request.interval_minutes)?;

        let row = json!({
            "day_of_week": request.day_of_week,
            "start_time": request.start_time,
            "end_time": request.end_time,
            "interval_minutes": request.interval_minutes,
            "active": request.active.unwrap_or(true),
        });

        let template: AvailabilityTemplate = self.supabase.insert("availability_templates", &row).await?;
        info!(
            "Created availability template {} (day {} {}-{})",
            template.id, template.day_of_week, template.start_time, template.end_time
        );

        Ok(template)
    }

    pub async fn update_template(
        &self,
        template_id: Uuid,
        request: UpdateTemplateRequest,
    ) -> Result<AvailabilityTemplate, BookingError> {
        let current = self.get_template(template_id).await?;

        validate_template(
            request.day_of_week.unwrap_or(current.day_of_week),
            request.start_time.unwrap_or(current.start_time),
            request.end_time.unwrap_or(current.end_time),
            request.interval_minutes.unwrap_or(current.interval_minutes),
        )?;

        let mut changes = Map::new();
        if let Some(day) = request.day_of_week {
            changes.insert("day_of_week".into(), json!(day));
        }
        if let Some(start) = request.start_time {
            changes.insert("start_time".into(), json!(start));
        }
        if let Some(end) = request.end_time {
            changes.insert("end_time".into(), json!(end));
        }
        if let Some(interval) = request.interval_minutes {
            changes.insert("interval_minutes".into(), json!(interval));
        }
        if let Some(active) = request.active {
            changes.insert("active".into(), json!(active));
        }
        changes.insert("updated_at".into(), json!(Utc::now()));

        let path = format!("/rest/v1/availability_templates?id=eq.{}", template_id);
        let mut updated: Vec<AvailabilityTemplate> = self.supabase.update(&path, Value::Object(changes)).await?;

        updated.pop().ok_or(BookingError::TemplateNotFound)
    }

    pub async fn delete_template(&self, template_id: Uuid) -> Result<(), BookingError> {
        let path = format!("/rest/v1/availability_templates?id=eq.{}", template_id);
        let removed: Vec<AvailabilityTemplate> = self.supabase.delete(&path).await?;

        if removed.is_empty() {
            return Err(BookingError::TemplateNotFound);
        }

        info!("Deleted availability template {}", template_id);
        Ok(())
    }
}

pub fn validate_template(
    day_of_week: u8,
    start_time: NaiveTime,
    end_time: NaiveTime,
    interval_minutes: i32,
) -> Result<(), BookingError> {
    if day_of_week > 6 {
        return Err(BookingError::ValidationError(
            "day_of_week must be between 0 (Monday) and 6 (Sunday)".to_string(),
        ));
    }
    // Bookings are matched at whole minutes.
    if [start_time, end_time].iter().any(|t| t.second() != 0 || t.nanosecond() != 0) {
        return Err(BookingError::ValidationError(
            "start_time and end_time must be whole minutes".to_string(),
        ));
    }
    if start_time >= end_time {
        return Err(BookingError::ValidationError("start_time must be before end_time".to_string()));
    }
    if interval_minutes <= 0 {
        return Err(BookingError::ValidationError("interval_minutes must be positive".to_string()));
    }
    Ok(())
}

/// Monday to Friday, 09:00-18:00, hourly.
pub fn default_weekly_templates() -> Vec<CreateTemplateRequest> {
    let (start, end) = match (NaiveTime::from_hms_opt(9, 0, 0), NaiveTime::from_hms_opt(18, 0, 0)) {
        (Some(start), Some(end)) => (start, end),
        _ => return Vec::new(),
    };

    (0..5)
        .map(|day_of_week| CreateTemplateRequest {
            day_of_week,
            start_time: start,
            end_time: end,
            interval_minutes: 60,
            active: Some(true),
        })
        .collect()
}
