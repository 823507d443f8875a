use std::sync::Arc;

use chrono::Utc;
use serde_json::{json, Map, Value};
use tracing::{info, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::SupabaseClient;
use shared_utils::validation::round_cents;

use crate::error::BookingError;
use crate::models::{
    AvailabilityTemplate, ConsultationType, CreateConsultationTypeRequest, SeedSummary,
    UpdateConsultationTypeRequest,
};
use crate::services::availability::{default_weekly_templates, AvailabilityService};

/// Consultation types offered to clients.
pub struct ConsultationCatalogService {
    supabase: Arc<SupabaseClient>,
}

impl ConsultationCatalogService {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_client(Arc::new(SupabaseClient::new(config)))
    }

    pub fn with_client(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    /// Public listing: active types by `sort_order`.
    pub async fn list_active(&self) -> Result<Vec<ConsultationType>, BookingError> {
        let types = self
            .supabase
            .select("/rest/v1/consultation_types?active=eq.true&order=sort_order.asc")
            .await?;
        Ok(types)
    }

    pub async fn list_all(&self) -> Result<Vec<ConsultationType>, BookingError> {
        let types = self
            .supabase
            .select("/rest/v1/consultation_types?order=sort_order.asc")
            .await?;
        Ok(types)
    }

    pub async fn get(&self, type_id: Uuid) -> Result<ConsultationType, BookingError> {
        let path = format!("/rest/v1/consultation_types?id=eq.{}", type_id);
        let mut rows: Vec<ConsultationType> = self.supabase.select(&path).await?;
        rows.pop().ok_or(BookingError::ConsultationTypeNotFound)
    }

    /// Inactive types are treated as missing.
    pub async fn get_active(&self, type_id: Uuid) -> Result<ConsultationType, BookingError> {
        let path = format!("/rest/v1/consultation_types?id=eq.{}&active=eq.true", type_id);
        let mut rows: Vec<ConsultationType> = self.supabase.select(&path).await?;
        rows.pop().ok_or(BookingError::ConsultationTypeNotFound)
    }

    pub async fn create(&self, request: CreateConsultationTypeRequest) -> Result<ConsultationType, BookingError> {
        validate_consultation_type(&request.name, request.price, request.duration_minutes)?;

        let row = json!({
            "name": request.name.trim(),
            "description": request.description,
            "price": round_cents(request.price),
            "duration_minutes": request.duration_minutes,
            "theme_color": request.theme_color,
            "sort_order": request.sort_order.unwrap_or(0),
            "active": request.active.unwrap_or(true),
        });

        let created: ConsultationType = self.supabase.insert("consultation_types", &row).await?;
        info!("Created consultation type {} ({})", created.name, created.id);

        Ok(created)
    }

    pub async fn update(
        &self,
        type_id: Uuid,
        request: UpdateConsultationTypeRequest,
    ) -> Result<ConsultationType, BookingError> {
        let current = self.get(type_id).await?;

        validate_consultation_type(
            request.name.as_deref().unwrap_or(&current.name),
            request.price.unwrap_or(current.price),
            request.duration_minutes.unwrap_or(current.duration_minutes),
        )?;

        let mut changes = Map::new();
        if let Some(name) = request.name {
            changes.insert("name".into(), json!(name.trim()));
        }
        if let Some(description) = request.description {
            changes.insert("description".into(), json!(description));
        }
        if let Some(price) = request.price {
            changes.insert("price".into(), json!(round_cents(price)));
        }
        if let Some(duration) = request.duration_minutes {
            changes.insert("duration_minutes".into(), json!(duration));
        }
        if let Some(color) = request.theme_color {
            changes.insert("theme_color".into(), json!(color));
        }
        if let Some(order) = request.sort_order {
            changes.insert("sort_order".into(), json!(order));
        }
        if let Some(active) = request.active {
            changes.insert("active".into(), json!(active));
        }
        changes.insert("updated_at".into(), json!(Utc::now()));

        let path = format!("/rest/v1/consultation_types?id=eq.{}", type_id);
        let mut updated: Vec<ConsultationType> = self.supabase.update(&path, Value::Object(changes)).await?;

        updated.pop().ok_or(BookingError::ConsultationTypeNotFound)
    }

    /// Refuses to delete a type any appointment still points at; deactivate it instead.
    pub async fn delete(&self, type_id: Uuid) -> Result<(), BookingError> {
        let usage_path = format!(
            "/rest/v1/appointments?consultation_type_id=eq.{}&select=id&limit=1",
            type_id
        );
        let referencing: Vec<Value> = self.supabase.select(&usage_path).await?;
        if !referencing.is_empty() {
            warn!("Refusing to delete consultation type {} still referenced by appointments", type_id);
            return Err(BookingError::InUse(
                "Consultation type has appointments; deactivate it instead".to_string(),
            ));
        }

        let path = format!("/rest/v1/consultation_types?id=eq.{}", type_id);
        let removed: Vec<ConsultationType> = self.supabase.delete(&path).await?;
        if removed.is_empty() {
            return Err(BookingError::ConsultationTypeNotFound);
        }

        info!("Deleted consultation type {}", type_id);
        Ok(())
    }

    /// Install the default catalog and weekly templates into whichever of the
    /// two tables is still empty.
    pub async fn seed_defaults(&self) -> Result<SeedSummary, BookingError> {
        let mut summary = SeedSummary::default();

        let existing_types: Vec<Value> = self
            .supabase
            .select("/rest/v1/consultation_types?select=id&limit=1")
            .await?;
        if existing_types.is_empty() {
            for request in default_consultation_types() {
                self.create(request).await?;
                summary.consultation_types_created += 1;
            }
        }

        let existing_templates: Vec<Value> = self
            .supabase
            .select("/rest/v1/availability_templates?select=id&limit=1")
            .await?;
        if existing_templates.is_empty() {
            let availability = AvailabilityService::with_client(Arc::clone(&self.supabase));
            for request in default_weekly_templates() {
                let _: AvailabilityTemplate = availability.create_template(request).await?;
                summary.templates_created += 1;
            }
        }

        info!(
            "Seeded {} consultation types and {} availability templates",
            summary.consultation_types_created, summary.templates_created
        );
        Ok(summary)
    }
}

pub fn validate_consultation_type(name: &str, price: f64, duration_minutes: i32) -> Result<(), BookingError> {
    if name.trim().is_empty() {
        return Err(BookingError::ValidationError("Name is required".to_string()));
    }
    if !(price.is_finite() && price > 0.0) {
        return Err(BookingError::ValidationError("Price must be greater than 0".to_string()));
    }
    if duration_minutes <= 0 {
        return Err(BookingError::ValidationError("Duration must be greater than 0".to_string()));
    }
    Ok(())
}

pub fn default_consultation_types() -> Vec<CreateConsultationTypeRequest> {
    let entry = |name: &str, description: &str, price: f64, duration_minutes: i32, color: &str, order: i32| {
        CreateConsultationTypeRequest {
            name: name.to_string(),
            description: description.to_string(),
            price,
            duration_minutes,
            theme_color: Some(color.to_string()),
            sort_order: Some(order),
            active: Some(true),
        }
    };

    vec![
        entry("Tarot", "Leitura de tarot", 80.0, 60, "#7c3aed", 1),
        entry("Mapa Astral", "Interpretação do mapa astral", 120.0, 90, "#2563eb", 2),
        entry("Consulta Espiritual", "Orientação espiritual", 100.0, 60, "#059669", 3),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_consultation_type_rules() {
        assert!(validate_consultation_type("Tarot", 80.0, 60).is_ok());
        assert_matches!(validate_consultation_type("  ", 80.0, 60), Err(BookingError::ValidationError(_)));
        assert_matches!(validate_consultation_type("Tarot", 0.0, 60), Err(BookingError::ValidationError(_)));
        assert_matches!(validate_consultation_type("Tarot", 80.0, 0), Err(BookingError::ValidationError(_)));
    }

    #[test]
    fn test_default_catalog() {
        let defaults = default_consultation_types();
        let summary: Vec<(&str, f64, i32)> = defaults
            .iter()
            .map(|d| (d.name.as_str(), d.price, d.duration_minutes))
            .collect();

        assert_eq!(
            summary,
            vec![("Tarot", 80.0, 60), ("Mapa Astral", 120.0, 90), ("Consulta Espiritual", 100.0, 60)]
        );
    }
}
