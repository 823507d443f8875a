use std::sync::Arc;

use chrono::{Local, NaiveDate, Utc};
use serde_json::{json, Map, Value};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use coupon_cell::{Coupon, CouponService};
use notification_cell::services::templates;
use notification_cell::{dispatch, notifier_from_config, BookingNotice, NotificationSender};
use shared_config::AppConfig;
use shared_database::{SupabaseClient, SupabaseError};
use shared_utils::validation::{is_valid_phone, round_cents};

use crate::error::BookingError;
use crate::models::{Appointment, AppointmentStatus, BookAppointmentRequest, ConsultationType, UpdateStatusRequest};
use crate::services::availability::AvailabilityService;
use crate::services::catalog::ConsultationCatalogService;
use crate::services::conflict::{day_range_filter, normalize_to_minute, ConflictDetectionService};
use crate::services::lifecycle::AppointmentLifecycleService;

pub struct AppointmentBookingService {
    supabase: Arc<SupabaseClient>,
    catalog: ConsultationCatalogService,
    availability: AvailabilityService,
    conflict_service: ConflictDetectionService,
    lifecycle_service: AppointmentLifecycleService,
    coupon_service: CouponService,
    notifier: Arc<dyn NotificationSender>,
    admin_recipient: Option<String>,
}

impl AppointmentBookingService {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_notifier(config, notifier_from_config(config))
    }

    pub fn with_notifier(config: &AppConfig, notifier: Arc<dyn NotificationSender>) -> Self {
        let supabase = Arc::new(SupabaseClient::new(config));

        Self {
            catalog: ConsultationCatalogService::with_client(Arc::clone(&supabase)),
            availability: AvailabilityService::with_client(Arc::clone(&supabase)),
            conflict_service: ConflictDetectionService::new(Arc::clone(&supabase)),
            lifecycle_service: AppointmentLifecycleService::new(),
            coupon_service: CouponService::with_client(Arc::clone(&supabase)),
            supabase,
            notifier,
            admin_recipient: config
                .has_admin_recipient()
                .then(|| config.admin_whatsapp_number.clone()),
        }
    }

    // ==========================================================================
    // BOOKING
    // ==========================================================================

    /// Book a free slot. The slot is checked here, and the store's unique index
    /// on active `scheduled_at` settles any race that slips past the check.
    pub async fn book_appointment(&self, request: BookAppointmentRequest) -> Result<Appointment, BookingError> {
        validate_client(&request)?;

        let scheduled_at = normalize_to_minute(request.scheduled_at);
        let date = scheduled_at.date();
        ensure_not_past(date, Local::now().date_naive())?;

        info!("Booking {} for {} at {}", request.consultation_type_id, request.client_name, scheduled_at);

        let consultation = self.catalog.get_active(request.consultation_type_id).await?;

        let slots = self.availability.generated_slots(date).await?;
        if !slots.contains(&scheduled_at) {
            return Err(BookingError::InvalidSlot(scheduled_at.format("%Y-%m-%d %H:%M").to_string()));
        }

        if !self.conflict_service.is_slot_free(scheduled_at).await? {
            warn!("Slot {} already taken", scheduled_at);
            return Err(BookingError::SlotUnavailable);
        }

        let original_price = round_cents(consultation.price);
        let redeemed = match request.coupon_code.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
            Some(code) => Some(self.coupon_service.redeem(code, original_price).await?),
            None => None,
        };
        let (coupon, discount) = match &redeemed {
            Some((coupon, quote)) => (Some(coupon), quote.discount),
            None => (None, 0.0),
        };

        let row = json!({
            "client_name": request.client_name.trim(),
            "client_phone": request.client_phone.trim(),
            "client_email": request.client_email,
            "consultation_type_id": consultation.id,
            "scheduled_at": scheduled_at,
            "notes": request.notes,
            "status": AppointmentStatus::Scheduled,
            "original_price": original_price,
            "discount_amount": discount,
            "amount_charged": round_cents(original_price - discount),
            "coupon_code": coupon.map(|c| c.code.clone()),
        });

        let appointment: Appointment = match self.supabase.insert("appointments", &row).await {
            Ok(appointment) => appointment,
            Err(err) => {
                self.release_coupon(coupon).await;
                return Err(match err {
                    SupabaseError::Conflict(msg) => {
                        warn!("Lost booking race for {}: {}", scheduled_at, msg);
                        BookingError::SlotUnavailable
                    }
                    other => other.into(),
                });
            }
        };

        info!("Appointment {} booked at {}", appointment.id, appointment.scheduled_at);
        self.notify_booked(&appointment, &consultation);

        Ok(appointment)
    }

    async fn release_coupon(&self, coupon: Option<&Coupon>) {
        if let Some(coupon) = coupon {
            if let Err(e) = self.coupon_service.release(coupon.id).await {
                error!("Failed to release coupon {} after aborted booking: {}", coupon.code, e);
            }
        }
    }

    // ==========================================================================
    // STATUS CHANGES
    // ==========================================================================

    pub async fn confirm_appointment(&self, appointment_id: Uuid) -> Result<Appointment, BookingError> {
        self.transition(appointment_id, AppointmentStatus::Confirmed, None, None).await
    }

    pub async fn update_status(
        &self,
        appointment_id: Uuid,
        request: UpdateStatusRequest,
    ) -> Result<Appointment, BookingError> {
        self.transition(appointment_id, request.status, request.meeting_link, request.admin_note)
            .await
    }

    /// Move along one edge of the status machine. The write is conditional on the
    /// status we read, so two concurrent changes cannot both apply.
    async fn transition(
        &self,
        appointment_id: Uuid,
        new_status: AppointmentStatus,
        meeting_link: Option<String>,
        admin_note: Option<String>,
    ) -> Result<Appointment, BookingError> {
        let current = self.get_appointment(appointment_id).await?;
        self.lifecycle_service
            .validate_status_transition(current.status, new_status)?;

        let mut changes = Map::new();
        changes.insert("status".into(), json!(new_status));
        changes.insert("updated_at".into(), json!(Utc::now()));
        if let Some(link) = meeting_link {
            changes.insert("meeting_link".into(), json!(link));
        }
        if let Some(note) = admin_note {
            changes.insert("admin_note".into(), json!(note));
        }

        let path = format!(
            "/rest/v1/appointments?id=eq.{}&status=eq.{}",
            appointment_id, current.status
        );
        let mut updated: Vec<Appointment> = self.supabase.update(&path, Value::Object(changes)).await?;

        let appointment = updated.pop().ok_or_else(|| {
            warn!("Appointment {} changed status concurrently", appointment_id);
            BookingError::InvalidStatusTransition {
                from: current.status,
                to: new_status,
            }
        })?;

        info!("Appointment {} moved {} -> {}", appointment.id, current.status, appointment.status);
        self.notify_status_change(&appointment).await;

        Ok(appointment)
    }

    // ==========================================================================
    // READS
    // ==========================================================================

    pub async fn get_appointment(&self, appointment_id: Uuid) -> Result<Appointment, BookingError> {
        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        let mut rows: Vec<Appointment> = self.supabase.select(&path).await?;
        rows.pop().ok_or(BookingError::AppointmentNotFound)
    }

    /// Every appointment on `date` regardless of status, earliest first.
    pub async fn get_agenda(&self, date: NaiveDate) -> Result<Vec<Appointment>, BookingError> {
        let path = format!(
            "/rest/v1/appointments?{}&order=scheduled_at.asc",
            day_range_filter(date)
        );
        let appointments: Vec<Appointment> = self.supabase.select(&path).await?;
        debug!("Agenda for {}: {} appointments", date, appointments.len());

        Ok(appointments)
    }

    // ==========================================================================
    // NOTIFICATIONS
    // ==========================================================================

    fn notify_booked(&self, appointment: &Appointment, consultation: &ConsultationType) {
        let notice = booking_notice(appointment, &consultation.name);

        dispatch(
            Arc::clone(&self.notifier),
            appointment.client_phone.clone(),
            templates::booking_created(&notice),
        );

        if let Some(admin) = &self.admin_recipient {
            dispatch(
                Arc::clone(&self.notifier),
                admin.clone(),
                templates::booking_received_for_admin(&notice),
            );
        }
    }

    async fn notify_status_change(&self, appointment: &Appointment) {
        let render: fn(&BookingNotice) -> String = match appointment.status {
            AppointmentStatus::Confirmed => templates::appointment_confirmed,
            AppointmentStatus::Canceled => templates::appointment_canceled,
            _ => return,
        };

        let consultation_name = match self.catalog.get(appointment.consultation_type_id).await {
            Ok(consultation) => consultation.name,
            Err(e) => {
                warn!("Consultation type lookup for notification failed: {}", e);
                "consulta".to_string()
            }
        };

        let notice = booking_notice(appointment, &consultation_name);
        dispatch(Arc::clone(&self.notifier), appointment.client_phone.clone(), render(&notice));
    }
}

fn booking_notice(appointment: &Appointment, consultation_name: &str) -> BookingNotice {
    BookingNotice {
        client_name: appointment.client_name.clone(),
        client_phone: appointment.client_phone.clone(),
        consultation_name: consultation_name.to_string(),
        scheduled_at: appointment.scheduled_at,
        amount_charged: appointment.amount_charged,
        meeting_link: appointment.meeting_link.clone(),
    }
}

/// `today` is the business (server-local) date, the same clock `scheduled_at` uses.
fn ensure_not_past(date: NaiveDate, today: NaiveDate) -> Result<(), BookingError> {
    if date < today {
        return Err(BookingError::ValidationError("Cannot book a date in the past".to_string()));
    }
    Ok(())
}

fn validate_client(request: &BookAppointmentRequest) -> Result<(), BookingError> {
    if request.client_name.trim().is_empty() {
        return Err(BookingError::ValidationError("Client name is required".to_string()));
    }
    if !is_valid_phone(&request.client_phone) {
        return Err(BookingError::ValidationError("Client phone is invalid".to_string()));
    }
    if let Some(email) = request.client_email.as_deref() {
        if !email.is_empty() && !email.contains('@') {
            return Err(BookingError::ValidationError("Client email is invalid".to_string()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::NaiveDateTime;

    fn request(name: &str, phone: &str, email: Option<&str>) -> BookAppointmentRequest {
        BookAppointmentRequest {
            client_name: name.to_string(),
            client_phone: phone.to_string(),
            client_email: email.map(str::to_string),
            consultation_type_id: Uuid::new_v4(),
            scheduled_at: NaiveDateTime::parse_from_str("2030-06-03 10:00:00", "%Y-%m-%d %H:%M:%S").unwrap(),
            notes: None,
            coupon_code: None,
        }
    }

    #[test]
    fn test_client_validation() {
        assert!(validate_client(&request("Maria", "(11) 98765-4321", Some("maria@example.com"))).is_ok());
        assert_matches!(validate_client(&request(" ", "11987654321", None)), Err(BookingError::ValidationError(_)));
        assert_matches!(validate_client(&request("Maria", "abc", None)), Err(BookingError::ValidationError(_)));
        assert_matches!(
            validate_client(&request("Maria", "11987654321", Some("not-an-email"))),
            Err(BookingError::ValidationError(_))
        );
    }

    #[test]
    fn test_past_dates_follow_business_calendar() {
        let today = NaiveDate::from_ymd_opt(2030, 6, 3).unwrap();
        assert!(ensure_not_past(today, today).is_ok());
        assert!(ensure_not_past(today.succ_opt().unwrap(), today).is_ok());
        assert_matches!(
            ensure_not_past(today.pred_opt().unwrap(), today),
            Err(BookingError::ValidationError(_))
        );
    }
}
