use tracing::{debug, warn};

use crate::error::BookingError;
use crate::models::AppointmentStatus;

pub struct AppointmentLifecycleService;

impl Default for AppointmentLifecycleService {
    fn default() -> Self {
        Self::new()
    }
}

impl AppointmentLifecycleService {
    pub fn new() -> Self {
        Self
    }

    pub fn validate_status_transition(
        &self,
        current_status: AppointmentStatus,
        new_status: AppointmentStatus,
    ) -> Result<(), BookingError> {
        debug!("Validating status transition from {} to {}", current_status, new_status);

        if !self.get_valid_transitions(current_status).contains(&new_status) {
            warn!("Invalid status transition attempted: {} -> {}", current_status, new_status);
            return Err(BookingError::InvalidStatusTransition {
                from: current_status,
                to: new_status,
            });
        }

        Ok(())
    }

    pub fn get_valid_transitions(&self, current_status: AppointmentStatus) -> Vec<AppointmentStatus> {
        match current_status {
            AppointmentStatus::Scheduled => vec![AppointmentStatus::Confirmed, AppointmentStatus::Canceled],
            AppointmentStatus::Confirmed => vec![AppointmentStatus::Completed, AppointmentStatus::Canceled],
            // Terminal
            AppointmentStatus::Completed | AppointmentStatus::Canceled => vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use AppointmentStatus::*;

    #[test]
    fn test_happy_path() {
        let lifecycle = AppointmentLifecycleService::new();
        assert!(lifecycle.validate_status_transition(Scheduled, Confirmed).is_ok());
        assert!(lifecycle.validate_status_transition(Confirmed, Completed).is_ok());
        assert!(lifecycle.validate_status_transition(Scheduled, Canceled).is_ok());
        assert!(lifecycle.validate_status_transition(Confirmed, Canceled).is_ok());
    }

    #[test]
    fn test_rejected_edges() {
        let lifecycle = AppointmentLifecycleService::new();
        let rejected = [
            (Confirmed, Confirmed),
            (Scheduled, Completed),
            (Completed, Confirmed),
            (Canceled, Scheduled),
            (Canceled, Confirmed),
            (Completed, Canceled),
            (Confirmed, Scheduled),
        ];

        for (from, to) in rejected {
            assert_matches!(
                lifecycle.validate_status_transition(from, to),
                Err(BookingError::InvalidStatusTransition { .. }),
                "{} -> {} should be rejected",
                from,
                to
            );
        }
    }

    #[test]
    fn test_terminal_states_have_no_exits() {
        let lifecycle = AppointmentLifecycleService::new();
        assert!(lifecycle.get_valid_transitions(Completed).is_empty());
        assert!(lifecycle.get_valid_transitions(Canceled).is_empty());
    }
}
