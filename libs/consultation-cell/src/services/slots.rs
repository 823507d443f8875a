use std::collections::BTreeSet;

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};

use crate::error::BookingError;
use crate::models::AvailabilityTemplate;

/// Monday = 0 .. Sunday = 6, the numbering used by `availability_templates.day_of_week`.
pub fn day_index(date: NaiveDate) -> u8 {
    date.weekday().num_days_from_monday() as u8
}

/// Bookable start times for `date` from every active template for its weekday.
///
/// Each template is walked from its start in `interval_minutes` steps; a step is
/// emitted only when it fits entirely before the template end. Slots from
/// overlapping templates are merged, sorted and de-duplicated.
pub fn generate_slots(
    date: NaiveDate,
    templates: &[AvailabilityTemplate],
) -> Result<Vec<NaiveDateTime>, BookingError> {
    let weekday = day_index(date);
    let matching: Vec<&AvailabilityTemplate> = templates
        .iter()
        .filter(|t| t.active && t.day_of_week == weekday)
        .collect();

    if let Some(bad) = matching.iter().find(|t| t.interval_minutes <= 0) {
        return Err(BookingError::ValidationError(format!(
            "Template {} has a non-positive slot interval ({})",
            bad.id, bad.interval_minutes
        )));
    }

    let mut slots = BTreeSet::new();
    for template in matching {
        let step = Duration::minutes(i64::from(template.interval_minutes));
        let end = date.and_time(template.end_time);
        let mut current = date.and_time(template.start_time);

        while current + step <= end {
            slots.insert(current);
            current += step;
        }
    }

    Ok(slots.into_iter().collect())
}
