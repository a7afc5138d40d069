use crate::mailchimp::types::Template;
use chrono::{DateTime, Days, NaiveDate, Utc};

/// Calendar day (UTC) of an RFC3339 timestamp such as `2026-10-15T14:40:36+00:00`.
/// Unparseable input is logged and yields `None`.
pub fn created_day(timestamp: &str) -> Option<NaiveDate> {
    match DateTime::parse_from_rfc3339(timestamp) {
        Ok(dt) => Some(dt.with_timezone(&Utc).date_naive()),
        Err(e) => {
            tracing::warn!(timestamp, error = %e, "failed to parse template creation date");
            None
        }
    }
}

pub fn yesterday(today: NaiveDate) -> Option<NaiveDate> {
    today.checked_sub_days(Days::new(1))
}

/// First template, in list order, named `name` and created the day before `today`.
pub fn find_yesterdays_template<'a>(
    templates: &'a [Template],
    name: &str,
    today: NaiveDate,
) -> Option<&'a Template> {
    let target = yesterday(today)?;
    templates
        .iter()
        .filter(|t| t.name == name)
        .find(|t| created_day(&t.date_created) == Some(target))
}
