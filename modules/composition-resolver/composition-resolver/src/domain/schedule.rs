//! Portable cron to provider cron.

use thiserror::Error;

/// Fields of a portable cron expression: minute, hour, day-of-month, month,
/// day-of-week.
pub const CRON_FIELDS: usize = 5;

/// The expression does not have exactly [`CRON_FIELDS`] fields.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("expected 5 cron fields, got {fields}")]
pub struct CronFormatError {
    pub fields: usize,
}

/// Translate a 5-field cron expression into the provider's 6-field form.
///
/// The provider refuses `*` in both day fields, so when day-of-month and
/// day-of-week are both `*` the day-of-week becomes `?`. Every other
/// combination passes through untouched. A year wildcard is appended.
///
/// ```
/// use composition_resolver::domain::schedule::translate;
///
/// assert_eq!(translate("0 12 * * *").unwrap(), "cron(0 12 * * ? *)");
/// assert_eq!(translate("0 0 1 * *").unwrap(), "cron(0 0 1 * * *)");
/// ```
///
/// # Errors
///
/// [`CronFormatError`] if the expression does not split into exactly five
/// whitespace-separated fields.
pub fn translate(cron_expression: &str) -> Result<String, CronFormatError> {
    let fields: Vec<&str> = cron_expression.split_ascii_whitespace().collect();
    let [minute, hour, day_of_month, month, day_of_week] = fields.as_slice() else {
        return Err(CronFormatError {
            fields: fields.len(),
        });
    };

    let day_of_week = if *day_of_month == "*" && *day_of_week == "*" {
        "?"
    } else {
        *day_of_week
    };

    Ok(format!(
        "cron({minute} {hour} {day_of_month} {month} {day_of_week} *)"
    ))
}
