use time::{Date, Month};

use crate::error::TriageError;

const SINCE_FORMAT_HINT: &str = "--since accepts YYYY, YYYY-MM, or YYYY-MM-DD format";

fn digits(value: &str) -> Option<u32> {
    if value.is_empty() || !value.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    value.parse().ok()
}

/// Parses a `--since` bound, expanding partial dates to the first day of
/// the year or month.
pub(crate) fn parse_since(value: &str) -> Result<Date, TriageError> {
    let v = value.trim();
    let parts: Vec<&str> = v.split('-').collect();
    let (year, month, day) = match parts.as_slice() {
        [y] if y.len() == 4 => (digits(y), Some(1), Some(1)),
        [y, m] if y.len() == 4 && m.len() == 2 => (digits(y), digits(m), Some(1)),
        [y, m, d] if y.len() == 4 && m.len() == 2 && d.len() == 2 => {
            (digits(y), digits(m), digits(d))
        }
        _ => (None, None, None),
    };
    let (Some(year), Some(month), Some(day)) = (year, month, day) else {
        return Err(TriageError::InvalidArgument(SINCE_FORMAT_HINT.into()));
    };

    let month = u8::try_from(month)
        .ok()
        .and_then(|m| Month::try_from(m).ok())
        .ok_or_else(|| {
            TriageError::InvalidArgument(format!(
                "Invalid month {month} in --since (must be 01-12)"
            ))
        })?;
    let day_u8 = u8::try_from(day).unwrap_or(0);
    Date::from_calendar_date(year as i32, month, day_u8).map_err(|_| {
        TriageError::InvalidArgument(format!(
            "Invalid day {day} for month {} in --since",
            month as u8
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::parse_since;
    use time::{Date, Month};

    #[test]
    fn expands_year_only() {
        assert_eq!(
            parse_since("2015").expect("valid year"),
            Date::from_calendar_date(2015, Month::January, 1).expect("date")
        );
    }

    #[test]
    fn expands_year_month() {
        assert_eq!(
            parse_since("2015-06").expect("valid year-month"),
            Date::from_calendar_date(2015, Month::June, 1).expect("date")
        );
    }

    #[test]
    fn keeps_full_date() {
        assert_eq!(
            parse_since(" 2024-02-29 ").expect("leap day"),
            Date::from_calendar_date(2024, Month::February, 29).expect("date")
        );
    }

    #[test]
    fn rejects_invalid_month() {
        let err = parse_since("2015-13").expect_err("month should fail");
        assert!(err.to_string().contains("Invalid month"));
    }

    #[test]
    fn rejects_invalid_day_and_shape() {
        let err = parse_since("2023-02-29").expect_err("not a leap year");
        assert!(err.to_string().contains("Invalid day 29"));
        for bad in ["", "15", "2015/06", "2015-6", "yesterday"] {
            assert!(parse_since(bad).is_err(), "{bad} should fail");
        }
    }
}
