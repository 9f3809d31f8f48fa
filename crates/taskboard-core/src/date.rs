use thiserror::Error;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime};

/// Error returned when a string cannot be read as a calendar date.
#[derive(Debug, Error)]
#[error("invalid date `{input}` (expected YYYY-MM-DD or RFC3339): {source}")]
pub struct DateParseError {
    input: String,
    #[source]
    source: time::error::Parse,
}

/// Render a date in ISO `YYYY-MM-DD` form.
#[must_use]
pub fn format_date(date: Date) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}

/// Parse an ISO date. Date-times are accepted and truncated to their calendar day.
///
/// # Errors
/// Returns an error if the input is neither a date nor a date-time.
pub fn parse_date(input: &str) -> Result<Date, DateParseError> {
    let trimmed = input.trim();
    let date_only = format_description!("[year]-[month]-[day]");
    match Date::parse(trimmed, date_only) {
        Ok(date) => Ok(date),
        Err(source) => {
            if let Ok(dt) = OffsetDateTime::parse(trimmed, &Rfc3339) {
                return Ok(dt.date());
            }
            let local = format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");
            PrimitiveDateTime::parse(trimmed, local)
                .map(PrimitiveDateTime::date)
                .map_err(|_| DateParseError {
                    input: input.to_owned(),
                    source,
                })
        }
    }
}

/// Serde adapter storing a [`Date`] as `YYYY-MM-DD`.
pub mod iso_date {
    use serde::{Deserialize, Deserializer, Serializer};
    use time::Date;

    /// Serialize as `YYYY-MM-DD`.
    ///
    /// # Errors
    /// Propagates serializer failures.
    pub fn serialize<S>(date: &Date, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        s.serialize_str(&super::format_date(*date))
    }

    /// Deserialize from a date or date-time string.
    ///
    /// # Errors
    /// Fails when the string is not a recognised date.
    pub fn deserialize<'de, D>(d: D) -> Result<Date, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(d)?;
        super::parse_date(&raw).map_err(serde::de::Error::custom)
    }

    /// Same adapter for optional dates (`null` stays `None`).
    pub mod option {
        use serde::{Deserialize, Deserializer, Serializer};
        use time::Date;

        /// Serialize `Some` as `YYYY-MM-DD`, `None` as `null`.
        ///
        /// # Errors
        /// Propagates serializer failures.
        #[allow(clippy::ref_option)]
        pub fn serialize<S>(date: &Option<Date>, s: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            match date {
                Some(date) => s.serialize_str(&super::super::format_date(*date)),
                None => s.serialize_none(),
            }
        }

        /// Deserialize `null`, empty strings, or a date string.
        ///
        /// # Errors
        /// Fails when a non-empty string is not a recognised date.
        pub fn deserialize<'de, D>(d: D) -> Result<Option<Date>, D::Error>
        where
            D: Deserializer<'de>,
        {
            let raw = Option::<String>::deserialize(d)?;
            match raw.as_deref().map(str::trim) {
                None | Some("") => Ok(None),
                Some(value) => super::super::parse_date(value)
                    .map(Some)
                    .map_err(serde::de::Error::custom),
            }
        }
    }
}
