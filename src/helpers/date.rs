//! Date helper functions

use chrono::{DateTime, Locale, Utc};
use chrono_tz::Tz;

use crate::config::SiteConfig;

/// Formats publication dates in the site's locale and timezone
#[derive(Debug, Clone)]
pub struct DateFormatter {
    locale: Locale,
    timezone: Tz,
    date_format: String,
    time_format: String,
}

impl DateFormatter {
    /// Create a formatter from the site configuration.
    ///
    /// Unknown locales fall back to `en_US` and unknown timezones to UTC.
    pub fn new(config: &SiteConfig) -> Self {
        let locale = Locale::try_from(config.language.as_str()).unwrap_or_else(|_| {
            tracing::warn!("Unknown locale {:?}, using en_US", config.language);
            Locale::en_US
        });

        let timezone = if config.timezone.is_empty() {
            Tz::UTC
        } else {
            config.timezone.parse::<Tz>().unwrap_or_else(|_| {
                tracing::warn!("Unknown timezone {:?}, using UTC", config.timezone);
                Tz::UTC
            })
        };

        Self {
            locale,
            timezone,
            date_format: moment_to_chrono_format(&config.date_format),
            time_format: moment_to_chrono_format(&config.time_format),
        }
    }

    /// Publication date, e.g. `15 Mar 2021`
    pub fn date(&self, date: &DateTime<Utc>) -> String {
        date.with_timezone(&self.timezone)
            .format_localized(&self.date_format, self.locale)
            .to_string()
    }

    /// Time of day, e.g. `09:30`
    pub fn time(&self, date: &DateTime<Utc>) -> String {
        date.with_timezone(&self.timezone)
            .format_localized(&self.time_format, self.locale)
            .to_string()
    }
}

impl Default for DateFormatter {
    fn default() -> Self {
        Self::new(&SiteConfig::default())
    }
}

/// Format a date in ISO 8601 / XML format
pub fn date_xml(date: &DateTime<Utc>) -> String {
    date.format("%Y-%m-%dT%H:%M:%S%.3f%:z").to_string()
}

/// Convert Moment.js format to chrono format
fn moment_to_chrono_format(format: &str) -> String {
    // Longest patterns first within each category
    let replacements = [
        ("YYYY", "%Y"),
        ("YY", "%y"),
        ("MMMM", "%B"),
        ("MMM", "%b"),
        ("MM", "%m"),
        ("DDDD", "%j"),
        ("DD", "%d"),
        ("HH", "%H"),
        ("hh", "%I"),
        ("mm", "%M"),
        ("ss", "%S"),
        ("dddd", "%A"),
        ("ddd", "%a"),
        ("ZZ", "%z"),
        ("SSS", "%3f"),
    ];

    let mut result = format.to_string();

    for (from, to) in replacements {
        result = result.replace(from, to);
    }

    result
}
