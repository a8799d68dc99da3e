use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};
use directories::{BaseDirs, ProjectDirs};
use std::path::PathBuf;

/// Profile mode for the application (dev or prod)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    Dev,
    Prod,
}

/// Get the configuration directory path.
/// If profile is Dev, uses "tarefas-dev" instead of "tarefas"
pub fn get_config_dir(profile: Profile) -> Option<PathBuf> {
    let app_name = match profile {
        Profile::Dev => "tarefas-dev",
        Profile::Prod => "tarefas",
    };
    ProjectDirs::from("com", "tarefas", app_name).map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the data directory path.
/// If profile is Dev, uses "tarefas-dev" instead of "tarefas"
pub fn get_data_dir(profile: Profile) -> Option<PathBuf> {
    let app_name = match profile {
        Profile::Dev => "tarefas-dev",
        Profile::Prod => "tarefas",
    };
    ProjectDirs::from("com", "tarefas", app_name).map(|dirs| dirs.data_dir().to_path_buf())
}

/// Expand `~` in a path string to the user's home directory
pub fn expand_path(path: &str) -> PathBuf {
    if path.starts_with("~/") {
        if let Some(home) = BaseDirs::new().map(|d| d.home_dir().to_path_buf()) {
            return home.join(&path[2..]);
        }
    }
    PathBuf::from(path)
}

/// Parse a date string in ISO 8601 format (YYYY-MM-DD)
pub fn parse_date(date_str: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
}

/// An out-of-range configured offset degrades to UTC.
fn display_offset(utc_offset_minutes: i32) -> FixedOffset {
    FixedOffset::east_opt(utc_offset_minutes * 60).unwrap_or_else(|| Utc.fix())
}

/// Today's calendar date in the display offset. Due-date buckets are
/// computed against this, so "today" follows the configured offset.
pub fn today(utc_offset_minutes: i32) -> NaiveDate {
    Utc::now()
        .with_timezone(&display_offset(utc_offset_minutes))
        .date_naive()
}

/// Render a UTC timestamp in the display offset, `dd/mm/yyyy hh:mm:ss`.
pub fn format_datetime(dt: DateTime<Utc>, utc_offset_minutes: i32) -> String {
    dt.with_timezone(&display_offset(utc_offset_minutes))
        .format("%d/%m/%Y %H:%M:%S")
        .to_string()
}

/// Render an optional calendar date as `dd/mm/yyyy`, or `N/A` when absent
pub fn format_date(date: Option<NaiveDate>) -> String {
    match date {
        Some(d) => d.format("%d/%m/%Y").to_string(),
        None => "N/A".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parse_date_accepts_iso_only() {
        assert_eq!(
            parse_date("2025-03-10").unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
        );
        assert!(parse_date("10/03/2025").is_err());
        assert!(parse_date("not-a-date").is_err());
    }

    #[test]
    fn format_datetime_applies_offset() {
        let dt = Utc.with_ymd_and_hms(2025, 3, 10, 23, 30, 0).unwrap();
        assert_eq!(format_datetime(dt, 0), "10/03/2025 23:30:00");
        assert_eq!(format_datetime(dt, -180), "10/03/2025 20:30:00");
        // A positive offset crosses into the next calendar day here.
        assert_eq!(format_datetime(dt, 60), "11/03/2025 00:30:00");
    }

    #[test]
    fn format_date_handles_absent() {
        assert_eq!(format_date(NaiveDate::from_ymd_opt(2025, 3, 10)), "10/03/2025");
        assert_eq!(format_date(None), "N/A");
    }
}
