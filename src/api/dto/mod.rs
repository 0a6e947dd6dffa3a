/*
 * Responsibility
 * - request / response DTO と、その形式チェック
 * - 複数 resource で共有する path/query 値の検証もここに置く
 */
pub mod bearer_tokens;
pub mod preferences;
pub mod receipt;
pub mod register;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use uuid::Uuid;

/// NHS number: exactly ten ASCII digits.
pub fn validate_patient_id(value: &str) -> Result<&str, String> {
    if value.len() == 10 && value.bytes().all(|b| b.is_ascii_digit()) {
        Ok(value)
    } else {
        Err("patientId must be a 10 digit NHS number".to_string())
    }
}

/// Document GUID as sent by the caller; stored exactly as given.
pub fn validate_guid(value: &str) -> Result<&str, String> {
    Uuid::parse_str(value)
        .map(|_| value)
        .map_err(|_| "id must be a GUID".to_string())
}

/// `YYYY-MM-DD`, RFC 3339, or a naive `YYYY-MM-DDTHH:MM:SS[.fff]` read as UTC.
pub fn parse_datetime(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.and_utc());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(dt.and_utc());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn patient_ids() {
        assert!(validate_patient_id("9999999999").is_ok());
        assert!(validate_patient_id("999999999").is_err());
        assert!(validate_patient_id("99999999990").is_err());
        assert!(validate_patient_id("99999x9999").is_err());
        assert!(validate_patient_id("").is_err());
    }

    #[test]
    fn guids() {
        assert!(validate_guid("EFE4F61C-5BF7-4A5A-8B4E-9E8D9C6C9F0D").is_ok());
        assert!(validate_guid("not-a-guid").is_err());
    }

    #[test]
    fn datetime_forms() {
        let midnight = Utc.with_ymd_and_hms(2021, 1, 8, 0, 0, 0).unwrap();
        assert_eq!(parse_datetime("2021-01-08"), Some(midnight));
        assert_eq!(
            parse_datetime("2021-01-08T10:03:50Z"),
            Some(Utc.with_ymd_and_hms(2021, 1, 8, 10, 3, 50).unwrap())
        );
        assert_eq!(
            parse_datetime("2021-01-08T11:03:50+01:00"),
            Some(Utc.with_ymd_and_hms(2021, 1, 8, 10, 3, 50).unwrap())
        );
        assert_eq!(
            parse_datetime("2021-01-08T10:03:50"),
            Some(Utc.with_ymd_and_hms(2021, 1, 8, 10, 3, 50).unwrap())
        );
        assert_eq!(parse_datetime("2021-13-08"), None);
        assert_eq!(parse_datetime("yesterday"), None);
    }
}
