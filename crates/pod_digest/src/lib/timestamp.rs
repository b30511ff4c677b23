//! Canonical timestamp formatting. Every display timestamp in the
//! pipeline goes through [`format_timestamp`]; callers never format
//! offsets themselves.

/// Formats a non-negative offset in seconds as `HH:MM:SS`.
///
/// Fields are truncated, never rounded, and zero-padded to width 2. The
/// hours field grows beyond two digits instead of wrapping at 24.
pub fn format_timestamp(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;
    format!("{hours:02}:{minutes:02}:{secs:02}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero() {
        assert_eq!(format_timestamp(0.0), "00:00:00");
    }

    #[test]
    fn test_each_field_padded() {
        assert_eq!(format_timestamp(3661.0), "01:01:01");
    }

    #[test]
    fn test_last_second_of_day() {
        assert_eq!(format_timestamp(86399.0), "23:59:59");
    }

    #[test]
    fn test_hours_overflow_beyond_24() {
        assert_eq!(format_timestamp(90000.0), "25:00:00");
    }

    #[test]
    fn test_fractional_seconds_truncated() {
        assert_eq!(format_timestamp(3661.9), "01:01:01");
        assert_eq!(format_timestamp(0.999), "00:00:00");
    }

    #[test]
    fn test_shape_is_hh_mm_ss() {
        for s in [0.0, 59.0, 60.0, 3599.0, 3600.0, 359999.0] {
            let formatted = format_timestamp(s);
            let parts: Vec<&str> = formatted.split(':').collect();
            assert_eq!(parts.len(), 3, "{formatted}");
            assert!(parts[0].len() >= 2);
            assert_eq!(parts[1].len(), 2);
            assert_eq!(parts[2].len(), 2);
        }
    }
}
