//! Human-readable byte sizes using 1024-based units.

/// Binary unit labels, smallest first. Seven entries cover all of `u64`.
const UNITS: [&str; 7] = ["Bytes", "KB", "MB", "GB", "TB", "PB", "EB"];

const STEP: u64 = 1024;

/// Formats a byte count with two decimals of precision.
///
/// ```
/// use megalink_core::format_bytes;
///
/// assert_eq!(format_bytes(0), "0 Bytes");
/// assert_eq!(format_bytes(2048), "2 KB");
/// assert_eq!(format_bytes(1536), "1.5 KB");
/// ```
#[must_use]
pub fn format_bytes(bytes: u64) -> String {
    format_bytes_with_decimals(bytes, 2)
}

/// Formats a byte count, rounding the scaled value to `decimals` places.
///
/// The largest unit whose scaled value is at least 1 is chosen. Trailing
/// zeros left by rounding are dropped.
#[must_use]
pub fn format_bytes_with_decimals(bytes: u64, decimals: usize) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let index = bytes.ilog(STEP) as usize;
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_possible_wrap
    )]
    let scaled = bytes as f64 / (STEP as f64).powi(index as i32);
    let rounded: f64 = format!("{scaled:.decimals$}").parse().unwrap_or(scaled);
    format!("{rounded} {}", UNITS[index])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes_zero() {
        assert_eq!(format_bytes(0), "0 Bytes");
    }

    #[test]
    fn test_format_bytes_unit_boundaries() {
        assert_eq!(format_bytes(1), "1 Bytes");
        assert_eq!(format_bytes(1023), "1023 Bytes");
        assert_eq!(format_bytes(1024), "1 KB");
        assert_eq!(format_bytes(1_048_576), "1 MB");
        assert_eq!(format_bytes(1_073_741_824), "1 GB");
        assert_eq!(format_bytes(1_099_511_627_776), "1 TB");
    }

    #[test]
    fn test_format_bytes_fractional_values() {
        assert_eq!(format_bytes(2048), "2 KB");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(1_234_567), "1.18 MB");
        assert_eq!(format_bytes(5_000_000_000), "4.66 GB");
    }

    #[test]
    fn test_format_bytes_rounding_can_reach_next_integer() {
        // 1048575 bytes is 1023.999 KB; rounding keeps the KB unit.
        assert_eq!(format_bytes(1_048_575), "1024 KB");
    }

    #[test]
    fn test_format_bytes_beyond_terabytes() {
        assert_eq!(format_bytes(1u64 << 50), "1 PB");
        assert_eq!(format_bytes(1u64 << 60), "1 EB");
        assert_eq!(format_bytes(u64::MAX), "16 EB");
    }

    #[test]
    fn test_format_bytes_with_decimals_precision() {
        assert_eq!(format_bytes_with_decimals(1_234_567, 0), "1 MB");
        assert_eq!(format_bytes_with_decimals(1_234_567, 4), "1.1774 MB");
        assert_eq!(format_bytes_with_decimals(1023, 3), "1023 Bytes");
    }
}
