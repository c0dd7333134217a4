//! Byte-size formatting for progress reporting

/// Format a cumulative byte count for display (two decimals, B..TB)
pub fn format_size(size: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = 1024.0 * 1024.0;
    const GB: f64 = 1024.0 * 1024.0 * 1024.0;
    const TB: f64 = 1024.0 * 1024.0 * 1024.0 * 1024.0;

    let size = size as f64;
    if size < KB {
        format!("{size:.2}B")
    } else if size < MB {
        format!("{:.2}KB", size / KB)
    } else if size < GB {
        format!("{:.2}MB", size / MB)
    } else if size < TB {
        format!("{:.2}GB", size / GB)
    } else {
        format!("{:.2}TB", size / TB)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size_bytes() {
        assert_eq!(format_size(0), "0.00B");
        assert_eq!(format_size(512), "512.00B");
    }

    #[test]
    fn test_format_size_thresholds() {
        assert_eq!(format_size(1023), "1023.00B");
        assert_eq!(format_size(1024), "1.00KB");
        assert_eq!(format_size(1048576), "1.00MB");
        assert_eq!(format_size(1073741824), "1.00GB");
        assert_eq!(format_size(1099511627776), "1.00TB");
    }

    #[test]
    fn test_format_size_fractional() {
        assert_eq!(format_size(1536), "1.50KB");
        assert_eq!(format_size(50_000), "48.83KB");
    }
}
