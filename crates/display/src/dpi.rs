//! DPI scale helpers

/// DPI that Windows treats as 100% scaling
pub const BASE_DPI: u32 = 96;

/// Scale factor for a raw DPI reading. Zero readings map to 1.0.
pub fn scale_from_dpi(dpi: u32) -> f64 {
    if dpi == 0 {
        return 1.0;
    }
    dpi as f64 / BASE_DPI as f64
}

/// Convert physical pixels to logical units
pub fn physical_to_logical(physical: i32, scale: f64) -> f64 {
    physical as f64 / sanitize_scale(scale)
}

/// Replace unusable scale factors with 1.0
pub fn sanitize_scale(scale: f64) -> f64 {
    if scale.is_finite() && scale > 0.0 {
        scale
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn common_dpi_values() {
        assert_eq!(scale_from_dpi(96), 1.0);
        assert_eq!(scale_from_dpi(144), 1.5);
        assert_eq!(scale_from_dpi(192), 2.0);
        assert_eq!(scale_from_dpi(0), 1.0);
    }

    #[test]
    fn conversions_ignore_bad_scale() {
        assert_eq!(physical_to_logical(3000, 1.5), 2000.0);
        assert_eq!(physical_to_logical(-1920, 2.0), -960.0);
        assert_eq!(physical_to_logical(800, 0.0), 800.0);
        assert_eq!(physical_to_logical(800, f64::NAN), 800.0);
    }
}
