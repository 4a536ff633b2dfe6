//! Display formatting for report values.
//!
//! These functions are total: any undefined computation (missing value,
//! division by zero, non-finite input) renders the sentinel glyph instead of
//! propagating an error into a report page.

/// Placeholder shown for undefined/invalid values.
pub const SENTINEL: &str = "—";

/// Percent difference `(current/previous - 1) * 100`.
///
/// `None` when previous is zero, either side is missing, or anything along
/// the way is non-finite. Never panics.
pub fn percent_change(current: Option<f64>, previous: Option<f64>) -> Option<f64> {
    let current = current.filter(|v| v.is_finite())?;
    let previous = previous.filter(|v| v.is_finite() && *v != 0.0)?;

    // Divide last: (current/previous - 1) * 100 rounds 20.0 to
    // 19.999999999999996 in f64
    let change = (current - previous) * 100.0 / previous;
    change.is_finite().then_some(change)
}

/// Render a percent change as a signed one-decimal string, or the sentinel.
pub fn percent_change_display(current: Option<f64>, previous: Option<f64>) -> String {
    match percent_change(current, previous) {
        Some(change) => format!("{:+.1}%", change),
        None => SENTINEL.to_string(),
    }
}

/// Render an ROI value for display.
///
/// Sentinel for null or zero. Six decimal places when `0 < |v| < 0.0005`,
/// so tiny nonzero yields do not render as "0.000"; three otherwise.
pub fn roi_display(value: Option<f64>) -> String {
    let v = match value {
        Some(v) if v.is_finite() && v != 0.0 => v,
        _ => return SENTINEL.to_string(),
    };

    if v.abs() < 0.0005 {
        format!("{:.6}", v)
    } else {
        format!("{:.3}", v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_change_basic() {
        // Exact equality is deliberate: the result must be 20.0, not
        // 19.999999999999996
        assert_eq!(percent_change(Some(120.0), Some(100.0)), Some(20.0));
        assert_eq!(percent_change(Some(80.0), Some(100.0)), Some(-20.0));
        assert_eq!(percent_change(Some(130.0), Some(100.0)), Some(30.0));
    }

    #[test]
    fn percent_change_zero_previous_is_sentinel() {
        assert_eq!(percent_change(Some(120.0), Some(0.0)), None);
        assert_eq!(percent_change(Some(0.0), Some(0.0)), None);
        assert_eq!(percent_change(Some(-5.0), Some(0.0)), None);
    }

    #[test]
    fn percent_change_invalid_inputs_are_sentinel() {
        assert_eq!(percent_change(None, Some(100.0)), None);
        assert_eq!(percent_change(Some(100.0), None), None);
        assert_eq!(percent_change(Some(f64::NAN), Some(100.0)), None);
        assert_eq!(percent_change(Some(100.0), Some(f64::INFINITY)), None);
    }

    #[test]
    fn percent_change_display_renders_sign_and_sentinel() {
        assert_eq!(percent_change_display(Some(120.0), Some(100.0)), "+20.0%");
        assert_eq!(percent_change_display(Some(80.0), Some(100.0)), "-20.0%");
        assert_eq!(percent_change_display(Some(80.0), Some(0.0)), SENTINEL);
        assert_eq!(percent_change_display(None, None), SENTINEL);
    }

    #[test]
    fn roi_display_sentinel_cases() {
        assert_eq!(roi_display(None), "—");
        assert_eq!(roi_display(Some(0.0)), "—");
        assert_eq!(roi_display(Some(f64::NAN)), "—");
    }

    #[test]
    fn roi_display_tiny_values_keep_precision() {
        assert_eq!(roi_display(Some(0.0003)), "0.000300");
        assert_eq!(roi_display(Some(-0.0004)), "-0.000400");
    }

    #[test]
    fn roi_display_normal_values_three_decimals() {
        assert_eq!(roi_display(Some(1.2345)), "1.234");
        assert_eq!(roi_display(Some(0.0751)), "0.075");
        assert_eq!(roi_display(Some(0.0005)), "0.001");
    }
}
