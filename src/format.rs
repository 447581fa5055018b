/// Round to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Format a float for the report: shortest representation, always with a
/// fractional part ("-20.0", "12.5", "705.78").
pub fn format_float(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}

/// Format a duration in seconds as "M min S sec", dropping fractional seconds.
pub fn format_total_duration(secs: f64) -> String {
    let total_secs = if secs > 0.0 { secs.trunc() as u64 } else { 0 };
    let minutes = total_secs / 60;
    let seconds = total_secs % 60;
    format!("{} min {} sec", minutes, seconds)
}
