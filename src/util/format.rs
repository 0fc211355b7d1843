/// Seconds as hours with up to two decimals: `7200` → `2h`, `5400` → `1.5h`.
pub fn format_hours(seconds: f64) -> String {
    let hours = seconds / 3600.0;
    let rounded = (hours * 100.0).round() / 100.0;
    let mut text = format!("{:.2}", rounded);
    while text.ends_with('0') {
        text.pop();
    }
    if text.ends_with('.') {
        text.pop();
    }
    if text == "-0" {
        text = "0".to_string();
    }
    format!("{}h", text)
}

/// Compact estimate for card badges: `5400` → `1h 30m`, `900` → `15m`.
pub fn format_estimate(seconds: f64) -> String {
    let total_minutes = (seconds / 60.0).round().max(0.0) as u64;
    let hours = total_minutes / 60;
    let minutes = total_minutes % 60;
    match (hours, minutes) {
        (0, m) => format!("{}m", m),
        (h, 0) => format!("{}h", h),
        (h, m) => format!("{}h {}m", h, m),
    }
}

/// Percentage with no decimals, e.g. `66.6` → `67%`
pub fn format_percent(value: f64) -> String {
    format!("{:.0}%", value)
}
