/// Converts `"SS"`, `"MM:SS"` or `"HH:MM:SS"` to seconds. Anything else,
/// including `"LIVE"` and the empty string, is zero.
pub fn duration_to_seconds(text: &str) -> u64 {
    let text = text.trim();
    if text.is_empty() {
        return 0;
    }

    let parts: Vec<&str> = text.split(':').collect();
    if parts.len() > 3 {
        return 0;
    }

    parts
        .iter()
        .try_fold(0u64, |total, part| {
            let value = part.trim().parse::<u64>().ok()?;
            total.checked_mul(60)?.checked_add(value)
        })
        .unwrap_or(0)
}
