//! Human-readable rendering of the counter.

/// Render a count for the "you and N others" line.
///
/// ```
/// use counter_shared::format_count;
///
/// assert_eq!(format_count(0), "none yet");
/// assert_eq!(format_count(1), "1 other");
/// assert_eq!(format_count(1000), "1,000 others");
/// ```
pub fn format_count(count: u64) -> String {
    match count {
        0 => "none yet".to_string(),
        1 => "1 other".to_string(),
        n => format!("{} others", group_thousands(n)),
    }
}

/// Insert `,` every three digits from the right (en-US grouping).
fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    grouped
}
