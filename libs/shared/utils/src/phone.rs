/// Strips the separators people type into phone numbers so that
/// "+1 555 123-4567" and "+15551234567" compare equal.
pub fn normalize_number(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '-' | '(' | ')' | '.'))
        .collect()
}

/// Compares two numbers ignoring formatting and the leading `+`, which an
/// unencoded query string turns into a space.
pub fn same_number(a: &str, b: &str) -> bool {
    let a = normalize_number(a);
    let b = normalize_number(b);
    a.trim_start_matches('+') == b.trim_start_matches('+')
}
