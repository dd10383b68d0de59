//! Phone number normalisation.

/// Normalises a phone number to E.164 form.
///
/// Whitespace is removed. Numbers without a leading `+` are treated as
/// Danish: leading zeros are dropped and `+45` is prepended.
///
/// # Examples
///
/// ```rust
/// use confirmation_engine::notification::domain::normalize_phone;
///
/// assert_eq!(normalize_phone("20 30 40 50"), "+4520304050");
/// assert_eq!(normalize_phone("+46 701234567"), "+46701234567");
/// ```
#[must_use]
pub fn normalize_phone(raw: &str) -> String {
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.starts_with('+') {
        compact
    } else {
        format!("+45{}", compact.trim_start_matches('0'))
    }
}
