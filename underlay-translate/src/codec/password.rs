/// Underlay marker for a password stored in plain text.
pub const PLAIN_PREFIX: &str = "!";

/// Canonical rendering of a password the device keeps encrypted.
pub const ENCRYPTED_PATTERN: &str = "Encrypted[%s]";

const ENCRYPTED_OPEN: &str = "Encrypted[";

/// Canonical password to its underlay form: plain text gains the `!` marker, an
/// `Encrypted[...]` value is passed through unwrapped.
pub fn password_to_underlay(canonical: &str) -> String {
    match canonical
        .strip_prefix(ENCRYPTED_OPEN)
        .and_then(|rest| rest.strip_suffix(']'))
    {
        Some(encrypted) => encrypted.to_string(),
        None => format!("{PLAIN_PREFIX}{canonical}"),
    }
}

/// Underlay password to its canonical form.
pub fn password_from_underlay(underlay: &str) -> String {
    match underlay.strip_prefix(PLAIN_PREFIX) {
        Some(plain) => plain.to_string(),
        None => ENCRYPTED_PATTERN.replace("%s", underlay),
    }
}
