use thiserror::Error;

/// Why a URI scheme failed validation (RFC 3986 sec 3.1, RFC 3987 sec 2.2).
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemeError {
    #[error("scheme is empty")]
    Empty,
    #[error("first character must be an ASCII letter")]
    InvalidFirstCharacter,
    #[error("only letters, digits, '-', '.' and '+' may follow the first character")]
    DisallowedCharacter,
    #[error("scheme contains non-ASCII characters")]
    NonAscii,
}

/// Check a lower-cased scheme.
pub fn validate_scheme(scheme: &str) -> Result<(), SchemeError> {
    let mut chars = scheme.chars();
    let first = chars.next().ok_or(SchemeError::Empty)?;

    if !scheme.is_ascii() {
        return Err(SchemeError::NonAscii);
    }
    if !first.is_ascii_lowercase() {
        return Err(SchemeError::InvalidFirstCharacter);
    }
    if chars.any(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '-' | '.' | '+'))) {
        return Err(SchemeError::DisallowedCharacter);
    }
    Ok(())
}

/// Extract the lower-cased scheme of `path`.
///
/// Only the first `max_len + 1` bytes are searched for the `:` delimiter, so a
/// scheme longer than any registered one is never found.
pub fn extract_scheme(path: &str, max_len: usize) -> Option<String> {
    let bound = path.len().min(max_len.saturating_add(1));
    let delim = path.as_bytes()[..bound].iter().position(|&b| b == b':')?;
    if delim == 0 {
        return None;
    }
    Some(path[..delim].to_ascii_lowercase())
}
