//! `Authorization: Token <key>` header parsing
//!
//! Only the shape of the header is checked here. Whether the credential is a
//! well-formed key, and whether it is known, is decided by the caller.

/// Scheme keyword expected in front of the credential
pub const TOKEN_SCHEME: &str = "Token";

/// Reasons a header cannot yield a credential
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AuthHeaderError {
    #[error("Authentication credentials were not provided")]
    Missing,

    #[error("Unsupported authentication scheme")]
    WrongScheme,

    #[error("Invalid token header. No credentials provided")]
    NoCredentials,

    #[error("Invalid token header. Token string should not contain spaces")]
    ContainsSpaces,
}

/// Extract the credential from an `Authorization` header value
///
/// The scheme keyword is matched case-insensitively.
///
/// # Errors
/// Returns an [`AuthHeaderError`] describing why no credential was found
pub fn parse_authorization_header(header: Option<&str>) -> Result<&str, AuthHeaderError> {
    let header = header.ok_or(AuthHeaderError::Missing)?;
    let mut parts = header.split_whitespace();

    let scheme = parts.next().ok_or(AuthHeaderError::Missing)?;
    if !scheme.eq_ignore_ascii_case(TOKEN_SCHEME) {
        return Err(AuthHeaderError::WrongScheme);
    }

    let credential = parts.next().ok_or(AuthHeaderError::NoCredentials)?;
    if parts.next().is_some() {
        return Err(AuthHeaderError::ContainsSpaces);
    }

    Ok(credential)
}
