use url::Url;

use crate::error::EventError;

/// Reduce a URL to its origin: `scheme://host[:port]`.
///
/// Path, query, and fragment are dropped; an explicit non-default port is
/// kept. Inputs without a scheme or host are rejected. Idempotent:
/// normalizing an origin returns it unchanged.
pub fn normalize_origin(input: &str) -> Result<String, EventError> {
    let parsed =
        Url::parse(input.trim()).map_err(|err| EventError::InvalidUrl(err.to_string()))?;
    let host = parsed
        .host_str()
        .ok_or_else(|| EventError::InvalidUrl(format!("no host in '{input}'")))?;
    Ok(match parsed.port() {
        Some(port) => format!("{}://{host}:{port}", parsed.scheme()),
        None => format!("{}://{host}", parsed.scheme()),
    })
}
