//! Extraction of the declared API version from request metadata.

use axum::http::{header, HeaderMap, HeaderName};

/// Find the version a request declares, if any.
///
/// The version header wins; otherwise, when `host_versioning` is enabled, a
/// leading `v<major>-<minor>` host label (`v1-1.api.example.com`) is used.
/// A header that is present but not valid UTF-8 is still reported so the
/// resolver can reject it.
pub fn declared_version(
    headers: &HeaderMap,
    version_header: &HeaderName,
    host_versioning: bool,
) -> Option<String> {
    if let Some(value) = headers.get(version_header) {
        return Some(String::from_utf8_lossy(value.as_bytes()).into_owned());
    }
    if !host_versioning {
        return None;
    }

    let host = headers.get(header::HOST)?.to_str().ok()?;
    version_from_host(host)
}

/// Parse a `v<major>-<minor>` leading host label into `<major>.<minor>`.
pub fn version_from_host(host: &str) -> Option<String> {
    let label = host.split(['.', ':']).next()?;
    let (major, minor) = label.strip_prefix('v')?.split_once('-')?;

    let is_number = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if is_number(major) && is_number(minor) {
        Some(format!("{}.{}", major, minor))
    } else {
        None
    }
}
