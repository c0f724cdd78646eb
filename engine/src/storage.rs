//! Object path conventions for the media bucket.
//!
//! Saved properties store files under `properties/{propertyId}/`, unsaved
//! drafts under `temp/`. Every object name is prefixed with a fresh UUID so
//! two uploads of the same filename never share a path (and so never share
//! a public URL).

/// Path segment that precedes the bucket name in a public object URL.
pub const PUBLIC_OBJECT_MARKER: &str = "/storage/v1/object/public/";

/// Replace anything outside `[A-Za-z0-9._-]` and drop directory parts.
pub fn sanitize_filename(filename: &str) -> String {
    let base = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename)
        .trim();

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Object path for a new upload.
pub fn object_path(property_id: Option<&str>, filename: &str) -> String {
    let unique = uuid::Uuid::new_v4();
    let name = sanitize_filename(filename);
    match property_id {
        Some(id) => format!("properties/{}/{}-{}", id, unique, name),
        None => format!("temp/{}-{}", unique, name),
    }
}

/// Public URL of an object, given the service base URL.
pub fn public_url(base_url: &str, bucket: &str, path: &str) -> String {
    format!(
        "{}{}{}/{}",
        base_url.trim_end_matches('/'),
        PUBLIC_OBJECT_MARKER,
        bucket,
        path
    )
}

/// Recover the object path from a public URL.
///
/// Returns `None` when the URL does not point into `bucket`.
pub fn path_from_public_url(url: &str, bucket: &str) -> Option<String> {
    let prefix = format!("{}{}/", PUBLIC_OBJECT_MARKER, bucket);
    let start = url.find(&prefix)? + prefix.len();
    let rest = &url[start..];
    let path = rest.split(['?', '#']).next().unwrap_or(rest);
    if path.is_empty() || path.split('/').any(|segment| segment == "..") {
        return None;
    }
    Some(path.to_string())
}
