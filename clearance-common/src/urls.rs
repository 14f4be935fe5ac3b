//! Public URL construction for stored records
//!
//! Every path that embeds a record id is built here so the QR payload, the
//! upload response and the router agree on the same shapes.

use crate::segments::UrlSegments;

/// Path prefix of the QR verification target
pub const REGISTRATION_PREFIX: &str = "/core/structure/registration";

/// Path prefix of the clearance listing
pub const CLEARANCE_PREFIX: &str = "/clearance";

/// Path prefix of the plain verification page
pub const VERIFY_PREFIX: &str = "/verify";

fn join(prefix: &str, record_id: &str, segments: Option<&UrlSegments>) -> String {
    match segments {
        Some(s) => format!("{}/{}/{}", prefix, s.as_path(), record_id),
        None => format!("{}/{}", prefix, record_id),
    }
}

/// Absolute URL encoded in the QR image.
///
/// `{base_url}/core/structure/registration/[p1/../p5/]{record_id}`; a
/// trailing slash on `base_url` is ignored.
pub fn verification_url(base_url: &str, record_id: &str, segments: Option<&UrlSegments>) -> String {
    format!(
        "{}{}",
        base_url.trim_end_matches('/'),
        join(REGISTRATION_PREFIX, record_id, segments)
    )
}

/// Relative path of the clearance listing
pub fn clearance_path(record_id: &str, segments: Option<&UrlSegments>) -> String {
    join(CLEARANCE_PREFIX, record_id, segments)
}

/// Relative path of the verification page
pub fn verify_path(record_id: &str) -> String {
    join(VERIFY_PREFIX, record_id, None)
}
