//! Record id generation
//!
//! A record id is `{school_code}-{6 lowercase hex chars}`. The suffix is cut
//! from a random UUIDv4, so uniqueness is probabilistic; stores regenerate on
//! primary-key collision.

use uuid::Uuid;

/// Length of the random hex suffix
pub const SUFFIX_LEN: usize = 6;

/// Generate a new record id for a school
pub fn generate_record_id(school_code: &str) -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("{}-{}", school_code, &hex[..SUFFIX_LEN])
}

/// Check that `id` is `{school_code}-` followed by exactly 6 lowercase hex chars
pub fn is_record_id_for(school_code: &str, id: &str) -> bool {
    let Some(suffix) = id
        .strip_prefix(school_code)
        .and_then(|rest| rest.strip_prefix('-'))
    else {
        return false;
    };

    suffix.len() == SUFFIX_LEN
        && suffix
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}
