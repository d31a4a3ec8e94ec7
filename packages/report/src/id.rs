//! Report fingerprints.

/// Length of a report id in hex characters.
pub const REPORT_ID_LEN: usize = 12;

/// Derives the report id for an area: the MD5 of the lower-cased name,
/// as lowercase hex, truncated to [`REPORT_ID_LEN`] characters.
///
/// Callers trim the area first; case differences map to the same id.
#[must_use]
pub fn report_id(area: &str) -> String {
    let mut hex = format!("{:x}", md5::compute(area.to_lowercase()));
    hex.truncate(REPORT_ID_LEN);
    hex
}
