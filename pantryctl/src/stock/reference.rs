//! Movement reference numbers.
//!
//! References look like `TRF-20250301-0007`: the movement type prefix, the
//! creation date, and a per-prefix-per-day sequence. The sequence is derived
//! from the previous reference for the same prefix and date, so the caller is
//! responsible for reading that reference under a lock.

use chrono::NaiveDate;

use super::MovementType;

const SEQUENCE_WIDTH: usize = 4;

/// The `PREFIX-YYYYMMDD` part shared by all references of one type on one day.
pub fn reference_stem(movement_type: MovementType, date: NaiveDate) -> String {
    format!("{}-{}", movement_type.prefix(), date.format("%Y%m%d"))
}

/// Parse the trailing sequence number out of a reference.
///
/// Returns `None` for anything that does not end in `-<digits>`.
pub fn parse_sequence(reference: &str) -> Option<u32> {
    let (_, tail) = reference.rsplit_once('-')?;
    if tail.is_empty() || !tail.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    tail.parse().ok()
}

/// Build the next reference after `previous`.
///
/// `previous` must be the latest reference sharing this stem; if it is missing
/// or cannot be parsed the sequence restarts at 1.
pub fn generate_reference(movement_type: MovementType, date: NaiveDate, previous: Option<&str>) -> String {
    let stem = reference_stem(movement_type, date);
    let next = previous
        .filter(|prev| prev.starts_with(&stem))
        .and_then(parse_sequence)
        .map_or(1, |seq| seq.saturating_add(1));
    format!("{stem}-{next:0width$}", width = SEQUENCE_WIDTH)
}
