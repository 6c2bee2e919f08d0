//! Deterministic issue identities
//!
//! An issue id is a BLAKE3 hash of (employee, date, kind, discriminator).
//! Re-detecting the same defect always yields the same id, which is what
//! makes reconciliation by id possible. The discriminator distinguishes
//! defects of the same kind on the same day, e.g. the unordered pair of
//! overlapping entry ids.

use chrono::NaiveDate;
use timeguard_domain::IssueKind;
use uuid::Uuid;

/// Compute the stable id for a defect signature.
pub fn issue_id(employee_id: &str, date: NaiveDate, kind: IssueKind, discriminator: &str) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(employee_id.as_bytes());
    hasher.update(b"|");
    hasher.update(date.to_string().as_bytes());
    hasher.update(b"|");
    hasher.update(kind.to_string().as_bytes());
    hasher.update(b"|");
    hasher.update(discriminator.as_bytes());
    hex::encode(&hasher.finalize().as_bytes()[..16])
}

/// Order-independent discriminator for a pair of entries, so an overlap gets
/// the same id no matter which entry is visited first.
pub fn pair_key(a: Uuid, b: Uuid) -> String {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    format!("{lo}|{hi}")
}
