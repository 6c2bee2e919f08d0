//! Application of repair actions

use std::collections::BTreeSet;

use chrono::{Timelike, Utc};
use timeguard_domain::{
    ApprovalStatus, AuditTrail, EntryPatch, EntrySnapshot, RepairAction, RepairError,
    RepairPayload, TimeEntry,
};
use tracing::info;
use uuid::Uuid;

use crate::detection::geometry::entry_range_minutes;

/// Apply one repair action to the collection and return the transformed
/// copy.
///
/// Authority over locked/approved entries is an input, decided by the
/// caller, never computed here. Every failure is returned before any
/// transformation, so the caller's collection is always intact on error.
pub fn apply_repair_action(
    action: &RepairAction,
    entries: &[TimeEntry],
    acting_user: &str,
    override_authority: bool,
) -> Result<Vec<TimeEntry>, RepairError> {
    let result = match &action.payload {
        RepairPayload::FillGap {
            employee_id,
            date,
            start_time,
            end_time,
            project_id,
            task_id,
            billable,
            ..
        } => fill_gap(
            entries,
            employee_id,
            *date,
            *start_time,
            *end_time,
            project_id,
            task_id.clone(),
            *billable,
            acting_user,
        ),
        RepairPayload::UpdateField { entry_id, changes } => {
            update_field(entries, *entry_id, changes, action, acting_user, override_authority)
        }
        RepairPayload::SplitEntry { entry_id, split_at, split_end } => {
            split_entry(entries, *entry_id, *split_at, *split_end, action, acting_user, override_authority)
        }
        RepairPayload::DeleteEntry { entry_id } => {
            delete_entry(entries, *entry_id, override_authority)
        }
    };

    if result.is_ok() {
        info!(
            kind = ?action.kind(),
            acting_user,
            "repair action applied"
        );
    }
    result
}

fn find_entry(entries: &[TimeEntry], entry_id: Uuid) -> Result<usize, RepairError> {
    entries
        .iter()
        .position(|e| e.id == entry_id)
        .ok_or(RepairError::UnknownEntry { entry_id })
}

fn check_authority(
    entry: &TimeEntry,
    override_authority: bool,
) -> Result<(), RepairError> {
    if entry.is_protected() && !override_authority {
        return Err(RepairError::LockedEntry { entry_id: entry.id });
    }
    Ok(())
}

/// All overlapping entry-id pairs per employee/day. Used to reject repairs
/// that would introduce an overlap the input did not already have.
fn overlap_pairs(entries: &[TimeEntry]) -> BTreeSet<(Uuid, Uuid)> {
    let mut pairs = BTreeSet::new();
    for (i, a) in entries.iter().enumerate() {
        for b in &entries[i + 1..] {
            if a.employee_id != b.employee_id || a.date != b.date {
                continue;
            }
            let (s1, e1) = entry_range_minutes(a);
            let (s2, e2) = entry_range_minutes(b);
            if s1 < e2 && s2 < e1 {
                let key = if a.id <= b.id { (a.id, b.id) } else { (b.id, a.id) };
                pairs.insert(key);
            }
        }
    }
    pairs
}

fn reject_new_overlaps(
    before: &BTreeSet<(Uuid, Uuid)>,
    after: &[TimeEntry],
) -> Result<(), RepairError> {
    let after_pairs = overlap_pairs(after);
    if after_pairs.difference(before).next().is_some() {
        return Err(RepairError::InvariantViolation(
            "repair would introduce a new overlap".into(),
        ));
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn fill_gap(
    entries: &[TimeEntry],
    employee_id: &str,
    date: chrono::NaiveDate,
    start_time: chrono::NaiveTime,
    end_time: chrono::NaiveTime,
    project_id: &str,
    task_id: Option<String>,
    billable: bool,
    acting_user: &str,
) -> Result<Vec<TimeEntry>, RepairError> {
    let start = i64::from(start_time.num_seconds_from_midnight()) / 60;
    let end = i64::from(end_time.num_seconds_from_midnight()) / 60;
    if end <= start {
        return Err(RepairError::StaleAction {
            reason: "fill payload has a non-positive span".into(),
        });
    }

    // The gap must still be uncovered; another edit may have filled it since
    // the action was proposed
    let occupied = entries.iter().any(|e| {
        if e.employee_id != employee_id || e.date != date {
            return false;
        }
        let (s, eend) = entry_range_minutes(e);
        s < eend && start < eend && s < end
    });
    if occupied {
        return Err(RepairError::StaleAction {
            reason: "the gap is no longer uncovered".into(),
        });
    }

    let mut updated = entries.to_vec();
    updated.push(TimeEntry {
        id: Uuid::new_v4(),
        employee_id: employee_id.to_string(),
        project_id: project_id.to_string(),
        task_id,
        date,
        start_time,
        end_time,
        overnight: false,
        billable,
        notes: String::new(),
        locked: false,
        approval: ApprovalStatus::Draft,
        audit: AuditTrail::new(acting_user, Utc::now()),
        change_log: Vec::new(),
    });
    Ok(updated)
}

fn update_field(
    entries: &[TimeEntry],
    entry_id: Uuid,
    changes: &[EntryPatch],
    action: &RepairAction,
    acting_user: &str,
    override_authority: bool,
) -> Result<Vec<TimeEntry>, RepairError> {
    let idx = find_entry(entries, entry_id)?;
    check_authority(&entries[idx], override_authority)?;
    if changes.is_empty() {
        return Err(RepairError::StaleAction { reason: "no field changes in payload".into() });
    }

    let before_pairs = overlap_pairs(entries);
    let mut updated = entries.to_vec();
    let entry = &mut updated[idx];
    let before = EntrySnapshot::of(entry);

    for change in changes {
        match change {
            EntryPatch::StartTime(t) => entry.start_time = *t,
            EntryPatch::EndTime(t) => entry.end_time = *t,
            EntryPatch::ProjectId(p) => entry.project_id = p.clone(),
            EntryPatch::TaskId(t) => entry.task_id = t.clone(),
            EntryPatch::Billable(b) => entry.billable = *b,
            EntryPatch::Notes(n) => entry.notes = n.clone(),
        }
    }
    entry.log_change(before, acting_user, Some(action.label.clone()), Utc::now());

    reject_new_overlaps(&before_pairs, &updated)?;
    Ok(updated)
}

fn split_entry(
    entries: &[TimeEntry],
    entry_id: Uuid,
    split_at: chrono::NaiveTime,
    split_end: Option<chrono::NaiveTime>,
    action: &RepairAction,
    acting_user: &str,
    override_authority: bool,
) -> Result<Vec<TimeEntry>, RepairError> {
    let idx = find_entry(entries, entry_id)?;
    let target = &entries[idx];
    check_authority(target, override_authority)?;

    if target.overnight {
        return Err(RepairError::StaleAction {
            reason: "overnight entries cannot be split".into(),
        });
    }
    if split_at <= target.start_time || split_at >= target.end_time {
        return Err(RepairError::StaleAction {
            reason: "split boundary lies outside the entry".into(),
        });
    }
    let second_start = split_end.unwrap_or(split_at);
    if second_start < split_at {
        return Err(RepairError::StaleAction {
            reason: "second segment would start before the split".into(),
        });
    }

    // The second child keeps the remainder duration; shifting its start via
    // split_end shifts its end equally, so the pair's total always equals
    // the original
    let remainder = target.end_time.signed_duration_since(split_at);
    let second_end_secs = i64::from(second_start.num_seconds_from_midnight())
        + remainder.num_seconds();
    if second_end_secs >= 86_400 {
        return Err(RepairError::InvariantViolation(
            "second segment would cross midnight".into(),
        ));
    }
    let second_end = second_start + remainder;

    let now = Utc::now();
    let before_pairs = overlap_pairs(entries);
    let mut updated = entries.to_vec();

    let mut second = updated[idx].clone();
    let first = &mut updated[idx];
    let before = EntrySnapshot::of(first);
    first.end_time = split_at;
    first.log_change(before, acting_user, Some(action.label.clone()), now);

    second.id = Uuid::new_v4();
    second.start_time = second_start;
    second.end_time = second_end;
    second.audit = AuditTrail::new(acting_user, now);
    second.change_log = Vec::new();
    updated.insert(idx + 1, second);

    reject_new_overlaps(&before_pairs, &updated)?;
    Ok(updated)
}

fn delete_entry(
    entries: &[TimeEntry],
    entry_id: Uuid,
    override_authority: bool,
) -> Result<Vec<TimeEntry>, RepairError> {
    let idx = find_entry(entries, entry_id)?;
    check_authority(&entries[idx], override_authority)?;

    let mut updated = entries.to_vec();
    updated.remove(idx);
    Ok(updated)
}
