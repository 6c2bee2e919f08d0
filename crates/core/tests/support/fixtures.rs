//! Entry and reference-data builders for deterministic tests

use chrono::{NaiveDate, NaiveTime, Utc};
use timeguard_domain::{
    ApprovalStatus, AuditTrail, Employee, HolidayCalendar, Project, ReferenceData, TimeEntry,
};
use uuid::Uuid;

/// A Thursday, clear of weekends and holidays.
pub fn test_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 10, 24).unwrap()
}

pub fn at(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

/// Non-billable weekday entry with notes; passes every rule on its own.
pub fn create_test_entry(
    employee: &str,
    date: NaiveDate,
    start: (u32, u32),
    end: (u32, u32),
    project: &str,
) -> TimeEntry {
    TimeEntry {
        id: Uuid::new_v4(),
        employee_id: employee.into(),
        project_id: project.into(),
        task_id: None,
        date,
        start_time: at(start.0, start.1),
        end_time: at(end.0, end.1),
        overnight: false,
        billable: false,
        notes: "regular work".into(),
        locked: false,
        approval: ApprovalStatus::Draft,
        audit: AuditTrail::new(employee, Utc::now()),
        change_log: Vec::new(),
    }
}

/// Reference data with two active projects and one employee, no absences or
/// holidays.
pub fn create_test_reference() -> ReferenceData {
    ReferenceData::new(
        vec![Employee {
            id: "emp-1".into(),
            name: "Dana Example".into(),
            team_id: Some("team-1".into()),
            weekly_hours: Some(40.0),
        }],
        vec![
            Project {
                id: "proj-a".into(),
                name: "Apollo".into(),
                active: true,
                requires_task: false,
                requires_notes: false,
            },
            Project {
                id: "proj-b".into(),
                name: "Borealis".into(),
                active: true,
                requires_task: false,
                requires_notes: false,
            },
        ],
        vec![],
        vec![],
        vec![],
        HolidayCalendar::default(),
    )
}
