//! Read-only reference records supplied by the wider application
//!
//! The engine treats these as lookups keyed by id and tolerates missing
//! records: an entry referencing a deleted project still participates in
//! gap and overlap detection, and project-dependent rules degrade rather
//! than error.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

use crate::impl_status_conversions;
use crate::TimeEntry;

/// Employee master record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Employee {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_id: Option<String>,
    /// Contracted weekly hours, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weekly_hours: Option<f64>,
}

/// Project master record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub active: bool,
    /// Entries on this project must name a task
    #[serde(default)]
    pub requires_task: bool,
    /// Entries on this project must carry notes even when non-billable
    #[serde(default)]
    pub requires_notes: bool,
}

/// Task master record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub project_id: String,
    pub name: String,
    pub active: bool,
}

/// Project phase record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Phase {
    pub id: String,
    pub project_id: String,
    pub name: String,
}

/// Kind of a recorded absence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbsenceKind {
    Vacation,
    Sick,
    Training,
    Other,
}

impl_status_conversions!(AbsenceKind {
    Vacation => "vacation",
    Sick => "sick",
    Training => "training",
    Other => "other",
});

/// An approved absence spanning one or more calendar days
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Absence {
    pub id: String,
    pub employee_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub kind: AbsenceKind,
}

impl Absence {
    /// Whether the absence covers `date` (both bounds inclusive).
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }
}

/// Set of public holidays
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HolidayCalendar {
    dates: BTreeSet<NaiveDate>,
}

impl HolidayCalendar {
    pub fn from_dates(dates: impl IntoIterator<Item = NaiveDate>) -> Self {
        Self { dates: dates.into_iter().collect() }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.dates.contains(&date)
    }
}

/// All reference data a detection run needs, with lookup helpers
///
/// Every lookup returns an `Option`; callers degrade on `None` instead of
/// failing the run.
#[derive(Debug, Clone, Default)]
pub struct ReferenceData {
    employees: HashMap<String, Employee>,
    projects: HashMap<String, Project>,
    tasks: HashMap<String, Task>,
    phases: HashMap<String, Phase>,
    absences: Vec<Absence>,
    holidays: HolidayCalendar,
}

impl ReferenceData {
    pub fn new(
        employees: Vec<Employee>,
        projects: Vec<Project>,
        tasks: Vec<Task>,
        phases: Vec<Phase>,
        absences: Vec<Absence>,
        holidays: HolidayCalendar,
    ) -> Self {
        Self {
            employees: employees.into_iter().map(|e| (e.id.clone(), e)).collect(),
            projects: projects.into_iter().map(|p| (p.id.clone(), p)).collect(),
            tasks: tasks.into_iter().map(|t| (t.id.clone(), t)).collect(),
            phases: phases.into_iter().map(|p| (p.id.clone(), p)).collect(),
            absences,
            holidays,
        }
    }

    pub fn employee(&self, id: &str) -> Option<&Employee> {
        self.employees.get(id)
    }

    pub fn project(&self, id: &str) -> Option<&Project> {
        self.projects.get(id)
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.get(id)
    }

    pub fn phase(&self, id: &str) -> Option<&Phase> {
        self.phases.get(id)
    }

    pub fn holidays(&self) -> &HolidayCalendar {
        &self.holidays
    }

    /// Absences of one employee covering `date`.
    pub fn absences_for(&self, employee_id: &str, date: NaiveDate) -> Vec<&Absence> {
        self.absences
            .iter()
            .filter(|a| a.employee_id == employee_id && a.covers(date))
            .collect()
    }

    /// Team id of the entry's employee, when known.
    pub fn team_of(&self, entry: &TimeEntry) -> Option<&str> {
        self.employee(&entry.employee_id).and_then(|e| e.team_id.as_deref())
    }
}
