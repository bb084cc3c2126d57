use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque token identifying an application; doubles as the applicant's link token.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ApplicationId(pub String);

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a staff member (reviewer, organizer, volunteer at the door).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StaffId(pub String);

impl fmt::Display for StaffId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Staff member acting on an application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffUser {
    pub id: StaffId,
    pub email: String,
}

/// Capabilities granted to staff members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    Invite,
    Vote,
    CheckIn,
    Reject,
    Ranking,
}

impl Permission {
    pub const fn label(self) -> &'static str {
        match self {
            Permission::Invite => "invite",
            Permission::Vote => "vote",
            Permission::CheckIn => "checkin",
            Permission::Reject => "reject",
            Permission::Ranking => "ranking",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Lifecycle of an application.
///
/// Serialized with the short codes stored alongside each record (`S`, `CX`, `I`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ApplicationStatus {
    #[serde(rename = "S")]
    Started,
    #[serde(rename = "CX")]
    Completed,
    #[serde(rename = "R")]
    Rejected,
    #[serde(rename = "I")]
    Invited,
    #[serde(rename = "LR")]
    LastReminder,
    #[serde(rename = "C")]
    Confirmed,
    #[serde(rename = "X")]
    Cancelled,
    #[serde(rename = "A")]
    Attended,
    #[serde(rename = "E")]
    Expired,
}

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 9] = [
        ApplicationStatus::Started,
        ApplicationStatus::Completed,
        ApplicationStatus::Rejected,
        ApplicationStatus::Invited,
        ApplicationStatus::LastReminder,
        ApplicationStatus::Confirmed,
        ApplicationStatus::Cancelled,
        ApplicationStatus::Attended,
        ApplicationStatus::Expired,
    ];

    pub const fn code(self) -> &'static str {
        match self {
            ApplicationStatus::Started => "S",
            ApplicationStatus::Completed => "CX",
            ApplicationStatus::Rejected => "R",
            ApplicationStatus::Invited => "I",
            ApplicationStatus::LastReminder => "LR",
            ApplicationStatus::Confirmed => "C",
            ApplicationStatus::Cancelled => "X",
            ApplicationStatus::Attended => "A",
            ApplicationStatus::Expired => "E",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Started => "Started",
            ApplicationStatus::Completed => "Completed",
            ApplicationStatus::Rejected => "Rejected",
            ApplicationStatus::Invited => "Invited",
            ApplicationStatus::LastReminder => "Last reminder",
            ApplicationStatus::Confirmed => "Confirmed",
            ApplicationStatus::Cancelled => "Cancelled",
            ApplicationStatus::Attended => "Attended",
            ApplicationStatus::Expired => "Expired",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        let code = code.trim();
        Self::ALL
            .into_iter()
            .find(|status| status.code().eq_ignore_ascii_case(code))
    }

    /// Statuses from which staff may invite or reject an applicant.
    pub const fn is_reviewable(self) -> bool {
        matches!(
            self,
            ApplicationStatus::Completed
                | ApplicationStatus::Expired
                | ApplicationStatus::Invited
                | ApplicationStatus::Rejected
        )
    }

    pub const fn can_be_cancelled(self) -> bool {
        matches!(
            self,
            ApplicationStatus::Confirmed | ApplicationStatus::Invited
        )
    }

    pub const fn can_be_reimbursed(self) -> bool {
        matches!(
            self,
            ApplicationStatus::Invited | ApplicationStatus::Confirmed
        )
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
    #[serde(rename = "NB")]
    NonBinary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Diet {
    #[default]
    None,
    Vegetarian,
    #[serde(rename = "Gluten-free")]
    GlutenFree,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TshirtSize {
    XS,
    S,
    #[default]
    M,
    L,
    XL,
}

/// Hackathon edition an application was submitted for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Edition {
    #[default]
    #[serde(rename = "F17")]
    Fall2017,
}

impl Edition {
    pub const fn label(self) -> &'static str {
        match self {
            Edition::Fall2017 => "Fall 2017",
        }
    }
}

/// Year-agnostic profile of the person behind an application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hacker {
    pub name: String,
    pub lastname: String,
    pub email: String,
    pub country: String,
    #[serde(default)]
    pub gender: Option<Gender>,
    pub graduation_year: u16,
    pub university: String,
    pub degree: String,
    #[serde(default)]
    pub github: Option<String>,
    #[serde(default)]
    pub devpost: Option<String>,
    #[serde(default)]
    pub linkedin: Option<String>,
    #[serde(default)]
    pub site: Option<String>,
    #[serde(default)]
    pub diet: Diet,
    #[serde(default)]
    pub tshirt_size: TshirtSize,
}

impl Hacker {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.name, self.lastname)
    }
}

/// Payload accepted when a candidate submits the registration form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationSubmission {
    pub hacker: Hacker,
    #[serde(default)]
    pub edition: Edition,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub projects: String,
    #[serde(default)]
    pub scholarship: bool,
    #[serde(default)]
    pub travel_origin: String,
    #[serde(default)]
    pub under_age: Option<bool>,
    #[serde(default)]
    pub first_timer: Option<bool>,
    #[serde(default)]
    pub team: Option<bool>,
    #[serde(default)]
    pub teammates: Option<String>,
    #[serde(default)]
    pub authorized_mlh: Option<bool>,
}

/// Persisted registration record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub id: ApplicationId,
    pub hacker: Hacker,
    pub edition: Edition,
    pub status: ApplicationStatus,
    pub submission_date: DateTime<Utc>,
    pub status_update_date: Option<DateTime<Utc>>,
    pub last_invite: Option<DateTime<Utc>>,
    pub last_reminder: Option<DateTime<Utc>>,
    pub invited_by: Option<StaffId>,
    pub description: String,
    pub projects: String,
    pub scholarship: bool,
    pub reimbursement_money: Option<u32>,
    pub travel_origin: String,
    pub under_age: Option<bool>,
    pub first_timer: Option<bool>,
    pub team: Option<bool>,
    pub teammates: Option<String>,
    pub authorized_mlh: Option<bool>,
}

impl Application {
    /// Build a freshly submitted record in the `Started` state.
    pub fn from_submission(
        id: ApplicationId,
        submission: ApplicationSubmission,
        now: DateTime<Utc>,
    ) -> Self {
        let ApplicationSubmission {
            hacker,
            edition,
            description,
            projects,
            scholarship,
            travel_origin,
            under_age,
            first_timer,
            team,
            teammates,
            authorized_mlh,
        } = submission;

        Self {
            id,
            hacker,
            edition,
            status: ApplicationStatus::Started,
            submission_date: now,
            status_update_date: None,
            last_invite: None,
            last_reminder: None,
            invited_by: None,
            description,
            projects,
            scholarship,
            reimbursement_money: None,
            travel_origin,
            under_age,
            first_timer,
            team,
            teammates,
            authorized_mlh,
        }
    }

    pub fn summary(&self) -> ApplicationSummary {
        ApplicationSummary {
            id: self.id.clone(),
            name: self.hacker.full_name(),
            email: self.hacker.email.clone(),
            status: self.status,
            status_label: self.status.label(),
            scholarship: self.scholarship,
            reimbursement_money: self.reimbursement_money,
            status_update_date: self.status_update_date,
        }
    }
}

/// Compact listing row for staff dashboards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApplicationSummary {
    pub id: ApplicationId,
    pub name: String,
    pub email: String,
    pub status: ApplicationStatus,
    pub status_label: &'static str,
    pub scholarship: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reimbursement_money: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_update_date: Option<DateTime<Utc>>,
}

/// Audit entry written when a staff member marks an applicant as attended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckIn {
    pub application_id: ApplicationId,
    pub staff: StaffId,
    pub checked_in_at: DateTime<Utc>,
}

/// Listing filter over application status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplicationFilter {
    All,
    Status(ApplicationStatus),
    ExcludingStatus(ApplicationStatus),
}

impl ApplicationFilter {
    pub fn matches(self, status: ApplicationStatus) -> bool {
        match self {
            ApplicationFilter::All => true,
            ApplicationFilter::Status(expected) => status == expected,
            ApplicationFilter::ExcludingStatus(excluded) => status != excluded,
        }
    }
}
