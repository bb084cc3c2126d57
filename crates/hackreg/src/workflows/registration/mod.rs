//! Hackathon registration: application lifecycle, reviewer votes and door check-in.

pub mod access;
pub mod domain;
pub mod notification;
pub mod reimbursement;
pub mod repository;
pub mod router;
pub mod service;
pub mod votes;
pub mod workflow;

#[cfg(test)]
mod tests;

pub use access::{Authorizer, PermissionTable, StaffDirectory};
pub use domain::{
    Application, ApplicationFilter, ApplicationId, ApplicationStatus, ApplicationSubmission,
    ApplicationSummary, CheckIn, Diet, Edition, Gender, Hacker, Permission, StaffId, StaffUser,
    TshirtSize,
};
pub use notification::{
    MailComposer, MailingList, MailingListError, Notification, NotificationError, Notifier,
};
pub use reimbursement::{ReimbursementLookup, ReimbursementTable, ReimbursementTableError};
pub use repository::{
    ApplicationRepository, CalculatedVote, InMemoryStore, RepositoryError, VoteRepository,
};
pub use router::{registration_router, RegistrationState, VoteRequest, STAFF_HEADER};
pub use service::{RankedApplication, RegistrationError, RegistrationService};
pub use votes::{RankingEntry, ReviewerScale, ScoreStats, Vote, VoteError};
pub use workflow::{InviteVariant, WorkflowEffect, WorkflowError};
