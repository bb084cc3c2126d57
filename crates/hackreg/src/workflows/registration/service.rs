use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use super::access::Authorizer;
use super::domain::{
    Application, ApplicationFilter, ApplicationId, ApplicationStatus, ApplicationSubmission,
    CheckIn, Permission, StaffUser,
};
use super::notification::{
    MailComposer, MailingList, MailingListError, NotificationError, Notifier,
};
use super::reimbursement::{ReimbursementLookup, ReimbursementTable};
use super::repository::{
    ApplicationRepository, CalculatedVote, RepositoryError, VoteRepository,
};
use super::votes::{self, Vote, VoteError};
use super::workflow::{require, WorkflowEffect, WorkflowError};
use crate::config::RegistrationConfig;

/// Facade composing storage, the status workflow and the outbound collaborators.
///
/// Each operation loads the record, runs the transition in memory, performs the mail and
/// mailing-list side effects and only then persists. A failed send leaves the stored
/// record untouched.
pub struct RegistrationService<R, N> {
    repository: Arc<R>,
    notifier: Arc<N>,
    mailing_list: Arc<dyn MailingList>,
    authorizer: Arc<dyn Authorizer>,
    reimbursements: Arc<dyn ReimbursementLookup>,
    composer: MailComposer,
}

/// Applicant links carry the id, so it must not be guessable.
fn new_application_id() -> ApplicationId {
    ApplicationId(Uuid::new_v4().to_string())
}

/// Ranking row joined with the applicant it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedApplication {
    pub application_id: ApplicationId,
    pub name: String,
    pub status: ApplicationStatus,
    pub score: f64,
    pub votes: usize,
}

impl<R, N> RegistrationService<R, N>
where
    R: ApplicationRepository + VoteRepository + 'static,
    N: Notifier + 'static,
{
    pub fn new(
        repository: Arc<R>,
        notifier: Arc<N>,
        mailing_list: Arc<dyn MailingList>,
        authorizer: Arc<dyn Authorizer>,
        config: RegistrationConfig,
    ) -> Self {
        Self {
            repository,
            notifier,
            mailing_list,
            authorizer,
            reimbursements: Arc::new(ReimbursementTable::empty()),
            composer: MailComposer::new(config),
        }
    }

    pub fn with_reimbursements(mut self, reimbursements: Arc<dyn ReimbursementLookup>) -> Self {
        self.reimbursements = reimbursements;
        self
    }

    /// Store a new application in the `Started` state.
    pub fn submit(
        &self,
        submission: ApplicationSubmission,
    ) -> Result<Application, RegistrationError> {
        let application =
            Application::from_submission(new_application_id(), submission, Utc::now());
        let stored = self.repository.insert(application)?;
        info!(application = %stored.id, "application submitted");
        Ok(stored)
    }

    pub fn get(&self, id: &ApplicationId) -> Result<Application, RegistrationError> {
        self.repository
            .fetch(id)?
            .ok_or_else(|| RegistrationError::NotFound(id.clone()))
    }

    pub fn list(&self, filter: ApplicationFilter) -> Result<Vec<Application>, RegistrationError> {
        Ok(self.repository.list(filter)?)
    }

    /// Confirmed applicants still waiting at the door.
    pub fn pending_check_in(&self) -> Result<Vec<Application>, RegistrationError> {
        self.list(ApplicationFilter::Status(ApplicationStatus::Confirmed))
    }

    /// Everyone who has not been checked in, whatever their status.
    pub fn not_checked_in(&self) -> Result<Vec<Application>, RegistrationError> {
        self.list(ApplicationFilter::ExcludingStatus(
            ApplicationStatus::Attended,
        ))
    }

    pub fn complete(
        &self,
        id: &ApplicationId,
        actor: &StaffUser,
    ) -> Result<Application, RegistrationError> {
        require(self.authorizer.as_ref(), actor, Permission::Invite)?;
        self.transition(id, "complete", |application, now| application.complete(now))
    }

    pub fn invite(
        &self,
        id: &ApplicationId,
        actor: &StaffUser,
    ) -> Result<Application, RegistrationError> {
        let authorizer = self.authorizer.as_ref();
        self.transition(id, "invite", |application, now| {
            application.invite(actor, authorizer, now)
        })
    }

    pub fn send_last_reminder(
        &self,
        id: &ApplicationId,
        actor: &StaffUser,
    ) -> Result<Application, RegistrationError> {
        require(self.authorizer.as_ref(), actor, Permission::Invite)?;
        self.transition(id, "last_reminder", |application, now| {
            application.send_last_reminder(now)
        })
    }

    pub fn expire(
        &self,
        id: &ApplicationId,
        actor: &StaffUser,
    ) -> Result<Application, RegistrationError> {
        require(self.authorizer.as_ref(), actor, Permission::Invite)?;
        self.transition(id, "expire", |application, now| Ok(application.expire(now)))
    }

    pub fn reject(
        &self,
        id: &ApplicationId,
        actor: &StaffUser,
    ) -> Result<Application, RegistrationError> {
        let authorizer = self.authorizer.as_ref();
        self.transition(id, "reject", |application, now| {
            application.reject(actor, authorizer, now)
        })
    }

    pub fn send_reimbursement(
        &self,
        id: &ApplicationId,
        actor: &StaffUser,
    ) -> Result<Application, RegistrationError> {
        let lookup = self.reimbursements.as_ref();
        let application = self.transition(id, "reimbursement", |application, _| {
            application.send_reimbursement(lookup)
        })?;
        info!(
            application = %application.id,
            staff = %actor.id,
            money = application.reimbursement_money,
            "reimbursement sent"
        );
        Ok(application)
    }

    pub fn confirm(&self, id: &ApplicationId) -> Result<Application, RegistrationError> {
        self.transition(id, "confirm", |application, _| application.confirm())
    }

    pub fn cancel(&self, id: &ApplicationId) -> Result<Application, RegistrationError> {
        self.transition(id, "cancel", |application, _| application.cancel())
    }

    pub fn check_in(
        &self,
        id: &ApplicationId,
        actor: &StaffUser,
    ) -> Result<Application, RegistrationError> {
        let authorizer = self.authorizer.as_ref();
        self.transition(id, "check_in", |application, now| {
            application.check_in(actor, authorizer, now)
        })
    }

    pub fn check_ins(&self, id: &ApplicationId) -> Result<Vec<CheckIn>, RegistrationError> {
        Ok(self.repository.check_ins(id)?)
    }

    /// Record (or replace) a reviewer's vote and restandardize all of their votes.
    pub fn record_vote(
        &self,
        id: &ApplicationId,
        reviewer: &StaffUser,
        tech: Option<u8>,
        personal: Option<u8>,
    ) -> Result<Vote, RegistrationError> {
        require(self.authorizer.as_ref(), reviewer, Permission::Vote)?;
        let vote = Vote::new(id.clone(), reviewer.id.clone(), tech, personal)?;
        self.get(id)?;

        let stored = self.repository.upsert_vote(vote)?;
        if !stored.is_scored() {
            return Ok(stored);
        }

        let mut reviewer_votes = self.repository.votes_by_reviewer(&reviewer.id)?;
        if votes::standardize(&mut reviewer_votes).is_none() {
            return Ok(stored);
        }

        let calculated: Vec<CalculatedVote> = reviewer_votes
            .iter()
            .map(|vote| CalculatedVote {
                application_id: vote.application_id.clone(),
                reviewer: vote.reviewer.clone(),
                calculated_vote: vote.calculated_vote,
            })
            .collect();
        let updated = calculated
            .iter()
            .find(|entry| &entry.application_id == id)
            .map(|entry| Vote {
                calculated_vote: entry.calculated_vote,
                ..stored.clone()
            })
            .unwrap_or(stored);
        info!(
            application = %id,
            reviewer = %reviewer.id,
            recalculated = calculated.len(),
            "vote recorded"
        );
        self.repository.update_calculated_votes(calculated)?;
        Ok(updated)
    }

    pub fn ranking(&self, actor: &StaffUser) -> Result<Vec<RankedApplication>, RegistrationError> {
        require(self.authorizer.as_ref(), actor, Permission::Ranking)?;
        let all_votes = self.repository.all_votes()?;

        let mut ranked = Vec::new();
        for entry in votes::rank(&all_votes) {
            match self.repository.fetch(&entry.application_id)? {
                Some(application) => ranked.push(RankedApplication {
                    name: application.hacker.full_name(),
                    status: application.status,
                    application_id: entry.application_id,
                    score: entry.score,
                    votes: entry.votes,
                }),
                None => warn!(application = %entry.application_id, "vote references missing application"),
            }
        }
        Ok(ranked)
    }

    fn transition<F>(
        &self,
        id: &ApplicationId,
        operation: &'static str,
        apply: F,
    ) -> Result<Application, RegistrationError>
    where
        F: FnOnce(&mut Application, DateTime<Utc>) -> Result<Vec<WorkflowEffect>, WorkflowError>,
    {
        let mut application = self.get(id)?;
        let previous = application.status;
        let now = Utc::now();

        let effects = apply(&mut application, now).inspect_err(|err| {
            info!(application = %id, operation, error = %err, "transition refused");
        })?;

        for effect in &effects {
            self.run_external(effect, &application)?;
        }

        let check_in = effects.iter().find_map(|effect| match effect {
            WorkflowEffect::RecordCheckIn(staff) => Some(CheckIn {
                application_id: application.id.clone(),
                staff: staff.clone(),
                checked_in_at: now,
            }),
            _ => None,
        });
        match check_in {
            Some(check_in) => self
                .repository
                .update_with_check_in(application.clone(), check_in)?,
            None => self.repository.update(application.clone())?,
        }

        info!(
            application = %id,
            operation,
            from = previous.code(),
            to = application.status.code(),
            "application transitioned"
        );
        Ok(application)
    }

    fn run_external(
        &self,
        effect: &WorkflowEffect,
        application: &Application,
    ) -> Result<(), RegistrationError> {
        let list_id = &self.composer.config().mailing_list_id;
        match effect {
            WorkflowEffect::SendInvite(variant) => {
                self.notifier
                    .send(self.composer.invite(application, *variant))?;
            }
            WorkflowEffect::SendLastReminder => {
                self.notifier.send(self.composer.last_reminder(application))?;
            }
            WorkflowEffect::SendReimbursement => {
                self.notifier.send(self.composer.reimbursement(application))?;
            }
            WorkflowEffect::SendConfirmation => {
                self.notifier.send(self.composer.confirmation(application))?;
            }
            WorkflowEffect::SubscribeToMailingList => {
                self.mailing_list.add(application, list_id)?;
            }
            WorkflowEffect::UnsubscribeFromMailingList => {
                self.mailing_list.remove(application, list_id)?;
            }
            WorkflowEffect::RecordCheckIn(_) => {}
        }
        Ok(())
    }
}

/// Error raised by the registration service.
#[derive(Debug, thiserror::Error)]
pub enum RegistrationError {
    #[error(transparent)]
    Workflow(#[from] WorkflowError),
    #[error("application {0} not found")]
    NotFound(ApplicationId),
    #[error(transparent)]
    InvalidVote(#[from] VoteError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Notification(#[from] NotificationError),
    #[error(transparent)]
    MailingList(#[from] MailingListError),
}
