//! Status transitions for registration applications.
//!
//! Every operation validates the current status (and the actor's permission where staff
//! drive the transition), mutates the in-memory record and returns the side effects the
//! caller must run before the record is persisted.

use chrono::{DateTime, Utc};

use super::access::Authorizer;
use super::domain::{Application, ApplicationStatus, Permission, StaffId, StaffUser};
use super::reimbursement::ReimbursementLookup;

/// Guard failure raised by a transition.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorkflowError {
    #[error("{actor} doesn't have permission to {permission} applications")]
    PermissionDenied {
        actor: StaffId,
        permission: Permission,
    },
    #[error("{reason}. Current status: {status}")]
    IllegalStateTransition {
        status: ApplicationStatus,
        reason: &'static str,
    },
    #[error("{0}")]
    PreconditionFailed(&'static str),
}

/// Which invite mail goes out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InviteVariant {
    Standard,
    /// The applicant was already invited and has not answered.
    MissingAnswer,
}

/// Side effect requested by a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowEffect {
    SendInvite(InviteVariant),
    SendLastReminder,
    SendReimbursement,
    SendConfirmation,
    SubscribeToMailingList,
    UnsubscribeFromMailingList,
    RecordCheckIn(StaffId),
}

pub(crate) fn require(
    authorizer: &dyn Authorizer,
    actor: &StaffUser,
    permission: Permission,
) -> Result<(), WorkflowError> {
    if authorizer.has_permission(actor, permission) {
        Ok(())
    } else {
        Err(WorkflowError::PermissionDenied {
            actor: actor.id.clone(),
            permission,
        })
    }
}

fn illegal(status: ApplicationStatus, reason: &'static str) -> WorkflowError {
    WorkflowError::IllegalStateTransition { status, reason }
}

impl Application {
    /// Mark a started application as fully submitted.
    pub fn complete(&mut self, now: DateTime<Utc>) -> Result<Vec<WorkflowEffect>, WorkflowError> {
        if self.status != ApplicationStatus::Started {
            return Err(illegal(
                self.status,
                "Only started applications can be completed",
            ));
        }
        self.status = ApplicationStatus::Completed;
        self.submission_date = now;
        self.status_update_date = Some(now);
        Ok(Vec::new())
    }

    pub fn invite(
        &mut self,
        actor: &StaffUser,
        authorizer: &dyn Authorizer,
        now: DateTime<Utc>,
    ) -> Result<Vec<WorkflowEffect>, WorkflowError> {
        require(authorizer, actor, Permission::Invite)?;
        if !self.status.is_reviewable() {
            return Err(illegal(
                self.status,
                "Application needs to be completed to invite",
            ));
        }

        let variant = if self.status == ApplicationStatus::Invited {
            InviteVariant::MissingAnswer
        } else {
            InviteVariant::Standard
        };

        self.status = ApplicationStatus::Invited;
        self.last_invite = Some(now);
        self.last_reminder = None;
        self.invited_by = Some(actor.id.clone());
        Ok(vec![WorkflowEffect::SendInvite(variant)])
    }

    pub fn send_last_reminder(
        &mut self,
        now: DateTime<Utc>,
    ) -> Result<Vec<WorkflowEffect>, WorkflowError> {
        if self.status != ApplicationStatus::Invited {
            return Err(illegal(
                self.status,
                "Reminder can't be sent to non-pending applications",
            ));
        }
        self.status_update_date = Some(now);
        self.last_reminder = Some(now);
        Ok(vec![WorkflowEffect::SendLastReminder])
    }

    pub fn expire(&mut self, now: DateTime<Utc>) -> Vec<WorkflowEffect> {
        self.status = ApplicationStatus::Expired;
        self.status_update_date = Some(now);
        Vec::new()
    }

    /// Rejecting is gated on the invite capability, like inviting.
    pub fn reject(
        &mut self,
        actor: &StaffUser,
        authorizer: &dyn Authorizer,
        now: DateTime<Utc>,
    ) -> Result<Vec<WorkflowEffect>, WorkflowError> {
        require(authorizer, actor, Permission::Invite)?;
        if !self.status.is_reviewable() {
            return Err(illegal(
                self.status,
                "Application needs to be completed to reject",
            ));
        }
        self.status = ApplicationStatus::Rejected;
        self.status_update_date = Some(now);
        Ok(Vec::new())
    }

    pub fn send_reimbursement(
        &mut self,
        lookup: &dyn ReimbursementLookup,
    ) -> Result<Vec<WorkflowEffect>, WorkflowError> {
        if !self.status.can_be_reimbursed() {
            return Err(illegal(
                self.status,
                "Application can't be reimbursed as it hasn't been invited yet",
            ));
        }
        if !self.scholarship {
            return Err(WorkflowError::PreconditionFailed(
                "Application didn't ask for reimbursement",
            ));
        }
        // a zero grant counts as unset
        if matches!(self.reimbursement_money, None | Some(0)) {
            self.reimbursement_money = Some(lookup.lookup(&self.hacker.country));
        }
        Ok(vec![WorkflowEffect::SendReimbursement])
    }

    pub fn confirm(&mut self) -> Result<Vec<WorkflowEffect>, WorkflowError> {
        match self.status {
            ApplicationStatus::Cancelled => {
                Err(illegal(self.status, "This invite has been cancelled"))
            }
            ApplicationStatus::Expired => {
                Err(illegal(self.status, "Unfortunately your invite has expired"))
            }
            ApplicationStatus::Invited => {
                self.status = ApplicationStatus::Confirmed;
                Ok(vec![
                    WorkflowEffect::SubscribeToMailingList,
                    WorkflowEffect::SendConfirmation,
                ])
            }
            _ => Err(illegal(
                self.status,
                "Unfortunately this application is not invited yet",
            )),
        }
    }

    /// Cancelling an already cancelled application is a no-op.
    pub fn cancel(&mut self) -> Result<Vec<WorkflowEffect>, WorkflowError> {
        if self.status == ApplicationStatus::Cancelled {
            return Ok(Vec::new());
        }
        if !self.status.can_be_cancelled() {
            return Err(illegal(self.status, "Application can't be cancelled"));
        }
        self.status = ApplicationStatus::Cancelled;
        Ok(vec![WorkflowEffect::UnsubscribeFromMailingList])
    }

    pub fn check_in(
        &mut self,
        actor: &StaffUser,
        authorizer: &dyn Authorizer,
        now: DateTime<Utc>,
    ) -> Result<Vec<WorkflowEffect>, WorkflowError> {
        require(authorizer, actor, Permission::CheckIn)?;
        self.status = ApplicationStatus::Attended;
        self.status_update_date = Some(now);
        Ok(vec![WorkflowEffect::RecordCheckIn(actor.id.clone())])
    }
}
