use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::domain::{Application, ApplicationId};
use super::workflow::InviteVariant;
use crate::config::{templates, RegistrationConfig};

/// Transactional mail handed to the mail provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub recipients: Vec<String>,
    pub subject: String,
    pub substitutions: BTreeMap<String, String>,
    pub template_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_email: Option<String>,
}

/// Outbound mail hook (e.g. a SendGrid adapter).
pub trait Notifier: Send + Sync {
    fn send(&self, notification: Notification) -> Result<(), NotificationError>;
}

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("mail transport unavailable: {0}")]
    Transport(String),
    #[error("mail rejected by provider: {0}")]
    Rejected(String),
}

/// Marketing list membership for confirmed attendees.
pub trait MailingList: Send + Sync {
    fn add(&self, application: &Application, list_id: &str) -> Result<(), MailingListError>;
    fn remove(&self, application: &Application, list_id: &str) -> Result<(), MailingListError>;
}

#[derive(Debug, thiserror::Error)]
pub enum MailingListError {
    #[error("mailing list provider unavailable: {0}")]
    Unavailable(String),
    #[error("unknown mailing list '{0}'")]
    UnknownList(String),
}

/// Builds applicant-facing links and the mails that carry them.
#[derive(Debug, Clone)]
pub struct MailComposer {
    config: RegistrationConfig,
}

impl MailComposer {
    pub fn new(config: RegistrationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RegistrationConfig {
        &self.config
    }

    pub fn confirmation_url(&self, id: &ApplicationId) -> String {
        format!("{}/applications/{}/confirm", self.config.base_url, id)
    }

    pub fn cancellation_url(&self, id: &ApplicationId) -> String {
        format!("{}/applications/{}/cancel", self.config.base_url, id)
    }

    fn subject(&self, title: &str) -> String {
        format!("[{}] {}", self.config.hackathon_name, title)
    }

    fn base(&self, application: &Application, title: &str, template_id: &str) -> Notification {
        let mut substitutions = BTreeMap::new();
        substitutions.insert("%name%".to_string(), application.hacker.name.clone());
        Notification {
            recipients: vec![application.hacker.email.clone()],
            subject: self.subject(title),
            substitutions,
            template_id: template_id.to_string(),
            from_email: None,
        }
    }

    fn with_links(&self, mut notification: Notification, id: &ApplicationId) -> Notification {
        notification
            .substitutions
            .insert("%confirmation_url%".to_string(), self.confirmation_url(id));
        notification
            .substitutions
            .insert("%cancellation_url%".to_string(), self.cancellation_url(id));
        notification
    }

    fn with_token(mut notification: Notification, id: &ApplicationId) -> Notification {
        notification
            .substitutions
            .insert("%token%".to_string(), id.0.clone());
        notification
    }

    pub fn invite(&self, application: &Application, variant: InviteVariant) -> Notification {
        let title = match variant {
            InviteVariant::Standard => "You are invited!",
            InviteVariant::MissingAnswer => "Missing answer",
        };
        let notification = self.base(application, title, templates::INVITE);
        self.with_links(notification, &application.id)
    }

    pub fn last_reminder(&self, application: &Application) -> Notification {
        let notification = self.base(
            application,
            "Invite expires in 24h",
            templates::LAST_REMINDER,
        );
        Self::with_token(notification, &application.id)
    }

    pub fn confirmation(&self, application: &Application) -> Notification {
        let mut notification = Self::with_token(
            self.base(
                application,
                "You confirmed your attendance!",
                templates::CONFIRMATION,
            ),
            &application.id,
        );
        notification.substitutions.insert(
            "%cancellation_url%".to_string(),
            self.cancellation_url(&application.id),
        );
        notification
    }

    pub fn reimbursement(&self, application: &Application) -> Notification {
        let notification = self.base(
            application,
            "Reimbursement granted",
            templates::REIMBURSEMENT,
        );
        let mut notification =
            self.with_links(Self::with_token(notification, &application.id), &application.id);
        notification.substitutions.insert(
            "%money%".to_string(),
            application
                .reimbursement_money
                .map(|money| money.to_string())
                .unwrap_or_default(),
        );
        notification
            .substitutions
            .insert("%country%".to_string(), application.travel_origin.clone());
        notification.from_email = Some(self.config.reimbursement_sender.clone());
        notification
    }
}
