use super::common::application_in;
use crate::config::{templates, RegistrationConfig};
use crate::workflows::registration::domain::ApplicationStatus;
use crate::workflows::registration::notification::MailComposer;
use crate::workflows::registration::workflow::InviteVariant;

fn composer() -> MailComposer {
    MailComposer::new(RegistrationConfig {
        hackathon_name: "HackUPC".to_string(),
        base_url: "https://my.hackupc.com".to_string(),
        ..RegistrationConfig::default()
    })
}

#[test]
fn invite_mail_carries_confirmation_links() {
    let application = application_in(ApplicationStatus::Invited);
    let mail = composer().invite(&application, InviteVariant::Standard);

    assert_eq!(mail.subject, "[HackUPC] You are invited!");
    assert_eq!(mail.recipients, vec!["ada@example.com".to_string()]);
    assert_eq!(mail.template_id, templates::INVITE);
    assert_eq!(mail.substitutions["%name%"], "Ada");
    assert_eq!(
        mail.substitutions["%confirmation_url%"],
        format!(
            "https://my.hackupc.com/applications/{}/confirm",
            application.id
        )
    );
    assert_eq!(
        mail.substitutions["%cancellation_url%"],
        format!(
            "https://my.hackupc.com/applications/{}/cancel",
            application.id
        )
    );
}

#[test]
fn reinvite_mail_asks_for_a_missing_answer() {
    let application = application_in(ApplicationStatus::Invited);
    let mail = composer().invite(&application, InviteVariant::MissingAnswer);
    assert_eq!(mail.subject, "[HackUPC] Missing answer");
}

#[test]
fn reminder_and_confirmation_carry_the_token() {
    let application = application_in(ApplicationStatus::Invited);
    let composer = composer();

    let reminder = composer.last_reminder(&application);
    assert_eq!(reminder.subject, "[HackUPC] Invite expires in 24h");
    assert_eq!(reminder.substitutions["%token%"], application.id.0);

    let confirmation = composer.confirmation(&application);
    assert_eq!(
        confirmation.subject,
        "[HackUPC] You confirmed your attendance!"
    );
    assert_eq!(confirmation.template_id, templates::CONFIRMATION);
    assert!(confirmation.substitutions.contains_key("%cancellation_url%"));
    assert!(confirmation.from_email.is_none());
}

#[test]
fn reimbursement_mail_uses_dedicated_sender() {
    let mut application = application_in(ApplicationStatus::Invited);
    application.reimbursement_money = Some(50);
    let mail = composer().reimbursement(&application);

    assert_eq!(mail.subject, "[HackUPC] Reimbursement granted");
    assert_eq!(mail.substitutions["%money%"], "50");
    assert_eq!(mail.substitutions["%country%"], "Madrid");
    assert_eq!(
        mail.from_email.as_deref(),
        Some("HackUPC Reimbursements Team <reimbursements@hackupc.com>")
    );
}
