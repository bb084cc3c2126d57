use hackreg::error::AppError;
use hackreg::workflows::registration::{
    Application, MailingList, MailingListError, Notification, NotificationError, Notifier,
    Permission, PermissionTable, ReimbursementTable, StaffId, StaffUser,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Mail hook that logs every outgoing notification and keeps a copy in memory.
#[derive(Default, Clone)]
pub(crate) struct TracingNotifier {
    sent: Arc<Mutex<Vec<Notification>>>,
}

impl Notifier for TracingNotifier {
    fn send(&self, notification: Notification) -> Result<(), NotificationError> {
        info!(
            recipients = ?notification.recipients,
            subject = %notification.subject,
            template = %notification.template_id,
            "notification dispatched"
        );
        let mut guard = self
            .sent
            .lock()
            .map_err(|_| NotificationError::Transport("outbox mutex poisoned".to_string()))?;
        guard.push(notification);
        Ok(())
    }
}

impl TracingNotifier {
    pub(crate) fn sent(&self) -> Vec<Notification> {
        self.sent
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

/// Mailing list stand-in that only records membership changes in the log.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct LoggingMailingList;

impl MailingList for LoggingMailingList {
    fn add(&self, application: &Application, list_id: &str) -> Result<(), MailingListError> {
        info!(application = %application.id, list = list_id, "subscribed to mailing list");
        Ok(())
    }

    fn remove(&self, application: &Application, list_id: &str) -> Result<(), MailingListError> {
        info!(application = %application.id, list = list_id, "unsubscribed from mailing list");
        Ok(())
    }
}

fn staff_user(id: &str) -> StaffUser {
    StaffUser {
        id: StaffId(id.to_string()),
        email: format!("{id}@hackupc.com"),
    }
}

/// Built-in staff accounts until an identity provider is wired in.
pub(crate) fn seed_staff() -> PermissionTable {
    PermissionTable::new()
        .grant(
            staff_user("organizer"),
            [
                Permission::Invite,
                Permission::Reject,
                Permission::Vote,
                Permission::Ranking,
                Permission::CheckIn,
            ],
        )
        .grant(staff_user("reviewer"), [Permission::Vote])
        .grant(staff_user("volunteer"), [Permission::CheckIn])
}

pub(crate) fn staff_member(table: &PermissionTable, id: &str) -> Option<StaffUser> {
    table.staff(&StaffId(id.to_string())).cloned()
}

/// Load the configured reimbursement table, or the empty default-only table.
pub(crate) fn load_reimbursements(path: Option<&Path>) -> Result<ReimbursementTable, AppError> {
    match path {
        Some(path) => Ok(ReimbursementTable::from_path(path)?),
        None => Ok(ReimbursementTable::empty()),
    }
}
