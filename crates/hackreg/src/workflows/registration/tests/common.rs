use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{TimeZone, Utc};
use serde_json::Value;

use crate::config::RegistrationConfig;
use crate::workflows::registration::access::PermissionTable;
use crate::workflows::registration::domain::{
    Application, ApplicationId, ApplicationStatus, ApplicationSubmission, Diet, Edition, Gender,
    Hacker, Permission, StaffId, StaffUser, TshirtSize,
};
use crate::workflows::registration::notification::{
    MailingList, MailingListError, Notification, NotificationError, Notifier,
};
use crate::workflows::registration::reimbursement::ReimbursementTable;
use crate::workflows::registration::repository::{
    CalculatedVote, InMemoryStore, RepositoryError,
};
use crate::workflows::registration::votes::Vote;
use crate::workflows::registration::{
    ApplicationFilter, ApplicationRepository, CheckIn, RegistrationService, VoteRepository,
};

pub(super) const REIMBURSEMENTS: &str = "Spain,50\nFrance,80\nUnited Kingdom,120\n";

pub(super) fn hacker() -> Hacker {
    Hacker {
        name: "Ada".to_string(),
        lastname: "Lovelace".to_string(),
        email: "ada@example.com".to_string(),
        country: "Spain".to_string(),
        gender: Some(Gender::Female),
        graduation_year: 2018,
        university: "UPC".to_string(),
        degree: "Computer Engineering".to_string(),
        github: Some("https://github.com/ada".to_string()),
        devpost: None,
        linkedin: None,
        site: None,
        diet: Diet::Vegetarian,
        tshirt_size: TshirtSize::S,
    }
}

pub(super) fn submission() -> ApplicationSubmission {
    ApplicationSubmission {
        hacker: hacker(),
        edition: Edition::Fall2017,
        description: "I want to build something with trains".to_string(),
        projects: "A compiler for a toy language".to_string(),
        scholarship: true,
        travel_origin: "Madrid".to_string(),
        under_age: Some(false),
        first_timer: Some(true),
        team: Some(false),
        teammates: None,
        authorized_mlh: Some(true),
    }
}

pub(super) fn application_in(status: ApplicationStatus) -> Application {
    let submitted = Utc
        .with_ymd_and_hms(2017, 9, 1, 10, 0, 0)
        .single()
        .expect("valid timestamp");
    let mut application = Application::from_submission(
        ApplicationId(format!("fixture-{}", status.code())),
        submission(),
        submitted,
    );
    application.status = status;
    application
}

pub(super) fn staff(id: &str) -> StaffUser {
    StaffUser {
        id: StaffId(id.to_string()),
        email: format!("{id}@hackupc.com"),
    }
}

pub(super) fn organizer() -> StaffUser {
    staff("organizer")
}

pub(super) fn volunteer() -> StaffUser {
    staff("volunteer")
}

pub(super) fn reviewer(id: &str) -> StaffUser {
    staff(id)
}

pub(super) fn permissions() -> PermissionTable {
    PermissionTable::new()
        .grant(
            organizer(),
            [
                Permission::Invite,
                Permission::Reject,
                Permission::Vote,
                Permission::Ranking,
                Permission::CheckIn,
            ],
        )
        .grant(volunteer(), [Permission::CheckIn])
        .grant(reviewer("reviewer-a"), [Permission::Vote])
        .grant(reviewer("reviewer-b"), [Permission::Vote])
}

pub(super) type TestService = RegistrationService<InMemoryStore, MemoryNotifier>;

pub(super) struct Harness {
    pub(super) service: TestService,
    pub(super) store: Arc<InMemoryStore>,
    pub(super) notifier: Arc<MemoryNotifier>,
    pub(super) mailing: Arc<MemoryMailingList>,
}

pub(super) fn build_service() -> Harness {
    build_service_with(MemoryNotifier::default())
}

pub(super) fn build_service_with(notifier: MemoryNotifier) -> Harness {
    let store = Arc::new(InMemoryStore::default());
    let notifier = Arc::new(notifier);
    let mailing = Arc::new(MemoryMailingList::default());
    let table = ReimbursementTable::from_reader(REIMBURSEMENTS.as_bytes()).expect("table parses");
    let service = RegistrationService::new(
        store.clone(),
        notifier.clone(),
        mailing.clone(),
        Arc::new(permissions()),
        RegistrationConfig::default(),
    )
    .with_reimbursements(Arc::new(table));

    Harness {
        service,
        store,
        notifier,
        mailing,
    }
}

/// Seed a stored application in the given status, bypassing the workflow.
pub(super) fn seed(harness: &Harness, status: ApplicationStatus) -> ApplicationId {
    let mut application = harness
        .service
        .submit(submission())
        .expect("submission succeeds");
    application.status = status;
    let id = application.id.clone();
    harness.store.update(application).expect("update succeeds");
    id
}

pub(super) type ScriptedService = RegistrationService<ScriptedStore, MemoryNotifier>;

pub(super) fn build_scripted_service(store: Arc<ScriptedStore>) -> ScriptedService {
    RegistrationService::new(
        store,
        Arc::new(MemoryNotifier::default()),
        Arc::new(MemoryMailingList::default()),
        Arc::new(permissions()),
        RegistrationConfig::default(),
    )
}

/// Store wrapper that can fail the attendance write or slip in a concurrent vote
/// right after a reviewer's votes are read.
#[derive(Default)]
pub(super) struct ScriptedStore {
    pub(super) inner: InMemoryStore,
    pub(super) fail_check_in: bool,
    pub(super) concurrent_vote: Mutex<Option<Vote>>,
}

impl ApplicationRepository for ScriptedStore {
    fn insert(&self, application: Application) -> Result<Application, RepositoryError> {
        self.inner.insert(application)
    }

    fn update(&self, application: Application) -> Result<(), RepositoryError> {
        self.inner.update(application)
    }

    fn update_with_check_in(
        &self,
        application: Application,
        check_in: CheckIn,
    ) -> Result<(), RepositoryError> {
        if self.fail_check_in {
            return Err(RepositoryError::Unavailable("disk full".to_string()));
        }
        self.inner.update_with_check_in(application, check_in)
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<Application>, RepositoryError> {
        self.inner.fetch(id)
    }

    fn list(&self, filter: ApplicationFilter) -> Result<Vec<Application>, RepositoryError> {
        self.inner.list(filter)
    }

    fn check_ins(&self, id: &ApplicationId) -> Result<Vec<CheckIn>, RepositoryError> {
        self.inner.check_ins(id)
    }
}

impl VoteRepository for ScriptedStore {
    fn upsert_vote(&self, vote: Vote) -> Result<Vote, RepositoryError> {
        self.inner.upsert_vote(vote)
    }

    fn votes_by_reviewer(&self, reviewer: &StaffId) -> Result<Vec<Vote>, RepositoryError> {
        let snapshot = self.inner.votes_by_reviewer(reviewer)?;
        let pending = self
            .concurrent_vote
            .lock()
            .expect("scripted store mutex poisoned")
            .take();
        if let Some(vote) = pending {
            self.inner.upsert_vote(vote)?;
        }
        Ok(snapshot)
    }

    fn update_calculated_votes(&self, votes: Vec<CalculatedVote>) -> Result<(), RepositoryError> {
        self.inner.update_calculated_votes(votes)
    }

    fn all_votes(&self) -> Result<Vec<Vote>, RepositoryError> {
        self.inner.all_votes()
    }
}

#[derive(Default)]
pub(super) struct MemoryNotifier {
    events: Mutex<Vec<Notification>>,
    fail: bool,
}

impl MemoryNotifier {
    pub(super) fn failing() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub(super) fn events(&self) -> Vec<Notification> {
        self.events.lock().expect("notifier mutex poisoned").clone()
    }
}

impl Notifier for MemoryNotifier {
    fn send(&self, notification: Notification) -> Result<(), NotificationError> {
        if self.fail {
            return Err(NotificationError::Transport("smtp down".to_string()));
        }
        self.events
            .lock()
            .expect("notifier mutex poisoned")
            .push(notification);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum ListChange {
    Added(ApplicationId, String),
    Removed(ApplicationId, String),
}

#[derive(Default)]
pub(super) struct MemoryMailingList {
    changes: Mutex<Vec<ListChange>>,
}

impl MemoryMailingList {
    pub(super) fn changes(&self) -> Vec<ListChange> {
        self.changes.lock().expect("mailing mutex poisoned").clone()
    }
}

impl MailingList for MemoryMailingList {
    fn add(&self, application: &Application, list_id: &str) -> Result<(), MailingListError> {
        self.changes
            .lock()
            .expect("mailing mutex poisoned")
            .push(ListChange::Added(application.id.clone(), list_id.to_string()));
        Ok(())
    }

    fn remove(&self, application: &Application, list_id: &str) -> Result<(), MailingListError> {
        self.changes
            .lock()
            .expect("mailing mutex poisoned")
            .push(ListChange::Removed(
                application.id.clone(),
                list_id.to_string(),
            ));
        Ok(())
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
