use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use hackreg::config::RegistrationConfig;
use hackreg::workflows::registration::{
    registration_router, Application, ApplicationStatus, ApplicationSubmission,
    InMemoryStore, MailingList, MailingListError, Notification, NotificationError, Notifier,
    Permission, PermissionTable, RegistrationService, ReimbursementLookup, ReimbursementTable,
    StaffId, StaffUser, STAFF_HEADER,
};
use serde_json::{json, Value};
use tower::ServiceExt;

#[derive(Default)]
struct Outbox {
    sent: Mutex<Vec<Notification>>,
}

impl Outbox {
    fn subjects(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|mail| mail.subject.clone())
            .collect()
    }
}

impl Notifier for Outbox {
    fn send(&self, notification: Notification) -> Result<(), NotificationError> {
        self.sent.lock().unwrap().push(notification);
        Ok(())
    }
}

#[derive(Default)]
struct Subscribers {
    members: Mutex<Vec<String>>,
}

impl MailingList for Subscribers {
    fn add(&self, application: &Application, _list_id: &str) -> Result<(), MailingListError> {
        self.members
            .lock()
            .unwrap()
            .push(application.hacker.email.clone());
        Ok(())
    }

    fn remove(&self, application: &Application, _list_id: &str) -> Result<(), MailingListError> {
        self.members
            .lock()
            .unwrap()
            .retain(|email| email != &application.hacker.email);
        Ok(())
    }
}

fn staff(id: &str) -> StaffUser {
    StaffUser {
        id: StaffId(id.to_string()),
        email: format!("{id}@hackupc.com"),
    }
}

fn staff_table() -> PermissionTable {
    PermissionTable::new()
        .grant(
            staff("organizer"),
            [
                Permission::Invite,
                Permission::Vote,
                Permission::Ranking,
                Permission::CheckIn,
            ],
        )
        .grant(staff("reviewer"), [Permission::Vote])
        .grant(staff("volunteer"), [Permission::CheckIn])
}

fn submission(name: &str, country: &str) -> ApplicationSubmission {
    let payload = json!({
        "hacker": {
            "name": name,
            "lastname": "Tester",
            "email": format!("{}@example.com", name.to_lowercase()),
            "country": country,
            "graduation_year": 2019,
            "university": "UPC",
            "degree": "Mathematics"
        },
        "description": "First hackathon",
        "projects": "A chess engine",
        "scholarship": true,
        "travel_origin": "Lisbon"
    });
    serde_json::from_value(payload).expect("submission payload")
}

fn reimbursements() -> ReimbursementTable {
    let data = include_bytes!("../reimbursements.csv");
    ReimbursementTable::from_reader(&data[..]).expect("reimbursement table parses")
}

#[test]
fn bundled_reimbursement_table_covers_listed_countries() {
    let table = reimbursements();
    assert!(!table.is_empty());
    assert_eq!(table.lookup("Spain"), 50);
    assert_eq!(table.lookup("Portugal"), 80);
    assert_eq!(table.lookup("Australia"), 100);
}

#[test]
fn applicant_moves_from_submission_to_attendance() {
    let outbox = Arc::new(Outbox::default());
    let subscribers = Arc::new(Subscribers::default());
    let service = RegistrationService::new(
        Arc::new(InMemoryStore::default()),
        outbox.clone(),
        subscribers.clone(),
        Arc::new(staff_table()),
        RegistrationConfig::default(),
    )
    .with_reimbursements(Arc::new(reimbursements()));

    let application = service
        .submit(submission("Grace", "Portugal"))
        .expect("submit");
    let id = application.id.clone();

    service.complete(&id, &staff("organizer")).expect("complete");
    service.invite(&id, &staff("organizer")).expect("invite");
    let reimbursed = service
        .send_reimbursement(&id, &staff("organizer"))
        .expect("reimbursement");
    assert_eq!(reimbursed.reimbursement_money, Some(80));

    service.confirm(&id).expect("confirm");
    assert_eq!(
        *subscribers.members.lock().unwrap(),
        vec!["grace@example.com".to_string()]
    );

    let attended = service.check_in(&id, &staff("volunteer")).expect("check in");
    assert_eq!(attended.status, ApplicationStatus::Attended);
    assert_eq!(service.check_ins(&id).expect("audit").len(), 1);

    assert_eq!(
        outbox.subjects(),
        vec![
            "[HackUPC] You are invited!",
            "[HackUPC] Reimbursement granted",
            "[HackUPC] You confirmed your attendance!",
        ]
    );
}

#[test]
fn cancelled_applicants_leave_the_mailing_list() {
    let subscribers = Arc::new(Subscribers::default());
    let service = RegistrationService::new(
        Arc::new(InMemoryStore::default()),
        Arc::new(Outbox::default()),
        subscribers.clone(),
        Arc::new(staff_table()),
        RegistrationConfig::default(),
    );

    let id = service
        .submit(submission("Linus", "Finland"))
        .expect("submit")
        .id;
    service.complete(&id, &staff("organizer")).expect("complete");
    service.invite(&id, &staff("organizer")).expect("invite");
    service.confirm(&id).expect("confirm");
    service.cancel(&id).expect("cancel");
    service.cancel(&id).expect("cancel is idempotent");

    assert!(subscribers.members.lock().unwrap().is_empty());
    assert_eq!(
        service.get(&id).expect("stored").status,
        ApplicationStatus::Cancelled
    );
    assert!(service.confirm(&id).is_err());
}

#[tokio::test]
async fn reviewers_rank_applications_over_http() {
    let service = Arc::new(RegistrationService::new(
        Arc::new(InMemoryStore::default()),
        Arc::new(Outbox::default()),
        Arc::new(Subscribers::default()),
        Arc::new(staff_table()),
        RegistrationConfig::default(),
    ));
    let strong = service.submit(submission("Alan", "Spain")).unwrap().id;
    let weak = service.submit(submission("Edsger", "Spain")).unwrap().id;
    let router = registration_router(service, Arc::new(staff_table()));

    for (id, score) in [(&strong, 9), (&weak, 3)] {
        let response = router
            .clone()
            .oneshot(
                Request::post(format!("/api/v1/applications/{id}/votes"))
                    .header(header::CONTENT_TYPE, "application/json")
                    .header(STAFF_HEADER, "reviewer")
                    .body(Body::from(
                        json!({ "tech": score, "personal": score }).to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = router
        .clone()
        .oneshot(
            Request::get("/api/v1/ranking")
                .header(STAFF_HEADER, "reviewer")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = router
        .oneshot(
            Request::get("/api/v1/ranking")
                .header(STAFF_HEADER, "organizer")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .unwrap();
    let ranking: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(ranking[0]["application_id"], strong.0);
    assert_eq!(ranking[0]["name"], "Alan Tester");
    assert_eq!(ranking[1]["application_id"], weak.0);
}
