use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::access::StaffDirectory;
use super::domain::{
    Application, ApplicationFilter, ApplicationId, ApplicationStatus, ApplicationSubmission,
    ApplicationSummary, CheckIn, StaffId, StaffUser,
};
use super::notification::Notifier;
use super::repository::{ApplicationRepository, RepositoryError, VoteRepository};
use super::service::{RegistrationError, RegistrationService};
use super::workflow::WorkflowError;

/// Header carrying the authenticated staff member's id.
pub const STAFF_HEADER: &str = "x-staff-id";

/// Shared handler state: the service plus the staff lookup used to resolve actors.
pub struct RegistrationState<R, N> {
    pub service: Arc<RegistrationService<R, N>>,
    pub staff: Arc<dyn StaffDirectory>,
}

impl<R, N> Clone for RegistrationState<R, N> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            staff: Arc::clone(&self.staff),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct VoteRequest {
    #[serde(default)]
    pub tech: Option<u8>,
    #[serde(default)]
    pub personal: Option<u8>,
}

#[derive(Debug, Serialize)]
struct CheckInResponse {
    application: ApplicationSummary,
    check_in: Option<CheckIn>,
}

/// Router builder exposing the registration, review and check-in endpoints.
pub fn registration_router<R, N>(
    service: Arc<RegistrationService<R, N>>,
    staff: Arc<dyn StaffDirectory>,
) -> Router
where
    R: ApplicationRepository + VoteRepository + 'static,
    N: Notifier + 'static,
{
    let state = RegistrationState { service, staff };
    Router::new()
        .route(
            "/api/v1/applications",
            post(submit_handler::<R, N>).get(list_handler::<R, N>),
        )
        .route("/api/v1/applications/:id", get(get_handler::<R, N>))
        .route(
            "/api/v1/applications/:id/complete",
            post(complete_handler::<R, N>),
        )
        .route(
            "/api/v1/applications/:id/invite",
            post(invite_handler::<R, N>),
        )
        .route(
            "/api/v1/applications/:id/reject",
            post(reject_handler::<R, N>),
        )
        .route(
            "/api/v1/applications/:id/reminder",
            post(reminder_handler::<R, N>),
        )
        .route(
            "/api/v1/applications/:id/expire",
            post(expire_handler::<R, N>),
        )
        .route(
            "/api/v1/applications/:id/reimbursement",
            post(reimbursement_handler::<R, N>),
        )
        .route(
            "/api/v1/applications/:id/confirm",
            post(confirm_handler::<R, N>),
        )
        .route(
            "/api/v1/applications/:id/cancel",
            post(cancel_handler::<R, N>),
        )
        .route(
            "/api/v1/applications/:id/votes",
            post(vote_handler::<R, N>),
        )
        .route("/api/v1/ranking", get(ranking_handler::<R, N>))
        .route("/api/v1/checkin", get(pending_check_in_handler::<R, N>))
        .route("/api/v1/checkin/all", get(all_check_in_handler::<R, N>))
        .route(
            "/api/v1/applications/:id/checkin",
            post(check_in_handler::<R, N>),
        )
        .with_state(state)
}

pub(crate) fn error_response(error: RegistrationError) -> Response {
    let status = match &error {
        RegistrationError::Workflow(WorkflowError::PermissionDenied { .. }) => {
            StatusCode::FORBIDDEN
        }
        RegistrationError::Workflow(WorkflowError::IllegalStateTransition { .. }) => {
            StatusCode::CONFLICT
        }
        RegistrationError::Workflow(WorkflowError::PreconditionFailed(_))
        | RegistrationError::InvalidVote(_) => StatusCode::UNPROCESSABLE_ENTITY,
        RegistrationError::NotFound(_) => StatusCode::NOT_FOUND,
        RegistrationError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        RegistrationError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
        RegistrationError::Notification(_) | RegistrationError::MailingList(_) => {
            StatusCode::BAD_GATEWAY
        }
    };

    let payload = json!({ "error": error.to_string() });
    (status, axum::Json(payload)).into_response()
}

fn unauthorized(message: &str) -> Response {
    let payload = json!({ "error": message });
    (StatusCode::UNAUTHORIZED, axum::Json(payload)).into_response()
}

fn resolve_actor(staff: &dyn StaffDirectory, headers: &HeaderMap) -> Result<StaffUser, Response> {
    let raw = headers
        .get(STAFF_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| unauthorized("missing staff credentials"))?;

    staff
        .resolve(&StaffId(raw.to_string()))
        .ok_or_else(|| unauthorized("unknown staff member"))
}

fn summary_response(result: Result<Application, RegistrationError>, status: StatusCode) -> Response {
    match result {
        Ok(application) => (status, axum::Json(application.summary())).into_response(),
        Err(error) => error_response(error),
    }
}

fn summaries_response(result: Result<Vec<Application>, RegistrationError>) -> Response {
    match result {
        Ok(applications) => {
            let rows: Vec<ApplicationSummary> =
                applications.iter().map(|application| application.summary()).collect();
            (StatusCode::OK, axum::Json(rows)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn submit_handler<R, N>(
    State(state): State<RegistrationState<R, N>>,
    axum::Json(submission): axum::Json<ApplicationSubmission>,
) -> Response
where
    R: ApplicationRepository + VoteRepository + 'static,
    N: Notifier + 'static,
{
    summary_response(state.service.submit(submission), StatusCode::CREATED)
}

pub(crate) async fn list_handler<R, N>(
    State(state): State<RegistrationState<R, N>>,
    Query(query): Query<ListQuery>,
) -> Response
where
    R: ApplicationRepository + VoteRepository + 'static,
    N: Notifier + 'static,
{
    let filter = match query.status.as_deref() {
        None => ApplicationFilter::All,
        Some(code) => match ApplicationStatus::from_code(code) {
            Some(status) => ApplicationFilter::Status(status),
            None => {
                let payload = json!({ "error": format!("unknown status code '{code}'") });
                return (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response();
            }
        },
    };
    summaries_response(state.service.list(filter))
}

pub(crate) async fn get_handler<R, N>(
    State(state): State<RegistrationState<R, N>>,
    Path(id): Path<String>,
) -> Response
where
    R: ApplicationRepository + VoteRepository + 'static,
    N: Notifier + 'static,
{
    match state.service.get(&ApplicationId(id)) {
        Ok(application) => (StatusCode::OK, axum::Json(application)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn complete_handler<R, N>(
    State(state): State<RegistrationState<R, N>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response
where
    R: ApplicationRepository + VoteRepository + 'static,
    N: Notifier + 'static,
{
    let actor = match resolve_actor(state.staff.as_ref(), &headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    summary_response(
        state.service.complete(&ApplicationId(id), &actor),
        StatusCode::OK,
    )
}

pub(crate) async fn invite_handler<R, N>(
    State(state): State<RegistrationState<R, N>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response
where
    R: ApplicationRepository + VoteRepository + 'static,
    N: Notifier + 'static,
{
    let actor = match resolve_actor(state.staff.as_ref(), &headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    summary_response(
        state.service.invite(&ApplicationId(id), &actor),
        StatusCode::OK,
    )
}

pub(crate) async fn reject_handler<R, N>(
    State(state): State<RegistrationState<R, N>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response
where
    R: ApplicationRepository + VoteRepository + 'static,
    N: Notifier + 'static,
{
    let actor = match resolve_actor(state.staff.as_ref(), &headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    summary_response(
        state.service.reject(&ApplicationId(id), &actor),
        StatusCode::OK,
    )
}

pub(crate) async fn reminder_handler<R, N>(
    State(state): State<RegistrationState<R, N>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response
where
    R: ApplicationRepository + VoteRepository + 'static,
    N: Notifier + 'static,
{
    let actor = match resolve_actor(state.staff.as_ref(), &headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    summary_response(
        state.service.send_last_reminder(&ApplicationId(id), &actor),
        StatusCode::OK,
    )
}

pub(crate) async fn expire_handler<R, N>(
    State(state): State<RegistrationState<R, N>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response
where
    R: ApplicationRepository + VoteRepository + 'static,
    N: Notifier + 'static,
{
    let actor = match resolve_actor(state.staff.as_ref(), &headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    summary_response(
        state.service.expire(&ApplicationId(id), &actor),
        StatusCode::OK,
    )
}

pub(crate) async fn reimbursement_handler<R, N>(
    State(state): State<RegistrationState<R, N>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response
where
    R: ApplicationRepository + VoteRepository + 'static,
    N: Notifier + 'static,
{
    let actor = match resolve_actor(state.staff.as_ref(), &headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    summary_response(
        state.service.send_reimbursement(&ApplicationId(id), &actor),
        StatusCode::OK,
    )
}

pub(crate) async fn confirm_handler<R, N>(
    State(state): State<RegistrationState<R, N>>,
    Path(id): Path<String>,
) -> Response
where
    R: ApplicationRepository + VoteRepository + 'static,
    N: Notifier + 'static,
{
    summary_response(state.service.confirm(&ApplicationId(id)), StatusCode::OK)
}

pub(crate) async fn cancel_handler<R, N>(
    State(state): State<RegistrationState<R, N>>,
    Path(id): Path<String>,
) -> Response
where
    R: ApplicationRepository + VoteRepository + 'static,
    N: Notifier + 'static,
{
    summary_response(state.service.cancel(&ApplicationId(id)), StatusCode::OK)
}

pub(crate) async fn vote_handler<R, N>(
    State(state): State<RegistrationState<R, N>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    axum::Json(request): axum::Json<VoteRequest>,
) -> Response
where
    R: ApplicationRepository + VoteRepository + 'static,
    N: Notifier + 'static,
{
    let actor = match resolve_actor(state.staff.as_ref(), &headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    match state
        .service
        .record_vote(&ApplicationId(id), &actor, request.tech, request.personal)
    {
        Ok(vote) => (StatusCode::OK, axum::Json(vote)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn ranking_handler<R, N>(
    State(state): State<RegistrationState<R, N>>,
    headers: HeaderMap,
) -> Response
where
    R: ApplicationRepository + VoteRepository + 'static,
    N: Notifier + 'static,
{
    let actor = match resolve_actor(state.staff.as_ref(), &headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    match state.service.ranking(&actor) {
        Ok(ranking) => (StatusCode::OK, axum::Json(ranking)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn pending_check_in_handler<R, N>(
    State(state): State<RegistrationState<R, N>>,
) -> Response
where
    R: ApplicationRepository + VoteRepository + 'static,
    N: Notifier + 'static,
{
    summaries_response(state.service.pending_check_in())
}

pub(crate) async fn all_check_in_handler<R, N>(
    State(state): State<RegistrationState<R, N>>,
) -> Response
where
    R: ApplicationRepository + VoteRepository + 'static,
    N: Notifier + 'static,
{
    summaries_response(state.service.not_checked_in())
}

pub(crate) async fn check_in_handler<R, N>(
    State(state): State<RegistrationState<R, N>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response
where
    R: ApplicationRepository + VoteRepository + 'static,
    N: Notifier + 'static,
{
    let actor = match resolve_actor(state.staff.as_ref(), &headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    let id = ApplicationId(id);
    let result = state.service.check_in(&id, &actor).and_then(|application| {
        let check_in = state.service.check_ins(&id)?.pop();
        Ok(CheckInResponse {
            application: application.summary(),
            check_in,
        })
    });
    match result {
        Ok(body) => (StatusCode::OK, axum::Json(body)).into_response(),
        Err(error) => error_response(error),
    }
}
