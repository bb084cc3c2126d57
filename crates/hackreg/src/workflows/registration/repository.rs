use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::domain::{Application, ApplicationFilter, ApplicationId, CheckIn, StaffId};
use super::votes::Vote;

/// Storage abstraction for applications and their check-in audit trail.
pub trait ApplicationRepository: Send + Sync {
    fn insert(&self, application: Application) -> Result<Application, RepositoryError>;
    fn update(&self, application: Application) -> Result<(), RepositoryError>;
    /// Persist an attended application together with its audit entry, both or neither.
    fn update_with_check_in(
        &self,
        application: Application,
        check_in: CheckIn,
    ) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &ApplicationId) -> Result<Option<Application>, RepositoryError>;
    fn list(&self, filter: ApplicationFilter) -> Result<Vec<Application>, RepositoryError>;
    fn check_ins(&self, id: &ApplicationId) -> Result<Vec<CheckIn>, RepositoryError>;
}

/// Storage abstraction for reviewer votes, unique per (application, reviewer).
pub trait VoteRepository: Send + Sync {
    /// Insert the vote or replace the one the reviewer already cast for that application.
    fn upsert_vote(&self, vote: Vote) -> Result<Vote, RepositoryError>;
    fn votes_by_reviewer(&self, reviewer: &StaffId) -> Result<Vec<Vote>, RepositoryError>;
    /// Overwrite only `calculated_vote` on existing rows; scores stay as stored.
    fn update_calculated_votes(&self, votes: Vec<CalculatedVote>) -> Result<(), RepositoryError>;
    fn all_votes(&self) -> Result<Vec<Vote>, RepositoryError>;
}

/// Recomputed standardized score for one stored vote.
#[derive(Debug, Clone, PartialEq)]
pub struct CalculatedVote {
    pub application_id: ApplicationId,
    pub reviewer: StaffId,
    pub calculated_vote: Option<f64>,
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

type VoteKey = (ApplicationId, StaffId);

/// Process-local store used by the demo service and tests.
#[derive(Debug, Default, Clone)]
pub struct InMemoryStore {
    applications: Arc<Mutex<BTreeMap<ApplicationId, Application>>>,
    votes: Arc<Mutex<BTreeMap<VoteKey, Vote>>>,
    check_ins: Arc<Mutex<Vec<CheckIn>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, RepositoryError> {
    mutex
        .lock()
        .map_err(|_| RepositoryError::Unavailable("store mutex poisoned".to_string()))
}

impl ApplicationRepository for InMemoryStore {
    fn insert(&self, application: Application) -> Result<Application, RepositoryError> {
        let mut guard = lock(&self.applications)?;
        if guard.contains_key(&application.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(application.id.clone(), application.clone());
        Ok(application)
    }

    fn update(&self, application: Application) -> Result<(), RepositoryError> {
        let mut guard = lock(&self.applications)?;
        match guard.get_mut(&application.id) {
            Some(existing) => {
                *existing = application;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn update_with_check_in(
        &self,
        application: Application,
        check_in: CheckIn,
    ) -> Result<(), RepositoryError> {
        // applications before check_ins, always
        let mut applications = lock(&self.applications)?;
        let mut check_ins = lock(&self.check_ins)?;
        let existing = applications
            .get_mut(&application.id)
            .ok_or(RepositoryError::NotFound)?;
        *existing = application;
        check_ins.push(check_in);
        Ok(())
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<Application>, RepositoryError> {
        let guard = lock(&self.applications)?;
        Ok(guard.get(id).cloned())
    }

    fn list(&self, filter: ApplicationFilter) -> Result<Vec<Application>, RepositoryError> {
        let guard = lock(&self.applications)?;
        Ok(guard
            .values()
            .filter(|application| filter.matches(application.status))
            .cloned()
            .collect())
    }

    fn check_ins(&self, id: &ApplicationId) -> Result<Vec<CheckIn>, RepositoryError> {
        let guard = lock(&self.check_ins)?;
        Ok(guard
            .iter()
            .filter(|check_in| &check_in.application_id == id)
            .cloned()
            .collect())
    }
}

impl VoteRepository for InMemoryStore {
    fn upsert_vote(&self, vote: Vote) -> Result<Vote, RepositoryError> {
        let mut guard = lock(&self.votes)?;
        let key = (vote.application_id.clone(), vote.reviewer.clone());
        guard.insert(key, vote.clone());
        Ok(vote)
    }

    fn votes_by_reviewer(&self, reviewer: &StaffId) -> Result<Vec<Vote>, RepositoryError> {
        let guard = lock(&self.votes)?;
        Ok(guard
            .values()
            .filter(|vote| &vote.reviewer == reviewer)
            .cloned()
            .collect())
    }

    fn update_calculated_votes(&self, votes: Vec<CalculatedVote>) -> Result<(), RepositoryError> {
        let mut guard = lock(&self.votes)?;
        let keyed: Vec<(VoteKey, Option<f64>)> = votes
            .into_iter()
            .map(|vote| ((vote.application_id, vote.reviewer), vote.calculated_vote))
            .collect();
        if keyed.iter().any(|(key, _)| !guard.contains_key(key)) {
            return Err(RepositoryError::NotFound);
        }
        for (key, calculated_vote) in keyed {
            if let Some(stored) = guard.get_mut(&key) {
                stored.calculated_vote = calculated_vote;
            }
        }
        Ok(())
    }

    fn all_votes(&self) -> Result<Vec<Vote>, RepositoryError> {
        let guard = lock(&self.votes)?;
        Ok(guard.values().cloned().collect())
    }
}
