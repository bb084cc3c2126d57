//! Reviewer votes and their per-reviewer standardization.
//!
//! Reviewers score on different scales: some are harsh, some lenient, some use the whole
//! 1-10 range and some never leave 6-8. Each vote therefore stores a `calculated_vote`
//! rescaled against its reviewer's own mean and dispersion so that rankings compare like
//! with like. The rescaling is redone for every vote of a reviewer whenever one of them
//! changes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::domain::{ApplicationId, StaffId};
use crate::config::{MAX_VOTE, MIN_VOTE, PERSONAL_WEIGHT, TECH_WEIGHT};

/// One reviewer's score for one application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vote {
    pub application_id: ApplicationId,
    pub reviewer: StaffId,
    pub tech: Option<u8>,
    pub personal: Option<u8>,
    pub calculated_vote: Option<f64>,
}

impl Vote {
    pub fn new(
        application_id: ApplicationId,
        reviewer: StaffId,
        tech: Option<u8>,
        personal: Option<u8>,
    ) -> Result<Self, VoteError> {
        validate_score("tech", tech)?;
        validate_score("personal", personal)?;
        Ok(Self {
            application_id,
            reviewer,
            tech,
            personal,
            calculated_vote: None,
        })
    }

    pub fn is_scored(&self) -> bool {
        self.tech.is_some() && self.personal.is_some()
    }
}

fn validate_score(field: &'static str, value: Option<u8>) -> Result<(), VoteError> {
    match value {
        Some(score) if !(MIN_VOTE..=MAX_VOTE).contains(&score) => {
            Err(VoteError::OutOfRange { field, value: score })
        }
        _ => Ok(()),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VoteError {
    #[error("{field} score must be between 1 and 10, got {value}")]
    OutOfRange { field: &'static str, value: u8 },
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Mean and dispersion of one score dimension for a reviewer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreStats {
    pub mean: f64,
    /// Mean squared deviation from `mean`, rounded to two decimals; 1.0 when it rounds to 0.
    pub deviation: f64,
}

impl ScoreStats {
    /// Returns `None` when no vote carries this score yet.
    pub fn from_scores<I>(scores: I) -> Option<Self>
    where
        I: IntoIterator<Item = u8>,
    {
        let scores: Vec<f64> = scores.into_iter().map(f64::from).collect();
        if scores.is_empty() {
            return None;
        }

        let count = scores.len() as f64;
        let mean = round2(scores.iter().sum::<f64>() / count);
        let squared = scores
            .iter()
            .map(|score| (score - mean) * (score - mean))
            .sum::<f64>()
            / count;
        let deviation = match round2(squared) {
            rounded if rounded == 0.0 => 1.0,
            rounded => rounded,
        };

        Some(Self { mean, deviation })
    }

    pub fn standardize(&self, score: u8) -> f64 {
        (f64::from(score) - self.mean) / self.deviation
    }
}

/// Scale derived from every vote a reviewer has cast.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReviewerScale {
    pub tech: ScoreStats,
    pub personal: ScoreStats,
}

impl ReviewerScale {
    pub fn from_votes(votes: &[Vote]) -> Option<Self> {
        let tech = ScoreStats::from_scores(votes.iter().filter_map(|vote| vote.tech))?;
        let personal = ScoreStats::from_scores(votes.iter().filter_map(|vote| vote.personal))?;
        Some(Self { tech, personal })
    }

    pub fn calculated_vote(&self, tech: u8, personal: u8) -> f64 {
        PERSONAL_WEIGHT * self.personal.standardize(personal)
            + TECH_WEIGHT * self.tech.standardize(tech)
    }
}

/// Recompute `calculated_vote` for all of one reviewer's votes.
///
/// Votes missing either score end up without a calculated vote.
pub fn standardize(votes: &mut [Vote]) -> Option<ReviewerScale> {
    let scale = ReviewerScale::from_votes(votes)?;
    for vote in votes.iter_mut() {
        vote.calculated_vote = match (vote.tech, vote.personal) {
            (Some(tech), Some(personal)) => Some(scale.calculated_vote(tech, personal)),
            _ => None,
        };
    }
    Some(scale)
}

/// Aggregate standing of an application across reviewers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingEntry {
    pub application_id: ApplicationId,
    pub score: f64,
    pub votes: usize,
}

/// Mean calculated vote per application, best first. Unscored votes are ignored.
pub fn rank(votes: &[Vote]) -> Vec<RankingEntry> {
    let mut totals: BTreeMap<&ApplicationId, (f64, usize)> = BTreeMap::new();
    for vote in votes {
        if let Some(calculated) = vote.calculated_vote {
            let entry = totals.entry(&vote.application_id).or_insert((0.0, 0));
            entry.0 += calculated;
            entry.1 += 1;
        }
    }

    let mut ranking: Vec<RankingEntry> = totals
        .into_iter()
        .map(|(application_id, (sum, count))| RankingEntry {
            application_id: application_id.clone(),
            score: sum / count as f64,
            votes: count,
        })
        .collect();
    ranking.sort_by(|a, b| b.score.total_cmp(&a.score));
    ranking
}
