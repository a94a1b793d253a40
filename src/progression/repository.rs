use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, instrument, warn};

use super::models::ProgressionModel;
use crate::shared::{AppError, ConflictKind};

/// Result of a conditional answer update
#[derive(Debug, Clone)]
pub enum AdvanceResult {
    /// The answer was applied; returns the updated progression
    Advanced(ProgressionModel),
    /// The cursor had already moved; carries the current progression
    CursorMismatch(ProgressionModel),
    /// The match was sealed for settlement; nothing was applied
    Sealed,
    ProgressionNotFound,
}

#[async_trait]
pub trait ProgressionRepository: Send + Sync {
    /// Inserts all progressions or none. Fails with Conflict(Duplicate) if any
    /// (player, match) pair already exists or repeats within the batch.
    async fn create_progressions(&self, progressions: &[ProgressionModel]) -> Result<(), AppError>;

    async fn get_progression(
        &self,
        match_id: &str,
        player_id: &str,
    ) -> Result<Option<ProgressionModel>, AppError>;

    /// All progressions of a match in creation order
    async fn list_progressions(&self, match_id: &str) -> Result<Vec<ProgressionModel>, AppError>;

    /// Appends the answer, bumps the cursor and, if `correct`, the score, but
    /// only if the match is not sealed and the cursor still equals
    /// `expected_cursor`.
    async fn try_advance(
        &self,
        match_id: &str,
        player_id: &str,
        expected_cursor: usize,
        answer: String,
        correct: bool,
    ) -> Result<AdvanceResult, AppError>;

    /// Freezes every progression of a match. Once this returns, no
    /// `try_advance` for the match applies. Idempotent.
    async fn seal_match(&self, match_id: &str) -> Result<(), AppError>;

    /// Removes every progression of a match. Returns how many were removed.
    async fn delete_for_match(&self, match_id: &str) -> Result<usize, AppError>;
}

#[derive(Default)]
struct ProgressionStore {
    /// match_id -> progressions in creation order
    by_match: HashMap<String, Vec<ProgressionModel>>,
    /// Matches whose progressions no longer accept answers
    sealed: HashSet<String>,
}

/// In-memory implementation of ProgressionRepository for development and testing
#[derive(Default)]
pub struct InMemoryProgressionRepository {
    store: Mutex<ProgressionStore>,
}

impl InMemoryProgressionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn store(&self) -> Result<MutexGuard<'_, ProgressionStore>, AppError> {
        self.store
            .lock()
            .map_err(|_| AppError::DatabaseError("Progression store lock poisoned".to_string()))
    }
}

#[async_trait]
impl ProgressionRepository for InMemoryProgressionRepository {
    #[instrument(skip(self, progressions), fields(count = progressions.len()))]
    async fn create_progressions(&self, progressions: &[ProgressionModel]) -> Result<(), AppError> {
        let mut store = self.store()?;

        let mut seen = HashSet::new();
        for progression in progressions {
            let key = (progression.match_id.as_str(), progression.player_id.as_str());
            let exists = store
                .by_match
                .get(&progression.match_id)
                .is_some_and(|list| list.iter().any(|p| p.player_id == progression.player_id));

            if exists || !seen.insert(key) {
                warn!(
                    match_id = %progression.match_id,
                    player_id = %progression.player_id,
                    "Duplicate progression rejected"
                );
                return Err(AppError::conflict(
                    ConflictKind::Duplicate,
                    format!(
                        "Progression for player {} in match {} already exists",
                        progression.player_id, progression.match_id
                    ),
                ));
            }
        }

        for progression in progressions {
            store
                .by_match
                .entry(progression.match_id.clone())
                .or_default()
                .push(progression.clone());
        }

        debug!("Progressions created in memory");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_progression(
        &self,
        match_id: &str,
        player_id: &str,
    ) -> Result<Option<ProgressionModel>, AppError> {
        let store = self.store()?;
        Ok(store
            .by_match
            .get(match_id)
            .and_then(|list| list.iter().find(|p| p.player_id == player_id))
            .cloned())
    }

    #[instrument(skip(self))]
    async fn list_progressions(&self, match_id: &str) -> Result<Vec<ProgressionModel>, AppError> {
        let store = self.store()?;
        Ok(store.by_match.get(match_id).cloned().unwrap_or_default())
    }

    #[instrument(skip(self, answer))]
    async fn try_advance(
        &self,
        match_id: &str,
        player_id: &str,
        expected_cursor: usize,
        answer: String,
        correct: bool,
    ) -> Result<AdvanceResult, AppError> {
        let mut store = self.store()?;

        if store.sealed.contains(match_id) {
            debug!("Match sealed, answer not applied");
            return Ok(AdvanceResult::Sealed);
        }

        let progression = match store
            .by_match
            .get_mut(match_id)
            .and_then(|list| list.iter_mut().find(|p| p.player_id == player_id))
        {
            Some(progression) => progression,
            None => return Ok(AdvanceResult::ProgressionNotFound),
        };

        if progression.cursor != expected_cursor {
            debug!(
                expected_cursor,
                actual_cursor = progression.cursor,
                "Cursor moved, answer not applied"
            );
            return Ok(AdvanceResult::CursorMismatch(progression.clone()));
        }

        progression.record_answer(answer, correct);

        info!(
            cursor = progression.cursor,
            correct_answers = progression.correct_answers,
            "Progression advanced"
        );
        Ok(AdvanceResult::Advanced(progression.clone()))
    }

    #[instrument(skip(self))]
    async fn seal_match(&self, match_id: &str) -> Result<(), AppError> {
        let mut store = self.store()?;
        if store.sealed.insert(match_id.to_string()) {
            debug!("Progressions sealed");
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_for_match(&self, match_id: &str) -> Result<usize, AppError> {
        let mut store = self.store()?;
        store.sealed.remove(match_id);
        let removed = store
            .by_match
            .remove(match_id)
            .map(|list| list.len())
            .unwrap_or(0);
        debug!(removed, "Progressions deleted");
        Ok(removed)
    }
}
