use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, instrument, warn};

use super::models::MatchModel;
use crate::shared::{AppError, ConflictKind};

/// Result of attempting to end a match
#[derive(Debug, Clone)]
pub enum FinishMatchResult {
    /// This call took the match to Over
    Finished(MatchModel),
    /// Someone else already did
    AlreadyOver(MatchModel),
    MatchNotFound,
}

#[async_trait]
pub trait MatchRepository: Send + Sync {
    /// Inserts the match. Fails with Conflict(MatchAlreadyStarted) if the room
    /// is already bound to a match that is not Over.
    async fn create_match(&self, game: &MatchModel) -> Result<(), AppError>;

    async fn get_match(&self, match_id: &str) -> Result<Option<MatchModel>, AppError>;

    /// Most recent match bound to the room
    async fn get_match_by_room(&self, room_id: &str) -> Result<Option<MatchModel>, AppError>;

    /// Moves the match to Over exactly once
    async fn try_finish_match(&self, match_id: &str) -> Result<FinishMatchResult, AppError>;
}

#[derive(Default)]
struct MatchStore {
    matches: HashMap<String, MatchModel>,
    /// room_id -> most recent match_id
    room_index: HashMap<String, String>,
}

/// In-memory implementation of MatchRepository for development and testing
#[derive(Default)]
pub struct InMemoryMatchRepository {
    store: Mutex<MatchStore>,
}

impl InMemoryMatchRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn store(&self) -> Result<MutexGuard<'_, MatchStore>, AppError> {
        self.store
            .lock()
            .map_err(|_| AppError::DatabaseError("Match store lock poisoned".to_string()))
    }
}

#[async_trait]
impl MatchRepository for InMemoryMatchRepository {
    #[instrument(skip(self, game), fields(match_id = %game.id, room_id = %game.room_id))]
    async fn create_match(&self, game: &MatchModel) -> Result<(), AppError> {
        let mut store = self.store()?;

        if store.matches.contains_key(&game.id) {
            warn!("Match already exists in memory");
            return Err(AppError::DatabaseError("Match already exists".to_string()));
        }

        let live_binding = store
            .room_index
            .get(&game.room_id)
            .and_then(|existing_id| store.matches.get(existing_id))
            .filter(|existing| !existing.is_over())
            .map(|existing| existing.id.clone());

        if let Some(existing_id) = live_binding {
            warn!(existing_match_id = %existing_id, "Room already has a live match");
            return Err(AppError::conflict(
                ConflictKind::MatchAlreadyStarted,
                "Room already has a live match",
            ));
        }

        store
            .room_index
            .insert(game.room_id.clone(), game.id.clone());
        store.matches.insert(game.id.clone(), game.clone());

        info!(questions = game.question_count(), "Match stored in memory");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_match(&self, match_id: &str) -> Result<Option<MatchModel>, AppError> {
        let store = self.store()?;
        let found = store.matches.get(match_id).cloned();
        debug!(found = found.is_some(), "Match lookup");
        Ok(found)
    }

    #[instrument(skip(self))]
    async fn get_match_by_room(&self, room_id: &str) -> Result<Option<MatchModel>, AppError> {
        let store = self.store()?;
        Ok(store
            .room_index
            .get(room_id)
            .and_then(|match_id| store.matches.get(match_id))
            .cloned())
    }

    #[instrument(skip(self))]
    async fn try_finish_match(&self, match_id: &str) -> Result<FinishMatchResult, AppError> {
        let mut store = self.store()?;

        let game = match store.matches.get_mut(match_id) {
            Some(game) => game,
            None => return Ok(FinishMatchResult::MatchNotFound),
        };

        if game.is_over() {
            debug!("Match already over");
            return Ok(FinishMatchResult::AlreadyOver(game.clone()));
        }

        game.finish()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        info!("Match finished");
        Ok(FinishMatchResult::Finished(game.clone()))
    }
}
