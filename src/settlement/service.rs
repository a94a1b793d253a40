use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

use super::ranking::rank_and_split;
use crate::event::{EventBus, RoomEvent};
use crate::matches::MatchModel;
use crate::progression::ProgressionRepository;
use crate::room::RoomRepository;
use crate::shared::AppError;
use crate::user::PlayerDirectory;

/// What settlement did for one match
#[derive(Debug, Clone, Serialize)]
pub struct SettlementReport {
    pub match_id: String,
    pub room_id: String,
    pub winners: Vec<String>,
    pub losers: Vec<String>,
    /// Players whose aggregate update failed
    pub failed_updates: Vec<String>,
    /// False if the room record could not be removed
    pub room_deleted: bool,
}

/// Ranks a finished match, applies win/loss aggregates and retires the room
pub struct SettlementService {
    room_repository: Arc<dyn RoomRepository>,
    progression_repository: Arc<dyn ProgressionRepository>,
    directory: Arc<dyn PlayerDirectory>,
    event_bus: EventBus,
}

impl SettlementService {
    pub fn new(
        room_repository: Arc<dyn RoomRepository>,
        progression_repository: Arc<dyn ProgressionRepository>,
        directory: Arc<dyn PlayerDirectory>,
        event_bus: EventBus,
    ) -> Self {
        Self {
            room_repository,
            progression_repository,
            directory,
            event_bus,
        }
    }

    /// Must run at most once per match. Callers guarantee that by only
    /// settling after winning the match's transition to Over.
    #[instrument(skip(self, game), fields(match_id = %game.id, room_id = %game.room_id))]
    pub async fn settle(&self, game: &MatchModel) -> Result<SettlementReport, AppError> {
        // Answers still in flight are refused from here on
        self.progression_repository.seal_match(&game.id).await?;
        let progressions = self.progression_repository.list_progressions(&game.id).await?;
        let standings = rank_and_split(progressions);

        let mut failed_updates = Vec::new();

        for winner in &standings.winners {
            if let Err(err) = self.directory.increment_wins(&winner.player_id).await {
                error!(player_id = %winner.player_id, %err, "Failed to record win");
                failed_updates.push(winner.player_id.clone());
            }
        }
        for loser in &standings.losers {
            if let Err(err) = self.directory.increment_losses(&loser.player_id).await {
                error!(player_id = %loser.player_id, %err, "Failed to record loss");
                failed_updates.push(loser.player_id.clone());
            }
        }

        self.event_bus
            .emit_to_room(&game.room_id, RoomEvent::RoomClosed)
            .await;
        // The match is already Over, so a failure here must not abort settlement
        let room_deleted = match self.room_repository.delete_room(&game.room_id).await {
            Ok(existed) => {
                if !existed {
                    warn!("Room was already gone at settlement");
                }
                true
            }
            Err(err) => {
                error!(%err, "Failed to delete room after settlement");
                false
            }
        };
        self.event_bus.close_room_channel(&game.room_id).await;

        let report = SettlementReport {
            match_id: game.id.clone(),
            room_id: game.room_id.clone(),
            winners: standings.winners.into_iter().map(|p| p.player_id).collect(),
            losers: standings.losers.into_iter().map(|p| p.player_id).collect(),
            failed_updates,
            room_deleted,
        };

        info!(
            winners = ?report.winners,
            losers = ?report.losers,
            failed = report.failed_updates.len(),
            room_deleted,
            "Match settled"
        );

        Ok(report)
    }
}
