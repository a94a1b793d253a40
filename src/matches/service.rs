use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

use super::{
    models::MatchModel,
    repository::{FinishMatchResult, MatchRepository},
    types::{EndMatchOutcome, MatchReview, MatchSummary, StartMatchRequest},
};
use crate::event::{EventBus, MatchEvent, RoomEvent};
use crate::progression::{ProgressionModel, ProgressionRepository};
use crate::question::{Category, Difficulty, QuestionProvider};
use crate::room::{RoomModel, RoomRepository, RoomStatus, StatusTransitionResult};
use crate::settlement::SettlementService;
use crate::shared::{AppError, ConflictKind};

/// Provider maximum per request
pub const MAX_QUESTIONS: u32 = 50;

/// Drives the match lifecycle: start (lock room, fetch questions, create
/// progressions), end (finish once, settle) and read-only match views.
pub struct MatchService {
    room_repository: Arc<dyn RoomRepository>,
    match_repository: Arc<dyn MatchRepository>,
    progression_repository: Arc<dyn ProgressionRepository>,
    question_provider: Arc<dyn QuestionProvider>,
    settlement: Arc<SettlementService>,
    event_bus: EventBus,
    provider_timeout: Duration,
}

impl MatchService {
    pub fn new(
        room_repository: Arc<dyn RoomRepository>,
        match_repository: Arc<dyn MatchRepository>,
        progression_repository: Arc<dyn ProgressionRepository>,
        question_provider: Arc<dyn QuestionProvider>,
        settlement: Arc<SettlementService>,
        event_bus: EventBus,
        provider_timeout: Duration,
    ) -> Self {
        Self {
            room_repository,
            match_repository,
            progression_repository,
            question_provider,
            settlement,
            event_bus,
            provider_timeout,
        }
    }

    /// Starts a match for the room. All-or-nothing: on failure the room is
    /// reopened and no progression survives, so the host may retry.
    #[instrument(skip(self, request), fields(count = request.number_of_questions))]
    pub async fn start_match(
        &self,
        room_id: &str,
        requester_id: &str,
        request: &StartMatchRequest,
    ) -> Result<MatchModel, AppError> {
        let (category, difficulty) = validate_start_request(request)?;

        let room = self
            .room_repository
            .get_room(room_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Room {} not found", room_id)))?;

        if !room.is_host(requester_id) {
            warn!(host_id = %room.host_id, "Non-host tried to start match");
            return Err(AppError::Forbidden(
                "Only the host can start the match".to_string(),
            ));
        }

        // The locked room is the membership snapshot
        let room = self.lock_room(room_id).await?;

        let questions = match self.fetch_questions(request.number_of_questions, category, difficulty).await {
            Ok(questions) => questions,
            Err(err) => {
                self.roll_back_start(room_id, None).await;
                return Err(err);
            }
        };

        let game = MatchModel::new(
            room.id.clone(),
            room.host_id.clone(),
            questions,
            category.map_or_else(|| Category::WILDCARD.to_string(), |c| c.to_string()),
            difficulty.to_string(),
            request.number_of_questions,
        );
        let game = self.launch(&room, game).await?;

        info!(
            match_id = %game.id,
            questions = game.question_count(),
            participants = room.player_count(),
            "Match started"
        );

        self.event_bus
            .emit_to_room(
                room_id,
                RoomEvent::MatchStarted {
                    match_id: game.id.clone(),
                },
            )
            .await;

        Ok(game)
    }

    /// Ends the match. The first call settles it, tells the match channel to
    /// return to the lobby and closes that channel; later calls only report
    /// that the match is already over.
    #[instrument(skip(self))]
    pub async fn end_match(
        &self,
        match_id: &str,
        requester_id: &str,
    ) -> Result<EndMatchOutcome, AppError> {
        let game = self.get_match(match_id).await?;

        if game.host_id != requester_id {
            warn!(host_id = %game.host_id, "Non-host tried to end match");
            return Err(AppError::Forbidden(
                "Only the host can end the match".to_string(),
            ));
        }

        let settlement = match self.match_repository.try_finish_match(match_id).await? {
            FinishMatchResult::Finished(finished) => {
                Some(self.settlement.settle(&finished).await?)
            }
            FinishMatchResult::AlreadyOver(_) => {
                debug!("Match already over, skipping settlement");
                None
            }
            FinishMatchResult::MatchNotFound => {
                return Err(AppError::NotFound(format!("Match {} not found", match_id)));
            }
        };

        self.event_bus
            .emit_to_match(match_id, MatchEvent::ReturnToLobby)
            .await;
        // Subscribers drain RETURN_TO_LOBBY before they see the channel closed
        if settlement.is_some() {
            self.event_bus.close_match_channel(match_id).await;
        }

        Ok(EndMatchOutcome {
            match_id: match_id.to_string(),
            settlement,
        })
    }

    /// Like [`end_match`](Self::end_match), but the caller names the room it
    /// believes owns the match.
    #[instrument(skip(self))]
    pub async fn end_match_in_room(
        &self,
        room_id: &str,
        match_id: &str,
        requester_id: &str,
    ) -> Result<EndMatchOutcome, AppError> {
        let game = self.get_match(match_id).await?;
        if game.room_id != room_id {
            return Err(AppError::Validation(format!(
                "Match {} does not belong to room {}",
                match_id, room_id
            )));
        }
        self.end_match(match_id, requester_id).await
    }

    pub async fn get_match(&self, match_id: &str) -> Result<MatchModel, AppError> {
        self.match_repository
            .get_match(match_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Match {} not found", match_id)))
    }

    #[instrument(skip(self))]
    pub async fn get_match_summary(&self, match_id: &str) -> Result<MatchSummary, AppError> {
        Ok(MatchSummary::from(&self.get_match(match_id).await?))
    }

    #[instrument(skip(self))]
    pub async fn get_match_by_room(&self, room_id: &str) -> Result<MatchSummary, AppError> {
        self.match_repository
            .get_match_by_room(room_id)
            .await?
            .map(|game| MatchSummary::from(&game))
            .ok_or_else(|| AppError::NotFound(format!("No match for room {}", room_id)))
    }

    /// Questions and correct answers, only once the match is over
    #[instrument(skip(self))]
    pub async fn get_match_review(&self, match_id: &str) -> Result<MatchReview, AppError> {
        let game = self.get_match(match_id).await?;
        if !game.is_over() {
            return Err(AppError::Forbidden(
                "Match review is available once the match is over".to_string(),
            ));
        }
        Ok(MatchReview {
            summary: MatchSummary::from(&game),
            questions: game.questions,
        })
    }

    async fn lock_room(&self, room_id: &str) -> Result<RoomModel, AppError> {
        match self
            .room_repository
            .try_transition_status(room_id, RoomStatus::Open, RoomStatus::Locked)
            .await?
        {
            StatusTransitionResult::Transitioned(room) => Ok(room),
            StatusTransitionResult::StatusMismatch(_) => Err(AppError::conflict(
                ConflictKind::MatchAlreadyStarted,
                "Match already started",
            )),
            StatusTransitionResult::RoomNotFound => {
                Err(AppError::NotFound(format!("Room {} not found", room_id)))
            }
        }
    }

    async fn fetch_questions(
        &self,
        count: u32,
        category: Option<Category>,
        difficulty: Difficulty,
    ) -> Result<Vec<crate::question::Question>, AppError> {
        let fetch = self
            .question_provider
            .fetch_questions(count, category, difficulty);

        let questions = match tokio::time::timeout(self.provider_timeout, fetch).await {
            Ok(Ok(questions)) => questions,
            Ok(Err(err)) => {
                error!(%err, "Question provider failed");
                return Err(AppError::UpstreamUnavailable(err.to_string()));
            }
            Err(_) => {
                error!(timeout = ?self.provider_timeout, "Question provider timed out");
                return Err(AppError::UpstreamUnavailable(
                    "Question provider timed out".to_string(),
                ));
            }
        };

        if questions.is_empty() {
            warn!("Question provider returned no questions");
            return Err(AppError::UpstreamUnavailable(
                "Question provider returned no questions".to_string(),
            ));
        }

        if questions.len() < count as usize {
            debug!(
                requested = count,
                received = questions.len(),
                "Provider returned fewer questions than requested"
            );
        }

        Ok(questions)
    }

    /// Moves the match to InProgress and stores it. The room is reopened if
    /// either step fails.
    async fn launch(&self, room: &RoomModel, mut game: MatchModel) -> Result<MatchModel, AppError> {
        if let Err(err) = game.start() {
            error!(match_id = %game.id, %err, "New match could not be started");
            self.roll_back_start(&room.id, None).await;
            return Err(AppError::Internal);
        }

        if let Err(err) = self.bind_match(room, &game).await {
            self.roll_back_start(&room.id, Some(&game.id)).await;
            return Err(err);
        }
        Ok(game)
    }

    /// Progressions first, then the match record, so nothing is announced
    /// before every member can answer.
    async fn bind_match(&self, room: &RoomModel, game: &MatchModel) -> Result<(), AppError> {
        let progressions: Vec<ProgressionModel> = room
            .member_ids
            .iter()
            .enumerate()
            .map(|(position, player_id)| {
                ProgressionModel::new(player_id.clone(), game.id.clone(), position)
            })
            .collect();

        self.progression_repository
            .create_progressions(&progressions)
            .await?;
        self.match_repository.create_match(game).await
    }

    async fn roll_back_start(&self, room_id: &str, match_id: Option<&str>) {
        if let Some(match_id) = match_id {
            if let Err(err) = self.progression_repository.delete_for_match(match_id).await {
                error!(match_id = %match_id, %err, "Failed to remove progressions of aborted match");
            }
        }

        match self
            .room_repository
            .try_transition_status(room_id, RoomStatus::Locked, RoomStatus::Open)
            .await
        {
            Ok(StatusTransitionResult::Transitioned(_)) => {
                info!(room_id = %room_id, "Room reopened after failed start");
            }
            Ok(other) => warn!(room_id = %room_id, result = ?other, "Room not reopened"),
            Err(err) => error!(room_id = %room_id, %err, "Failed to reopen room"),
        }
    }
}

fn validate_start_request(
    request: &StartMatchRequest,
) -> Result<(Option<Category>, Difficulty), AppError> {
    if !(1..=MAX_QUESTIONS).contains(&request.number_of_questions) {
        return Err(AppError::Validation(format!(
            "Number of questions must be between 1 and {}",
            MAX_QUESTIONS
        )));
    }

    let category = Category::parse_filter(request.category.trim())
        .map_err(|_| AppError::Validation(format!("Unknown category: {}", request.category)))?;

    let difficulty = request
        .difficulty
        .trim()
        .parse::<Difficulty>()
        .map_err(|_| AppError::Validation(format!("Unknown difficulty: {}", request.difficulty)))?;

    Ok((category, difficulty))
}
