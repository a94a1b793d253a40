use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use super::{
    models::ProgressionModel,
    repository::{AdvanceResult, ProgressionRepository},
    types::{AnswerLogEntry, AnswerOutcome, ScoreEntry},
};
use crate::event::{EventBus, MatchEvent};
use crate::matches::{MatchModel, MatchRepository};
use crate::question::QuestionView;
use crate::shared::{AppError, ConflictKind};
use crate::user::{PlayerDirectory, PlayerProfile};

/// Longest accepted answer text, in characters
pub const MAX_ANSWER_LEN: usize = 1024;

/// Per-player question cursor, answer checking and score views
pub struct ProgressionService {
    match_repository: Arc<dyn MatchRepository>,
    progression_repository: Arc<dyn ProgressionRepository>,
    directory: Arc<dyn PlayerDirectory>,
    event_bus: EventBus,
}

impl ProgressionService {
    pub fn new(
        match_repository: Arc<dyn MatchRepository>,
        progression_repository: Arc<dyn ProgressionRepository>,
        directory: Arc<dyn PlayerDirectory>,
        event_bus: EventBus,
    ) -> Self {
        Self {
            match_repository,
            progression_repository,
            directory,
            event_bus,
        }
    }

    /// The question at the player's cursor
    #[instrument(skip(self))]
    pub async fn current_question(
        &self,
        match_id: &str,
        player_id: &str,
    ) -> Result<QuestionView, AppError> {
        let game = self.load_match(match_id).await?;
        let progression = self
            .progression_repository
            .get_progression(match_id, player_id)
            .await?
            .ok_or_else(|| {
                AppError::Forbidden(format!("Player {} is not in match {}", player_id, match_id))
            })?;

        ensure_playable(&game, &progression)?;

        game.question_at(progression.cursor)
            .map(|question| question.view())
            .ok_or_else(already_complete)
    }

    /// Checks the answer against the question at the cursor and advances the
    /// cursor by exactly one. A duplicate that loses the race is rejected,
    /// never applied to the following question.
    #[instrument(skip(self, answer))]
    pub async fn submit_answer(
        &self,
        match_id: &str,
        player_id: &str,
        answer: &str,
    ) -> Result<AnswerOutcome, AppError> {
        if answer.chars().count() > MAX_ANSWER_LEN {
            return Err(AppError::Validation(format!(
                "Answer must be at most {} characters",
                MAX_ANSWER_LEN
            )));
        }

        let game = self.load_match(match_id).await?;
        let progression = self
            .progression_repository
            .get_progression(match_id, player_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "No progression for player {} in match {}",
                    player_id, match_id
                ))
            })?;

        ensure_playable(&game, &progression)?;

        let expected_cursor = progression.cursor;
        let question = game
            .question_at(expected_cursor)
            .ok_or_else(already_complete)?;
        let correct = question.is_correct(answer);

        let updated = match self
            .progression_repository
            .try_advance(match_id, player_id, expected_cursor, answer.to_string(), correct)
            .await?
        {
            AdvanceResult::Advanced(updated) => updated,
            AdvanceResult::CursorMismatch(current) => {
                warn!(
                    expected_cursor,
                    actual_cursor = current.cursor,
                    "Concurrent submission won the race"
                );
                return Err(if current.is_complete(game.question_count()) {
                    already_complete()
                } else {
                    AppError::conflict(
                        ConflictKind::StaleCursor,
                        "Answer was already submitted for this question",
                    )
                });
            }
            AdvanceResult::Sealed => {
                warn!("Match ended before the answer was applied");
                return Err(match_over());
            }
            AdvanceResult::ProgressionNotFound => {
                return Err(AppError::NotFound(format!(
                    "No progression for player {} in match {}",
                    player_id, match_id
                )));
            }
        };

        info!(
            correct,
            cursor = updated.cursor,
            correct_answers = updated.correct_answers,
            "Answer recorded"
        );

        self.event_bus
            .emit_to_match(
                match_id,
                MatchEvent::QuestionResult {
                    player_id: player_id.to_string(),
                    correct,
                },
            )
            .await;

        let next_question = game.question_at(updated.cursor).map(|q| q.view());
        if next_question.is_none() {
            debug!("Player completed the question set");
        }

        Ok(AnswerOutcome {
            correct,
            next_question,
            cursor: updated.cursor,
            question_count: game.question_count(),
        })
    }

    /// Scores and cursors of every participant, in join order
    #[instrument(skip(self))]
    pub async fn scoreboard(&self, match_id: &str) -> Result<Vec<ScoreEntry>, AppError> {
        self.load_match(match_id).await?;
        let progressions = self.progression_repository.list_progressions(match_id).await?;

        let mut entries = Vec::with_capacity(progressions.len());
        for progression in progressions {
            entries.push(ScoreEntry {
                player: self.profile(&progression.player_id).await,
                correct_answers: progression.correct_answers,
                cursor: progression.cursor,
            });
        }
        Ok(entries)
    }

    /// Submitted answers of every participant, only once the match is over
    #[instrument(skip(self))]
    pub async fn answer_log(&self, match_id: &str) -> Result<Vec<AnswerLogEntry>, AppError> {
        let game = self.load_match(match_id).await?;
        if !game.is_over() {
            return Err(AppError::Forbidden(
                "Answers are revealed once the match is over".to_string(),
            ));
        }

        let progressions = self.progression_repository.list_progressions(match_id).await?;

        let mut entries = Vec::with_capacity(progressions.len());
        for progression in progressions {
            entries.push(AnswerLogEntry {
                player: self.profile(&progression.player_id).await,
                correct_answers: progression.correct_answers,
                cursor: progression.cursor,
                answers: progression.answers,
            });
        }
        Ok(entries)
    }

    async fn load_match(&self, match_id: &str) -> Result<MatchModel, AppError> {
        self.match_repository
            .get_match(match_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Match {} not found", match_id)))
    }

    async fn profile(&self, player_id: &str) -> PlayerProfile {
        self.directory
            .get_profile(player_id)
            .await
            .unwrap_or_else(|| PlayerProfile {
                id: player_id.to_string(),
                display_name: player_id.to_string(),
                avatar_ref: None,
            })
    }
}

fn already_complete() -> AppError {
    AppError::conflict(
        ConflictKind::AlreadyComplete,
        "All questions have been answered",
    )
}

fn match_over() -> AppError {
    AppError::conflict(ConflictKind::MatchOver, "Match is over")
}

fn ensure_playable(game: &MatchModel, progression: &ProgressionModel) -> Result<(), AppError> {
    if game.is_over() {
        return Err(match_over());
    }
    if progression.is_complete(game.question_count()) {
        return Err(already_complete());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matches::{FinishMatchResult, InMemoryMatchRepository, MatchService};
    use crate::progression::InMemoryProgressionRepository;
    use crate::question::{Question, StaticQuestionProvider};
    use crate::room::repository::InMemoryRoomRepository;
    use crate::settlement::SettlementService;
    use crate::shared::test_utils::{profile, sample_questions};
    use crate::user::InMemoryPlayerDirectory;
    use async_trait::async_trait;
    use futures::future::join_all;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;
    use tokio::sync::Notify;

    /// Holds the first `get_match` after its read until released, so a
    /// submission can be parked between its checks and its update.
    struct PausingMatchRepository {
        inner: Arc<InMemoryMatchRepository>,
        armed: AtomicBool,
        paused: Notify,
        release: Notify,
    }

    impl PausingMatchRepository {
        fn new(inner: Arc<InMemoryMatchRepository>) -> Self {
            Self {
                inner,
                armed: AtomicBool::new(true),
                paused: Notify::new(),
                release: Notify::new(),
            }
        }
    }

    #[async_trait]
    impl MatchRepository for PausingMatchRepository {
        async fn create_match(&self, game: &MatchModel) -> Result<(), AppError> {
            self.inner.create_match(game).await
        }

        async fn get_match(&self, match_id: &str) -> Result<Option<MatchModel>, AppError> {
            let game = self.inner.get_match(match_id).await?;
            if self.armed.swap(false, Ordering::SeqCst) {
                self.paused.notify_one();
                self.release.notified().await;
            }
            Ok(game)
        }

        async fn get_match_by_room(&self, room_id: &str) -> Result<Option<MatchModel>, AppError> {
            self.inner.get_match_by_room(room_id).await
        }

        async fn try_finish_match(&self, match_id: &str) -> Result<FinishMatchResult, AppError> {
            self.inner.try_finish_match(match_id).await
        }
    }

    struct Fixture {
        service: Arc<ProgressionService>,
        matches: Arc<InMemoryMatchRepository>,
        progressions: Arc<InMemoryProgressionRepository>,
        directory: Arc<InMemoryPlayerDirectory>,
        bus: EventBus,
        game: MatchModel,
    }

    async fn fixture(questions: Vec<Question>, players: &[&str]) -> Fixture {
        let matches = Arc::new(InMemoryMatchRepository::new());
        let progressions = Arc::new(InMemoryProgressionRepository::new());
        let directory = Arc::new(InMemoryPlayerDirectory::new());
        for id in players {
            directory.ensure_player(profile(id)).await.unwrap();
        }
        let bus = EventBus::new(32);

        let mut game = MatchModel::new(
            "room".to_string(),
            players[0].to_string(),
            questions,
            "Random".to_string(),
            "any".to_string(),
            5,
        );
        game.start().unwrap();
        matches.create_match(&game).await.unwrap();

        let batch: Vec<ProgressionModel> = players
            .iter()
            .enumerate()
            .map(|(position, id)| ProgressionModel::new(id.to_string(), game.id.clone(), position))
            .collect();
        progressions.create_progressions(&batch).await.unwrap();

        let service = Arc::new(ProgressionService::new(
            matches.clone(),
            progressions.clone(),
            directory.clone(),
            bus.clone(),
        ));

        Fixture {
            service,
            matches,
            progressions,
            directory,
            bus,
            game,
        }
    }

    #[tokio::test]
    async fn test_current_question_follows_cursor() {
        let fx = fixture(sample_questions(3), &["a"]).await;

        let first = fx.service.current_question(&fx.game.id, "a").await.unwrap();
        assert_eq!(first.question, "Question 1?");
        assert_eq!(first.answer_choices.len(), 3);
        assert!(first.answer_choices.contains(&"right".to_string()));

        fx.service
            .submit_answer(&fx.game.id, "a", "wrong-a")
            .await
            .unwrap();

        let second = fx.service.current_question(&fx.game.id, "a").await.unwrap();
        assert_eq!(second.question, "Question 2?");
    }

    #[tokio::test]
    async fn test_current_question_for_outsider() {
        let fx = fixture(sample_questions(3), &["a"]).await;

        let outsider = fx.service.current_question(&fx.game.id, "b").await;
        assert!(matches!(outsider, Err(AppError::Forbidden(_))));

        let missing = fx.service.current_question("nope", "a").await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_submit_walks_through_questions() {
        let fx = fixture(sample_questions(2), &["a", "b"]).await;
        let mut events = fx.bus.subscribe_to_match(&fx.game.id).await;

        let first = fx
            .service
            .submit_answer(&fx.game.id, "a", "right")
            .await
            .unwrap();
        assert!(first.correct);
        assert_eq!(first.cursor, 1);
        assert_eq!(
            first.next_question.as_ref().map(|q| q.question.as_str()),
            Some("Question 2?")
        );

        let last = fx
            .service
            .submit_answer(&fx.game.id, "a", "Right")
            .await
            .unwrap();
        assert!(!last.correct);
        assert!(last.next_question.is_none());
        assert_eq!(last.cursor, last.question_count);

        assert_eq!(
            events.recv().await.unwrap(),
            MatchEvent::QuestionResult {
                player_id: "a".to_string(),
                correct: true
            }
        );
        assert_eq!(
            events.recv().await.unwrap(),
            MatchEvent::QuestionResult {
                player_id: "a".to_string(),
                correct: false
            }
        );

        let stored = fx
            .progressions
            .get_progression(&fx.game.id, "a")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.answers, vec!["right", "Right"]);
        assert_eq!(stored.correct_answers, 1);

        // Other players are unaffected
        let other = fx
            .progressions
            .get_progression(&fx.game.id, "b")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(other.cursor, 0);
    }

    #[tokio::test]
    async fn test_submit_after_completion_is_rejected_without_mutation() {
        let fx = fixture(sample_questions(1), &["a"]).await;
        fx.service
            .submit_answer(&fx.game.id, "a", "right")
            .await
            .unwrap();

        for _ in 0..3 {
            let err = fx
                .service
                .submit_answer(&fx.game.id, "a", "right")
                .await
                .unwrap_err();
            assert_eq!(err.conflict_kind(), Some(ConflictKind::AlreadyComplete));
        }

        let err = fx.service.current_question(&fx.game.id, "a").await.unwrap_err();
        assert_eq!(err.conflict_kind(), Some(ConflictKind::AlreadyComplete));

        let stored = fx
            .progressions
            .get_progression(&fx.game.id, "a")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.cursor, 1);
        assert_eq!(stored.answers.len(), 1);
        assert_eq!(stored.correct_answers, 1);
    }

    #[tokio::test]
    async fn test_entity_encoded_answer() {
        let question = Question {
            question: "Capital of the province?".to_string(),
            correct_answer: "Qu&eacute;bec City".to_string(),
            incorrect_answers: vec!["Montr&eacute;al".to_string()],
            category: "Geography".to_string(),
            difficulty: "easy".to_string(),
        };
        let fx = fixture(vec![question], &["a"]).await;

        let outcome = fx
            .service
            .submit_answer(&fx.game.id, "a", "Québec City")
            .await
            .unwrap();
        assert!(outcome.correct);
    }

    #[tokio::test]
    async fn test_double_submit_applies_once() {
        let fx = fixture(sample_questions(5), &["a"]).await;

        let submissions = (0..6).map(|_| {
            let service = fx.service.clone();
            let match_id = fx.game.id.clone();
            async move { service.submit_answer(&match_id, "a", "right").await }
        });
        let results = join_all(submissions).await;

        let applied = results.iter().filter(|r| r.is_ok()).count();
        let stored = fx
            .progressions
            .get_progression(&fx.game.id, "a")
            .await
            .unwrap()
            .unwrap();

        // Every success moved the cursor by exactly one, nothing else did
        assert_eq!(stored.cursor, applied);
        assert_eq!(stored.answers.len(), applied);
        assert_eq!(stored.correct_answers as usize, applied);
        assert!(stored.cursor <= 5);

        for result in results.iter().filter_map(|r| r.as_ref().err()) {
            assert!(matches!(
                result.conflict_kind(),
                Some(ConflictKind::StaleCursor) | Some(ConflictKind::AlreadyComplete)
            ));
        }
    }

    #[tokio::test]
    async fn test_over_match_rejects_play() {
        let fx = fixture(sample_questions(3), &["a"]).await;
        fx.matches.try_finish_match(&fx.game.id).await.unwrap();

        let submit = fx
            .service
            .submit_answer(&fx.game.id, "a", "right")
            .await
            .unwrap_err();
        assert_eq!(submit.conflict_kind(), Some(ConflictKind::MatchOver));

        let current = fx.service.current_question(&fx.game.id, "a").await.unwrap_err();
        assert_eq!(current.conflict_kind(), Some(ConflictKind::MatchOver));
    }

    #[tokio::test]
    async fn test_answer_in_flight_when_match_ends_is_refused() {
        let fx = fixture(sample_questions(3), &["host", "p1"]).await;

        let pausing = Arc::new(PausingMatchRepository::new(fx.matches.clone()));
        let service = Arc::new(ProgressionService::new(
            pausing.clone(),
            fx.progressions.clone(),
            fx.directory.clone(),
            fx.bus.clone(),
        ));
        let rooms = Arc::new(InMemoryRoomRepository::new());
        let settlement = Arc::new(SettlementService::new(
            rooms.clone(),
            fx.progressions.clone(),
            fx.directory.clone(),
            fx.bus.clone(),
        ));
        let lifecycle = MatchService::new(
            rooms,
            fx.matches.clone(),
            fx.progressions.clone(),
            Arc::new(StaticQuestionProvider::new(Vec::new())),
            settlement,
            fx.bus.clone(),
            Duration::from_secs(1),
        );

        // p1 passes every check against an InProgress snapshot, then stalls
        let submission = tokio::spawn({
            let service = service.clone();
            let match_id = fx.game.id.clone();
            async move { service.submit_answer(&match_id, "p1", "right").await }
        });
        pausing.paused.notified().await;

        let ended = lifecycle.end_match(&fx.game.id, "host").await.unwrap();
        let report = ended.settlement.unwrap();
        assert_eq!(report.winners, vec!["host"]);
        assert_eq!(report.losers, vec!["p1"]);

        pausing.release.notify_one();
        let err = submission.await.unwrap().unwrap_err();
        assert_eq!(err.conflict_kind(), Some(ConflictKind::MatchOver));

        // Settled standings and the stored answers agree
        let stored = fx
            .progressions
            .get_progression(&fx.game.id, "p1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.cursor, 0);
        assert_eq!(stored.correct_answers, 0);
        assert!(stored.answers.is_empty());

        let log = fx.service.answer_log(&fx.game.id).await.unwrap();
        assert!(log.iter().all(|entry| entry.answers.is_empty()));
    }

    #[tokio::test]
    async fn test_overlong_answer() {
        let fx = fixture(sample_questions(3), &["a"]).await;
        let result = fx
            .service
            .submit_answer(&fx.game.id, "a", &"x".repeat(MAX_ANSWER_LEN + 1))
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_submit_without_progression() {
        let fx = fixture(sample_questions(3), &["a"]).await;
        let result = fx.service.submit_answer(&fx.game.id, "late", "right").await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_scoreboard_and_answer_log() {
        let fx = fixture(sample_questions(3), &["a", "b"]).await;
        fx.service
            .submit_answer(&fx.game.id, "b", "right")
            .await
            .unwrap();

        let board = fx.service.scoreboard(&fx.game.id).await.unwrap();
        assert_eq!(board.len(), 2);
        assert_eq!(board[0].player.id, "a");
        assert_eq!(board[1].correct_answers, 1);
        assert_eq!(board[1].player.display_name, "b-name");

        let hidden = fx.service.answer_log(&fx.game.id).await;
        assert!(matches!(hidden, Err(AppError::Forbidden(_))));

        fx.matches.try_finish_match(&fx.game.id).await.unwrap();
        let log = fx.service.answer_log(&fx.game.id).await.unwrap();
        assert_eq!(log[1].answers, vec!["right"]);
        assert!(log[0].answers.is_empty());
    }
}
