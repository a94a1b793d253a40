#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::Arc;

use trivia_server::{
    config::AppConfig,
    question::{Category, Difficulty, ProviderError, Question, QuestionProvider, StaticQuestionProvider},
    shared::AppState,
    user::PlayerProfile,
    websockets::WebsocketReceiveHandler,
};

use super::mocks::MockConnectionManager;

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

/// Questions whose correct answer is always "right"
pub fn questions(count: usize) -> Vec<Question> {
    (0..count)
        .map(|i| Question {
            question: format!("Question {}?", i + 1),
            correct_answer: "right".to_string(),
            incorrect_answers: vec!["wrong".to_string(), "also wrong".to_string()],
            category: "General Knowledge".to_string(),
            difficulty: "easy".to_string(),
        })
        .collect()
}

/// Provider that is always down
pub struct FailingProvider;

#[async_trait]
impl QuestionProvider for FailingProvider {
    async fn fetch_questions(
        &self,
        _count: u32,
        _category: Option<Category>,
        _difficulty: Difficulty,
    ) -> Result<Vec<Question>, ProviderError> {
        Err(ProviderError::HttpStatus(503))
    }
}

pub struct TestSetup {
    pub state: AppState,
    pub mock_conn_manager: Arc<MockConnectionManager>,
    pub input_handler: WebsocketReceiveHandler,
    /// Registered and connected; the first one hosts the room
    pub players: Vec<String>,
    pub room_id: String,
}

impl TestSetup {
    pub fn host(&self) -> &str {
        &self.players[0]
    }
}

pub struct TestSetupBuilder {
    players: Vec<String>,
    provider: Option<Arc<dyn QuestionProvider>>,
}

impl TestSetupBuilder {
    pub fn new() -> Self {
        Self {
            players: vec![],
            provider: None,
        }
    }

    pub fn with_players(mut self, players: Vec<&str>) -> Self {
        self.players = players.into_iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_three_players(self) -> Self {
        self.with_players(vec!["alice", "bob", "carol"])
    }

    pub fn with_questions(mut self, count: usize) -> Self {
        self.provider = Some(Arc::new(StaticQuestionProvider::new(questions(count))));
        self
    }

    pub fn with_provider(mut self, provider: Arc<dyn QuestionProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub async fn build(self) -> TestSetup {
        let mock_conn_manager = Arc::new(MockConnectionManager::new());
        let provider = self
            .provider
            .unwrap_or_else(|| Arc::new(StaticQuestionProvider::new(questions(3))));

        let state = AppState::in_memory(&AppConfig::default(), provider, mock_conn_manager.clone());

        for player in &self.players {
            state
                .player_directory
                .ensure_player(PlayerProfile {
                    id: player.clone(),
                    display_name: format!("{} display", player),
                    avatar_ref: Some(format!("avatars/{}.png", player)),
                })
                .await
                .unwrap();
            mock_conn_manager.add_connected_player(player).await;
        }

        let host = self
            .players
            .first()
            .cloned()
            .unwrap_or_else(|| "host".to_string());
        let room = state
            .room_service
            .create_room("Test room", &host)
            .await
            .unwrap();

        let input_handler = WebsocketReceiveHandler::new(state.clone());

        TestSetup {
            state,
            mock_conn_manager,
            input_handler,
            players: self.players,
            room_id: room.id,
        }
    }
}
