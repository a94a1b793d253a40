#![allow(dead_code)]

use tokio::time::{sleep, Duration};

use trivia_server::websockets::{ClientMessage, MessageHandler};

use super::setup::TestSetup;

// ============================================================================
// Action Helpers
// ============================================================================

impl TestSetup {
    /// Send a client message and give channel tasks time to deliver
    pub async fn send_message(&self, player_id: &str, message: ClientMessage) {
        let message_json = serde_json::to_string(&message).unwrap();
        self.send_raw(player_id, &message_json).await;
    }

    pub async fn send_raw(&self, player_id: &str, raw: &str) {
        self.input_handler
            .handle_message(player_id, raw.to_string())
            .await;
        sleep(Duration::from_millis(10)).await;
    }

    pub async fn clear_messages(&self) {
        self.mock_conn_manager.clear_messages().await;
    }

    // ============================================================================
    // Convenience Action Methods
    // ============================================================================

    pub async fn join_room(&self, player_id: &str) {
        self.send_message(
            player_id,
            ClientMessage::JoinRoom {
                room_id: self.room_id.clone(),
            },
        )
        .await;
    }

    /// Every player joins the room; the resulting broadcasts are discarded
    pub async fn join_all_players(&self) {
        for player in self.players.clone() {
            self.join_room(&player).await;
        }
        self.clear_messages().await;
    }

    pub async fn start_match(&self, player_id: &str, number_of_questions: u32) {
        self.send_message(
            player_id,
            ClientMessage::StartMatch {
                room_id: self.room_id.clone(),
                number_of_questions,
                category: "Random".to_string(),
                difficulty: "Any".to_string(),
            },
        )
        .await;
    }

    pub async fn join_match(&self, player_id: &str, match_id: &str) {
        self.send_message(
            player_id,
            ClientMessage::JoinMatch {
                match_id: match_id.to_string(),
            },
        )
        .await;
    }

    pub async fn submit_answer(&self, player_id: &str, match_id: &str, answer: &str) {
        self.send_message(
            player_id,
            ClientMessage::SubmitAnswer {
                match_id: match_id.to_string(),
                answer: answer.to_string(),
            },
        )
        .await;
    }

    pub async fn end_match(&self, player_id: &str, match_id: &str) {
        self.send_message(
            player_id,
            ClientMessage::EndMatch {
                room_id: self.room_id.clone(),
                match_id: match_id.to_string(),
            },
        )
        .await;
    }

    /// Everyone joins the room, the host starts a match and everyone
    /// attaches to it. Returns the match id with all queues cleared.
    pub async fn start_and_join_match(&self, number_of_questions: u32) -> String {
        self.join_all_players().await;
        self.start_match(self.host(), number_of_questions).await;

        let match_id = self
            .state
            .match_service
            .get_match_by_room(&self.room_id)
            .await
            .unwrap()
            .id;

        for player in self.players.clone() {
            self.join_match(&player, &match_id).await;
        }
        self.clear_messages().await;
        match_id
    }
}
