//! Test assertion helpers - fluent API for verifying test expectations
#![allow(dead_code)] // Test utilities may not all be used in every test

use tokio::time::{sleep, Duration};

use super::mocks::type_of;
use super::setup::TestSetup;

// ============================================================================
// Assertion Helpers
// ============================================================================

pub struct MessageAssertion<'a> {
    setup: &'a TestSetup,
    players: Vec<&'a str>,
}

impl<'a> MessageAssertion<'a> {
    /// Create an assertion for all players in the setup
    pub fn for_all_players(setup: &'a TestSetup) -> Self {
        let players = setup.players.iter().map(|s| s.as_str()).collect();
        Self { setup, players }
    }

    /// Create an assertion for specific players
    pub fn for_players(setup: &'a TestSetup, players: Vec<&'a str>) -> Self {
        Self { setup, players }
    }

    /// Assert that every player received a message of this type (consumes
    /// it). Unicast and broadcast deliveries may interleave, so earlier
    /// messages of other types are skipped, not consumed.
    pub async fn received_message_type(self, expected_type: &str) -> MessageContent {
        let mut payloads = vec![];

        for player in &self.players {
            let raw = self
                .setup
                .mock_conn_manager
                .consume_message_of_type(player, expected_type)
                .await
                .unwrap_or_else(|| {
                    panic!("{} should have received a {} message", player, expected_type)
                });

            let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
            payloads.push(value["payload"].clone());
        }

        for (i, payload) in payloads.iter().enumerate().skip(1) {
            assert_eq!(
                payload, &payloads[0],
                "Player {} payload differs from player {}",
                self.players[i], self.players[0]
            );
        }

        MessageContent {
            payload: payloads.into_iter().next().unwrap_or_default(),
        }
    }

    /// Assert that no message of this type is queued for the players
    pub async fn received_no_message_type(self, unexpected_type: &str) {
        sleep(Duration::from_millis(20)).await;
        for player in &self.players {
            let count = self.count_message_type(player, unexpected_type).await;
            assert_eq!(count, 0, "{} should not have received {}", player, unexpected_type);
        }
    }

    /// Assert that players received no messages at all
    pub async fn received_no_messages(self) {
        sleep(Duration::from_millis(20)).await;
        for player in &self.players {
            let messages = self.setup.mock_conn_manager.get_messages_for(player).await;
            assert!(
                messages.is_empty(),
                "{} should not have received any messages, got {:?}",
                player,
                messages
            );
        }
    }

    /// Count queued messages of a specific type (non-consuming)
    pub async fn count_message_type(&self, player: &str, message_type: &str) -> usize {
        self.setup
            .mock_conn_manager
            .get_messages_for(player)
            .await
            .iter()
            .filter(|raw| type_of(raw).as_deref() == Some(message_type))
            .count()
    }
}

// ============================================================================
// Message Content Assertions
// ============================================================================

pub struct MessageContent {
    payload: serde_json::Value,
}

impl MessageContent {
    pub fn payload(&self) -> &serde_json::Value {
        &self.payload
    }

    pub fn with_player_id(self, expected: &str) -> Self {
        assert_eq!(self.payload["player_id"], expected);
        self
    }

    pub fn with_display_name(self, expected: &str) -> Self {
        assert_eq!(self.payload["display_name"], expected);
        self
    }

    pub fn with_match_id(self, expected: &str) -> Self {
        assert_eq!(self.payload["match_id"], expected);
        self
    }

    pub fn with_correct(self, expected: bool) -> Self {
        assert_eq!(self.payload["correct"], expected);
        self
    }

    pub fn with_question(self, expected: &str) -> Self {
        assert_eq!(self.payload["question"], expected);
        self
    }

    /// Error messages carry the error's display text
    pub fn with_error_containing(self, fragment: &str) -> Self {
        let message = self.payload["message"].as_str().unwrap_or_default();
        assert!(
            message.contains(fragment),
            "error {:?} should contain {:?}",
            message,
            fragment
        );
        self
    }
}
