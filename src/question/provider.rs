use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use super::models::{Category, Difficulty, Question};

/// Errors from the external question source
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout, etc.)
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The provider answered with a non-2xx status code
    #[error("Question provider returned HTTP {0}")]
    HttpStatus(u16),

    /// The provider answered 200 but flagged the request as unfulfillable
    #[error("Question provider response code {0}")]
    ResponseCode(u8),
}

/// Source of question sets for new matches
#[async_trait]
pub trait QuestionProvider: Send + Sync {
    /// Fetches up to `count` questions; `None` / `Difficulty::Any` mean unfiltered.
    /// May return fewer questions than requested.
    async fn fetch_questions(
        &self,
        count: u32,
        category: Option<Category>,
        difficulty: Difficulty,
    ) -> Result<Vec<Question>, ProviderError>;
}

/// Open Trivia DB response envelope
#[derive(Debug, Deserialize)]
struct OpenTdbResponse {
    response_code: u8,
    #[serde(default)]
    results: Vec<Question>,
}

impl OpenTdbResponse {
    /// Drops records that could not be played: a question needs a correct
    /// answer and at least one incorrect one.
    fn into_questions(self) -> Vec<Question> {
        self.results
            .into_iter()
            .filter(|question| {
                let playable = !question.correct_answer.trim().is_empty()
                    && !question.incorrect_answers.is_empty();
                if !playable {
                    warn!(question = %question.question, "Dropping malformed provider question");
                }
                playable
            })
            .collect()
    }
}

/// HTTP client for the Open Trivia DB `api.php` endpoint
pub struct OpenTdbQuestionProvider {
    client: reqwest::Client,
    api_url: String,
}

impl OpenTdbQuestionProvider {
    /// * `api_url` - full endpoint, e.g. `https://opentdb.com/api.php`
    /// * `timeout` - per-request bound, so a stalled provider fails instead of hanging
    pub fn new(api_url: String, timeout: Duration) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, api_url })
    }

    fn query(
        count: u32,
        category: Option<Category>,
        difficulty: Difficulty,
    ) -> Vec<(&'static str, String)> {
        let mut query = vec![("amount", count.to_string())];
        if let Some(category) = category {
            query.push(("category", category.provider_id().to_string()));
        }
        if let Some(difficulty) = difficulty.as_filter() {
            query.push(("difficulty", difficulty.to_string()));
        }
        query
    }
}

#[async_trait]
impl QuestionProvider for OpenTdbQuestionProvider {
    #[instrument(skip(self))]
    async fn fetch_questions(
        &self,
        count: u32,
        category: Option<Category>,
        difficulty: Difficulty,
    ) -> Result<Vec<Question>, ProviderError> {
        let query = Self::query(count, category, difficulty);
        debug!(url = %self.api_url, ?query, "Requesting questions from provider");

        let response = self.client.get(&self.api_url).query(&query).send().await?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "Question provider returned error status");
            return Err(ProviderError::HttpStatus(status.as_u16()));
        }

        let body: OpenTdbResponse = response.json().await?;
        if body.response_code != 0 {
            warn!(
                response_code = body.response_code,
                "Question provider could not fulfil request"
            );
            return Err(ProviderError::ResponseCode(body.response_code));
        }

        let received = body.results.len();
        let questions = body.into_questions();
        info!(
            requested = count,
            received,
            usable = questions.len(),
            "Fetched questions from provider"
        );

        Ok(questions)
    }
}

/// Serves a fixed question list, ignoring filters. Used for local
/// development without network access and in tests.
pub struct StaticQuestionProvider {
    questions: Vec<Question>,
}

impl StaticQuestionProvider {
    pub fn new(questions: Vec<Question>) -> Self {
        Self { questions }
    }
}

#[async_trait]
impl QuestionProvider for StaticQuestionProvider {
    async fn fetch_questions(
        &self,
        count: u32,
        _category: Option<Category>,
        _difficulty: Difficulty,
    ) -> Result<Vec<Question>, ProviderError> {
        Ok(self
            .questions
            .iter()
            .take(count as usize)
            .cloned()
            .collect())
    }
}
