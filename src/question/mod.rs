// Public API - what other modules can use
pub use models::{is_correct_answer, Category, Difficulty, Question, QuestionView};
pub use provider::{
    OpenTdbQuestionProvider, ProviderError, QuestionProvider, StaticQuestionProvider,
};

// Internal modules
mod models;
mod provider;
