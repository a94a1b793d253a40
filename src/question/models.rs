use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

/// A single trivia question as delivered by the provider.
///
/// Text fields are kept exactly as the provider sent them, which means
/// they may contain HTML character entities (`&quot;`, `&eacute;`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub question: String,
    pub correct_answer: String,
    pub incorrect_answers: Vec<String>,
    pub category: String,
    pub difficulty: String,
}

/// What a player sees for one question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionView {
    pub question: String,
    pub answer_choices: Vec<String>,
    pub category: String,
    pub difficulty: String,
}

impl Question {
    /// Incorrect answers in provider order, then the correct answer
    pub fn answer_choices(&self) -> Vec<String> {
        let mut choices = self.incorrect_answers.clone();
        choices.push(self.correct_answer.clone());
        choices
    }

    /// Case-sensitive comparison against the entity-decoded correct answer
    pub fn is_correct(&self, answer: &str) -> bool {
        is_correct_answer(answer, &self.correct_answer)
    }

    pub fn view(&self) -> QuestionView {
        QuestionView {
            question: self.question.clone(),
            answer_choices: self.answer_choices(),
            category: self.category.clone(),
            difficulty: self.difficulty.clone(),
        }
    }
}

/// The provider encodes some answers with HTML entities, so the stored
/// answer is decoded before comparing. The submitted text is used as-is.
pub fn is_correct_answer(submitted: &str, stored_correct: &str) -> bool {
    html_escape::decode_html_entities(stored_correct).as_ref() == submitted
}

/// The fixed category catalog, mapped to provider category ids
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, Display, EnumIter)]
pub enum Category {
    #[strum(to_string = "General Knowledge")]
    GeneralKnowledge,
    #[strum(to_string = "Entertainment: Books")]
    Books,
    #[strum(to_string = "Entertainment: Film")]
    Film,
    #[strum(to_string = "Entertainment: Music")]
    Music,
    #[strum(to_string = "Entertainment: Musicals & Theatres")]
    MusicalsAndTheatres,
    #[strum(to_string = "Entertainment: Television")]
    Television,
    #[strum(to_string = "Entertainment: Video Games")]
    VideoGames,
    #[strum(to_string = "Entertainment: Board Games")]
    BoardGames,
    #[strum(to_string = "Science & Nature")]
    ScienceAndNature,
    #[strum(to_string = "Science: Computers")]
    Computers,
    #[strum(to_string = "Science: Mathematics")]
    Mathematics,
    #[strum(to_string = "Mythology")]
    Mythology,
    #[strum(to_string = "Sports")]
    Sports,
    #[strum(to_string = "Geography")]
    Geography,
    #[strum(to_string = "History")]
    History,
    #[strum(to_string = "Politics")]
    Politics,
    #[strum(to_string = "Art")]
    Art,
    #[strum(to_string = "Celebrities")]
    Celebrities,
    #[strum(to_string = "Animals")]
    Animals,
    #[strum(to_string = "Vehicles")]
    Vehicles,
    #[strum(to_string = "Entertainment: Comics")]
    Comics,
    #[strum(to_string = "Science: Gadgets")]
    Gadgets,
    #[strum(to_string = "Entertainment: Japanese Anime & Manga")]
    AnimeAndManga,
    #[strum(to_string = "Entertainment: Cartoon & Animations")]
    CartoonAndAnimations,
}

impl Category {
    /// Sentinel category name meaning "no category filter"
    pub const WILDCARD: &'static str = "Random";

    pub fn provider_id(self) -> u32 {
        match self {
            Category::GeneralKnowledge => 9,
            Category::Books => 10,
            Category::Film => 11,
            Category::Music => 12,
            Category::MusicalsAndTheatres => 13,
            Category::Television => 14,
            Category::VideoGames => 15,
            Category::BoardGames => 16,
            Category::ScienceAndNature => 17,
            Category::Computers => 18,
            Category::Mathematics => 19,
            Category::Mythology => 20,
            Category::Sports => 21,
            Category::Geography => 22,
            Category::History => 23,
            Category::Politics => 24,
            Category::Art => 25,
            Category::Celebrities => 26,
            Category::Animals => 27,
            Category::Vehicles => 28,
            Category::Comics => 29,
            Category::Gadgets => 30,
            Category::AnimeAndManga => 31,
            Category::CartoonAndAnimations => 32,
        }
    }

    /// Parses a requested category; the wildcard yields `None`
    pub fn parse_filter(raw: &str) -> Result<Option<Category>, strum::ParseError> {
        if raw.eq_ignore_ascii_case(Self::WILDCARD) {
            return Ok(None);
        }
        raw.parse().map(Some)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, Display, EnumIter)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Difficulty {
    Any,
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Provider query value; `Any` means no difficulty filter
    pub fn as_filter(self) -> Option<&'static str> {
        match self {
            Difficulty::Any => None,
            Difficulty::Easy => Some("easy"),
            Difficulty::Medium => Some("medium"),
            Difficulty::Hard => Some("hard"),
        }
    }
}
