use crate::progression::ProgressionModel;

/// Final standings of a match, best first within each half
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Standings {
    pub winners: Vec<ProgressionModel>,
    pub losers: Vec<ProgressionModel>,
}

/// Ranks by correct answers (descending), ties broken by join position, and
/// cuts the list at `floor(len / 2)`. The upper half wins.
///
/// With an odd count the extra player lands among the losers, so a
/// single-player match has no winner.
pub fn rank_and_split(mut progressions: Vec<ProgressionModel>) -> Standings {
    progressions.sort_by_key(|p| p.position);
    // Stable, so equal scores keep join order
    progressions.sort_by(|a, b| b.correct_answers.cmp(&a.correct_answers));

    let losers = progressions.split_off(progressions.len() / 2);
    Standings {
        winners: progressions,
        losers,
    }
}
