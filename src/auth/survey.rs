//! Preference survey flags collected at registration.
//!
//! The mobile client submits a free-text list of category labels; each known
//! label maps to exactly one named boolean below. Unknown labels are ignored,
//! never errors.

use serde::{Deserialize, Serialize};

/// The twelve fixed survey categories.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurveyAnswers {
    pub environment: bool,
    pub charity: bool,
    pub relationships: bool,
    pub relaxation: bool,
    pub romance: bool,
    pub exercise: bool,
    pub travel: bool,
    pub lang: bool,
    pub culture: bool,
    pub challenge: bool,
    pub hobby: bool,
    pub workplace: bool,
}

impl SurveyAnswers {
    /// Build answers from submitted category labels.
    #[must_use]
    pub fn from_categories<I, S>(categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut answers = Self::default();
        for category in categories {
            answers.mark(category.as_ref());
        }
        answers
    }

    /// Set the flag for a category label. Returns false for unknown labels.
    pub fn mark(&mut self, category: &str) -> bool {
        let flag = match category {
            "환경" => &mut self.environment,
            "자선활동" => &mut self.charity,
            "인간관계" => &mut self.relationships,
            "휴식" => &mut self.relaxation,
            "연애" => &mut self.romance,
            "운동" => &mut self.exercise,
            "여행" => &mut self.travel,
            "언어" => &mut self.lang,
            "문화" => &mut self.culture,
            "도전" => &mut self.challenge,
            "취미" => &mut self.hobby,
            "직장" => &mut self.workplace,
            _ => return false,
        };
        *flag = true;
        true
    }
}
