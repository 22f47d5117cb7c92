//! Question and answer data contracts.
//!
//! A [`Question`] always holds one big and one small object. Which slot is
//! correct is never stored: it is derived from `is_big` and the target on
//! every call, so the two can not drift apart.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// One candidate choice shown to the player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameObject {
    pub name: String,
    pub display_glyph: String,
    pub color_hint: String,
    /// Ground-truth size, independent of how the object is drawn.
    pub is_big: bool,
}

impl GameObject {
    pub fn new(name: &str, display_glyph: &str, color_hint: &str, is_big: bool) -> Self {
        Self {
            name: name.to_string(),
            display_glyph: display_glyph.to_string(),
            color_hint: color_hint.to_string(),
            is_big,
        }
    }
}

/// The size the player must find in a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeTarget {
    Big,
    Small,
}

impl SizeTarget {
    pub fn wants_big(self) -> bool {
        self == SizeTarget::Big
    }

    /// The Chinese character spoken and shown for this target.
    pub fn label(self) -> &'static str {
        match self {
            SizeTarget::Big => "大",
            SizeTarget::Small => "小",
        }
    }
}

impl fmt::Display for SizeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SizeTarget::Big => write!(f, "big"),
            SizeTarget::Small => write!(f, "small"),
        }
    }
}

/// A slot on screen. Serialized as `1` or `2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Choice {
    First,
    Second,
}

impl Choice {
    /// The slot not picked.
    pub fn other(self) -> Self {
        match self {
            Choice::First => Choice::Second,
            Choice::Second => Choice::First,
        }
    }
}

impl From<Choice> for u8 {
    fn from(choice: Choice) -> Self {
        match choice {
            Choice::First => 1,
            Choice::Second => 2,
        }
    }
}

impl TryFrom<u8> for Choice {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Choice::First),
            2 => Ok(Choice::Second),
            other => Err(format!("choice must be 1 or 2, got {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum QuestionError {
    #[error("both objects are {}", if *is_big { "big" } else { "small" })]
    SameSize { is_big: bool },
}

/// Wire shape of a question before validation.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawQuestion {
    object1: GameObject,
    object2: GameObject,
    target_attribute: SizeTarget,
}

impl TryFrom<RawQuestion> for Question {
    type Error = QuestionError;

    fn try_from(raw: RawQuestion) -> Result<Self, Self::Error> {
        Question::new(raw.object1, raw.object2, raw.target_attribute)
    }
}

/// Two objects, one big and one small, and the size to pick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawQuestion")]
pub struct Question {
    object1: GameObject,
    object2: GameObject,
    target_attribute: SizeTarget,
}

impl Question {
    /// Builds a question, rejecting pairs that would have no unique answer.
    pub fn new(
        object1: GameObject,
        object2: GameObject,
        target_attribute: SizeTarget,
    ) -> Result<Self, QuestionError> {
        if object1.is_big == object2.is_big {
            return Err(QuestionError::SameSize {
                is_big: object1.is_big,
            });
        }
        Ok(Self {
            object1,
            object2,
            target_attribute,
        })
    }

    pub fn object1(&self) -> &GameObject {
        &self.object1
    }

    pub fn object2(&self) -> &GameObject {
        &self.object2
    }

    pub fn object(&self, choice: Choice) -> &GameObject {
        match choice {
            Choice::First => &self.object1,
            Choice::Second => &self.object2,
        }
    }

    pub fn target_attribute(&self) -> SizeTarget {
        self.target_attribute
    }

    /// Judges a selection by the size of the object picked.
    pub fn is_correct(&self, choice_is_big: bool) -> bool {
        choice_is_big == self.target_attribute.wants_big()
    }

    /// The slot holding the answer, recomputed from the objects each time.
    pub fn correct_choice(&self) -> Choice {
        if self.is_correct(self.object1.is_big) {
            Choice::First
        } else {
            Choice::Second
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn lion() -> GameObject {
        GameObject::new("狮子", "🦁", "#FFE0B2", true)
    }

    pub(crate) fn mouse() -> GameObject {
        GameObject::new("老鼠", "🐭", "#C5CAE9", false)
    }

    #[test]
    fn test_same_size_pair_is_rejected() {
        let err = Question::new(lion(), lion(), SizeTarget::Big).unwrap_err();
        assert_eq!(err, QuestionError::SameSize { is_big: true });

        let err = Question::new(mouse(), mouse(), SizeTarget::Small).unwrap_err();
        assert_eq!(err, QuestionError::SameSize { is_big: false });
    }

    #[test]
    fn test_judging_covers_all_four_cases() {
        let find_big = Question::new(lion(), mouse(), SizeTarget::Big).unwrap();
        let find_small = Question::new(lion(), mouse(), SizeTarget::Small).unwrap();

        assert!(find_big.is_correct(true));
        assert!(!find_big.is_correct(false));
        assert!(find_small.is_correct(false));
        assert!(!find_small.is_correct(true));
    }

    #[test]
    fn test_correct_choice_follows_slot_order() {
        let q = Question::new(lion(), mouse(), SizeTarget::Small).unwrap();
        assert_eq!(q.correct_choice(), Choice::Second);

        let q = Question::new(mouse(), lion(), SizeTarget::Small).unwrap();
        assert_eq!(q.correct_choice(), Choice::First);

        let q = Question::new(mouse(), lion(), SizeTarget::Big).unwrap();
        assert_eq!(q.correct_choice(), Choice::Second);
        assert!(q.is_correct(q.object(q.correct_choice()).is_big));
    }

    #[test]
    fn test_deserialize_validates_sizes() {
        let json = r##"{
            "object1": {"name": "大象", "displayGlyph": "🐘", "colorHint": "#B3E5FC", "isBig": true},
            "object2": {"name": "老鼠", "displayGlyph": "🐭", "colorHint": "#C5CAE9", "isBig": false},
            "targetAttribute": "small"
        }"##;
        let q: Question = serde_json::from_str(json).unwrap();
        assert_eq!(q.target_attribute(), SizeTarget::Small);
        assert_eq!(q.correct_choice(), Choice::Second);

        let both_big = json.replace("\"isBig\": false", "\"isBig\": true");
        let err = serde_json::from_str::<Question>(&both_big).unwrap_err();
        assert!(err.to_string().contains("both objects are big"));
    }

    #[test]
    fn test_choice_wire_form() {
        assert_eq!(serde_json::to_string(&Choice::Second).unwrap(), "2");
        assert_eq!(serde_json::from_str::<Choice>("1").unwrap(), Choice::First);
        assert!(serde_json::from_str::<Choice>("3").is_err());
    }
}
