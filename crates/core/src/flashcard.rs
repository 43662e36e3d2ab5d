use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The single validity rule for a question/answer pair: both non-empty
/// after trimming whitespace.
///
/// Used by the per-response filter and by the set-level re-validation, so a
/// candidate can never pass one and fail the other.
pub fn is_valid_pair(question: &str, answer: &str) -> bool {
    !question.trim().is_empty() && !answer.trim().is_empty()
}

/// A validated flashcard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flashcard {
    pub question: String,
    pub answer: String,
}

impl Flashcard {
    /// Build a card from text fields, trimming both. Returns `None` when the
    /// pair is invalid.
    pub fn new(question: &str, answer: &str) -> Option<Self> {
        is_valid_pair(question, answer).then(|| Self {
            question: question.trim().to_string(),
            answer: answer.trim().to_string(),
        })
    }

    /// Accept a parsed JSON element only if it is an object whose `question`
    /// and `answer` are both strings passing [`is_valid_pair`]. Any other
    /// fields are dropped.
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let question = obj.get("question")?.as_str()?;
        let answer = obj.get("answer")?.as_str()?;
        Self::new(question, answer)
    }

    pub fn is_valid(&self) -> bool {
        is_valid_pair(&self.question, &self.answer)
    }
}

/// Ordered flashcards accumulated across all chunks of one request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlashcardSet {
    cards: Vec<Flashcard>,
}

impl FlashcardSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend(&mut self, cards: impl IntoIterator<Item = Flashcard>) {
        self.cards.extend(cards);
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Flashcard> {
        self.cards.iter()
    }

    /// Re-apply the card invariant to every member, dropping any that fail.
    /// Returns the filtered set and the number of cards dropped.
    pub fn revalidated(self) -> (Self, usize) {
        let before = self.cards.len();
        let cards: Vec<Flashcard> = self.cards.into_iter().filter(Flashcard::is_valid).collect();
        let dropped = before - cards.len();
        (Self { cards }, dropped)
    }
}

impl FromIterator<Flashcard> for FlashcardSet {
    fn from_iter<I: IntoIterator<Item = Flashcard>>(iter: I) -> Self {
        Self {
            cards: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn from_value_accepts_well_formed() {
        let card = Flashcard::from_value(&json!({"question": " Q ", "answer": "A", "hint": 1})).unwrap();
        assert_eq!(card, Flashcard { question: "Q".into(), answer: "A".into() });
    }

    #[test]
    fn from_value_rejects_bad_shapes() {
        let rejected = [
            json!("just a string"),
            json!(["question", "answer"]),
            json!({"question": "Q"}),
            json!({"answer": "A"}),
            json!({"question": 42, "answer": "A"}),
            json!({"question": "Q", "answer": null}),
            json!({"question": "Q", "answer": ["A"]}),
            json!({"question": "   ", "answer": "A"}),
            json!({"question": "Q", "answer": "\n\t"}),
        ];
        for value in &rejected {
            assert!(Flashcard::from_value(value).is_none(), "should reject {value}");
        }
    }

    #[test]
    fn filter_and_revalidation_agree() {
        let pairs = [("Q", "A"), ("", "A"), ("Q", " "), (" q ", " a ")];
        for (q, a) in pairs {
            let via_filter = Flashcard::from_value(&json!({"question": q, "answer": a}));
            let raw = Flashcard { question: q.into(), answer: a.into() };
            assert_eq!(via_filter.is_some(), raw.is_valid(), "disagreement on ({q:?}, {a:?})");
        }
    }

    #[test]
    fn revalidated_drops_invalid_members() {
        let set = FlashcardSet {
            cards: vec![
                Flashcard { question: "Q1".into(), answer: "A1".into() },
                Flashcard { question: " ".into(), answer: "A2".into() },
                Flashcard { question: "Q3".into(), answer: "A3".into() },
            ],
        };
        let (set, dropped) = set.revalidated();
        assert_eq!(dropped, 1);
        let questions: Vec<&str> = set.iter().map(|c| c.question.as_str()).collect();
        assert_eq!(questions, vec!["Q1", "Q3"]);
    }

    #[test]
    fn set_serializes_as_array() {
        let set: FlashcardSet = [Flashcard::new("Q", "A").unwrap()].into_iter().collect();
        assert_eq!(
            serde_json::to_value(&set).unwrap(),
            json!([{"question": "Q", "answer": "A"}])
        );
    }
}
