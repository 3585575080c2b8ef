use serde::{Deserialize, Serialize};

/// Task-specific shape of an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ItemKind {
    /// Arithmetic question; answers compare trimmed and case-insensitive.
    Arithmetic,
    /// Colour word printed in a different ink; the answer is the ink.
    Stroop { word: String, ink: String },
    /// Distorted-text image; the answer is the exact text.
    CaptchaImage { image: String },
    /// Challenge settled by a remote verifier rather than a stored answer.
    Verification,
}

/// One question, stimulus or challenge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub prompt: String,
    /// Expected answer. Empty for [`ItemKind::Verification`].
    pub answer: String,
    pub kind: ItemKind,
}

impl Item {
    pub fn arithmetic(id: impl Into<String>, prompt: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            prompt: prompt.into(),
            answer: answer.into(),
            kind: ItemKind::Arithmetic,
        }
    }

    pub fn stroop(id: impl Into<String>, word: &str, ink: &str) -> Self {
        Self {
            id: id.into(),
            prompt: format!("Word: {word} (Color: {ink})"),
            answer: ink.to_string(),
            kind: ItemKind::Stroop {
                word: word.to_string(),
                ink: ink.to_string(),
            },
        }
    }

    pub fn captcha_image(id: impl Into<String>, image: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            prompt: "Type the characters shown in the image".to_string(),
            answer: answer.into(),
            kind: ItemKind::CaptchaImage {
                image: image.into(),
            },
        }
    }

    pub fn verification(id: impl Into<String>, instruction: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            prompt: instruction.into(),
            answer: String::new(),
            kind: ItemKind::Verification,
        }
    }

    /// Whether correctness comes from outside (see `TaskRunner::submit_judged`).
    pub fn needs_verification(&self) -> bool {
        self.kind == ItemKind::Verification
    }

    /// Check a submitted answer against this item.
    pub fn check(&self, answer: &str) -> bool {
        let given = answer.trim();
        let expected = self.answer.trim();
        if expected.is_empty() {
            return false;
        }
        match self.kind {
            ItemKind::Arithmetic | ItemKind::Stroop { .. } => given.eq_ignore_ascii_case(expected),
            ItemKind::CaptchaImage { .. } => given == expected,
            ItemKind::Verification => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arithmetic_ignores_whitespace_and_case() {
        let item = Item::arithmetic("m1", "12 + 7", "19");
        assert!(item.check(" 19 "));
        assert!(!item.check("18"));
    }

    #[test]
    fn stroop_answer_is_the_ink() {
        let item = Item::stroop("s1", "RED", "blue");
        assert!(item.check("Blue"));
        assert!(!item.check("red"));
        assert_eq!(item.prompt, "Word: RED (Color: blue)");
    }

    #[test]
    fn captcha_image_is_case_sensitive() {
        let item = Item::captcha_image("c1", "0003U.png", "0003U");
        assert!(item.check("0003U "));
        assert!(!item.check("0003u"));
    }

    #[test]
    fn verification_items_never_match_locally() {
        let item = Item::verification("v1", "Complete the verification");
        assert!(item.needs_verification());
        assert!(!item.check(""));
        assert!(!item.check("anything"));
    }
}
