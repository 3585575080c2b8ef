//! Built-in item sets.

use super::{Item, TaskKind};

const ARITHMETIC: &[(&str, &str)] = &[
    ("12 + 7", "19"),
    ("45 - 18", "27"),
    ("6 × 8", "48"),
    ("81 ÷ 9", "9"),
    ("23 + 39", "62"),
    ("100 - 37", "63"),
    ("7 × 12", "84"),
    ("144 ÷ 12", "12"),
    ("58 + 67", "125"),
    ("15 × 6", "90"),
];

const STROOP: &[(&str, &str)] = &[
    ("RED", "blue"),
    ("GREEN", "red"),
    ("BLUE", "green"),
    ("YELLOW", "purple"),
    ("PURPLE", "yellow"),
    ("ORANGE", "blue"),
    ("RED", "green"),
    ("BLUE", "red"),
    ("GREEN", "purple"),
    ("YELLOW", "orange"),
    ("PURPLE", "blue"),
    ("ORANGE", "green"),
    ("RED", "yellow"),
    ("BLUE", "purple"),
    ("GREEN", "orange"),
    ("YELLOW", "red"),
    ("PURPLE", "green"),
    ("ORANGE", "yellow"),
    ("RED", "purple"),
    ("BLUE", "orange"),
];

/// Ink colours a Stroop answer can name.
pub const STROOP_COLORS: &[&str] = &["red", "blue", "green", "yellow", "purple", "orange"];

const CAPTCHA_IMAGES: &[&str] = &[
    "0003U", "000HU", "00179", "001r3", "002T3", "008J2", "00b22", "00h9K", "00M4c", "01001",
    "013V2", "01685", "01E49", "01g88", "01oe6", "01S7y", "01tU1", "02009", "0213K", "021p1",
];

const VERIFICATIONS: &[&str] = &[
    "Complete the verification below",
    "Verify that you are human by completing the challenge",
    "Please solve the challenge to continue",
    "Complete the security verification",
    "Final verification - complete the challenge below",
];

/// Default item sequence for a task.
pub fn builtin(kind: TaskKind) -> Vec<Item> {
    match kind {
        TaskKind::Math => ARITHMETIC
            .iter()
            .enumerate()
            .map(|(i, (prompt, answer))| Item::arithmetic(format!("math_{}", i + 1), *prompt, *answer))
            .collect(),
        TaskKind::Stroop => STROOP
            .iter()
            .enumerate()
            .map(|(i, (word, ink))| Item::stroop(format!("stroop_{}", i + 1), word, ink))
            .collect(),
        TaskKind::Captcha => CAPTCHA_IMAGES
            .iter()
            .enumerate()
            .map(|(i, answer)| {
                Item::captcha_image(format!("captcha_{}", i + 1), format!("{answer}.png"), *answer)
            })
            .collect(),
    }
}

/// Remote-verified CAPTCHA challenges.
pub fn verification_challenges() -> Vec<Item> {
    VERIFICATIONS
        .iter()
        .enumerate()
        .map(|(i, instruction)| Item::verification(format!("verify_{}", i + 1), *instruction))
        .collect()
}
