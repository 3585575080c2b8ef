use clap::Subcommand;
use cogassess_core::task::catalog;
use cogassess_core::{Item, ItemKind, TaskKind};

use super::CommandResult;

#[derive(Subcommand)]
pub enum ItemsAction {
    /// List the built-in items for a task
    List {
        /// math, stroop or captcha
        task: TaskKind,
        /// List the verification challenges instead of CAPTCHA images
        #[arg(long)]
        verify: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn run(action: ItemsAction) -> CommandResult {
    match action {
        ItemsAction::List { task, verify, json } => {
            let items = if verify && task == TaskKind::Captcha {
                catalog::verification_challenges()
            } else {
                catalog::builtin(task)
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&items)?);
            } else {
                for item in &items {
                    println!("{}", describe(item));
                }
            }
        }
    }
    Ok(())
}

fn describe(item: &Item) -> String {
    match &item.kind {
        ItemKind::Arithmetic => format!("{:<12} {} = {}", item.id, item.prompt, item.answer),
        ItemKind::Stroop { word, ink } => format!("{:<12} {word} in {ink} -> {}", item.id, item.answer),
        ItemKind::CaptchaImage { image } => format!("{:<12} {image} -> {}", item.id, item.answer),
        ItemKind::Verification => format!("{:<12} {} (verified)", item.id, item.prompt),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describe_shows_expected_answer() {
        let item = Item::arithmetic("math_1", "3 + 4", "7");
        assert!(describe(&item).ends_with("3 + 4 = 7"));

        let item = Item::stroop("stroop_1", "RED", "BLUE");
        assert!(describe(&item).contains("RED in BLUE -> BLUE"));
    }
}
