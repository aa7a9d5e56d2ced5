//! Keyboard builders: the persistent main menu and inline submenus.

use gidracore::tree::GuideTree;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup};

use crate::callback::{encode, CallbackAction, LabelRegistry};

/// Reply keyboard of top-level labels, one per row, kept on screen
/// between messages.
pub fn main_menu_keyboard(tree: &GuideTree) -> KeyboardMarkup {
    let rows: Vec<Vec<KeyboardButton>> = tree
        .main_buttons()
        .iter()
        .map(|label| vec![KeyboardButton::new(label.clone())])
        .collect();

    KeyboardMarkup::new(rows).resize_keyboard().persistent()
}

/// Inline keyboard of a parent's children, one per row.
pub fn submenu_keyboard(children: &[String], registry: &LabelRegistry) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(children.iter().map(|child| {
        vec![InlineKeyboardButton::callback(
            child.clone(),
            encode(&CallbackAction::ShowLeaf(child.clone()), registry),
        )]
    }))
}

/// Single-button keyboard that reopens the parent submenu under a guide.
pub fn back_keyboard(parent: &str, registry: &LabelRegistry) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new([[InlineKeyboardButton::callback(
        format!("⬅️ {}", parent),
        encode(&CallbackAction::ShowSubmenu(parent.to_string()), registry),
    )]])
}

#[cfg(test)]
mod tests {
    use super::*;
    use gidracore::tree::parse_rows;
    use pretty_assertions::assert_eq;
    use teloxide::types::InlineKeyboardButtonKind;

    fn sample_tree() -> GuideTree {
        let rows = vec![
            vec!["".to_string(), "Интро".to_string(), "Привет".to_string()],
            vec!["Интро".to_string(), "FAQ".to_string(), "Ответы".to_string()],
            vec!["".to_string(), "Контакты".to_string(), "Пишите".to_string()],
        ];
        parse_rows(&rows).0
    }

    #[test]
    fn test_main_menu_one_button_per_row() {
        let keyboard = main_menu_keyboard(&sample_tree());

        assert_eq!(keyboard.keyboard.len(), 2);
        assert_eq!(keyboard.keyboard[0][0].text, "Интро");
        assert_eq!(keyboard.keyboard[1][0].text, "Контакты");
    }

    #[test]
    fn test_submenu_buttons_carry_leaf_callbacks() {
        let registry = LabelRegistry::new();
        let tree = sample_tree();
        let keyboard = submenu_keyboard(tree.submenu("Интро").unwrap(), &registry);

        assert_eq!(keyboard.inline_keyboard.len(), 1);
        let button = &keyboard.inline_keyboard[0][0];
        assert_eq!(button.text, "FAQ");
        match &button.kind {
            InlineKeyboardButtonKind::CallbackData(data) => assert_eq!(data, "l|FAQ"),
            other => panic!("expected callback button, got {:?}", other),
        }
    }

    #[test]
    fn test_back_button_targets_parent_submenu() {
        let registry = LabelRegistry::new();
        let keyboard = back_keyboard("Интро", &registry);

        let button = &keyboard.inline_keyboard[0][0];
        assert!(button.text.contains("Интро"));
        match &button.kind {
            InlineKeyboardButtonKind::CallbackData(data) => assert!(data.starts_with("s|")),
            other => panic!("expected callback button, got {:?}", other),
        }
    }
}
