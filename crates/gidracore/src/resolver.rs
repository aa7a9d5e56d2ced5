//! Maps a user-selected label to what the bot should show next.

use crate::tree::GuideTree;

/// Outcome of resolving a selected label against the current tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution<'a> {
    /// The label opens a submenu of child labels.
    Submenu(&'a [String]),
    /// The label is a leaf with guide text.
    Leaf(&'a str),
    /// The label exists in neither map. Happens legitimately when the tree
    /// was refreshed between menu render and the user's click; callers show
    /// a "refresh and retry" message.
    NotFound,
}

/// Resolves a label. Submenus win over leaf text so a parent that also
/// has its own text row still opens its children.
pub fn resolve<'a>(tree: &'a GuideTree, label: &str) -> Resolution<'a> {
    if let Some(children) = tree.submenu(label) {
        return Resolution::Submenu(children);
    }
    match tree.text(label) {
        Some(text) => Resolution::Leaf(text),
        None => Resolution::NotFound,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::parse_rows;

    fn row(parent: &str, button: &str, text: &str) -> Vec<String> {
        vec![parent.to_string(), button.to_string(), text.to_string()]
    }

    #[test]
    fn test_intro_faq_scenario() {
        let rows = vec![
            row("", "Intro", "Welcome https://x/a.png"),
            row("Intro", "FAQ", "See FAQ text"),
        ];
        let (tree, _) = parse_rows(&rows);

        assert_eq!(tree.main_buttons(), ["Intro"]);
        assert_eq!(tree.submenu("Intro"), Some(&["FAQ".to_string()][..]));
        assert_eq!(tree.text("FAQ"), Some("See FAQ text"));
        assert_eq!(tree.text("Intro"), Some("Welcome https://x/a.png"));

        match resolve(&tree, "Intro") {
            Resolution::Submenu(children) => assert_eq!(children, ["FAQ"]),
            other => panic!("expected submenu, got {:?}", other),
        }
        assert_eq!(resolve(&tree, "FAQ"), Resolution::Leaf("See FAQ text"));
    }

    #[test]
    fn test_plain_leaf() {
        let (tree, _) = parse_rows(&[row("", "Контакты", "Пишите сюда")]);
        assert_eq!(resolve(&tree, "Контакты"), Resolution::Leaf("Пишите сюда"));
    }

    #[test]
    fn test_unknown_label_is_not_found() {
        let (tree, _) = parse_rows(&[row("", "A", "ta")]);
        assert_eq!(resolve(&tree, "Б"), Resolution::NotFound);
    }

    #[test]
    fn test_empty_tree_resolves_nothing() {
        let tree = GuideTree::default();
        assert_eq!(resolve(&tree, "A"), Resolution::NotFound);
    }
}
