//! Callback payload codec.
//!
//! Telegram caps callback_data at 64 bytes, which long guide labels blow
//! through easily. Short labels travel verbatim behind a one-letter tag;
//! long ones travel as a sha256 prefix that is resolved back through an
//! in-memory registry filled at encode time, with a scan over the current
//! tree's labels as the fallback after a restart.

use dashmap::DashMap;
use gidracore::tree::GuideTree;
use sha2::{Digest, Sha256};

/// Telegram's hard limit on callback_data.
const MAX_CALLBACK_BYTES: usize = 64;

/// Hex chars of the label digest kept in hashed payloads.
const DIGEST_PREFIX_LEN: usize = 16;

/// What a pressed inline button asks the bot to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackAction {
    /// Re-render the submenu of a parent label.
    ShowSubmenu(String),
    /// Send the guide content of a leaf label.
    ShowLeaf(String),
}

/// hash prefix → full label, filled whenever a hashed payload is encoded.
#[derive(Default)]
pub struct LabelRegistry {
    labels: DashMap<String, String>,
}

impl LabelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn remember(&self, digest: &str, label: &str) {
        self.labels.insert(digest.to_string(), label.to_string());
    }

    fn lookup(&self, digest: &str) -> Option<String> {
        self.labels.get(digest).map(|entry| entry.value().clone())
    }
}

/// Encodes an action into callback_data, registering the label when the
/// direct form does not fit.
pub fn encode(action: &CallbackAction, registry: &LabelRegistry) -> String {
    let (tag, label) = match action {
        CallbackAction::ShowSubmenu(label) => ('s', label),
        CallbackAction::ShowLeaf(label) => ('l', label),
    };

    let direct = format!("{}|{}", tag, label);
    if direct.len() <= MAX_CALLBACK_BYTES {
        return direct;
    }

    let digest = label_digest(label);
    registry.remember(&digest, label);
    format!("{}#{}", tag, digest)
}

/// Decodes callback_data back into an action.
///
/// Hashed payloads try the registry first, then every label of the current
/// tree; `None` means the label is gone (tree refreshed, process restarted)
/// and the user should be asked to reopen the menu.
pub fn decode(data: &str, registry: &LabelRegistry, tree: &GuideTree) -> Option<CallbackAction> {
    let (tag, rest) = data.split_at_checked(1)?;
    let make = |label: String| match tag {
        "s" => Some(CallbackAction::ShowSubmenu(label)),
        "l" => Some(CallbackAction::ShowLeaf(label)),
        _ => None,
    };

    if let Some(label) = rest.strip_prefix('|') {
        return make(label.to_string());
    }

    let digest = rest.strip_prefix('#')?;
    if let Some(label) = registry.lookup(digest) {
        return make(label);
    }
    tree.text_labels()
        .find(|label| label_digest(label) == digest)
        .and_then(|label| make(label.to_string()))
}

fn label_digest(label: &str) -> String {
    let digest = Sha256::digest(label.as_bytes());
    hex::encode(digest)[..DIGEST_PREFIX_LEN].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use gidracore::tree::parse_rows;
    use pretty_assertions::assert_eq;

    fn tree_with(label: &str) -> GuideTree {
        let rows = vec![vec!["".to_string(), label.to_string(), "text".to_string()]];
        parse_rows(&rows).0
    }

    #[test]
    fn test_short_label_round_trip() {
        let registry = LabelRegistry::new();
        let action = CallbackAction::ShowLeaf("FAQ".to_string());

        let data = encode(&action, &registry);
        assert_eq!(data, "l|FAQ");
        assert_eq!(decode(&data, &registry, &GuideTree::default()), Some(action));
    }

    #[test]
    fn test_submenu_tag_round_trip() {
        let registry = LabelRegistry::new();
        let action = CallbackAction::ShowSubmenu("Интро".to_string());

        let data = encode(&action, &registry);
        assert!(data.starts_with("s|"));
        assert_eq!(decode(&data, &registry, &GuideTree::default()), Some(action));
    }

    #[test]
    fn test_long_label_hashes_and_resolves_via_registry() {
        let registry = LabelRegistry::new();
        // Cyrillic is 2 bytes per char, this blows the 64-byte limit fast.
        let label = "Очень длинное название раздела с подробностями".to_string();
        let action = CallbackAction::ShowLeaf(label);

        let data = encode(&action, &registry);
        assert!(data.starts_with("l#"));
        assert!(data.len() <= MAX_CALLBACK_BYTES);
        assert_eq!(decode(&data, &registry, &GuideTree::default()), Some(action));
    }

    #[test]
    fn test_hashed_payload_resolves_via_tree_after_restart() {
        let label = "Очень длинное название раздела с подробностями";
        let data = encode(&CallbackAction::ShowLeaf(label.to_string()), &LabelRegistry::new());

        // Fresh registry, as after a process restart: only the tree knows.
        let fresh = LabelRegistry::new();
        let tree = tree_with(label);
        assert_eq!(
            decode(&data, &fresh, &tree),
            Some(CallbackAction::ShowLeaf(label.to_string()))
        );
    }

    #[test]
    fn test_unknown_payloads_decode_to_none() {
        let registry = LabelRegistry::new();
        let tree = GuideTree::default();

        assert_eq!(decode("", &registry, &tree), None);
        assert_eq!(decode("x|whatever", &registry, &tree), None);
        assert_eq!(decode("l#deadbeefdeadbeef", &registry, &tree), None);
        assert_eq!(decode("sub_legacy", &registry, &tree), None);
    }
}
