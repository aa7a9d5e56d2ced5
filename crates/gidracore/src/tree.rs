//! Guide tree: the parsed form of the spreadsheet range.
//!
//! A sheet row is (parent, button, text). Rows without a parent declare
//! top-level buttons, rows with one attach a child button under it. The
//! parse is deliberately permissive: short rows are skipped and counted,
//! never fatal.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Served in place of an empty text cell.
pub const MISSING_TEXT_PLACEHOLDER: &str = "Текст не найден в Google Sheets.";

/// Labels longer than this are clipped (Telegram buttons stay readable).
const MAX_LABEL_CHARS: usize = 100;

/// The parsed menu tree plus the flat label → text map.
///
/// Replaced wholesale on every successful refresh, never mutated in place.
/// An empty tree means "content not loaded yet" and callers must say so
/// instead of rendering an empty menu.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuideTree {
    main_buttons: Vec<String>,
    submenus: HashMap<String, Vec<String>>,
    texts: HashMap<String, String>,
}

impl GuideTree {
    /// True when nothing was ever parsed into this tree.
    pub fn is_empty(&self) -> bool {
        self.main_buttons.is_empty() && self.texts.is_empty()
    }

    /// Top-level labels in sheet row order.
    pub fn main_buttons(&self) -> &[String] {
        &self.main_buttons
    }

    /// Child labels of a parent, in sheet row order.
    pub fn submenu(&self, label: &str) -> Option<&[String]> {
        self.submenus.get(label).map(Vec::as_slice)
    }

    /// Guide text for a label, if any row defined one.
    pub fn text(&self, label: &str) -> Option<&str> {
        self.texts.get(label).map(String::as_str)
    }

    /// True if the label is a declared top-level button.
    pub fn is_main_button(&self, label: &str) -> bool {
        self.main_buttons.iter().any(|b| b == label)
    }

    /// Number of guide texts.
    pub fn guide_count(&self) -> usize {
        self.texts.len()
    }

    /// Number of child labels across all submenus.
    pub fn submenu_entry_count(&self) -> usize {
        self.submenus.values().map(Vec::len).sum()
    }

    /// All labels that carry text, for callback hash resolution.
    pub fn text_labels(&self) -> impl Iterator<Item = &str> {
        self.texts.keys().map(String::as_str)
    }

    /// The parent of a child label, if the label sits in some submenu.
    pub fn parent_of(&self, label: &str) -> Option<&str> {
        self.submenus
            .iter()
            .find(|(_, children)| children.iter().any(|c| c == label))
            .map(|(parent, _)| parent.as_str())
    }
}

/// Diagnostics from one parse pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseStats {
    /// Rows seen after optional header stripping
    pub rows_total: usize,
    /// Rows dropped for having too few cells or an empty button label
    pub rows_skipped: usize,
    /// Whether the first row was recognized as a header and dropped
    pub header_stripped: bool,
}

/// Parses raw sheet rows into a [`GuideTree`].
///
/// Structure is first-write-wins (a repeated label never duplicates a
/// button), text is last-write-wins (a later row overwrites the text of
/// an earlier one). A child row whose parent was never declared creates
/// the parent as a top-level button at that point, so the content stays
/// reachable.
pub fn parse_rows(values: &[Vec<String>]) -> (GuideTree, ParseStats) {
    let mut stats = ParseStats::default();

    let rows = if is_header_row(values.first()) {
        stats.header_stripped = true;
        &values[1..]
    } else {
        values
    };
    stats.rows_total = rows.len();

    let mut tree = GuideTree::default();
    let mut seen_main: HashSet<String> = HashSet::new();

    let mut add_main = |tree: &mut GuideTree, label: &str| {
        if seen_main.insert(label.to_string()) {
            tree.main_buttons.push(label.to_string());
        }
    };

    for row in rows {
        if row.len() < 3 {
            stats.rows_skipped += 1;
            continue;
        }

        let button = clip_label(&row[1]);
        if button.is_empty() {
            stats.rows_skipped += 1;
            continue;
        }
        let parent = clip_label(&row[0]);
        let text = row[2].trim();
        let text = if text.is_empty() { MISSING_TEXT_PLACEHOLDER } else { text };

        tree.texts.insert(button.clone(), text.to_string());

        if parent.is_empty() {
            add_main(&mut tree, &button);
        } else {
            add_main(&mut tree, &parent);
            let children = tree.submenus.entry(parent).or_default();
            if !children.contains(&button) {
                children.push(button);
            }
        }
    }

    (tree, stats)
}

/// A first row with fewer than three cells, or with the literal "button"
/// in the second column, is the sheet's header and carries no content.
fn is_header_row(first: Option<&Vec<String>>) -> bool {
    match first {
        Some(row) if row.len() < 3 => true,
        Some(row) => row[1].trim().to_lowercase() == "button",
        None => false,
    }
}

fn clip_label(cell: &str) -> String {
    let trimmed = cell.trim();
    if trimmed.chars().count() > MAX_LABEL_CHARS {
        trimmed.chars().take(MAX_LABEL_CHARS).collect()
    } else {
        trimmed.to_string()
    }
}
