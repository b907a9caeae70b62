//! Tag Selection
//!
//! State behind the post composer's tag picker. The picker shows every tag
//! in `tags`; only those in `enabled_tags` can be selected. The selection
//! keeps the order in which tags were picked and becomes the post's
//! industry label via [`TagSelection::industry`].

use serde::Serialize;

use crate::scope::Disposable;
use crate::state::StateCell;

/// Tags offered by default
pub const DEFAULT_TAGS: [&str; 9] = [
    "Future owner",
    "Part-timer/Staff",
    "Customer",
    "Concerns",
    "Info",
    "Questions/Advice",
    "Review",
    "New owner",
    "Veteran owner",
];

/// How many of [`DEFAULT_TAGS`], from the front, are selectable
const DEFAULT_ENABLED: usize = 7;

/// Published tag picker state
///
/// Invariant: every selected tag is enabled, and none is selected twice.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TagSelectionState {
    /// Every tag shown
    pub tags: Vec<String>,
    /// Tags that may be selected
    pub enabled_tags: Vec<String>,
    /// Selected tags, in the order they were picked
    pub selected_tags: Vec<String>,
}

impl TagSelectionState {
    /// Whether `tag` is currently selected
    #[must_use]
    pub fn is_selected(&self, tag: &str) -> bool {
        self.selected_tags.iter().any(|t| t == tag)
    }

    /// Whether `tag` may be selected
    #[must_use]
    pub fn is_enabled(&self, tag: &str) -> bool {
        self.enabled_tags.iter().any(|t| t == tag)
    }
}

/// The tag picker state holder
pub struct TagSelection {
    state: StateCell<TagSelectionState>,
}

impl Default for TagSelection {
    fn default() -> Self {
        Self::new()
    }
}

impl TagSelection {
    /// Picker over [`DEFAULT_TAGS`] with nothing selected
    #[must_use]
    pub fn new() -> Self {
        Self::with_tags(
            DEFAULT_TAGS.iter().map(ToString::to_string).collect(),
            DEFAULT_TAGS[..DEFAULT_ENABLED]
                .iter()
                .map(ToString::to_string)
                .collect(),
        )
    }

    /// Picker over the given tags with nothing selected
    #[must_use]
    pub fn with_tags(tags: Vec<String>, enabled_tags: Vec<String>) -> Self {
        Self {
            state: StateCell::new(TagSelectionState {
                tags,
                enabled_tags,
                selected_tags: Vec::new(),
            }),
        }
    }

    /// Current state
    pub fn state(&self) -> TagSelectionState {
        self.state.snapshot()
    }

    /// Subscribe to state changes
    pub fn subscribe(&self) -> tokio::sync::watch::Receiver<TagSelectionState> {
        self.state.subscribe()
    }

    /// Select `tag`, or deselect it if already selected
    ///
    /// Disabled and unknown tags are ignored.
    pub fn toggle_tag(&self, tag: &str) {
        let changed = self.state.update_if(|s| {
            if !s.is_enabled(tag) {
                return false;
            }
            if let Some(pos) = s.selected_tags.iter().position(|t| t == tag) {
                s.selected_tags.remove(pos);
            } else {
                s.selected_tags.push(tag.to_string());
            }
            true
        });
        if !changed {
            tracing::debug!(tag, "Ignored toggle of a disabled tag");
        }
    }

    /// Deselect everything
    pub fn clear_selection(&self) {
        self.state.update_if(|s| {
            if s.selected_tags.is_empty() {
                return false;
            }
            s.selected_tags.clear();
            true
        });
    }

    /// Replace the offered tags; the selection is cleared
    pub fn set_tags(&self, tags: Vec<String>, enabled_tags: Vec<String>) {
        self.state.update(|s| {
            s.tags = tags;
            s.enabled_tags = enabled_tags;
            s.selected_tags.clear();
        });
    }

    /// The selection as a post industry label, tags joined by `", "`
    pub fn industry(&self) -> String {
        self.state.read(|s| s.selected_tags.join(", "))
    }
}

impl Disposable for TagSelection {
    fn dispose(&self) {
        self.state.dispose();
    }
}
