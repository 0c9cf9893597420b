//! Type definitions for the list picker and its UI state.

/// Direction to cycle through entries in the picker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CycleDirection {
    Up,
    Down,
}

/// State for the picker viewport.
///
/// Tracks the visible portion of the list when there are more entries than fit
/// on screen.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ViewportState {
    pub offset: usize,
    pub height: u16,
    pub width: u16,
}

/// Complete UI state for the picker.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct UiState {
    /// Position of the highlighted entry among the visible ones
    pub selected_index: usize,
    /// Viewport state for scrolling
    pub viewport: ViewportState,
    /// Whether the user is currently filtering
    pub is_filtering: bool,
    /// Current filter text
    pub filter_text: String,
}

impl UiState {
    #[must_use]
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            selected_index: 0,
            viewport: ViewportState {
                offset: 0,
                // Header and filter line
                height: height.saturating_sub(2),
                width,
            },
            is_filtering: false,
            filter_text: String::new(),
        }
    }
}

/// What a key press asks the picker to do.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum KeyAction {
    /// Pick the entry at this position in the full list.
    Pick(usize),
    Cancel,
    Update(UiState),
    Move(CycleDirection),
    Bell,
    Ignore,
}

/// A line of the picker: the text matched by the filter and shown to the user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PickerEntry {
    pub label: String,
    pub description: Option<String>,
}

impl PickerEntry {
    pub fn new(label: impl Into<String>, description: Option<&str>) -> Self {
        Self {
            label: label.into(),
            description: description.map(ToString::to_string),
        }
    }
}

impl std::fmt::Display for PickerEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.description {
            Some(description) if !description.is_empty() => {
                write!(f, "{} ({description})", self.label)
            }
            _ => f.write_str(&self.label),
        }
    }
}
