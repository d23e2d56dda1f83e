//! Gesture classification from the number of active contacts.

use serde::{Deserialize, Serialize};

/// Interpretation of the current set of contacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GestureState {
    #[default]
    None,
    SingleDraw,
    MultiTouch,
}

/// What a change of gesture state means for the active stroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureTransition {
    /// Nothing to do.
    Unchanged,
    /// A stroke starts with the first contact.
    StrokeBegin,
    /// The in-progress stroke is finalized at once; a gesture takes over.
    StrokeAbort,
    /// The in-progress stroke finishes normally.
    StrokeEnd,
    /// A multi-touch gesture started without a stroke in progress.
    GestureBegin,
    /// A multi-touch gesture finished.
    GestureEnd,
}

/// Classify an active contact count.
///
/// With multi-touch disabled, extra contacts never leave `SingleDraw`.
pub fn classify(active_contacts: usize, enable_multi_touch: bool) -> GestureState {
    match active_contacts {
        0 => GestureState::None,
        1 => GestureState::SingleDraw,
        _ if enable_multi_touch => GestureState::MultiTouch,
        _ => GestureState::SingleDraw,
    }
}

/// Stroke lifecycle consequence of moving from `from` to `to`.
///
/// There is no debouncing: a contact count flickering between 1 and 2 aborts
/// and restarts on every oscillation.
pub fn transition(from: GestureState, to: GestureState) -> GestureTransition {
    use GestureState::*;

    match (from, to) {
        (None, SingleDraw) => GestureTransition::StrokeBegin,
        (SingleDraw, MultiTouch) => GestureTransition::StrokeAbort,
        (None, MultiTouch) => GestureTransition::GestureBegin,
        (SingleDraw, None) => GestureTransition::StrokeEnd,
        (MultiTouch, None) | (MultiTouch, SingleDraw) => GestureTransition::GestureEnd,
        _ => GestureTransition::Unchanged,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_counts() {
        assert_eq!(classify(0, true), GestureState::None);
        assert_eq!(classify(1, true), GestureState::SingleDraw);
        assert_eq!(classify(2, true), GestureState::MultiTouch);
        assert_eq!(classify(5, true), GestureState::MultiTouch);
    }

    #[test]
    fn test_multi_touch_disabled() {
        assert_eq!(classify(2, false), GestureState::SingleDraw);
        assert_eq!(classify(3, false), GestureState::SingleDraw);
        assert_eq!(classify(0, false), GestureState::None);
    }

    #[test]
    fn test_transitions() {
        use GestureState::*;

        assert_eq!(transition(None, SingleDraw), GestureTransition::StrokeBegin);
        assert_eq!(transition(SingleDraw, MultiTouch), GestureTransition::StrokeAbort);
        assert_eq!(transition(SingleDraw, None), GestureTransition::StrokeEnd);
        assert_eq!(transition(MultiTouch, None), GestureTransition::GestureEnd);
        assert_eq!(transition(SingleDraw, SingleDraw), GestureTransition::Unchanged);
        assert_eq!(transition(MultiTouch, MultiTouch), GestureTransition::Unchanged);
    }
}
