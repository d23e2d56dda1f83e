//! Tracking of simultaneously active contacts.

use kurbo::Point;
use std::collections::HashMap;

/// Active contacts keyed by id, in the order they went down.
#[derive(Debug, Clone, Default)]
pub struct ContactTracker {
    /// Last known backing-space position of each active contact.
    positions: HashMap<u64, Point>,
    /// Contact ids in touch-down order.
    order: Vec<u64>,
}

impl ContactTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a contact going down.
    ///
    /// Returns `false` for an id that is already active; its position is
    /// refreshed but the count does not change.
    pub fn press(&mut self, id: u64, position: Point) -> bool {
        if self.positions.insert(id, position).is_some() {
            return false;
        }
        self.order.push(id);
        true
    }

    /// Update the position of an active contact. Unknown ids are ignored.
    pub fn update(&mut self, id: u64, position: Point) -> bool {
        match self.positions.get_mut(&id) {
            Some(p) => {
                *p = position;
                true
            }
            None => false,
        }
    }

    /// Remove a contact. Returns `false` for unknown ids.
    pub fn release(&mut self, id: u64) -> bool {
        if self.positions.remove(&id).is_none() {
            return false;
        }
        self.order.retain(|&other| other != id);
        true
    }

    /// Forget every contact.
    pub fn clear(&mut self) {
        self.positions.clear();
        self.order.clear();
    }

    /// Number of active contacts.
    pub fn active_count(&self) -> usize {
        self.order.len()
    }

    /// Whether the contact is active.
    pub fn contains(&self, id: u64) -> bool {
        self.positions.contains_key(&id)
    }

    /// Last known position of a contact.
    pub fn position(&self, id: u64) -> Option<Point> {
        self.positions.get(&id).copied()
    }

    /// The oldest active contact.
    pub fn first(&self) -> Option<u64> {
        self.order.first().copied()
    }

    /// Positions of the two oldest active contacts.
    pub fn first_two_positions(&self) -> Option<[Point; 2]> {
        match self.order.as_slice() {
            [a, b, ..] => Some([self.positions[a], self.positions[b]]),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_press_and_release() {
        let mut tracker = ContactTracker::new();

        assert!(tracker.press(1, Point::new(10.0, 10.0)));
        assert!(tracker.press(2, Point::new(20.0, 20.0)));
        assert_eq!(tracker.active_count(), 2);
        assert_eq!(tracker.first(), Some(1));

        assert!(tracker.release(1));
        assert_eq!(tracker.active_count(), 1);
        assert_eq!(tracker.first(), Some(2));
    }

    #[test]
    fn test_duplicate_press_keeps_count() {
        let mut tracker = ContactTracker::new();

        tracker.press(7, Point::new(0.0, 0.0));
        assert!(!tracker.press(7, Point::new(5.0, 5.0)));
        assert_eq!(tracker.active_count(), 1);
        assert_eq!(tracker.position(7), Some(Point::new(5.0, 5.0)));
    }

    #[test]
    fn test_unknown_ids_ignored() {
        let mut tracker = ContactTracker::new();

        assert!(!tracker.update(9, Point::ZERO));
        assert!(!tracker.release(9));
        assert_eq!(tracker.active_count(), 0);
    }

    #[test]
    fn test_first_two_positions() {
        let mut tracker = ContactTracker::new();

        tracker.press(1, Point::new(1.0, 1.0));
        assert!(tracker.first_two_positions().is_none());

        tracker.press(2, Point::new(2.0, 2.0));
        tracker.update(2, Point::new(3.0, 3.0));
        assert_eq!(
            tracker.first_two_positions(),
            Some([Point::new(1.0, 1.0), Point::new(3.0, 3.0)])
        );

        tracker.clear();
        assert_eq!(tracker.active_count(), 0);
    }
}
