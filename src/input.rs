use std::collections::{HashSet, VecDeque};

use crate::light::Direction;

/// Keys the demo reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Escape,
    W,
    A,
    S,
    D,
}

impl Key {
    /// Light movement bound to this key, if any.
    pub fn light_direction(self) -> Option<Direction> {
        match self {
            Key::W => Some(Direction::Forward),
            Key::S => Some(Direction::Backward),
            Key::A => Some(Direction::Left),
            Key::D => Some(Direction::Right),
            Key::Escape => None,
        }
    }
}

/// Platform-neutral input produced by the host and drained once per frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    KeyPressed(Key),
    KeyReleased(Key),
    /// Cursor position in window pixels (y grows downward).
    CursorMoved { x: f64, y: f64 },
    Scroll { dx: f32, dy: f32 },
    Resized { width: u32, height: u32 },
    CloseRequested,
}

/// FIFO of input events collected between two frames.
#[derive(Debug, Default)]
pub struct EventQueue {
    events: VecDeque<InputEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: InputEvent) {
        self.events.push_back(event);
    }

    pub fn drain(&mut self) -> impl Iterator<Item = InputEvent> + '_ {
        self.events.drain(..)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl Extend<InputEvent> for EventQueue {
    fn extend<T: IntoIterator<Item = InputEvent>>(&mut self, iter: T) {
        self.events.extend(iter);
    }
}

/// Keys currently held down.
#[derive(Debug, Default)]
pub struct KeyState {
    held: HashSet<Key>,
}

impl KeyState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_key_down(&mut self, key: Key) {
        self.held.insert(key);
    }

    pub fn set_key_up(&mut self, key: Key) {
        self.held.remove(&key);
    }

    pub fn is_key_down(&self, key: Key) -> bool {
        self.held.contains(&key)
    }
}

/// Turns absolute cursor positions into look offsets.
///
/// The first sample only seeds the reference point so the camera does not
/// jump when the cursor is first captured.
#[derive(Debug, Clone, PartialEq)]
pub struct MouseTracker {
    last_x: f32,
    last_y: f32,
    first_mouse: bool,
}

impl MouseTracker {
    pub fn new(center_x: f32, center_y: f32) -> Self {
        Self {
            last_x: center_x,
            last_y: center_y,
            first_mouse: true,
        }
    }

    /// Returns `(x_offset, y_offset)` with y reversed so that moving up is
    /// positive.
    pub fn offset(&mut self, x: f32, y: f32) -> (f32, f32) {
        if self.first_mouse {
            self.last_x = x;
            self.last_y = y;
            self.first_mouse = false;
        }

        let x_offset = x - self.last_x;
        let y_offset = self.last_y - y;
        self.last_x = x;
        self.last_y = y;
        (x_offset, y_offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn movement_keys_map_to_directions() {
        assert_eq!(Key::W.light_direction(), Some(Direction::Forward));
        assert_eq!(Key::S.light_direction(), Some(Direction::Backward));
        assert_eq!(Key::A.light_direction(), Some(Direction::Left));
        assert_eq!(Key::D.light_direction(), Some(Direction::Right));
        assert_eq!(Key::Escape.light_direction(), None);
    }

    #[test]
    fn queue_drains_in_order() {
        let mut queue = EventQueue::new();
        queue.push(InputEvent::KeyPressed(Key::W));
        queue.push(InputEvent::CursorMoved { x: 1.0, y: 2.0 });
        queue.push(InputEvent::CloseRequested);
        let drained: Vec<_> = queue.drain().collect();
        assert_eq!(
            drained,
            vec![
                InputEvent::KeyPressed(Key::W),
                InputEvent::CursorMoved { x: 1.0, y: 2.0 },
                InputEvent::CloseRequested,
            ]
        );
        assert!(queue.is_empty());
    }

    #[test]
    fn key_state_tracks_presses() {
        let mut keys = KeyState::new();
        keys.set_key_down(Key::A);
        assert!(keys.is_key_down(Key::A));
        keys.set_key_up(Key::A);
        assert!(!keys.is_key_down(Key::A));
    }

    #[test]
    fn first_mouse_sample_has_no_offset() {
        let mut tracker = MouseTracker::new(960.0, 540.0);
        assert_eq!(tracker.offset(100.0, 300.0), (0.0, 0.0));
        assert_eq!(tracker.offset(110.0, 290.0), (10.0, 10.0));
        assert_eq!(tracker.offset(105.0, 300.0), (-5.0, -10.0));
    }
}
