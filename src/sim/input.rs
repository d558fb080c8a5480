//! Player input
//!
//! Frontends translate their keyboard/pointer events into `InputEvent`s and
//! push them onto the session. Events are buffered only while input is
//! attached (between `start()` and `stop()`) and applied at the top of the
//! next `update`.

use std::collections::VecDeque;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::flipper::{FlipperAction, FlipperSide};
use super::session::Session;
use crate::consts::KEY_LAUNCH_POWER;

/// Logical keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    Left,
    Right,
    Launch,
    Reset,
    Debug,
}

impl Key {
    /// Map a DOM-style key name onto a logical key
    pub fn from_key_name(name: &str) -> Option<Self> {
        match name {
            "ArrowLeft" | "a" | "A" | "z" | "Z" => Some(Key::Left),
            "ArrowRight" | "d" | "D" | "/" => Some(Key::Right),
            " " | "Space" | "Enter" => Some(Key::Launch),
            "r" | "R" => Some(Key::Reset),
            "F1" | "`" => Some(Key::Debug),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum InputEvent {
    KeyDown(Key),
    KeyUp(Key),
    /// Pointer position in table units
    PointerDown(Vec2),
    PointerMove(Vec2),
    PointerUp,
}

/// Buffered input between frames
#[derive(Debug, Clone, Default)]
pub struct InputQueue {
    attached: bool,
    events: VecDeque<InputEvent>,
}

impl InputQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&mut self) {
        self.attached = true;
    }

    /// Stop accepting input and drop anything buffered
    pub fn detach(&mut self) {
        self.attached = false;
        self.events.clear();
    }

    #[inline]
    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Buffer an event; returns false when detached
    pub fn push(&mut self, event: InputEvent) -> bool {
        if !self.attached {
            return false;
        }
        self.events.push_back(event);
        true
    }

    pub fn drain(&mut self) -> Vec<InputEvent> {
        self.events.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl Session {
    /// Buffer an input event for the next update
    pub fn push_input(&mut self, event: InputEvent) -> bool {
        self.input.push(event)
    }

    /// Apply one input event immediately
    pub fn handle_input(&mut self, event: InputEvent) {
        match event {
            InputEvent::KeyDown(key) => {
                if !self.game.is_playing() {
                    return;
                }
                match key {
                    Key::Left => self.control_flipper(FlipperSide::Left, FlipperAction::Down),
                    Key::Right => self.control_flipper(FlipperSide::Right, FlipperAction::Down),
                    Key::Launch => {
                        if !self.ball.is_launched {
                            self.launch_ball_with_power(KEY_LAUNCH_POWER);
                        }
                    }
                    Key::Reset => self.reset_ball(),
                    Key::Debug => self.toggle_debug(),
                }
            }
            InputEvent::KeyUp(Key::Left) => self.control_flipper(FlipperSide::Left, FlipperAction::Up),
            InputEvent::KeyUp(Key::Right) => self.control_flipper(FlipperSide::Right, FlipperAction::Up),
            InputEvent::KeyUp(_) => {}
            InputEvent::PointerDown(at) => self.start_drag(at.x, at.y),
            InputEvent::PointerMove(at) => self.update_drag(at.x, at.y),
            InputEvent::PointerUp => self.end_drag(),
        }
    }

    /// Apply everything buffered since the last frame, in arrival order
    pub(crate) fn process_input(&mut self) {
        for event in self.input.drain() {
            self.handle_input(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;

    #[test]
    fn test_key_names() {
        assert_eq!(Key::from_key_name("ArrowLeft"), Some(Key::Left));
        assert_eq!(Key::from_key_name(" "), Some(Key::Launch));
        assert_eq!(Key::from_key_name("q"), None);
    }

    #[test]
    fn test_queue_requires_attach() {
        let mut queue = InputQueue::new();
        assert!(!queue.push(InputEvent::PointerUp));
        queue.attach();
        assert!(queue.push(InputEvent::PointerUp));
        assert_eq!(queue.len(), 1);
        queue.detach();
        assert!(queue.is_empty());
    }

    #[test]
    fn test_keys_ignored_before_start() {
        let mut session = Session::new(Settings::default());
        session.handle_input(InputEvent::KeyDown(Key::Left));
        session.handle_input(InputEvent::KeyDown(Key::Launch));
        assert!(!session.left_flipper().is_pressed);
        assert!(!session.ball().is_launched);
        assert!(!session.push_input(InputEvent::KeyDown(Key::Left)));
    }

    #[test]
    fn test_queued_keys_apply_on_update() {
        let mut session = Session::new(Settings::default());
        session.start();
        assert!(session.push_input(InputEvent::KeyDown(Key::Right)));
        assert!(session.push_input(InputEvent::KeyDown(Key::Launch)));
        assert!(!session.right_flipper().is_pressed);

        session.update(Some(1000.0));
        assert!(session.right_flipper().is_pressed);
        assert!(session.ball().is_launched);

        session.push_input(InputEvent::KeyUp(Key::Right));
        session.update(Some(1016.0));
        assert!(!session.right_flipper().is_pressed);
    }

    #[test]
    fn test_pointer_drag_launches() {
        let mut session = Session::new(Settings::default());
        session.start();
        session.handle_input(InputEvent::PointerDown(Vec2::new(560.0, 600.0)));
        session.handle_input(InputEvent::PointerMove(Vec2::new(560.0, 708.0)));
        assert_eq!(session.launcher().power, 1.0);
        session.handle_input(InputEvent::PointerUp);
        assert!(session.ball().is_launched);
        assert!(!session.launcher().is_dragging);
    }

    #[test]
    fn test_stop_detaches() {
        let mut session = Session::new(Settings::default());
        session.start();
        session.push_input(InputEvent::KeyDown(Key::Left));
        session.stop();
        assert!(!session.push_input(InputEvent::KeyDown(Key::Left)));
        session.update(Some(0.0));
        assert!(!session.left_flipper().is_pressed);
    }
}
