//! Logical buttons and timed input scripting.
//!
//! `NesButton` names the eight pad buttons and their bit masks in the
//! controller byte. `InputQueue` holds frame-stamped press/release events
//! for scripted sequences — integration tests and headless runs drive the
//! pad with it.

use std::collections::VecDeque;

use crate::controller::Controller;

/// A joypad button and its bit in the controller byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NesButton {
    A,
    B,
    Select,
    Start,
    Up,
    Down,
    Left,
    Right,
}

impl NesButton {
    /// Bit mask of this button in the controller byte.
    #[must_use]
    pub const fn mask(self) -> u8 {
        match self {
            Self::A => 0x80,
            Self::B => 0x40,
            Self::Select => 0x20,
            Self::Start => 0x10,
            Self::Up => 0x08,
            Self::Down => 0x04,
            Self::Left => 0x02,
            Self::Right => 0x01,
        }
    }
}

/// A frame-stamped button transition.
#[derive(Debug, Clone)]
pub struct InputEvent {
    pub frame: u64,
    pub button: NesButton,
    pub pressed: bool,
}

/// Frame-ordered queue of scripted input events.
pub struct InputQueue {
    events: VecDeque<InputEvent>,
}

impl InputQueue {
    #[must_use]
    pub fn new() -> Self {
        Self { events: VecDeque::new() }
    }

    /// Insert an event, keeping the queue sorted by frame.
    pub fn push(&mut self, event: InputEvent) {
        let pos = self
            .events
            .iter()
            .position(|e| e.frame > event.frame)
            .unwrap_or(self.events.len());
        self.events.insert(pos, event);
    }

    /// Schedule a press at `at_frame` held for `hold_frames`.
    pub fn enqueue_button(&mut self, button: NesButton, at_frame: u64, hold_frames: u64) {
        self.push(InputEvent { frame: at_frame, button, pressed: true });
        self.push(InputEvent {
            frame: at_frame + hold_frames,
            button,
            pressed: false,
        });
    }

    /// Apply every event due at `frame` to the controller.
    pub fn process(&mut self, frame: u64, controller: &mut Controller) {
        while let Some(event) = self.events.front() {
            if event.frame > frame {
                break;
            }
            let event = self.events.pop_front().expect("front was Some");
            controller.set_button(event.button.mask(), event.pressed);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl Default for InputQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn button_masks_match_wire_layout() {
        assert_eq!(NesButton::A.mask(), 0x80);
        assert_eq!(NesButton::B.mask(), 0x40);
        assert_eq!(NesButton::Select.mask(), 0x20);
        assert_eq!(NesButton::Start.mask(), 0x10);
        assert_eq!(NesButton::Up.mask(), 0x08);
        assert_eq!(NesButton::Down.mask(), 0x04);
        assert_eq!(NesButton::Left.mask(), 0x02);
        assert_eq!(NesButton::Right.mask(), 0x01);
    }

    #[test]
    fn queue_applies_events_in_frame_order() {
        let mut queue = InputQueue::new();
        let mut pad = Controller::new();
        queue.enqueue_button(NesButton::A, 5, 3);

        queue.process(4, &mut pad);
        assert_eq!(pad.buttons() & 0x80, 0);
        queue.process(5, &mut pad);
        assert_eq!(pad.buttons() & 0x80, 0x80);
        queue.process(8, &mut pad);
        assert_eq!(pad.buttons() & 0x80, 0);
        assert!(queue.is_empty());
    }

    #[test]
    fn out_of_order_pushes_sort_by_frame() {
        let mut queue = InputQueue::new();
        queue.push(InputEvent { frame: 9, button: NesButton::B, pressed: true });
        queue.push(InputEvent { frame: 2, button: NesButton::A, pressed: true });
        let mut pad = Controller::new();
        queue.process(2, &mut pad);
        assert_eq!(pad.buttons(), NesButton::A.mask());
        assert_eq!(queue.len(), 1);
    }
}
