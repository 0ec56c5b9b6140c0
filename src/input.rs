//! Pointer and touch normalisation.
//!
//! winit reports the mouse as a cursor position plus button transitions, and
//! touch as per-finger phases. [`InputAdapter`] folds both into
//! [`PointerEvent`]s so the drag controller sees one press/move/release stream.

use crate::geometry::Point;
use smallvec::SmallVec;
use winit::event::{ElementState, MouseButton, TouchPhase, WindowEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerId {
    Mouse,
    Touch(u64),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down { pointer: PointerId, at: Point },
    Move { pointer: PointerId, at: Point },
    Up { pointer: PointerId, at: Point },
    /// A second finger touched down while another was already on the glass.
    MultiTouch,
}

/// Stateful translator from window events to pointer events.
#[derive(Debug, Default)]
pub struct InputAdapter {
    cursor: Point,
    mouse_down: bool,
    /// Fingers currently down, first one is the primary
    touches: SmallVec<[u64; 4]>,
}

impl InputAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn translate(&mut self, event: &WindowEvent) -> Option<PointerEvent> {
        match event {
            WindowEvent::CursorMoved { position, .. } => self.cursor_moved((*position).into()),
            WindowEvent::MouseInput { state, button, .. } => self.mouse_button(*state, *button),
            WindowEvent::Touch(touch) => self.touch(touch.phase, touch.id, touch.location.into()),
            _ => None,
        }
    }

    pub fn cursor_moved(&mut self, at: Point) -> Option<PointerEvent> {
        self.cursor = at;
        Some(PointerEvent::Move {
            pointer: PointerId::Mouse,
            at,
        })
    }

    /// Only the left button drags.
    pub fn mouse_button(&mut self, state: ElementState, button: MouseButton) -> Option<PointerEvent> {
        if button != MouseButton::Left {
            return None;
        }
        let pointer = PointerId::Mouse;
        let at = self.cursor;
        match state {
            ElementState::Pressed if !self.mouse_down => {
                self.mouse_down = true;
                Some(PointerEvent::Down { pointer, at })
            }
            ElementState::Released if self.mouse_down => {
                self.mouse_down = false;
                Some(PointerEvent::Up { pointer, at })
            }
            _ => None,
        }
    }

    pub fn touch(&mut self, phase: TouchPhase, id: u64, at: Point) -> Option<PointerEvent> {
        let primary = self.touches.first().copied();
        match phase {
            TouchPhase::Started => {
                self.touches.push(id);
                if primary.is_some() {
                    Some(PointerEvent::MultiTouch)
                } else {
                    Some(PointerEvent::Down {
                        pointer: PointerId::Touch(id),
                        at,
                    })
                }
            }
            TouchPhase::Moved if primary == Some(id) => Some(PointerEvent::Move {
                pointer: PointerId::Touch(id),
                at,
            }),
            TouchPhase::Moved => None,
            // a cancelled touch is released where it was last seen
            TouchPhase::Ended | TouchPhase::Cancelled => {
                self.touches.retain(|t| *t != id);
                (primary == Some(id)).then_some(PointerEvent::Up {
                    pointer: PointerId::Touch(id),
                    at,
                })
            }
        }
    }
}
