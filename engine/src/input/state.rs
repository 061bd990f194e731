//! Input state tracking

use std::collections::HashSet;
use tracing::trace;
use winit::event::{ElementState, MouseButton, MouseScrollDelta};

/// Pixels treated as one scroll line for touchpads reporting pixel deltas
const PIXELS_PER_LINE: f32 = 40.0;

/// Tracks the pointer state between frames
#[derive(Debug, Clone, Default)]
pub struct InputState {
    /// Mouse position in window coordinates
    pub mouse_position: (f32, f32),
    /// Mouse movement delta since last frame
    pub mouse_delta: (f32, f32),
    /// Scroll accumulated since last frame, in lines; positive scrolls away from the user
    pub scroll_delta: f32,
    /// Currently pressed mouse buttons
    pub mouse_buttons_pressed: HashSet<MouseButton>,
    has_position: bool,
}

impl InputState {
    /// Create a new empty input state
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear per-frame data (mouse and scroll deltas)
    pub fn clear_frame_data(&mut self) {
        self.mouse_delta = (0.0, 0.0);
        self.scroll_delta = 0.0;
    }

    /// Record a new cursor position and accumulate the movement since the last one
    pub fn set_mouse_position(&mut self, x: f32, y: f32) {
        if self.has_position {
            let (old_x, old_y) = self.mouse_position;
            self.add_mouse_delta(x - old_x, y - old_y);
        }
        self.mouse_position = (x, y);
        self.has_position = true;
    }

    /// Add mouse movement delta
    pub fn add_mouse_delta(&mut self, dx: f32, dy: f32) {
        self.mouse_delta.0 += dx;
        self.mouse_delta.1 += dy;
        trace!("Mouse delta: ({}, {})", dx, dy);
    }

    /// Forget the cursor position when it leaves the window
    pub fn cursor_left(&mut self) {
        self.has_position = false;
    }

    /// Accumulate a wheel event
    pub fn handle_scroll(&mut self, delta: MouseScrollDelta) {
        let lines = match delta {
            MouseScrollDelta::LineDelta(_, y) => y,
            MouseScrollDelta::PixelDelta(position) => position.y as f32 / PIXELS_PER_LINE,
        };
        self.scroll_delta += lines;
        trace!(lines, "Scroll");
    }

    /// Handle a mouse button event
    pub fn handle_mouse_button(&mut self, button: MouseButton, state: ElementState) {
        match state {
            ElementState::Pressed => {
                self.mouse_buttons_pressed.insert(button);
                trace!("Mouse button pressed: {:?}", button);
            }
            ElementState::Released => {
                self.mouse_buttons_pressed.remove(&button);
                trace!("Mouse button released: {:?}", button);
            }
        }
    }

    /// Release every button, e.g. when the window loses focus
    pub fn release_all(&mut self) {
        self.mouse_buttons_pressed.clear();
    }

    /// Check if a mouse button is currently pressed
    pub fn is_mouse_button_pressed(&self, button: MouseButton) -> bool {
        self.mouse_buttons_pressed.contains(&button)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::dpi::PhysicalPosition;

    #[test]
    fn test_input_state_mouse() {
        let mut state = InputState::new();

        // First position only establishes the reference point
        state.set_mouse_position(100.0, 200.0);
        assert_eq!(state.mouse_position, (100.0, 200.0));
        assert_eq!(state.mouse_delta, (0.0, 0.0));

        state.set_mouse_position(105.0, 197.0);
        assert_eq!(state.mouse_delta, (5.0, -3.0));

        state.clear_frame_data();
        assert_eq!(state.mouse_delta, (0.0, 0.0));

        state.handle_mouse_button(MouseButton::Left, ElementState::Pressed);
        assert!(state.is_mouse_button_pressed(MouseButton::Left));

        state.handle_mouse_button(MouseButton::Left, ElementState::Released);
        assert!(!state.is_mouse_button_pressed(MouseButton::Left));
    }

    #[test]
    fn test_cursor_reentry_does_not_jump() {
        let mut state = InputState::new();
        state.set_mouse_position(10.0, 10.0);
        state.cursor_left();
        state.set_mouse_position(500.0, 400.0);
        assert_eq!(state.mouse_delta, (0.0, 0.0));
    }

    #[test]
    fn test_scroll_accumulates_lines_and_pixels() {
        let mut state = InputState::new();
        state.handle_scroll(MouseScrollDelta::LineDelta(0.0, 1.0));
        state.handle_scroll(MouseScrollDelta::PixelDelta(PhysicalPosition::new(0.0, 80.0)));
        assert!((state.scroll_delta - 3.0).abs() < 1e-6);

        state.clear_frame_data();
        assert_eq!(state.scroll_delta, 0.0);
    }

    #[test]
    fn test_release_all_clears_buttons() {
        let mut state = InputState::new();
        state.handle_mouse_button(MouseButton::Right, ElementState::Pressed);
        state.release_all();
        assert!(!state.is_mouse_button_pressed(MouseButton::Right));
    }
}
