//! Pointer input tracking for the orbit controls

pub mod state;

pub use state::InputState;
