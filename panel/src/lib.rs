//! ImGui debug panel for the environment-map viewer
//!
//! The panel draws one widget per registered parameter binding and hands the
//! resulting edits back to the engine, which applies them to the scene.

pub mod controls;
pub mod debug_panel;

pub use debug_panel::DebugPanel;
