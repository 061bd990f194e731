//! Scene graph built on the entity-component store
//!
//! This module provides the node components, the world wrapper with
//! subtree attachment and depth-first traversal, and transform propagation.

pub mod components;
pub mod hierarchy;
pub mod subtree;
pub mod world;

// Re-export commonly used types
pub use components::{Children, GlobalTransform, Name, Parent, SceneRoot, Transform};
pub use hierarchy::{update_hierarchy_system, validate_hierarchy_system};
pub use subtree::{SceneNode, Subtree};
pub use world::{Traverse, World};

// Re-export hecs types that users will need
pub use hecs::Entity;
