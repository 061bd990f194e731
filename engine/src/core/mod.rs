//! Core scene types: entities, camera, orbit controls and lights

pub mod camera;
pub mod controls;
pub mod entity;
pub mod light;
