//! Scene-side types the planner consumes.

mod camera;

pub use camera::{Camera, Projection};
