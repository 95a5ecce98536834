//! Common imports for users of the crate.

pub use bevy::prelude::*;

pub use crate::SimSet;
pub use crate::avoidance::{AvoidanceAgent, AvoidanceConfig, OrcaSolver, PreferredVelocity};
pub use crate::obstacles::{ObstacleError, ObstacleShape, Obstacles};
pub use crate::steering::{Goal, SteeringConfig};
