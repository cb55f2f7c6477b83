//! impulse2d: fixed-timestep 2D rigid bodies (spatial-hash broad phase, SAT
//! narrow phase, sequential impulses with positional correction)

pub mod error;
pub mod types;
pub mod api;
pub mod shape;
pub mod body;
pub mod spatial_hash;
pub mod narrowphase;
pub mod manifold;
pub mod world;

pub use crate::types::*;
pub use crate::api::*;
pub use crate::error::{PhysicsError, Result};
pub use crate::body::{BodyDesc, Rigidbody};
pub use crate::shape::{Polygon, Shape, ShapeKind};
pub use crate::spatial_hash::{GridStats, SpatialHash};
pub use crate::manifold::{ContactPoint, Manifold};
pub use crate::narrowphase::Narrowphase;
pub use crate::world::PhysicsWorld;
