//! Shared chess vocabulary for the personality engine: the per-move event,
//! board geometry, move quality and SAN replay.

pub mod geometry;
pub mod move_event;
pub mod quality;
pub mod replay;

pub use move_event::{MoveEvent, MoveFlags};
pub use quality::MoveQuality;
