//! Shared types for detector-variation studies.
//!
//! Provides the geometry identifiers used across the workspace, the
//! `Geometry` collaborator trait that samplers query, a regular in-memory
//! geometry for tests and command-line runs, and the readout-chip wiring
//! table mapping (chip, channel) to (view, wire offset).

pub mod geometry;
pub mod ids;
pub mod wiring;

pub use geometry::{Geometry, RegularGeometry};
pub use ids::{ChannelId, CryostatId, PlaneId, TpcId, View, WireId};
pub use wiring::{chip_and_channel_to_wire, ChipAddress};
