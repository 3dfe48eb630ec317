//! Geometry and readout identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Wire orientation within a TPC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum View {
    U,
    V,
    W,
}

impl View {
    pub const ALL: [View; 3] = [View::U, View::V, View::W];

    /// Position of this view in `View::ALL`.
    pub fn index(self) -> usize {
        match self {
            View::U => 0,
            View::V => 1,
            View::W => 2,
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            View::U => write!(f, "U"),
            View::V => write!(f, "V"),
            View::W => write!(f, "W"),
        }
    }
}

/// Readout channel number. Several wires may share one channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelId(pub u32);

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CryostatId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TpcId {
    pub cryostat: CryostatId,
    pub tpc: u32,
}

impl TpcId {
    pub fn new(cryostat: CryostatId, tpc: u32) -> Self {
        TpcId { cryostat, tpc }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlaneId {
    pub tpc: TpcId,
    pub plane: u32,
}

impl PlaneId {
    pub fn new(tpc: TpcId, plane: u32) -> Self {
        PlaneId { tpc, plane }
    }
}

/// A physical wire: its plane plus the wire index within that plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WireId {
    pub plane: PlaneId,
    pub wire: u32,
}

impl WireId {
    pub fn new(plane: PlaneId, wire: u32) -> Self {
        WireId { plane, wire }
    }
}

impl fmt::Display for WireId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "C:{} T:{} P:{} W:{}",
            self.plane.tpc.cryostat.0, self.plane.tpc.tpc, self.plane.plane, self.wire
        )
    }
}
