//! Geometry collaborator interface and a regular in-memory implementation.

use std::ops::Range;

use crate::ids::{ChannelId, CryostatId, PlaneId, TpcId, View, WireId};

/// What a bad-channel sampler needs to know about the detector.
///
/// Implementations must enumerate in a stable order: samplers index into
/// these lists with random draws, so a reordering changes which channels a
/// given seed knocks out.
pub trait Geometry {
    /// Every wire in the detector.
    fn wire_ids(&self) -> Vec<WireId>;

    /// Channel read out by `wire`, or `None` if the plane has no such wire.
    fn channel_of(&self, wire: WireId) -> Option<ChannelId>;

    /// Valid cryostat numbers.
    fn cryostats(&self) -> Range<u32>;

    /// Valid TPC numbers within `cryostat`.
    fn tpcs(&self, cryostat: CryostatId) -> Range<u32>;

    /// Every wire in one TPC.
    fn tpc_wire_ids(&self, tpc: TpcId) -> Vec<WireId>;

    /// Every plane in one TPC.
    fn plane_ids(&self, tpc: TpcId) -> Vec<PlaneId>;

    fn view(&self, plane: PlaneId) -> View;

    /// Index of the first wire in `plane`.
    fn first_wire(&self, plane: PlaneId) -> u32;

    /// Every TPC in the detector, cryostat-major.
    fn tpc_ids(&self) -> Vec<TpcId> {
        self.cryostats()
            .flat_map(|c| {
                let cryostat = CryostatId(c);
                self.tpcs(cryostat).map(move |t| TpcId::new(cryostat, t))
            })
            .collect()
    }
}

/// A detector of identical TPCs, each with one U, V and W plane.
///
/// Channels are numbered per readout group. Without `shared_induction` each
/// TPC is its own group. With it, consecutive TPC pairs (0,1), (2,3), ... form
/// one group whose U and V wires share channels, while each TPC keeps its own
/// W channels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegularGeometry {
    pub cryostats: u32,
    pub tpcs_per_cryostat: u32,
    /// Wire count per plane, indexed by `View::index()`.
    pub wires_per_plane: [u32; 3],
    pub shared_induction: bool,
}

impl RegularGeometry {
    pub fn new(cryostats: u32, tpcs_per_cryostat: u32, wires_per_plane: [u32; 3]) -> Self {
        RegularGeometry {
            cryostats,
            tpcs_per_cryostat,
            wires_per_plane,
            shared_induction: false,
        }
    }

    pub fn with_shared_induction(mut self, shared: bool) -> Self {
        self.shared_induction = shared;
        self
    }

    fn tpcs_per_group(&self) -> u32 {
        if self.shared_induction {
            2
        } else {
            1
        }
    }

    fn groups_per_cryostat(&self) -> u32 {
        let per = self.tpcs_per_group();
        (self.tpcs_per_cryostat + per - 1) / per
    }

    /// Channels allotted to one readout group.
    fn group_stride(&self) -> u32 {
        let [u, v, w] = self.wires_per_plane;
        u + v + self.tpcs_per_group() * w
    }

    fn contains_tpc(&self, tpc: TpcId) -> bool {
        tpc.cryostat.0 < self.cryostats && tpc.tpc < self.tpcs_per_cryostat
    }

    fn contains_plane(&self, plane: PlaneId) -> bool {
        self.contains_tpc(plane.tpc) && (plane.plane as usize) < View::ALL.len()
    }

    /// Number of distinct channels in the detector.
    pub fn num_channels(&self) -> u32 {
        if self.tpcs_per_cryostat == 0 {
            return 0;
        }
        let [u, v, w] = self.wires_per_plane;
        let mut per_cryostat = self.tpcs_per_cryostat * w;
        per_cryostat += self.groups_per_cryostat() * (u + v);
        self.cryostats * per_cryostat
    }
}

impl Geometry for RegularGeometry {
    fn wire_ids(&self) -> Vec<WireId> {
        self.tpc_ids()
            .into_iter()
            .flat_map(|tpc| self.tpc_wire_ids(tpc))
            .collect()
    }

    fn channel_of(&self, wire: WireId) -> Option<ChannelId> {
        let plane = wire.plane;
        if !self.contains_plane(plane) {
            return None;
        }
        let view = View::ALL[plane.plane as usize];
        let [u, v, w] = self.wires_per_plane;
        if wire.wire >= self.wires_per_plane[view.index()] {
            return None;
        }

        let per = self.tpcs_per_group();
        let tpc = plane.tpc;
        let group = tpc.cryostat.0 * self.groups_per_cryostat() + tpc.tpc / per;
        let side = tpc.tpc % per;
        let base = group * self.group_stride();

        let channel = match view {
            View::U => base + wire.wire,
            View::V => base + u + wire.wire,
            View::W => base + u + v + side * w + wire.wire,
        };
        Some(ChannelId(channel))
    }

    fn cryostats(&self) -> Range<u32> {
        0..self.cryostats
    }

    fn tpcs(&self, cryostat: CryostatId) -> Range<u32> {
        if cryostat.0 < self.cryostats {
            0..self.tpcs_per_cryostat
        } else {
            0..0
        }
    }

    fn tpc_wire_ids(&self, tpc: TpcId) -> Vec<WireId> {
        self.plane_ids(tpc)
            .into_iter()
            .flat_map(|plane| {
                let n = self.wires_per_plane[plane.plane as usize];
                (0..n).map(move |w| WireId::new(plane, w))
            })
            .collect()
    }

    fn plane_ids(&self, tpc: TpcId) -> Vec<PlaneId> {
        if !self.contains_tpc(tpc) {
            return Vec::new();
        }
        (0..View::ALL.len() as u32).map(|p| PlaneId::new(tpc, p)).collect()
    }

    fn view(&self, plane: PlaneId) -> View {
        View::ALL[plane.plane as usize % View::ALL.len()]
    }

    fn first_wire(&self, _plane: PlaneId) -> u32 {
        0
    }
}
