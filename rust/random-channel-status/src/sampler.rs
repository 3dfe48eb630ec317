//! Exact-count bad-channel sampling.
//!
//! The sampler builds the channel universe from the geometry, then keeps
//! drawing random entities (a channel, a whole TPC, or one readout chip in a
//! TPC) and marking every channel they expand to as bad, until the bad set
//! holds `floor(fraction * N)` channels. Drawing a fixed count instead of
//! flipping a coin per channel keeps repeated studies at the same fraction
//! from fluctuating in size.
//!
//! TPC and chip draws add whole batches, so those modes can end slightly
//! above the target. The overshoot is kept.

use rand::Rng;
use std::collections::BTreeSet;

use detvar_core::wiring::{ChipAddress, NUM_CHIPS};
use detvar_core::{ChannelId, CryostatId, Geometry, TpcId, WireId};

use crate::config::{Mode, SamplingConfig};

/// Errors raised before any random draw is made.
#[derive(Debug, thiserror::Error)]
pub enum SampleError {
    #[error("target of {target} bad channels exceeds the {reachable} channels reachable in {mode} mode")]
    UnreachableTarget {
        mode: Mode,
        target: usize,
        reachable: usize,
    },
}

/// Every distinct channel reachable from the geometry's wires, sorted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelUniverse {
    channels: Vec<ChannelId>,
}

impl ChannelUniverse {
    /// The geometry has no channel iterator, so walk the wires and collapse
    /// the channels they share.
    pub fn from_geometry<G: Geometry + ?Sized>(geometry: &G) -> Self {
        let set: BTreeSet<ChannelId> = geometry
            .wire_ids()
            .into_iter()
            .filter_map(|wire| geometry.channel_of(wire))
            .collect();
        ChannelUniverse {
            channels: set.into_iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn contains(&self, channel: ChannelId) -> bool {
        self.channels.binary_search(&channel).is_ok()
    }

    pub fn as_slice(&self) -> &[ChannelId] {
        &self.channels
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChannelId> {
        self.channels.iter()
    }
}

/// Number of bad channels to generate for a universe of `n` channels.
pub fn target_count(fraction: f64, n: usize) -> usize {
    (fraction * n as f64).floor() as usize
}

/// All channels read out by the wires of one TPC.
pub fn tpc_channels<G: Geometry + ?Sized>(geometry: &G, tpc: TpcId) -> Vec<ChannelId> {
    geometry
        .tpc_wire_ids(tpc)
        .into_iter()
        .filter_map(|wire| geometry.channel_of(wire))
        .collect()
}

/// Channels served by one readout chip in `tpc`.
///
/// Each of the chip's 16 channels is mapped to a view and a wire offset; the
/// offset is placed relative to the first wire of every plane of that view.
/// Offsets past the end of a plane read nothing.
pub fn chip_channels<G: Geometry + ?Sized>(geometry: &G, tpc: TpcId, chip: u32) -> Vec<ChannelId> {
    let planes = geometry.plane_ids(tpc);
    let mut channels = Vec::with_capacity(16);
    for addr in ChipAddress::chip(chip) {
        let (view, offset) = addr.to_wire();
        for &plane in &planes {
            if geometry.view(plane) != view {
                continue;
            }
            let wire = WireId::new(plane, geometry.first_wire(plane) + offset);
            if let Some(channel) = geometry.channel_of(wire) {
                channels.push(channel);
            }
        }
    }
    channels
}

/// Unit of a single random draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Draw {
    Channel,
    Tpc,
    Chip,
}

impl Draw {
    fn for_mode(mode: Mode) -> Self {
        match mode {
            Mode::Channels => Draw::Channel,
            Mode::Groups => Draw::Tpc,
            Mode::Chips => Draw::Chip,
        }
    }

    /// Channels any sequence of draws could ever mark bad.
    fn reachable<G: Geometry + ?Sized>(self, geometry: &G, universe: &ChannelUniverse) -> usize {
        match self {
            Draw::Channel => universe.len(),
            Draw::Tpc => geometry
                .tpc_ids()
                .into_iter()
                .flat_map(|tpc| tpc_channels(geometry, tpc))
                .collect::<BTreeSet<_>>()
                .len(),
            Draw::Chip => geometry
                .tpc_ids()
                .into_iter()
                .flat_map(|tpc| (1..=NUM_CHIPS).flat_map(move |chip| chip_channels(geometry, tpc, chip)))
                .collect::<BTreeSet<_>>()
                .len(),
        }
    }

    /// Make one draw and insert every channel it expands to.
    fn apply<G, R>(
        self,
        geometry: &G,
        universe: &ChannelUniverse,
        rng: &mut R,
        bad: &mut BTreeSet<ChannelId>,
    ) where
        G: Geometry + ?Sized,
        R: Rng,
    {
        match self {
            Draw::Channel => {
                // Repeats are swallowed by the set. Fine at the small
                // fractions used in practice.
                let idx = rng.gen_range(0..universe.len());
                bad.insert(universe.as_slice()[idx]);
            }
            Draw::Tpc => {
                if let Some(tpc) = draw_tpc(geometry, rng) {
                    bad.extend(tpc_channels(geometry, tpc));
                }
            }
            Draw::Chip => {
                if let Some(tpc) = draw_tpc(geometry, rng) {
                    let chip = rng.gen_range(1..=NUM_CHIPS);
                    bad.extend(chip_channels(geometry, tpc, chip));
                }
            }
        }
    }
}

/// Uniform cryostat, then uniform TPC within it. `None` when the drawn
/// cryostat has no TPCs.
fn draw_tpc<G, R>(geometry: &G, rng: &mut R) -> Option<TpcId>
where
    G: Geometry + ?Sized,
    R: Rng,
{
    let cryostats = geometry.cryostats();
    if cryostats.is_empty() {
        return None;
    }
    let cryostat = CryostatId(rng.gen_range(cryostats));
    let tpcs = geometry.tpcs(cryostat);
    if tpcs.is_empty() {
        return None;
    }
    Some(TpcId::new(cryostat, rng.gen_range(tpcs)))
}

/// Universe split into bad and good channels.
#[derive(Debug, Clone)]
pub struct ChannelPartition {
    pub(crate) universe: ChannelUniverse,
    pub(crate) bad: BTreeSet<ChannelId>,
    pub(crate) good: BTreeSet<ChannelId>,
    pub(crate) draws: usize,
}

impl ChannelPartition {
    pub fn universe(&self) -> &ChannelUniverse {
        &self.universe
    }

    pub fn bad(&self) -> &BTreeSet<ChannelId> {
        &self.bad
    }

    pub fn good(&self) -> &BTreeSet<ChannelId> {
        &self.good
    }

    /// Random draws it took to reach the target.
    pub fn draws(&self) -> usize {
        self.draws
    }
}

/// Draws bad channels from a geometry according to a `SamplingConfig`.
///
/// The generator is borrowed for the duration of `sample` only; seeding and
/// sharing it is the caller's business.
pub struct BadChannelSampler<'g, G: Geometry + ?Sized> {
    config: SamplingConfig,
    geometry: &'g G,
}

impl<'g, G: Geometry + ?Sized> BadChannelSampler<'g, G> {
    pub fn new(config: SamplingConfig, geometry: &'g G) -> Self {
        BadChannelSampler { config, geometry }
    }

    pub fn config(&self) -> &SamplingConfig {
        &self.config
    }

    pub fn sample<R: Rng>(&self, rng: &mut R) -> Result<ChannelPartition, SampleError> {
        let universe = ChannelUniverse::from_geometry(self.geometry);
        let n = universe.len();
        let target = target_count(self.config.bad_fraction, n);
        let draw = Draw::for_mode(self.config.mode);

        log::info!(
            "Sampling {} of {} channels bad ({} mode, fraction {})",
            target,
            n,
            self.config.mode,
            self.config.bad_fraction
        );

        if target > 0 {
            let reachable = draw.reachable(self.geometry, &universe);
            if target > reachable {
                return Err(SampleError::UnreachableTarget {
                    mode: self.config.mode,
                    target,
                    reachable,
                });
            }
        }

        let mut bad = BTreeSet::new();
        let mut draws = 0usize;
        while bad.len() < target {
            draw.apply(self.geometry, &universe, rng, &mut bad);
            draws += 1;
        }

        if bad.len() > target {
            log::debug!("Overshot target by {} channels", bad.len() - target);
        }
        log::debug!("Reached {} bad channels after {} draws", bad.len(), draws);

        let good = universe
            .iter()
            .filter(|ch| !bad.contains(*ch))
            .copied()
            .collect();

        Ok(ChannelPartition {
            universe,
            bad,
            good,
            draws,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use detvar_core::{PlaneId, RegularGeometry, View};
    use rand::rngs::StdRng;
    use rand::{RngCore, SeedableRng};

    fn small_geometry() -> RegularGeometry {
        RegularGeometry::new(2, 4, [60, 60, 72])
    }

    fn config(fraction: f64, mode: Mode) -> SamplingConfig {
        SamplingConfig::new(fraction, mode).unwrap()
    }

    fn assert_partition(p: &ChannelPartition) {
        assert!(p.bad.is_disjoint(&p.good));
        assert_eq!(p.bad.len() + p.good.len(), p.universe.len());
        for ch in p.universe.iter() {
            assert!(p.bad.contains(ch) ^ p.good.contains(ch));
        }
    }

    #[test]
    fn test_target_count_floors() {
        assert_eq!(target_count(0.0, 100), 0);
        assert_eq!(target_count(0.1, 100), 10);
        assert_eq!(target_count(0.105, 100), 10);
        assert_eq!(target_count(0.5, 3), 1);
        assert_eq!(target_count(1.0, 77), 77);
    }

    #[test]
    fn test_universe_deduplicates_shared_channels() {
        let geom = RegularGeometry::new(1, 2, [10, 10, 12]).with_shared_induction(true);
        let universe = ChannelUniverse::from_geometry(&geom);
        assert_eq!(universe.len(), 10 + 10 + 24);
        assert!(universe.as_slice().windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_channel_mode_hits_exact_target() {
        let geom = small_geometry();
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let p = BadChannelSampler::new(config(0.07, Mode::Channels), &geom)
                .sample(&mut rng)
                .unwrap();
            let n = p.universe.len();
            assert_eq!(p.bad.len(), target_count(0.07, n));
            assert_partition(&p);
        }
    }

    #[test]
    fn test_zero_fraction_never_draws() {
        let geom = small_geometry();
        for mode in [Mode::Channels, Mode::Groups, Mode::Chips] {
            let mut rng = StdRng::seed_from_u64(3);
            let p = BadChannelSampler::new(config(0.0, mode), &geom)
                .sample(&mut rng)
                .unwrap();
            assert!(p.bad.is_empty());
            assert_eq!(p.draws, 0);
            assert_eq!(p.good.len(), p.universe.len());
            // Generator untouched.
            assert_eq!(rng.next_u64(), StdRng::seed_from_u64(3).next_u64());
        }
    }

    #[test]
    fn test_group_mode_full_fraction_takes_everything() {
        let geom = small_geometry();
        let mut rng = StdRng::seed_from_u64(11);
        let p = BadChannelSampler::new(config(1.0, Mode::Groups), &geom)
            .sample(&mut rng)
            .unwrap();
        assert_eq!(p.bad.len(), p.universe.len());
        assert!(p.good.is_empty());
    }

    #[test]
    fn test_group_mode_marks_whole_tpcs() {
        let geom = small_geometry();
        let mut rng = StdRng::seed_from_u64(5);
        let p = BadChannelSampler::new(config(0.2, Mode::Groups), &geom)
            .sample(&mut rng)
            .unwrap();
        assert_partition(&p);
        assert!(p.bad.len() >= target_count(0.2, p.universe.len()));
        let per_tpc = 60 + 60 + 72;
        assert_eq!(p.bad.len() % per_tpc, 0, "unshared TPCs contribute whole blocks");
    }

    #[test]
    fn test_chip_channels_cover_sixteen_wires() {
        let geom = small_geometry();
        let tpc = TpcId::new(CryostatId(1), 2);
        for chip in 1..=NUM_CHIPS {
            let channels: BTreeSet<_> = chip_channels(&geom, tpc, chip).into_iter().collect();
            assert_eq!(channels.len(), 16, "chip {}", chip);
        }
        let u_plane = PlaneId::new(tpc, View::U.index() as u32);
        let expected = geom.channel_of(WireId::new(u_plane, 19)).unwrap();
        assert!(chip_channels(&geom, tpc, 1).contains(&expected));
    }

    #[test]
    fn test_chip_channels_skip_wires_past_plane_end() {
        // U and V planes hold only 20 wires, so offsets above 19 read nothing.
        let geom = RegularGeometry::new(1, 1, [20, 20, 48]);
        let tpc = TpcId::new(CryostatId(0), 0);
        let all: BTreeSet<_> = (1..=NUM_CHIPS)
            .flat_map(|chip| chip_channels(&geom, tpc, chip))
            .collect();
        // U, V: offsets 1..=19, W: offsets 1..=47.
        assert_eq!(all.len(), 19 + 19 + 47);
    }

    #[test]
    fn test_chip_mode_partition_and_overshoot_bound() {
        let geom = small_geometry();
        for seed in 0..10 {
            let mut rng = StdRng::seed_from_u64(seed);
            let p = BadChannelSampler::new(config(0.05, Mode::Chips), &geom)
                .sample(&mut rng)
                .unwrap();
            assert_partition(&p);
            let target = target_count(0.05, p.universe.len());
            assert!(p.bad.len() >= target);
            assert!(p.bad.len() < target + 16);
        }
    }

    #[test]
    fn test_chip_mode_unreachable_target() {
        let geom = small_geometry();
        let mut rng = StdRng::seed_from_u64(1);
        let err = BadChannelSampler::new(config(0.9, Mode::Chips), &geom)
            .sample(&mut rng)
            .unwrap_err();
        match err {
            SampleError::UnreachableTarget { mode, target, reachable } => {
                assert_eq!(mode, Mode::Chips);
                assert!(target > reachable);
                assert_eq!(reachable, 8 * 128);
            }
        }
    }

    #[test]
    fn test_same_seed_same_bad_set() {
        let geom = small_geometry();
        for mode in [Mode::Channels, Mode::Groups, Mode::Chips] {
            let sampler = BadChannelSampler::new(config(0.1, mode), &geom);
            let a = sampler.sample(&mut StdRng::seed_from_u64(99)).unwrap();
            let b = sampler.sample(&mut StdRng::seed_from_u64(99)).unwrap();
            assert_eq!(a.bad, b.bad, "mode {}", mode);
        }
    }

    #[test]
    fn test_empty_geometry() {
        let geom = RegularGeometry::new(0, 0, [10, 10, 10]);
        let mut rng = StdRng::seed_from_u64(0);
        let p = BadChannelSampler::new(config(0.5, Mode::Groups), &geom)
            .sample(&mut rng)
            .unwrap();
        assert!(p.universe.is_empty());
        assert!(p.bad.is_empty() && p.good.is_empty());
    }
}
