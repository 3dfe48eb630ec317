//! Channel-status provider backed by a random bad-channel partition.

use rand::Rng;
use serde::Serialize;
use std::collections::BTreeSet;

use detvar_core::{ChannelId, Geometry};

use crate::config::{Mode, SamplingConfig};
use crate::sampler::{BadChannelSampler, ChannelPartition, SampleError};

/// Status of a single channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ChannelStatus {
    /// Not part of the detector's channel universe.
    NotPresent,
    Good,
    Bad,
}

/// Counts describing one generated bad-channel map.
#[derive(Debug, Clone, Serialize)]
pub struct StatusSummary {
    pub mode: Mode,
    pub requested_fraction: f64,
    pub achieved_fraction: f64,
    pub total_channels: usize,
    pub bad_channels: usize,
    pub good_channels: usize,
    pub draws: usize,
    pub seed: Option<u64>,
}

/// Answers channel-status queries from a bad-channel map generated once at
/// construction. Immutable afterwards, so it can be shared across readers.
#[derive(Debug, Clone)]
pub struct RandomChannelStatus {
    config: SamplingConfig,
    partition: ChannelPartition,
    noisy: BTreeSet<ChannelId>,
}

impl RandomChannelStatus {
    pub fn new<G, R>(config: SamplingConfig, geometry: &G, rng: &mut R) -> Result<Self, SampleError>
    where
        G: Geometry + ?Sized,
        R: Rng,
    {
        let partition = BadChannelSampler::new(config, geometry).sample(rng)?;
        Ok(Self::from_partition(config, partition))
    }

    pub fn from_partition(config: SamplingConfig, partition: ChannelPartition) -> Self {
        RandomChannelStatus {
            config,
            partition,
            noisy: BTreeSet::new(),
        }
    }

    pub fn config(&self) -> &SamplingConfig {
        &self.config
    }

    pub fn is_present(&self, channel: ChannelId) -> bool {
        self.partition.universe().contains(channel)
    }

    pub fn is_bad(&self, channel: ChannelId) -> bool {
        self.partition.bad().contains(&channel)
    }

    /// Never true: this provider only marks channels dead.
    pub fn is_noisy(&self, _channel: ChannelId) -> bool {
        false
    }

    pub fn is_good(&self, channel: ChannelId) -> bool {
        self.partition.good().contains(&channel)
    }

    pub fn status(&self, channel: ChannelId) -> ChannelStatus {
        if self.is_bad(channel) {
            ChannelStatus::Bad
        } else if self.is_good(channel) {
            ChannelStatus::Good
        } else {
            ChannelStatus::NotPresent
        }
    }

    pub fn good_channels(&self) -> &BTreeSet<ChannelId> {
        self.partition.good()
    }

    pub fn bad_channels(&self) -> &BTreeSet<ChannelId> {
        self.partition.bad()
    }

    pub fn noisy_channels(&self) -> &BTreeSet<ChannelId> {
        &self.noisy
    }

    pub fn partition(&self) -> &ChannelPartition {
        &self.partition
    }

    pub fn summary(&self) -> StatusSummary {
        let total = self.partition.universe().len();
        let bad = self.partition.bad().len();
        StatusSummary {
            mode: self.config.mode,
            requested_fraction: self.config.bad_fraction,
            achieved_fraction: if total == 0 { 0.0 } else { bad as f64 / total as f64 },
            total_channels: total,
            bad_channels: bad,
            good_channels: self.partition.good().len(),
            draws: self.partition.draws(),
            seed: self.config.seed,
        }
    }
}
