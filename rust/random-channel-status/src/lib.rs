//! random-channel-status: random bad-channel maps for detector systematics.
//!
//! Knocks out an exact fraction of a detector's readout channels, either one
//! channel at a time, one whole TPC (APA face) at a time, or one 16-channel
//! readout chip at a time, and serves the resulting good/bad partition through
//! a channel-status query interface.

pub mod config;
pub mod sampler;
pub mod status;
pub mod variations;

pub use config::{ConfigError, Mode, SamplingConfig};
pub use sampler::{BadChannelSampler, ChannelPartition, ChannelUniverse, SampleError};
pub use status::{ChannelStatus, RandomChannelStatus, StatusSummary};
pub use variations::{run_variations, Variation};
