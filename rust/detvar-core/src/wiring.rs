//! Readout chip wiring: (chip, channel) → (view, wire offset within block).
//!
//! Eight chips serve one wiring block of 128 channels. Chips are grouped in
//! pairs, and each pair splits its 16 channels into three contiguous
//! sub-ranges, one per view. Within a sub-range wires are interleaved with a
//! stride of 2, and the counting direction flips between pairs, so every pair
//! carries its own origin and signs.
//!
//! Block heights are 5 (U), 5 (V) and 6 (W) channels per chip, which gives
//! 40 U, 40 V and 48 W wire offsets per block.

use crate::ids::View;

pub const NUM_CHIPS: u32 = 8;
pub const CHANNELS_PER_CHIP: u32 = 16;
pub const MAX_WIRE_OFFSET: u32 = 48;

/// One view's share of a chip pair's channels.
#[derive(Debug, Clone, Copy)]
struct SubRange {
    /// Highest channel number (inclusive) belonging to this sub-range.
    last_chan: u32,
    view: View,
    /// Channels per chip in this sub-range.
    height: i32,
    /// Smallest wire offset produced by the sub-range.
    wire_min: i32,
    /// Channel number located at `wire_min`.
    chan_min: i32,
}

/// Wiring constants for chips `2k+1` and `2k+2`.
#[derive(Debug, Clone, Copy)]
struct ChipPair {
    /// Chip located at `wire_min`.
    chip_min: i32,
    chip_sign: i32,
    chan_sign: i32,
    ranges: [SubRange; 3],
}

const fn sub(last_chan: u32, view: View, height: i32, wire_min: i32, chan_min: i32) -> SubRange {
    SubRange { last_chan, view, height, wire_min, chan_min }
}

const CHIP_PAIRS: [ChipPair; 4] = [
    // chips 1, 2
    ChipPair { chip_min: 2, chip_sign: -1, chan_sign: -1, ranges: [
        sub(4,  View::U, 5, 1, 4),
        sub(9,  View::V, 5, 1, 9),
        sub(15, View::W, 6, 1, 15),
    ] },
    // chips 3, 4
    ChipPair { chip_min: 4, chip_sign: -1, chan_sign: 1, ranges: [
        sub(5,  View::W, 6, 2, 0),
        sub(10, View::V, 5, 2, 6),
        sub(15, View::U, 5, 2, 11),
    ] },
    // chips 5, 6
    ChipPair { chip_min: 5, chip_sign: 1, chan_sign: -1, ranges: [
        sub(4,  View::U, 5, 21, 4),
        sub(9,  View::V, 5, 21, 9),
        sub(15, View::W, 6, 25, 15),
    ] },
    // chips 7, 8
    ChipPair { chip_min: 7, chip_sign: 1, chan_sign: 1, ranges: [
        sub(5,  View::W, 6, 26, 0),
        sub(10, View::V, 5, 22, 6),
        sub(15, View::U, 5, 22, 11),
    ] },
];

/// Map a readout address to the view and wire offset (1..=48) it reads.
///
/// # Panics
/// If `chip` is outside 1..=8 or `chan` outside 0..=15. These come from
/// fixed loops over the hardware table, never from user input.
pub fn chip_and_channel_to_wire(chip: u32, chan: u32) -> (View, u32) {
    assert!((1..=NUM_CHIPS).contains(&chip), "chip {} out of range 1..=8", chip);
    assert!(chan < CHANNELS_PER_CHIP, "channel {} out of range 0..=15", chan);

    let pair = &CHIP_PAIRS[((chip - 1) / 2) as usize];
    let range = pair
        .ranges
        .iter()
        .find(|r| chan <= r.last_chan)
        .unwrap_or(&pair.ranges[2]);

    let wire = range.wire_min
        + 2 * ((chan as i32 - range.chan_min) * pair.chan_sign
            + (chip as i32 - pair.chip_min) * range.height * pair.chip_sign);

    assert!(
        wire >= 1 && wire <= MAX_WIRE_OFFSET as i32,
        "wire offset {} out of range for chip {} channel {}",
        wire,
        chip,
        chan
    );
    (range.view, wire as u32)
}

/// A validated (chip, channel) readout address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChipAddress {
    pub chip: u32,
    pub channel: u32,
}

impl ChipAddress {
    /// # Panics
    /// On an address outside the 8 × 16 table.
    pub fn new(chip: u32, channel: u32) -> Self {
        assert!((1..=NUM_CHIPS).contains(&chip), "chip {} out of range 1..=8", chip);
        assert!(channel < CHANNELS_PER_CHIP, "channel {} out of range 0..=15", channel);
        ChipAddress { chip, channel }
    }

    /// All 128 addresses, chip-major.
    pub fn all() -> impl Iterator<Item = ChipAddress> {
        (1..=NUM_CHIPS).flat_map(|chip| (0..CHANNELS_PER_CHIP).map(move |channel| ChipAddress { chip, channel }))
    }

    /// The 16 addresses served by one chip.
    pub fn chip(chip: u32) -> impl Iterator<Item = ChipAddress> {
        assert!((1..=NUM_CHIPS).contains(&chip), "chip {} out of range 1..=8", chip);
        (0..CHANNELS_PER_CHIP).map(move |channel| ChipAddress { chip, channel })
    }

    pub fn to_wire(self) -> (View, u32) {
        chip_and_channel_to_wire(self.chip, self.channel)
    }
}
