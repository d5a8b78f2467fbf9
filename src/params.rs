//! Vendor enumerations and their `ps4000a` codes.

use std::fmt;

use bitflags::bitflags;

/// Largest sample code the 4000A series reports at full scale.
pub const MAX_ADC_VALUE: i16 = 32767;
/// Smallest sample code the 4000A series reports at full scale.
pub const MIN_ADC_VALUE: i16 = -32767;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Channel {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
}

impl Channel {
    pub const ALL: [Channel; 8] = [
        Channel::A, Channel::B, Channel::C, Channel::D,
        Channel::E, Channel::F, Channel::G, Channel::H,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub(crate) fn ps4000a_code(self) -> i32 {
        self as i32
    }

    pub fn from_index(index: usize) -> Option<Channel> {
        Self::ALL.get(index).copied()
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
            Self::E => "E",
            Self::F => "F",
            Self::G => "G",
            Self::H => "H",
        };
        f.write_str(name)
    }
}

bitflags! {
    /// A set of channels; also the layout of the per-channel overflow word
    /// reported by the streaming callback.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ChannelSet: u16 {
        const A = 1<<0;
        const B = 1<<1;
        const C = 1<<2;
        const D = 1<<3;
        const E = 1<<4;
        const F = 1<<5;
        const G = 1<<6;
        const H = 1<<7;
    }
}

impl ChannelSet {
    pub fn channel(channel: Channel) -> Self {
        Self::from_bits_retain(1 << channel.index())
    }

    pub fn contains_channel(self, channel: Channel) -> bool {
        self.contains(Self::channel(channel))
    }

    pub fn channels(self) -> impl Iterator<Item = Channel> {
        Channel::ALL.into_iter().filter(move |&channel| self.contains_channel(channel))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Coupling {
    AC,
    #[default]
    DC,
}

impl Coupling {
    pub(crate) fn ps4000a_code(self) -> i32 {
        match self {
            Self::AC => 0,
            Self::DC => 1,
        }
    }
}

#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Range {
    mV10,
    mV20,
    mV50,
    mV100,
    mV200,
    mV500,
    V1,
    V2,
    V5,
    V10,
    #[default]
    V20,
    V50,
    V100,
    V200,
}

impl Range {
    pub const ALL: [Range; 14] = [
        Range::mV10, Range::mV20, Range::mV50, Range::mV100, Range::mV200,
        Range::mV500, Range::V1, Range::V2, Range::V5, Range::V10,
        Range::V20, Range::V50, Range::V100, Range::V200,
    ];

    pub(crate) fn ps4000a_code(self) -> i32 {
        self as i32
    }

    /// Half of the peak-to-peak input span, in volts.
    pub fn full_scale(self) -> f32 {
        match self {
            Self::mV10  => 0.01,
            Self::mV20  => 0.02,
            Self::mV50  => 0.05,
            Self::mV100 => 0.1,
            Self::mV200 => 0.2,
            Self::mV500 => 0.5,
            Self::V1    => 1.0,
            Self::V2    => 2.0,
            Self::V5    => 5.0,
            Self::V10   => 10.0,
            Self::V20   => 20.0,
            Self::V50   => 50.0,
            Self::V100  => 100.0,
            Self::V200  => 200.0,
        }
    }

    pub fn code_to_volts(self, code: i16) -> f32 {
        code as f32 * self.full_scale() / MAX_ADC_VALUE as f32
    }

    pub fn volts_to_code(self, volts: f32) -> i16 {
        let code = (volts / self.full_scale() * MAX_ADC_VALUE as f32).round();
        code.clamp(MIN_ADC_VALUE as f32, MAX_ADC_VALUE as f32) as i16
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TimeUnit {
    Femtoseconds,
    Picoseconds,
    Nanoseconds,
    Microseconds,
    Milliseconds,
    Seconds,
}

impl TimeUnit {
    pub(crate) fn ps4000a_code(self) -> i32 {
        self as i32
    }

    pub fn femtoseconds(self) -> u64 {
        match self {
            Self::Femtoseconds => 1,
            Self::Picoseconds  => 1_000,
            Self::Nanoseconds  => 1_000_000,
            Self::Microseconds => 1_000_000_000,
            Self::Milliseconds => 1_000_000_000_000,
            Self::Seconds      => 1_000_000_000_000_000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleInterval {
    pub value: u32,
    pub unit: TimeUnit,
}

impl SampleInterval {
    pub fn new(value: u32, unit: TimeUnit) -> Self {
        SampleInterval { value, unit }
    }

    pub fn as_secs_f64(self) -> f64 {
        self.value as f64 * self.unit.femtoseconds() as f64 * 1e-15
    }

    pub fn sample_rate(self) -> f64 {
        1.0 / self.as_secs_f64()
    }
}

impl Default for SampleInterval {
    fn default() -> Self {
        SampleInterval { value: 1000, unit: TimeUnit::Microseconds }
    }
}

bitflags! {
    /// Downsampling applied by the driver before samples reach a buffer.
    /// An empty set is raw data.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct RatioMode: i32 {
        const Aggregate    = 1<<0;
        const Decimate     = 1<<1;
        const Average      = 1<<2;
        const Distribution = 1<<3;
    }
}

impl RatioMode {
    pub const NONE: RatioMode = RatioMode::empty();

    pub(crate) fn ps4000a_code(self) -> i32 {
        self.bits()
    }
}
