//! Single digit 7-segment encoding.
//!
//! Bit 0 is segment A through bit 6 for segment G, bit 7 is the decimal
//! point. The display is common-anode, so a set bit turns the segment off.

use embedded_hal::digital::{OutputPin, PinState};

pub const SEGMENT_COUNT: usize = 8;

/// Encoded segment pattern, one bit per output line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Segments(pub u8);

impl Segments {
    /// All segments (and the decimal point) off
    pub const BLANK: Segments = Segments(0xFF);

    /// Line levels in A, B, C, D, E, F, G, DP order (`true` = drive high)
    pub fn line_levels(self) -> [bool; SEGMENT_COUNT] {
        let mut levels = [false; SEGMENT_COUNT];
        for (i, level) in levels.iter_mut().enumerate() {
            *level = self.0 >> i & 1 == 1;
        }
        levels
    }
}

const DIGITS: [u8; 10] = [0xC0, 0xF9, 0xA4, 0xB0, 0x99, 0x92, 0x82, 0xD8, 0x80, 0x90];

/// Glyph for `digit`, or [`Segments::BLANK`] for anything above 9
pub const fn encode(digit: u8) -> Segments {
    if (digit as usize) < DIGITS.len() {
        Segments(DIGITS[digit as usize])
    } else {
        Segments::BLANK
    }
}

/// Something that can show an encoded pattern
pub trait SegmentDisplay {
    fn show(&mut self, segments: Segments);
}

/// Eight GPIO lines wired to A..G and DP
pub struct SegmentLines<P> {
    pins: [P; SEGMENT_COUNT],
}

impl<P: OutputPin> SegmentLines<P> {
    pub fn new(pins: [P; SEGMENT_COUNT]) -> Self {
        Self { pins }
    }

    /// Drive every line high, which blanks a common-anode display
    pub fn all_high(&mut self) {
        self.show(Segments::BLANK);
    }

    pub fn release(self) -> [P; SEGMENT_COUNT] {
        self.pins
    }
}

impl<P: OutputPin> SegmentDisplay for SegmentLines<P> {
    fn show(&mut self, segments: Segments) {
        for (pin, level) in self.pins.iter_mut().zip(segments.line_levels()) {
            // Errors are dropped on purpose; `show` has no way to report them
            let _ = pin.set_state(PinState::from(level));
        }
    }
}
