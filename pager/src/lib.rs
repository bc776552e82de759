//! Board-independent logic for the pico DVI pager.
//!
//! - [`ring`]: byte queue feeding the diagnostic serial port
//! - [`debounce`]: consensus debounce and edge detection for the page button
//! - [`seven_segment`]: digit encoding for the page indicator
//! - [`image`]: page store and scanline addressing
//! - [`pipeline`]: scanline handoff between the control loop and the display engine
//! - [`control`]: the control loop tying all of the above together

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod control;
pub mod debounce;
pub mod image;
pub mod pipeline;
pub mod ring;
pub mod seven_segment;

pub use control::{ControlLoop, IDENT, Iteration, PageSelector};
pub use debounce::{DebounceConfig, Debouncer};
pub use image::{ImageError, ImageStore, Scanline, rgb565, store_bytes};
pub use pipeline::{ControlPort, EnginePort, ScanlinePipeline, ScanlineQueues, StepReport};
pub use ring::RingBuffer;
pub use seven_segment::{SegmentDisplay, SegmentLines, Segments, encode};
