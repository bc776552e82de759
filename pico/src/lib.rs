#![no_std]

mod display;
mod display_core;
mod pages;
mod serial;

use embassy_rp::bind_interrupts;
use embassy_rp::peripherals::PIO0;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

pub use display::ScanlineSerialiser;
pub use display_core::run_display_core;
pub use pages::image_store;
pub use serial::SerialTx;

pub const FRAME_WIDTH: usize = 80;
pub const FRAME_HEIGHT: usize = 60;
pub const PAGE_NUM: usize = 10;

/// Each stored line is shown this many times (80x60 -> 640x480)
pub const SCALE: usize = 8;

/// Scanlines that can be in flight between the cores
pub const SCANLINE_QUEUE_DEPTH: usize = 8;

pub const UART_TX_QUEUE_SIZE: usize = 1024;
pub const UART_BAUDRATE: u32 = 115_200;

pub type Queues = pager::ScanlineQueues<'static, CriticalSectionRawMutex, SCANLINE_QUEUE_DEPTH>;
pub type Engine =
    pager::EnginePort<'static, 'static, CriticalSectionRawMutex, SCANLINE_QUEUE_DEPTH>;
pub type Pages = pager::ImageStore<'static, FRAME_WIDTH, FRAME_HEIGHT, PAGE_NUM>;

bind_interrupts!(pub struct Irqs {
    PIO0_IRQ_0 => embassy_rp::pio::InterruptHandler<PIO0>;
});
