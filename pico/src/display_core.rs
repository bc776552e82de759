use defmt::*;
use embassy_rp::Peri;
use embassy_rp::dma::Channel;
use embassy_rp::peripherals::PIO0;
use embassy_rp::pio::{Pio, PioPin};

use crate::{Engine, FRAME_WIDTH, SCALE, ScanlineSerialiser};

/// Display engine for core 1.
///
/// Sits idle until the control loop queues the first scanline, then scans out
/// every line it is handed `SCALE` times and returns it on the free queue.
pub async fn run_display_core(
    mut engine: Engine,
    pio: Pio<'static, PIO0>,
    d0: Peri<'static, impl PioPin>,
    d1: Peri<'static, impl PioPin>,
    d2: Peri<'static, impl PioPin>,
    d3: Peri<'static, impl PioPin>,
    d4: Peri<'static, impl PioPin>,
    d5: Peri<'static, impl PioPin>,
    d6: Peri<'static, impl PioPin>,
    d7: Peri<'static, impl PioPin>,
    clk: Peri<'static, impl PioPin>,
    channel: Peri<'static, impl Channel>,
) -> ! {
    let mut serialiser = ScanlineSerialiser::new(
        pio,
        FRAME_WIDTH * pager::image::PIXEL_BYTES,
        d0,
        d1,
        d2,
        d3,
        d4,
        d5,
        d6,
        d7,
        clk,
        channel,
    );

    engine.wait_for_first().await;
    info!("first scanline queued, starting scan-out");
    serialiser.start();

    loop {
        let scanline = engine.next().await;
        for _ in 0..SCALE {
            serialiser.send_blocking(scanline.bytes());
        }
        engine.release(scanline).await;
    }
}
