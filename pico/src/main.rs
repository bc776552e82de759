#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Executor;
use embassy_rp::Peri;
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::multicore::{Stack, spawn_core1};
use embassy_rp::peripherals::{
    DMA_CH0, PIN_12, PIN_13, PIN_14, PIN_15, PIN_16, PIN_17, PIN_18, PIN_19, PIN_20, PIO0,
};
use embassy_rp::pio::Pio;
use embassy_rp::uart::{self, UartTx};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_time::{Instant, Timer};
use pager::{ControlLoop, DebounceConfig, Debouncer, ScanlinePipeline, SegmentLines};
use pico_dvi_pager::{
    Engine, FRAME_HEIGHT, FRAME_WIDTH, Irqs, PAGE_NUM, Queues, SCANLINE_QUEUE_DEPTH, SerialTx,
    UART_BAUDRATE, UART_TX_QUEUE_SIZE, image_store, run_display_core,
};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

static CORE_1_STACK: StaticCell<Stack<4096>> = StaticCell::new();
static EXECUTOR0: StaticCell<Executor> = StaticCell::new();
static EXECUTOR1: StaticCell<Executor> = StaticCell::new();

static SCANLINE_QUEUES: StaticCell<Queues> = StaticCell::new();

type Pager = ControlLoop<
    'static,
    'static,
    CriticalSectionRawMutex,
    Input<'static>,
    SegmentLines<Output<'static>>,
    SerialTx<'static>,
    FRAME_WIDTH,
    FRAME_HEIGHT,
    PAGE_NUM,
    SCANLINE_QUEUE_DEPTH,
    UART_TX_QUEUE_SIZE,
>;

#[embassy_executor::task]
async fn display_core_runner(
    engine: Engine,
    pio: Peri<'static, PIO0>,
    d0: Peri<'static, PIN_12>,
    d1: Peri<'static, PIN_13>,
    d2: Peri<'static, PIN_14>,
    d3: Peri<'static, PIN_15>,
    d4: Peri<'static, PIN_16>,
    d5: Peri<'static, PIN_17>,
    d6: Peri<'static, PIN_18>,
    d7: Peri<'static, PIN_19>,
    clk: Peri<'static, PIN_20>,
    channel: Peri<'static, DMA_CH0>,
) -> ! {
    run_display_core(
        engine,
        Pio::new(pio, Irqs),
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
    )
    .await
}

#[embassy_executor::task]
async fn control_loop_runner(mut control: Pager, mut led: Output<'static>) -> ! {
    for _ in 0..3 {
        led.set_high();
        Timer::after_millis(200).await;
        led.set_low();
        Timer::after_millis(200).await;
    }
    control.start();
    info!("init completed, page {}", control.page());

    loop {
        let iteration = control.iterate(Instant::now().as_micros()).await;
        if iteration.page_changed {
            info!("page {}", control.page());
        }
    }
}

#[cortex_m_rt::entry]
fn main() -> ! {
    let p = embassy_rp::init(Default::default());

    let (control_port, engine) = SCANLINE_QUEUES.init(Queues::new()).split();
    let pages = unwrap!(image_store());

    // Core 1 idles until it sees the first scanline, then starts scan-out
    spawn_core1(
        p.CORE1,
        CORE_1_STACK.init_with(|| Stack::new()),
        move || {
            let executor1 = EXECUTOR1.init(Executor::new());
            executor1.run(|spawner| {
                let token = unwrap!(display_core_runner(
                    engine, p.PIO0, p.PIN_12, p.PIN_13, p.PIN_14, p.PIN_15, p.PIN_16, p.PIN_17,
                    p.PIN_18, p.PIN_19, p.PIN_20, p.DMA_CH0,
                ));
                spawner.spawn(token);
            });
        },
    );

    // A..G, DP; all high blanks the common-anode display
    let mut segments = SegmentLines::new([
        Output::new(p.PIN_6, Level::High),
        Output::new(p.PIN_7, Level::High),
        Output::new(p.PIN_9, Level::High),
        Output::new(p.PIN_2, Level::High),
        Output::new(p.PIN_3, Level::High),
        Output::new(p.PIN_5, Level::High),
        Output::new(p.PIN_4, Level::High),
        Output::new(p.PIN_8, Level::High),
    ]);
    segments.all_high();

    let button = Input::new(p.PIN_10, Pull::Up);
    let led = Output::new(p.PIN_25, Level::Low);

    let mut uart_config = uart::Config::default();
    uart_config.baudrate = UART_BAUDRATE;
    let serial = SerialTx::new(UartTx::new_blocking(p.UART0, p.PIN_0, uart_config));

    let pipeline = ScanlinePipeline::new(pages, control_port);
    let control: Pager = ControlLoop::new(
        button,
        Debouncer::new(DebounceConfig::default()),
        segments,
        serial,
        pipeline,
    );

    let executor0 = EXECUTOR0.init(Executor::new());
    executor0.run(move |spawner| {
        let token = unwrap!(control_loop_runner(control, led));
        spawner.spawn(token);
    });
}
