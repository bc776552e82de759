//! Cross-core scanline handoff.
//!
//! The control loop submits one scanline per iteration on the `valid` queue
//! and the display engine hands each one back on the `free` queue once it has
//! finished reading it. Both queues are bounded channels; waiting for room on
//! `valid` is the only place the control loop suspends, which paces it to the
//! video timing.
//!
//! The engine must return every scanline it accepts exactly once. The
//! control loop drains `free` without a bound and relies on that guarantee.

use core::future::poll_fn;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::Channel;

use crate::image::{ImageStore, Scanline};

/// The `valid` and `free` queues shared by the two cores
pub struct ScanlineQueues<'a, M: RawMutex, const N: usize> {
    valid: Channel<M, Scanline<'a>, N>,
    free: Channel<M, Scanline<'a>, N>,
}

impl<'a, M: RawMutex, const N: usize> Default for ScanlineQueues<'a, M, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, M: RawMutex, const N: usize> ScanlineQueues<'a, M, N> {
    pub const fn new() -> Self {
        Self {
            valid: Channel::new(),
            free: Channel::new(),
        }
    }

    /// Hand out the control and engine ends of the queues.
    ///
    /// The exclusive borrow keeps each queue at a single producer and a single
    /// consumer for as long as the ports live. The firmware splits a
    /// `&'static mut` once at startup.
    pub fn split(&mut self) -> (ControlPort<'_, 'a, M, N>, EnginePort<'_, 'a, M, N>) {
        let queues = &*self;
        (
            ControlPort { queues },
            EnginePort {
                queues,
                started: false,
            },
        )
    }
}

/// Producer side of `valid`, consumer side of `free`
pub struct ControlPort<'q, 'a, M: RawMutex, const N: usize> {
    queues: &'q ScanlineQueues<'a, M, N>,
}

impl<'q, 'a, M: RawMutex, const N: usize> ControlPort<'q, 'a, M, N> {
    /// Hand a scanline to the engine, waiting for room on `valid`
    pub async fn submit(&self, scanline: Scanline<'a>) {
        self.queues.valid.send(scanline).await;
    }

    /// Take back everything the engine has finished with.
    ///
    /// Returns how many scanlines were reclaimed.
    pub fn reclaim_all(&self) -> usize {
        let mut reclaimed = 0;
        while self.queues.free.try_receive().is_ok() {
            reclaimed += 1;
        }
        reclaimed
    }
}

/// Consumer side of `valid`, producer side of `free`
pub struct EnginePort<'q, 'a, M: RawMutex, const N: usize> {
    queues: &'q ScanlineQueues<'a, M, N>,
    started: bool,
}

impl<'q, 'a, M: RawMutex, const N: usize> EnginePort<'q, 'a, M, N> {
    /// Wait until the first scanline shows up on `valid` without taking it.
    ///
    /// Only the first call can block; later calls return immediately.
    pub async fn wait_for_first(&mut self) {
        if self.started {
            return;
        }
        poll_fn(|cx| self.queues.valid.poll_ready_to_receive(cx)).await;
        self.started = true;
    }

    pub fn has_started(&self) -> bool {
        self.started
    }

    /// Next scanline to display
    pub async fn next(&self) -> Scanline<'a> {
        self.queues.valid.receive().await
    }

    /// Return a fully consumed scanline to the control loop
    pub async fn release(&self, scanline: Scanline<'a>) {
        self.queues.free.send(scanline).await;
    }
}

/// Result of one pipeline step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepReport<'a> {
    pub submitted: Scanline<'a>,
    pub reclaimed: usize,
}

/// Walks the lines of the selected page, one scanline per step
pub struct ScanlinePipeline<
    'q,
    'a,
    M: RawMutex,
    const W: usize,
    const H: usize,
    const P: usize,
    const N: usize,
> {
    image: ImageStore<'a, W, H, P>,
    port: ControlPort<'q, 'a, M, N>,
    line: usize,
}

impl<'q, 'a, M: RawMutex, const W: usize, const H: usize, const P: usize, const N: usize>
    ScanlinePipeline<'q, 'a, M, W, H, P, N>
{
    pub fn new(image: ImageStore<'a, W, H, P>, port: ControlPort<'q, 'a, M, N>) -> Self {
        Self {
            image,
            port,
            line: 0,
        }
    }

    /// Line that the next step will submit
    pub fn line(&self) -> usize {
        self.line
    }

    /// Submit line `self.line` of `page`, reclaim finished lines and move on.
    ///
    /// `page` is captured before anything else happens, so a page change can
    /// only affect the following step.
    pub async fn step(&mut self, page: usize) -> StepReport<'a> {
        let scanline = self.image.scanline(page, self.line);
        self.port.submit(scanline).await;
        let reclaimed = self.port.reclaim_all();

        self.line = if self.line == H - 1 { 0 } else { self.line + 1 };

        StepReport {
            submitted: scanline,
            reclaimed,
        }
    }
}
