//! The core 0 control loop: button -> page selection -> 7-segment feedback,
//! one byte of serial egress, then one scanline into the pipeline.

use core::fmt::Write as _;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embedded_hal::digital::InputPin;
use embedded_io::{Write, WriteReady};

use crate::debounce::Debouncer;
use crate::pipeline::{ScanlinePipeline, StepReport};
use crate::ring::RingBuffer;
use crate::seven_segment::{SegmentDisplay, encode};

/// Identification line queued at startup
pub const IDENT: &[u8] = b"pico-dvi-pager started\r\n";

/// Selected page, wrapping after `P` pages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PageSelector<const P: usize> {
    page: usize,
}

impl<const P: usize> PageSelector<P> {
    pub const fn new() -> Self {
        Self { page: 0 }
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn advance(&mut self) -> usize {
        self.page = if self.page == P - 1 { 0 } else { self.page + 1 };
        self.page
    }

    /// Digit shown for the current page; pages are presented 1-based and
    /// the last one reads as 0
    pub fn display_digit(&self) -> u8 {
        ((self.page + 1) % P) as u8
    }
}

/// Outcome of one control loop iteration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Iteration<'a> {
    /// A debounced press was seen and the page advanced
    pub page_changed: bool,
    /// A queued diagnostic byte went out on the serial port
    pub byte_sent: bool,
    pub step: StepReport<'a>,
}

pub struct ControlLoop<
    'q,
    'a,
    M: RawMutex,
    B,
    S,
    T,
    const W: usize,
    const H: usize,
    const P: usize,
    const N: usize,
    const Q: usize,
> {
    button: B,
    debouncer: Debouncer,
    selector: PageSelector<P>,
    segments: S,
    serial: T,
    tx_queue: RingBuffer<Q>,
    pipeline: ScanlinePipeline<'q, 'a, M, W, H, P, N>,
}

impl<
    'q,
    'a,
    M: RawMutex,
    B: InputPin,
    S: SegmentDisplay,
    T: Write + WriteReady,
    const W: usize,
    const H: usize,
    const P: usize,
    const N: usize,
    const Q: usize,
> ControlLoop<'q, 'a, M, B, S, T, W, H, P, N, Q>
{
    pub fn new(
        button: B,
        debouncer: Debouncer,
        segments: S,
        serial: T,
        pipeline: ScanlinePipeline<'q, 'a, M, W, H, P, N>,
    ) -> Self {
        Self {
            button,
            debouncer,
            selector: PageSelector::new(),
            segments,
            serial,
            tx_queue: RingBuffer::new(),
            pipeline,
        }
    }

    /// Show the initial page and queue the identification line
    pub fn start(&mut self) {
        self.segments.show(encode(self.selector.display_digit()));
        self.tx_queue.push_bulk(IDENT, true);
    }

    pub fn page(&self) -> usize {
        self.selector.page()
    }

    /// Queue for diagnostic text going out on the serial port
    pub fn diagnostics(&mut self) -> &mut RingBuffer<Q> {
        &mut self.tx_queue
    }

    /// Run one iteration. Suspends only while the display engine has no room
    /// for another scanline.
    pub async fn iterate(&mut self, now_us: u64) -> Iteration<'a> {
        let page_changed = self.poll_button(now_us);
        let byte_sent = self.flush_one();
        let step = self.pipeline.step(self.selector.page()).await;
        Iteration {
            page_changed,
            byte_sent,
            step,
        }
    }

    fn poll_button(&mut self, now_us: u64) -> bool {
        let idle = self.debouncer.idle_level();
        let raw = self.button.is_high().unwrap_or(idle);
        if !self.debouncer.update(now_us, raw) {
            return false;
        }

        self.selector.advance();
        let digit = self.selector.display_digit();
        self.segments.show(encode(digit));
        // Same number as the 7-segment display. Best effort; a full queue
        // just truncates the line
        let _ = write!(self.tx_queue, "page {}\r\n", digit);
        true
    }

    fn flush_one(&mut self) -> bool {
        if !matches!(self.serial.write_ready(), Ok(true)) {
            return false;
        }
        match self.tx_queue.pop() {
            Some(byte) => matches!(self.serial.write(&[byte]), Ok(1)),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debounce::{DEFAULT_INTERVAL_US, DebounceConfig};
    use crate::image::ImageStore;
    use crate::pipeline::{EnginePort, ScanlineQueues};
    use crate::seven_segment::Segments;
    use core::convert::Infallible;
    use embassy_futures::block_on;
    use embassy_sync::blocking_mutex::raw::NoopRawMutex;
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::rc::Rc;
    use std::vec::Vec;

    const W: usize = 2;
    const H: usize = 4;
    const P: usize = 10;
    const N: usize = 2;
    const Q: usize = 64;
    const TICK: u64 = DEFAULT_INTERVAL_US + 1;

    type Store<'a> = ImageStore<'a, W, H, P>;

    /// Active-low button; `true` in the script means "held down"
    #[derive(Clone, Default)]
    struct Button(Rc<RefCell<VecDeque<bool>>>);

    impl Button {
        fn press_for(&self, iterations: usize) {
            self.0.borrow_mut().extend(std::iter::repeat_n(true, iterations));
        }

        fn release_for(&self, iterations: usize) {
            self.0.borrow_mut().extend(std::iter::repeat_n(false, iterations));
        }
    }

    impl embedded_hal::digital::ErrorType for Button {
        type Error = Infallible;
    }

    impl InputPin for Button {
        fn is_high(&mut self) -> Result<bool, Infallible> {
            let pressed = self.0.borrow_mut().pop_front().unwrap_or(false);
            Ok(!pressed)
        }

        fn is_low(&mut self) -> Result<bool, Infallible> {
            self.is_high().map(|high| !high)
        }
    }

    #[derive(Clone, Default)]
    struct Display(Rc<RefCell<Vec<Segments>>>);

    impl SegmentDisplay for Display {
        fn show(&mut self, segments: Segments) {
            self.0.borrow_mut().push(segments);
        }
    }

    #[derive(Clone)]
    struct Serial {
        ready: Rc<RefCell<bool>>,
        out: Rc<RefCell<Vec<u8>>>,
    }

    impl Serial {
        fn new() -> Self {
            Self {
                ready: Rc::new(RefCell::new(true)),
                out: Rc::default(),
            }
        }
    }

    impl embedded_io::ErrorType for Serial {
        type Error = Infallible;
    }

    impl Write for Serial {
        fn write(&mut self, buf: &[u8]) -> Result<usize, Infallible> {
            self.out.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> Result<(), Infallible> {
            Ok(())
        }
    }

    impl WriteReady for Serial {
        fn write_ready(&mut self) -> Result<bool, Infallible> {
            Ok(*self.ready.borrow())
        }
    }

    type Loop<'q, 'a> =
        ControlLoop<'q, 'a, NoopRawMutex, Button, Display, Serial, W, H, P, N, Q>;

    struct Harness<'q, 'a> {
        control: Loop<'q, 'a>,
        engine: EnginePort<'q, 'a, NoopRawMutex, N>,
        now: u64,
    }

    impl<'q, 'a> Harness<'q, 'a> {
        fn new(
            store: Store<'a>,
            queues: &'q mut ScanlineQueues<'a, NoopRawMutex, N>,
            button: Button,
            display: Display,
            serial: Serial,
        ) -> Self {
            let (control, engine) = queues.split();
            let pipeline = ScanlinePipeline::new(store, control);
            let debouncer = Debouncer::new(DebounceConfig::default());
            Self {
                control: ControlLoop::new(button, debouncer, display, serial, pipeline),
                engine,
                now: 0,
            }
        }

        /// One control iteration followed by the engine consuming the line
        fn tick(&mut self) -> Iteration<'a> {
            self.now += TICK;
            let iteration = block_on(self.control.iterate(self.now));
            let line = block_on(self.engine.next());
            assert_eq!(line, iteration.step.submitted);
            block_on(self.engine.release(line));
            iteration
        }
    }

    fn store_bytes() -> Vec<u8> {
        std::vec![0u8; Store::BYTES]
    }

    #[test]
    fn test_page_selector_wraps() {
        let mut selector = PageSelector::<3>::new();
        assert_eq!(selector.display_digit(), 1);
        assert_eq!(selector.advance(), 1);
        assert_eq!(selector.advance(), 2);
        assert_eq!(selector.display_digit(), 0);
        assert_eq!(selector.advance(), 0);
    }

    #[test]
    fn test_start_renders_digit_and_queues_ident() {
        let data = store_bytes();
        let mut queues = ScanlineQueues::new();
        let display = Display::default();
        let serial = Serial::new();
        let mut h = Harness::new(
            Store::new(&data).unwrap(),
            &mut queues,
            Button::default(),
            display.clone(),
            serial.clone(),
        );
        h.control.start();
        assert_eq!(display.0.borrow().as_slice(), &[encode(1)]);

        for _ in 0..IDENT.len() {
            assert!(h.tick().byte_sent);
        }
        assert!(!h.tick().byte_sent);
        assert_eq!(serial.out.borrow().as_slice(), IDENT);
    }

    #[test]
    fn test_serial_waits_for_write_ready() {
        let data = store_bytes();
        let mut queues = ScanlineQueues::new();
        let serial = Serial::new();
        let mut h = Harness::new(
            Store::new(&data).unwrap(),
            &mut queues,
            Button::default(),
            Display::default(),
            serial.clone(),
        );
        h.control.start();

        *serial.ready.borrow_mut() = false;
        for _ in 0..5 {
            assert!(!h.tick().byte_sent);
        }
        assert!(serial.out.borrow().is_empty());

        *serial.ready.borrow_mut() = true;
        h.tick();
        assert_eq!(serial.out.borrow().as_slice(), &IDENT[..1]);
    }

    #[test]
    fn test_page_change_applies_to_next_scanline() {
        let data = store_bytes();
        let mut queues = ScanlineQueues::new();
        let button = Button::default();
        let mut h = Harness::new(
            Store::new(&data).unwrap(),
            &mut queues,
            button.clone(),
            Display::default(),
            Serial::new(),
        );

        button.release_for(2);
        button.press_for(3);

        let mut submitted = Vec::new();
        let mut changed_at = None;
        for i in 0..2 * H {
            let it = h.tick();
            if it.page_changed {
                changed_at = Some(i);
            }
            submitted.push(it.step.submitted.offset());
        }

        // Consensus reached on the third pressed sample
        let k = changed_at.unwrap();
        assert_eq!(k, 4);
        assert_eq!(submitted[k - 1], Store::line_offset(0, (k - 1) % H));
        assert_eq!(submitted[k], Store::line_offset(1, k % H));
        for (i, &offset) in submitted.iter().enumerate() {
            let page = if i < k { 0 } else { 1 };
            assert_eq!(offset, Store::line_offset(page, i % H));
        }
    }

    #[test]
    fn test_page_wraps_after_page_num_edges() {
        let data = store_bytes();
        let mut queues = ScanlineQueues::new();
        let button = Button::default();
        let display = Display::default();
        let mut h = Harness::new(
            Store::new(&data).unwrap(),
            &mut queues,
            button.clone(),
            display.clone(),
            Serial::new(),
        );
        h.control.start();

        for k in 1..=P {
            button.press_for(3);
            button.release_for(3);
            let edges = (0..6).filter(|_| h.tick().page_changed).count();
            assert_eq!(edges, 1);
            assert_eq!(h.control.page(), k % P);
            let shown = *display.0.borrow().last().unwrap();
            assert_eq!(shown, encode(((k + 1) % P) as u8));
        }
        assert_eq!(h.control.page(), 0);
    }

    #[test]
    fn test_diagnostics_drain_one_byte_per_iteration() {
        let data = store_bytes();
        let mut queues = ScanlineQueues::new();
        let serial = Serial::new();
        let mut h = Harness::new(
            Store::new(&data).unwrap(),
            &mut queues,
            Button::default(),
            Display::default(),
            serial.clone(),
        );

        assert_eq!(h.control.diagnostics().push_bulk(b"ok\r\n", false), 4);
        h.tick();
        h.tick();
        assert_eq!(serial.out.borrow().as_slice(), b"ok");
        h.tick();
        h.tick();
        assert!(h.control.diagnostics().is_empty());
    }

    #[test]
    fn test_page_change_logs_displayed_digit() {
        let data = store_bytes();
        let mut queues = ScanlineQueues::new();
        let button = Button::default();
        let serial = Serial::new();
        let mut h = Harness::new(
            Store::new(&data).unwrap(),
            &mut queues,
            button.clone(),
            Display::default(),
            serial.clone(),
        );

        button.press_for(3);
        for _ in 0..16 {
            h.tick();
        }
        assert_eq!(h.control.page(), 1);
        assert_eq!(serial.out.borrow().as_slice(), b"page 2\r\n");
    }
}
