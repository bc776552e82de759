use core::hint::spin_loop;

use embassy_rp::Peri;
use embassy_rp::dma::Channel;
use embassy_rp::pac::common::{RW, Reg};
use embassy_rp::pac::dma::regs::CtrlTrig;
use embassy_rp::pac::dma::vals::{DataSize, TreqSel};
use embassy_rp::peripherals::PIO0;
use embassy_rp::pio::{
    Common, Config as PioConfig, Direction, FifoJoin, Pin, Pio, PioPin, ShiftDirection,
    StateMachine,
};
use fixed::FixedU32;
use fixed::types::extra::U8;

/// PIO cycles per pixel clock edge pair
const PIXEL_CLOCK_DIVIDER: f32 = 2.0;

/// Shifts scanlines out of PIO0 SM0 eight data bits per pixel clock.
///
/// Each line is streamed by one DMA transfer from the image store straight
/// into the state machine's TX FIFO.
pub struct ScanlineSerialiser<'a, CH: Channel> {
    _common: Common<'a, PIO0>,
    sm: StateMachine<'a, PIO0, 0>,
    channel: Peri<'a, CH>,
}

fn setup_pixel_state_machine<'a, const N: usize>(
    common: &mut Common<'a, PIO0>,
    sm: &mut StateMachine<'a, PIO0, N>,
    clk: &Pin<'a, PIO0>,
    data: &[&Pin<'a, PIO0>; 8],
) {
    let pixel_prog = pio::pio_asm!(
        ".side_set 1",
        ".wrap_target",
        "out pins, 8    side 0b0",
        "nop            side 0b1", // latch the byte on the rising edge
        ".wrap",
    );

    let cfg = {
        let mut cfg = PioConfig::default();
        cfg.use_program(&common.load_program(&pixel_prog.program), &[clk]);
        cfg.set_out_pins(data);
        cfg.clock_divider = FixedU32::<U8>::from_num(PIXEL_CLOCK_DIVIDER);
        // little endian pixels: low byte first
        cfg.shift_out.direction = ShiftDirection::Right;
        cfg.shift_out.auto_fill = true;
        cfg.shift_out.threshold = 32;
        cfg.fifo_join = FifoJoin::TxOnly;
        cfg
    };

    sm.set_config(&cfg);
    sm.set_pin_dirs(Direction::Out, data);
    sm.set_pin_dirs(Direction::Out, &[clk]);
}

fn setup_scanline_channel(
    channel: &Peri<'_, impl Channel>,
    pio_dreq_sel: TreqSel,
    line_words: u32,
    pixel_state_machine_tx_register: &Reg<u32, RW>,
) {
    channel.regs().al1_ctrl().write(|c| {
        let mut t = CtrlTrig(*c);
        t.set_incr_read(true);
        t.set_incr_write(false);
        t.set_data_size(DataSize::SIZE_WORD);
        t.set_treq_sel(pio_dreq_sel);
        t.set_irq_quiet(true);
        // chaining to itself disables chaining
        t.set_chain_to(channel.number());
        t.set_en(true);
        *c = t.0;
    });

    channel.regs().trans_count().write(|c| c.0 = line_words);
    channel
        .regs()
        .write_addr()
        .write(|c| *c = pixel_state_machine_tx_register.as_ptr() as u32);
}

impl<'a, CH: Channel> ScanlineSerialiser<'a, CH> {
    pub fn new(
        pio: Pio<'a, PIO0>,
        line_bytes: usize,
        d0: Peri<'a, impl PioPin>,
        d1: Peri<'a, impl PioPin>,
        d2: Peri<'a, impl PioPin>,
        d3: Peri<'a, impl PioPin>,
        d4: Peri<'a, impl PioPin>,
        d5: Peri<'a, impl PioPin>,
        d6: Peri<'a, impl PioPin>,
        d7: Peri<'a, impl PioPin>,
        clk: Peri<'a, impl PioPin>,
        channel: Peri<'a, CH>,
    ) -> Self {
        let Pio {
            mut common,
            mut sm0,
            ..
        } = pio;

        let clk = common.make_pio_pin(clk);
        let data = [
            common.make_pio_pin(d0),
            common.make_pio_pin(d1),
            common.make_pio_pin(d2),
            common.make_pio_pin(d3),
            common.make_pio_pin(d4),
            common.make_pio_pin(d5),
            common.make_pio_pin(d6),
            common.make_pio_pin(d7),
        ];
        let data_refs = [
            &data[0], &data[1], &data[2], &data[3], &data[4], &data[5], &data[6], &data[7],
        ];
        setup_pixel_state_machine(&mut common, &mut sm0, &clk, &data_refs);

        setup_scanline_channel(
            &channel,
            TreqSel::PIO0_TX0,
            (line_bytes / 4) as u32,
            &embassy_rp::pac::PIO0.txf(0),
        );

        ScanlineSerialiser {
            _common: common,
            sm: sm0,
            channel,
        }
    }

    pub fn start(&mut self) {
        self.sm.set_enable(true);
    }

    /// Stream one line and wait until DMA has read all of it
    pub fn send_blocking(&mut self, line: &[u8]) {
        self.channel
            .regs()
            .al3_read_addr_trig()
            .write(|c| *c = line.as_ptr() as u32);
        while self.channel.regs().ctrl_trig().read().busy() {
            spin_loop();
        }
    }
}
