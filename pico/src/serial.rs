use embassy_rp::pac;
use embassy_rp::uart::{Blocking, UartTx};
use embedded_io::{ErrorKind, ErrorType, Write, WriteReady};

/// UART0 transmitter with a non-blocking readiness check
pub struct SerialTx<'d> {
    tx: UartTx<'d, Blocking>,
}

impl<'d> SerialTx<'d> {
    pub fn new(tx: UartTx<'d, Blocking>) -> Self {
        Self { tx }
    }
}

impl ErrorType for SerialTx<'_> {
    type Error = ErrorKind;
}

impl Write for SerialTx<'_> {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.tx.blocking_write(buf).map_err(|_| ErrorKind::Other)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.tx.blocking_flush().map_err(|_| ErrorKind::Other)
    }
}

impl WriteReady for SerialTx<'_> {
    fn write_ready(&mut self) -> Result<bool, Self::Error> {
        // room for at least one more byte in the TX FIFO
        Ok(!pac::UART0.uartfr().read().txff())
    }
}
