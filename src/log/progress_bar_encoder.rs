//! Console log lines written while the day progress bar is drawn would otherwise leave the
//! tail of the bar behind them on the same line.

use log::Record;
use log4rs::encode::{Encode, Write};

/// Clears the current console line, then delegates to the wrapped encoder.
#[derive(Debug)]
pub struct PBWrapperEncoder {
    inner: Box<dyn Encode>,
}

impl PBWrapperEncoder {
    pub fn new(inner: Box<dyn Encode>) -> Self {
        Self { inner }
    }
}

impl Encode for PBWrapperEncoder {
    fn encode(&self, w: &mut dyn Write, record: &Record) -> anyhow::Result<()> {
        // Erase the line, carriage return.
        w.write_all(b"\x1B[2K\r")?;
        self.inner.encode(w, record)
    }
}
