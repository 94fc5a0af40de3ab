//! Test and helper mocks for dust_core

use crate::error::{DustError, Result};
use crate::sink::SampleSink;
use crate::types::Sample;

/// A sink that accepts `ok_writes` samples and then fails every append,
/// standing in for a full disk or a vanished mount.
#[derive(Debug, Default)]
pub struct FailingSink {
    ok_writes: usize,
    written: usize,
}

impl FailingSink {
    pub fn after(ok_writes: usize) -> Self {
        Self {
            ok_writes,
            written: 0,
        }
    }

    pub fn written(&self) -> usize {
        self.written
    }
}

impl SampleSink for FailingSink {
    fn append(&mut self, _sample: &Sample) -> Result<()> {
        if self.written >= self.ok_writes {
            return Err(DustError::Store("simulated write failure".into()).into());
        }
        self.written += 1;
        Ok(())
    }
}

/// A pin that always errors on read.
pub struct DeadPin;

impl dust_traits::PinReader for DeadPin {
    fn read(
        &mut self,
    ) -> std::result::Result<dust_traits::PinState, Box<dyn std::error::Error + Send + Sync>> {
        Err(Box::new(std::io::Error::other("dead pin")))
    }
}
