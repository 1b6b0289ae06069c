//! In-memory backend for capturing rendered lines.

use log4rs::append::Append;
use log4rs::encode::Encode;
use log4rs::encode::writer::simple::SimpleWriter;
use parking_lot::Mutex;
use std::sync::Arc;

use super::sink::line_encoder;

/// Appends every record to a shared byte buffer, one lock per record.
#[derive(Clone, Debug)]
pub struct MemoryAppender {
    buf: Arc<Mutex<Vec<u8>>>,
    encoder: Arc<dyn Encode>,
}

impl MemoryAppender {
    pub fn new() -> Self {
        Self { buf: Arc::new(Mutex::new(Vec::new())), encoder: Arc::from(line_encoder()) }
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buf.lock()).into_owned()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_owned).collect()
    }

    pub fn clear(&self) {
        self.buf.lock().clear();
    }
}

impl Default for MemoryAppender {
    fn default() -> Self {
        Self::new()
    }
}

impl Append for MemoryAppender {
    fn append(&self, record: &log::Record) -> anyhow::Result<()> {
        let mut buf = self.buf.lock();
        self.encoder.encode(&mut SimpleWriter(&mut *buf), record)
    }

    fn flush(&self) {}
}
