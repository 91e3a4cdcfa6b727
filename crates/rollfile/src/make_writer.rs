//! `tracing-subscriber` integration
//!
//! Lets a [`RotatingWriter`] back a `fmt` layer directly:
//!
//! ```no_run
//! use rollfile::{RotatingWriter, SharedWriter, WriterConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let writer = SharedWriter::from(RotatingWriter::new(WriterConfig::new("logs/app"))?);
//! tracing_subscriber::fmt()
//!     .with_writer(writer.clone())
//!     .with_ansi(false)
//!     .init();
//!
//! // Later, from a supervisor
//! writer.rotate()?;
//! # Ok(())
//! # }
//! ```
//!
//! Events emitted by this crate are discarded by the writer. They are raised
//! while the writer lock is held, and writing them back into the same writer
//! would deadlock. Hand the subscriber a [`SharedWriter`] rather than an
//! `Arc<RotatingWriter>`: the blanket `Arc` impl in `tracing-subscriber`
//! does not apply that filter.

use crate::RotatingWriter;
use std::ops::Deref;
use std::sync::Arc;
use tracing::Metadata;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::fmt::writer::OptionalWriter;

fn is_own_event(meta: &Metadata<'_>) -> bool {
    meta.target()
        .strip_prefix(env!("CARGO_CRATE_NAME"))
        .is_some_and(|rest| rest.is_empty() || rest.starts_with("::"))
}

impl<'a> MakeWriter<'a> for RotatingWriter {
    type Writer = OptionalWriter<&'a Self>;

    fn make_writer(&'a self) -> Self::Writer {
        OptionalWriter::some(self)
    }

    fn make_writer_for(&'a self, meta: &Metadata<'_>) -> Self::Writer {
        if is_own_event(meta) {
            OptionalWriter::none()
        } else {
            OptionalWriter::some(self)
        }
    }
}

/// Cloneable handle to a [`RotatingWriter`] for use as a subscriber writer.
#[derive(Debug, Clone)]
pub struct SharedWriter {
    inner: Arc<RotatingWriter>,
}

impl SharedWriter {
    /// Wrap `writer` for sharing between a subscriber and its owner.
    pub fn new(writer: RotatingWriter) -> Self {
        Self {
            inner: Arc::new(writer),
        }
    }
}

impl From<RotatingWriter> for SharedWriter {
    fn from(writer: RotatingWriter) -> Self {
        Self::new(writer)
    }
}

impl From<Arc<RotatingWriter>> for SharedWriter {
    fn from(inner: Arc<RotatingWriter>) -> Self {
        Self { inner }
    }
}

impl Deref for SharedWriter {
    type Target = RotatingWriter;

    fn deref(&self) -> &RotatingWriter {
        &self.inner
    }
}

impl<'a> MakeWriter<'a> for SharedWriter {
    type Writer = OptionalWriter<&'a RotatingWriter>;

    fn make_writer(&'a self) -> Self::Writer {
        RotatingWriter::make_writer(&self.inner)
    }

    fn make_writer_for(&'a self, meta: &Metadata<'_>) -> Self::Writer {
        RotatingWriter::make_writer_for(&self.inner, meta)
    }
}
