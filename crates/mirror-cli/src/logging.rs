//! Tracing setup with secret masking on the output side.

use std::io::{self, Write};

use anyhow::Context;
use mirror_core::secrets::SecretRegistry;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_FILTER: &str = "git_mirror=info,mirror_core=info,warn";

/// Install the global subscriber. Every formatted line passes through
/// `secrets` before it reaches stderr.
pub fn init(secrets: &SecretRegistry) -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(MaskingMakeWriter::new(secrets.clone(), io::stderr)),
        )
        .try_init()
        .context("failed to install tracing subscriber")
}

/// [`MakeWriter`] wrapping another one with secret masking.
#[derive(Debug, Clone)]
pub struct MaskingMakeWriter<M> {
    secrets: SecretRegistry,
    inner: M,
}

impl<M> MaskingMakeWriter<M> {
    pub fn new(secrets: SecretRegistry, inner: M) -> Self {
        Self { secrets, inner }
    }
}

impl<'a, M: MakeWriter<'a>> MakeWriter<'a> for MaskingMakeWriter<M> {
    type Writer = MaskingWriter<M::Writer>;

    fn make_writer(&'a self) -> Self::Writer {
        MaskingWriter::new(self.secrets.clone(), self.inner.make_writer())
    }
}

/// Buffers one event and writes it masked on flush or drop.
///
/// Buffering keeps a secret that straddles two `write` calls from slipping
/// through unmasked.
pub struct MaskingWriter<W: Write> {
    secrets: SecretRegistry,
    buffer: Vec<u8>,
    inner: W,
}

impl<W: Write> MaskingWriter<W> {
    pub fn new(secrets: SecretRegistry, inner: W) -> Self {
        Self {
            secrets,
            buffer: Vec::new(),
            inner,
        }
    }

    fn emit(&mut self) -> io::Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        let masked = self.secrets.mask(&String::from_utf8_lossy(&self.buffer));
        self.buffer.clear();
        self.inner.write_all(masked.as_bytes())?;
        self.inner.flush()
    }
}

impl<W: Write> Write for MaskingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.emit()
    }
}

impl<W: Write> Drop for MaskingWriter<W> {
    fn drop(&mut self) {
        let _ = self.emit();
    }
}
