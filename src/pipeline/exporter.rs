//! JSON-lines output with a single owner per run.
use super::PageRecord;
use crate::error::Result;
use std::fs::{create_dir_all, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use tracing::{debug, warn};

/// Streams records to one destination, one JSON object per line.
///
/// [`finish`](Self::finish) flushes and releases the destination; if the
/// exporter is dropped without it (a panic, an aborted run) the buffered
/// lines are still flushed.
pub struct JsonLinesExporter<W: Write> {
    writer: Option<BufWriter<W>>,
}

impl JsonLinesExporter<File> {
    /// Truncates whatever the previous run left at `path`.
    pub fn create(path: &Path) -> Result<Self> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            if !dir.exists() {
                create_dir_all(dir)?;
            }
        }
        let file = File::create(path)?;
        debug!("exporting records to {}", path.display());
        Ok(Self::new(file))
    }
}

impl<W: Write> JsonLinesExporter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            writer: Some(BufWriter::new(inner)),
        }
    }

    /// Appends one line. The record is serialized completely before any byte
    /// reaches the writer, so a failing record leaves no partial line behind.
    pub fn export(&mut self, record: &PageRecord) -> Result<()> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| io::Error::other("exporter already finished"))?;
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');
        writer.write_all(&line)?;
        Ok(())
    }

    /// Flushes and hands back the destination. Calling it again returns `None`.
    pub fn finish(&mut self) -> Result<Option<W>> {
        match self.writer.take() {
            Some(writer) => {
                let inner = writer.into_inner().map_err(|e| e.into_error())?;
                Ok(Some(inner))
            }
            None => Ok(None),
        }
    }
}

impl<W: Write> Drop for JsonLinesExporter<W> {
    fn drop(&mut self) {
        if let Some(writer) = self.writer.as_mut() {
            if let Err(e) = writer.flush() {
                warn!("failed to flush output on drop: {e}");
            }
        }
    }
}
