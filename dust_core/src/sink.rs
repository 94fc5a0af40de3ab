//! Sample persistence.
//!
//! The store is an append-only CSV file keyed by nothing but arrival order:
//!
//! ```text
//! timestamp,particlesDetectedDuration,sampleDuration,concentration
//! 1600000000.000,1.000,6.000,87.186
//! ```
//!
//! The header is written once, when the file is created (or found empty).
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::error::{DustError, Result};
use crate::types::Sample;

/// Column names of the sample store, in order.
pub const HEADER: [&str; 4] = [
    "timestamp",
    "particlesDetectedDuration",
    "sampleDuration",
    "concentration",
];

/// Receives every emitted sample. A returned error is fatal for the pipeline.
pub trait SampleSink {
    fn append(&mut self, sample: &Sample) -> Result<()>;
}

impl<S: SampleSink + ?Sized> SampleSink for Box<S> {
    fn append(&mut self, sample: &Sample) -> Result<()> {
        (**self).append(sample)
    }
}

fn store_err(path: &Path, what: &str, e: impl std::fmt::Display) -> eyre::Report {
    DustError::Store(format!("{what} {}: {e}", path.display())).into()
}

pub struct CsvSampleStore {
    path: PathBuf,
    writer: csv::Writer<File>,
}

impl CsvSampleStore {
    /// Open (or create) the store for appending.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(dir) = path.parent()
            && !dir.as_os_str().is_empty()
        {
            std::fs::create_dir_all(dir).map_err(|e| store_err(dir, "create directory", e))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| store_err(&path, "open", e))?;
        let needs_header = file
            .metadata()
            .map_err(|e| store_err(&path, "stat", e))?
            .len()
            == 0;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(file);
        if needs_header {
            writer
                .write_record(HEADER)
                .map_err(|e| store_err(&path, "write header to", e))?;
            writer.flush().map_err(|e| store_err(&path, "flush", e))?;
            tracing::info!(path = %path.display(), "created sample store");
        }
        Ok(Self { path, writer })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SampleSink for CsvSampleStore {
    fn append(&mut self, sample: &Sample) -> Result<()> {
        self.writer
            .write_record(sample.csv_fields())
            .map_err(|e| store_err(&self.path, "append to", e))?;
        self.writer
            .flush()
            .map_err(|e| store_err(&self.path, "flush", e))?;
        Ok(())
    }
}

/// In-memory sink; clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    samples: Arc<Mutex<Vec<Sample>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn samples(&self) -> Vec<Sample> {
        self.samples
            .lock()
            .map(|g| g.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.samples.lock().map(|g| g.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SampleSink for MemorySink {
    fn append(&mut self, sample: &Sample) -> Result<()> {
        self.samples
            .lock()
            .map_err(|_| eyre::Report::new(DustError::Store("memory sink poisoned".into())))?
            .push(*sample);
        Ok(())
    }
}

/// Load every sample from a store file. Headers must match `HEADER` exactly.
pub fn read_samples(path: &Path) -> Result<Vec<Sample>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(|e| store_err(path, "open", e))?;

    let headers = rdr
        .headers()
        .map_err(|e| store_err(path, "read headers of", e))?
        .clone();
    let actual: Vec<&str> = headers.iter().collect();
    if actual != HEADER {
        return Err(DustError::Store(format!(
            "sample store must have headers '{}', got: {}",
            HEADER.join(","),
            actual.join(",")
        ))
        .into());
    }

    let mut out = Vec::new();
    for (idx, rec) in rdr.deserialize::<Sample>().enumerate() {
        match rec {
            Ok(s) => out.push(s),
            Err(e) => {
                return Err(store_err(path, &format!("invalid row {} in", idx + 2), e));
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(t: f64) -> Sample {
        Sample {
            epoch_start_secs: t,
            low_duration_secs: 0.5,
            epoch_duration_secs: 5.1,
            concentration: 51.49,
        }
    }

    #[test]
    fn memory_sink_clones_share_buffer() {
        let sink = MemorySink::new();
        let mut writer = sink.clone();
        writer.append(&sample(1.0)).unwrap();
        writer.append(&sample(2.0)).unwrap();
        assert_eq!(sink.len(), 2);
        assert_eq!(sink.samples()[1].epoch_start_secs, 2.0);
    }

    #[test]
    fn header_written_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/data.csv");
        {
            let mut store = CsvSampleStore::open(&path).unwrap();
            store.append(&sample(10.0)).unwrap();
        }
        {
            let mut store = CsvSampleStore::open(&path).unwrap();
            store.append(&sample(20.0)).unwrap();
        }
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            text,
            "timestamp,particlesDetectedDuration,sampleDuration,concentration\n\
             10.000,0.500,5.100,51.490\n\
             20.000,0.500,5.100,51.490\n"
        );
    }

    #[test]
    fn empty_existing_file_gets_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.csv");
        std::fs::write(&path, "").unwrap();

        let mut store = CsvSampleStore::open(&path).unwrap();
        store.append(&sample(1.0)).unwrap();
        drop(store);

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            text,
            "timestamp,particlesDetectedDuration,sampleDuration,concentration\n\
             1.000,0.500,5.100,51.490\n"
        );
        assert_eq!(read_samples(&path).unwrap().len(), 1);
    }
}
