//! Tacview ACMI 2.2 text recorder.
//!
//! ```text
//! FileType=text/acmi/tacview
//! FileVersion=2.2
//! 0,ReferenceTime=...
//! #12.50
//! 1,T=lon|lat|alt|roll|pitch|yaw,Name=1001
//! ```

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use simlink_core::EnvObservation;
use tracing::info;

use crate::components::VisualizationSink;

/// Writes each observation as one ACMI time frame.
///
/// Platforms get stable hexadecimal object ids in order of first sight.
#[derive(Debug)]
pub struct AcmiRecorder<W: Write = BufWriter<File>> {
    writer: W,
    ids: HashMap<String, u64>,
    next_id: u64,
}

impl AcmiRecorder<BufWriter<File>> {
    /// Create (or truncate) `path` and write the file header.
    pub fn create(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let file = File::create(path)?;
        info!(path = %path.display(), "recording ACMI replay");
        Self::new(BufWriter::new(file))
    }
}

impl<W: Write> AcmiRecorder<W> {
    pub fn new(mut writer: W) -> io::Result<Self> {
        writeln!(writer, "FileType=text/acmi/tacview")?;
        writeln!(writer, "FileVersion=2.2")?;
        writeln!(writer, "0,ReferenceTime=2000-01-01T00:00:00Z")?;
        Ok(Self {
            writer,
            ids: HashMap::new(),
            next_id: 1,
        })
    }

    fn object_id(&mut self, name: &str) -> u64 {
        if let Some(&id) = self.ids.get(name) {
            return id;
        }
        let id = self.next_id;
        self.next_id += 1;
        self.ids.insert(name.to_string(), id);
        id
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> VisualizationSink for AcmiRecorder<W> {
    fn record(&mut self, observation: &EnvObservation) -> io::Result<()> {
        writeln!(self.writer, "#{:.2}", observation.sim_time)?;
        for p in &observation.platforms {
            let id = self.object_id(&p.name);
            writeln!(
                self.writer,
                "{id:x},T={:.7}|{:.7}|{:.1}|{:.1}|{:.1}|{:.1},Name={}",
                p.lon, p.lat, p.alt, p.roll, p.pitch, p.heading, p.name
            )?;
        }
        Ok(())
    }

    fn close(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}
