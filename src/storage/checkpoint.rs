//! Placement log persisted to a file, one event per line.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use log::{debug, info};

use biseriation_core::checkpoint::LOG_HEADER;
use biseriation_core::{CoreResult, Placement, PlacementLog};

/// Every appended event is flushed before `append` returns, so a crashed run
/// loses at most the placement it was computing.
#[derive(Debug)]
pub struct FileLog {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
}

impl FileLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            writer: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rewrite the file in the current format and keep it open for appending.
    fn open(&mut self) -> CoreResult<&mut BufWriter<File>> {
        let writer = match self.writer.take() {
            Some(writer) => writer,
            None => {
                let events = self.replay()?;
                let mut writer = BufWriter::new(File::create(&self.path)?);
                writeln!(writer, "{}", LOG_HEADER)?;
                for event in &events {
                    writeln!(writer, "{}", event.to_line())?;
                }
                writer.flush()?;
                debug!(
                    "Opened checkpoint {:?} with {} events",
                    self.path,
                    events.len()
                );
                // later writes go to the end of the file
                BufWriter::new(OpenOptions::new().append(true).open(&self.path)?)
            }
        };
        Ok(self.writer.insert(writer))
    }
}

impl PlacementLog for FileLog {
    fn reset(&mut self) -> CoreResult<()> {
        self.writer = None;
        let mut file = File::create(&self.path)?;
        writeln!(file, "{}", LOG_HEADER)?;
        info!("Reset checkpoint {:?}", self.path);
        Ok(())
    }

    fn append(&mut self, placement: Placement) -> CoreResult<()> {
        let writer = self.open()?;
        writeln!(writer, "{}", placement.to_line())?;
        writer.flush()?;
        Ok(())
    }

    /// A missing file replays as an empty log.
    fn replay(&self) -> CoreResult<Vec<Placement>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let text = std::fs::read_to_string(&self.path)?;
        Placement::parse_log(&text)
    }
}
