//! Append-only JSONL trace of scene frames.
//!
//! The first line is a `#`-prefixed JSON header; every following line is
//! one [`SceneFrame`].

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use folio_common::config::MotionConfig;
use folio_common::error::{FolioError, FolioResult};
use serde::{Deserialize, Serialize};

use crate::scene::SceneFrame;

pub const TRACE_SCHEMA_VERSION: &str = "1.0";

/// Frames between automatic flushes.
const FLUSH_EVERY: u64 = 500;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceHeader {
    pub schema_version: String,
    /// Wall-clock start of the run (RFC 3339).
    pub started_at: String,
    pub viewport_width: f64,
    pub viewport_height: f64,
    pub frame_rate_hz: u32,
}

impl TraceHeader {
    /// Header for a run starting now.
    pub fn new(config: &MotionConfig) -> Self {
        Self {
            schema_version: TRACE_SCHEMA_VERSION.to_string(),
            started_at: chrono::Utc::now().to_rfc3339(),
            viewport_width: config.viewport_width,
            viewport_height: config.viewport_height,
            frame_rate_hz: config.frame_rate_hz,
        }
    }
}

pub struct TraceWriter {
    writer: BufWriter<File>,
    path: PathBuf,
    frames_written: u64,
}

impl TraceWriter {
    /// Create (or truncate) `path` and write the header line.
    pub fn create(path: impl Into<PathBuf>, header: &TraceHeader) -> FolioResult<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)?;
        let mut writer = BufWriter::new(file);

        let header_json = serde_json::to_string(header)?;
        writeln!(writer, "# {header_json}")
            .map_err(|e| FolioError::trace(format!("Failed to write header: {e}")))?;

        tracing::debug!(path = ?path, "Trace opened");
        Ok(Self {
            writer,
            path,
            frames_written: 0,
        })
    }

    pub fn write_frame(&mut self, frame: &SceneFrame) -> FolioResult<()> {
        let json = serde_json::to_string(frame)?;
        writeln!(self.writer, "{json}")
            .map_err(|e| FolioError::trace(format!("Failed to write frame: {e}")))?;
        self.frames_written += 1;

        if self.frames_written % FLUSH_EVERY == 0 {
            self.flush()?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> FolioResult<()> {
        self.writer
            .flush()
            .map_err(|e| FolioError::trace(format!("Failed to flush trace: {e}")))
    }

    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TraceWriter {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

/// Parse a trace file's contents: the header (if present) and every frame.
pub fn parse_trace(content: &str) -> FolioResult<(Option<TraceHeader>, Vec<SceneFrame>)> {
    let mut header = None;
    let mut frames = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(comment) = trimmed.strip_prefix('#') {
            if header.is_none() {
                header = serde_json::from_str(comment.trim()).ok();
            }
            continue;
        }
        let frame = serde_json::from_str(trimmed)
            .map_err(|e| FolioError::trace(format!("line {}: {e}", idx + 1)))?;
        frames.push(frame);
    }
    Ok((header, frames))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Scene;
    use folio_host::Host;
    use folio_page_model::page::PageLayout;

    #[test]
    fn test_trace_roundtrip() {
        let dir = std::env::temp_dir().join("folio_test_trace");
        let _ = std::fs::remove_dir_all(&dir);
        let path = dir.join("nested").join("trace.jsonl");

        let config = MotionConfig::default();
        let host = Host::from_config(&config);
        let scene = Scene::mount(&host, &PageLayout::portfolio(), &config);

        {
            let mut writer = TraceWriter::create(&path, &TraceHeader::new(&config)).unwrap();
            for _ in 0..3 {
                host.advance_by(250.0);
                writer.write_frame(&scene.frame()).unwrap();
            }
            assert_eq!(writer.frames_written(), 3);
        }

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("# "));
        let (header, frames) = parse_trace(&content).unwrap();
        let header = header.unwrap();
        assert_eq!(header.schema_version, TRACE_SCHEMA_VERSION);
        assert_eq!(header.frame_rate_hz, 60);
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[2].time_ms, 750.0);
        assert_eq!(frames[2].hero_role.revealed_text, "Reac");

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_parse_trace_reports_bad_line() {
        let err = parse_trace("# {}\n\n{not json}\n").unwrap_err();
        assert!(err.to_string().contains("line 3"), "{err}");
    }
}
