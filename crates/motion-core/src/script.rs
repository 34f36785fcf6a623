//! Loading replay scripts from disk.

use std::path::Path;

use folio_common::error::{FolioError, FolioResult};
use folio_page_model::event::{parse_events, HostEvent};

/// Read and parse a JSONL event script.
pub fn load_script(path: &Path) -> FolioResult<Vec<HostEvent>> {
    if !path.exists() {
        return Err(FolioError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let content = std::fs::read_to_string(path)?;
    let events =
        parse_events(&content).map_err(|e| FolioError::script(e.line(), e.to_string()))?;
    tracing::debug!(path = ?path, count = events.len(), "Script loaded");
    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_script_is_file_not_found() {
        let path = std::env::temp_dir().join("folio_test_script_missing.jsonl");
        let _ = std::fs::remove_file(&path);
        match load_script(&path) {
            Err(FolioError::FileNotFound { path: missing }) => assert_eq!(missing, path),
            other => panic!("expected FileNotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_bad_line_is_script_error() {
        let dir = std::env::temp_dir().join("folio_test_script_bad");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("events.jsonl");
        std::fs::write(&path, "# header\n{\"t\":0,\"type\":\"wait\"}\nnot json\n").unwrap();

        match load_script(&path) {
            Err(FolioError::Script { line, .. }) => assert_eq!(line, 3),
            other => panic!("expected Script error, got {other:?}"),
        }
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_loads_fixture_session() {
        let path = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("../../fixtures/sample-session/events.jsonl");
        let events = load_script(&path).unwrap();
        assert_eq!(events.len(), 13);
    }
}
