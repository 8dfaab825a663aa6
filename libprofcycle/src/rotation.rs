//! Persisted rotation state for preordered strategies
//!
//! The pending list of the current cycle lives in a plain-text sidecar file
//! inside the image directory, one file name per line, first line served
//! next. The file is removed as soon as the cycle is complete, so an absent
//! file and an empty list mean the same thing.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use crate::error::{Result, SelectionError};
use crate::strategy::StrategyKind;

/// Pending list for one (directory, strategy) pair
#[derive(Debug, Clone)]
pub struct RotationState {
    path: PathBuf,
}

impl RotationState {
    /// State for `kind` colocated with the image directory `dir`
    pub fn for_pool(dir: &Path, kind: StrategyKind) -> Self {
        Self {
            path: dir.join(state_file_name(kind)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a pending list is currently persisted
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Load the pending list, empty when nothing is persisted
    pub fn load_pending(&self) -> Result<VecDeque<String>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(VecDeque::new()),
            Err(e) => return Err(SelectionError::Io(e).into()),
        };

        Ok(content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }

    /// Persist `remaining`, or delete the state when it is empty
    ///
    /// Non-empty lists are written to a temporary sibling and renamed over
    /// the state file.
    pub fn save(&self, remaining: &VecDeque<String>) -> Result<()> {
        if remaining.is_empty() {
            return self.clear();
        }

        let content = remaining
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("\n");

        let tmp_path = self.path.with_extension("txt.tmp");
        std::fs::write(&tmp_path, content).map_err(SelectionError::Io)?;
        std::fs::rename(&tmp_path, &self.path).map_err(SelectionError::Io)?;

        tracing::debug!(
            "Saved {} pending entries to {}",
            remaining.len(),
            self.path.display()
        );
        Ok(())
    }

    /// Remove the persisted state if present
    pub fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::debug!("Rotation complete, removed {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SelectionError::Io(e).into()),
        }
    }
}

/// Sidecar file name, keyed by strategy so two strategies sharing a
/// directory never consume each other's cycle
pub fn state_file_name(kind: StrategyKind) -> String {
    format!(".pending-{}.txt", kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn queue(names: &[&str]) -> VecDeque<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_state_file_name_keyed_by_strategy() {
        assert_eq!(state_file_name(StrategyKind::Sequential), ".pending-sequential.txt");
        assert_eq!(state_file_name(StrategyKind::Shuffle), ".pending-shuffle.txt");
    }

    #[test]
    fn test_load_pending_absent_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let state = RotationState::for_pool(temp_dir.path(), StrategyKind::Sequential);

        assert!(!state.exists());
        assert!(state.load_pending().unwrap().is_empty());
    }

    #[test]
    fn test_save_writes_one_name_per_line() {
        let temp_dir = TempDir::new().unwrap();
        let state = RotationState::for_pool(temp_dir.path(), StrategyKind::Shuffle);

        state.save(&queue(&["b.png", "a.png", "c.jpg"])).unwrap();

        let raw = fs::read_to_string(state.path()).unwrap();
        assert_eq!(raw, "b.png\na.png\nc.jpg");
        assert_eq!(state.load_pending().unwrap(), queue(&["b.png", "a.png", "c.jpg"]));
    }

    #[test]
    fn test_save_empty_deletes_file() {
        let temp_dir = TempDir::new().unwrap();
        let state = RotationState::for_pool(temp_dir.path(), StrategyKind::Sequential);

        state.save(&queue(&["a.png"])).unwrap();
        assert!(state.exists());

        state.save(&VecDeque::new()).unwrap();
        assert!(!state.exists());

        // Deleting again is not an error
        state.save(&VecDeque::new()).unwrap();
    }

    #[test]
    fn test_save_leaves_no_temporary_file() {
        let temp_dir = TempDir::new().unwrap();
        let state = RotationState::for_pool(temp_dir.path(), StrategyKind::Sequential);

        state.save(&queue(&["a.png", "b.png"])).unwrap();

        let names: Vec<String> = fs::read_dir(temp_dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec![".pending-sequential.txt"]);
    }

    #[test]
    fn test_load_pending_skips_blank_lines_and_whitespace() {
        let temp_dir = TempDir::new().unwrap();
        let state = RotationState::for_pool(temp_dir.path(), StrategyKind::Sequential);

        fs::write(state.path(), "  a.png\r\n\n\nb.png  \n").unwrap();

        assert_eq!(state.load_pending().unwrap(), queue(&["a.png", "b.png"]));
    }
}
