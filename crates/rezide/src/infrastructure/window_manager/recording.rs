//! In-memory window manager for dry runs and tests.
//!
//! # Why a recording port?
//!
//! The real client needs a running compositor and actually opens windows.
//! `RecordingWindowManager` instead pushes every call into `calls`, so the
//! exact sequence a layout would produce can be printed (`rezide open
//! --dry-run`) or asserted on in tests.
//!
//! It also keeps just enough state to catch mistakes a real window manager
//! would reject: focusing or resizing a mark that was never created fails with
//! [`WindowManagerError::MarkNotFound`], and creating a mark twice fails with
//! [`WindowManagerError::AmbiguousMark`].
//!
//! # `fail_after` hook
//!
//! Set `fail_after = Some(n)` to let the first `n` mutating calls succeed and
//! fail every later one, for testing partial runs.

use std::collections::HashSet;
use std::fmt;

use rezide_core::Orientation;

use crate::application::spawn_layout::{WindowManagerError, WindowManagerPort};

/// One call received by [`RecordingWindowManager`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedCall {
    CountWorkspaceWindows,
    MakeWindow { mark: String, command: String },
    Focus(String),
    SplitAndMarkParent(Orientation),
    ResizeWidth { mark: String, percent: u8 },
    ResizeHeight { mark: String, percent: u8 },
}

impl RecordedCall {
    /// Returns `true` for calls that would change the screen.
    pub fn is_mutating(&self) -> bool {
        !matches!(self, RecordedCall::CountWorkspaceWindows)
    }
}

impl fmt::Display for RecordedCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordedCall::CountWorkspaceWindows => f.write_str("count workspace windows"),
            RecordedCall::MakeWindow { mark, command } => {
                write!(f, "make window \"{mark}\": {command}")
            }
            RecordedCall::Focus(mark) => write!(f, "focus \"{mark}\""),
            RecordedCall::SplitAndMarkParent(o) => write!(f, "split {o}"),
            RecordedCall::ResizeWidth { mark, percent } => {
                write!(f, "resize \"{mark}\" width {percent}%")
            }
            RecordedCall::ResizeHeight { mark, percent } => {
                write!(f, "resize \"{mark}\" height {percent}%")
            }
        }
    }
}

/// A window manager that records calls instead of performing them.
#[derive(Debug, Default)]
pub struct RecordingWindowManager {
    /// Every call received, in order.
    pub calls: Vec<RecordedCall>,
    /// Reported by `count_workspace_windows`.
    pub existing_windows: usize,
    /// Number of mutating calls allowed to succeed; `None` means all.
    pub fail_after: Option<usize>,
    marks: HashSet<String>,
}

impl RecordingWindowManager {
    /// Creates an empty recorder reporting an empty workspace.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a recorder whose workspace already holds `count` windows.
    pub fn with_existing_windows(count: usize) -> Self {
        Self {
            existing_windows: count,
            ..Self::default()
        }
    }

    /// Creates a recorder that lets `limit` mutating calls succeed and fails the next.
    pub fn failing_after(limit: usize) -> Self {
        Self {
            fail_after: Some(limit),
            ..Self::default()
        }
    }

    /// Returns the recorded calls that would change the screen.
    pub fn mutating_calls(&self) -> impl Iterator<Item = &RecordedCall> {
        self.calls.iter().filter(|c| c.is_mutating())
    }

    /// Records `call` and returns an error if the failure hook trips.
    fn record(&mut self, call: RecordedCall) -> Result<(), WindowManagerError> {
        self.calls.push(call);
        if let Some(limit) = self.fail_after {
            if self.mutating_calls().count() > limit {
                return Err(WindowManagerError::Other("injected failure".to_string()));
            }
        }
        Ok(())
    }

    fn require_mark(&self, mark: &str) -> Result<(), WindowManagerError> {
        if self.marks.contains(mark) {
            Ok(())
        } else {
            Err(WindowManagerError::MarkNotFound(mark.to_string()))
        }
    }
}

impl WindowManagerPort for RecordingWindowManager {
    fn count_workspace_windows(&mut self) -> Result<usize, WindowManagerError> {
        self.calls.push(RecordedCall::CountWorkspaceWindows);
        Ok(self.existing_windows)
    }

    fn make_window(&mut self, mark: &str, command: &str) -> Result<(), WindowManagerError> {
        self.record(RecordedCall::MakeWindow {
            mark: mark.to_string(),
            command: command.to_string(),
        })?;
        if !self.marks.insert(mark.to_string()) {
            return Err(WindowManagerError::AmbiguousMark {
                mark: mark.to_string(),
                count: 2,
            });
        }
        Ok(())
    }

    fn focus(&mut self, mark: &str) -> Result<(), WindowManagerError> {
        self.record(RecordedCall::Focus(mark.to_string()))?;
        self.require_mark(mark)
    }

    fn split_and_mark_parent(&mut self, orientation: Orientation) -> Result<(), WindowManagerError> {
        self.record(RecordedCall::SplitAndMarkParent(orientation))
    }

    fn resize_width(&mut self, mark: &str, percent: u8) -> Result<(), WindowManagerError> {
        self.record(RecordedCall::ResizeWidth {
            mark: mark.to_string(),
            percent,
        })?;
        self.require_mark(mark)
    }

    fn resize_height(&mut self, mark: &str, percent: u8) -> Result<(), WindowManagerError> {
        self.record(RecordedCall::ResizeHeight {
            mark: mark.to_string(),
            percent,
        })?;
        self.require_mark(mark)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_window_manager_records_calls_in_order() {
        // Arrange
        let mut wm = RecordingWindowManager::new();

        // Act
        wm.make_window("a", "alacritty").unwrap();
        wm.split_and_mark_parent(Orientation::Vertical).unwrap();
        wm.focus("a").unwrap();

        // Assert
        assert_eq!(
            wm.calls,
            [
                RecordedCall::MakeWindow {
                    mark: "a".to_string(),
                    command: "alacritty".to_string()
                },
                RecordedCall::SplitAndMarkParent(Orientation::Vertical),
                RecordedCall::Focus("a".to_string()),
            ]
        );
    }

    #[test]
    fn test_recording_window_manager_focus_unknown_mark_fails() {
        let mut wm = RecordingWindowManager::new();

        let err = wm.focus("ghost").unwrap_err();

        assert!(matches!(err, WindowManagerError::MarkNotFound(ref m) if m == "ghost"));
    }

    #[test]
    fn test_recording_window_manager_rejects_duplicate_mark() {
        let mut wm = RecordingWindowManager::new();
        wm.make_window("a", "alacritty").unwrap();

        assert!(matches!(
            wm.make_window("a", "alacritty"),
            Err(WindowManagerError::AmbiguousMark { .. })
        ));
    }

    #[test]
    fn test_recording_window_manager_fail_after_trips_on_next_mutating_call() {
        // Arrange
        let mut wm = RecordingWindowManager::failing_after(1);

        // Act / Assert: counting never trips the hook
        assert_eq!(wm.count_workspace_windows().unwrap(), 0);
        assert!(wm.make_window("a", "alacritty").is_ok());
        assert!(wm.split_and_mark_parent(Orientation::Horizontal).is_err());
        assert_eq!(wm.mutating_calls().count(), 2);
    }

    #[test]
    fn test_recording_window_manager_reports_existing_windows() {
        let mut wm = RecordingWindowManager::with_existing_windows(2);

        assert_eq!(wm.count_workspace_windows().unwrap(), 2);
        assert_eq!(wm.mutating_calls().count(), 0);
    }

    #[test]
    fn test_recorded_call_display() {
        assert_eq!(
            RecordedCall::MakeWindow {
                mark: "ed".to_string(),
                command: "nvim".to_string()
            }
            .to_string(),
            "make window \"ed\": nvim"
        );
        assert_eq!(
            RecordedCall::ResizeWidth {
                mark: "ed".to_string(),
                percent: 40
            }
            .to_string(),
            "resize \"ed\" width 40%"
        );
    }
}
