//! SpawnLayoutUseCase: turns a named layout into windows on screen.
//!
//! This use case sits at the application layer and delegates every
//! window-manager interaction to a [`WindowManagerPort`].  The sway/i3 IPC
//! client and the in-memory recording port live in the infrastructure layer.
//!
//! # Order of checks
//!
//! [`build_and_spawn`] validates the whole layout set, resolves the requested
//! layout, and checks the workspace precondition before the first operation is
//! issued.  Any failure up to that point leaves the screen untouched.  After
//! that, operations are applied strictly in scheduled order; the first port
//! failure aborts the run and the windows opened so far stay where they are.

use std::collections::HashSet;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use rezide_core::protocol::ProtocolError;
use rezide_core::{build, schedule, validate, LayoutError, LayoutSet, Node, Operation, Orientation};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Largest number of windows the target workspace may already hold.
///
/// With two or more windows there is no telling which one the first split
/// would apply to.
pub const MAX_PREEXISTING_WINDOWS: usize = 1;

/// Error type for window-manager port operations.
#[derive(Debug, Error)]
pub enum WindowManagerError {
    #[error("no window manager socket given and neither SWAYSOCK nor I3SOCK is set")]
    NoSocket,
    #[error("could not connect to window manager socket {path}: {source}")]
    Connect {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("I/O error talking to the window manager: {0}")]
    Io(#[from] io::Error),
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
    #[error("expected reply of type {expected}, got {got}")]
    UnexpectedReply { expected: u32, got: u32 },
    #[error("command `{command}` failed: {reason}")]
    CommandFailed { command: String, reason: String },
    #[error("no window carries mark \"{0}\"")]
    MarkNotFound(String),
    #[error("{count} windows carry mark \"{mark}\"")]
    AmbiguousMark { mark: String, count: usize },
    #[error("no workspace has focus")]
    NoFocusedWorkspace,
    #[error("no window has focus")]
    NoFocusedWindow,
    #[error("no new window appeared within {waited:?} after `{command}`")]
    Timeout { command: String, waited: Duration },
    #[error("window manager error: {0}")]
    Other(String),
}

/// Window-manager primitives the layout engine needs.
///
/// Every method blocks until the window manager has applied the change.
#[cfg_attr(test, mockall::automock)]
pub trait WindowManagerPort {
    /// Returns the number of windows on the focused workspace.
    fn count_workspace_windows(&mut self) -> Result<usize, WindowManagerError>;

    /// Runs `command` and marks the window it opens with `mark`.
    ///
    /// Returns once the new window exists and carries the mark.  The new
    /// window has focus afterwards.
    fn make_window(&mut self, mark: &str, command: &str) -> Result<(), WindowManagerError>;

    /// Focuses the window carrying `mark`.
    fn focus(&mut self, mark: &str) -> Result<(), WindowManagerError>;

    /// Splits the focused container and gives the resulting parent a mark of
    /// its own.  Focus stays on the window that was split.
    fn split_and_mark_parent(&mut self, orientation: Orientation)
        -> Result<(), WindowManagerError>;

    /// Sets the width of the window carrying `mark`, in percent of its parent.
    fn resize_width(&mut self, mark: &str, percent: u8) -> Result<(), WindowManagerError>;

    /// Sets the height of the window carrying `mark`, in percent of its parent.
    fn resize_height(&mut self, mark: &str, percent: u8) -> Result<(), WindowManagerError>;
}

/// Error type for the spawn use case.
#[derive(Debug, Error)]
pub enum SpawnError {
    /// The layout set is invalid or the layout does not exist.
    #[error(transparent)]
    Layout(#[from] LayoutError),

    /// The workspace already holds too many windows.
    #[error(
        "workspace already has {found} windows; at most {} is allowed",
        MAX_PREEXISTING_WINDOWS
    )]
    Precondition { found: usize },

    /// The window manager failed; `completed` operations were applied first.
    #[error("window manager failed after {completed} of {total} operations: {source}")]
    Port {
        completed: usize,
        total: usize,
        #[source]
        source: WindowManagerError,
    },

    /// An operation tried to focus a window this run never created.
    #[error("cannot focus \"{0}\" before it has been created")]
    FocusBeforeCreate(String),
}

/// Summary of a completed spawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpawnReport {
    /// Every operation applied, in order.
    pub operations: Vec<Operation>,
    /// Number of windows opened.
    pub windows_created: usize,
}

/// Validates `set`, resolves the layout called `name`, and spawns it.
///
/// # Errors
///
/// - [`SpawnError::Layout`] if validation or resolution fails.
/// - [`SpawnError::Precondition`] if the workspace is too crowded.
/// - [`SpawnError::Port`] if the window manager fails mid-sequence.
pub fn build_and_spawn<P>(set: &LayoutSet, name: &str, port: &mut P) -> Result<SpawnReport, SpawnError>
where
    P: WindowManagerPort + ?Sized,
{
    validate(set)?;
    let tree = build(set, name)?;
    info!("opening layout \"{name}\" ({} windows)", tree.windows().len());
    spawn(&tree, port)
}

/// Checks the workspace precondition, then applies the schedule for `tree`.
///
/// # Errors
///
/// See [`build_and_spawn`]; layout errors cannot occur here.
pub fn spawn<P>(tree: &Node, port: &mut P) -> Result<SpawnReport, SpawnError>
where
    P: WindowManagerPort + ?Sized,
{
    let operations = schedule(tree);

    let found = port
        .count_workspace_windows()
        .map_err(|source| SpawnError::Port {
            completed: 0,
            total: operations.len(),
            source,
        })?;
    if found > MAX_PREEXISTING_WINDOWS {
        return Err(SpawnError::Precondition { found });
    }
    if found > 0 {
        warn!("workspace already has {found} window; the layout will share it");
    }

    let report = apply_operations(operations, port)?;
    info!(
        "layout complete: {} operations, {} windows",
        report.operations.len(),
        report.windows_created
    );
    Ok(report)
}

/// Applies `operations` in order, stopping at the first failure.
///
/// The set of created marks lives only for this call.
fn apply_operations<P>(operations: Vec<Operation>, port: &mut P) -> Result<SpawnReport, SpawnError>
where
    P: WindowManagerPort + ?Sized,
{
    let total = operations.len();
    let mut created: HashSet<String> = HashSet::new();

    for (completed, op) in operations.iter().enumerate() {
        debug!("applying {op}");
        let result = match op {
            Operation::MakeWindow(window) => port
                .make_window(&window.mark, &window.command)
                .map(|()| {
                    created.insert(window.mark.clone());
                }),
            Operation::FocusWindow(window) => {
                if !created.contains(window.mark.as_str()) {
                    return Err(SpawnError::FocusBeforeCreate(window.mark.clone()));
                }
                port.focus(&window.mark)
            }
            Operation::Split(orientation) => port.split_and_mark_parent(*orientation),
        };
        result.map_err(|source| SpawnError::Port {
            completed,
            total,
            source,
        })?;
    }

    let windows_created = created.len();
    Ok(SpawnReport {
        operations,
        windows_created,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
