//! Read-only inspection of a layout set.

use rezide_core::{build, layout_names, validate, LayoutError, LayoutSet};
use tracing::debug;

/// One openable layout and the windows it would open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutSummary {
    pub name: String,
    /// Marks of the layout's windows, left to right.
    pub marks: Vec<String>,
    /// Number of nested split levels.
    pub depth: usize,
}

/// Counts reported by [`check_layouts`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckSummary {
    pub entries: usize,
    pub layouts: usize,
}

/// Lists the layouts of `set`, sorted by name.
///
/// Only entries flagged `is_layout = true` are listed unless `include_all` is
/// set, in which case every section is.
///
/// # Errors
///
/// Returns the first [`LayoutError`] if the set does not validate.
pub fn list_layouts(set: &LayoutSet, include_all: bool) -> Result<Vec<LayoutSummary>, LayoutError> {
    validate(set)?;
    layout_names(set, include_all)
        .into_iter()
        .map(|name| {
            let tree = build(set, name)?;
            Ok(LayoutSummary {
                name: name.to_string(),
                marks: tree.windows().iter().map(|w| w.mark.clone()).collect(),
                depth: tree.depth(),
            })
        })
        .collect()
}

/// Validates `set` and builds every flagged layout in it.
///
/// # Errors
///
/// Returns the first [`LayoutError`] found.
pub fn check_layouts(set: &LayoutSet) -> Result<CheckSummary, LayoutError> {
    let layouts = list_layouts(set, false)?;
    debug!("checked {} entries", set.len());
    Ok(CheckSummary {
        entries: set.len(),
        layouts: layouts.len(),
    })
}
