//! Raw layout definitions and their resolution into a [`Node`] tree.
//!
//! A [`LayoutSet`] is the flat, named collection of entries read from the
//! config file.  Each entry is either a **window**:
//!
//! ```toml
//! [editor]
//! command = "alacritty -e nvim"
//! mark = "editor"
//! ```
//!
//! or a **section** whose children name other entries of the same set:
//!
//! ```toml
//! [ide]
//! split = "horizontal"
//! children = ["editor", "terminal"]
//! sizes = [70, 30]
//! is_layout = true
//! ```
//!
//! # Two phases
//!
//! [`validate`] checks the whole set at once: every entry's shape, global mark
//! uniqueness, that every child reference resolves, section arity, and finally
//! that the reference graph is acyclic.  [`build`] then resolves one named entry
//! into a tree.  `build` re-checks everything on the path it walks, so it never
//! recurses forever even when called on an unvalidated set.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::domain::node::{Node, Orientation, Section, SectionChild, Window};

const KEY_COMMAND: &str = "command";
const KEY_MARK: &str = "mark";
const KEY_SPLIT: &str = "split";
const KEY_CHILDREN: &str = "children";
const KEY_SIZES: &str = "sizes";
const KEY_IS_LAYOUT: &str = "is_layout";

/// Smallest and largest accepted section size, in percent.
const SIZE_RANGE: std::ops::RangeInclusive<i64> = 1..=100;

/// Errors raised while validating or resolving layout definitions.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LayoutError {
    /// The entry is not a valid window or section, or has the wrong field set.
    #[error("invalid definition \"{name}\": {reason}")]
    Shape { name: String, reason: String },

    /// Two windows share a mark.
    #[error("there are multiple windows with mark \"{mark}\"")]
    DuplicateMark { mark: String },

    /// A section names a child that has no definition.
    #[error("\"{child}\" is a child of \"{parent}\" but is not defined")]
    UndefinedChild { parent: String, child: String },

    /// A section has fewer than two children.
    #[error("section \"{name}\" has {count} children; at least 2 are required")]
    TooFewChildren { name: String, count: usize },

    /// The number of children and sizes of a section differ.
    #[error("section \"{name}\" has {children} children but {sizes} sizes")]
    SizeCountMismatch {
        name: String,
        children: usize,
        sizes: usize,
    },

    /// A size entry is not an integer between 1 and 100.
    #[error("section \"{name}\" has invalid size {value}; sizes must be integers from 1 to 100")]
    InvalidSize { name: String, value: String },

    /// The requested layout name is not defined.
    #[error("could not find layout \"{0}\" in config")]
    LayoutNotFound(String),

    /// Section references form a cycle.
    #[error("definitions reference each other in a cycle: {}", .cycle.join(" -> "))]
    CyclicReference { cycle: Vec<String> },
}

/// Coarse classification of a [`LayoutError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    ConfigShape,
    DuplicateMark,
    UndefinedReference,
    Arity,
    LayoutNotFound,
    CyclicReference,
}

impl LayoutError {
    /// Returns the class of this error, ignoring its payload.
    pub fn class(&self) -> ErrorClass {
        match self {
            LayoutError::Shape { .. } | LayoutError::InvalidSize { .. } => ErrorClass::ConfigShape,
            LayoutError::DuplicateMark { .. } => ErrorClass::DuplicateMark,
            LayoutError::UndefinedChild { .. } => ErrorClass::UndefinedReference,
            LayoutError::TooFewChildren { .. } | LayoutError::SizeCountMismatch { .. } => {
                ErrorClass::Arity
            }
            LayoutError::LayoutNotFound(_) => ErrorClass::LayoutNotFound,
            LayoutError::CyclicReference { .. } => ErrorClass::CyclicReference,
        }
    }
}

// ── Raw definitions ───────────────────────────────────────────────────────────

/// A format-agnostic value decoded from the config file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    List(Vec<RawValue>),
    Table(BTreeMap<String, RawValue>),
}

/// Key under which TOML decoders hand a datetime to an untagged value.
const TOML_DATETIME_KEY: &str = "$__toml_private_datetime";

impl RawValue {
    /// True for the single-key table a TOML datetime decodes into.
    fn is_datetime(&self) -> bool {
        matches!(self, RawValue::Table(t) if t.len() == 1 && t.contains_key(TOML_DATETIME_KEY))
    }

    /// Short name of the value's type, used in error messages.
    fn kind(&self) -> &'static str {
        if self.is_datetime() {
            return "datetime";
        }
        match self {
            RawValue::Bool(_) => "boolean",
            RawValue::Integer(_) => "integer",
            RawValue::Float(_) => "float",
            RawValue::String(_) => "string",
            RawValue::List(_) => "list",
            RawValue::Table(_) => "table",
        }
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::String(value.to_string())
    }
}

/// The named collection of raw definitions read from one config file.
///
/// Entries are kept sorted by name so every pass over the set is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct LayoutSet {
    entries: BTreeMap<String, RawValue>,
}

impl LayoutSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the entry called `name`.
    pub fn insert(&mut self, name: impl Into<String>, value: RawValue) {
        self.entries.insert(name.into(), value);
    }

    /// Returns the raw entry called `name`.
    pub fn get(&self, name: &str) -> Option<&RawValue> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over `(name, value)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &RawValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl FromIterator<(String, RawValue)> for LayoutSet {
    fn from_iter<I: IntoIterator<Item = (String, RawValue)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

// ── Classification ────────────────────────────────────────────────────────────

/// A raw entry after its field set has been checked.
#[derive(Debug)]
enum Definition<'a> {
    Window {
        mark: &'a str,
        command: &'a str,
    },
    Section {
        orientation: Orientation,
        children: Vec<&'a str>,
        sizes: Vec<u8>,
        is_layout: bool,
    },
}

fn shape(name: &str, reason: impl Into<String>) -> LayoutError {
    LayoutError::Shape {
        name: name.to_string(),
        reason: reason.into(),
    }
}

/// Classifies one entry as a window or a section by its exact field set.
fn classify<'a>(name: &str, value: &'a RawValue) -> Result<Definition<'a>, LayoutError> {
    let table = match value {
        RawValue::Table(table) if !value.is_datetime() => table,
        _ => return Err(shape(
            name,
            format!("expected a table, found a {}", value.kind()),
        )),
    };
    let keys: BTreeSet<&str> = table.keys().map(String::as_str).collect();

    let window_keys = BTreeSet::from([KEY_COMMAND, KEY_MARK]);
    let required = BTreeSet::from([KEY_SPLIT, KEY_CHILDREN, KEY_SIZES]);
    let allowed = BTreeSet::from([KEY_SPLIT, KEY_CHILDREN, KEY_SIZES, KEY_IS_LAYOUT]);

    if keys == window_keys {
        let mark = expect_str(name, table, KEY_MARK)?;
        let command = expect_str(name, table, KEY_COMMAND)?;
        if mark.is_empty() {
            return Err(shape(name, "mark must not be empty"));
        }
        return Ok(Definition::Window { mark, command });
    }

    if keys.is_superset(&required) && keys.is_subset(&allowed) {
        let split = expect_str(name, table, KEY_SPLIT)?;
        let orientation: Orientation = split.parse().map_err(|()| {
            shape(
                name,
                format!("split must be \"horizontal\" or \"vertical\", found \"{split}\""),
            )
        })?;

        let children = expect_list(name, table, KEY_CHILDREN)?
            .iter()
            .map(|child| match child {
                RawValue::String(s) => Ok(s.as_str()),
                other => Err(shape(
                    name,
                    format!("children must be names, found a {}", other.kind()),
                )),
            })
            .collect::<Result<Vec<_>, _>>()?;

        let sizes = expect_list(name, table, KEY_SIZES)?
            .iter()
            .map(|size| parse_size(name, size))
            .collect::<Result<Vec<_>, _>>()?;

        let is_layout = match table.get(KEY_IS_LAYOUT) {
            None => false,
            Some(RawValue::Bool(b)) => *b,
            Some(other) => {
                return Err(shape(
                    name,
                    format!("is_layout must be a boolean, found a {}", other.kind()),
                ))
            }
        };

        return Ok(Definition::Section {
            orientation,
            children,
            sizes,
            is_layout,
        });
    }

    let listed: Vec<&str> = keys.into_iter().collect();
    Err(shape(
        name,
        format!(
            "neither window nor section (keys: [{}]); a window defines exactly command and \
             mark, a section defines split, children, sizes and optionally is_layout",
            listed.join(", ")
        ),
    ))
}

fn expect_str<'a>(
    name: &str,
    table: &'a BTreeMap<String, RawValue>,
    key: &str,
) -> Result<&'a str, LayoutError> {
    match table.get(key) {
        Some(RawValue::String(s)) => Ok(s),
        Some(other) => Err(shape(
            name,
            format!("{key} must be a string, found a {}", other.kind()),
        )),
        None => Err(shape(name, format!("missing {key}"))),
    }
}

fn expect_list<'a>(
    name: &str,
    table: &'a BTreeMap<String, RawValue>,
    key: &str,
) -> Result<&'a [RawValue], LayoutError> {
    match table.get(key) {
        Some(RawValue::List(items)) => Ok(items),
        Some(other) => Err(shape(
            name,
            format!("{key} must be a list, found a {}", other.kind()),
        )),
        None => Err(shape(name, format!("missing {key}"))),
    }
}

fn parse_size(name: &str, value: &RawValue) -> Result<u8, LayoutError> {
    let invalid = || LayoutError::InvalidSize {
        name: name.to_string(),
        value: match value {
            RawValue::Integer(i) => i.to_string(),
            RawValue::Float(f) => f.to_string(),
            RawValue::String(s) => format!("\"{s}\""),
            other => format!("<{}>", other.kind()),
        },
    };
    match value {
        RawValue::Integer(i) if SIZE_RANGE.contains(i) => u8::try_from(*i).map_err(|_| invalid()),
        _ => Err(invalid()),
    }
}

/// Checks that every child resolves and that the section's arity is sound.
fn check_section(
    set: &LayoutSet,
    name: &str,
    children: &[&str],
    sizes: &[u8],
) -> Result<(), LayoutError> {
    if let Some(missing) = children.iter().find(|child| !set.contains(child)) {
        return Err(LayoutError::UndefinedChild {
            parent: name.to_string(),
            child: missing.to_string(),
        });
    }
    if children.len() < Section::MIN_CHILDREN {
        return Err(LayoutError::TooFewChildren {
            name: name.to_string(),
            count: children.len(),
        });
    }
    if children.len() != sizes.len() {
        return Err(LayoutError::SizeCountMismatch {
            name: name.to_string(),
            children: children.len(),
            sizes: sizes.len(),
        });
    }
    Ok(())
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Validates every entry of `set`.
///
/// Marks are checked for uniqueness across the whole set, not just within one
/// layout.  After every entry passes, the section reference graph is checked
/// for cycles.
///
/// # Errors
///
/// Returns the first [`LayoutError`] found, visiting entries in name order.
pub fn validate(set: &LayoutSet) -> Result<(), LayoutError> {
    let mut seen_marks: HashSet<&str> = HashSet::new();
    let mut graph: BTreeMap<&str, Vec<&str>> = BTreeMap::new();

    for (name, value) in set.iter() {
        match classify(name, value)? {
            Definition::Window { mark, .. } => {
                if !seen_marks.insert(mark) {
                    return Err(LayoutError::DuplicateMark {
                        mark: mark.to_string(),
                    });
                }
            }
            Definition::Section {
                children, sizes, ..
            } => {
                check_section(set, name, &children, &sizes)?;
                graph.insert(name, children);
            }
        }
    }

    detect_cycles(&graph)?;
    debug!(
        "validated {} definitions ({} sections, {} windows)",
        set.len(),
        graph.len(),
        seen_marks.len()
    );
    Ok(())
}

/// Resolves the entry called `name` into a layout tree.
///
/// # Errors
///
/// - [`LayoutError::LayoutNotFound`] if `name` is not defined.
/// - [`LayoutError::CyclicReference`] if a section is reached again while
///   still being resolved.
/// - [`LayoutError::DuplicateMark`] if the same window appears twice in the
///   resolved tree (for example, two sections naming the same child).
/// - Any shape, reference, or arity error met along the way.
pub fn build(set: &LayoutSet, name: &str) -> Result<Node, LayoutError> {
    let root = set
        .get(name)
        .ok_or_else(|| LayoutError::LayoutNotFound(name.to_string()))?;
    let mut resolver = Resolver {
        set,
        path: Vec::new(),
        marks: HashSet::new(),
    };
    let tree = resolver.resolve(name, root)?;
    debug!(
        "built layout \"{name}\" with {} windows, depth {}",
        resolver.marks.len(),
        tree.depth()
    );
    Ok(tree)
}

/// Returns the names of the entries flagged with `is_layout = true`, sorted.
///
/// With `include_unflagged`, every section entry is returned instead.
/// Entries that fail classification are skipped.
pub fn layout_names(set: &LayoutSet, include_unflagged: bool) -> Vec<&str> {
    set.iter()
        .filter(|(name, value)| {
            matches!(
                classify(name, value),
                Ok(Definition::Section { is_layout, .. }) if is_layout || include_unflagged
            )
        })
        .map(|(name, _)| name)
        .collect()
}

// ── Private helpers ───────────────────────────────────────────────────────────

struct Resolver<'a> {
    set: &'a LayoutSet,
    /// Names currently being resolved, outermost first.
    path: Vec<&'a str>,
    marks: HashSet<String>,
}

impl<'a> Resolver<'a> {
    fn resolve(&mut self, name: &'a str, value: &'a RawValue) -> Result<Node, LayoutError> {
        match classify(name, value)? {
            Definition::Window { mark, command } => {
                if !self.marks.insert(mark.to_string()) {
                    return Err(LayoutError::DuplicateMark {
                        mark: mark.to_string(),
                    });
                }
                Ok(Node::Window(Window {
                    mark: mark.to_string(),
                    command: command.to_string(),
                }))
            }
            Definition::Section {
                orientation,
                children,
                sizes,
                ..
            } => {
                check_section(self.set, name, &children, &sizes)?;
                if let Some(start) = self.path.iter().position(|n| *n == name) {
                    let mut cycle: Vec<String> =
                        self.path[start..].iter().map(|n| n.to_string()).collect();
                    cycle.push(name.to_string());
                    return Err(LayoutError::CyclicReference { cycle });
                }

                self.path.push(name);
                let mut resolved = Vec::with_capacity(children.len());
                for (child, size) in children.into_iter().zip(sizes) {
                    let (child_name, child_value) = self
                        .set
                        .entries
                        .get_key_value(child)
                        .map(|(k, v)| (k.as_str(), v))
                        .ok_or_else(|| LayoutError::UndefinedChild {
                            parent: name.to_string(),
                            child: child.to_string(),
                        })?;
                    resolved.push(SectionChild {
                        node: self.resolve(child_name, child_value)?,
                        size,
                    });
                }
                self.path.pop();

                let count = resolved.len();
                Section::new(orientation, resolved)
                    .map(Node::Section)
                    .ok_or_else(|| LayoutError::TooFewChildren {
                        name: name.to_string(),
                        count,
                    })
            }
        }
    }
}

/// Depth-first search over the section graph; a back edge is a cycle.
fn detect_cycles(graph: &BTreeMap<&str, Vec<&str>>) -> Result<(), LayoutError> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        InProgress,
        Done,
    }

    fn visit<'g>(
        node: &'g str,
        graph: &BTreeMap<&'g str, Vec<&'g str>>,
        marks: &mut BTreeMap<&'g str, Mark>,
        stack: &mut Vec<&'g str>,
    ) -> Result<(), LayoutError> {
        match marks.get(node) {
            Some(Mark::Done) => return Ok(()),
            Some(Mark::InProgress) => {
                let start = stack.iter().position(|n| *n == node).unwrap_or(0);
                let mut cycle: Vec<String> = stack[start..].iter().map(|n| n.to_string()).collect();
                cycle.push(node.to_string());
                return Err(LayoutError::CyclicReference { cycle });
            }
            None => {}
        }
        // Windows are leaves of the graph.
        let Some(children) = graph.get(node) else {
            return Ok(());
        };
        marks.insert(node, Mark::InProgress);
        stack.push(node);
        for child in children {
            visit(child, graph, marks, stack)?;
        }
        stack.pop();
        marks.insert(node, Mark::Done);
        Ok(())
    }

    let mut marks = BTreeMap::new();
    let mut stack = Vec::new();
    for node in graph.keys() {
        visit(node, graph, &mut marks, &mut stack)?;
    }
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
