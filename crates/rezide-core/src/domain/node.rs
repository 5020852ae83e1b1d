//! The layout tree domain entity.
//!
//! A resolved layout is a tree with exactly one root.  Leaves are [`Window`]s
//! (one on-screen window plus the command that launches it); internal nodes
//! are [`Section`]s that divide their space among two or more children along
//! one [`Orientation`].
//!
//! Trees are built once per invocation by [`crate::domain::definitions::build`]
//! and are never mutated afterwards.

use std::fmt;
use std::str::FromStr;

/// Direction in which a section divides its space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Orientation {
    /// Children are placed side by side, left to right.
    Horizontal,
    /// Children are stacked top to bottom.
    Vertical,
}

impl Orientation {
    /// Returns the keyword used both in layout files and in window-manager
    /// `split` commands.
    pub fn as_str(&self) -> &'static str {
        match self {
            Orientation::Horizontal => "horizontal",
            Orientation::Vertical => "vertical",
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Orientation {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "horizontal" => Ok(Orientation::Horizontal),
            "vertical" => Ok(Orientation::Vertical),
            _ => Err(()),
        }
    }
}

/// A leaf of the layout: one window and the command that opens it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Window {
    /// Unique label used to find and refocus the window later.
    pub mark: String,
    /// Shell command executed by the window manager to open the window.
    pub command: String,
}

/// One weighted child of a [`Section`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionChild {
    /// The child subtree.
    pub node: Node,
    /// Share of the parent section in percent (1..=100).
    ///
    /// Sizes of siblings are not required to sum to 100.
    pub size: u8,
}

/// An internal node: an orientation plus an ordered list of weighted children.
///
/// Always holds at least two children; [`Section::new`] refuses anything less.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    orientation: Orientation,
    children: Vec<SectionChild>,
}

impl Section {
    /// Minimum number of children a section must have.
    pub const MIN_CHILDREN: usize = 2;

    /// Creates a section, returning `None` when fewer than
    /// [`Section::MIN_CHILDREN`] children are given.
    pub fn new(orientation: Orientation, children: Vec<SectionChild>) -> Option<Self> {
        if children.len() < Self::MIN_CHILDREN {
            return None;
        }
        Some(Self {
            orientation,
            children,
        })
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn children(&self) -> &[SectionChild] {
        &self.children
    }

    /// The first child; it anchors the split of this section.
    pub fn first(&self) -> &SectionChild {
        &self.children[0]
    }

    /// Every child after the first, in order.
    pub fn rest(&self) -> &[SectionChild] {
        &self.children[1..]
    }
}

/// A node of the layout tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Window(Window),
    Section(Section),
}

impl Node {
    /// Returns `true` if this node is a [`Section`].
    pub fn is_section(&self) -> bool {
        matches!(self, Node::Section(_))
    }

    /// Returns every window of the subtree in left-to-right (pre-order) order.
    pub fn windows(&self) -> Vec<&Window> {
        let mut out = Vec::new();
        collect_windows(self, &mut out);
        out
    }

    /// Returns the number of section levels below and including this node.
    ///
    /// A lone window has depth 0.
    pub fn depth(&self) -> usize {
        match self {
            Node::Window(_) => 0,
            Node::Section(section) => {
                1 + section
                    .children()
                    .iter()
                    .map(|child| child.node.depth())
                    .max()
                    .unwrap_or(0)
            }
        }
    }
}

/// Returns the window reached by always following a section's first child.
///
/// This is the window that must hold focus right before the section is split.
pub fn leftmost_descendant(node: &Node) -> &Window {
    let mut current = node;
    loop {
        match current {
            Node::Window(window) => return window,
            Node::Section(section) => current = &section.first().node,
        }
    }
}

fn collect_windows<'a>(node: &'a Node, out: &mut Vec<&'a Window>) {
    match node {
        Node::Window(window) => out.push(window),
        Node::Section(section) => {
            for child in section.children() {
                collect_windows(&child.node, out);
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
