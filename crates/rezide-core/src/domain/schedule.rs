//! Spawn scheduler: linearizes a layout tree into window-manager operations.
//!
//! The window manager's only structural primitive is "split whatever has
//! focus".  A freshly created window lands in the half opened by the most
//! recent split and takes focus itself.  Given those rules, the order of
//! operations is everything.
//!
//! # Breadth-first with leftmost-child promotion (for beginners)
//!
//! Building a layout by hand, you first reserve each sibling's share of the
//! screen and only then subdivide those shares.  The scheduler does the same:
//!
//! 1. Walk the tree breadth-first, one section at a time.
//! 2. Before splitting a section, make sure its anchor (the leftmost window of
//!    its first child) exists and has focus: create it the first time, refocus
//!    it afterwards.
//! 3. Split, then create the leftmost window of every remaining child.  Each
//!    one lands in the space the split just opened.
//!
//! For `horizontal[ vertical[medium, small], big, right ]` this yields:
//!
//! ```text
//! make medium, split horizontal, make big, make right,
//! focus medium, split vertical, make small
//! ```
//!
//! Depth-first ordering would subdivide `medium`'s column before `big` and
//! `right` exist, so the window manager would hand out the wrong shares.

use std::collections::{HashSet, VecDeque};
use std::fmt;

use tracing::debug;

use crate::domain::node::{leftmost_descendant, Node, Orientation, Window};

/// One abstract window-manager primitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Launch the window's command and mark the new window.
    MakeWindow(Window),
    /// Give focus to an already created window.
    FocusWindow(Window),
    /// Split the focused container.
    Split(Orientation),
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::MakeWindow(w) => write!(f, "make \"{}\" ({})", w.mark, w.command),
            Operation::FocusWindow(w) => write!(f, "focus \"{}\"", w.mark),
            Operation::Split(o) => write!(f, "split {o}"),
        }
    }
}

/// Returns the full operation sequence that reproduces `root`.
///
/// The result depends only on the tree: scheduling the same tree twice yields
/// identical sequences.  Each mark is created by at most one
/// [`Operation::MakeWindow`]; every later use of it as an anchor is an
/// [`Operation::FocusWindow`].
pub fn schedule(root: &Node) -> Vec<Operation> {
    let mut plan = Plan::default();

    // A lone window is never anyone's leftmost descendant.
    if let Node::Window(window) = root {
        plan.ensure_at(window);
    }

    let mut queue: VecDeque<&Node> = VecDeque::from([root]);
    while let Some(current) = queue.pop_front() {
        let Node::Section(section) = current else {
            continue;
        };
        plan.ensure_at(leftmost_descendant(&section.first().node));
        plan.push(Operation::Split(section.orientation()));
        for child in section.rest() {
            plan.ensure_at(leftmost_descendant(&child.node));
        }
        queue.extend(section.children().iter().map(|child| &child.node));
    }

    debug!("scheduled {} operations", plan.operations.len());
    plan.operations
}

#[derive(Default)]
struct Plan {
    operations: Vec<Operation>,
    created: HashSet<String>,
}

impl Plan {
    /// Creates `window` if it does not exist yet, otherwise refocuses it.
    fn ensure_at(&mut self, window: &Window) {
        if self.created.insert(window.mark.clone()) {
            self.push(Operation::MakeWindow(window.clone()));
        } else {
            self.push(Operation::FocusWindow(window.clone()));
        }
    }

    fn push(&mut self, op: Operation) {
        debug!("scheduling {op}");
        self.operations.push(op);
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::node::{Section, SectionChild};

    fn win(mark: &str) -> Node {
        Node::Window(Window {
            mark: mark.to_string(),
            command: "alacritty".to_string(),
        })
    }

    fn sec(orientation: Orientation, children: Vec<(Node, u8)>) -> Node {
        let children = children
            .into_iter()
            .map(|(node, size)| SectionChild { node, size })
            .collect();
        Node::Section(Section::new(orientation, children).expect("two or more children"))
    }

    fn make(mark: &str) -> Operation {
        Operation::MakeWindow(Window {
            mark: mark.to_string(),
            command: "alacritty".to_string(),
        })
    }

    fn focus(mark: &str) -> Operation {
        Operation::FocusWindow(Window {
            mark: mark.to_string(),
            command: "alacritty".to_string(),
        })
    }

    #[test]
    fn test_schedule_flat_three_way_split() {
        let tree = sec(
            Orientation::Horizontal,
            vec![(win("left"), 25), (win("center"), 50), (win("right"), 25)],
        );

        assert_eq!(
            schedule(&tree),
            vec![
                make("left"),
                Operation::Split(Orientation::Horizontal),
                make("center"),
                make("right"),
            ]
        );
    }

    #[test]
    fn test_schedule_nested_first_child_is_refocused() {
        let tree = sec(
            Orientation::Horizontal,
            vec![
                (
                    sec(Orientation::Vertical, vec![(win("medium"), 60), (win("small"), 40)]),
                    25,
                ),
                (win("big"), 50),
                (win("right"), 25),
            ],
        );

        assert_eq!(
            schedule(&tree),
            vec![
                make("medium"),
                Operation::Split(Orientation::Horizontal),
                make("big"),
                make("right"),
                focus("medium"),
                Operation::Split(Orientation::Vertical),
                make("small"),
            ]
        );
    }

    #[test]
    fn test_schedule_nested_non_first_child_uses_its_own_anchor() {
        // horizontal[ a, vertical[ b, c ] ]
        let tree = sec(
            Orientation::Horizontal,
            vec![
                (win("a"), 50),
                (
                    sec(Orientation::Vertical, vec![(win("b"), 50), (win("c"), 50)]),
                    50,
                ),
            ],
        );

        assert_eq!(
            schedule(&tree),
            vec![
                make("a"),
                Operation::Split(Orientation::Horizontal),
                make("b"),
                focus("b"),
                Operation::Split(Orientation::Vertical),
                make("c"),
            ]
        );
    }

    #[test]
    fn test_schedule_single_window_root_makes_one_window() {
        assert_eq!(schedule(&win("solo")), vec![make("solo")]);
    }

    #[test]
    fn test_schedule_is_deterministic() {
        let tree = sec(
            Orientation::Vertical,
            vec![
                (
                    sec(Orientation::Horizontal, vec![(win("a"), 50), (win("b"), 50)]),
                    50,
                ),
                (
                    sec(Orientation::Horizontal, vec![(win("c"), 30), (win("d"), 70)]),
                    50,
                ),
            ],
        );
        assert_eq!(schedule(&tree), schedule(&tree));
    }

    #[test]
    fn test_schedule_creates_each_mark_at_most_once() {
        let tree = sec(
            Orientation::Horizontal,
            vec![
                (
                    sec(
                        Orientation::Vertical,
                        vec![
                            (
                                sec(Orientation::Horizontal, vec![(win("a"), 50), (win("b"), 50)]),
                                50,
                            ),
                            (win("c"), 50),
                        ],
                    ),
                    50,
                ),
                (win("d"), 50),
            ],
        );

        let ops = schedule(&tree);
        let mut made = HashSet::new();
        for op in &ops {
            if let Operation::MakeWindow(w) = op {
                assert!(made.insert(w.mark.clone()), "{} created twice", w.mark);
            }
        }
        assert_eq!(made.len(), 4, "every window must be created");
        // "a" anchors three nested sections: made once, refocused twice.
        let refocused = ops.iter().filter(|op| **op == focus("a")).count();
        assert_eq!(refocused, 2);
    }

    #[test]
    fn test_schedule_finishes_each_depth_before_the_next() {
        // depth 1: root; depth 2: left column and right column.
        // horizontal[ vertical[ a, b ], vertical[ c, horizontal[ d, e ] ] ]
        let tree = sec(
            Orientation::Horizontal,
            vec![
                (
                    sec(Orientation::Vertical, vec![(win("a"), 50), (win("b"), 50)]),
                    50,
                ),
                (
                    sec(
                        Orientation::Vertical,
                        vec![
                            (win("c"), 50),
                            (
                                sec(Orientation::Horizontal, vec![(win("d"), 50), (win("e"), 50)]),
                                50,
                            ),
                        ],
                    ),
                    50,
                ),
            ],
        );

        let splits: Vec<Orientation> = schedule(&tree)
            .into_iter()
            .filter_map(|op| match op {
                Operation::Split(o) => Some(o),
                _ => None,
            })
            .collect();
        assert_eq!(
            splits,
            [
                Orientation::Horizontal,
                Orientation::Vertical,
                Orientation::Vertical,
                Orientation::Horizontal,
            ]
        );

        let ops = schedule(&tree);
        let pos = |target: &Operation| ops.iter().position(|op| op == target).unwrap();
        // The deepest split ("d | e") comes after both columns are split.
        assert!(pos(&make("b")) < pos(&make("e")));
        assert!(pos(&make("d")) < pos(&make("e")));
    }

    #[test]
    fn test_operation_display() {
        assert_eq!(make("left").to_string(), "make \"left\" (alacritty)");
        assert_eq!(focus("left").to_string(), "focus \"left\"");
        assert_eq!(Operation::Split(Orientation::Vertical).to_string(), "split vertical");
    }
}
