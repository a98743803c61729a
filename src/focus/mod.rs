// src/focus/mod.rs
//! Focus tree: the single "currently focused" widget, the focus history and
//! 4-directional navigation across nested containers.

pub mod adjacency;
pub mod geometry;

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::error::FocusError;
use adjacency::Cell;
pub use geometry::{Direction, Rect};

#[repr(transparent)]
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct FocusId(u64);

impl FocusId {
    pub fn raw(self) -> u64 {
        self.0
    }
}

/// How a container resolves directional moves among its children.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Manager {
    /// Geometric nearest-neighbour search over all focusable descendants.
    Generic,
    /// Ordered children, UP/DOWN walk prev/next.
    List,
    /// Ordered children laid out in rows of `columns`; headers take a full row.
    Grid { columns: usize },
}

#[derive(Clone, Debug)]
pub struct NodeSpec {
    pub name: String,
    pub rect: Rect,
    pub focus_allow: bool,
    pub history_allow: bool,
    pub manager: Option<Manager>,
    pub header: bool,
}

impl NodeSpec {
    pub fn widget(name: impl Into<String>, rect: Rect) -> Self {
        Self {
            name: name.into(),
            rect,
            focus_allow: true,
            history_allow: true,
            manager: None,
            header: false,
        }
    }

    pub fn container(name: impl Into<String>, rect: Rect, manager: Option<Manager>) -> Self {
        Self {
            name: name.into(),
            rect,
            focus_allow: false,
            history_allow: false,
            manager,
            header: false,
        }
    }

    pub fn header(name: impl Into<String>, rect: Rect) -> Self {
        Self {
            name: name.into(),
            rect,
            focus_allow: false,
            history_allow: false,
            manager: None,
            header: true,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FocusEvent {
    Enter(FocusId),
    Exit(FocusId),
}

struct Node {
    spec: NodeSpec,
    parent: Option<FocusId>,
    children: Vec<FocusId>,
    last_focused_child: Option<FocusId>,
}

pub struct FocusTree {
    nodes: HashMap<FocusId, Node>,
    root: FocusId,
    next_id: u64,
    focused: Option<FocusId>,
    history: Vec<FocusId>,
    pending_fallback: bool,
    events: Vec<FocusEvent>,
}

impl Default for FocusTree {
    fn default() -> Self {
        Self::new()
    }
}

impl FocusTree {
    pub fn new() -> Self {
        let root = FocusId(0);
        let mut nodes = HashMap::new();
        nodes.insert(
            root,
            Node {
                spec: NodeSpec::container("root", Rect::default(), Some(Manager::Generic)),
                parent: None,
                children: Vec::new(),
                last_focused_child: None,
            },
        );
        Self {
            nodes,
            root,
            next_id: 1,
            focused: None,
            history: Vec::new(),
            pending_fallback: false,
            events: Vec::new(),
        }
    }

    pub fn root(&self) -> FocusId {
        self.root
    }

    pub fn focused(&self) -> Option<FocusId> {
        self.focused
    }

    pub fn history(&self) -> &[FocusId] {
        &self.history
    }

    pub fn contains(&self, id: FocusId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn name(&self, id: FocusId) -> Option<&str> {
        self.nodes.get(&id).map(|n| n.spec.name.as_str())
    }

    pub fn rect(&self, id: FocusId) -> Option<Rect> {
        self.nodes.get(&id).map(|n| n.spec.rect)
    }

    pub fn children(&self, id: FocusId) -> &[FocusId] {
        self.nodes.get(&id).map_or(&[], |n| n.children.as_slice())
    }

    pub fn take_events(&mut self) -> Vec<FocusEvent> {
        std::mem::take(&mut self.events)
    }

    // ---- tree maintenance ----

    pub fn node_add(&mut self, parent: FocusId, spec: NodeSpec) -> Result<FocusId, FocusError> {
        let Some(parent_node) = self.nodes.get_mut(&parent) else {
            return Err(FocusError::NoParent(parent.raw()));
        };
        let id = FocusId(self.next_id);
        self.next_id += 1;
        parent_node.children.push(id);
        self.nodes.insert(
            id,
            Node {
                spec,
                parent: Some(parent),
                children: Vec::new(),
                last_focused_child: None,
            },
        );
        Ok(id)
    }

    /// Remove `id` and its whole subtree. Removed nodes leave the history; if
    /// the focused node was among them the fallback runs on the next tick.
    pub fn node_remove(&mut self, id: FocusId) {
        if id == self.root {
            warn!("refusing to remove the focus root");
            return;
        }
        let Some(parent_id) = self.nodes.get(&id).map(|n| n.parent) else {
            return;
        };
        if let Some(parent) = parent_id.and_then(|p| self.nodes.get_mut(&p)) {
            parent.children.retain(|&c| c != id);
            if parent.last_focused_child == Some(id) {
                parent.last_focused_child = None;
            }
        }

        let mut stack = vec![id];
        let mut removed = Vec::new();
        while let Some(cur) = stack.pop() {
            if let Some(node) = self.nodes.remove(&cur) {
                stack.extend(node.children);
                removed.push(cur);
            }
        }
        self.history.retain(|h| !removed.contains(h));
        if self.focused.is_some_and(|f| removed.contains(&f)) {
            self.unfocus();
        }
    }

    pub fn rect_set(&mut self, id: FocusId, rect: Rect) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.spec.rect = rect;
        }
    }

    pub fn focus_allow_set(&mut self, id: FocusId, allow: bool) {
        let Some(node) = self.nodes.get_mut(&id) else {
            return;
        };
        node.spec.focus_allow = allow;
        if !allow && self.focused == Some(id) {
            self.unfocus();
        }
    }

    pub fn history_allow_set(&mut self, id: FocusId, allow: bool) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.spec.history_allow = allow;
            if !allow {
                self.history.retain(|&h| h != id);
            }
        }
    }

    // ---- focus state ----

    pub fn focus_set(&mut self, id: FocusId) -> Result<(), FocusError> {
        let target = self.resolve_target(id)?;
        let node = &self.nodes[&target];
        if !node.spec.focus_allow {
            return Err(FocusError::NotFocusable(target.raw()));
        }
        if self.focused == Some(target) {
            return Ok(());
        }
        let history_allow = node.spec.history_allow;
        let parent = node.parent;

        if let Some(prev) = self.focused.take() {
            self.events.push(FocusEvent::Exit(prev));
        }
        self.focused = Some(target);
        self.pending_fallback = false;
        self.events.push(FocusEvent::Enter(target));
        if history_allow {
            self.history.retain(|&h| h != target);
            self.history.push(target);
        }
        if let Some(p) = parent.and_then(|p| self.nodes.get_mut(&p)) {
            p.last_focused_child = Some(target);
        }
        debug!(node = target.raw(), "focus set");
        Ok(())
    }

    /// Drop focus; if nothing takes it before the next tick, the history is
    /// popped to find a replacement.
    pub fn unfocus(&mut self) {
        if let Some(prev) = self.focused.take() {
            self.events.push(FocusEvent::Exit(prev));
            self.pending_fallback = true;
        }
    }

    /// One main-loop iteration: runs the deferred "nobody is focused" fallback.
    pub fn tick(&mut self) {
        if !std::mem::take(&mut self.pending_fallback) || self.focused.is_some() {
            return;
        }
        while let Some(candidate) = self.history.pop() {
            let usable = self
                .nodes
                .get(&candidate)
                .is_some_and(|n| n.spec.focus_allow);
            if usable && self.focus_set(candidate).is_ok() {
                debug!(node = candidate.raw(), "focus restored from history");
                return;
            }
        }
    }

    /// Manager containers pass focus on to their remembered (or first)
    /// focusable child.
    fn resolve_target(&self, id: FocusId) -> Result<FocusId, FocusError> {
        let node = self.nodes.get(&id).ok_or(FocusError::Unknown(id.raw()))?;
        if !matches!(node.spec.manager, Some(Manager::List | Manager::Grid { .. })) {
            return Ok(id);
        }
        let remembered = node
            .last_focused_child
            .filter(|c| self.nodes.get(c).is_some_and(|n| n.spec.focus_allow));
        Ok(remembered
            .or_else(|| {
                node.children
                    .iter()
                    .copied()
                    .find(|c| self.nodes.get(c).is_some_and(|n| n.spec.focus_allow))
            })
            .unwrap_or(id))
    }

    // ---- directional navigation ----

    fn nearest_manager(&self, id: FocusId) -> Option<FocusId> {
        let mut cur = self.nodes.get(&id)?.parent;
        while let Some(c) = cur {
            let node = self.nodes.get(&c)?;
            if node.spec.manager.is_some() {
                return Some(c);
            }
            cur = node.parent;
        }
        None
    }

    fn is_ancestor_or_self(&self, ancestor: FocusId, mut id: FocusId) -> bool {
        loop {
            if id == ancestor {
                return true;
            }
            match self.nodes.get(&id).and_then(|n| n.parent) {
                Some(p) => id = p,
                None => return false,
            }
        }
    }

    fn has_focusable_child(&self, id: FocusId) -> bool {
        self.children(id)
            .iter()
            .any(|c| self.nodes.get(c).is_some_and(|n| n.spec.focus_allow))
    }

    fn collect_candidates(
        &self,
        from: FocusId,
        current: FocusId,
        exhausted: Option<FocusId>,
        out: &mut Vec<(FocusId, Rect)>,
    ) {
        for &child in self.children(from) {
            if child == current || Some(child) == exhausted {
                continue;
            }
            let Some(node) = self.nodes.get(&child) else {
                continue;
            };
            match node.spec.manager {
                Some(Manager::List | Manager::Grid { .. }) => {
                    if !self.is_ancestor_or_self(child, current) && self.has_focusable_child(child)
                    {
                        out.push((child, node.spec.rect));
                    }
                }
                _ => {
                    if node.children.is_empty() {
                        if node.spec.focus_allow {
                            out.push((child, node.spec.rect));
                        }
                    } else {
                        self.collect_candidates(child, current, exhausted, out);
                    }
                }
            }
        }
    }

    fn adjacent_child(&self, manager: FocusId, current: FocusId, dir: Direction) -> Option<FocusId> {
        let node = self.nodes.get(&manager)?;
        let cells: Vec<Cell> = node
            .children
            .iter()
            .map(|c| match self.nodes.get(c) {
                Some(n) if n.spec.header => Cell::Header,
                Some(n) => Cell::Item {
                    enabled: n.spec.focus_allow,
                },
                None => Cell::Item { enabled: false },
            })
            .collect();
        let pos = node
            .children
            .iter()
            .position(|&c| self.is_ancestor_or_self(c, current));
        let next = match node.spec.manager? {
            Manager::List => adjacency::list_step(&cells, pos, dir),
            Manager::Grid { columns } => adjacency::grid_step(&cells, columns, pos, dir),
            Manager::Generic => None,
        }?;
        node.children.get(next).copied()
    }

    /// Move focus one step toward `dir`. Returns `false` (and changes nothing)
    /// when no candidate exists.
    pub fn focus_move(&mut self, dir: Direction) -> bool {
        let Some(current) = self.focused else {
            return false;
        };
        let Some(source) = self.rect(current) else {
            return false;
        };

        let mut exhausted: Option<FocusId> = None;
        let mut manager = self.nearest_manager(current);
        while let Some(m) = manager {
            let kind = self.nodes.get(&m).and_then(|n| n.spec.manager);
            let next = match kind {
                Some(Manager::List | Manager::Grid { .. }) => self.adjacent_child(m, current, dir),
                _ => {
                    let mut candidates = Vec::new();
                    self.collect_candidates(m, current, exhausted, &mut candidates);
                    geometry::pick_nearest(&source, dir, candidates)
                }
            };
            if let Some(next) = next {
                if self.focus_set(next).is_ok() {
                    debug!(?dir, from = current.raw(), to = next.raw(), "focus moved");
                    return true;
                }
            }
            exhausted = Some(m);
            manager = self.nearest_manager(m);
        }
        debug!(?dir, "focus move found no candidate");
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn widget(tree: &mut FocusTree, parent: FocusId, name: &str, rect: Rect) -> FocusId {
        tree.node_add(parent, NodeSpec::widget(name, rect)).unwrap()
    }

    #[test]
    fn focusing_disallowed_node_is_an_error() {
        let mut tree = FocusTree::new();
        let root = tree.root();
        let id = tree
            .node_add(root, NodeSpec::header("title", Rect::new(0.0, 0.0, 10.0, 10.0)))
            .unwrap();
        assert_eq!(tree.focus_set(id), Err(FocusError::NotFocusable(id.raw())));
        assert_eq!(tree.focused(), None);
    }

    #[test]
    fn at_most_one_node_is_focused() {
        let mut tree = FocusTree::new();
        let root = tree.root();
        let a = widget(&mut tree, root, "a", Rect::new(0.0, 0.0, 10.0, 10.0));
        let b = widget(&mut tree, root, "b", Rect::new(20.0, 0.0, 10.0, 10.0));
        tree.focus_set(a).unwrap();
        tree.focus_set(b).unwrap();
        assert_eq!(tree.focused(), Some(b));
        assert_eq!(
            tree.take_events(),
            vec![FocusEvent::Enter(a), FocusEvent::Exit(a), FocusEvent::Enter(b)]
        );
        assert_eq!(tree.history(), &[a, b]);
    }

    #[test]
    fn down_move_prefers_directly_below() {
        let mut tree = FocusTree::new();
        let root = tree.root();
        let src = widget(&mut tree, root, "src", Rect::new(100.0, 0.0, 50.0, 50.0));
        let _left = widget(&mut tree, root, "left", Rect::new(30.0, 60.0, 50.0, 50.0));
        let below = widget(&mut tree, root, "below", Rect::new(100.0, 200.0, 50.0, 50.0));
        let _right = widget(&mut tree, root, "right", Rect::new(170.0, 60.0, 50.0, 50.0));
        tree.focus_set(src).unwrap();

        assert!(tree.focus_move(Direction::Down));
        assert_eq!(tree.focused(), Some(below));
    }

    #[test]
    fn move_without_candidates_is_silent() {
        let mut tree = FocusTree::new();
        let root = tree.root();
        let only = widget(&mut tree, root, "only", Rect::new(0.0, 0.0, 10.0, 10.0));
        assert!(!tree.focus_move(Direction::Up));
        tree.focus_set(only).unwrap();
        assert!(!tree.focus_move(Direction::Up));
        assert_eq!(tree.focused(), Some(only));
    }

    #[test]
    fn fallback_runs_on_next_tick() {
        let mut tree = FocusTree::new();
        let root = tree.root();
        let a = widget(&mut tree, root, "a", Rect::new(0.0, 0.0, 10.0, 10.0));
        let b = widget(&mut tree, root, "b", Rect::new(20.0, 0.0, 10.0, 10.0));
        tree.focus_set(a).unwrap();
        tree.focus_set(b).unwrap();

        tree.focus_allow_set(b, false);
        assert_eq!(tree.focused(), None);

        tree.tick();
        assert_eq!(tree.focused(), Some(a));
    }

    #[test]
    fn synchronous_refocus_cancels_fallback() {
        let mut tree = FocusTree::new();
        let root = tree.root();
        let a = widget(&mut tree, root, "a", Rect::new(0.0, 0.0, 10.0, 10.0));
        let b = widget(&mut tree, root, "b", Rect::new(20.0, 0.0, 10.0, 10.0));
        let c = widget(&mut tree, root, "c", Rect::new(40.0, 0.0, 10.0, 10.0));
        tree.focus_set(a).unwrap();
        tree.focus_set(b).unwrap();
        tree.unfocus();
        tree.focus_set(c).unwrap();
        tree.tick();
        assert_eq!(tree.focused(), Some(c));
    }

    #[test]
    fn removed_nodes_leave_history() {
        let mut tree = FocusTree::new();
        let root = tree.root();
        let a = widget(&mut tree, root, "a", Rect::new(0.0, 0.0, 10.0, 10.0));
        let panel = tree
            .node_add(root, NodeSpec::container("panel", Rect::default(), None))
            .unwrap();
        let b = widget(&mut tree, panel, "b", Rect::new(20.0, 0.0, 10.0, 10.0));
        tree.focus_set(a).unwrap();
        tree.focus_set(b).unwrap();

        tree.node_remove(panel);
        assert!(!tree.contains(b));
        assert_eq!(tree.history(), &[a]);
        assert_eq!(tree.focused(), None);
        tree.tick();
        assert_eq!(tree.focused(), Some(a));
        assert_eq!(tree.focus_set(b), Err(FocusError::Unknown(b.raw())));
    }

    #[test]
    fn history_skips_non_focusable_entries() {
        let mut tree = FocusTree::new();
        let root = tree.root();
        let a = widget(&mut tree, root, "a", Rect::new(0.0, 0.0, 10.0, 10.0));
        let b = widget(&mut tree, root, "b", Rect::new(20.0, 0.0, 10.0, 10.0));
        let c = widget(&mut tree, root, "c", Rect::new(40.0, 0.0, 10.0, 10.0));
        tree.focus_set(a).unwrap();
        tree.focus_set(b).unwrap();
        tree.focus_set(c).unwrap();
        tree.focus_allow_set(b, false);
        tree.focus_allow_set(c, false);
        tree.tick();
        assert_eq!(tree.focused(), Some(a));
    }

    #[test]
    fn list_manager_walks_children_then_escapes() {
        let mut tree = FocusTree::new();
        let root = tree.root();
        let list = tree
            .node_add(
                root,
                NodeSpec::container("list", Rect::new(0.0, 0.0, 100.0, 300.0), Some(Manager::List)),
            )
            .unwrap();
        let r0 = widget(&mut tree, list, "r0", Rect::new(0.0, 0.0, 100.0, 30.0));
        let r1 = tree
            .node_add(list, NodeSpec::header("sep", Rect::new(0.0, 30.0, 100.0, 30.0)))
            .unwrap();
        let r2 = widget(&mut tree, list, "r2", Rect::new(0.0, 60.0, 100.0, 30.0));
        let button = widget(&mut tree, root, "btn", Rect::new(200.0, 60.0, 80.0, 30.0));

        tree.focus_set(list).unwrap();
        assert_eq!(tree.focused(), Some(r0));
        assert!(tree.focus_move(Direction::Down));
        assert_eq!(tree.focused(), Some(r2));
        assert_ne!(tree.focused(), Some(r1));

        assert!(tree.focus_move(Direction::Right));
        assert_eq!(tree.focused(), Some(button));

        // back into the list lands on the remembered row
        assert!(tree.focus_move(Direction::Left));
        assert_eq!(tree.focused(), Some(r2));
    }

    #[test]
    fn grid_manager_keeps_column() {
        let mut tree = FocusTree::new();
        let root = tree.root();
        let grid = tree
            .node_add(
                root,
                NodeSpec::container(
                    "grid",
                    Rect::new(0.0, 0.0, 300.0, 300.0),
                    Some(Manager::Grid { columns: 3 }),
                ),
            )
            .unwrap();
        let cells: Vec<FocusId> = (0..5)
            .map(|i| {
                let rect = Rect::new((i % 3) as f32 * 100.0, (i / 3) as f32 * 100.0, 100.0, 100.0);
                widget(&mut tree, grid, &format!("c{i}"), rect)
            })
            .collect();
        tree.focus_set(cells[2]).unwrap();
        assert!(tree.focus_move(Direction::Down));
        assert_eq!(tree.focused(), Some(cells[4]));
        assert!(tree.focus_move(Direction::Left));
        assert_eq!(tree.focused(), Some(cells[3]));
        assert!(tree.focus_move(Direction::Up));
        assert_eq!(tree.focused(), Some(cells[0]));
    }
}
