//! Scrollable column layout.
//!
//! Each workspace owns a root node whose children are columns; each column
//! stacks one or more windows vertically. Nodes live in a single arena and
//! refer to each other by [`NodeId`], so selection and handle lookups stay
//! valid while the tree is rearranged.
//!
//! Scroll state lives in a [`ViewportState`] owned by the caller and passed
//! to every operation that can move the view.

use std::fmt::Write as _;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use slotmap::{SlotMap, new_key_type};
use tracing::trace;

use crate::animation::Clock;
use crate::common::collections::HashMap;
use crate::common::config::{GapSettings, LayoutSettings};
use crate::model::virtual_workspace::VirtualWorkspaceId;
use crate::sys::geometry::Size;
use crate::sys::window::WindowHandle;

mod column;
mod geometry;
mod mutation;
mod navigation;
mod swap;
mod viewport;

pub use geometry::{Visibility, WindowPlacement};
pub use viewport::{ColumnShift, ViewOffset, ViewportState};

/// Narrowest a column is ever laid out, in pixels.
pub const MIN_COLUMN_WIDTH: f64 = 32.0;

new_key_type! {
    pub struct NodeId;
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnWidth {
    /// Fraction of the working width, less one inner gap.
    Proportion(f64),
    Fixed(f64),
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct CachedWidth {
    working_width: f64,
    gap: f64,
    px: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnData {
    width: ColumnWidth,
    saved_width: Option<ColumnWidth>,
    is_full_width: bool,
    active_tile_idx: usize,
    cached: Option<CachedWidth>,
}

impl ColumnData {
    fn new(width: ColumnWidth) -> Self {
        Self {
            width,
            saved_width: None,
            is_full_width: false,
            active_tile_idx: 0,
            cached: None,
        }
    }

    pub fn width(&self) -> ColumnWidth { self.width }

    pub fn saved_width(&self) -> Option<ColumnWidth> { self.saved_width }

    pub fn is_full_width(&self) -> bool { self.is_full_width }

    pub fn active_tile_idx(&self) -> usize { self.active_tile_idx }

    /// Width from the last [`resolve_and_cache_width`](Self::resolve_and_cache_width).
    /// Never re-resolves.
    pub fn cached_width(&self) -> Option<f64> { self.cached.map(|c| c.px) }

    fn resolve(&self, working_width: f64, gap: f64) -> f64 {
        let px = if self.is_full_width {
            working_width
        } else {
            match self.width {
                ColumnWidth::Proportion(f) => f * (working_width - gap),
                ColumnWidth::Fixed(px) => px,
            }
        };
        px.max(MIN_COLUMN_WIDTH)
    }

    pub fn resolve_and_cache_width(&mut self, working_width: f64, gaps: &GapSettings) -> f64 {
        let gap = gaps.inner.horizontal;
        if let Some(cached) = self.cached
            && cached.working_width == working_width
            && cached.gap == gap
        {
            return cached.px;
        }
        let px = self.resolve(working_width, gap);
        self.cached = Some(CachedWidth { working_width, gap, px });
        px
    }

    fn invalidate_width(&mut self) { self.cached = None; }

    /// Sets an explicit width, leaving full-width mode.
    fn set_width(&mut self, width: ColumnWidth) {
        self.width = width;
        self.saved_width = None;
        self.is_full_width = false;
        self.invalidate_width();
    }

    fn swap_presentation(&mut self, other: &mut ColumnData) {
        std::mem::swap(&mut self.width, &mut other.width);
        std::mem::swap(&mut self.saved_width, &mut other.saved_width);
        std::mem::swap(&mut self.is_full_width, &mut other.is_full_width);
        self.invalidate_width();
        other.invalidate_width();
    }
}

/// Size limits reported by the window.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WindowConstraints {
    pub min_size: Size,
    pub max_size: Option<Size>,
    pub is_fixed_size: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WindowData {
    handle: WindowHandle,
    constraints: Option<WindowConstraints>,
    constraints_cached_at: Option<Duration>,
}

impl WindowData {
    pub fn handle(&self) -> WindowHandle { self.handle }

    pub fn constraints(&self) -> Option<WindowConstraints> { self.constraints }

    /// Clock time of the last constraints update.
    pub fn constraints_cached_at(&self) -> Option<Duration> { self.constraints_cached_at }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Root(VirtualWorkspaceId),
    Column(ColumnData),
    Window(WindowData),
}

#[derive(Debug, Clone)]
pub struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    kind: NodeKind,
}

impl Node {
    pub fn parent(&self) -> Option<NodeId> { self.parent }

    pub fn children(&self) -> &[NodeId] { &self.children }

    pub fn kind(&self) -> &NodeKind { &self.kind }
}

pub struct NiriLayoutEngine {
    nodes: SlotMap<NodeId, Node>,
    roots: HashMap<VirtualWorkspaceId, NodeId>,
    handle_to_node: HashMap<WindowHandle, NodeId>,
    max_windows_per_column: usize,
    default_column_width: ColumnWidth,
    preset_column_widths: Vec<f64>,
    clock: Clock,
}

impl NiriLayoutEngine {
    pub fn new(settings: &LayoutSettings, clock: Clock) -> Self {
        let mut engine = Self {
            nodes: SlotMap::default(),
            roots: HashMap::default(),
            handle_to_node: HashMap::default(),
            max_windows_per_column: 1,
            default_column_width: ColumnWidth::Proportion(0.5),
            preset_column_widths: Vec::new(),
            clock,
        };
        engine.apply_settings(settings);
        engine
    }

    pub fn apply_settings(&mut self, settings: &LayoutSettings) {
        self.max_windows_per_column = settings.max_windows_per_column.max(1);
        self.default_column_width = ColumnWidth::Proportion(settings.default_column_width);
        self.preset_column_widths = settings.preset_column_widths.clone();
    }

    pub fn max_windows_per_column(&self) -> usize { self.max_windows_per_column }

    pub fn clock(&self) -> &Clock { &self.clock }

    pub fn ensure_workspace(&mut self, ws: VirtualWorkspaceId) -> NodeId {
        if let Some(&root) = self.roots.get(&ws) {
            return root;
        }
        let root = self.nodes.insert(Node {
            parent: None,
            children: Vec::new(),
            kind: NodeKind::Root(ws),
        });
        self.roots.insert(ws, root);
        root
    }

    /// Drops a workspace's tree together with every window in it.
    pub fn remove_workspace(&mut self, ws: VirtualWorkspaceId) {
        let Some(root) = self.roots.remove(&ws) else {
            return;
        };
        let columns = self.nodes.get(root).map(|n| n.children.clone()).unwrap_or_default();
        for column in columns {
            self.destroy_column(column);
        }
        self.nodes.remove(root);
    }

    pub fn has_workspace(&self, ws: VirtualWorkspaceId) -> bool { self.roots.contains_key(&ws) }

    pub fn node(&self, id: NodeId) -> Option<&Node> { self.nodes.get(id) }

    pub fn contains_node(&self, id: NodeId) -> bool { self.nodes.contains_key(id) }

    pub fn columns(&self, ws: VirtualWorkspaceId) -> &[NodeId] {
        self.roots
            .get(&ws)
            .and_then(|&root| self.nodes.get(root))
            .map(|root| root.children.as_slice())
            .unwrap_or_default()
    }

    pub fn column_windows(&self, column: NodeId) -> &[NodeId] {
        match self.nodes.get(column) {
            Some(node) if matches!(node.kind, NodeKind::Column(_)) => &node.children,
            _ => &[],
        }
    }

    pub fn column_data(&self, column: NodeId) -> Option<&ColumnData> {
        match &self.nodes.get(column)?.kind {
            NodeKind::Column(data) => Some(data),
            _ => None,
        }
    }

    fn column_data_mut(&mut self, column: NodeId) -> Option<&mut ColumnData> {
        match &mut self.nodes.get_mut(column)?.kind {
            NodeKind::Column(data) => Some(data),
            _ => None,
        }
    }

    pub fn window_data(&self, node: NodeId) -> Option<&WindowData> {
        match &self.nodes.get(node)?.kind {
            NodeKind::Window(data) => Some(data),
            _ => None,
        }
    }

    pub fn is_window(&self, node: NodeId) -> bool { self.window_data(node).is_some() }

    /// The column a node belongs to; a column is its own column.
    pub fn column_of(&self, node: NodeId) -> Option<NodeId> {
        match self.nodes.get(node)?.kind {
            NodeKind::Column(_) => Some(node),
            NodeKind::Window(_) => self.nodes.get(node)?.parent,
            NodeKind::Root(_) => None,
        }
    }

    pub fn column_index(&self, ws: VirtualWorkspaceId, node: NodeId) -> Option<usize> {
        let column = self.column_of(node)?;
        self.columns(ws).iter().position(|&c| c == column)
    }

    pub fn active_tile(&self, column: NodeId) -> Option<NodeId> {
        let data = self.column_data(column)?;
        let windows = self.column_windows(column);
        windows.get(data.active_tile_idx.min(windows.len().checked_sub(1)?)).copied()
    }

    pub fn node_for_handle(&self, handle: WindowHandle) -> Option<NodeId> {
        self.handle_to_node.get(&handle).copied()
    }

    pub fn handle_for_node(&self, node: NodeId) -> Option<WindowHandle> {
        self.window_data(node).map(WindowData::handle)
    }

    pub fn workspace_of_node(&self, mut node: NodeId) -> Option<VirtualWorkspaceId> {
        loop {
            let n = self.nodes.get(node)?;
            match (&n.kind, n.parent) {
                (NodeKind::Root(ws), _) => return Some(*ws),
                (_, Some(parent)) => node = parent,
                (_, None) => return None,
            }
        }
    }

    pub fn workspace_of_handle(&self, handle: WindowHandle) -> Option<VirtualWorkspaceId> {
        self.workspace_of_node(self.node_for_handle(handle)?)
    }

    fn in_workspace(&self, ws: VirtualWorkspaceId, node: NodeId) -> bool {
        self.workspace_of_node(node) == Some(ws)
    }

    pub fn window_nodes(&self, ws: VirtualWorkspaceId) -> Vec<NodeId> {
        self.columns(ws).iter().flat_map(|&c| self.column_windows(c).iter().copied()).collect()
    }

    /// Handles in column order, top to bottom within a column.
    pub fn windows_in(&self, ws: VirtualWorkspaceId) -> Vec<WindowHandle> {
        self.window_nodes(ws).into_iter().filter_map(|n| self.handle_for_node(n)).collect()
    }

    pub fn window_count(&self, ws: VirtualWorkspaceId) -> usize {
        self.columns(ws).iter().map(|&c| self.column_windows(c).len()).sum()
    }

    pub fn selected_handle(&self, ws: VirtualWorkspaceId, state: &ViewportState) -> Option<WindowHandle> {
        let selected = state.selected.filter(|&n| self.in_workspace(ws, n))?;
        match self.nodes.get(selected)?.kind {
            NodeKind::Window(ref data) => Some(data.handle),
            NodeKind::Column(_) => self.handle_for_node(self.active_tile(selected)?),
            NodeKind::Root(_) => None,
        }
    }

    /// Stores the latest size limits for a window. Returns false if the
    /// handle is not tracked.
    pub fn update_window_constraints(
        &mut self,
        handle: WindowHandle,
        constraints: WindowConstraints,
    ) -> bool {
        let now = self.clock.now();
        let Some(node) = self.node_for_handle(handle) else {
            return false;
        };
        match self.nodes.get_mut(node).map(|n| &mut n.kind) {
            Some(NodeKind::Window(data)) => {
                data.constraints = Some(constraints);
                data.constraints_cached_at = Some(now);
                true
            }
            _ => false,
        }
    }

    pub fn window_constraints(&self, handle: WindowHandle) -> Option<WindowConstraints> {
        self.window_data(self.node_for_handle(handle)?)?.constraints
    }

    /// Checks the structural invariants of one workspace tree.
    pub fn check_invariants(&self, ws: VirtualWorkspaceId) -> Result<(), String> {
        let Some(&root) = self.roots.get(&ws) else {
            return Ok(());
        };
        let mut seen = crate::common::collections::HashSet::default();
        for &column in self.columns(ws) {
            let node = self.nodes.get(column).ok_or("dangling column id")?;
            if node.parent != Some(root) {
                return Err(format!("column {column:?} has wrong parent"));
            }
            let Some(data) = self.column_data(column) else {
                return Err(format!("{column:?} under root is not a column"));
            };
            if node.children.is_empty() {
                return Err(format!("column {column:?} is empty"));
            }
            if data.active_tile_idx >= node.children.len() {
                return Err(format!("column {column:?} active tile out of range"));
            }
            for &window in &node.children {
                let Some(data) = self.window_data(window) else {
                    return Err(format!("{window:?} in column is not a window"));
                };
                if self.nodes[window].parent != Some(column) {
                    return Err(format!("window {window:?} has wrong parent"));
                }
                if !seen.insert(data.handle) {
                    return Err(format!("window {} appears twice", data.handle));
                }
                if self.handle_to_node.get(&data.handle) != Some(&window) {
                    return Err(format!("handle map out of date for {}", data.handle));
                }
            }
        }
        Ok(())
    }

    fn debug_check(&self, ws: VirtualWorkspaceId) {
        if cfg!(debug_assertions)
            && let Err(err) = self.check_invariants(ws)
        {
            panic!("layout invariant violated: {err}\n{}", self.draw_tree(ws, None));
        }
    }

    /// Text dump of a workspace: one line per column, `>` marks the active
    /// column and `*` the selection.
    pub fn draw_tree(&self, ws: VirtualWorkspaceId, state: Option<&ViewportState>) -> String {
        let mut out = String::new();
        let selected = state.and_then(|s| s.selected);
        let active = state.map(|s| s.active_column_idx);
        for (idx, &column) in self.columns(ws).iter().enumerate() {
            let marker = if Some(idx) == active { '>' } else { ' ' };
            let width = match self.column_data(column) {
                Some(data) if data.is_full_width => "full".to_string(),
                Some(data) => match data.width {
                    ColumnWidth::Proportion(f) => format!("{:.0}%", f * 100.0),
                    ColumnWidth::Fixed(px) => format!("{px}px"),
                },
                None => "?".to_string(),
            };
            let _ = write!(out, "{marker}Column {idx} ({width}):");
            for &window in self.column_windows(column) {
                let handle = self.handle_for_node(window).map(|h| h.to_string()).unwrap_or_default();
                if Some(window) == selected {
                    let _ = write!(out, " [*{handle}]");
                } else {
                    let _ = write!(out, " [{handle}]");
                }
            }
            out.push('\n');
        }
        out
    }

    fn new_column(&mut self, ws: VirtualWorkspaceId, index: usize) -> NodeId {
        let root = self.ensure_workspace(ws);
        let column = self.nodes.insert(Node {
            parent: Some(root),
            children: Vec::new(),
            kind: NodeKind::Column(ColumnData::new(self.default_column_width)),
        });
        let children = &mut self.nodes[root].children;
        let index = index.min(children.len());
        children.insert(index, column);
        trace!(?column, index, "created column");
        column
    }

    fn new_window(&mut self, column: NodeId, index: usize, handle: WindowHandle) -> NodeId {
        let node = self.nodes.insert(Node {
            parent: Some(column),
            children: Vec::new(),
            kind: NodeKind::Window(WindowData {
                handle,
                constraints: None,
                constraints_cached_at: None,
            }),
        });
        self.handle_to_node.insert(handle, node);
        let children = &mut self.nodes[column].children;
        let index = index.min(children.len());
        children.insert(index, node);
        node
    }

    /// Unlinks a node from its parent without freeing it.
    fn detach(&mut self, node: NodeId) -> Option<(NodeId, usize)> {
        let parent = self.nodes.get_mut(node)?.parent.take()?;
        let children = &mut self.nodes.get_mut(parent)?.children;
        let index = children.iter().position(|&c| c == node)?;
        children.remove(index);
        Some((parent, index))
    }

    fn attach(&mut self, node: NodeId, parent: NodeId, index: usize) {
        if let Some(n) = self.nodes.get_mut(node) {
            n.parent = Some(parent);
        }
        if let Some(p) = self.nodes.get_mut(parent) {
            let index = index.min(p.children.len());
            p.children.insert(index, node);
        }
    }

    /// Frees a column and every window in it.
    fn destroy_column(&mut self, column: NodeId) {
        self.detach(column);
        let Some(node) = self.nodes.remove(column) else {
            return;
        };
        for window in node.children {
            if let Some(removed) = self.nodes.remove(window)
                && let NodeKind::Window(data) = removed.kind
            {
                self.handle_to_node.remove(&data.handle);
            }
        }
    }
}
