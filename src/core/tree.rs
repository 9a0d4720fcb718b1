/// Opaque reference to a row in a [`ProcessTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RowHandle(u64);

#[derive(Debug, Clone)]
struct Node {
    handle: RowHandle,
    label: String,
    children: Vec<Node>,
}

/// A flattened row as it should be drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct VisibleRow<'a> {
    pub depth: usize,
    pub label: &'a str,
    pub last_sibling: bool,
}

/// Ordered forest of labelled rows. Insertion order is display order.
#[derive(Debug, Default)]
pub struct ProcessTree {
    roots: Vec<Node>,
    next_handle: u64,
}

impl ProcessTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_root(&mut self, label: impl Into<String>) -> RowHandle {
        let node = self.new_node(label.into());
        let handle = node.handle;
        self.roots.push(node);
        handle
    }

    /// Appends a row beneath `parent`. Returns `None` when `parent` is not in the tree.
    pub fn add_child(&mut self, parent: RowHandle, label: impl Into<String>) -> Option<RowHandle> {
        let node = self.new_node(label.into());
        let handle = node.handle;
        let parent_node = find_mut(&mut self.roots, parent)?;
        parent_node.children.push(node);
        Some(handle)
    }

    /// Removes exactly that row (and anything beneath it). Returns false if it was absent.
    pub fn remove(&mut self, handle: RowHandle) -> bool {
        remove_from(&mut self.roots, handle)
    }

    pub fn child_count(&self, handle: RowHandle) -> usize {
        find(&self.roots, handle).map_or(0, |node| node.children.len())
    }

    pub fn contains(&self, handle: RowHandle) -> bool {
        find(&self.roots, handle).is_some()
    }

    pub fn label(&self, handle: RowHandle) -> Option<&str> {
        find(&self.roots, handle).map(|node| node.label.as_str())
    }

    pub fn root_count(&self) -> usize {
        self.roots.len()
    }

    pub fn len(&self) -> usize {
        self.rows().len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Depth-first walk in insertion order.
    pub fn rows(&self) -> Vec<VisibleRow<'_>> {
        let mut out = Vec::new();
        flatten(&self.roots, 0, &mut out);
        out
    }

    fn new_node(&mut self, label: String) -> Node {
        let handle = RowHandle(self.next_handle);
        self.next_handle += 1;
        Node {
            handle,
            label,
            children: Vec::new(),
        }
    }
}

fn find(nodes: &[Node], handle: RowHandle) -> Option<&Node> {
    for node in nodes {
        if node.handle == handle {
            return Some(node);
        }
        if let Some(found) = find(&node.children, handle) {
            return Some(found);
        }
    }
    None
}

fn find_mut(nodes: &mut [Node], handle: RowHandle) -> Option<&mut Node> {
    for node in nodes {
        if node.handle == handle {
            return Some(node);
        }
        if let Some(found) = find_mut(&mut node.children, handle) {
            return Some(found);
        }
    }
    None
}

fn remove_from(nodes: &mut Vec<Node>, handle: RowHandle) -> bool {
    if let Some(pos) = nodes.iter().position(|node| node.handle == handle) {
        nodes.remove(pos);
        return true;
    }
    nodes
        .iter_mut()
        .any(|node| remove_from(&mut node.children, handle))
}

fn flatten<'a>(nodes: &'a [Node], depth: usize, out: &mut Vec<VisibleRow<'a>>) {
    for (i, node) in nodes.iter().enumerate() {
        out.push(VisibleRow {
            depth,
            label: &node.label,
            last_sibling: i + 1 == nodes.len(),
        });
        flatten(&node.children, depth + 1, out);
    }
}
