use crate::path::TreePath;
use crate::tree::ConfigNode;

/// Path resolution. Paths are resolved from the receiver's children: the receiver plays the
/// role of the datastore root and the empty path addresses it.
impl ConfigNode {
    /// Node addressed by `path`, if present.
    pub fn find(&self, path: &TreePath) -> Option<&ConfigNode> {
        let mut current = self;
        for step in path.steps() {
            current = current.children.iter().find(|child| step.matches(child))?;
        }
        Some(current)
    }

    /// Mutable variant of [`ConfigNode::find`].
    pub fn find_mut(&mut self, path: &TreePath) -> Option<&mut ConfigNode> {
        let mut current = self;
        for step in path.steps() {
            current = current.children.iter_mut().find(|child| step.matches(child))?;
        }
        Some(current)
    }

    /// Resolve `path`, creating missing containers and list entries on the way.
    ///
    /// New list entries receive their key leaves so they match the step afterwards.
    pub fn ensure_path(&mut self, path: &TreePath) -> &mut ConfigNode {
        let mut current = self;
        for step in path.steps() {
            let idx = match current.children.iter().position(|child| step.matches(child)) {
                Some(idx) => idx,
                None => {
                    let mut node = ConfigNode::new(step.node.as_str());
                    if let Some(key) = &step.key {
                        for (leaf, value) in key.entries() {
                            node.children.push(ConfigNode::leaf(leaf.as_str(), value.as_str()));
                        }
                    }
                    current.children.push(node);
                    current.children.len() - 1
                }
            };
            current = &mut current.children[idx];
        }
        current
    }

    /// Remove every node matching the last step of `path`; returns how many were removed.
    ///
    /// An unkeyed last step removes all same-named siblings (a whole leaf-list).
    pub fn remove_at(&mut self, path: &TreePath) -> usize {
        let Some(step) = path.last() else {
            return 0;
        };
        let Some(parent) = self.find_mut(&path.parent()) else {
            return 0;
        };
        let before = parent.children.len();
        parent.children.retain(|child| !step.matches(child));
        before - parent.children.len()
    }
}
