//! Child list reconciliation, including the keyed diff.

use fxhash::FxHashMap;

use super::host::{Host, NodeId};
use super::lis::get_sequence;
use super::patch::Renderer;
use crate::vnode::{same_vnode_type, Children, Key, VNode};

impl<H: Host + 'static> Renderer<H> {
    /// Reconcile the children of `n1` into those of `n2`, where `container`
    /// is the host node holding them.
    pub(crate) fn patch_children(
        &self,
        n1: &VNode,
        n2: &VNode,
        container: NodeId,
        anchor: Option<NodeId>,
    ) {
        let old = n1.children();
        match n2.children() {
            Children::Text(text) => {
                if let Children::Array(old) = old {
                    self.unmount_children(old);
                }
                if old.as_text() != Some(&**text) {
                    self.host().set_element_text(container, text);
                }
            }
            Children::Array(new) => match old {
                Children::Array(old) => self.patch_keyed_children(old, new, container, anchor),
                Children::Text(_) => {
                    self.host().set_element_text(container, "");
                    self.mount_children(new, container, anchor);
                }
                Children::None => self.mount_children(new, container, anchor),
            },
            Children::None => match old {
                Children::Array(old) => self.unmount_children(old),
                Children::Text(_) => self.host().set_element_text(container, ""),
                Children::None => {}
            },
        }
    }

    pub(crate) fn mount_children(&self, children: &[VNode], container: NodeId, anchor: Option<NodeId>) {
        for child in children {
            self.patch(None, child, container, anchor);
        }
    }

    pub(crate) fn unmount_children(&self, children: &[VNode]) {
        for child in children {
            self.unmount(child, true);
        }
    }

    /// Diff two child arrays, preferring moves of keyed nodes over
    /// re-creation and moving as few nodes as possible.
    pub(crate) fn patch_keyed_children(
        &self,
        c1: &[VNode],
        c2: &[VNode],
        container: NodeId,
        parent_anchor: Option<NodeId>,
    ) {
        let mut i = 0usize;
        // Inclusive ends; -1 means exhausted.
        let mut e1 = c1.len() as isize - 1;
        let mut e2 = c2.len() as isize - 1;

        // 1. Common prefix.
        while (i as isize) <= e1 && (i as isize) <= e2 {
            if !same_vnode_type(&c1[i], &c2[i]) {
                break;
            }
            self.patch(Some(&c1[i]), &c2[i], container, None);
            i += 1;
        }

        // 2. Common suffix.
        while (i as isize) <= e1 && (i as isize) <= e2 {
            let (old, new) = (&c1[e1 as usize], &c2[e2 as usize]);
            if !same_vnode_type(old, new) {
                break;
            }
            self.patch(Some(old), new, container, None);
            e1 -= 1;
            e2 -= 1;
        }

        let start = i as isize;
        if start > e1 {
            // 3. Only new nodes remain.
            if start <= e2 {
                let anchor = self.anchor_from(c2, (e2 + 1) as usize, parent_anchor);
                for new in &c2[i..=e2 as usize] {
                    self.patch(None, new, container, anchor);
                }
            }
            return;
        }
        if start > e2 {
            // 4. Only old nodes remain.
            for old in &c1[i..=e1 as usize] {
                self.unmount(old, true);
            }
            return;
        }

        // 5. Unknown middle section.
        let (s1, s2) = (i, i);
        let (e1, e2) = (e1 as usize, e2 as usize);

        let mut key_to_new_index: FxHashMap<&Key, usize> = FxHashMap::default();
        for (index, new) in c2.iter().enumerate().take(e2 + 1).skip(s2) {
            if let Some(key) = new.key() {
                if key_to_new_index.contains_key(key) {
                    tracing::warn!(%key, "duplicate key among siblings; later node will be re-created");
                    continue;
                }
                key_to_new_index.insert(key, index);
            }
        }

        let to_be_patched = e2 - s2 + 1;
        let mut patched = 0usize;
        // Old index + 1 for each new position; 0 means mount fresh.
        let mut new_index_to_old_index = vec![0usize; to_be_patched];
        let mut moved = false;
        let mut max_new_index_so_far = 0usize;

        for (old_index, old) in c1.iter().enumerate().take(e1 + 1).skip(s1) {
            if patched >= to_be_patched {
                self.unmount(old, true);
                continue;
            }
            let new_index = match old.key() {
                Some(key) => key_to_new_index.get(key).copied(),
                None => (s2..=e2).find(|&j| {
                    new_index_to_old_index[j - s2] == 0 && same_vnode_type(old, &c2[j])
                }),
            };
            match new_index {
                // A slot already claimed by an earlier old node means `old`
                // repeats a key; it has nowhere to go.
                Some(new_index) if new_index_to_old_index[new_index - s2] == 0 => {
                    new_index_to_old_index[new_index - s2] = old_index + 1;
                    if new_index >= max_new_index_so_far {
                        max_new_index_so_far = new_index;
                    } else {
                        moved = true;
                    }
                    self.patch(Some(old), &c2[new_index], container, None);
                    patched += 1;
                }
                _ => self.unmount(old, true),
            }
        }

        // Positions in the increasing run keep their place.
        let stable = if moved {
            get_sequence(&new_index_to_old_index)
        } else {
            Vec::new()
        };
        let mut cursor = stable.len();
        for offset in (0..to_be_patched).rev() {
            let index = s2 + offset;
            let new = &c2[index];
            let anchor = self.anchor_from(c2, index + 1, parent_anchor);
            if new_index_to_old_index[offset] == 0 {
                self.patch(None, new, container, anchor);
            } else if moved {
                if cursor > 0 && stable[cursor - 1] == offset {
                    cursor -= 1;
                } else {
                    self.move_node(new, container, anchor);
                }
            }
        }
    }

    /// First host node among `children[from..]`, else `fallback`.
    fn anchor_from(&self, children: &[VNode], from: usize, fallback: Option<NodeId>) -> Option<NodeId> {
        children
            .iter()
            .skip(from)
            .find_map(|child| self.first_host_node(child))
            .or(fallback)
    }
}
