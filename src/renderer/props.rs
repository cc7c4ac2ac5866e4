//! Props diffing.

use super::host::{Host, NodeId};
use crate::vnode::Props;

/// Whether `key` names an event handler prop (`onClick`, `onInput`, ...).
pub fn is_on(key: &str) -> bool {
    let bytes = key.as_bytes();
    bytes.len() > 2 && bytes.starts_with(b"on") && !bytes[2].is_ascii_lowercase()
}

/// Apply every prop of a freshly created element.
pub fn mount_props<H: Host>(host: &mut H, el: NodeId, props: Option<&Props>) {
    let Some(props) = props else {
        return;
    };
    for (key, value) in props {
        host.patch_prop(el, key, None, Some(value));
    }
}

/// Bring `el` from `old` props to `new` props.
///
/// Keys whose value differs are re-applied; keys only present in `old` are
/// cleared. A missing bag counts as empty.
pub fn patch_props<H: Host>(host: &mut H, el: NodeId, old: Option<&Props>, new: Option<&Props>) {
    let empty = Props::new();
    let old = old.unwrap_or(&empty);
    let new = new.unwrap_or(&empty);

    for (key, next) in new {
        let prev = old.get(key);
        if prev != Some(next) {
            host.patch_prop(el, key, prev, Some(next));
        }
    }
    for (key, prev) in old {
        if !new.contains_key(key) {
            host.patch_prop(el, key, Some(prev), None);
        }
    }
}
