//! Identity Paths
//!
//! Descriptors are rebuilt on every render, so nothing about them can be used
//! to recognise "the same component" across renders except where it sits in
//! the tree. An identity path spells that position out as a string:
//!
//! ```text
//! <parent>.k<key>.<type tag>          keyed child
//! <parent>.i<occurrence>.<type tag>   keyless child
//! ```
//!
//! `occurrence` counts earlier keyless siblings of the *same type*, so
//! inserting a `<p>` in front of two `<Counter>`s does not shift the
//! counters' paths. Keys take precedence over occurrence counting.
//!
//! Hook state is stored under these paths, and the reconciler relies on the
//! exact tie-break rules above: any change here changes which state a
//! component sees after a reorder.

use super::element::{NodeType, VNode};

/// Compute the identity path of the child at `index` among `siblings`.
pub fn create_child_path(
    parent_path: &str,
    key: Option<&str>,
    index: usize,
    ty: &NodeType,
    siblings: &[VNode],
) -> String {
    let tag = ty.path_tag();

    if let Some(key) = key {
        return format!("{}.k{}.{}", parent_path, key, tag);
    }

    let occurrence = siblings
        .iter()
        .take(index)
        .filter(|sibling| sibling.key().is_none() && sibling.ty() == ty)
        .count();

    format!("{}.i{}.{}", parent_path, occurrence, tag)
}

/// Whether `path` is `ancestor` itself or lies below it.
pub(crate) fn is_within(path: &str, ancestor: &str) -> bool {
    match path.strip_prefix(ancestor) {
        Some(rest) => rest.is_empty() || rest.starts_with('.'),
        None => false,
    }
}
