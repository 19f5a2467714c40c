//! Render-Skip Wrappers
//!
//! [`memo`] and [`deep_memo`] wrap a component type in a component that
//! remembers the props it last rendered with. When the next props compare
//! equal, the wrapper hands back the very descriptor it produced last time.
//! The reconciler recognises a repeated descriptor at the same path and keeps
//! the wrapped subtree as it is, so the wrapped component is not invoked and
//! its hook state stays alive.
//!
//! A state update inside the wrapped component still re-renders it: the
//! retained descriptor is only reused when nothing below it changed.

use super::memo::use_ref;
use crate::equals::{deep_equals_props, shallow_equals_props};
use crate::node::{Component, NodeType, Props, VNode};

/// Skip re-rendering while props are shallowly equal.
pub fn memo(component: &Component) -> Component {
    memo_with(component, shallow_equals_props)
}

/// Skip re-rendering while props are structurally equal.
pub fn deep_memo(component: &Component) -> Component {
    memo_with(component, deep_equals_props)
}

/// Skip re-rendering while `equals(previous, next)` holds.
pub fn memo_with<E>(component: &Component, equals: E) -> Component
where
    E: Fn(&Props, &Props) -> bool + 'static,
{
    let inner = component.clone();
    let name = format!("Memo({})", component.name());

    Component::memoizing(&name, move |props: &Props| {
        let cache = use_ref::<Option<(Props, VNode)>>(None);

        let hit = cache.with(|cached| {
            cached
                .as_ref()
                .filter(|(prev, _)| equals(prev, props))
                .map(|(_, node)| node.clone())
        });
        if let Some(node) = hit {
            return Ok(Some(node));
        }

        let node = VNode::from_parts(NodeType::Component(inner.clone()), None, props.clone());
        cache.set(Some((props.clone(), node.clone())));
        Ok(Some(node))
    })
}
