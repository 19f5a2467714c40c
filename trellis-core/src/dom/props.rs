//! Prop Application
//!
//! Descriptor props map onto a document node as follows:
//!
//! | prop                    | effect                                          |
//! |-------------------------|-------------------------------------------------|
//! | `children`              | ignored (handled by the reconciler)             |
//! | `on*`                   | event listener; swapped only if the callback changed |
//! | `className`             | class attribute, empty when absent              |
//! | `style`                 | map merged onto the live style; stale keys cleared |
//! | native property name    | set as a property, booleans mirrored as attributes |
//! | anything else           | string attribute                                |
//!
//! `data-*` and `aria-*` names are always attributes. A `Null` or missing
//! value resets a native property to its zero value and removes the
//! attribute.

use indexmap::IndexMap;

use super::{Host, NativeValue, NodeId};
use crate::node::{Props, Value, CHILDREN};

/// Apply every prop to a freshly created node.
pub(crate) fn set_props(host: &dyn Host, node: NodeId, props: &Props) {
    for (name, value) in props.iter() {
        apply_prop(host, node, name, None, Some(value));
    }
}

/// Apply the difference between two prop sets to a node.
pub(crate) fn update_props(host: &dyn Host, node: NodeId, prev: &Props, next: &Props) {
    for (name, value) in prev.iter() {
        if !next.contains(name) {
            apply_prop(host, node, name, Some(value), None);
        }
    }

    for (name, value) in next.iter() {
        let prev_value = prev.get(name);
        if prev_value.is_some_and(|p| p.same(value)) {
            continue;
        }
        apply_prop(host, node, name, prev_value, Some(value));
    }
}

fn event_name(prop: &str) -> Option<String> {
    prop.strip_prefix("on").map(str::to_lowercase)
}

fn uses_property(host: &dyn Host, node: NodeId, name: &str) -> bool {
    if name == CHILDREN || name == "className" || name == "style" {
        return false;
    }
    if name.starts_with("data-") || name.starts_with("aria-") {
        return false;
    }
    host.property(node, name).is_some()
}

fn style_map(value: Option<&Value>) -> Option<&IndexMap<String, Value>> {
    value.and_then(Value::as_map)
}

fn to_native(value: &Value) -> NativeValue {
    match value {
        Value::Bool(b) => NativeValue::Bool(*b),
        Value::Number(n) => NativeValue::Number(*n),
        other => NativeValue::Text(other.to_attribute_string()),
    }
}

fn apply_prop(
    host: &dyn Host,
    node: NodeId,
    name: &str,
    prev: Option<&Value>,
    next: Option<&Value>,
) {
    if name == CHILDREN {
        return;
    }

    if let Some(event) = event_name(name) {
        let changed = match (prev, next) {
            (Some(p), Some(n)) => !p.same(n),
            (None, None) => false,
            _ => true,
        };
        if changed {
            if let Some(old) = prev.and_then(Value::as_callback) {
                host.remove_event_listener(node, &event, old);
            }
            if let Some(new) = next.and_then(Value::as_callback) {
                host.add_event_listener(node, &event, new.clone());
            }
        }
        return;
    }

    if name == "className" {
        let class_name = match next {
            None | Some(Value::Null) => String::new(),
            Some(value) => value.to_attribute_string(),
        };
        host.set_class_name(node, &class_name);
        return;
    }

    if name == "style" {
        let next_style = style_map(next);
        if let Some(prev_style) = style_map(prev) {
            for key in prev_style.keys() {
                if !next_style.is_some_and(|s| s.contains_key(key)) {
                    host.remove_style(node, key);
                }
            }
        }
        if let Some(next_style) = next_style {
            for (key, value) in next_style {
                host.set_style(node, key, &value.to_attribute_string());
            }
        }
        return;
    }

    let next = match next {
        None | Some(Value::Null) => {
            if uses_property(host, node, name) {
                if let Some(current) = host.property(node, name) {
                    host.set_property(node, name, current.zero_like());
                }
            }
            host.remove_attribute(node, name);
            return;
        }
        Some(value) => value,
    };

    if uses_property(host, node, name) {
        host.set_property(node, name, to_native(next));
        match next {
            Value::Bool(true) => host.set_attribute(node, name, ""),
            Value::Bool(false) => host.remove_attribute(node, name),
            _ => {}
        }
        return;
    }

    host.set_attribute(node, name, &next.to_attribute_string());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::MemoryDocument;
    use crate::node::Callback;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn sets_attributes_class_and_style() {
        let doc = MemoryDocument::new();
        let div = doc.create_element("div");
        let props = Props::new()
            .with("className", "card")
            .with("data-id", 7)
            .with("style", Value::map([("color", "red"), ("width", "10px")]));

        set_props(&doc, div, &props);

        assert_eq!(doc.class_name(div), "card");
        assert_eq!(doc.attribute(div, "data-id").as_deref(), Some("7"));
        assert_eq!(doc.style(div, "color").as_deref(), Some("red"));
        assert_eq!(doc.style(div, "width").as_deref(), Some("10px"));
    }

    #[test]
    fn update_removes_stale_entries() {
        let doc = MemoryDocument::new();
        let div = doc.create_element("div");
        let prev = Props::new()
            .with("title-text", "a")
            .with("className", "x")
            .with("style", Value::map([("color", "red"), ("width", "10px")]));
        let next = Props::new().with("style", Value::map([("color", "blue")]));

        set_props(&doc, div, &prev);
        update_props(&doc, div, &prev, &next);

        assert_eq!(doc.attribute(div, "title-text"), None);
        assert_eq!(doc.class_name(div), "");
        assert_eq!(doc.style(div, "color").as_deref(), Some("blue"));
        assert_eq!(doc.style(div, "width"), None);
    }

    #[test]
    fn listeners_swap_only_when_callback_changes() {
        let doc = MemoryDocument::new();
        let button = doc.create_element("button");
        let clicks = Rc::new(Cell::new(0));

        let first = {
            let clicks = clicks.clone();
            Callback::action(move || clicks.set(clicks.get() + 1))
        };
        let prev = Props::new().with("onClick", first.clone());
        set_props(&doc, button, &prev);

        // same callback: no churn
        let same = Props::new().with("onClick", first);
        update_props(&doc, button, &prev, &same);
        assert_eq!(doc.listener_count(button, "click"), 1);

        let second = {
            let clicks = clicks.clone();
            Callback::action(move || clicks.set(clicks.get() + 10))
        };
        let next = Props::new().with("onClick", second);
        update_props(&doc, button, &same, &next);
        assert_eq!(doc.listener_count(button, "click"), 1);

        doc.dispatch(button, "click", &Value::Null);
        assert_eq!(clicks.get(), 10);

        update_props(&doc, button, &next, &Props::new());
        assert_eq!(doc.listener_count(button, "click"), 0);
    }

    #[test]
    fn boolean_properties_mirror_attributes() {
        let doc = MemoryDocument::new();
        let input = doc.create_element("input");

        let checked = Props::new().with("checked", true).with("tabIndex", 3);
        set_props(&doc, input, &checked);
        assert_eq!(doc.property(input, "checked"), Some(NativeValue::Bool(true)));
        assert_eq!(doc.attribute(input, "checked").as_deref(), Some(""));
        assert_eq!(doc.property(input, "tabIndex"), Some(NativeValue::Number(3.0)));
        // numeric properties are not mirrored
        assert_eq!(doc.attribute(input, "tabIndex"), None);

        let unchecked = Props::new().with("checked", false).with("tabIndex", 3);
        update_props(&doc, input, &checked, &unchecked);
        assert_eq!(doc.property(input, "checked"), Some(NativeValue::Bool(false)));
        assert_eq!(doc.attribute(input, "checked"), None);
    }

    #[test]
    fn null_resets_properties_and_removes_attributes() {
        let doc = MemoryDocument::new();
        let input = doc.create_element("input");
        let prev = Props::new().with("disabled", true).with("value", "hi");
        let next = Props::new().with("disabled", Value::Null);

        set_props(&doc, input, &prev);
        update_props(&doc, input, &prev, &next);

        assert_eq!(doc.property(input, "disabled"), Some(NativeValue::Bool(false)));
        assert_eq!(doc.attribute(input, "disabled"), None);
        assert_eq!(
            doc.property(input, "value"),
            Some(NativeValue::Text(String::new()))
        );
    }

    #[test]
    fn data_and_aria_are_always_attributes() {
        let doc = MemoryDocument::new();
        let div = doc.create_element("div");
        set_props(
            &doc,
            div,
            &Props::new().with("aria-hidden", true).with("data-hidden", false),
        );
        assert_eq!(doc.attribute(div, "aria-hidden").as_deref(), Some("true"));
        assert_eq!(doc.attribute(div, "data-hidden").as_deref(), Some("false"));
    }
}
