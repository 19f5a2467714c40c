//! Value Comparators
//!
//! Two comparators drive memoization and effect dependency checks:
//!
//! - [`shallow_equals`]: identical values, or lists/maps whose entries are
//!   pairwise identical one level down.
//! - [`deep_equals`]: structural equality at any depth, including child
//!   descriptors.
//!
//! Both treat differing key sets and differing lengths as unequal.

use crate::node::{Props, VNode, Value};

/// Compare two values one level deep.
pub fn shallow_equals(a: &Value, b: &Value) -> bool {
    if a.same(b) {
        return true;
    }

    match (a, b) {
        (Value::List(xs), Value::List(ys)) => shallow_equals_list(xs, ys),
        (Value::Map(xs), Value::Map(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(k, x)| ys.get(k).is_some_and(|y| x.same(y)))
        }
        (Value::Children(xs), Value::Children(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys.iter()).all(|(x, y)| x.ptr_eq(y))
        }
        _ => false,
    }
}

/// Compare two values structurally at any depth.
pub fn deep_equals(a: &Value, b: &Value) -> bool {
    if a.same(b) {
        return true;
    }

    match (a, b) {
        (Value::List(xs), Value::List(ys)) => deep_equals_list(xs, ys),
        (Value::Map(xs), Value::Map(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(k, x)| ys.get(k).is_some_and(|y| deep_equals(x, y)))
        }
        (Value::Children(xs), Value::Children(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys.iter()).all(|(x, y)| deep_equals_node(x, y))
        }
        _ => false,
    }
}

/// Element-wise identity comparison of two lists.
pub fn shallow_equals_list(a: &[Value], b: &[Value]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.same(y))
}

/// Element-wise structural comparison of two lists.
pub fn deep_equals_list(a: &[Value], b: &[Value]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| deep_equals(x, y))
}

/// Shallow comparison of two prop sets, ignoring insertion order.
pub fn shallow_equals_props(a: &Props, b: &Props) -> bool {
    let (xs, ys) = (a.as_map(), b.as_map());
    xs.len() == ys.len()
        && xs
            .iter()
            .all(|(k, x)| ys.get(k).is_some_and(|y| x.same(y)))
}

/// Deep comparison of two prop sets, ignoring insertion order.
pub fn deep_equals_props(a: &Props, b: &Props) -> bool {
    let (xs, ys) = (a.as_map(), b.as_map());
    xs.len() == ys.len()
        && xs
            .iter()
            .all(|(k, x)| ys.get(k).is_some_and(|y| deep_equals(x, y)))
}

fn deep_equals_node(a: &VNode, b: &VNode) -> bool {
    if a.ptr_eq(b) {
        return true;
    }
    a.ty() == b.ty() && a.key() == b.key() && deep_equals_props(a.props(), b.props())
}
