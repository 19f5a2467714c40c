//! Dynamic Values
//!
//! Props, state and effect dependencies all carry [`Value`]s. The model is
//! deliberately close to what a view layer hands a rendering runtime:
//! scalars, strings, lists, string-keyed maps, functions and child
//! descriptors.
//!
//! # Identity
//!
//! Scalars and strings compare by value. Lists, maps, callbacks and child
//! lists are shared allocations and compare by *identity*: two lists with the
//! same contents built separately are different values. This is what makes
//! shallow comparison cheap and predictable; structural comparison lives in
//! [`deep_equals`](crate::equals::deep_equals).

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use super::element::VNode;

/// A function value: event listeners, callbacks passed through props, and the
/// values returned by `use_callback`/`use_auto_callback`.
#[derive(Clone)]
pub struct Callback(Rc<dyn Fn(&Value) -> Value>);

impl Callback {
    /// Wrap a closure taking one argument.
    pub fn new<F, R>(f: F) -> Self
    where
        F: Fn(&Value) -> R + 'static,
        R: Into<Value>,
    {
        Self(Rc::new(move |arg| f(arg).into()))
    }

    /// Wrap a closure that ignores its argument and returns nothing.
    pub fn action<F>(f: F) -> Self
    where
        F: Fn() + 'static,
    {
        Self(Rc::new(move |_| {
            f();
            Value::Null
        }))
    }

    /// Invoke the callback.
    pub fn call(&self, arg: &Value) -> Value {
        (self.0)(arg)
    }

    /// Invoke the callback with a `Null` argument.
    pub fn invoke(&self) -> Value {
        self.call(&Value::Null)
    }

    /// Whether both handles point at the same function.
    pub fn ptr_eq(&self, other: &Callback) -> bool {
        Rc::as_ptr(&self.0) as *const u8 == Rc::as_ptr(&other.0) as *const u8
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Callback({:p})", Rc::as_ptr(&self.0) as *const u8)
    }
}

/// A dynamically typed prop, state or dependency value.
#[derive(Clone, Debug, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    Str(Rc<str>),
    List(Rc<[Value]>),
    Map(Rc<IndexMap<String, Value>>),
    Callback(Callback),
    Children(Rc<[VNode]>),
}

impl Value {
    /// Build a list value.
    pub fn list<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        Value::List(items.into_iter().map(Into::into).collect())
    }

    /// Build a map value. Later duplicates overwrite earlier entries.
    pub fn map<I, K, T>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, T)>,
        K: Into<String>,
        T: Into<Value>,
    {
        Value::Map(Rc::new(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        ))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_callback(&self) -> Option<&Callback> {
        match self {
            Value::Callback(cb) => Some(cb),
            _ => None,
        }
    }

    pub fn as_children(&self) -> Option<&[VNode]> {
        match self {
            Value::Children(nodes) => Some(nodes),
            _ => None,
        }
    }

    /// Strict identity comparison, following `Object.is` rules for numbers:
    /// `NaN` is the same as `NaN`, while `0.0` and `-0.0` differ.
    pub fn same(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => {
                if a.is_nan() && b.is_nan() {
                    true
                } else {
                    a.to_bits() == b.to_bits()
                }
            }
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => Rc::ptr_eq(a, b),
            (Value::Map(a), Value::Map(b)) => Rc::ptr_eq(a, b),
            (Value::Callback(a), Value::Callback(b)) => a.ptr_eq(b),
            (Value::Children(a), Value::Children(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// String form used when a value is written as a document attribute.
    pub fn to_attribute_string(&self) -> String {
        match self {
            Value::Null => "null".to_owned(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => format_number(*n),
            Value::Str(s) => s.to_string(),
            Value::List(items) => items
                .iter()
                .map(|item| match item {
                    Value::Null => String::new(),
                    other => other.to_attribute_string(),
                })
                .collect::<Vec<_>>()
                .join(","),
            Value::Map(_) => "[object Object]".to_owned(),
            Value::Callback(_) => "[function]".to_owned(),
            Value::Children(_) => String::new(),
        }
    }
}

/// Format a number the way a script engine prints it: integral values have
/// no fractional part.
pub(crate) fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e21 {
        if n == 0.0 {
            "0".to_owned()
        } else {
            format!("{}", n as i64)
        }
    } else if n.is_nan() {
        "NaN".to_owned()
    } else if n.is_infinite() {
        let sign = if n > 0.0 { "" } else { "-" };
        format!("{}Infinity", sign)
    } else {
        format!("{}", n)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.same(other)
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Null
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

macro_rules! number_from {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(n: $t) -> Self {
                    Value::Number(n as f64)
                }
            }
        )*
    };
}

number_from!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(Rc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(Rc::from(s))
    }
}

impl From<Rc<str>> for Value {
    fn from(s: Rc<str>) -> Self {
        Value::Str(s)
    }
}

impl From<Callback> for Value {
    fn from(cb: Callback) -> Self {
        Value::Callback(cb)
    }
}

impl From<VNode> for Value {
    fn from(node: VNode) -> Self {
        Value::Children(Rc::from(vec![node]))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map(Into::into).unwrap_or(Value::Null)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::list(items)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::from(s),
            serde_json::Value::Array(items) => Value::list(items),
            serde_json::Value::Object(map) => Value::map(map),
        }
    }
}
