use crate::value::Value;
use itertools::Itertools;
use std::fmt::{Debug, Display, Formatter};

/// An opaque predicate over values.
///
/// The engine only ever asks whether a value satisfies an expectation and how
/// to name it in an error message; the type-expression language behind it is
/// left to whoever builds declarations.
pub trait Expectation: Send + Sync + Debug {
    fn matches(&self, value: &Value) -> bool;
    fn describe(&self) -> String;
}

/// Small built-in expectation language covering the value kinds of the object space.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueType {
    Any,
    Nil,
    Bool,
    Int,
    Float,
    Str,
    ListOf(Box<ValueType>),
    Nilable(Box<ValueType>),
    Union(Vec<ValueType>),
}

impl ValueType {
    pub fn list_of(element: ValueType) -> Self {
        ValueType::ListOf(Box::new(element))
    }
    pub fn nilable(inner: ValueType) -> Self {
        ValueType::Nilable(Box::new(inner))
    }
    pub fn any_of(types: impl IntoIterator<Item = ValueType>) -> Self {
        ValueType::Union(types.into_iter().collect())
    }
}

impl Expectation for ValueType {
    fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (ValueType::Any, _) => true,
            (ValueType::Nil, Value::Nil) => true,
            (ValueType::Bool, Value::Bool(_)) => true,
            (ValueType::Int, Value::Int(_)) => true,
            (ValueType::Float, Value::Float(_)) => true,
            (ValueType::Str, Value::Str(_)) => true,
            (ValueType::ListOf(element), Value::List(values)) => {
                values.iter().all(|v| element.matches(v))
            }
            (ValueType::Nilable(_), Value::Nil) => true,
            (ValueType::Nilable(inner), other) => inner.matches(other),
            (ValueType::Union(types), other) => types.iter().any(|t| t.matches(other)),
            _ => false,
        }
    }

    fn describe(&self) -> String {
        self.to_string()
    }
}

impl Display for ValueType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueType::Any => write!(f, "Any"),
            ValueType::Nil => write!(f, "Nil"),
            ValueType::Bool => write!(f, "Boolean"),
            ValueType::Int => write!(f, "Integer"),
            ValueType::Float => write!(f, "Float"),
            ValueType::Str => write!(f, "String"),
            ValueType::ListOf(element) => write!(f, "List<{}>", element),
            ValueType::Nilable(inner) => write!(f, "Nilable<{}>", inner),
            ValueType::Union(types) => write!(f, "{}", types.iter().join(" | ")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_expectations() {
        let ints = ValueType::list_of(ValueType::Int);
        assert!(ints.matches(&Value::list([Value::int(1), Value::int(2)])));
        assert!(!ints.matches(&Value::list([Value::int(1), Value::string("x")])));

        let maybe_str = ValueType::nilable(ValueType::Str);
        assert!(maybe_str.matches(&Value::Nil));
        assert!(maybe_str.matches(&Value::string("x")));
        assert!(!maybe_str.matches(&Value::int(3)));

        let num = ValueType::any_of([ValueType::Int, ValueType::Float]);
        assert!(num.matches(&Value::float(1.5)));
        assert_eq!(num.describe(), "Integer | Float");
    }
}
