//! Dynamic values of the object model.
//!
//! Everything that can be stored as a member of a [`Type`], an attribute of an
//! [`Instance`] or an entry of a scope's layered store is a [`Value`].

use std::fmt::{Debug, Formatter};

use crate::{
    Arguments, Bound, Capability, DialogScopeError, Function, Hidden, Instance, Property,
    ScopeResult, Type,
};

/// All value representations understood by the object model.
#[derive(Clone, Default)]
pub enum Value {
    /// The absence of a value
    #[default]
    None,
    /// A boolean
    Boolean(bool),
    /// A 64-bit signed integer
    Integer(i64),
    /// A floating point number
    Float(f64),
    /// A UTF-8 string
    String(String),
    /// An ordered list of values
    List(Vec<Value>),
    /// A handle to an [`Instance`]
    Instance(Instance),
    /// A handle to a [`Type`]
    Type(Type),
    /// An unbound [`Function`]
    Function(Function),
    /// A [`Function`] bound to its receiver
    Bound(Bound),
    /// A managed attribute backed by accessor functions
    Property(Property),
    /// A member that must never become publicly reachable
    Hidden(Hidden),
    /// A capability into a scope's hidden members
    Capability(Capability),
}

impl Value {
    /// Short name of this variant, used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::None => "none",
            Value::Boolean(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Instance(_) => "instance",
            Value::Type(_) => "type",
            Value::Function(_) => "function",
            Value::Bound(_) => "bound",
            Value::Property(_) => "property",
            Value::Hidden(_) => "hidden",
            Value::Capability(_) => "capability",
        }
    }

    /// Returns true if [`Value::call`] can succeed for this value.
    pub fn is_callable(&self) -> bool {
        matches!(self, Value::Function(_) | Value::Bound(_))
    }

    /// Returns true if this is [`Value::None`].
    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    /// Invoke this value with the given arguments.
    pub fn call(&self, arguments: Arguments) -> ScopeResult<Value> {
        match self {
            Value::Function(function) => function.call(arguments),
            Value::Bound(bound) => bound.call(arguments),
            other => Err(DialogScopeError::NotCallable {
                name: other.kind().to_owned(),
            }),
        }
    }

    /// Get the boolean, if this is a [`Value::Boolean`].
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(value) => Some(*value),
            _ => None,
        }
    }

    /// Get the integer, if this is a [`Value::Integer`].
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(value) => Some(*value),
            _ => None,
        }
    }

    /// Get the float, if this is a [`Value::Float`].
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(value) => Some(*value),
            _ => None,
        }
    }

    /// Get the string, if this is a [`Value::String`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(value) => Some(value),
            _ => None,
        }
    }

    /// Get the list, if this is a [`Value::List`].
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(values) => Some(values),
            _ => None,
        }
    }

    /// Get the instance, if this is a [`Value::Instance`].
    pub fn as_instance(&self) -> Option<&Instance> {
        match self {
            Value::Instance(instance) => Some(instance),
            _ => None,
        }
    }

    /// Get the type, if this is a [`Value::Type`].
    pub fn as_type(&self) -> Option<&Type> {
        match self {
            Value::Type(class) => Some(class),
            _ => None,
        }
    }

    /// Get the capability, if this is a [`Value::Capability`].
    pub fn as_capability(&self) -> Option<&Capability> {
        match self {
            Value::Capability(capability) => Some(capability),
            _ => None,
        }
    }

    /// Get the integer or fail with a [`DialogScopeError::Native`] error.
    ///
    /// Convenient inside native function bodies.
    pub fn expect_integer(&self) -> ScopeResult<i64> {
        self.as_integer().ok_or_else(|| {
            DialogScopeError::native(format!("Expected integer, got {}", self.kind()))
        })
    }

    /// Get the boolean or fail with a [`DialogScopeError::Native`] error.
    pub fn expect_bool(&self) -> ScopeResult<bool> {
        self.as_bool().ok_or_else(|| {
            DialogScopeError::native(format!("Expected boolean, got {}", self.kind()))
        })
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::None, Value::None) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_le_bytes() == b.to_le_bytes(),
            (Value::String(a), Value::String(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Instance(a), Value::Instance(b)) => a == b,
            (Value::Type(a), Value::Type(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => a.same(b),
            (Value::Bound(a), Value::Bound(b)) => {
                a.function().same(b.function()) && a.receiver() == b.receiver()
            }
            _ => false,
        }
    }
}

impl Debug for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::None => write!(f, "None"),
            Value::Boolean(value) => write!(f, "{value}"),
            Value::Integer(value) => write!(f, "{value}"),
            Value::Float(value) => write!(f, "{value}"),
            Value::String(value) => write!(f, "{value:?}"),
            Value::List(values) => f.debug_list().entries(values).finish(),
            Value::Instance(instance) => Debug::fmt(instance, f),
            Value::Type(class) => Debug::fmt(class, f),
            Value::Function(function) => Debug::fmt(function, f),
            Value::Bound(bound) => Debug::fmt(bound, f),
            Value::Property(property) => Debug::fmt(property, f),
            Value::Hidden(hidden) => Debug::fmt(hidden, f),
            Value::Capability(capability) => Debug::fmt(capability, f),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(value as i64)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(values: Vec<Value>) -> Self {
        Value::List(values)
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::None
    }
}

impl From<Instance> for Value {
    fn from(instance: Instance) -> Self {
        Value::Instance(instance)
    }
}

impl From<Type> for Value {
    fn from(class: Type) -> Self {
        Value::Type(class)
    }
}

impl From<Function> for Value {
    fn from(function: Function) -> Self {
        Value::Function(function)
    }
}

impl From<Bound> for Value {
    fn from(bound: Bound) -> Self {
        Value::Bound(bound)
    }
}

impl From<Property> for Value {
    fn from(property: Property) -> Self {
        Value::Property(property)
    }
}

impl From<Hidden> for Value {
    fn from(hidden: Hidden) -> Self {
        Value::Hidden(hidden)
    }
}

impl From<Capability> for Value {
    fn from(capability: Capability) -> Self {
        Value::Capability(capability)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_compares_scalars_by_value() {
        assert_eq!(Value::from(3), Value::Integer(3));
        assert_eq!(Value::from("count"), Value::String("count".into()));
        assert_eq!(Value::from(()), Value::None);
        assert_ne!(Value::from(1), Value::from(1.0));
    }

    #[test]
    fn it_compares_functions_by_identity() {
        let function = Function::method("lock", |_| Ok(Value::None));
        let copy = function.clone();
        let other = Function::method("lock", |_| Ok(Value::None));

        assert_eq!(Value::from(function.clone()), Value::from(copy));
        assert_ne!(Value::from(function), Value::from(other));
    }

    #[test]
    fn it_refuses_to_call_plain_data() {
        let error = Value::from(7).call(Arguments::new()).unwrap_err();
        assert_eq!(
            error,
            DialogScopeError::NotCallable {
                name: "integer".into()
            }
        );
    }
}
