//! Callable shapes of the object model.
//!
//! A [`Function`] pairs a name and a [`Shape`] with a [`Body`]. The body is
//! either [`Body::Plain`], which knows nothing about scopes, or
//! [`Body::Scoped`], which declares by name the parameter through which it
//! expects to receive a [`Capability`]. Declaring that parameter is the only
//! way a callable can ask for access to hidden members: the
//! [`Wrapper`](crate::Wrapper) recognizes it and supplies the capability at
//! call time.

use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use indexmap::IndexMap;

use crate::{Capability, DialogScopeError, ScopeResult, Value};

/// Native implementation of a function that does not receive a capability.
pub type Native = Arc<dyn Fn(Arguments) -> ScopeResult<Value> + Send + Sync>;

/// Native implementation of a function that receives a capability.
pub type ScopedNative = Arc<dyn Fn(Arguments, Capability) -> ScopeResult<Value> + Send + Sync>;

/// How a function relates to the object it is looked up on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    /// Receives the instance (or whatever it was looked up on) as its first
    /// positional argument.
    Method,
    /// Receives the type as its first positional argument, even when looked
    /// up on an instance.
    TypeBound,
    /// Receives no receiver at all.
    Free,
}

/// The implementation of a [`Function`].
#[derive(Clone)]
pub enum Body {
    /// A body that takes no capability.
    Plain(Native),
    /// A body that takes a capability through the named parameter.
    Scoped {
        /// Name of the capability parameter.
        parameter: String,
        /// The implementation.
        native: ScopedNative,
    },
}

impl Body {
    /// Create a [`Body::Plain`] from a closure.
    pub fn plain<F>(native: F) -> Self
    where
        F: Fn(Arguments) -> ScopeResult<Value> + Send + Sync + 'static,
    {
        Body::Plain(Arc::new(native))
    }

    /// Create a [`Body::Scoped`] from a closure.
    pub fn scoped<F>(parameter: impl Into<String>, native: F) -> Self
    where
        F: Fn(Arguments, Capability) -> ScopeResult<Value> + Send + Sync + 'static,
    {
        Body::Scoped {
            parameter: parameter.into(),
            native: Arc::new(native),
        }
    }

    fn address(&self) -> *const () {
        match self {
            Body::Plain(native) => Arc::as_ptr(native) as *const (),
            Body::Scoped { native, .. } => Arc::as_ptr(native) as *const (),
        }
    }
}

/// Positional and keyword arguments of a call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    positional: Vec<Value>,
    keywords: IndexMap<String, Value>,
}

impl Arguments {
    /// Empty argument list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Argument list made of the given positional values.
    pub fn from_values<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self {
            positional: values.into_iter().map(Into::into).collect(),
            keywords: IndexMap::new(),
        }
    }

    /// Append a positional argument.
    pub fn with(mut self, value: impl Into<Value>) -> Self {
        self.positional.push(value.into());
        self
    }

    /// Add (or replace) a keyword argument.
    pub fn keyword(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.keywords.insert(name.into(), value.into());
        self
    }

    /// The first positional argument, which is the receiver of methods.
    pub fn receiver(&self) -> Option<&Value> {
        self.positional.first()
    }

    /// Positional argument at `index`.
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.positional.get(index)
    }

    /// Positional argument at `index`, or an error naming the missing position.
    pub fn require(&self, index: usize) -> ScopeResult<&Value> {
        self.get(index).ok_or_else(|| {
            DialogScopeError::native(format!("Missing positional argument {index}"))
        })
    }

    /// Keyword argument by name.
    pub fn keyword_value(&self, name: &str) -> Option<&Value> {
        self.keywords.get(name)
    }

    /// All positional arguments.
    pub fn positional(&self) -> &[Value] {
        &self.positional
    }

    /// All keyword arguments, in the order they were given.
    pub fn keywords(&self) -> &IndexMap<String, Value> {
        &self.keywords
    }

    pub(crate) fn prepend(&mut self, value: Value) {
        self.positional.insert(0, value);
    }

    pub(crate) fn take_keyword(&mut self, name: &str) -> Option<Value> {
        self.keywords.shift_remove(name)
    }
}

impl From<Vec<Value>> for Arguments {
    fn from(positional: Vec<Value>) -> Self {
        Self {
            positional,
            keywords: IndexMap::new(),
        }
    }
}

/// A named callable with a [`Shape`] and a [`Body`].
#[derive(Clone)]
pub struct Function {
    name: String,
    shape: Shape,
    body: Body,
}

impl Function {
    /// Create a function from its parts.
    pub fn new(name: impl Into<String>, shape: Shape, body: Body) -> Self {
        Self {
            name: name.into(),
            shape,
            body,
        }
    }

    /// A method that does not ask for a capability.
    pub fn method<F>(name: impl Into<String>, native: F) -> Self
    where
        F: Fn(Arguments) -> ScopeResult<Value> + Send + Sync + 'static,
    {
        Self::new(name, Shape::Method, Body::plain(native))
    }

    /// A method that asks for a capability through `parameter`.
    pub fn scoped<F>(name: impl Into<String>, parameter: impl Into<String>, native: F) -> Self
    where
        F: Fn(Arguments, Capability) -> ScopeResult<Value> + Send + Sync + 'static,
    {
        Self::new(name, Shape::Method, Body::scoped(parameter, native))
    }

    /// Same function with a different [`Shape`].
    pub fn shaped(mut self, shape: Shape) -> Self {
        self.shape = shape;
        self
    }

    /// The externally visible name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The callable shape.
    pub fn shape(&self) -> Shape {
        self.shape
    }

    /// The implementation.
    pub fn body(&self) -> &Body {
        &self.body
    }

    /// Returns true if this function declares the capability parameter
    /// `parameter`.
    pub fn accepts(&self, parameter: &str) -> bool {
        matches!(&self.body, Body::Scoped { parameter: declared, .. } if declared == parameter)
    }

    /// Returns true if both handles share one implementation.
    pub fn same(&self, other: &Function) -> bool {
        std::ptr::eq(self.body.address(), other.body.address())
    }

    /// Invoke the function.
    ///
    /// A scoped body only runs when the caller supplies a
    /// [`Value::Capability`] under the declared parameter name; wrapped
    /// functions take care of that on their own.
    pub fn call(&self, mut arguments: Arguments) -> ScopeResult<Value> {
        match &self.body {
            Body::Plain(native) => native(arguments),
            Body::Scoped { parameter, native } => match arguments.take_keyword(parameter) {
                Some(Value::Capability(capability)) => native(arguments, capability),
                _ => Err(DialogScopeError::MissingCapability {
                    function: self.name.clone(),
                    parameter: parameter.clone(),
                }),
            },
        }
    }

    /// Bind this function to `receiver` according to its [`Shape`].
    pub fn bind(&self, receiver: Value) -> Bound {
        let receiver = match self.shape {
            Shape::Method => Some(Box::new(receiver)),
            Shape::TypeBound => Some(Box::new(match receiver {
                Value::Instance(instance) => Value::Type(instance.class().clone()),
                other => other,
            })),
            Shape::Free => None,
        };

        Bound {
            function: self.clone(),
            receiver,
        }
    }
}

impl Debug for Function {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let scoped = match &self.body {
            Body::Plain(_) => None,
            Body::Scoped { parameter, .. } => Some(parameter),
        };
        f.debug_struct("Function")
            .field("name", &self.name)
            .field("shape", &self.shape)
            .field("scoped", &scoped)
            .finish()
    }
}

/// A [`Function`] together with the receiver it was bound to.
#[derive(Debug, Clone)]
pub struct Bound {
    function: Function,
    receiver: Option<Box<Value>>,
}

impl Bound {
    /// The underlying function.
    pub fn function(&self) -> &Function {
        &self.function
    }

    /// The receiver, absent for [`Shape::Free`] functions.
    pub fn receiver(&self) -> Option<&Value> {
        self.receiver.as_deref()
    }

    /// Invoke the function with the receiver prepended to `arguments`.
    pub fn call(&self, mut arguments: Arguments) -> ScopeResult<Value> {
        if let Some(receiver) = self.receiver.as_deref() {
            arguments.prepend(receiver.clone());
        }
        self.function.call(arguments)
    }
}

/// A managed attribute: an accessor triple of getter, setter and deleter.
///
/// Each accessor is a method-shaped [`Function`] receiving the object the
/// property was accessed on; the setter additionally receives the assigned
/// value as its second positional argument.
#[derive(Debug, Clone, Default)]
pub struct Property {
    getter: Option<Function>,
    setter: Option<Function>,
    deleter: Option<Function>,
}

impl Property {
    /// A read-only property.
    pub fn new(getter: Function) -> Self {
        Self {
            getter: Some(getter),
            setter: None,
            deleter: None,
        }
    }

    /// Assemble a property from its (optional) accessors.
    pub fn from_accessors(
        getter: Option<Function>,
        setter: Option<Function>,
        deleter: Option<Function>,
    ) -> Self {
        Self {
            getter,
            setter,
            deleter,
        }
    }

    /// Same property with a setter.
    pub fn with_setter(mut self, setter: Function) -> Self {
        self.setter = Some(setter);
        self
    }

    /// Same property with a deleter.
    pub fn with_deleter(mut self, deleter: Function) -> Self {
        self.deleter = Some(deleter);
        self
    }

    /// The getter, if any.
    pub fn getter(&self) -> Option<&Function> {
        self.getter.as_ref()
    }

    /// The setter, if any.
    pub fn setter(&self) -> Option<&Function> {
        self.setter.as_ref()
    }

    /// The deleter, if any.
    pub fn deleter(&self) -> Option<&Function> {
        self.deleter.as_ref()
    }

    /// Name derived from the first accessor that has a non-empty name.
    pub fn name(&self) -> Option<&str> {
        [&self.getter, &self.setter, &self.deleter]
            .into_iter()
            .flatten()
            .map(Function::name)
            .find(|name| !name.is_empty())
    }

    /// Run the getter against `receiver`.
    pub fn get(&self, name: &str, receiver: Value) -> ScopeResult<Value> {
        let getter = self.getter.as_ref().ok_or_else(|| DialogScopeError::PropertyAccess {
            name: name.to_owned(),
            operation: "read",
        })?;
        getter.call(Arguments::from(vec![receiver]))
    }

    /// Run the setter against `receiver`.
    pub fn set(&self, name: &str, receiver: Value, value: Value) -> ScopeResult<()> {
        let setter = self.setter.as_ref().ok_or_else(|| DialogScopeError::PropertyAccess {
            name: name.to_owned(),
            operation: "assigned",
        })?;
        setter.call(Arguments::from(vec![receiver, value]))?;
        Ok(())
    }

    /// Run the deleter against `receiver`.
    pub fn delete(&self, name: &str, receiver: Value) -> ScopeResult<()> {
        let deleter = self.deleter.as_ref().ok_or_else(|| DialogScopeError::PropertyAccess {
            name: name.to_owned(),
            operation: "deleted",
        })?;
        deleter.call(Arguments::from(vec![receiver]))?;
        Ok(())
    }

    pub(crate) fn map<F>(self, mut wrap: F) -> ScopeResult<Self>
    where
        F: FnMut(Function) -> ScopeResult<Function>,
    {
        Ok(Self {
            getter: self.getter.map(&mut wrap).transpose()?,
            setter: self.setter.map(&mut wrap).transpose()?,
            deleter: self.deleter.map(&mut wrap).transpose()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_prepends_the_receiver_when_bound() -> anyhow::Result<()> {
        let first = Function::method("first", |arguments| {
            Ok(arguments.receiver().cloned().unwrap_or_default())
        });

        let bound = first.bind(Value::from("receiver"));
        assert_eq!(bound.call(Arguments::new().with(1))?, Value::from("receiver"));
        Ok(())
    }

    #[test]
    fn it_drops_the_receiver_of_free_functions() -> anyhow::Result<()> {
        let count = Function::method("count", |arguments| {
            Ok(Value::from(arguments.positional().len() as i64))
        })
        .shaped(Shape::Free);

        let bound = count.bind(Value::from("ignored"));
        assert!(bound.receiver().is_none());
        assert_eq!(bound.call(Arguments::new().with(1).with(2))?, Value::from(2));
        Ok(())
    }

    #[test]
    fn it_requires_a_capability_for_scoped_bodies() {
        let scoped = Function::scoped("increment", "pself", |_, _| Ok(Value::None));

        assert!(scoped.accepts("pself"));
        assert!(!scoped.accepts("priv"));
        assert_eq!(
            scoped.call(Arguments::new().keyword("pself", 1)).unwrap_err(),
            DialogScopeError::MissingCapability {
                function: "increment".into(),
                parameter: "pself".into(),
            }
        );
    }

    #[test]
    fn it_derives_property_names_from_accessors() {
        let anonymous = Function::method("", |_| Ok(Value::None));
        let setter = Function::method("y", |_| Ok(Value::None));

        let property = Property::from_accessors(Some(anonymous), Some(setter), None);
        assert_eq!(property.name(), Some("y"));
        assert_eq!(Property::default().name(), None);
    }

    #[test]
    fn it_reports_missing_accessors() {
        let property = Property::new(Function::method("y", |_| Ok(Value::from(0))));

        assert_eq!(
            property
                .set("y", Value::None, Value::from(1))
                .unwrap_err(),
            DialogScopeError::PropertyAccess {
                name: "y".into(),
                operation: "assigned",
            }
        );
    }
}
