use std::fmt::{Debug, Formatter};

use crate::{Function, Property, ScopeResult, Wrapper};

/// The callable wrapped by a [`Hidden`] marker.
#[derive(Debug, Clone)]
pub enum Callable {
    /// A function of any [`Shape`](crate::Shape).
    Function(Function),
    /// An accessor triple.
    Property(Property),
}

impl From<Function> for Callable {
    fn from(function: Function) -> Self {
        Callable::Function(function)
    }
}

impl From<Property> for Callable {
    fn from(property: Property) -> Self {
        Callable::Property(property)
    }
}

/// Marks a callable as a member that must never become a public attribute.
///
/// Markers are consumed by [`TypeDeclaration::build`](crate::TypeDeclaration::build)
/// or by [`Scope::register_hidden`](crate::Scope::register_hidden); either way
/// the callable ends up in a scope and can only be reached through a
/// [`Capability`](crate::Capability), which binds it to the accessor it was
/// resolved for.
#[derive(Clone)]
pub struct Hidden {
    callable: Callable,
    name: Option<String>,
}

/// Mark `callable` as hidden.
pub fn hide(callable: impl Into<Callable>) -> Hidden {
    Hidden::new(callable)
}

impl Hidden {
    /// Mark `callable` as hidden, deriving its name from the callable.
    pub fn new(callable: impl Into<Callable>) -> Self {
        Self {
            callable: callable.into(),
            name: None,
        }
    }

    /// Register under `name` rather than the derived name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// The wrapped callable.
    pub fn callable(&self) -> &Callable {
        &self.callable
    }

    /// Name the marker registers under: the explicit name if given, the
    /// callable's own name otherwise. Empty names do not count.
    pub fn name(&self) -> Option<&str> {
        let derived = match &self.callable {
            Callable::Function(function) => Some(function.name()),
            Callable::Property(property) => property.name(),
        };
        self.name
            .as_deref()
            .filter(|name| !name.is_empty())
            .or(derived)
            .filter(|name| !name.is_empty())
    }

    pub(crate) fn wrap(self, wrapper: &Wrapper) -> ScopeResult<Self> {
        let callable = match self.callable {
            Callable::Function(function) => Callable::Function(wrapper.wrap_function(function)?),
            Callable::Property(property) => Callable::Property(wrapper.wrap_property(property)?),
        };
        Ok(Self {
            callable,
            name: self.name,
        })
    }
}

impl Debug for Hidden {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Hidden").field(&self.name()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Value;

    #[test]
    fn it_derives_the_name_of_functions() {
        let marker = hide(Function::method("rm_from_global", |_| Ok(Value::None)));
        assert_eq!(marker.name(), Some("rm_from_global"));
    }

    #[test]
    fn it_prefers_an_explicit_name() {
        let marker = hide(Function::method("reset", |_| Ok(Value::None))).named("clear");
        assert_eq!(marker.name(), Some("clear"));
    }

    #[test]
    fn it_can_not_name_anonymous_callables() {
        let anonymous = hide(Function::method("", |_| Ok(Value::None)));
        assert_eq!(anonymous.name(), None);

        let empty = hide(Property::default());
        assert_eq!(empty.name(), None);
    }

    #[test]
    fn it_falls_back_to_the_derived_name_when_the_explicit_one_is_empty() {
        let marker = hide(Function::method("reset", |_| Ok(Value::None))).named("");
        assert_eq!(marker.name(), Some("reset"));

        let anonymous = hide(Function::method("", |_| Ok(Value::None))).named("");
        assert_eq!(anonymous.name(), None);
    }
}
