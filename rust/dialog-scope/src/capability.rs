use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use tracing::trace;

use crate::broker::Broker;
use crate::{Accessor, Arguments, Callable, DialogScopeError, ScopeResult, Value};

/// Reserved name under which every capability exposes the static-layer
/// capability of the same scope. It can be read but never assigned or deleted.
pub const STATIC_REFERENCE: &str = "__static__";

/// The only handle through which hidden members are reachable.
///
/// A capability is a view of one scope's layered store as seen by one
/// [`Accessor`]. Name lookup follows the store's override chain; hidden
/// functions are bound to the accessor before they are handed out, so calling
/// them behaves like calling an ordinary bound method and, if they ask for
/// it, they receive a capability of their own.
///
/// ```
/// use dialog_scope::{Scope, Value};
///
/// let scope = Scope::new();
/// scope.declare("limit", 3)?;
///
/// let statics = scope.resolve(())?;
/// assert_eq!(statics.get("limit")?, Value::from(3));
/// # Ok::<(), dialog_scope::DialogScopeError>(())
/// ```
#[derive(Clone)]
pub struct Capability {
    broker: Arc<Broker>,
    accessor: Accessor,
}

impl Capability {
    pub(crate) fn new(broker: Arc<Broker>, accessor: Accessor) -> Self {
        trace!(accessor = accessor.owner(), "Resolved capability");
        Self { broker, accessor }
    }

    /// The accessor this capability was resolved for.
    pub fn accessor(&self) -> &Accessor {
        &self.accessor
    }

    /// A capability into the same scope resolved for another accessor.
    ///
    /// This does not go through the scope's open/closed gate: whoever holds a
    /// capability already has access.
    pub fn of(&self, accessor: impl Into<Accessor>) -> Capability {
        Capability::new(self.broker.clone(), accessor.into())
    }

    /// The static-layer capability of the same scope.
    pub fn statics(&self) -> Capability {
        self.of(Accessor::None)
    }

    /// Returns true if `name` resolves through this capability.
    pub fn contains(&self, name: &str) -> bool {
        name == STATIC_REFERENCE || self.broker.lookup(&self.accessor, name).is_some()
    }

    /// Look `name` up through the override chain.
    ///
    /// Hidden functions come back bound to the accessor, hidden properties
    /// are read through their getter and everything else is returned as is.
    pub fn get(&self, name: &str) -> ScopeResult<Value> {
        if name == STATIC_REFERENCE {
            return Ok(Value::Capability(self.statics()));
        }

        match self.lookup(name)? {
            Value::Hidden(hidden) => match hidden.callable() {
                Callable::Function(function) => {
                    Ok(Value::Bound(function.bind(self.accessor.value())))
                }
                Callable::Property(property) => property.get(name, self.accessor.value()),
            },
            value => Ok(value),
        }
    }

    /// Assign `value` to `name`.
    ///
    /// When `name` resolves anywhere along the override chain to a hidden
    /// property with a setter, the setter runs. Anything else, a getter-only
    /// property included, is overwritten in the most specific layer for the
    /// accessor.
    pub fn set(&self, name: &str, value: impl Into<Value>) -> ScopeResult<()> {
        if name == STATIC_REFERENCE {
            return Err(DialogScopeError::ReservedName {
                name: name.to_owned(),
            });
        }

        let value = value.into();
        if let Some(Value::Hidden(hidden)) = self.broker.lookup(&self.accessor, name)
            && let Callable::Property(property) = hidden.callable()
            && property.setter().is_some()
        {
            return property.set(name, self.accessor.value(), value);
        }

        self.broker.assign(&self.accessor, name, value);
        Ok(())
    }

    /// Delete `name`.
    ///
    /// When `name` resolves anywhere along the override chain to a hidden
    /// property with a deleter, the deleter runs. Anything else is removed
    /// from the most specific layer for the accessor, failing if it is not
    /// there.
    pub fn delete(&self, name: &str) -> ScopeResult<()> {
        if name == STATIC_REFERENCE {
            return Err(DialogScopeError::ReservedName {
                name: name.to_owned(),
            });
        }

        if let Some(Value::Hidden(hidden)) = self.broker.lookup(&self.accessor, name)
            && let Callable::Property(property) = hidden.callable()
            && property.deleter().is_some()
        {
            return property.delete(name, self.accessor.value());
        }

        match self.broker.remove(&self.accessor, name) {
            Some(_) => Ok(()),
            None => Err(self.not_found(name)),
        }
    }

    /// Look `name` up and call it with `arguments`.
    pub fn call(&self, name: &str, arguments: Arguments) -> ScopeResult<Value> {
        self.get(name)?.call(arguments)
    }

    /// Returns true if `name` is held by the most specific layer itself
    /// rather than inherited from a less specific one.
    pub fn owns(&self, name: &str) -> bool {
        self.broker.holds(&self.accessor, name)
    }

    fn lookup(&self, name: &str) -> ScopeResult<Value> {
        self.broker
            .lookup(&self.accessor, name)
            .ok_or_else(|| self.not_found(name))
    }

    fn not_found(&self, name: &str) -> DialogScopeError {
        DialogScopeError::not_found(self.accessor.owner(), name)
    }
}

impl Debug for Capability {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Capability")
            .field("accessor", &self.accessor)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Function, Property, Scope, Type, hide};
    use pretty_assertions::assert_eq;
    use testresult::TestResult;

    #[test]
    fn it_exposes_the_static_layer_through_the_reserved_name() -> TestResult {
        let scope = Scope::new();
        scope.declare("limit", 10)?;

        let class = Type::new("Gauge", Default::default());
        let instance = class.instantiate(Arguments::new())?;
        let capability = scope.resolve(&instance)?;
        capability.set("limit", 2)?;

        let Value::Capability(statics) = capability.get(STATIC_REFERENCE)? else {
            panic!("expected a capability");
        };
        assert_eq!(capability.get("limit")?, Value::from(2));
        assert_eq!(statics.get("limit")?, Value::from(10));
        Ok(())
    }

    #[test]
    fn it_refuses_to_modify_the_reserved_name() -> TestResult {
        let capability = Scope::new().resolve(())?;

        assert_eq!(
            capability.set(STATIC_REFERENCE, 1).unwrap_err(),
            DialogScopeError::ReservedName {
                name: STATIC_REFERENCE.into()
            }
        );
        assert_eq!(
            capability.delete(STATIC_REFERENCE).unwrap_err(),
            DialogScopeError::ReservedName {
                name: STATIC_REFERENCE.into()
            }
        );
        Ok(())
    }

    #[test]
    fn it_reports_missing_members_like_missing_attributes() -> TestResult {
        let class = Type::new("Gauge", Default::default());
        let instance = class.instantiate(Arguments::new())?;
        let capability = Scope::new().resolve(&instance)?;

        assert_eq!(
            capability.get("count").unwrap_err(),
            instance.get("count").unwrap_err()
        );
        assert_eq!(
            capability.delete("count").unwrap_err(),
            DialogScopeError::not_found("Gauge", "count")
        );
        Ok(())
    }

    #[test]
    fn it_binds_hidden_functions_to_the_accessor() -> TestResult {
        let scope = Scope::new();
        scope.register_hidden(
            hide(Function::method("me", |arguments| {
                Ok(arguments.receiver().cloned().unwrap_or_default())
            })),
            None,
        )?;

        let class = Type::new("Gauge", Default::default());
        let instance = class.instantiate(Arguments::new())?;

        let capability = scope.resolve(&instance)?;
        assert_eq!(
            capability.call("me", Arguments::new())?,
            Value::Instance(instance.clone())
        );
        assert_eq!(
            capability.of(&class).call("me", Arguments::new())?,
            Value::Type(class)
        );
        Ok(())
    }

    #[test]
    fn it_delegates_to_hidden_property_accessors() -> TestResult {
        let scope = Scope::new();
        scope.declare("raw", 1)?;

        let getter = Function::scoped("doubled", "pself", |_, pself| {
            Ok(Value::from(pself.get("raw")?.expect_integer()? * 2))
        });
        let setter = Function::scoped("doubled", "pself", |arguments, pself| {
            let doubled = arguments.require(1)?.expect_integer()?;
            pself.set("raw", doubled / 2)?;
            Ok(Value::None)
        });
        let deleter = Function::scoped("doubled", "pself", |_, pself| {
            pself.set("raw", 0)?;
            Ok(Value::None)
        });
        scope.register_hidden(
            hide(Property::new(getter).with_setter(setter).with_deleter(deleter)),
            None,
        )?;

        let capability = scope.resolve(())?;
        assert_eq!(capability.get("doubled")?, Value::from(2));

        capability.set("doubled", 10)?;
        assert_eq!(capability.get("raw")?, Value::from(5));
        assert_eq!(capability.get("doubled")?, Value::from(10));

        capability.delete("doubled")?;
        assert_eq!(capability.get("raw")?, Value::from(0));
        assert!(capability.contains("doubled"));
        Ok(())
    }

    #[test]
    fn it_overwrites_and_removes_hidden_properties_without_accessors() -> TestResult {
        let scope = Scope::new();
        scope.register_hidden(
            hide(Property::new(Function::method("label", |_| {
                Ok(Value::from("gauge"))
            }))),
            None,
        )?;

        let class = Type::new("Gauge", Default::default());
        let instance = class.instantiate(Arguments::new())?;
        let capability = scope.resolve(&instance)?;
        capability.set("label", 5)?;
        assert_eq!(capability.get("label")?, Value::from(5));
        assert_eq!(scope.get("label")?, Value::from("gauge"));

        let statics = scope.resolve(())?;
        statics.set("label", 6)?;
        assert_eq!(statics.get("label")?, Value::from(6));

        statics.delete("label")?;
        assert!(!statics.contains("label"));
        assert_eq!(capability.get("label")?, Value::from(5));
        Ok(())
    }

    #[test]
    fn it_writes_to_the_most_specific_layer() -> TestResult {
        let scope = Scope::new();
        scope.declare("count", 0)?;

        let class = Type::new("Gauge", Default::default());
        let instance = class.instantiate(Arguments::new())?;
        let capability = scope.resolve(&instance)?;

        assert!(!capability.owns("count"));
        capability.set("count", 4)?;
        assert!(capability.owns("count"));
        assert_eq!(scope.get("count")?, Value::from(0));

        capability.delete("count")?;
        assert_eq!(capability.get("count")?, Value::from(0));
        Ok(())
    }
}
