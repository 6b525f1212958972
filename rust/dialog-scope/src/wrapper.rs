use tracing::trace;

use crate::broker::WeakBroker;
use crate::{
    Accessor, Arguments, Body, Capability, DialogScopeError, Function, Property, ScopeResult,
    ScopeSettings, Shape, Value,
};

/// Injects capabilities into callables that declare the capability parameter.
///
/// A wrapped function resolves a [`Capability`] for the right accessor every
/// time it is called and hands it to the original body:
///
/// | [`Shape`]             | accessor                                  |
/// |-----------------------|-------------------------------------------|
/// | [`Shape::Method`]     | the receiver (first positional argument)  |
/// | [`Shape::TypeBound`]  | the receiver's type                       |
/// | [`Shape::Free`]       | none, only the static layer is visible    |
///
/// A keyword argument the caller passed under the capability parameter's name
/// is discarded; the injected capability always wins.
///
/// Callables that do not declare the parameter are returned untouched, or
/// rejected with [`DialogScopeError::Signature`] when the wrapper is strict.
///
/// A wrapper does not keep its scope alive and keeps working after the scope
/// was closed.
#[derive(Debug, Clone)]
pub struct Wrapper {
    broker: WeakBroker,
    settings: ScopeSettings,
}

impl Wrapper {
    pub(crate) fn new(broker: WeakBroker, settings: ScopeSettings) -> Self {
        Self { broker, settings }
    }

    /// The settings this wrapper was created with.
    pub fn settings(&self) -> &ScopeSettings {
        &self.settings
    }

    /// Wrap any value: functions and properties are wrapped, hidden markers
    /// and plain data pass through unless the wrapper is strict.
    pub fn wrap(&self, value: Value) -> ScopeResult<Value> {
        match value {
            Value::Function(function) => Ok(Value::Function(self.wrap_function(function)?)),
            Value::Property(property) => Ok(Value::Property(self.wrap_property(property)?)),
            other if self.settings.strict => Err(DialogScopeError::NotCallable {
                name: other.kind().to_owned(),
            }),
            other => Ok(other),
        }
    }

    /// Wrap a single function, preserving its name and [`Shape`].
    pub fn wrap_function(&self, function: Function) -> ScopeResult<Function> {
        let parameter = &self.settings.parameter;
        let native = match function.body() {
            Body::Scoped {
                parameter: declared,
                native,
            } if declared == parameter => native.clone(),
            _ if self.settings.strict => {
                return Err(DialogScopeError::Signature {
                    function: function.name().to_owned(),
                    parameter: parameter.clone(),
                });
            }
            _ => {
                trace!(function = function.name(), %parameter, "Left function unwrapped");
                return Ok(function);
            }
        };

        let broker = self.broker.clone();
        let name = function.name().to_owned();
        let shape = function.shape();
        let parameter = parameter.clone();

        let injected = Body::plain(move |mut arguments: Arguments| {
            let broker = broker.upgrade().ok_or(DialogScopeError::ClosedScope)?;
            let accessor = accessor_for(shape, &name, &arguments)?;
            arguments.take_keyword(&parameter);
            native(arguments, Capability::new(broker, accessor))
        });

        Ok(Function::new(function.name(), shape, injected))
    }

    /// Wrap each accessor of a property independently; absent accessors stay
    /// absent.
    pub fn wrap_property(&self, property: Property) -> ScopeResult<Property> {
        property.map(|accessor| self.wrap_function(accessor))
    }
}

fn accessor_for(shape: Shape, name: &str, arguments: &Arguments) -> ScopeResult<Accessor> {
    match shape {
        Shape::Method => arguments
            .receiver()
            .map(Accessor::from)
            .ok_or_else(|| DialogScopeError::MissingReceiver {
                function: name.to_owned(),
            }),
        Shape::TypeBound => Ok(arguments
            .receiver()
            .map(Accessor::from)
            .unwrap_or_default()
            .to_type()),
        Shape::Free => Ok(Accessor::None),
    }
}
