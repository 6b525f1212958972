use std::sync::Arc;

use tracing::debug;

use crate::{
    Accessor, DialogScopeError, Fields, Hidden, Members, Scope, ScopeResult, Type, Value, Wrapper,
};

/// One entry of a [`TypeDeclaration`].
#[derive(Debug, Clone)]
pub enum Entry {
    /// An ordinary, public member.
    Member(Value),
    /// A member registered into the scope instead of the type.
    Hidden(Hidden),
    /// A bundle of hidden fields registered into the scope under the type.
    Fields(Fields),
}

/// The members proposed for a new [`Type`], and the scope its hidden members
/// go to.
///
/// [`TypeDeclaration::build`] runs once per declaration:
///
/// 1. hidden markers are pulled out and wrapped for capability injection,
/// 2. field bundles are unpacked, skipping reserved names,
/// 3. every ordinary member is wrapped leniently (members that do not ask for
///    the capability parameter stay untouched),
/// 4. the type is created from the ordinary members alone,
/// 5. hidden members and fields are registered in the type layer of the new
///    type.
///
/// Any failure aborts the declaration before the type exists. A declaration
/// without an explicit scope gets a fresh one.
///
/// ```
/// use dialog_scope::{Arguments, Fields, Function, TypeDeclaration, Value};
///
/// let ticker = TypeDeclaration::new("Ticker")
///     .fields(Fields::new().field("count", 0))
///     .member(
///         "increment",
///         Function::scoped("increment", "pself", |_, pself| {
///             let count = pself.get("count")?.expect_integer()? + 1;
///             pself.set("count", count)?;
///             Ok(Value::from(count))
///         }),
///     )
///     .build()?;
///
/// let instance = ticker.instantiate(Arguments::new())?;
/// assert_eq!(instance.call("increment", Arguments::new())?, Value::from(1));
/// assert!(instance.get("count").is_err());
/// # Ok::<(), dialog_scope::DialogScopeError>(())
/// ```
#[derive(Debug, Clone)]
pub struct TypeDeclaration {
    name: String,
    entries: Vec<(Option<String>, Entry)>,
    scope: Option<Scope>,
    parameter: Option<String>,
}

impl TypeDeclaration {
    /// An empty declaration of a type called `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
            scope: None,
            parameter: None,
        }
    }

    /// Register hidden members into `scope` rather than a fresh one.
    pub fn scope(mut self, scope: &Scope) -> Self {
        self.scope = Some(scope.clone());
        self
    }

    /// Inject capabilities through `parameter` rather than the scope's
    /// configured parameter.
    pub fn parameter(mut self, parameter: impl Into<String>) -> Self {
        self.parameter = Some(parameter.into());
        self
    }

    /// Add a member under `name`. A [`Value::Hidden`] becomes a hidden member.
    pub fn member(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        let entry = match value.into() {
            Value::Hidden(hidden) => Entry::Hidden(hidden),
            value => Entry::Member(value),
        };
        self.entries.push((Some(name.into()), entry));
        self
    }

    /// Add a hidden member under the name derived from the marker.
    pub fn hidden(mut self, hidden: Hidden) -> Self {
        self.entries.push((None, Entry::Hidden(hidden)));
        self
    }

    /// Add a bundle of hidden fields.
    pub fn fields(mut self, fields: Fields) -> Self {
        self.entries.push((None, Entry::Fields(fields)));
        self
    }

    /// Build the type, registering its hidden members in the scope.
    pub fn build(self) -> ScopeResult<Type> {
        let scope = self.scope.unwrap_or_default();
        scope.require_open()?;

        let mut settings = scope.settings().clone().lenient();
        if let Some(parameter) = self.parameter {
            settings.parameter = parameter;
        }
        let wrapper = Wrapper::new(Arc::downgrade(scope.broker()), settings);

        let mut members = Members::new();
        let mut hidden = Members::new();
        for (name, entry) in self.entries {
            match entry {
                Entry::Member(value) => {
                    let name = name.ok_or(DialogScopeError::NameResolution)?;
                    members.insert(name, wrapper.wrap(value)?);
                }
                Entry::Hidden(marker) => {
                    let name = name
                        .filter(|name| !name.is_empty())
                        .or_else(|| marker.name().map(str::to_owned))
                        .ok_or(DialogScopeError::NameResolution)?;
                    members.shift_remove(&name);
                    hidden.insert(name, Value::Hidden(marker.wrap(&wrapper)?));
                }
                Entry::Fields(fields) => {
                    for (name, value) in fields.into_visible() {
                        hidden.insert(name, wrapper.wrap(value)?);
                    }
                }
            }
        }

        let class = Type::with_scope(self.name, members, Some(scope.clone()));
        debug!(
            class = class.name(),
            %scope,
            hidden = hidden.len(),
            "Declared type"
        );
        scope.broker().install(&Accessor::Type(class.clone()), hidden);
        Ok(class)
    }
}
