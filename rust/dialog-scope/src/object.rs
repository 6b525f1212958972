//! Types and instances of the object model.
//!
//! The object model has no notion of privacy: every member of a [`Type`] and
//! every attribute of an [`Instance`] can be read, replaced and deleted by
//! anyone holding a handle. Hidden state lives in a [`Scope`] instead and is
//! only reachable through a [`Capability`](crate::Capability).

use std::fmt::{Debug, Formatter};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{Mutex, RwLock};

use crate::broker::WeakBroker;
use crate::{Arguments, DialogScopeError, Members, Scope, ScopeResult, Value};

/// Name of the member run by [`Type::instantiate`] on every new instance.
pub const INITIALIZER: &str = "init";

static NEXT_TYPE: AtomicU64 = AtomicU64::new(1);
static NEXT_INSTANCE: AtomicU64 = AtomicU64::new(1);

/// Identity of a [`Type`]. Never reused within a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeKey(u64);

/// Identity of an [`Instance`]. Never reused within a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceKey(u64);

/// A named set of public members.
#[derive(Clone)]
pub struct Type(Arc<TypeState>);

struct TypeState {
    key: TypeKey,
    name: String,
    members: RwLock<Members>,
    scope: Option<Scope>,
}

impl Type {
    /// A type with the given public members and no scope.
    ///
    /// Types with hidden members are built with
    /// [`TypeDeclaration`](crate::TypeDeclaration).
    pub fn new(name: impl Into<String>, members: Members) -> Self {
        Self::with_scope(name, members, None)
    }

    pub(crate) fn with_scope(
        name: impl Into<String>,
        members: Members,
        scope: Option<Scope>,
    ) -> Self {
        Self(Arc::new(TypeState {
            key: TypeKey(NEXT_TYPE.fetch_add(1, Ordering::Relaxed)),
            name: name.into(),
            members: RwLock::new(members),
            scope,
        }))
    }

    /// The identity of this type.
    pub fn key(&self) -> TypeKey {
        self.0.key
    }

    /// The name of this type.
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Returns true if `name` is a public member.
    pub fn has(&self, name: &str) -> bool {
        self.member(name).is_some()
    }

    /// Names of all public members, in declaration order.
    pub fn member_names(&self) -> Vec<String> {
        self.0
            .members
            .read()
            .iter()
            .filter(|(_, value)| !matches!(value, Value::Hidden(_)))
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Look a member up on the type itself.
    ///
    /// Type-bound functions come back bound to this type; methods, free
    /// functions and properties are returned as declared.
    pub fn get(&self, name: &str) -> ScopeResult<Value> {
        match self.member(name) {
            Some(Value::Function(function)) if function.shape() == crate::Shape::TypeBound => {
                Ok(Value::Bound(function.bind(Value::Type(self.clone()))))
            }
            Some(value) => Ok(value),
            None => Err(DialogScopeError::not_found(self.name(), name)),
        }
    }

    /// Replace (or add) a public member.
    pub fn set(&self, name: &str, value: impl Into<Value>) -> ScopeResult<()> {
        let previous = self.0.members.write().insert(name.to_owned(), value.into());
        drop(previous);
        Ok(())
    }

    /// Remove a public member.
    pub fn delete(&self, name: &str) -> ScopeResult<()> {
        let removed = self.0.members.write().shift_remove(name);
        match removed {
            Some(Value::Hidden(_)) | None => Err(DialogScopeError::not_found(self.name(), name)),
            Some(_) => Ok(()),
        }
    }

    /// Look `name` up on the type and call it.
    pub fn call(&self, name: &str, arguments: Arguments) -> ScopeResult<Value> {
        self.get(name)?.call(arguments)
    }

    /// Create an instance, running the [`INITIALIZER`] member if there is one.
    pub fn instantiate(&self, arguments: Arguments) -> ScopeResult<Instance> {
        let instance = Instance::new(self.clone());
        if self.has(INITIALIZER) {
            instance.call(INITIALIZER, arguments)?;
        }
        Ok(instance)
    }

    /// A member as declared, without binding. Hidden markers that somehow
    /// ended up among the members are invisible.
    pub(crate) fn member(&self, name: &str) -> Option<Value> {
        match self.0.members.read().get(name) {
            Some(Value::Hidden(_)) | None => None,
            Some(value) => Some(value.clone()),
        }
    }
}

impl Drop for TypeState {
    fn drop(&mut self) {
        if let Some(scope) = &self.scope {
            scope.broker().evict_type(self.key);
        }
    }
}

impl PartialEq for Type {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Debug for Type {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "<type {}>", self.name())
    }
}

/// An object of some [`Type`] with its own public attributes.
#[derive(Clone)]
pub struct Instance(Arc<InstanceState>);

struct InstanceState {
    key: InstanceKey,
    class: Type,
    attributes: RwLock<Members>,
    releases: Mutex<Vec<WeakBroker>>,
}

impl Instance {
    fn new(class: Type) -> Self {
        Self(Arc::new(InstanceState {
            key: InstanceKey(NEXT_INSTANCE.fetch_add(1, Ordering::Relaxed)),
            class,
            attributes: RwLock::new(Members::new()),
            releases: Mutex::new(Vec::new()),
        }))
    }

    /// The identity of this instance.
    pub fn key(&self) -> InstanceKey {
        self.0.key
    }

    /// The type of this instance.
    pub fn class(&self) -> &Type {
        &self.0.class
    }

    /// Returns true if `name` is an own attribute or a public member of the
    /// type.
    pub fn has(&self, name: &str) -> bool {
        self.0.attributes.read().contains_key(name) || self.0.class.has(name)
    }

    /// Look `name` up.
    ///
    /// Properties of the type take precedence and are read through their
    /// getter, then own attributes, then members of the type, with functions
    /// bound to this instance.
    pub fn get(&self, name: &str) -> ScopeResult<Value> {
        let member = self.0.class.member(name);
        if let Some(Value::Property(property)) = &member {
            return property.get(name, self.value());
        }

        let attribute = self.0.attributes.read().get(name).cloned();
        match (attribute, member) {
            (Some(value), _) => Ok(value),
            (None, Some(Value::Function(function))) => {
                Ok(Value::Bound(function.bind(self.value())))
            }
            (None, Some(value)) => Ok(value),
            (None, None) => Err(DialogScopeError::not_found(self.0.class.name(), name)),
        }
    }

    /// Assign `name`, running the setter of a property of the type if there
    /// is one.
    pub fn set(&self, name: &str, value: impl Into<Value>) -> ScopeResult<()> {
        let value = value.into();
        if let Some(Value::Property(property)) = self.0.class.member(name) {
            return property.set(name, self.value(), value);
        }

        let previous = self.0.attributes.write().insert(name.to_owned(), value);
        drop(previous);
        Ok(())
    }

    /// Delete `name`, running the deleter of a property of the type if there
    /// is one.
    pub fn delete(&self, name: &str) -> ScopeResult<()> {
        if let Some(Value::Property(property)) = self.0.class.member(name) {
            return property.delete(name, self.value());
        }

        let removed = self.0.attributes.write().shift_remove(name);
        match removed {
            Some(_) => Ok(()),
            None => Err(DialogScopeError::not_found(self.0.class.name(), name)),
        }
    }

    /// Look `name` up and call it.
    pub fn call(&self, name: &str, arguments: Arguments) -> ScopeResult<Value> {
        self.get(name)?.call(arguments)
    }

    fn value(&self) -> Value {
        Value::Instance(self.clone())
    }

    /// Evict this instance's partition from `broker` once the instance is
    /// dropped.
    pub(crate) fn release_with(&self, broker: WeakBroker) {
        self.0.releases.lock().push(broker);
    }
}

impl Drop for InstanceState {
    fn drop(&mut self) {
        for broker in self.releases.get_mut().drain(..) {
            if let Some(broker) = broker.upgrade() {
                broker.evict_instance(self.key);
            }
        }
    }
}

impl PartialEq for Instance {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Debug for Instance {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "<{} instance {}>", self.0.class.name(), self.0.key.0)
    }
}
