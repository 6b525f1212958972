//! Layered storage of hidden members.
//!
//! A [`LayeredStore`] is partitioned into three layers:
//!
//! ```text
//! instance layer   InstanceKey -> members   (accessor is an instance)
//!       │
//! type layer       TypeKey     -> members   (accessor is, or has, a type)
//!       │
//! static layer     members                  (always consulted last)
//! ```
//!
//! Reads walk from the most specific layer applicable to the [`Accessor`]
//! down to the static layer and the first layer holding the name wins.
//! Writes always land in the most specific layer.

use std::collections::HashMap;

use indexmap::IndexMap;

use crate::{Instance, InstanceKey, Type, TypeKey, Value};

/// Members of one partition, in declaration order.
pub type Members = IndexMap<String, Value>;

/// The context a member is resolved for.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Accessor {
    /// Free-standing access; only the static layer is visible.
    #[default]
    None,
    /// Access on behalf of a type.
    Type(Type),
    /// Access on behalf of an instance.
    Instance(Instance),
}

impl Accessor {
    /// The accessor as a [`Value`], used as the receiver of bound members.
    pub fn value(&self) -> Value {
        match self {
            Accessor::None => Value::None,
            Accessor::Type(class) => Value::Type(class.clone()),
            Accessor::Instance(instance) => Value::Instance(instance.clone()),
        }
    }

    /// The type whose layer is visible to this accessor.
    pub fn class(&self) -> Option<&Type> {
        match self {
            Accessor::None => None,
            Accessor::Type(class) => Some(class),
            Accessor::Instance(instance) => Some(instance.class()),
        }
    }

    /// Accessor describing a type: instances are replaced by their type.
    pub fn to_type(&self) -> Accessor {
        match self.class() {
            Some(class) => Accessor::Type(class.clone()),
            None => Accessor::None,
        }
    }

    /// Name reported when a lookup through this accessor fails.
    pub(crate) fn owner(&self) -> &str {
        match self.class() {
            Some(class) => class.name(),
            None => "scope",
        }
    }
}

impl From<&Value> for Accessor {
    fn from(value: &Value) -> Self {
        match value {
            Value::Instance(instance) => Accessor::Instance(instance.clone()),
            Value::Type(class) => Accessor::Type(class.clone()),
            _ => Accessor::None,
        }
    }
}

impl From<Instance> for Accessor {
    fn from(instance: Instance) -> Self {
        Accessor::Instance(instance)
    }
}

impl From<&Instance> for Accessor {
    fn from(instance: &Instance) -> Self {
        Accessor::Instance(instance.clone())
    }
}

impl From<Type> for Accessor {
    fn from(class: Type) -> Self {
        Accessor::Type(class)
    }
}

impl From<&Type> for Accessor {
    fn from(class: &Type) -> Self {
        Accessor::Type(class.clone())
    }
}

impl From<()> for Accessor {
    fn from(_: ()) -> Self {
        Accessor::None
    }
}

/// Static, type and instance partitions with override-by-specificity reads.
#[derive(Debug, Default)]
pub struct LayeredStore {
    statics: Members,
    types: HashMap<TypeKey, Members>,
    instances: HashMap<InstanceKey, Members>,
}

impl LayeredStore {
    /// A store whose static layer is pre-seeded with `statics`.
    pub fn new(statics: Members) -> Self {
        Self {
            statics,
            ..Self::default()
        }
    }

    /// Resolve `name` for `accessor`, walking instance → type → static.
    pub fn resolve(&self, accessor: &Accessor, name: &str) -> Option<&Value> {
        if let Accessor::Instance(instance) = accessor
            && let Some(value) = self
                .instances
                .get(&instance.key())
                .and_then(|members| members.get(name))
        {
            return Some(value);
        }

        if let Some(class) = accessor.class()
            && let Some(value) = self
                .types
                .get(&class.key())
                .and_then(|members| members.get(name))
        {
            return Some(value);
        }

        self.statics.get(name)
    }

    /// The most specific layer for `accessor`, if it exists yet.
    pub fn layer(&self, accessor: &Accessor) -> Option<&Members> {
        match accessor {
            Accessor::None => Some(&self.statics),
            Accessor::Type(class) => self.types.get(&class.key()),
            Accessor::Instance(instance) => self.instances.get(&instance.key()),
        }
    }

    /// Write `value` to the most specific layer for `accessor`.
    ///
    /// Returns the replaced value along with whether the write created a new
    /// instance partition.
    pub fn assign(
        &mut self,
        accessor: &Accessor,
        name: impl Into<String>,
        value: Value,
    ) -> (Option<Value>, bool) {
        let (members, created) = self.layer_mut(accessor);
        (members.insert(name.into(), value), created)
    }

    /// Remove `name` from the most specific layer for `accessor`.
    pub fn remove(&mut self, accessor: &Accessor, name: &str) -> Option<Value> {
        let members = match accessor {
            Accessor::None => Some(&mut self.statics),
            Accessor::Type(class) => self.types.get_mut(&class.key()),
            Accessor::Instance(instance) => self.instances.get_mut(&instance.key()),
        }?;
        members.shift_remove(name)
    }

    /// Drop the partition of the instance identified by `key`.
    pub fn evict_instance(&mut self, key: InstanceKey) -> Option<Members> {
        self.instances.remove(&key)
    }

    /// Drop the partition of the type identified by `key`.
    pub fn evict_type(&mut self, key: TypeKey) -> Option<Members> {
        self.types.remove(&key)
    }

    /// Number of live instance partitions.
    pub fn instance_partitions(&self) -> usize {
        self.instances.len()
    }

    /// Number of live type partitions.
    pub fn type_partitions(&self) -> usize {
        self.types.len()
    }

    fn layer_mut(&mut self, accessor: &Accessor) -> (&mut Members, bool) {
        match accessor {
            Accessor::None => (&mut self.statics, false),
            Accessor::Type(class) => (self.types.entry(class.key()).or_default(), false),
            Accessor::Instance(instance) => {
                let created = !self.instances.contains_key(&instance.key());
                (self.instances.entry(instance.key()).or_default(), created)
            }
        }
    }
}
