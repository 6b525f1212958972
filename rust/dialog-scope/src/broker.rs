use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use tracing::trace;

use crate::{Accessor, InstanceKey, LayeredStore, Members, TypeKey, Value};

/// Shared access to one [`LayeredStore`].
///
/// The store lock is never held while a value is dropped or while user code
/// runs: values are cloned out before they are used and replaced values are
/// released only after the lock is gone. Dropping a value may drop the last
/// handle to an instance, which evicts its partition and needs the lock again.
#[derive(Debug, Default)]
pub(crate) struct Broker {
    store: RwLock<LayeredStore>,
}

impl Broker {
    pub fn new(statics: Members) -> Arc<Self> {
        Arc::new(Self {
            store: RwLock::new(LayeredStore::new(statics)),
        })
    }

    pub fn lookup(&self, accessor: &Accessor, name: &str) -> Option<Value> {
        self.store.read().resolve(accessor, name).cloned()
    }

    /// Returns true if the most specific layer for `accessor` holds `name`.
    pub fn holds(&self, accessor: &Accessor, name: &str) -> bool {
        self.store
            .read()
            .layer(accessor)
            .is_some_and(|members| members.contains_key(name))
    }

    pub fn assign(self: &Arc<Self>, accessor: &Accessor, name: &str, value: Value) {
        let (previous, created) = self.store.write().assign(accessor, name, value);

        if created && let Accessor::Instance(instance) = accessor {
            trace!(instance = ?instance.key(), "Created instance partition");
            instance.release_with(Arc::downgrade(self));
        }

        drop(previous);
    }

    pub fn install<I>(&self, accessor: &Accessor, members: I)
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        let mut replaced = Vec::new();
        {
            let mut store = self.store.write();
            for (name, value) in members {
                let (previous, _) = store.assign(accessor, name, value);
                replaced.extend(previous);
            }
        }
        drop(replaced);
    }

    pub fn remove(&self, accessor: &Accessor, name: &str) -> Option<Value> {
        self.store.write().remove(accessor, name)
    }

    pub fn evict_instance(&self, key: InstanceKey) {
        let partition = self.store.write().evict_instance(key);
        if let Some(members) = partition {
            trace!(instance = ?key, members = members.len(), "Evicted instance partition");
        }
    }

    pub fn evict_type(&self, key: TypeKey) {
        let partition = self.store.write().evict_type(key);
        if let Some(members) = partition {
            trace!(class = ?key, members = members.len(), "Evicted type partition");
        }
    }

    pub fn partitions(&self) -> (usize, usize) {
        let store = self.store.read();
        (store.type_partitions(), store.instance_partitions())
    }
}

/// A broker handle that does not keep the broker alive.
pub(crate) type WeakBroker = Weak<Broker>;
