use std::fmt::{Debug, Display, Formatter};
use std::ops::Deref;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::debug;

use crate::broker::Broker;
use crate::{
    Accessor, Capability, DialogScopeError, Fields, Hidden, Members, ScopeResult, ScopeSettings,
    Value, Wrapper,
};

/// Owner of one registry of hidden members and its lifecycle gate.
///
/// A scope starts out open. While open, members can be declared and
/// capabilities resolved; [`Scope::close`] permanently stops both. Closing
/// does not revoke anything already handed out: capabilities and wrapped
/// functions keep reading and writing the very same store.
///
/// `Scope` is a cheap handle; clones refer to the same scope.
///
/// ```
/// use dialog_scope::{DialogScopeError, Scope};
///
/// let scope = Scope::new();
/// scope.declare("global_count", 0)?;
///
/// let statics = scope.resolve(())?;
/// scope.close();
///
/// assert_eq!(scope.declare("other", 1), Err(DialogScopeError::ClosedScope));
/// statics.set("global_count", 1)?;
/// # Ok::<(), DialogScopeError>(())
/// ```
#[derive(Clone)]
pub struct Scope {
    state: Arc<ScopeState>,
}

struct ScopeState {
    open: AtomicBool,
    broker: Arc<Broker>,
    settings: ScopeSettings,
}

impl Default for Scope {
    fn default() -> Self {
        Self::new()
    }
}

impl Scope {
    /// An open scope with an empty store and default settings.
    pub fn new() -> Self {
        Self::build(Members::new(), ScopeSettings::default())
    }

    /// An open scope whose static layer is pre-seeded with `statics`.
    pub fn with_statics<I, K, V>(statics: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let statics = statics
            .into_iter()
            .map(|(name, value)| (name.into(), value.into()))
            .collect();
        Self::build(statics, ScopeSettings::default())
    }

    /// An open, empty scope with the given settings.
    pub fn with_settings(settings: ScopeSettings) -> Self {
        Self::build(Members::new(), settings)
    }

    fn build(statics: Members, settings: ScopeSettings) -> Self {
        Self {
            state: Arc::new(ScopeState {
                open: AtomicBool::new(true),
                broker: Broker::new(statics),
                settings,
            }),
        }
    }

    /// The settings used when this scope wraps callables on its own.
    pub fn settings(&self) -> &ScopeSettings {
        &self.state.settings
    }

    /// Returns true until [`Scope::close`] is called.
    pub fn is_open(&self) -> bool {
        self.state.open.load(Ordering::Acquire)
    }

    /// Stop accepting declarations and resolutions. Idempotent.
    pub fn close(&self) {
        if self.state.open.swap(false, Ordering::AcqRel) {
            debug!(scope = %self, "Closed scope");
        }
    }

    /// A guard over this scope that closes it when dropped.
    ///
    /// ```
    /// use dialog_scope::{DialogScopeError, Scope};
    ///
    /// let scope = Scope::new();
    /// {
    ///     let open = scope.open_guard();
    ///     open.declare("global_count", 0)?;
    /// }
    /// assert!(!scope.is_open());
    /// # Ok::<(), DialogScopeError>(())
    /// ```
    pub fn open_guard(&self) -> ScopeGuard {
        ScopeGuard(self.clone())
    }

    /// Store `value` under `name` in the static layer.
    pub fn declare(&self, name: &str, value: impl Into<Value>) -> ScopeResult<()> {
        self.require_open()?;
        self.state.broker.assign(&Accessor::None, name, value.into());
        Ok(())
    }

    /// A capability into this scope for `accessor`: `()` for none, a
    /// [`Type`](crate::Type) or an [`Instance`](crate::Instance).
    pub fn resolve(&self, accessor: impl Into<Accessor>) -> ScopeResult<Capability> {
        self.require_open()?;
        Ok(Capability::new(self.state.broker.clone(), accessor.into()))
    }

    /// Read `name` from the static layer.
    pub fn get(&self, name: &str) -> ScopeResult<Value> {
        self.resolve(Accessor::None)?.get(name)
    }

    /// Write `name` to the static layer.
    pub fn set(&self, name: &str, value: impl Into<Value>) -> ScopeResult<()> {
        self.resolve(Accessor::None)?.set(name, value)
    }

    /// Register a hidden callable in the static layer.
    ///
    /// The callable is wrapped with this scope's settings (never strictly),
    /// so once reached through a capability it receives a capability of its
    /// own if it asks for one. Returns the name it was registered under.
    pub fn register_hidden(&self, hidden: Hidden, name: Option<&str>) -> ScopeResult<String> {
        self.require_open()?;
        let name = name
            .filter(|name| !name.is_empty())
            .or(hidden.name())
            .map(str::to_owned)
            .ok_or(DialogScopeError::NameResolution)?;

        let hidden = hidden.wrap(&self.lenient_wrapper())?;
        self.state
            .broker
            .assign(&Accessor::None, &name, Value::Hidden(hidden));
        debug!(scope = %self, %name, "Registered hidden member");
        Ok(name)
    }

    /// Register a bundle of hidden fields in the static layer.
    pub fn register_fields(&self, fields: Fields) -> ScopeResult<()> {
        self.require_open()?;
        let wrapper = self.lenient_wrapper();
        let members = fields
            .into_visible()
            .map(|(name, value)| -> ScopeResult<(String, Value)> {
                Ok((name, wrapper.wrap(value)?))
            })
            .collect::<ScopeResult<Vec<_>>>()?;
        self.state.broker.install(&Accessor::None, members);
        Ok(())
    }

    /// A [`Wrapper`] injecting capabilities into this scope.
    pub fn wrapper(&self, settings: ScopeSettings) -> ScopeResult<Wrapper> {
        self.require_open()?;
        Ok(Wrapper::new(Arc::downgrade(&self.state.broker), settings))
    }

    /// Number of type and instance partitions currently held by the store.
    pub fn partitions(&self) -> (usize, usize) {
        self.state.broker.partitions()
    }

    pub(crate) fn require_open(&self) -> ScopeResult<()> {
        if self.is_open() {
            Ok(())
        } else {
            Err(DialogScopeError::ClosedScope)
        }
    }

    pub(crate) fn broker(&self) -> &Arc<Broker> {
        &self.state.broker
    }

    fn lenient_wrapper(&self) -> Wrapper {
        Wrapper::new(
            Arc::downgrade(&self.state.broker),
            self.state.settings.clone().lenient(),
        )
    }
}

/// A [`Scope`] handle that closes the scope when it goes out of scope.
///
/// Created by [`Scope::open_guard`].
#[derive(Debug)]
pub struct ScopeGuard(Scope);

impl ScopeGuard {
    /// A fresh, open scope guarded for the lifetime of the returned value.
    pub fn new() -> Self {
        Scope::new().open_guard()
    }
}

impl Default for ScopeGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Deref for ScopeGuard {
    type Target = Scope;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        self.0.close();
    }
}

impl Display for Scope {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let state = if self.is_open() { "open" } else { "closed" };
        write!(f, "<{state} scope at {:p}>", Arc::as_ptr(&self.state))
    }
}

impl Debug for Scope {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scope")
            .field("open", &self.is_open())
            .field("settings", &self.state.settings)
            .finish()
    }
}
