#![warn(missing_docs)]

//! Hidden members and capability injection for a dynamic object model.
//!
//! Nothing in the object model of this crate is private: every member of a
//! [`Type`] and every attribute of an [`Instance`] can be read, replaced and
//! deleted by whoever holds a handle. This crate adds encapsulation on top of
//! it. A [`Scope`] keeps a registry of hidden state and hidden callables that
//! is invisible to ordinary lookup; the only way in is a [`Capability`], which
//! is handed to callables that ask for one.
//!
//! # Quick Example
//!
//! ```rust
//! use dialog_scope::{Arguments, Fields, Function, Scope, TypeDeclaration, Value, hide};
//!
//! let scope = Scope::new();
//! let ticker = TypeDeclaration::new("Ticker")
//!     .scope(&scope)
//!     .fields(Fields::new().field("count", 0))
//!     .hidden(hide(Function::scoped("reset", "pself", |_, pself| {
//!         pself.set("count", 0)?;
//!         Ok(Value::None)
//!     })))
//!     .member(
//!         "increment",
//!         Function::scoped("increment", "pself", |_, pself| {
//!             let count = pself.get("count")?.expect_integer()? + 1;
//!             pself.set("count", count)?;
//!             Ok(Value::from(count))
//!         }),
//!     )
//!     .member(
//!         "restart",
//!         Function::scoped("restart", "pself", |_, pself| {
//!             pself.call("reset", Arguments::new())
//!         }),
//!     )
//!     .build()?;
//!
//! let first = ticker.instantiate(Arguments::new())?;
//! let second = ticker.instantiate(Arguments::new())?;
//!
//! first.call("increment", Arguments::new())?;
//! assert_eq!(first.call("increment", Arguments::new())?, Value::from(2));
//! assert_eq!(second.call("increment", Arguments::new())?, Value::from(1));
//!
//! // Hidden members look exactly like members that do not exist.
//! assert!(first.get("count").is_err());
//! assert!(first.get("reset").is_err());
//!
//! first.call("restart", Arguments::new())?;
//! assert_eq!(first.call("increment", Arguments::new())?, Value::from(1));
//! # Ok::<(), dialog_scope::DialogScopeError>(())
//! ```
//!
//! # Core Concepts
//!
//! ## Layers
//!
//! A scope stores hidden members in three layers: the static layer, one
//! partition per [`Type`] and one partition per [`Instance`]. A lookup made
//! on behalf of an [`Accessor`] walks from the most specific layer down to
//! the static one; writes land in the most specific layer. See
//! [`LayeredStore`].
//!
//! ## Capability injection
//!
//! A [`Function`] asks for access by declaring, with [`Function::scoped`],
//! the parameter through which it wants to receive a [`Capability`]. The
//! [`Wrapper`] recognizes that parameter and supplies a capability resolved
//! for the receiver at every call. Functions that do not declare it never
//! see the scope.
//!
//! ## Declaring types
//!
//! [`TypeDeclaration`] applies all of the above to a whole type: members
//! marked with [`hide`] and bundles of [`Fields`] go to the scope, every
//! other member is wrapped and installed on the type.

mod error;
pub use error::*;

mod settings;
pub use settings::*;

mod value;
pub use value::*;

mod function;
pub use function::*;

mod object;
pub use object::*;

mod hidden;
pub use hidden::*;

mod fields;
pub use fields::*;

mod store;
pub use store::*;

mod broker;

mod capability;
pub use capability::*;

mod wrapper;
pub use wrapper::*;

mod scope;
pub use scope::*;

mod declaration;
pub use declaration::*;
