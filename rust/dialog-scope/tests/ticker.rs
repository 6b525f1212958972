//! Counter scenarios: a ticker keeps its count hidden while exposing
//! `increment`, `lock` and `unlock`, and shares a global count between all
//! tickers, either in the layer of its type or in the static layer of its
//! scope.

use anyhow::Result;
use dialog_scope::{
    Arguments, Capability, DialogScopeError, Fields, Function, INITIALIZER, Instance, Property,
    Scope, ScopeResult, Shape, Type, TypeDeclaration, Value, hide,
};
use pretty_assertions::assert_eq;

/// Where the global count of a ticker lives.
#[derive(Clone, Copy)]
enum Globals {
    /// In the type layer of the ticker type.
    Type,
    /// In the static layer of the scope.
    Static,
}

fn globals(pself: &Capability, globals: Globals) -> ScopeResult<Capability> {
    match globals {
        Globals::Static => Ok(pself.statics()),
        Globals::Type => {
            let class = pself
                .accessor()
                .class()
                .cloned()
                .ok_or_else(|| DialogScopeError::native("Ticker has no type"))?;
            Ok(pself.of(class))
        }
    }
}

fn ticker(declaration: TypeDeclaration, mode: Globals) -> ScopeResult<Type> {
    declaration
        .member(
            INITIALIZER,
            Function::scoped(INITIALIZER, "pself", |_, pself| {
                pself.set("count", 0)?;
                pself.set("mutable", true)?;
                Ok(Value::None)
            }),
        )
        .member(
            "lock",
            Function::scoped("lock", "pself", |_, pself| {
                pself.set("mutable", false)?;
                Ok(Value::None)
            }),
        )
        .member(
            "increment",
            Function::scoped("increment", "pself", move |_, pself| {
                if pself.get("mutable")?.expect_bool()? {
                    let count = pself.get("count")?.expect_integer()? + 1;
                    pself.set("count", count)?;

                    let globals = globals(&pself, mode)?;
                    let total = globals.get("global_count")?.expect_integer()? + 1;
                    globals.set("global_count", total)?;
                }
                pself.get("count")
            }),
        )
        .member(
            "double_count",
            Property::new(Function::scoped("double_count", "pself", |_, pself| {
                Ok(Value::from(pself.get("count")?.expect_integer()? * 2))
            })),
        )
        .member(
            "global_count",
            Function::scoped("global_count", "pself", move |_, pself| {
                globals(&pself, mode)?.get("global_count")
            })
            .shaped(Shape::TypeBound),
        )
        .hidden(hide(Function::scoped(
            "rm_from_global",
            "pself",
            move |_, pself| {
                let globals = globals(&pself, mode)?;
                let total = globals.get("global_count")?.expect_integer()?
                    - pself.get("count")?.expect_integer()?;
                globals.set("global_count", total)?;
                Ok(Value::None)
            },
        )))
        .member(
            "unlock",
            Function::scoped("unlock", "pself", |_, pself| {
                if pself.get("mutable")?.expect_bool()? {
                    return Err(DialogScopeError::native("Ticker is not locked!"));
                }
                pself.call("rm_from_global", Arguments::new())?;
                pself.set("count", 0)?;
                pself.set("mutable", true)?;
                Ok(Value::None)
            }),
        )
        .member(
            "eq",
            Function::scoped("eq", "pself", |arguments, pself| {
                let other = arguments.require(1)?;
                Ok(Value::from(
                    pself.get("count")? == pself.of(other).get("count")?,
                ))
            }),
        )
        .build()
}

fn increment(instance: &Instance) -> ScopeResult<Value> {
    instance.call("increment", Arguments::new())
}

fn global_count(instance: &Instance) -> ScopeResult<Value> {
    instance.call("global_count", Arguments::new())
}

fn exercise(class: &Type) -> Result<()> {
    let t = class.instantiate(Arguments::new())?;
    let u = class.instantiate(Arguments::new())?;

    assert_eq!(
        t.call("eq", Arguments::new().with(u.clone()))?,
        Value::from(true)
    );

    increment(&t)?;
    increment(&t)?;
    increment(&t)?;
    assert_eq!(increment(&t)?, Value::from(4));
    assert_eq!(t.get("double_count")?, Value::from(8));

    increment(&u)?;
    increment(&u)?;
    assert_eq!(global_count(&u)?, Value::from(6));
    assert_eq!(class.call("global_count", Arguments::new())?, Value::from(6));
    assert_eq!(
        t.call("eq", Arguments::new().with(u.clone()))?,
        Value::from(false)
    );

    assert_eq!(
        u.call("unlock", Arguments::new()).unwrap_err(),
        DialogScopeError::native("Ticker is not locked!")
    );

    u.call("lock", Arguments::new())?;
    assert_eq!(increment(&u)?, Value::from(2));
    u.call("unlock", Arguments::new())?;
    assert_eq!(global_count(&u)?, Value::from(4));
    assert_eq!(increment(&u)?, Value::from(1));

    for name in ["count", "mutable", "pself", "rm_from_global"] {
        assert_eq!(
            t.get(name).unwrap_err(),
            DialogScopeError::not_found(class.name(), name)
        );
    }
    assert!(t.call("rm_from_global", Arguments::new()).is_err());
    Ok(())
}

#[test]
fn it_keeps_global_counts_in_the_type_layer() -> Result<()> {
    let class = ticker(
        TypeDeclaration::new("Ticker").fields(Fields::new().field("global_count", 0)),
        Globals::Type,
    )?;
    exercise(&class)
}

#[test]
fn it_keeps_global_counts_in_the_static_layer() -> Result<()> {
    let scope = Scope::new();
    scope.register_fields(Fields::new().field("global_count", 0))?;

    let statics = scope.resolve(())?;

    let class = ticker(TypeDeclaration::new("Ticker").scope(&scope), Globals::Static)?;
    scope.close();

    exercise(&class)?;
    assert_eq!(statics.get("global_count")?, Value::from(5));
    Ok(())
}

#[test]
fn it_counts_independently_per_instance() -> Result<()> {
    let class = ticker(
        TypeDeclaration::new("Ticker").fields(Fields::new().field("global_count", 0)),
        Globals::Type,
    )?;

    let first = class.instantiate(Arguments::new())?;
    let second = class.instantiate(Arguments::new())?;

    let counts = [
        increment(&first)?,
        increment(&first)?,
        increment(&first)?,
        increment(&second)?,
    ];
    assert_eq!(
        counts,
        [Value::from(1), Value::from(2), Value::from(3), Value::from(1)]
    );
    assert_eq!(global_count(&second)?, Value::from(4));
    Ok(())
}

#[test]
fn it_does_not_affect_public_attributes_of_the_same_name() -> Result<()> {
    let class = ticker(
        TypeDeclaration::new("Ticker").fields(Fields::new().field("global_count", 0)),
        Globals::Type,
    )?;
    let t = class.instantiate(Arguments::new())?;

    t.set("count", 999)?;
    assert_eq!(increment(&t)?, Value::from(1));
    assert_eq!(t.get("count")?, Value::from(999));

    t.delete("count")?;
    assert!(t.get("count").is_err());
    Ok(())
}

#[test]
fn it_releases_hidden_state_of_dropped_tickers() -> Result<()> {
    let scope = Scope::new();
    scope.register_fields(Fields::new().field("global_count", 0))?;
    let class = ticker(TypeDeclaration::new("Ticker").scope(&scope), Globals::Static)?;

    let t = class.instantiate(Arguments::new())?;
    let u = class.instantiate(Arguments::new())?;
    increment(&t)?;
    assert_eq!(scope.partitions(), (1, 2));

    drop(t);
    assert_eq!(scope.partitions(), (1, 1));
    assert_eq!(global_count(&u)?, Value::from(1));

    drop(u);
    drop(class);
    assert_eq!(scope.partitions(), (0, 0));
    Ok(())
}
