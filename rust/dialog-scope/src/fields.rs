use indexmap::IndexMap;

use crate::Value;

/// A bundle of hidden fields registered in one go.
///
/// Bundles are consumed by [`Scope::register_fields`](crate::Scope::register_fields),
/// which places them in the static layer, and by
/// [`TypeDeclaration::fields`](crate::TypeDeclaration::fields), which places
/// them in the layer of the declared type. Reserved names (wrapped in double
/// underscores) are never registered.
///
/// ```
/// use dialog_scope::Fields;
///
/// let fields = Fields::new().field("global_count", 0).field("__module__", "ticker");
/// assert_eq!(fields.names().collect::<Vec<_>>(), vec!["global_count"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Fields {
    entries: IndexMap<String, Value>,
}

impl Fields {
    /// An empty bundle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a field.
    pub fn field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.entries.insert(name.into(), value.into());
        self
    }

    /// Names of the fields that will be registered.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries
            .keys()
            .map(String::as_str)
            .filter(|name| !is_reserved(name))
    }

    /// Consume the bundle, yielding the fields that will be registered.
    pub fn into_visible(self) -> impl Iterator<Item = (String, Value)> {
        self.entries
            .into_iter()
            .filter(|(name, _)| !is_reserved(name))
    }
}

impl<K, V> FromIterator<(K, V)> for Fields
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        }
    }
}

/// Returns true for names reserved by the object model, such as `__static__`.
pub fn is_reserved(name: &str) -> bool {
    name.len() > 4 && name.starts_with("__") && name.ends_with("__")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_skips_reserved_names() {
        let fields: Fields = [("__qualname__", Value::from("_")), ("count", Value::from(0))]
            .into_iter()
            .collect();

        let visible: Vec<_> = fields.into_visible().collect();
        assert_eq!(visible, vec![("count".to_owned(), Value::from(0))]);
    }

    #[test]
    fn it_only_reserves_wrapped_names() {
        assert!(is_reserved("__static__"));
        assert!(!is_reserved("__"));
        assert!(!is_reserved("____"));
        assert!(!is_reserved("_count"));
        assert!(!is_reserved("__count"));
    }
}
