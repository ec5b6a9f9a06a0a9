use serde::{Deserialize, Serialize};

//
// ──────────────────────────────────────────────────────────
// PatchField (explicit PATCH semantics)
// ──────────────────────────────────────────────────────────
// - Unset: field not provided => keep DB value
// - Null: explicitly null => set DB column NULL (only for nullable fields)
// - Value(v): replace with v
//

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PatchField<T> {
    #[serde(skip)]
    Unset,
    Null,
    Value(T),
}

impl<T> Default for PatchField<T> {
    fn default() -> Self {
        PatchField::Unset
    }
}

impl<T> PatchField<T> {
    pub fn is_unset(&self) -> bool {
        matches!(self, PatchField::Unset)
    }

    pub fn as_value(&self) -> Option<&T> {
        if let PatchField::Value(v) = self {
            Some(v)
        } else {
            None
        }
    }

    /// `None` keeps the stored value, `Some(None)` clears it.
    pub fn into_change(self) -> Option<Option<T>> {
        match self {
            PatchField::Unset => None,
            PatchField::Null => Some(None),
            PatchField::Value(v) => Some(Some(v)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_change() {
        assert_eq!(PatchField::<String>::Unset.into_change(), None);
        assert_eq!(PatchField::<String>::Null.into_change(), Some(None));
        assert_eq!(
            PatchField::Value("x".to_string()).into_change(),
            Some(Some("x".to_string()))
        );
    }

    #[test]
    fn test_default_is_unset() {
        let field: PatchField<u32> = PatchField::default();
        assert!(field.is_unset());
        assert!(field.as_value().is_none());
    }
}
