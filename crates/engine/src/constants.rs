//! # Constant Merge
//!
//! Root-level, non-destructive overlay of the constant table.

use crate::error::{EngineError, EngineErrorExt};
use carve_domain::path::validate_key;
use carve_domain::{ConstantTable, Namespace, Node};

/// Sets every constant at the root of `namespace`, in table order.
///
/// # Errors
/// * [`EngineError::ConstantCollision`] if a name already exists at the root.
/// * [`EngineError::InvalidPath`] if a name is not an identifier.
pub fn merge_constants(
    mut namespace: Namespace,
    constants: &ConstantTable,
) -> Result<Namespace, EngineError> {
    for (name, value) in constants.iter() {
        validate_key(name).context("constant name")?;
        namespace
            .insert(name, Node::Constant(value.clone()))
            .map_err(|_| EngineError::ConstantCollision { name: name.to_owned(), context: None })?;
    }
    Ok(namespace)
}

#[cfg(test)]
mod tests {
    use super::*;
    use carve_domain::{ComponentEntry, ComponentPath, ConstValue};

    fn namespace() -> Namespace {
        let mut ns = Namespace::new();
        let game = ComponentEntry::new(ComponentPath::parse("Game").unwrap(), "core/Game");
        ns.insert("Game", Node::Component(game)).unwrap();
        ns.branch_mut("Math").unwrap();
        ns
    }

    #[test]
    fn constants_land_at_root_after_components() {
        let table = ConstantTable::new().with("AUTO", 0_i64).with("VERSION", "3.61.0");
        let ns = merge_constants(namespace(), &table).unwrap();

        assert_eq!(ns.keys().collect::<Vec<_>>(), ["Game", "Math", "AUTO", "VERSION"]);
        assert_eq!(ns.get("AUTO"), Some(&Node::Constant(ConstValue::Int(0))));
    }

    #[test]
    fn collision_with_component_or_branch_is_rejected() {
        for name in ["Game", "Math"] {
            let table = ConstantTable::new().with(name, 1_i64);
            let err = merge_constants(namespace(), &table).unwrap_err();
            assert!(matches!(err, EngineError::ConstantCollision { name: ref n, .. } if n == name));
        }
    }

    #[test]
    fn constants_never_descend() {
        let table = ConstantTable::new().with("Between", 1_i64);
        let ns = merge_constants(namespace(), &table).unwrap();
        assert!(ns.get("Math").and_then(Node::as_branch).unwrap().is_empty());
        assert!(ns.get("Between").is_some());
    }
}
