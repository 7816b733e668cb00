//! Structural compatibility between a declared type and an expression.
//!
//! This is a shape check, not type inference: a `num` slot accepts a
//! number literal and nothing else, a `list[T]` slot accepts a list
//! literal whose elements fit `T`, and so on. Variables, index
//! expressions and arithmetic never fit a slot here; the compiler
//! special-cases a bare variable on the right of an assignment before
//! calling in.

use std::collections::HashMap;

use crate::ast::{Expr, TablePair};
use crate::error::{CompileError, ResultExt};
use crate::types::{DataType, Field};

/// Object definitions by name, in a single flat namespace.
pub type ObjectRegistry = HashMap<String, Vec<Field>>;

/// Check that `expr` has the shape `data_type` demands.
///
/// Pure: the registry is only read, so repeating a check gives the same
/// answer.
pub fn check_expression(
    data_type: &DataType,
    expr: &Expr,
    objects: &ObjectRegistry,
) -> Result<(), CompileError> {
    match data_type {
        DataType::Number => expect_shape(data_type, expr, matches!(expr, Expr::Number(_))),
        DataType::String => expect_shape(data_type, expr, matches!(expr, Expr::String(_))),
        DataType::Boolean => expect_shape(data_type, expr, matches!(expr, Expr::Boolean(_))),
        DataType::List(element) => {
            let Expr::List(elements) = expr else {
                return Err(mismatch(data_type, expr));
            };
            for (i, value) in elements.iter().enumerate() {
                check_expression(element, value, objects)
                    .context_with(|| format!("list element {i}"))?;
            }
            Ok(())
        }
        DataType::Map { key, value } => {
            let Expr::Table(pairs) = expr else {
                return Err(mismatch(data_type, expr));
            };
            for (i, pair) in pairs.iter().enumerate() {
                check_expression(key, &pair.key, objects).context_with(|| format!("map key {i}"))?;
                check_expression(value, &pair.value, objects)
                    .context_with(|| format!("map value {i}"))?;
            }
            Ok(())
        }
        DataType::Object(fields) => {
            let Expr::Table(pairs) = expr else {
                return Err(mismatch(data_type, expr));
            };
            check_fields(&data_type.to_string(), fields, pairs, objects)
        }
        DataType::Custom { name, .. } => {
            let Expr::Table(pairs) = expr else {
                return Err(mismatch(data_type, expr));
            };
            let fields = objects
                .get(name)
                .ok_or_else(|| CompileError::UnknownType { name: name.clone() })?;
            check_fields(name, fields, pairs, objects)
        }
    }
}

/// Every key must name a field of the object; fields the literal leaves
/// out are zero-filled by the emitter and are not an error.
fn check_fields(
    object: &str,
    fields: &[Field],
    pairs: &[TablePair],
    objects: &ObjectRegistry,
) -> Result<(), CompileError> {
    for pair in pairs {
        let Expr::Variable(key) = &pair.key else {
            return Err(CompileError::InvalidObjectKey {
                object: object.to_string(),
                found: pair.key.describe().to_string(),
            });
        };

        let field = fields.iter().find(|field| &field.name == key).ok_or_else(|| {
            CompileError::UnknownObjectField {
                object: object.to_string(),
                field: key.clone(),
            }
        })?;

        check_expression(&field.data_type, &pair.value, objects)
            .context_with(|| format!("field {key:?} of {object}"))?;
    }
    Ok(())
}

fn expect_shape(data_type: &DataType, expr: &Expr, fits: bool) -> Result<(), CompileError> {
    if fits { Ok(()) } else { Err(mismatch(data_type, expr)) }
}

fn mismatch(data_type: &DataType, expr: &Expr) -> CompileError {
    CompileError::TypeMismatch {
        expected: data_type.to_string(),
        found: expr.describe().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(text: &str) -> Expr {
        Expr::Number(text.to_string())
    }

    fn string(text: &str) -> Expr {
        Expr::String(text.to_string())
    }

    fn pair(key: Expr, value: Expr) -> TablePair {
        TablePair { key, value }
    }

    fn registry() -> ObjectRegistry {
        let mut objects = ObjectRegistry::new();
        objects.insert(
            "point".to_string(),
            vec![
                Field::new("x", DataType::Number),
                Field::new("y", DataType::Number),
            ],
        );
        objects.insert(
            "shape".to_string(),
            vec![
                Field::new("name", DataType::String),
                Field::new("origin", DataType::custom("point")),
            ],
        );
        objects
    }

    #[test]
    fn primitives_need_matching_literals() {
        let objects = ObjectRegistry::new();
        assert!(check_expression(&DataType::Number, &num("1"), &objects).is_ok());
        assert!(check_expression(&DataType::String, &string("hi"), &objects).is_ok());
        assert!(
            check_expression(&DataType::Boolean, &Expr::Boolean("true".into()), &objects).is_ok()
        );

        let err = check_expression(&DataType::String, &num("123"), &objects).unwrap_err();
        assert_eq!(
            err,
            CompileError::TypeMismatch {
                expected: "str".to_string(),
                found: "number literal".to_string(),
            }
        );
    }

    #[test]
    fn variables_never_fit_a_slot() {
        let objects = ObjectRegistry::new();
        let err = check_expression(&DataType::Number, &Expr::Variable("x".into()), &objects)
            .unwrap_err();
        assert!(err.is_type_mismatch());
    }

    #[test]
    fn list_elements_are_checked_recursively() {
        let objects = ObjectRegistry::new();
        let list = DataType::list(DataType::String);
        assert!(
            check_expression(&list, &Expr::List(vec![string("a"), string("b")]), &objects).is_ok()
        );

        let err = check_expression(&list, &Expr::List(vec![num("1"), num("2")]), &objects)
            .unwrap_err();
        assert!(err.is_type_mismatch());
        assert_eq!(
            err.to_string(),
            "list element 0: invalid type assign: wanted str, got number literal"
        );

        let err = check_expression(&list, &num("123"), &objects).unwrap_err();
        assert!(err.is_type_mismatch());
    }

    #[test]
    fn map_keys_and_values_are_checked() {
        let objects = ObjectRegistry::new();
        let map = DataType::map(DataType::String, DataType::Number);
        let good = Expr::Table(vec![pair(string("hello"), num("1"))]);
        assert!(check_expression(&map, &good, &objects).is_ok());

        let bad_value = Expr::Table(vec![pair(
            string("something"),
            Expr::Boolean("false".into()),
        )]);
        let err = check_expression(&map, &bad_value, &objects).unwrap_err();
        assert!(err.is_type_mismatch());

        let bad_key = Expr::Table(vec![pair(num("1"), num("1"))]);
        let err = check_expression(&map, &bad_key, &objects).unwrap_err();
        assert!(err.to_string().starts_with("map key 0: "));
    }

    #[test]
    fn objects_accept_partial_literals() {
        let objects = registry();
        let literal = Expr::Table(vec![pair(Expr::Variable("x".into()), num("3"))]);
        assert!(check_expression(&DataType::custom("point"), &literal, &objects).is_ok());
        assert!(
            check_expression(&DataType::custom("point"), &Expr::Table(vec![]), &objects).is_ok()
        );
    }

    #[test]
    fn nested_object_fields_are_checked() {
        let objects = registry();
        let literal = Expr::Table(vec![pair(
            Expr::Variable("origin".into()),
            Expr::Table(vec![pair(Expr::Variable("y".into()), string("oops"))]),
        )]);
        let err = check_expression(&DataType::custom("shape"), &literal, &objects).unwrap_err();
        assert!(err.is_type_mismatch());
        assert_eq!(
            err.to_string(),
            "field \"origin\" of shape: field \"y\" of point: invalid type assign: wanted num, got string literal"
        );
    }

    #[test]
    fn object_keys_must_be_known_labels() {
        let objects = registry();
        let unknown = Expr::Table(vec![pair(Expr::Variable("z".into()), num("1"))]);
        assert_eq!(
            check_expression(&DataType::custom("point"), &unknown, &objects).unwrap_err(),
            CompileError::UnknownObjectField {
                object: "point".to_string(),
                field: "z".to_string(),
            }
        );

        let quoted = Expr::Table(vec![pair(string("x"), num("1"))]);
        assert!(matches!(
            check_expression(&DataType::custom("point"), &quoted, &objects).unwrap_err(),
            CompileError::InvalidObjectKey { .. }
        ));
    }

    #[test]
    fn unregistered_custom_type_is_unknown() {
        let err = check_expression(
            &DataType::custom("ghost"),
            &Expr::Table(vec![]),
            &ObjectRegistry::new(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            CompileError::UnknownType {
                name: "ghost".to_string()
            }
        );
    }

    #[test]
    fn structural_object_types_check_their_own_fields() {
        let object = DataType::Object(vec![Field::new("a", DataType::Number)]);
        let literal = Expr::Table(vec![pair(Expr::Variable("a".into()), num("1"))]);
        assert!(check_expression(&object, &literal, &ObjectRegistry::new()).is_ok());
    }

    #[test]
    fn checking_is_repeatable() {
        let objects = registry();
        let literal = Expr::Table(vec![pair(Expr::Variable("w".into()), num("1"))]);
        let first = check_expression(&DataType::custom("point"), &literal, &objects);
        let second = check_expression(&DataType::custom("point"), &literal, &objects);
        assert_eq!(first, second);
        assert!(first.is_err());
    }
}
