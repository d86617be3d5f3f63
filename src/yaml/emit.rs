//! YAML emitter (§4.5): block-style output keyed by record field names.
//!
//! Tuples are not part of the YAML surface — §4.6's per-kind parsing table
//! has no entry for them either, so the round trip simply does not cover
//! tuples (see DESIGN.md).

use std::fmt::Write as _;

use crate::error::{Error, Result};
use crate::rtti::{Field, Type, TypeRef};
use crate::value::Value;

const BLOB_ASCII_WRAP: usize = 64;
const BLOB_HEX_WRAP: usize = 32;

/// Emit `value` under `ty`, with the `%YAML 1.2` prologue.
pub fn emit(value: &Value, ty: &TypeRef) -> Result<String> {
    let mut out = String::new();
    out.push_str("%YAML 1.2\n---\n");
    let unaliased = ty.unalias();
    match unaliased.as_ref() {
        Type::Record { fields, .. } => {
            let Value::Record(values) = value else {
                return Err(Error::CannotSerialize);
            };
            emit_record_fields(&mut out, fields, values, 0, false)?;
        }
        _ => {
            emit_inline(&mut out, value, unaliased)?;
            out.push('\n');
        }
    }
    Ok(out)
}

fn write_indent(out: &mut String, indent: usize) {
    for _ in 0..indent {
        out.push_str("  ");
    }
}

fn emit_record_fields(
    out: &mut String,
    fields: &[Field],
    values: &[Value],
    indent: usize,
    skip_first_indent: bool,
) -> Result<()> {
    if fields.len() != values.len() {
        return Err(Error::ArityMismatch {
            expected: fields.len(),
            found: values.len(),
        });
    }
    for (i, (field, value)) in fields.iter().zip(values).enumerate() {
        if !(skip_first_indent && i == 0) {
            write_indent(out, indent);
        }
        out.push_str(&field.name);
        out.push(':');
        emit_field_value(out, value, field.ty.unalias(), indent)?;
        out.push('\n');
    }
    Ok(())
}

fn emit_field_value(out: &mut String, value: &Value, ty: &TypeRef, indent: usize) -> Result<()> {
    match ty.as_ref() {
        Type::Record { fields, .. } => {
            let Value::Record(values) = value else {
                return Err(Error::CannotSerialize);
            };
            out.push('\n');
            emit_record_fields(out, fields, values, indent + 1, false)
        }
        Type::Array { item_type, .. } => {
            let Value::Array(items) = value else {
                return Err(Error::CannotSerialize);
            };
            out.push('\n');
            emit_sequence_items(out, items, item_type, indent + 1)
        }
        Type::List { item_type, .. } => {
            let Value::List(items) = value else {
                return Err(Error::CannotSerialize);
            };
            out.push('\n');
            emit_sequence_items(out, items, item_type, indent + 1)
        }
        Type::Blob => {
            let Value::Blob(bytes) = value else {
                return Err(Error::CannotSerialize);
            };
            out.push(' ');
            emit_blob(out, bytes, indent + 1)
        }
        Type::Tuple { .. } | Type::Function | Type::Unmanaged { .. } | Type::Any
        | Type::AnyMatchingTypes | Type::ResourceName => Err(Error::CannotSerialize),
        _ => {
            out.push(' ');
            emit_inline(out, value, ty)
        }
    }
}

fn emit_sequence_items(
    out: &mut String,
    items: &[Value],
    item_type: &TypeRef,
    indent: usize,
) -> Result<()> {
    let item_ty = item_type.unalias();
    for item in items {
        write_indent(out, indent);
        out.push_str("- ");
        match item_ty.as_ref() {
            Type::Record { fields, .. } => {
                let Value::Record(values) = item else {
                    return Err(Error::CannotSerialize);
                };
                emit_record_fields(out, fields, values, indent + 1, true)?;
            }
            Type::Array { item_type: inner, .. } => {
                let Value::Array(inner_items) = item else {
                    return Err(Error::CannotSerialize);
                };
                out.push('\n');
                emit_sequence_items(out, inner_items, inner, indent + 1)?;
            }
            Type::List { item_type: inner, .. } => {
                let Value::List(inner_items) = item else {
                    return Err(Error::CannotSerialize);
                };
                out.push('\n');
                emit_sequence_items(out, inner_items, inner, indent + 1)?;
            }
            Type::Blob => {
                let Value::Blob(bytes) = item else {
                    return Err(Error::CannotSerialize);
                };
                emit_blob(out, bytes, indent + 1)?;
            }
            _ => {
                emit_inline(out, item, item_ty)?;
                out.push('\n');
            }
        }
    }
    Ok(())
}

fn emit_inline(out: &mut String, value: &Value, ty: &TypeRef) -> Result<()> {
    match ty.as_ref() {
        Type::Boolean => {
            let b = value.as_bool().ok_or(Error::CannotSerialize)?;
            out.push_str(if b { "true" } else { "false" });
            Ok(())
        }
        Type::Int | Type::Char => {
            let v = value.as_int().ok_or(Error::CannotSerialize)?;
            let _ = write!(out, "{v}");
            Ok(())
        }
        Type::String => {
            let Value::String(s) = value else {
                return Err(Error::CannotSerialize);
            };
            out.push_str(s);
            Ok(())
        }
        Type::Custom { name, variants } => {
            let Value::Custom { variant, fields } = value else {
                return Err(Error::CannotSerialize);
            };
            let variant_desc = variants
                .iter()
                .find(|v| v.index == *variant)
                .ok_or_else(|| Error::UnknownVariant {
                    type_name: name.clone(),
                    variant: variant.to_string(),
                })?;
            if variant_desc.fields.len() != fields.len() {
                return Err(Error::ArityMismatch {
                    expected: variant_desc.fields.len(),
                    found: fields.len(),
                });
            }
            out.push_str(&variant_desc.name);
            for (field, field_value) in variant_desc.fields.iter().zip(fields) {
                out.push(' ');
                emit_inline(out, field_value, field.ty.unalias())?;
            }
            Ok(())
        }
        _ => Err(Error::CannotSerialize),
    }
}

fn emit_blob(out: &mut String, bytes: &[u8], indent: usize) -> Result<()> {
    let use_ascii = !bytes.is_empty() && bytes.iter().all(|&b| (32..=126).contains(&b));
    if use_ascii {
        out.push_str(">\n");
        for chunk in bytes.chunks(BLOB_ASCII_WRAP) {
            write_indent(out, indent);
            out.push_str(&String::from_utf8_lossy(chunk));
            out.push('\n');
        }
    } else {
        out.push_str(">@\n");
        for chunk in bytes.chunks(BLOB_HEX_WRAP) {
            write_indent(out, indent);
            for b in chunk {
                let _ = write!(out, "{b:02X} ");
            }
            out.push('\n');
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boolean_document_has_prologue_and_literal() {
        let out = emit(&Value::Boolean(true), &Type::boolean()).unwrap();
        assert_eq!(out, "%YAML 1.2\n---\ntrue\n");
    }

    #[test]
    fn record_fields_emit_in_declared_order() {
        let fields = xy_fields();
        let ty: TypeRef = std::rc::Rc::new(Type::Record { name: None, fields });
        let value = Value::Record(vec![Value::Int(10), Value::Int(120)]);
        let out = emit(&value, &ty).unwrap();
        assert_eq!(out, "%YAML 1.2\n---\nx: 10\ny: 120\n");
    }

    #[test]
    fn tuple_is_unsupported_on_the_yaml_surface() {
        let fields = xy_fields();
        let ty: TypeRef = std::rc::Rc::new(Type::Tuple { fields });
        let err = emit(&Value::Tuple(vec![Value::Int(1), Value::Int(2)]), &ty).unwrap_err();
        assert!(matches!(err, Error::CannotSerialize));
    }

    #[test]
    fn custom_variant_arity_mismatch_is_rejected() {
        let just_fields = crate::rtti::FieldLayout::default().push("0", Type::int(), 4, 4).finish();
        let ty: TypeRef = std::rc::Rc::new(Type::Custom {
            name: "Maybe".to_string(),
            variants: vec![crate::rtti::Variant { index: 1, name: "Just".to_string(), fields: just_fields }],
        });
        let value = Value::Custom { variant: 1, fields: vec![] };
        let err = emit(&value, &ty).unwrap_err();
        assert!(matches!(err, Error::ArityMismatch { expected: 1, found: 0 }));
    }

    fn xy_fields() -> Vec<Field> {
        crate::rtti::FieldLayout::default()
            .push("x", Type::int(), 4, 4)
            .push("y", Type::int(), 4, 4)
            .finish()
    }
}
