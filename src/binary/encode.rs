//! Binary encoder (§4.2): type-directed write into an octet sink.

use crate::error::{Error, Result};
use crate::rtti::{Field, Type, TypeRef};
use crate::stream::OutStream;
use crate::value::Value;

/// Current wire version. Decoders accept any `major=0, minor=1, patch=*`.
pub const VERSION: (u8, u8, u8) = (0, 1, 0);

/// Encode `value` under `ty`, prefixed with the 3-byte version header.
pub fn encode(value: &Value, ty: &TypeRef) -> Result<Vec<u8>> {
    let mut sink = OutStream::new();
    sink.write_u8(VERSION.0);
    sink.write_u8(VERSION.1);
    sink.write_u8(VERSION.2);
    encode_value(&mut sink, value, ty)?;
    Ok(sink.into_bytes())
}

/// Encode `value` under `ty` without the version header.
pub fn encode_raw(value: &Value, ty: &TypeRef) -> Result<Vec<u8>> {
    let mut sink = OutStream::new();
    encode_value(&mut sink, value, ty)?;
    Ok(sink.into_bytes())
}

fn encode_value(sink: &mut OutStream, value: &Value, ty: &TypeRef) -> Result<()> {
    let ty = ty.unalias();
    match ty.as_ref() {
        Type::Boolean => {
            let b = value.as_bool().ok_or(Error::CannotSerialize)?;
            sink.write_u8(b as u8);
            Ok(())
        }
        Type::Int | Type::Char | Type::Fixed => {
            let v = value.as_int().ok_or(Error::CannotSerialize)?;
            sink.write_i32(v);
            Ok(())
        }
        Type::String => encode_string(sink, value),
        Type::Blob => encode_blob(sink, value),
        Type::Record { fields, .. } => {
            let Value::Record(values) = value else {
                return Err(Error::CannotSerialize);
            };
            encode_fields(sink, values, fields)
        }
        Type::Tuple { fields } => {
            let Value::Tuple(values) = value else {
                return Err(Error::CannotSerialize);
            };
            encode_fields(sink, values, fields)
        }
        Type::Array { item_type, .. } => {
            let Value::Array(items) = value else {
                return Err(Error::CannotSerialize);
            };
            encode_sequence(sink, items, item_type, "array")
        }
        Type::List { item_type, .. } => {
            let Value::List(items) = value else {
                return Err(Error::CannotSerialize);
            };
            encode_sequence(sink, items, item_type, "list")
        }
        Type::Custom { variants, name } => {
            let Value::Custom { variant, fields: field_values } = value else {
                return Err(Error::CannotSerialize);
            };
            let variant_desc = variants
                .iter()
                .find(|v| v.index == *variant)
                .ok_or_else(|| Error::UnknownVariant {
                    type_name: name.clone(),
                    variant: variant.to_string(),
                })?;
            sink.write_u8(*variant);
            encode_fields(sink, field_values, &variant_desc.fields)
        }
        Type::Unmanaged { .. } => {
            let Value::Unmanaged(handle) = value else {
                return Err(Error::CannotSerialize);
            };
            handle.borrow().serialize(sink)
        }
        Type::Function | Type::Any | Type::AnyMatchingTypes | Type::ResourceName => {
            tracing::warn!(kind = ?ty.kind(), "attempted to encode an unserializable type");
            Err(Error::CannotSerialize)
        }
        Type::Alias { .. } => unreachable!("unalias() strips Alias before dispatch"),
    }
}

fn encode_fields(sink: &mut OutStream, values: &[Value], fields: &[Field]) -> Result<()> {
    if values.len() != fields.len() {
        return Err(Error::ArityMismatch {
            expected: fields.len(),
            found: values.len(),
        });
    }
    for (value, field) in values.iter().zip(fields) {
        encode_value(sink, value, &field.ty)?;
    }
    Ok(())
}

fn encode_sequence(
    sink: &mut OutStream,
    items: &[Value],
    item_type: &TypeRef,
    kind: &'static str,
) -> Result<()> {
    if items.len() > 255 {
        return Err(Error::LengthOverflow {
            kind,
            len: items.len(),
        });
    }
    sink.write_u8(items.len() as u8);
    for item in items {
        encode_value(sink, item, item_type)?;
    }
    Ok(())
}

fn encode_string(sink: &mut OutStream, value: &Value) -> Result<()> {
    let Value::String(s) = value else {
        return Err(Error::CannotSerialize);
    };
    // character count + 1 (terminator), so max 254 characters.
    if s.len() > 254 {
        return Err(Error::LengthOverflow {
            kind: "string",
            len: s.len(),
        });
    }
    sink.write_u8((s.len() + 1) as u8);
    sink.write_octets(s.as_bytes());
    sink.write_u8(0);
    Ok(())
}

fn encode_blob(sink: &mut OutStream, value: &Value) -> Result<()> {
    let Value::Blob(bytes) = value else {
        return Err(Error::CannotSerialize);
    };
    sink.write_u32(bytes.len() as u32);
    sink.write_octets(bytes);
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;

    #[test]
    fn int_42_matches_literal_wire_bytes() {
        let bytes = encode(&Value::Int(42), &Type::int()).unwrap();
        assert_eq!(bytes, [0x00, 0x01, 0x00, 0x2A, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn string_over_254_chars_is_rejected() {
        let s: String = "a".repeat(255);
        let value = Value::String(Rc::from(s.as_str()));
        let err = encode(&value, &Type::string()).unwrap_err();
        assert!(matches!(err, Error::LengthOverflow { kind: "string", .. }));
    }

    #[test]
    fn sequence_over_255_items_is_rejected() {
        let ty: TypeRef = Rc::new(Type::List { item_type: Type::int(), item_size: 4, item_align: 4 });
        let items = vec![Value::Int(0); 256];
        let err = encode(&Value::List(items), &ty).unwrap_err();
        assert!(matches!(err, Error::LengthOverflow { kind: "list", .. }));
    }

    #[test]
    fn function_type_cannot_be_serialized() {
        let err = encode(&Value::Boolean(true), &Rc::new(Type::Function)).unwrap_err();
        assert!(matches!(err, Error::CannotSerialize));
    }
}
