//! Binary decoder (§4.3): type-directed read, allocating into an arena.

use crate::arena::{Arena, UnmanagedArena};
use crate::binary::encode::VERSION;
use crate::error::{Error, Result};
use crate::rtti::{Field, Type, TypeRef};
use crate::stream::InStream;
use crate::unmanaged::UnmanagedFactory;
use crate::value::Value;

/// Decode a value previously produced by [`crate::binary::encode::encode`].
///
/// Validates the 3-byte version header first: any `major != 0` or
/// `minor != 1` is rejected with [`Error::UnsupportedVersion`] (code −1)
/// without attempting to decode the body.
pub fn decode(
    source: &mut InStream,
    ty: &TypeRef,
    factory: &dyn UnmanagedFactory,
    arena: &Arena,
    unmanaged_arena: &UnmanagedArena,
) -> Result<Value> {
    let major = source.read_u8()?;
    let minor = source.read_u8()?;
    let patch = source.read_u8()?;
    if major != VERSION.0 || minor != VERSION.1 {
        return Err(Error::UnsupportedVersion(major, minor, patch));
    }
    decode_value(source, ty, factory, arena, unmanaged_arena)
}

/// Decode a value with no version header, mirroring `decode_raw`.
pub fn decode_raw(
    source: &mut InStream,
    ty: &TypeRef,
    factory: &dyn UnmanagedFactory,
    arena: &Arena,
    unmanaged_arena: &UnmanagedArena,
) -> Result<Value> {
    decode_value(source, ty, factory, arena, unmanaged_arena)
}

fn decode_value(
    source: &mut InStream,
    ty: &TypeRef,
    factory: &dyn UnmanagedFactory,
    arena: &Arena,
    unmanaged_arena: &UnmanagedArena,
) -> Result<Value> {
    let ty = ty.unalias();
    match ty.as_ref() {
        Type::Boolean => Ok(Value::Boolean(source.read_u8()? != 0)),
        Type::Int => Ok(Value::Int(source.read_i32()?)),
        Type::Char => Ok(Value::Char(source.read_i32()?)),
        Type::Fixed => Ok(Value::Fixed(source.read_i32()?)),
        Type::String => decode_string(source, arena),
        Type::Blob => decode_blob(source, arena),
        Type::Record { fields, .. } => {
            decode_fields(source, fields, factory, arena, unmanaged_arena).map(Value::Record)
        }
        Type::Tuple { fields } => {
            decode_fields(source, fields, factory, arena, unmanaged_arena).map(Value::Tuple)
        }
        Type::Array { item_type, .. } => {
            decode_sequence(source, item_type, factory, arena, unmanaged_arena, true)
                .map(Value::Array)
        }
        Type::List { item_type, .. } => {
            decode_sequence(source, item_type, factory, arena, unmanaged_arena, false)
                .map(Value::List)
        }
        Type::Custom { variants, name } => {
            let index = source.read_u8()?;
            let variant_desc = variants.iter().find(|v| v.index == index).ok_or_else(|| {
                tracing::warn!(type_name = %name, index, "unknown custom variant index");
                Error::UnknownVariant {
                    type_name: name.clone(),
                    variant: index.to_string(),
                }
            })?;
            let fields =
                decode_fields(source, &variant_desc.fields, factory, arena, unmanaged_arena)?;
            Ok(Value::Custom { variant: index, fields })
        }
        Type::Unmanaged { name } => {
            let handle = unmanaged_arena.alloc_unmanaged(factory, name)?;
            handle.borrow_mut().deserialize(source)?;
            Ok(Value::Unmanaged(handle))
        }
        Type::Function | Type::Any | Type::AnyMatchingTypes | Type::ResourceName => {
            tracing::warn!(kind = ?ty.kind(), "attempted to decode an unserializable type");
            Err(Error::CannotSerialize)
        }
        Type::Alias { .. } => unreachable!("unalias() strips Alias before dispatch"),
    }
}

fn decode_fields(
    source: &mut InStream,
    fields: &[Field],
    factory: &dyn UnmanagedFactory,
    arena: &Arena,
    unmanaged_arena: &UnmanagedArena,
) -> Result<Vec<Value>> {
    fields
        .iter()
        .map(|field| decode_value(source, &field.ty, factory, arena, unmanaged_arena))
        .collect()
}

fn decode_sequence(
    source: &mut InStream,
    item_type: &TypeRef,
    factory: &dyn UnmanagedFactory,
    arena: &Arena,
    unmanaged_arena: &UnmanagedArena,
    is_array: bool,
) -> Result<Vec<Value>> {
    let count = source.read_u8()? as usize;
    let mut items = if is_array {
        arena.alloc_array_prepared(count)
    } else {
        arena.alloc_list_prepared(count)
    };
    for _ in 0..count {
        items.push(decode_value(source, item_type, factory, arena, unmanaged_arena)?);
    }
    Ok(items)
}

fn decode_string(source: &mut InStream, arena: &Arena) -> Result<Value> {
    let length = source.read_u8()? as usize;
    let bytes = source.read_octets(length)?;
    let (chars, _terminator) = bytes.split_at(length.saturating_sub(1));
    Ok(Value::String(arena.alloc_string(chars)))
}

fn decode_blob(source: &mut InStream, arena: &Arena) -> Result<Value> {
    let count = source.read_u32()? as usize;
    let bytes = source.read_octets(count)?;
    Ok(Value::Blob(arena.alloc_blob(bytes)))
}
