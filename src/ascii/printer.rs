//! ASCII pretty-printer (§4.4). One engine drives both the colored and
//! no-color variants; `colored` just toggles whether SGR escapes are
//! written before each token.

use std::fmt::Write as _;

use crate::ascii::flags::PrintFlags;
use crate::error::{Error, Result};
use crate::rtti::{Field, Type, TypeRef};
use crate::value::Value;

const MIN_BUFFER: usize = 64;
const BLOB_SHOW_MAX: usize = 2048;

const COLOR_FIELD_NAME: u32 = 92;
const COLOR_PUNCTUATION: u32 = 94;
const COLOR_VARIANT_PUNCTUATION: u32 = 35;
const COLOR_STRING: u32 = 91;
const COLOR_STRING_TEXT: u32 = 33;
const COLOR_INT: u32 = 91;
const COLOR_BOOL: u32 = 92;
const COLOR_VARIANT_NAME: u32 = 95;

/// Render `value` under `ty` as colored ASCII, terminated by `ESC[0m\0`.
pub fn print_colored(value: &Value, ty: &TypeRef, flags: PrintFlags) -> Result<String> {
    render(value, ty, flags, true)
}

/// Render `value` under `ty` as plain ASCII (no escapes), still NUL terminated.
pub fn print_plain(value: &Value, ty: &TypeRef, flags: PrintFlags) -> Result<String> {
    render(value, ty, flags, false)
}

/// Render into a caller-owned buffer of at least 64 bytes, mirroring the
/// source's fixed-buffer contract. Returns the number of bytes written,
/// excluding the trailing NUL.
pub fn print_into(buf: &mut [u8], value: &Value, ty: &TypeRef, flags: PrintFlags, colored: bool) -> Result<usize> {
    if buf.len() < MIN_BUFFER {
        return Err(Error::BufferTooSmall { needed: MIN_BUFFER });
    }
    let rendered = render(value, ty, flags, colored)?;
    let needed = rendered.len() + 1;
    if needed > buf.len() {
        return Err(Error::BufferTooSmall { needed });
    }
    buf[..rendered.len()].copy_from_slice(rendered.as_bytes());
    buf[rendered.len()] = 0;
    Ok(rendered.len())
}

fn render(value: &Value, ty: &TypeRef, flags: PrintFlags, colored: bool) -> Result<String> {
    let mut out = String::new();
    // `NoStringQuotesOnce`: the no-color printer renders a bare top-level
    // string without quotes; this never applies once we have descended into
    // a compound value.
    let top_flags = if !colored && matches!(ty.unalias().as_ref(), Type::String) {
        flags.with(PrintFlags::NO_STRING_QUOTES_ONCE)
    } else {
        flags
    };
    print_value(&mut out, value, ty, top_flags, colored, 0)?;
    if colored {
        out.push_str("\u{1b}[0m");
    }
    Ok(out)
}

fn token(out: &mut String, colored: bool, code: u32, text: &str) {
    if colored {
        let _ = write!(out, "\u{1b}[{code}m");
    }
    out.push_str(text);
}

fn print_value(
    out: &mut String,
    value: &Value,
    ty: &TypeRef,
    flags: PrintFlags,
    colored: bool,
    indentation: usize,
) -> Result<()> {
    match ty.as_ref() {
        Type::Alias { name, target } => {
            let show_prefix = flags.has(PrintFlags::ALIAS) || flags.has(PrintFlags::ALIAS_ONCE);
            if show_prefix {
                token(out, colored, COLOR_VARIANT_NAME, name);
                token(out, colored, COLOR_PUNCTUATION, " => ");
            }
            let next_flags = flags.without(PrintFlags::ALIAS_ONCE);
            print_value(out, value, target, next_flags, colored, indentation)
        }
        Type::Boolean => {
            let b = value.as_bool().ok_or(Error::CannotSerialize)?;
            token(out, colored, COLOR_BOOL, if b { "True" } else { "False" });
            Ok(())
        }
        Type::Int => {
            let v = value.as_int().ok_or(Error::CannotSerialize)?;
            token(out, colored, COLOR_INT, &v.to_string());
            Ok(())
        }
        Type::Char => {
            let v = value.as_int().ok_or(Error::CannotSerialize)?;
            let ch = char::from_u32(v as u32).unwrap_or('\u{FFFD}');
            token(out, colored, COLOR_STRING_TEXT, &format!("'{ch}'"));
            Ok(())
        }
        Type::Fixed => {
            let v = value.as_int().ok_or(Error::CannotSerialize)?;
            token(out, colored, COLOR_INT, &format!("{:.3}", v as f64 / 1000.0));
            Ok(())
        }
        Type::String => {
            let Value::String(s) = value else {
                return Err(Error::CannotSerialize);
            };
            if flags.has(PrintFlags::NO_STRING_QUOTES_ONCE) {
                token(out, colored, COLOR_STRING_TEXT, s);
            } else {
                token(out, colored, COLOR_STRING, "\"");
                token(out, colored, COLOR_STRING_TEXT, s);
                token(out, colored, COLOR_STRING, "\"");
            }
            Ok(())
        }
        Type::Blob => {
            let Value::Blob(bytes) = value else {
                return Err(Error::CannotSerialize);
            };
            print_blob(out, bytes, flags, colored, indentation);
            Ok(())
        }
        Type::Record { fields, .. } => {
            let Value::Record(values) = value else {
                return Err(Error::CannotSerialize);
            };
            print_record(out, fields, values, flags, colored, indentation)
        }
        Type::Tuple { fields } => {
            let Value::Tuple(values) = value else {
                return Err(Error::CannotSerialize);
            };
            if fields.len() != values.len() {
                return Err(Error::ArityMismatch {
                    expected: fields.len(),
                    found: values.len(),
                });
            }
            token(out, colored, COLOR_PUNCTUATION, "( ");
            for (i, (field, v)) in fields.iter().zip(values).enumerate() {
                if i > 0 {
                    out.push('\n');
                    out.push_str(&" ".repeat(4 * indentation));
                    token(out, colored, COLOR_PUNCTUATION, ", ");
                }
                let field_flags = flags.with(PrintFlags::ALIAS_ONCE);
                print_value(out, v, &field.ty, field_flags, colored, indentation + 1)?;
            }
            token(out, colored, COLOR_PUNCTUATION, " )");
            Ok(())
        }
        Type::Array { item_type, .. } => {
            let Value::Array(items) = value else {
                return Err(Error::CannotSerialize);
            };
            print_sequence(out, items, item_type, flags, colored, indentation, "[|", "|]")
        }
        Type::List { item_type, .. } => {
            let Value::List(items) = value else {
                return Err(Error::CannotSerialize);
            };
            print_sequence(out, items, item_type, flags, colored, indentation, "[", "]")
        }
        Type::Custom { name, variants } => {
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
            if variant_desc.fields.len() != field_values.len() {
                return Err(Error::ArityMismatch {
                    expected: variant_desc.fields.len(),
                    found: field_values.len(),
                });
            }
            if flags.has(PrintFlags::CUSTOM_TYPE_VARIANT_PREFIX) {
                token(out, colored, COLOR_VARIANT_PUNCTUATION, name);
                token(out, colored, COLOR_VARIANT_PUNCTUATION, ":");
            }
            token(out, colored, COLOR_VARIANT_NAME, &variant_desc.name);
            for (field, v) in variant_desc.fields.iter().zip(field_values) {
                out.push(' ');
                print_value(out, v, &field.ty, flags, colored, indentation + 1)?;
            }
            Ok(())
        }
        Type::Unmanaged { .. } => {
            let Value::Unmanaged(handle) = value else {
                return Err(Error::CannotSerialize);
            };
            out.push_str(&handle.borrow().to_ascii());
            Ok(())
        }
        Type::Any => {
            out.push_str("ANY");
            Ok(())
        }
        Type::AnyMatchingTypes => {
            out.push('*');
            Ok(())
        }
        Type::ResourceName => {
            out.push('@');
            Ok(())
        }
        Type::Function => {
            tracing::warn!("attempted to print a function value");
            Err(Error::CannotSerialize)
        }
    }
}

fn print_record(
    out: &mut String,
    fields: &[Field],
    values: &[Value],
    flags: PrintFlags,
    colored: bool,
    indentation: usize,
) -> Result<()> {
    if fields.len() != values.len() {
        return Err(Error::ArityMismatch {
            expected: fields.len(),
            found: values.len(),
        });
    }
    token(out, colored, COLOR_PUNCTUATION, "{ ");
    for (i, (field, value)) in fields.iter().zip(values).enumerate() {
        token(out, colored, COLOR_FIELD_NAME, &field.name);
        token(out, colored, COLOR_PUNCTUATION, " = ");
        print_value(out, value, &field.ty, flags, colored, indentation + 1)?;

        if i + 1 < fields.len() {
            let next_is_nonsimple = !fields[i + 1].ty.unalias().kind().is_simple();
            if next_is_nonsimple {
                out.push('\n');
                out.push_str(&" ".repeat(4 * indentation));
            }
            token(out, colored, COLOR_PUNCTUATION, ", ");
        }
    }
    token(out, colored, COLOR_PUNCTUATION, " }");
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn print_sequence(
    out: &mut String,
    items: &[Value],
    item_type: &TypeRef,
    flags: PrintFlags,
    colored: bool,
    indentation: usize,
    open: &str,
    close: &str,
) -> Result<()> {
    token(out, colored, COLOR_PUNCTUATION, open);
    let multiline = items.len() > 1;
    for (i, item) in items.iter().enumerate() {
        if multiline {
            out.push('\n');
            out.push_str(&" ".repeat(4 * indentation));
        } else if i == 0 {
            out.push(' ');
        }
        print_value(out, item, item_type, flags, colored, indentation + 1)?;
        if i + 1 < items.len() {
            token(out, colored, COLOR_PUNCTUATION, ",");
            if !multiline {
                out.push(' ');
            }
        }
    }
    out.push(' ');
    token(out, colored, COLOR_PUNCTUATION, close);
    Ok(())
}

fn print_blob(out: &mut String, bytes: &[u8], flags: PrintFlags, colored: bool, indentation: usize) {
    let _ = write!(out, "blob {}", bytes.len());
    if !flags.has(PrintFlags::BLOB_EXPANDED) {
        return;
    }
    let shown = &bytes[..bytes.len().min(BLOB_SHOW_MAX)];
    let use_ascii = if flags.has(PrintFlags::BLOB_AUTO_FORMAT) {
        shown.iter().all(|&b| (32..=126).contains(&b))
    } else {
        flags.has(PrintFlags::BLOB_ASCII)
    };
    let indent = "..".repeat(indentation + 1);
    out.push('\n');
    if use_ascii {
        for chunk in shown.chunks(64) {
            out.push_str(&indent);
            out.push_str(&String::from_utf8_lossy(chunk));
            out.push('\n');
        }
    } else {
        let _ = colored; // hex digits are not colorized distinctly from the rest
        for chunk in shown.chunks(32) {
            out.push_str(&indent);
            for b in chunk {
                let _ = write!(out, "{b:02X} ");
            }
            out.push('\n');
        }
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;

    #[test]
    fn plain_int_has_no_escapes() {
        let out = print_plain(&Value::Int(42), &Type::int(), PrintFlags::new()).unwrap();
        assert_eq!(out, "42");
    }

    #[test]
    fn colored_int_is_wrapped_in_sgr_and_reset() {
        let out = print_colored(&Value::Int(42), &Type::int(), PrintFlags::new()).unwrap();
        assert!(out.starts_with("\u{1b}[91m42"));
        assert!(out.ends_with("\u{1b}[0m"));
    }

    #[test]
    fn plain_top_level_string_has_no_quotes() {
        let value = Value::String(Rc::from("hello"));
        let out = print_plain(&value, &Type::string(), PrintFlags::new()).unwrap();
        assert_eq!(out, "hello");
    }

    #[test]
    fn colored_string_keeps_quotes() {
        let value = Value::String(Rc::from("hello"));
        let out = print_colored(&value, &Type::string(), PrintFlags::new()).unwrap();
        assert!(out.contains('"'));
    }

    #[test]
    fn nested_string_field_keeps_quotes_even_in_plain_mode() {
        let fields = crate::rtti::FieldLayout::default()
            .push("name", Type::string(), 8, 8)
            .finish();
        let ty: TypeRef = Rc::new(Type::Record { name: None, fields });
        let value = Value::Record(vec![Value::String(Rc::from("hello"))]);
        let out = print_plain(&value, &ty, PrintFlags::new()).unwrap();
        assert!(out.contains("\"hello\""));
    }

    #[test]
    fn print_into_rejects_undersized_buffer() {
        let mut buf = [0u8; 8];
        let err = print_into(&mut buf, &Value::Int(1), &Type::int(), PrintFlags::new(), false).unwrap_err();
        assert!(matches!(err, Error::BufferTooSmall { needed: 64 }));
    }

    #[test]
    fn print_into_writes_nul_terminated_text() {
        let mut buf = [0u8; 64];
        let n = print_into(&mut buf, &Value::Int(7), &Type::int(), PrintFlags::new(), false).unwrap();
        assert_eq!(&buf[..n], b"7");
        assert_eq!(buf[n], 0);
    }

    #[test]
    fn fixed_renders_with_three_decimals() {
        let out = print_plain(&Value::Fixed(1500), &Type::fixed(), PrintFlags::new()).unwrap();
        assert_eq!(out, "1.500");
    }

    #[test]
    fn boolean_literals_are_capitalized() {
        assert_eq!(print_plain(&Value::Boolean(true), &Type::boolean(), PrintFlags::new()).unwrap(), "True");
        assert_eq!(print_plain(&Value::Boolean(false), &Type::boolean(), PrintFlags::new()).unwrap(), "False");
    }

    #[test]
    fn multiline_list_breaks_at_current_indentation_and_closes_inline() {
        let ty: TypeRef = Rc::new(Type::List { item_type: Type::int(), item_size: 4, item_align: 4 });
        let value = Value::List(vec![Value::Int(1), Value::Int(2)]);
        let out = print_plain(&value, &ty, PrintFlags::new()).unwrap();
        assert_eq!(out, "[\n1,\n2 ]");
    }

    #[test]
    fn multiline_tuple_breaks_like_a_sequence_and_marks_fields_alias_once() {
        let fields = crate::rtti::FieldLayout::default()
            .push("0", Type::int(), 4, 4)
            .push("1", Type::int(), 4, 4)
            .finish();
        let ty: TypeRef = Rc::new(Type::Tuple { fields });
        let value = Value::Tuple(vec![Value::Int(1), Value::Int(2)]);
        let out = print_plain(&value, &ty, PrintFlags::new()).unwrap();
        assert_eq!(out, "( 1\n, 2 )");
    }

    #[test]
    fn tuple_arity_mismatch_is_rejected() {
        let fields = crate::rtti::FieldLayout::default()
            .push("0", Type::int(), 4, 4)
            .push("1", Type::int(), 4, 4)
            .finish();
        let ty: TypeRef = Rc::new(Type::Tuple { fields });
        let value = Value::Tuple(vec![Value::Int(1)]);
        let err = print_plain(&value, &ty, PrintFlags::new()).unwrap_err();
        assert!(matches!(err, Error::ArityMismatch { expected: 2, found: 1 }));
    }

    #[test]
    fn custom_variant_arity_mismatch_is_rejected() {
        let just_fields = crate::rtti::FieldLayout::default().push("0", Type::int(), 4, 4).finish();
        let ty: TypeRef = Rc::new(Type::Custom {
            name: "Maybe".to_string(),
            variants: vec![crate::rtti::Variant { index: 1, name: "Just".to_string(), fields: just_fields }],
        });
        let value = Value::Custom { variant: 1, fields: vec![] };
        let err = print_plain(&value, &ty, PrintFlags::new()).unwrap_err();
        assert!(matches!(err, Error::ArityMismatch { expected: 1, found: 0 }));
    }
}
