//! YAML parser (§4.6): a hand-written recursive-descent parser driven by
//! the type tree. YAML syntax itself carries no type information beyond
//! indentation and list markers; every decision about what to read at a
//! given position comes from the RTTI node being visited.
//!
//! Indentation unit is two columns. `Fixed` and `Tuple` have no entry in
//! this format's per-kind table and are not supported here either (see
//! DESIGN.md).

use crate::arena::Arena;
use crate::error::{Error, Result};
use crate::rtti::{Field, Type, TypeRef};
use crate::stream::TextInStream;
use crate::value::Value;

const SEQUENCE_SCRATCH_CAP: usize = 256;

/// Parse `text` as a value of `ty`, allocating dynamic values into `arena`.
pub fn parse(text: &str, ty: &TypeRef, arena: &Arena) -> Result<Value> {
    let mut ts = TextInStream::new(text);
    skip_header(&mut ts)?;
    let unaliased = ty.unalias();
    match unaliased.as_ref() {
        Type::Record { fields, .. } => {
            let values = parse_record_fields(&mut ts, fields, 0, arena, false)?;
            Ok(Value::Record(values))
        }
        _ => parse_typed(&mut ts, unaliased, 0, arena),
    }
}

fn skip_header(ts: &mut TextInStream) -> Result<()> {
    if ts.peek_ch() != Some(b'%') {
        return Ok(());
    }
    let line = read_string_until_end_of_line(ts);
    if line.trim_end() != "%YAML 1.2" {
        return Err(Error::YamlFormat(format!("unexpected header line '{line}'")));
    }
    let doc_marker = read_string_until_end_of_line(ts);
    if doc_marker.trim_end() != "---" {
        return Err(Error::YamlFormat(format!(
            "expected '---' after YAML header, found '{doc_marker}'"
        )));
    }
    Ok(())
}

fn skip_spaces(ts: &mut TextInStream) {
    while matches!(ts.peek_ch(), Some(b' ')) {
        ts.read_ch();
    }
}

fn detect_indentation(ts: &mut TextInStream) -> Result<usize> {
    loop {
        let mut spaces = 0usize;
        while matches!(ts.peek_ch(), Some(b' ')) {
            ts.read_ch();
            spaces += 1;
        }
        match ts.peek_ch() {
            None => return Err(Error::UnexpectedEof),
            Some(b'\n') | Some(b'\r') => {
                ts.read_ch();
                continue;
            }
            _ => {
                if spaces % 2 != 0 {
                    return Err(Error::YamlFormat(format!(
                        "odd indentation ({spaces} spaces) at {}",
                        ts.position_string()
                    )));
                }
                return Ok(spaces / 2);
            }
        }
    }
}

fn require_indentation(ts: &mut TextInStream, n: usize) -> Result<()> {
    let got = detect_indentation(ts)?;
    if got != n {
        return Err(Error::YamlFormat(format!(
            "expected indentation {n}, found {got} at {}",
            ts.position_string()
        )));
    }
    Ok(())
}

fn read_variable_identifier(ts: &mut TextInStream) -> Result<String> {
    let mut ident = String::new();
    match ts.read_ch() {
        Some(c) if (c as char).is_ascii_alphabetic() => ident.push(c as char),
        _ => return Err(Error::YamlFormat("expected an identifier".to_string())),
    }
    while let Some(c) = ts.peek_ch() {
        if (c as char).is_ascii_alphanumeric() {
            ts.read_ch();
            ident.push(c as char);
        } else {
            break;
        }
    }
    Ok(ident)
}

fn read_string_until_end_of_line(ts: &mut TextInStream) -> String {
    let mut s = String::new();
    loop {
        match ts.peek_ch() {
            None => break,
            Some(b'\n') => {
                ts.read_ch();
                break;
            }
            Some(b'\r') => {
                ts.read_ch();
            }
            Some(c) => {
                ts.read_ch();
                s.push(c as char);
            }
        }
    }
    s
}

fn read_integer_value(ts: &mut TextInStream) -> Result<i32> {
    skip_spaces(ts);
    let line = read_string_until_end_of_line(ts);
    line.trim()
        .parse::<i32>()
        .map_err(|_| Error::YamlFormat(format!("invalid integer literal '{line}'")))
}

fn read_boolean(ts: &mut TextInStream) -> Result<bool> {
    skip_spaces(ts);
    let line = read_string_until_end_of_line(ts);
    match line.trim() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(Error::ExpectedBooleanOrEol),
    }
}

fn read_string_value(ts: &mut TextInStream) -> String {
    skip_spaces(ts);
    read_string_until_end_of_line(ts)
}

/// Peek whether a `- ` list item continues at indentation `n`, restoring
/// position either way.
fn check_list_continuation(ts: &mut TextInStream, n: usize) -> bool {
    let saved_pos = ts.tell();
    let saved_column = ts.column;
    let is_continuation = (|| -> bool {
        let indent = match detect_indentation(ts) {
            Ok(i) => i,
            Err(_) => return false,
        };
        if indent != n {
            return false;
        }
        if ts.peek_ch() != Some(b'-') {
            return false;
        }
        ts.read_ch();
        ts.peek_ch() == Some(b' ')
    })();
    ts.seek(saved_pos);
    ts.column = saved_column;
    is_continuation
}

/// `Record` field loop (§4.6): each field is read in declared order; the
/// identifier must match the field's name exactly. `skip_first_indentation`
/// is set when the caller already positioned the cursor mid-line (right
/// after a `- ` list marker), so the first field reads inline instead of
/// requiring its own indented line.
fn parse_record_fields(
    ts: &mut TextInStream,
    fields: &[Field],
    indent: usize,
    arena: &Arena,
    skip_first_indentation: bool,
) -> Result<Vec<Value>> {
    let mut values = Vec::with_capacity(fields.len());
    for (i, field) in fields.iter().enumerate() {
        if !(skip_first_indentation && i == 0) {
            require_indentation(ts, indent)?;
        }
        let name = read_variable_identifier(ts)?;
        if name != field.name {
            return Err(Error::FieldNameMismatch {
                expected: field.name.clone(),
                found: name,
            });
        }
        if ts.read_ch() != Some(b':') {
            return Err(Error::MissingColon(name));
        }
        values.push(parse_field_value(ts, field.ty.unalias(), indent, arena)?);
    }
    Ok(values)
}

/// Parse the value following a `name:` marker. `Record`/`List`/`Array`
/// start their content on the next line at `indent + 1`; `Blob` reads its
/// chomp marker inline and its body at `indent + 1`; everything else is
/// inline scalar content at the current indentation.
fn parse_field_value(ts: &mut TextInStream, ty: &TypeRef, indent: usize, arena: &Arena) -> Result<Value> {
    match ty.as_ref() {
        // `Array` parses its items at `indent`, not `indent + 1`: `parse_sequence`
        // already pre-increments once internally for arrays, so bumping here too
        // would double-indent array items relative to what the emitter writes.
        Type::Record { .. } | Type::List { .. } => {
            read_string_until_end_of_line(ts);
            parse_typed(ts, ty, indent + 1, arena)
        }
        Type::Array { .. } => {
            read_string_until_end_of_line(ts);
            parse_typed(ts, ty, indent, arena)
        }
        Type::Blob => parse_typed(ts, ty, indent + 1, arena),
        _ => parse_typed(ts, ty, indent, arena),
    }
}

/// Dispatch on `ty.kind()` at the current position.
fn parse_typed(ts: &mut TextInStream, ty: &TypeRef, indent: usize, arena: &Arena) -> Result<Value> {
    let ty = ty.unalias();
    match ty.as_ref() {
        Type::Int => Ok(Value::Int(read_integer_value(ts)?)),
        Type::Char => Ok(Value::Char(read_integer_value(ts)?)),
        Type::Boolean => Ok(Value::Boolean(read_boolean(ts)?)),
        Type::String => Ok(Value::String(arena.alloc_string(read_string_value(ts).as_bytes()))),
        Type::Record { fields, .. } => {
            let values = parse_record_fields(ts, fields, indent, arena, false)?;
            Ok(Value::Record(values))
        }
        Type::Array { item_type, .. } => {
            parse_sequence(ts, item_type, indent, arena, true).map(Value::Array)
        }
        Type::List { item_type, .. } => {
            parse_sequence(ts, item_type, indent, arena, false).map(Value::List)
        }
        Type::Custom { name, variants } => {
            skip_spaces(ts);
            let variant_name = read_variable_identifier(ts)?;
            let variant_desc = variants
                .iter()
                .find(|v| v.name == variant_name)
                .ok_or_else(|| Error::UnknownVariant {
                    type_name: name.clone(),
                    variant: variant_name.clone(),
                })?;
            let mut fields = Vec::with_capacity(variant_desc.fields.len());
            for field in &variant_desc.fields {
                skip_spaces(ts);
                fields.push(parse_typed(ts, field.ty.unalias(), indent, arena)?);
            }
            Ok(Value::Custom { variant: variant_desc.index, fields })
        }
        Type::Blob => parse_blob(ts, indent, arena),
        Type::Fixed
        | Type::Function
        | Type::Unmanaged { .. }
        | Type::ResourceName
        | Type::Any
        | Type::AnyMatchingTypes
        | Type::Tuple { .. } => {
            tracing::warn!(kind = ?ty.kind(), "attempted to parse an unsupported YAML type");
            Err(Error::CannotSerialize)
        }
        Type::Alias { .. } => unreachable!("unalias() strips Alias before dispatch"),
    }
}

/// `Array`/`List` (§4.6): `Array` pre-increments indentation on entry,
/// `List` does not — both then loop on `checkListContinuation`.
fn parse_sequence(
    ts: &mut TextInStream,
    item_type: &TypeRef,
    indent: usize,
    arena: &Arena,
    is_array: bool,
) -> Result<Vec<Value>> {
    let item_indent = if is_array { indent + 1 } else { indent };
    let mut items = if is_array {
        arena.alloc_array_prepared(SEQUENCE_SCRATCH_CAP)
    } else {
        arena.alloc_list_prepared(SEQUENCE_SCRATCH_CAP)
    };
    while check_list_continuation(ts, item_indent) {
        require_indentation(ts, item_indent)?;
        if ts.read_ch() != Some(b'-') || ts.read_ch() != Some(b' ') {
            return Err(Error::YamlFormat("expected '- ' list marker".to_string()));
        }
        items.push(parse_sequence_item(ts, item_type, item_indent, arena)?);
    }
    Ok(items)
}

/// Parse one list item's value, already positioned right after `- `.
fn parse_sequence_item(
    ts: &mut TextInStream,
    item_type: &TypeRef,
    item_indent: usize,
    arena: &Arena,
) -> Result<Value> {
    let ty = item_type.unalias();
    match ty.as_ref() {
        Type::Record { fields, .. } => {
            let values = parse_record_fields(ts, fields, item_indent + 1, arena, true)?;
            Ok(Value::Record(values))
        }
        Type::List { .. } => {
            read_string_until_end_of_line(ts);
            parse_typed(ts, ty, item_indent + 1, arena)
        }
        Type::Array { .. } => {
            read_string_until_end_of_line(ts);
            parse_typed(ts, ty, item_indent, arena)
        }
        Type::Blob => parse_typed(ts, ty, item_indent + 1, arena),
        _ => parse_typed(ts, ty, item_indent, arena),
    }
}

/// `Blob` (§4.6): read full lines at the current indentation into a
/// scratch buffer until the indentation changes, then allocate the blob
/// from the accumulated bytes.
fn parse_blob(ts: &mut TextInStream, indent: usize, arena: &Arena) -> Result<Value> {
    skip_spaces(ts);
    let marker = read_string_until_end_of_line(ts);
    let is_hex = match marker.trim_end() {
        ">" => false,
        ">@" => true,
        other => {
            return Err(Error::YamlFormat(format!(
                "expected blob marker '>' or '>@', found '{other}'"
            )));
        }
    };
    let mut scratch = Vec::new();
    loop {
        let saved_pos = ts.tell();
        let saved_column = ts.column;
        let indent_here = match detect_indentation(ts) {
            Ok(i) => i,
            Err(_) => {
                ts.seek(saved_pos);
                ts.column = saved_column;
                break;
            }
        };
        if indent_here != indent {
            ts.seek(saved_pos);
            ts.column = saved_column;
            break;
        }
        let line = read_string_until_end_of_line(ts);
        if is_hex {
            for pair in line.split_whitespace() {
                let byte = u8::from_str_radix(pair, 16)
                    .map_err(|_| Error::YamlFormat(format!("invalid hex byte '{pair}' in blob")))?;
                scratch.push(byte);
            }
        } else {
            scratch.extend_from_slice(line.as_bytes());
        }
        if ts.eof() {
            break;
        }
    }
    Ok(Value::Blob(arena.alloc_blob(&scratch)))
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::rtti::{FieldLayout, Variant};

    fn xy_fields() -> Vec<Field> {
        FieldLayout::default()
            .push("x", Type::int(), 4, 4)
            .push("y", Type::int(), 4, 4)
            .finish()
    }

    #[test]
    fn parses_boolean_document_with_prologue() {
        let arena = Arena::new();
        let value = parse("%YAML 1.2\n---\ntrue\n", &Type::boolean(), &arena).unwrap();
        assert!(value.structurally_equal(&Value::Boolean(true)));
    }

    #[test]
    fn parses_record_fields_in_order() {
        let ty: TypeRef = Rc::new(Type::Record { name: None, fields: xy_fields() });
        let arena = Arena::new();
        let value = parse("x: 10\ny: 120\n", &ty, &arena).unwrap();
        assert!(value.structurally_equal(&Value::Record(vec![Value::Int(10), Value::Int(120)])));
    }

    #[test]
    fn rejects_field_name_mismatch() {
        let ty: TypeRef = Rc::new(Type::Record { name: None, fields: xy_fields() });
        let arena = Arena::new();
        let err = parse("z: 10\ny: 120\n", &ty, &arena).unwrap_err();
        assert!(matches!(err, Error::FieldNameMismatch { .. }));
    }

    #[test]
    fn rejects_odd_indentation() {
        let inner_fields = vec![Field {
            name: "x".to_string(),
            ty: Type::int(),
            offset: 0,
            size: 4,
            align: 4,
        }];
        let inner: TypeRef = Rc::new(Type::Record { name: None, fields: inner_fields });
        let outer_fields = vec![crate::rtti::Field {
            name: "inner".to_string(),
            ty: inner,
            offset: 0,
            size: 4,
            align: 4,
        }];
        let ty: TypeRef = Rc::new(Type::Record { name: None, fields: outer_fields });
        let arena = Arena::new();
        let err = parse("inner:\n   x: 1\n", &ty, &arena).unwrap_err();
        assert!(matches!(err, Error::YamlFormat(_)));
    }

    #[test]
    fn parses_list_of_records() {
        let item_ty: TypeRef = Rc::new(Type::Record { name: None, fields: xy_fields() });
        let ty: TypeRef = Rc::new(Type::List { item_type: item_ty, item_size: 8, item_align: 4 });
        let arena = Arena::new();
        let text = "- x: 11\n  y: 121\n- x: 12\n  y: 122\n";
        let value = parse(text, &ty, &arena).unwrap();
        let expected = Value::List(vec![
            Value::Record(vec![Value::Int(11), Value::Int(121)]),
            Value::Record(vec![Value::Int(12), Value::Int(122)]),
        ]);
        assert!(value.structurally_equal(&expected));
    }

    #[test]
    fn parses_custom_variant_with_and_without_fields() {
        let just_fields = FieldLayout::default().push("0", Type::int(), 4, 4).finish();
        let ty: TypeRef = Rc::new(Type::Custom {
            name: "Maybe".to_string(),
            variants: vec![
                Variant { index: 0, name: "Not".to_string(), fields: vec![] },
                Variant { index: 1, name: "Just".to_string(), fields: just_fields },
            ],
        });
        let arena = Arena::new();
        let not_value = parse("Not\n", &ty, &arena).unwrap();
        assert!(not_value.structurally_equal(&Value::Custom { variant: 0, fields: vec![] }));

        let just_value = parse("Just 99\n", &ty, &arena).unwrap();
        assert!(just_value
            .structurally_equal(&Value::Custom { variant: 1, fields: vec![Value::Int(99)] }));
    }

    #[test]
    fn parses_ascii_blob_body() {
        let arena = Arena::new();
        let text = "ti: >\n  1234567890\n  abcdefghij\n";
        let fields = vec![crate::rtti::Field {
            name: "ti".to_string(),
            ty: Type::blob(),
            offset: 0,
            size: 8,
            align: 8,
        }];
        let ty: TypeRef = Rc::new(Type::Record { name: None, fields });
        let value = parse(text, &ty, &arena).unwrap();
        let Value::Record(values) = value else { panic!("expected record") };
        let Value::Blob(bytes) = &values[0] else { panic!("expected blob") };
        assert_eq!(&**bytes, b"1234567890abcdefghij");
    }
}
