// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Schema resolution: reading data written under one schema into values
//! conforming to another.

use crate::{
    AvroResult,
    decode::{decode_internal, decode_seq_len},
    error::Details,
    reader::BinaryDecoder,
    schema::{
        Aliases, EnumSchema, Name, NamesRef, RecordSchema, Schema, SchemaKind, UnionSchema,
    },
    types::Value,
    util::{zag_i32, zag_i64},
};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::io::Read;
use std::rc::Rc;

/// Decodes data written under `writer_schema` into values matching
/// `reader_schema`.
///
/// Resolution legality is validated at construction wherever it does not
/// depend on actual data; the remaining conditions (a writer enum symbol
/// absent from the reader, a writer union branch with no reader projection)
/// surface while reading.
///
/// Per-(writer record, reader record) field plans and per-enum symbol maps
/// are computed on first encounter and kept for the life of the projector,
/// so a stream of many records costs one table lookup per field at steady
/// state. The projector is single-threaded, like the decoder it reads from.
#[derive(Debug)]
pub struct DatumProjector<'s> {
    writer_schema: &'s Schema,
    reader_schema: &'s Schema,
    writer_names: NamesRef<'s>,
    reader_names: NamesRef<'s>,
    record_plans: RefCell<HashMap<(Name, Name), Rc<RecordPlan<'s>>>>,
    enum_plans: RefCell<HashMap<(Name, Name), Rc<EnumPlan>>>,
}

/// How one writer record maps onto one reader record.
#[derive(Debug)]
struct RecordPlan<'s> {
    /// One action per writer field, in writer (wire) order.
    actions: Vec<FieldAction<'s>>,
    /// Values for reader fields with no writer counterpart:
    /// (reader position, materialized default).
    defaults: Vec<(usize, Value)>,
    /// Reader field names, in reader order.
    reader_field_names: Vec<String>,
}

#[derive(Debug)]
enum FieldAction<'s> {
    /// Decode the writer field into the reader field at this position.
    Project {
        reader_position: usize,
        writer: &'s Schema,
        reader: &'s Schema,
    },
    /// Decode the writer field and discard it.
    Skip(&'s Schema),
}

/// Writer symbol position to reader `(position, symbol)`; `None` marks a
/// writer symbol without a counterpart, which is an error if encountered.
#[derive(Debug)]
struct EnumPlan {
    mapping: Vec<Option<(u32, String)>>,
}

impl<'s> DatumProjector<'s> {
    /// Build a projector and validate that resolution is legal.
    pub fn new(writer_schema: &'s Schema, reader_schema: &'s Schema) -> AvroResult<Self> {
        let mut writer_names = NamesRef::new();
        writer_schema.collect_named_schemas(&mut writer_names);
        let mut reader_names = NamesRef::new();
        reader_schema.collect_named_schemas(&mut reader_names);

        let projector = Self {
            writer_schema,
            reader_schema,
            writer_names,
            reader_names,
            record_plans: RefCell::new(HashMap::new()),
            enum_plans: RefCell::new(HashMap::new()),
        };
        projector.check(
            writer_schema,
            reader_schema,
            "",
            &mut HashSet::new(),
        )?;
        Ok(projector)
    }

    pub fn writer_schema(&self) -> &'s Schema {
        self.writer_schema
    }

    pub fn reader_schema(&self) -> &'s Schema {
        self.reader_schema
    }

    /// Read one datum written under the writer schema, producing a value
    /// shaped by the reader schema.
    pub fn read<R: Read>(&self, decoder: &mut BinaryDecoder<R>) -> AvroResult<Value> {
        self.project(self.writer_schema, self.reader_schema, decoder.reader_mut())
    }

    fn resolve_writer(&self, schema: &'s Schema) -> AvroResult<&'s Schema> {
        resolve_ref(schema, &self.writer_names)
    }

    fn resolve_reader(&self, schema: &'s Schema) -> AvroResult<&'s Schema> {
        resolve_ref(schema, &self.reader_names)
    }

    // ---- static validation ----

    fn check(
        &self,
        writer: &'s Schema,
        reader: &'s Schema,
        path: &str,
        on_stack: &mut HashSet<(Name, Name)>,
    ) -> AvroResult<()> {
        let writer = self.resolve_writer(writer)?;
        let reader = self.resolve_reader(reader)?;

        let incompatible = |reason: String| -> crate::Error {
            Details::IncompatibleSchemas {
                path: if path.is_empty() { "/".to_string() } else { path.to_string() },
                reason,
            }
            .into()
        };

        match (writer, reader) {
            (Schema::Union(w), Schema::Union(r)) => {
                // Branch pairing depends on the data; only a fully disjoint
                // pair of unions is statically wrong.
                let any = w.variants().iter().any(|wb| {
                    r.variants()
                        .iter()
                        .any(|rb| self.schemas_match(wb, rb))
                });
                if any {
                    Ok(())
                } else {
                    Err(incompatible(
                        "no writer union branch matches any reader union branch".to_string(),
                    ))
                }
            }
            (Schema::Union(w), _) => {
                let any = w
                    .variants()
                    .iter()
                    .any(|wb| self.schemas_match(wb, reader));
                if any {
                    Ok(())
                } else {
                    Err(incompatible(format!(
                        "no writer union branch matches reader {reader}"
                    )))
                }
            }
            (_, Schema::Union(r)) => {
                match self.reader_union_branch(writer, r) {
                    Some((index, branch)) => {
                        self.check(writer, branch, &format!("{path}/branch[{index}]"), on_stack)
                    }
                    None => Err(incompatible(format!(
                        "no reader union branch matches writer {writer}"
                    ))),
                }
            }
            (Schema::Record(w), Schema::Record(r)) => {
                if !names_match(&w.name, &r.name, &r.aliases) {
                    return Err(incompatible(format!(
                        "writer record {} does not match reader record {}",
                        w.name, r.name
                    )));
                }
                if !on_stack.insert((w.name.clone(), r.name.clone())) {
                    // already being checked further up the descent
                    return Ok(());
                }

                let path = format!("{path}/Record(\"{}\")", r.name);
                for writer_field in &w.fields {
                    if let Some(reader_field) = find_reader_field(r, &writer_field.name) {
                        self.check(
                            &writer_field.schema,
                            &reader_field.schema,
                            &format!("{path}/field \"{}\"", writer_field.name),
                            on_stack,
                        )?;
                    }
                    // a writer field absent from the reader is decoded and
                    // discarded, which is always legal
                }
                for reader_field in &r.fields {
                    let covered = w.fields.iter().any(|writer_field| {
                        find_reader_field(r, &writer_field.name)
                            .is_some_and(|f| std::ptr::eq(f, reader_field))
                    });
                    if !covered && reader_field.default.is_none() {
                        return Err(Details::IncompatibleSchemas {
                            path: format!("{path}/field \"{}\"", reader_field.name),
                            reason: "reader field is missing from the writer and has no default"
                                .to_string(),
                        }
                        .into());
                    }
                }
                on_stack.remove(&(w.name.clone(), r.name.clone()));
                Ok(())
            }
            (Schema::Enum(w), Schema::Enum(r)) => {
                if names_match(&w.name, &r.name, &r.aliases) {
                    // symbol-by-symbol coverage depends on the data
                    Ok(())
                } else {
                    Err(incompatible(format!(
                        "writer enum {} does not match reader enum {}",
                        w.name, r.name
                    )))
                }
            }
            (Schema::Fixed(w), Schema::Fixed(r)) => {
                if !names_match(&w.name, &r.name, &r.aliases) {
                    Err(incompatible(format!(
                        "writer fixed {} does not match reader fixed {}",
                        w.name, r.name
                    )))
                } else if w.size != r.size {
                    Err(incompatible(format!(
                        "writer fixed size {} does not match reader fixed size {}",
                        w.size, r.size
                    )))
                } else {
                    Ok(())
                }
            }
            (Schema::Array(w), Schema::Array(r)) => {
                self.check(&w.items, &r.items, &format!("{path}/items"), on_stack)
            }
            (Schema::Map(w), Schema::Map(r)) => {
                self.check(&w.types, &r.types, &format!("{path}/values"), on_stack)
            }
            (w, r) => {
                if promotion(w, r).is_some() {
                    Ok(())
                } else {
                    Err(incompatible(format!("writer {w} cannot be read as {r}")))
                }
            }
        }
    }

    /// The shallow matching rule used to pair union branches: primitive
    /// identity or promotion, container kind equality, named type name or
    /// alias equality.
    fn schemas_match(&self, writer: &'s Schema, reader: &'s Schema) -> bool {
        let Ok(writer) = self.resolve_writer(writer) else {
            return false;
        };
        let Ok(reader) = self.resolve_reader(reader) else {
            return false;
        };
        match (writer, reader) {
            (Schema::Record(w), Schema::Record(r)) => names_match(&w.name, &r.name, &r.aliases),
            (Schema::Enum(w), Schema::Enum(r)) => names_match(&w.name, &r.name, &r.aliases),
            (Schema::Fixed(w), Schema::Fixed(r)) => {
                names_match(&w.name, &r.name, &r.aliases) && w.size == r.size
            }
            (Schema::Array(_), Schema::Array(_)) | (Schema::Map(_), Schema::Map(_)) => true,
            (w, r) => {
                SchemaKind::from(w) == SchemaKind::from(r) || promotion(w, r).is_some()
            }
        }
    }

    /// Choose the reader union branch for a (resolved) writer schema. An
    /// exact kind match wins over a promotion, so that projecting a schema
    /// onto itself follows the writer's branch choice.
    fn reader_union_branch(
        &self,
        writer: &'s Schema,
        reader: &'s UnionSchema,
    ) -> Option<(usize, &'s Schema)> {
        let exact = reader.variants().iter().enumerate().find(|(_, rb)| {
            self.resolve_reader(rb).is_ok_and(|rb| {
                SchemaKind::from(rb) == SchemaKind::from(writer) && self.schemas_match(writer, rb)
            })
        });
        exact.or_else(|| {
            reader
                .variants()
                .iter()
                .enumerate()
                .find(|(_, rb)| self.schemas_match(writer, rb))
        })
    }

    // ---- projection ----

    fn project<R: Read>(
        &self,
        writer: &'s Schema,
        reader: &'s Schema,
        source: &mut R,
    ) -> AvroResult<Value> {
        let writer = self.resolve_writer(writer)?;
        let reader = self.resolve_reader(reader)?;

        match (writer, reader) {
            (Schema::Union(w), _) => {
                let index = zag_i64(source)?;
                let branch = w
                    .variants()
                    .get(usize::try_from(index).map_err(|_| Details::GetUnionVariant {
                        index,
                        num_variants: w.variants().len(),
                    })?)
                    .ok_or(Details::GetUnionVariant {
                        index,
                        num_variants: w.variants().len(),
                    })?;
                let branch = self.resolve_writer(branch)?;
                match reader {
                    Schema::Union(r) => match self.reader_union_branch(branch, r) {
                        Some((reader_index, reader_branch)) => {
                            let value = self.project(branch, reader_branch, source)?;
                            Ok(Value::Union(reader_index as u32, Box::new(value)))
                        }
                        None => Err(Details::IncompatibleSchemas {
                            path: format!("/branch[{index}]"),
                            reason: format!(
                                "writer union branch {branch} has no reader projection"
                            ),
                        }
                        .into()),
                    },
                    _ => self.project(branch, reader, source),
                }
            }
            (_, Schema::Union(r)) => match self.reader_union_branch(writer, r) {
                Some((reader_index, reader_branch)) => {
                    let value = self.project(writer, reader_branch, source)?;
                    Ok(Value::Union(reader_index as u32, Box::new(value)))
                }
                None => Err(Details::IncompatibleSchemas {
                    path: "/".to_string(),
                    reason: format!("writer {writer} has no reader union projection"),
                }
                .into()),
            },
            (Schema::Record(w), Schema::Record(r)) => {
                let plan = self.record_plan(w, r)?;
                let mut slots: Vec<Option<Value>> = vec![None; plan.reader_field_names.len()];
                for action in &plan.actions {
                    match action {
                        FieldAction::Project {
                            reader_position,
                            writer,
                            reader,
                        } => {
                            slots[*reader_position] = Some(self.project(writer, reader, source)?);
                        }
                        FieldAction::Skip(schema) => {
                            // explicit drop of a writer-only field
                            decode_internal(schema, &self.writer_names, source)?;
                        }
                    }
                }
                for (position, default) in &plan.defaults {
                    slots[*position] = Some(default.clone());
                }
                let fields = plan
                    .reader_field_names
                    .iter()
                    .zip(slots)
                    .map(|(name, slot)| {
                        slot.map(|value| (name.clone(), value))
                            .ok_or_else(|| Details::GetField(name.clone()).into())
                    })
                    .collect::<AvroResult<Vec<_>>>()?;
                Ok(Value::Record(fields))
            }
            (Schema::Enum(w), Schema::Enum(r)) => {
                let plan = self.enum_plan(w, r);
                let index = zag_i32(source)? as i64;
                match usize::try_from(index).ok().and_then(|i| plan.mapping.get(i)) {
                    Some(Some((reader_index, symbol))) => {
                        Ok(Value::Enum(*reader_index, symbol.clone()))
                    }
                    Some(None) => Err(Details::ProjectEnumSymbol {
                        symbol: w.symbols[index as usize].clone(),
                        reader: r.name.clone(),
                    }
                    .into()),
                    None => Err(Details::GetEnumValue {
                        index,
                        nsymbols: w.symbols.len(),
                    }
                    .into()),
                }
            }
            (Schema::Array(w), Schema::Array(r)) => {
                let mut items = Vec::new();
                loop {
                    let len = decode_seq_len(source)?;
                    if len == 0 {
                        break;
                    }
                    items.reserve(len);
                    for _ in 0..len {
                        items.push(self.project(&w.items, &r.items, source)?);
                    }
                }
                Ok(Value::Array(items))
            }
            (Schema::Map(w), Schema::Map(r)) => {
                let mut items = HashMap::new();
                loop {
                    let len = decode_seq_len(source)?;
                    if len == 0 {
                        break;
                    }
                    items.reserve(len);
                    for _ in 0..len {
                        let key = match decode_internal(
                            &Schema::string(),
                            &self.writer_names,
                            source,
                        )? {
                            Value::String(key) => key,
                            value => unreachable!("decoding a string produced {value:?}"),
                        };
                        items.insert(key, self.project(&w.types, &r.types, source)?);
                    }
                }
                Ok(Value::Map(items))
            }
            (Schema::Fixed(w), Schema::Fixed(_)) => {
                let mut buf = vec![0u8; w.size];
                source
                    .read_exact(&mut buf)
                    .map_err(|e| Details::ReadFixed(e, w.size))?;
                Ok(Value::Fixed(w.size, buf))
            }
            (w, r) => self.project_primitive(w, r, source),
        }
    }

    fn project_primitive<R: Read>(
        &self,
        writer: &'s Schema,
        reader: &'s Schema,
        source: &mut R,
    ) -> AvroResult<Value> {
        if promotion(writer, reader).is_none() {
            return Err(Details::IncompatibleSchemas {
                path: "/".to_string(),
                reason: format!("writer {writer} cannot be read as {reader}"),
            }
            .into());
        }
        let value = decode_internal(writer, &self.writer_names, source)?;
        promote(value, reader)
    }

    fn record_plan(&self, w: &'s RecordSchema, r: &'s RecordSchema) -> AvroResult<Rc<RecordPlan<'s>>> {
        let key = (w.name.clone(), r.name.clone());
        if let Some(plan) = self.record_plans.borrow().get(&key) {
            return Ok(plan.clone());
        }

        let mut actions = Vec::with_capacity(w.fields.len());
        let mut covered = vec![false; r.fields.len()];
        for writer_field in &w.fields {
            match find_reader_field_position(r, &writer_field.name) {
                Some(position) => {
                    covered[position] = true;
                    actions.push(FieldAction::Project {
                        reader_position: position,
                        writer: &writer_field.schema,
                        reader: &r.fields[position].schema,
                    });
                }
                None => actions.push(FieldAction::Skip(&writer_field.schema)),
            }
        }

        let mut defaults = Vec::new();
        for (position, reader_field) in r.fields.iter().enumerate() {
            if !covered[position] {
                let default = reader_field.default.as_ref().ok_or_else(|| {
                    crate::Error::from(Details::IncompatibleSchemas {
                        path: format!("/Record(\"{}\")/field \"{}\"", r.name, reader_field.name),
                        reason: "reader field is missing from the writer and has no default"
                            .to_string(),
                    })
                })?;
                let value =
                    Value::from_json(default, &reader_field.schema, &self.reader_names)?;
                defaults.push((position, value));
            }
        }

        let plan = Rc::new(RecordPlan {
            actions,
            defaults,
            reader_field_names: r.fields.iter().map(|f| f.name.clone()).collect(),
        });
        self.record_plans.borrow_mut().insert(key, plan.clone());
        Ok(plan)
    }

    fn enum_plan(&self, w: &'s EnumSchema, r: &'s EnumSchema) -> Rc<EnumPlan> {
        let key = (w.name.clone(), r.name.clone());
        if let Some(plan) = self.enum_plans.borrow().get(&key) {
            return plan.clone();
        }

        let fallback = r
            .default
            .as_ref()
            .and_then(|d| r.symbols.iter().position(|s| s == d))
            .map(|i| (i as u32, r.symbols[i].clone()));
        let mapping = w
            .symbols
            .iter()
            .map(|symbol| {
                r.symbols
                    .iter()
                    .position(|s| s == symbol)
                    .map(|i| (i as u32, symbol.clone()))
                    .or_else(|| fallback.clone())
            })
            .collect();

        let plan = Rc::new(EnumPlan { mapping });
        self.enum_plans.borrow_mut().insert(key, plan.clone());
        plan
    }
}

fn resolve_ref<'s>(schema: &'s Schema, names: &NamesRef<'s>) -> AvroResult<&'s Schema> {
    match schema {
        Schema::Ref { name } => names
            .get(name)
            .copied()
            .ok_or_else(|| Details::SchemaResolutionError(name.clone()).into()),
        _ => Ok(schema),
    }
}

fn names_match(writer: &Name, reader_name: &Name, reader_aliases: &Aliases) -> bool {
    if writer == reader_name {
        return true;
    }
    match reader_aliases {
        Some(aliases) => aliases
            .iter()
            .any(|alias| alias.fully_qualified_name(reader_name.namespace()) == *writer),
        None => false,
    }
}

/// Locate the reader field a writer field maps onto, by reader field name
/// or alias.
fn find_reader_field<'r>(
    reader: &'r RecordSchema,
    writer_field_name: &str,
) -> Option<&'r crate::schema::RecordField> {
    find_reader_field_position(reader, writer_field_name).map(|i| &reader.fields[i])
}

fn find_reader_field_position(reader: &RecordSchema, writer_field_name: &str) -> Option<usize> {
    reader.lookup.get(writer_field_name).copied()
}

/// Apply a numeric or string/bytes promotion to a decoded writer value.
fn promote(value: Value, reader: &Schema) -> AvroResult<Value> {
    Ok(match (value, reader) {
        (Value::Int(i), Schema::Long(_)) => Value::Long(i as i64),
        (Value::Int(i), Schema::Float(_)) => Value::Float(i as f32),
        (Value::Int(i), Schema::Double(_)) => Value::Double(i as f64),
        (Value::Long(i), Schema::Float(_)) => Value::Float(i as f32),
        (Value::Long(i), Schema::Double(_)) => Value::Double(i as f64),
        (Value::Float(x), Schema::Double(_)) => Value::Double(f64::from(x)),
        (Value::String(s), Schema::Bytes(_)) => Value::Bytes(s.into_bytes()),
        (Value::Bytes(bytes), Schema::String(_)) => {
            Value::String(String::from_utf8(bytes).map_err(Details::ConvertToUtf8)?)
        }
        (value, _) => value,
    })
}

/// The promotion, if any, that reads a writer primitive as a reader
/// primitive.
fn promotion(writer: &Schema, reader: &Schema) -> Option<()> {
    match (writer, reader) {
        (Schema::Null(_), Schema::Null(_))
        | (Schema::Boolean(_), Schema::Boolean(_))
        | (Schema::Int(_), Schema::Int(_))
        | (Schema::Long(_), Schema::Long(_))
        | (Schema::Float(_), Schema::Float(_))
        | (Schema::Double(_), Schema::Double(_))
        | (Schema::Bytes(_), Schema::Bytes(_))
        | (Schema::String(_), Schema::String(_)) => Some(()),
        (Schema::Int(_), Schema::Long(_) | Schema::Float(_) | Schema::Double(_)) => Some(()),
        (Schema::Long(_), Schema::Float(_) | Schema::Double(_)) => Some(()),
        (Schema::Float(_), Schema::Double(_)) => Some(()),
        (Schema::String(_), Schema::Bytes(_)) => Some(()),
        (Schema::Bytes(_), Schema::String(_)) => Some(()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::to_avro_datum;
    use pretty_assertions::assert_eq;

    fn project_datum(writer: &Schema, reader: &Schema, bytes: &[u8]) -> AvroResult<Value> {
        let projector = DatumProjector::new(writer, reader)?;
        let mut decoder = BinaryDecoder::new(bytes);
        projector.read(&mut decoder)
    }

    #[test]
    fn test_projection_with_promotion_and_default() -> AvroResult<()> {
        let writer = Schema::parse_str(
            r#"{"type": "record", "name": "R", "fields": [
                {"name": "a", "type": "int"},
                {"name": "b", "type": "int"}
            ]}"#,
        )?;
        let reader = Schema::parse_str(
            r#"{"type": "record", "name": "R", "fields": [
                {"name": "a", "type": "long"},
                {"name": "c", "type": "int", "default": 0}
            ]}"#,
        )?;
        let bytes = to_avro_datum(
            &writer,
            Value::Record(vec![
                ("a".to_string(), Value::Int(1)),
                ("b".to_string(), Value::Int(2)),
            ]),
        )?;
        let value = project_datum(&writer, &reader, &bytes)?;
        assert_eq!(
            value,
            Value::Record(vec![
                ("a".to_string(), Value::Long(1)),
                ("c".to_string(), Value::Int(0)),
            ])
        );
        Ok(())
    }

    #[test]
    fn test_projection_identity_equals_plain_read() -> AvroResult<()> {
        let schema = Schema::parse_str(
            r#"{"type": "record", "name": "R", "fields": [
                {"name": "s", "type": ["null", "string"]},
                {"name": "n", "type": ["string", "null"]}
            ]}"#,
        )?;
        let value = Value::Record(vec![
            (
                "s".to_string(),
                Value::Union(1, Box::new(Value::String("x".to_string()))),
            ),
            ("n".to_string(), Value::Union(1, Box::new(Value::Null))),
        ]);
        let bytes = to_avro_datum(&schema, value.clone())?;
        assert_eq!(project_datum(&schema, &schema, &bytes)?, value);
        assert_eq!(crate::reader::from_avro_datum(&schema, &mut &bytes[..])?, value);
        Ok(())
    }

    #[test]
    fn test_reader_missing_field_without_default_is_static_error() {
        let writer = Schema::parse_str(
            r#"{"type": "record", "name": "R", "fields": [
                {"name": "a", "type": "int"}
            ]}"#,
        )
        .unwrap();
        let reader = Schema::parse_str(
            r#"{"type": "record", "name": "R", "fields": [
                {"name": "a", "type": "int"},
                {"name": "b", "type": "int"}
            ]}"#,
        )
        .unwrap();
        match DatumProjector::new(&writer, &reader).map_err(crate::Error::into_details) {
            Err(Details::IncompatibleSchemas { path, .. }) => {
                assert!(path.contains("\"b\""), "path was {path}");
            }
            other => panic!("Expected Details::IncompatibleSchemas, got {other:?}"),
        }
    }

    #[test]
    fn test_incompatible_primitives_are_static_error() {
        let writer = Schema::parse_str("\"string\"").unwrap();
        let reader = Schema::parse_str("\"int\"").unwrap();
        assert!(DatumProjector::new(&writer, &reader).is_err());
    }

    #[test]
    fn test_enum_symbol_resolution_by_name() -> AvroResult<()> {
        let writer = Schema::parse_str(
            r#"{"type": "enum", "name": "Suit", "symbols": ["HEARTS", "SPADES", "CLUBS"]}"#,
        )?;
        let reader = Schema::parse_str(
            r#"{"type": "enum", "name": "Suit", "symbols": ["SPADES", "HEARTS", "CLUBS"]}"#,
        )?;
        // writer writes SPADES at index 1; the reader knows it at index 0
        let bytes = to_avro_datum(&writer, Value::Enum(1, "SPADES".to_string()))?;
        let value = project_datum(&writer, &reader, &bytes)?;
        assert_eq!(value, Value::Enum(0, "SPADES".to_string()));
        Ok(())
    }

    #[test]
    fn test_enum_falls_back_to_reader_default() -> AvroResult<()> {
        let writer = Schema::parse_str(
            r#"{"type": "enum", "name": "Suit", "symbols": ["HEARTS", "SPADES"]}"#,
        )?;
        let reader = Schema::parse_str(
            r#"{"type": "enum", "name": "Suit", "symbols": ["SPADES", "UNKNOWN"], "default": "UNKNOWN"}"#,
        )?;
        let bytes = to_avro_datum(&writer, Value::Enum(0, "HEARTS".to_string()))?;
        let value = project_datum(&writer, &reader, &bytes)?;
        assert_eq!(value, Value::Enum(1, "UNKNOWN".to_string()));
        Ok(())
    }

    #[test]
    fn test_enum_without_fallback_is_runtime_error() {
        let writer = Schema::parse_str(
            r#"{"type": "enum", "name": "Suit", "symbols": ["HEARTS", "SPADES"]}"#,
        )
        .unwrap();
        let reader = Schema::parse_str(
            r#"{"type": "enum", "name": "Suit", "symbols": ["SPADES"]}"#,
        )
        .unwrap();
        // construction is fine, only the actual HEARTS datum is unreadable
        let projector = DatumProjector::new(&writer, &reader).unwrap();
        let bytes = to_avro_datum(&writer, Value::Enum(0, "HEARTS".to_string())).unwrap();
        let mut decoder = BinaryDecoder::new(&bytes[..]);
        match projector.read(&mut decoder).map_err(crate::Error::into_details) {
            Err(Details::ProjectEnumSymbol { symbol, .. }) => assert_eq!(symbol, "HEARTS"),
            other => panic!("Expected Details::ProjectEnumSymbol, got {other:?}"),
        }
    }

    #[test]
    fn test_writer_union_reader_single() -> AvroResult<()> {
        let writer = Schema::parse_str(r#"["null", "string"]"#)?;
        let reader = Schema::parse_str("\"string\"")?;
        let bytes = to_avro_datum(&writer, Value::String("hi".to_string()))?;
        let value = project_datum(&writer, &reader, &bytes)?;
        assert_eq!(value, Value::String("hi".to_string()));
        Ok(())
    }

    #[test]
    fn test_writer_single_reader_union() -> AvroResult<()> {
        let writer = Schema::parse_str("\"string\"")?;
        let reader = Schema::parse_str(r#"["null", "string"]"#)?;
        let bytes = to_avro_datum(&writer, Value::String("hi".to_string()))?;
        let value = project_datum(&writer, &reader, &bytes)?;
        assert_eq!(
            value,
            Value::Union(1, Box::new(Value::String("hi".to_string())))
        );
        Ok(())
    }

    #[test]
    fn test_record_field_matched_by_reader_alias() -> AvroResult<()> {
        let writer = Schema::parse_str(
            r#"{"type": "record", "name": "R", "fields": [
                {"name": "old_name", "type": "int"}
            ]}"#,
        )?;
        let reader = Schema::parse_str(
            r#"{"type": "record", "name": "R", "fields": [
                {"name": "new_name", "aliases": ["old_name"], "type": "int"}
            ]}"#,
        )?;
        let bytes = to_avro_datum(
            &writer,
            Value::Record(vec![("old_name".to_string(), Value::Int(7))]),
        )?;
        let value = project_datum(&writer, &reader, &bytes)?;
        assert_eq!(
            value,
            Value::Record(vec![("new_name".to_string(), Value::Int(7))])
        );
        Ok(())
    }

    #[test]
    fn test_recursive_schema_projection() -> AvroResult<()> {
        let schema = Schema::parse_str(
            r#"{"type": "record", "name": "LongList", "fields": [
                {"name": "value", "type": "long"},
                {"name": "next", "type": ["null", "LongList"]}
            ]}"#,
        )?;
        let value = Value::Record(vec![
            ("value".to_string(), Value::Long(1)),
            (
                "next".to_string(),
                Value::Union(
                    1,
                    Box::new(Value::Record(vec![
                        ("value".to_string(), Value::Long(2)),
                        ("next".to_string(), Value::Union(0, Box::new(Value::Null))),
                    ])),
                ),
            ),
        ]);
        let bytes = to_avro_datum(&schema, value.clone())?;
        assert_eq!(project_datum(&schema, &schema, &bytes)?, value);
        Ok(())
    }

    #[test]
    fn test_string_bytes_reinterpretation() -> AvroResult<()> {
        let writer = Schema::parse_str("\"string\"")?;
        let reader = Schema::parse_str("\"bytes\"")?;
        let bytes = to_avro_datum(&writer, Value::String("hi".to_string()))?;
        assert_eq!(
            project_datum(&writer, &reader, &bytes)?,
            Value::Bytes(vec![b'h', b'i'])
        );
        Ok(())
    }
}
