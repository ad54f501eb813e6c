//! Per-instance field values, snapshot and dirty flags.

use std::sync::Arc;

use serde_json::Map;
use tracing::{debug, trace};

use super::class::{Accessor, FieldKind, FieldSpec, ModelClass, Schema};
use crate::dispatch::coerce::{check_arity, kind_of};
use crate::dispatch::names::{changed_query_name, flag_query_name, writer_name};
use crate::dispatch::{Respond, Value};
use crate::error::{Error, Result};

/// Dispatch name of the aggregate dirty query.
const CHANGED: &str = "changed?";
/// Dispatch name of the rollback.
const RESTORE: &str = "restore!";

/// An instance of a [`ModelClass`] that remembers which fields were written.
///
/// Initial values are assigned without marking anything dirty and are kept
/// as a snapshot. Every write through [`set`](Model::set) (or the `name=`
/// dispatch name) marks that field and the whole model as changed until
/// [`restore`](Model::restore) rolls everything back to the snapshot.
///
/// # Example
///
/// ```rust
/// use testkit_doubles::{Model, ModelClass, json};
///
/// let class = ModelClass::builder("Person").fields(["name", "age"]).build();
/// let mut p = Model::new(&class, json!({"name": "Ann", "age": 30})).unwrap();
///
/// p.set("name", "Bea").unwrap();
/// assert!(p.field_changed("name").unwrap());
/// assert!(!p.field_changed("age").unwrap());
/// assert!(p.changed());
///
/// p.restore();
/// assert_eq!(p.get("name").unwrap(), "Ann");
/// assert!(!p.changed());
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Model {
    schema: Arc<Schema>,
    values: Vec<Value>,
    initial: Vec<Value>,
    dirty: Vec<bool>,
}

impl Model {
    /// Build an instance from a JSON object of initial values.
    ///
    /// Keys naming declared fields are assigned and snapshotted; other keys
    /// are ignored. Declared fields missing from the object start out null.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedInput`] if `initial` is not an object, or
    /// [`Error::FieldType`] if a boolean field gets a non-boolean value.
    pub fn new(class: &ModelClass, initial: Value) -> Result<Self> {
        match initial {
            Value::Object(map) => Self::from_map(class, map),
            other => Err(Error::malformed_input(kind_of(&other))),
        }
    }

    /// Build an instance from an already unpacked mapping.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FieldType`] if a boolean field gets a non-boolean value.
    pub fn from_map(class: &ModelClass, initial: Map<String, Value>) -> Result<Self> {
        let schema = Arc::clone(class.schema());
        let mut values = vec![Value::Null; schema.fields.len()];

        for (key, value) in initial {
            match schema.index_of(&key) {
                Some(index) => {
                    schema.fields[index].check(&value)?;
                    values[index] = value;
                }
                None => trace!(class = %schema.name, key = %key, "ignoring undeclared key"),
            }
        }

        Ok(Self {
            dirty: vec![false; values.len()],
            initial: values.clone(),
            values,
            schema,
        })
    }

    /// The class this instance was built from.
    #[must_use]
    pub fn class(&self) -> ModelClass {
        ModelClass::from_schema(Arc::clone(&self.schema))
    }

    /// Fields of this instance in declaration order.
    #[must_use]
    pub fn fields(&self) -> &[FieldSpec] {
        &self.schema.fields
    }

    /// Read a field.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedMethod`] if `field` is not declared.
    pub fn get(&self, field: &str) -> Result<&Value> {
        let index = self.slot(field, || field.to_string())?;
        Ok(&self.values[index])
    }

    /// Write a field and mark it changed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedMethod`] if `field` is not declared, or
    /// [`Error::FieldType`] if a boolean field gets a non-boolean value. A
    /// failed write changes nothing.
    pub fn set(&mut self, field: &str, value: impl Into<Value>) -> Result<()> {
        let index = self.slot(field, || writer_name(field))?;
        self.write(index, value.into())
    }

    /// Whether any field was written since construction or the last restore.
    #[must_use]
    pub fn changed(&self) -> bool {
        self.dirty.iter().any(|&dirty| dirty)
    }

    /// Whether `field` was written since construction or the last restore.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedMethod`] if `field` is not declared.
    pub fn field_changed(&self, field: &str) -> Result<bool> {
        let index = self.slot(field, || changed_query_name(field))?;
        Ok(self.dirty[index])
    }

    /// Current value of a boolean field, null reading as `false`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedMethod`] unless `field` is a declared
    /// boolean field.
    pub fn flag(&self, field: &str) -> Result<bool> {
        let method = flag_query_name(field);
        match self.schema.accessor(&method) {
            Some(Accessor::Flag(index)) => Ok(self.flag_at(index)),
            _ => Err(self.unsupported(method)),
        }
    }

    /// Names of the changed fields in declaration order.
    #[must_use]
    pub fn changed_fields(&self) -> Vec<&str> {
        self.schema
            .fields
            .iter()
            .zip(&self.dirty)
            .filter(|(_, dirty)| **dirty)
            .map(|(spec, _)| spec.name())
            .collect()
    }

    /// The snapshot value `field` will return to on [`restore`](Model::restore).
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedMethod`] if `field` is not declared.
    pub fn initial(&self, field: &str) -> Result<&Value> {
        let index = self.slot(field, || field.to_string())?;
        Ok(&self.initial[index])
    }

    /// Put every field back to its snapshot value and clear all dirty flags.
    pub fn restore(&mut self) {
        debug!(class = %self.schema.name, changed = ?self.changed_fields(), "restoring snapshot");
        for index in 0..self.values.len() {
            let snapshot = self.initial[index].clone();
            self.assign(index, snapshot);
        }
        self.dirty.fill(false);
    }

    /// Tracked write path.
    fn write(&mut self, index: usize, value: Value) -> Result<()> {
        self.schema.fields[index].check(&value)?;
        trace!(class = %self.schema.name, field = %self.schema.fields[index].name(), %value, "tracked write");
        self.assign(index, value);
        self.dirty[index] = true;
        Ok(())
    }

    /// Untracked write path.
    fn assign(&mut self, index: usize, value: Value) {
        self.values[index] = value;
    }

    fn flag_at(&self, index: usize) -> bool {
        debug_assert_eq!(self.schema.fields[index].kind(), FieldKind::Bool);
        matches!(self.values[index], Value::Bool(true))
    }

    fn slot(&self, field: &str, method: impl FnOnce() -> String) -> Result<usize> {
        self.schema
            .index_of(field)
            .ok_or_else(|| self.unsupported(method()))
    }

    fn unsupported(&self, method: impl Into<String>) -> Error {
        Error::unsupported(self.schema.name.clone(), method)
    }

    fn run(&mut self, accessor: Accessor, method: &str, args: &[Value]) -> Result<Value> {
        match accessor {
            Accessor::Read(index) => {
                check_arity(method, args, 0)?;
                Ok(self.values[index].clone())
            }
            Accessor::Write(index) => {
                check_arity(method, args, 1)?;
                let value = args[0].clone();
                self.write(index, value.clone())?;
                Ok(value)
            }
            Accessor::Changed(index) => {
                check_arity(method, args, 0)?;
                Ok(Value::Bool(self.dirty[index]))
            }
            Accessor::Flag(index) => {
                check_arity(method, args, 0)?;
                Ok(Value::Bool(self.flag_at(index)))
            }
        }
    }
}

/// Generated accessors take precedence over `changed?` and `restore!`, so a
/// boolean field called `changed` shadows the aggregate query.
impl Respond for Model {
    fn respond(&mut self, method: &str, args: &[Value]) -> Option<Result<Value>> {
        if let Some(accessor) = self.schema.accessor(method) {
            return Some(self.run(accessor, method, args));
        }
        match method {
            CHANGED => Some(check_arity(method, args, 0).map(|()| Value::Bool(self.changed()))),
            RESTORE => Some(check_arity(method, args, 0).map(|()| {
                self.restore();
                Value::Null
            })),
            _ => None,
        }
    }

    fn responds_to(&self, method: &str) -> bool {
        self.schema.accessor(method).is_some() || matches!(method, CHANGED | RESTORE)
    }

    fn receiver_name(&self) -> String {
        self.schema.name.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn person_class() -> ModelClass {
        ModelClass::builder("Person").fields(["name", "age"]).build()
    }

    fn ann() -> Model {
        Model::new(&person_class(), json!({"name": "Ann", "age": 30})).unwrap()
    }

    #[test]
    fn test_construction_is_clean() {
        let p = ann();

        assert!(!p.changed());
        assert!(!p.field_changed("name").unwrap());
        assert!(!p.field_changed("age").unwrap());
        assert_eq!(p.get("name").unwrap(), "Ann");
        assert_eq!(p.get("age").unwrap(), 30);
        assert!(p.changed_fields().is_empty());
    }

    #[test]
    fn test_write_marks_only_that_field() {
        let mut p = ann();
        p.set("name", "Bea").unwrap();

        assert!(p.field_changed("name").unwrap());
        assert!(!p.field_changed("age").unwrap());
        assert!(p.changed());
        assert_eq!(p.changed_fields(), vec!["name"]);
    }

    #[test]
    fn test_restore_rolls_back() {
        let mut p = ann();
        let fresh = p.clone();

        p.set("name", "Bea").unwrap();
        p.set("name", "Cid").unwrap();
        p.set("age", 31).unwrap();
        p.restore();

        assert_eq!(p, fresh);
        assert_eq!(p.get("name").unwrap(), "Ann");
        assert!(!p.changed());

        p.restore();
        assert_eq!(p, fresh);
    }

    #[test]
    fn test_snapshot_is_fixed_at_construction() {
        let mut p = ann();
        p.set("age", 40).unwrap();

        assert_eq!(p.initial("age").unwrap(), 30);
        assert_eq!(p.get("age").unwrap(), 40);
    }

    #[test]
    fn test_writing_same_value_still_marks_dirty() {
        let mut p = ann();
        p.set("name", "Ann").unwrap();

        assert!(p.field_changed("name").unwrap());
    }

    #[test]
    fn test_missing_and_unknown_keys() {
        let p = Model::new(&person_class(), json!({"name": "Ann", "email": "a@b"})).unwrap();

        assert_eq!(p.get("age").unwrap(), &Value::Null);
        assert!(!p.field_changed("age").unwrap());
        assert!(p.get("email").unwrap_err().is_unsupported());
    }

    #[test]
    fn test_non_mapping_input_is_rejected() {
        let err = Model::new(&person_class(), json!(["Ann", 30])).unwrap_err();

        assert!(matches!(err, Error::MalformedInput(_)));
        assert_eq!(
            err.to_string(),
            "malformed construction input: expected a mapping, got array"
        );
    }

    #[test]
    fn test_from_map() {
        let mut map = Map::new();
        map.insert("name".to_string(), json!("Ann"));
        map.insert("email".to_string(), json!("ann@example.com"));

        let p = Model::from_map(&person_class(), map).unwrap();
        assert_eq!(p.get("name").unwrap(), "Ann");
        assert_eq!(p.get("age").unwrap(), &Value::Null);
        assert_eq!(p.initial("name").unwrap(), "Ann");
        assert!(!p.changed());
        assert!(p.get("email").is_err());

        let tasks = ModelClass::builder("Task").bool_field("done").build();
        let mut map = Map::new();
        map.insert("done".to_string(), json!("yes"));
        let err = Model::from_map(&tasks, map).unwrap_err();
        assert!(matches!(err, Error::FieldType { .. }));
    }

    #[test]
    fn test_undeclared_queries_fail() {
        let mut p = ann();

        let err = p.field_changed("email").unwrap_err();
        assert_eq!(err.to_string(), "undefined method `email_changed?` for Person");

        let err = p.set("email", "a@b").unwrap_err();
        assert_eq!(err.to_string(), "undefined method `email=` for Person");
        assert!(!p.changed());
    }

    #[test]
    fn test_bool_field_flag() {
        let class = ModelClass::builder("Task")
            .field("title")
            .bool_field("done")
            .build();
        let mut task = class.instantiate(json!({"title": "write"})).unwrap();

        assert!(!task.flag("done").unwrap());
        task.set("done", true).unwrap();
        assert!(task.flag("done").unwrap());
        assert!(task.field_changed("done").unwrap());

        let err = task.flag("title").unwrap_err();
        assert_eq!(err.to_string(), "undefined method `title?` for Task");
    }

    #[test]
    fn test_bool_field_rejects_other_values() {
        let class = ModelClass::builder("Task").bool_field("done").build();

        let err = class.instantiate(json!({"done": "yes"})).unwrap_err();
        assert!(matches!(err, Error::FieldType { .. }));

        let mut task = class.instantiate(json!({"done": false})).unwrap();
        assert!(task.set("done", 1).is_err());
        assert!(!task.changed());
        assert_eq!(task.get("done").unwrap(), false);
    }

    #[test]
    fn test_dispatch_accessors() {
        let mut p = ann();

        assert_eq!(p.dispatch("name", &[]).unwrap(), json!("Ann"));
        assert_eq!(p.dispatch("name=", &[json!("Bea")]).unwrap(), json!("Bea"));
        assert_eq!(p.dispatch("name_changed?", &[]).unwrap(), json!(true));
        assert_eq!(p.dispatch("age_changed?", &[]).unwrap(), json!(false));
        assert_eq!(p.dispatch("changed?", &[]).unwrap(), json!(true));
        assert_eq!(p.dispatch("restore!", &[]).unwrap(), Value::Null);
        assert_eq!(p.dispatch("name", &[]).unwrap(), json!("Ann"));
        assert_eq!(p.dispatch("changed?", &[]).unwrap(), json!(false));
    }

    #[test]
    fn test_dispatch_arity_and_unknown() {
        let mut p = ann();

        assert!(matches!(
            p.dispatch("name=", &[]).unwrap_err(),
            Error::WrongArity { .. }
        ));
        assert!(matches!(
            p.dispatch("name", &[json!(1)]).unwrap_err(),
            Error::WrongArity { .. }
        ));
        assert!(p.dispatch("email_changed?", &[]).unwrap_err().is_unsupported());
        assert!(p.responds_to("restore!"));
        assert!(!p.responds_to("name?"));
    }

    #[test]
    fn test_field_named_changed_shadows_aggregate_query() {
        let class = ModelClass::builder("Flagged").bool_field("changed").build();
        let mut model = class.instantiate(json!({"changed": true})).unwrap();

        assert_eq!(model.dispatch("changed?", &[]).unwrap(), json!(true));
        assert!(!model.changed());
    }

    #[test]
    fn test_instances_keep_their_fields_after_redeclaration() {
        let mut class = person_class();
        let before = class.instantiate(json!({"name": "Ann"})).unwrap();

        class.declare(["email"]);
        let after = class.instantiate(json!({"email": "a@b"})).unwrap();

        assert!(before.get("email").is_err());
        assert_eq!(after.get("email").unwrap(), "a@b");
        assert_eq!(before.class().fields().len(), 2);
        assert_eq!(after.class().fields().len(), 3);
    }
}
