//! Tracked field declarations shared by every instance of a model class.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use super::Model;
use crate::dispatch::coerce::kind_of;
use crate::dispatch::names::{changed_query_name, flag_query_name, writer_name};
use crate::dispatch::Value;
use crate::error::{Error, Result};

/// What values a tracked field accepts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FieldKind {
    /// Any value.
    #[default]
    Any,
    /// `true`, `false` or null. Boolean fields also get a `name?` flag query.
    Bool,
}

/// A declared field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldSpec {
    name: String,
    kind: FieldKind,
}

impl FieldSpec {
    /// The field name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The field kind.
    #[must_use]
    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    pub(crate) fn check(&self, value: &Value) -> Result<()> {
        match (self.kind, value) {
            (FieldKind::Any, _) | (FieldKind::Bool, Value::Bool(_) | Value::Null) => Ok(()),
            (FieldKind::Bool, other) => Err(Error::FieldType {
                field: self.name.clone(),
                expected: "a boolean or null",
                found: kind_of(other).to_string(),
            }),
        }
    }
}

/// A generated accessor, pointing at a field slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Accessor {
    /// `name`
    Read(usize),
    /// `name=`
    Write(usize),
    /// `name_changed?`
    Changed(usize),
    /// `name?`
    Flag(usize),
}

/// Field list plus the accessor dispatch table generated from it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Schema {
    pub(crate) name: String,
    pub(crate) fields: Vec<FieldSpec>,
    accessors: HashMap<String, Accessor>,
}

impl Schema {
    fn new(name: String) -> Self {
        Self {
            name,
            fields: Vec::new(),
            accessors: HashMap::new(),
        }
    }

    pub(crate) fn accessor(&self, method: &str) -> Option<Accessor> {
        self.accessors.get(method).copied()
    }

    /// Slot of `field`, found through its reader.
    pub(crate) fn index_of(&self, field: &str) -> Option<usize> {
        match self.accessor(field) {
            Some(Accessor::Read(index)) => Some(index),
            _ => None,
        }
    }

    fn declare(&mut self, name: String, kind: FieldKind) {
        let index = match self.index_of(&name) {
            Some(index) => {
                // Redeclaring never narrows a boolean field back to `Any`.
                if kind == FieldKind::Bool {
                    self.fields[index].kind = FieldKind::Bool;
                }
                index
            }
            None => {
                self.fields.push(FieldSpec {
                    name: name.clone(),
                    kind,
                });
                self.fields.len() - 1
            }
        };

        self.accessors.insert(writer_name(&name), Accessor::Write(index));
        self.accessors
            .insert(changed_query_name(&name), Accessor::Changed(index));
        if self.fields[index].kind == FieldKind::Bool {
            self.accessors
                .insert(flag_query_name(&name), Accessor::Flag(index));
        }
        self.accessors.insert(name, Accessor::Read(index));
    }
}

/// A model class: a named set of tracked fields.
///
/// Declaring a field generates a reader (`name`), a tracked writer (`name=`)
/// and a dirty query (`name_changed?`) for every instance. Boolean fields
/// also get a flag query (`name?`).
///
/// The class is cheap to clone and shares its declarations with every
/// [`Model`] built from it. Declaring more fields after instances exist only
/// affects instances built afterwards.
///
/// # Example
///
/// ```rust
/// use testkit_doubles::{ModelClass, json};
///
/// let mut person = ModelClass::new("Person");
/// person.declare(["name", "age"]);
///
/// let ann = person.instantiate(json!({"name": "Ann", "age": 30})).unwrap();
/// assert!(!ann.changed());
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModelClass {
    schema: Arc<Schema>,
}

impl ModelClass {
    /// Create a class with no fields.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            schema: Arc::new(Schema::new(name.into())),
        }
    }

    /// Start building a class.
    ///
    /// # Example
    ///
    /// ```rust
    /// use testkit_doubles::{FieldKind, ModelClass};
    ///
    /// let class = ModelClass::builder("Task")
    ///     .fields(["title", "owner"])
    ///     .bool_field("done")
    ///     .build();
    ///
    /// assert_eq!(class.fields().len(), 3);
    /// assert_eq!(class.field("done").unwrap().kind(), FieldKind::Bool);
    /// ```
    pub fn builder(name: impl Into<String>) -> ModelClassBuilder {
        ModelClassBuilder {
            class: Self::new(name),
        }
    }

    /// Declare tracked fields. Declaring a name twice is a no-op.
    pub fn declare<I, S>(&mut self, names: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.declare_with(names, FieldKind::Any)
    }

    /// Declare tracked boolean fields, each with an extra `name?` query.
    ///
    /// Redeclaring an existing field as boolean upgrades it.
    pub fn declare_bool<I, S>(&mut self, names: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.declare_with(names, FieldKind::Bool)
    }

    fn declare_with<I, S>(&mut self, names: I, kind: FieldKind) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if Arc::strong_count(&self.schema) > 1 {
            debug!(class = %self.schema.name, "forking field declarations from existing instances");
        }
        let schema = Arc::make_mut(&mut self.schema);
        for name in names {
            let name = name.into();
            debug!(class = %schema.name, field = %name, ?kind, "declaring tracked field");
            schema.declare(name, kind);
        }
        self
    }

    /// The class name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.schema.name
    }

    /// Declared fields in declaration order.
    #[must_use]
    pub fn fields(&self) -> &[FieldSpec] {
        &self.schema.fields
    }

    /// Look up a declared field.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.schema.index_of(name).map(|index| &self.schema.fields[index])
    }

    /// Check if `name` is a declared field.
    #[must_use]
    pub fn is_declared(&self, name: &str) -> bool {
        self.schema.index_of(name).is_some()
    }

    /// Build an instance from a mapping of initial values.
    ///
    /// Same as [`Model::new`].
    ///
    /// # Errors
    ///
    /// See [`Model::new`].
    pub fn instantiate(&self, initial: Value) -> Result<Model> {
        Model::new(self, initial)
    }

    pub(crate) fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub(crate) fn from_schema(schema: Arc<Schema>) -> Self {
        Self { schema }
    }
}

/// Builder for [`ModelClass`].
#[derive(Debug)]
pub struct ModelClassBuilder {
    class: ModelClass,
}

impl ModelClassBuilder {
    /// Add a tracked field.
    #[must_use]
    pub fn field(self, name: impl Into<String>) -> Self {
        self.fields([name.into()])
    }

    /// Add several tracked fields.
    #[must_use]
    pub fn fields<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.class.declare(names);
        self
    }

    /// Add a tracked boolean field.
    #[must_use]
    pub fn bool_field(mut self, name: impl Into<String>) -> Self {
        self.class.declare_bool([name.into()]);
        self
    }

    /// Finish the class.
    #[must_use]
    pub fn build(self) -> ModelClass {
        self.class
    }
}
