//! Schema-typed field values supplied by the serialization layer.
//!
//! Every component instance carries a tree of [`Value`]s describing its
//! serialized state. Extraction rules read the fields they understand through
//! [`FieldAccess`]; the fallback rule walks the whole tree looking for
//! references.
//!
//! Absent fields read as "not set" (`None` or an empty list). A field that is
//! present with the wrong type is an extraction fault.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::FieldError;
use crate::model::{ComponentId, NodeId};

/// Named fields of a component or of a nested struct value.
pub type Fields = BTreeMap<String, Value>;

/// One serialized field value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Enum(String),
    /// Reference to another component; `None` is a null reference.
    Component(Option<ComponentId>),
    /// Reference to a placement node; `None` is a null reference.
    Node(Option<NodeId>),
    List(Vec<Value>),
    Struct(Fields),
}

impl Value {
    /// Name of the value's type, used in error messages.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "string",
            Self::Enum(_) => "enum",
            Self::Component(_) => "component reference",
            Self::Node(_) => "node reference",
            Self::List(_) => "list",
            Self::Struct(_) => "struct",
        }
    }

    #[must_use]
    pub fn component(id: ComponentId) -> Self {
        Self::Component(Some(id))
    }

    #[must_use]
    pub fn node(id: NodeId) -> Self {
        Self::Node(Some(id))
    }

    #[must_use]
    pub fn components(ids: impl IntoIterator<Item = ComponentId>) -> Self {
        Self::List(ids.into_iter().map(Self::component).collect())
    }

    #[must_use]
    pub fn nodes(ids: impl IntoIterator<Item = NodeId>) -> Self {
        Self::List(ids.into_iter().map(Self::node).collect())
    }
}

fn mismatch(field: &str, expected: &'static str, found: &Value) -> FieldError {
    FieldError::TypeMismatch {
        field: field.to_string(),
        expected,
        found: found.type_name(),
    }
}

/// Typed read access over a set of [`Fields`].
pub trait FieldAccess {
    fn fields(&self) -> &Fields;

    fn field(&self, name: &str) -> Option<&Value> {
        self.fields().get(name)
    }

    /// Read a boolean field.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::TypeMismatch`] if the field is not a bool.
    fn bool_field(&self, name: &str) -> Result<Option<bool>, FieldError> {
        match self.field(name) {
            None => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(other) => Err(mismatch(name, "bool", other)),
        }
    }

    /// Read a string or enum field.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::TypeMismatch`] for any other value type.
    fn str_field(&self, name: &str) -> Result<Option<&str>, FieldError> {
        match self.field(name) {
            None => Ok(None),
            Some(Value::Str(s) | Value::Enum(s)) => Ok(Some(s.as_str())),
            Some(other) => Err(mismatch(name, "string", other)),
        }
    }

    /// Read a single component reference. Null references read as `None`.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::TypeMismatch`] if the field is not a component
    /// reference.
    fn component_ref(&self, name: &str) -> Result<Option<ComponentId>, FieldError> {
        match self.field(name) {
            None => Ok(None),
            Some(Value::Component(id)) => Ok(*id),
            Some(other) => Err(mismatch(name, "component reference", other)),
        }
    }

    /// Read a single node reference. Null references read as `None`.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::TypeMismatch`] if the field is not a node
    /// reference.
    fn node_ref(&self, name: &str) -> Result<Option<NodeId>, FieldError> {
        match self.field(name) {
            None => Ok(None),
            Some(Value::Node(id)) => Ok(*id),
            Some(other) => Err(mismatch(name, "node reference", other)),
        }
    }

    /// Read a list of component references, skipping null entries.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::TypeMismatch`] if the field is not a list or an
    /// entry is not a component reference.
    fn component_list(&self, name: &str) -> Result<Vec<ComponentId>, FieldError> {
        let mut out = Vec::new();
        for item in self.list_field(name)? {
            match item {
                Value::Component(id) => out.extend(*id),
                other => return Err(mismatch(name, "component reference", other)),
            }
        }
        Ok(out)
    }

    /// Read a list of node references, skipping null entries.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::TypeMismatch`] if the field is not a list or an
    /// entry is not a node reference.
    fn node_list(&self, name: &str) -> Result<Vec<NodeId>, FieldError> {
        let mut out = Vec::new();
        for item in self.list_field(name)? {
            match item {
                Value::Node(id) => out.extend(*id),
                other => return Err(mismatch(name, "node reference", other)),
            }
        }
        Ok(out)
    }

    /// Read a nested struct field.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::TypeMismatch`] if the field is not a struct.
    fn struct_field(&self, name: &str) -> Result<Option<&Fields>, FieldError> {
        match self.field(name) {
            None => Ok(None),
            Some(Value::Struct(fields)) => Ok(Some(fields)),
            Some(other) => Err(mismatch(name, "struct", other)),
        }
    }

    /// Read a list of structs.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::TypeMismatch`] if the field is not a list of
    /// structs.
    fn struct_list(&self, name: &str) -> Result<Vec<&Fields>, FieldError> {
        self.list_field(name)?
            .iter()
            .map(|item| match item {
                Value::Struct(fields) => Ok(fields),
                other => Err(mismatch(name, "struct", other)),
            })
            .collect()
    }

    /// Read a raw list; absent lists read as empty.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::TypeMismatch`] if the field is not a list.
    fn list_field(&self, name: &str) -> Result<&[Value], FieldError> {
        match self.field(name) {
            None => Ok(&[]),
            Some(Value::List(items)) => Ok(items),
            Some(other) => Err(mismatch(name, "list", other)),
        }
    }
}

impl FieldAccess for Fields {
    fn fields(&self) -> &Fields {
        self
    }
}
