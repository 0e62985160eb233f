//! Named models declared under `components.schemas`.

use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;

use crate::{
    reference::SchemaRef,
    schema::{ArraySchema, ObjectSchema, Property},
};

/// Index of a model in the [`OpenapiSpec`](crate::OpenapiSpec) arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ModelId(pub(crate) usize);

impl ModelId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Which kind of model a [`Model`] is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelKind {
    Generic,
    Enum,
    OneOf,
    AllOf,
    Array,
}

impl ModelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::Generic => "generic",
            ModelKind::Enum => "enum",
            ModelKind::OneOf => "oneOf",
            ModelKind::AllOf => "allOf",
            ModelKind::Array => "array",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named model.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Model {
    /// An object with declared properties.
    Generic(GenericModel),
    Enum(EnumModel),
    /// A tagged union of referenced models.
    OneOf(OneOfModel),
    /// Inheritance from referenced and inline super schemas.
    AllOf(AllOfModel),
    /// A top-level schema that is itself an array.
    Array(ArrayModel),
}

impl Model {
    pub fn name(&self) -> &str {
        match self {
            Model::Generic(model) => &model.name,
            Model::Enum(model) => &model.name,
            Model::OneOf(model) => &model.name,
            Model::AllOf(model) => &model.name,
            Model::Array(model) => &model.name,
        }
    }

    pub fn description(&self) -> Option<&str> {
        match self {
            Model::Generic(model) => model.description.as_deref(),
            Model::Enum(model) => model.description.as_deref(),
            Model::OneOf(model) => model.description.as_deref(),
            Model::AllOf(model) => model.description.as_deref(),
            Model::Array(model) => model.description.as_deref(),
        }
    }

    pub fn kind(&self) -> ModelKind {
        match self {
            Model::Generic(_) => ModelKind::Generic,
            Model::Enum(_) => ModelKind::Enum,
            Model::OneOf(_) => ModelKind::OneOf,
            Model::AllOf(_) => ModelKind::AllOf,
            Model::Array(_) => ModelKind::Array,
        }
    }

    pub fn as_generic(&self) -> Option<&GenericModel> {
        match self {
            Model::Generic(model) => Some(model),
            _ => None,
        }
    }

    pub fn as_enum(&self) -> Option<&EnumModel> {
        match self {
            Model::Enum(model) => Some(model),
            _ => None,
        }
    }

    pub fn as_one_of(&self) -> Option<&OneOfModel> {
        match self {
            Model::OneOf(model) => Some(model),
            _ => None,
        }
    }

    pub fn as_all_of(&self) -> Option<&AllOfModel> {
        match self {
            Model::AllOf(model) => Some(model),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&ArrayModel> {
        match self {
            Model::Array(model) => Some(model),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenericModel {
    pub name: String,
    pub description: Option<String>,
    pub properties: IndexMap<String, Property>,
}

impl GenericModel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            properties: IndexMap::new(),
        }
    }

    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.get(name)
    }

    /// Add a property owned by this model.
    pub fn insert(&mut self, mut property: Property) {
        property.owner = Some(self.name.clone());
        self.properties.insert(property.name.clone(), property);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnumModel {
    pub name: String,
    pub description: Option<String>,
    /// Primitive type of the values (`string` unless declared).
    pub value_type: String,
    pub values: Vec<String>,
}

/// `propertyName` plus the explicit value-to-model mapping, both optional in
/// the document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Discriminator {
    pub property_name: Option<String>,
    pub mapping: IndexMap<String, SchemaRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OneOfModel {
    pub name: String,
    pub description: Option<String>,
    pub members: Vec<SchemaRef>,
    pub discriminator: Discriminator,
}

impl OneOfModel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            members: Vec::new(),
            discriminator: Discriminator::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllOfModel {
    pub name: String,
    pub description: Option<String>,
    /// The model-level `required` list, including lists from inline members
    /// that only carry `required`.
    pub required: Vec<String>,
    /// Referenced super models, in declaration order.
    pub supers: Vec<SchemaRef>,
    /// Inline members with `properties`, in declaration order.
    pub inline_supers: Vec<ObjectSchema>,
}

impl AllOfModel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            required: Vec::new(),
            supers: Vec::new(),
            inline_supers: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArrayModel {
    pub name: String,
    pub description: Option<String>,
    pub array: ArraySchema,
}
