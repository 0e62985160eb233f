//! Unnamed schemas: the shapes a property, parameter or body can take.

use indexmap::IndexMap;
use serde::Serialize;

use crate::{naming::to_pascal_case, reference::SchemaRef};

/// Longest array with `minItems == maxItems` still treated as a tuple.
pub const MAX_TUPLE_LENGTH: u64 = 8;

/// An unnamed schema.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Schema {
    /// `type` plus optional `format`.
    Primitive(PrimitiveSchema),
    Array(ArraySchema),
    /// A map with string keys (`additionalProperties`).
    Record(RecordSchema),
    /// A single-value `enum`.
    Constant(ConstantSchema),
    /// A multi-value `enum` declared inline.
    EmbeddedEnum(EmbeddedEnum),
    /// Inline `properties` with no name.
    Object(ObjectSchema),
    /// A `$ref` to a named model, resolved on access.
    Ref(SchemaRef),
}

impl Schema {
    pub fn primitive(type_name: impl Into<String>, format: Option<String>) -> Self {
        Schema::Primitive(PrimitiveSchema {
            type_name: type_name.into(),
            format,
        })
    }

    /// The reference, if this schema is one.
    pub fn as_reference(&self) -> Option<&SchemaRef> {
        match self {
            Schema::Ref(reference) => Some(reference),
            _ => None,
        }
    }

    /// True for strings formatted as `date` or `date-time`, also inside arrays.
    pub fn is_date(&self) -> bool {
        match self {
            Schema::Primitive(primitive) => primitive.is_date(),
            Schema::Array(array) => array.items.is_date(),
            _ => false,
        }
    }

    /// Every reference reachable without resolving one.
    pub fn references(&self) -> Vec<&SchemaRef> {
        match self {
            Schema::Ref(reference) => vec![reference],
            Schema::Array(array) => array.items.references(),
            Schema::Record(record) => record.values.references(),
            Schema::Object(object) => object
                .properties
                .values()
                .flat_map(|property| property.schema.references())
                .collect(),
            Schema::Primitive(_) | Schema::Constant(_) | Schema::EmbeddedEnum(_) => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrimitiveSchema {
    #[serde(rename = "type")]
    pub type_name: String,
    pub format: Option<String>,
}

impl PrimitiveSchema {
    pub fn is_date(&self) -> bool {
        self.type_name == "string" && matches!(self.format.as_deref(), Some("date" | "date-time"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArraySchema {
    pub items: Box<Schema>,
    pub unique_items: bool,
    pub min_items: Option<u64>,
    pub max_items: Option<u64>,
}

impl ArraySchema {
    pub fn new(items: Schema) -> Self {
        Self {
            items: Box::new(items),
            unique_items: false,
            min_items: None,
            max_items: None,
        }
    }

    /// Length of a fixed-size tuple: `minItems == maxItems`, at most
    /// [`MAX_TUPLE_LENGTH`].
    pub fn tuple_length(&self) -> Option<u64> {
        match (self.min_items, self.max_items) {
            (Some(min), Some(max)) if min == max && max <= MAX_TUPLE_LENGTH => Some(max),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordSchema {
    pub values: Box<Schema>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConstantSchema {
    pub value: String,
}

/// An anonymous enum, remembered together with where it was declared so an
/// emitter can give it a name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmbeddedEnum {
    /// Primitive type of the values (`string` unless declared).
    pub value_type: String,
    pub values: Vec<String>,
    pub description: Option<String>,
    pub declared_model: Option<String>,
    pub declared_property: Option<String>,
}

impl EmbeddedEnum {
    /// `<Model><Property>Enum`, or a literal union such as `"a" | "b"` when
    /// the enum is not declared on a model property.
    pub fn type_name(&self) -> String {
        match (&self.declared_model, &self.declared_property) {
            (Some(model), Some(property)) => {
                format!("{}{}Enum", to_pascal_case(model), to_pascal_case(property))
            }
            _ => self
                .values
                .iter()
                .map(|value| format!("\"{value}\""))
                .collect::<Vec<_>>()
                .join(" | "),
        }
    }
}

/// Inline properties without a model name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ObjectSchema {
    pub properties: IndexMap<String, Property>,
}

impl ObjectSchema {
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.get(name)
    }

    /// Add a property, replacing any earlier one with the same name.
    pub fn insert(&mut self, property: Property) {
        self.properties.insert(property.name.clone(), property);
    }
}

/// A named member of a model or inline object.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Property {
    pub name: String,
    pub description: Option<String>,
    pub example: Option<serde_json::Value>,
    pub required: bool,
    pub read_only: bool,
    pub write_only: bool,
    pub nullable: bool,
    /// Name of the model that declares the property.
    pub owner: Option<String>,
    pub schema: Schema,
}

impl Property {
    pub fn new(name: impl Into<String>, schema: Schema) -> Self {
        Self {
            name: name.into(),
            description: None,
            example: None,
            required: false,
            read_only: false,
            write_only: false,
            nullable: false,
            owner: None,
            schema,
        }
    }

    /// A copy with the required flag overridden.
    pub fn with_required(&self, required: bool) -> Self {
        Self {
            required,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn string() -> Schema {
        Schema::primitive("string", None)
    }

    #[test]
    fn test_tuple_length() {
        let mut array = ArraySchema::new(string());
        assert_eq!(array.tuple_length(), None);
        array.min_items = Some(2);
        array.max_items = Some(2);
        assert_eq!(array.tuple_length(), Some(2));
        array.max_items = Some(3);
        assert_eq!(array.tuple_length(), None);
        array.min_items = Some(9);
        array.max_items = Some(9);
        assert_eq!(array.tuple_length(), None);
    }

    #[test]
    fn test_is_date() {
        assert!(Schema::primitive("string", Some("date".into())).is_date());
        assert!(Schema::primitive("string", Some("date-time".into())).is_date());
        assert!(!Schema::primitive("string", Some("uuid".into())).is_date());
        assert!(!Schema::primitive("integer", Some("date".into())).is_date());
        let dates = Schema::Array(ArraySchema::new(Schema::primitive("string", Some("date".into()))));
        assert!(dates.is_date());
    }

    #[test]
    fn test_embedded_enum_type_name() {
        let mut embedded = EmbeddedEnum {
            value_type: "string".into(),
            values: vec!["available".into(), "sold".into()],
            description: None,
            declared_model: Some("Pet".into()),
            declared_property: Some("sale_status".into()),
        };
        assert_eq!(embedded.type_name(), "PetSaleStatusEnum");
        embedded.declared_model = None;
        assert_eq!(embedded.type_name(), "\"available\" | \"sold\"");
    }

    #[test]
    fn test_with_required_copies() {
        let property = Property::new("id", string());
        let required = property.with_required(true);
        assert!(required.required);
        assert!(!property.required);
        assert_eq!(required.schema, property.schema);
    }

    #[test]
    fn test_references_walks_inline_shapes() {
        let pet = SchemaRef::to_model("api.yaml", "Pet");
        let mut object = ObjectSchema::default();
        object.insert(Property::new(
            "pets",
            Schema::Array(ArraySchema::new(Schema::Ref(pet.clone()))),
        ));
        object.insert(Property::new("name", string()));
        assert_eq!(Schema::Object(object).references(), vec![&pet]);
    }
}
