//! Unnamed schemas: properties, items, parameter and body schemas.

use openapi_factory_document::{MappingNode, NodeKind, Result};
use openapi_factory_ir::{
    ArraySchema, ConstantSchema, EmbeddedEnum, ObjectSchema, OpenapiSpec, Property, RecordSchema,
    ReferenceProblem, SCHEMAS_ANCHOR, Schema, SchemaRef,
};

/// Keywords that never change the shape of a schema.
const ANNOTATIONS: &[&str] = &[
    "title",
    "description",
    "default",
    "example",
    "examples",
    "deprecated",
    "externalDocs",
    "xml",
    "pattern",
    "minimum",
    "maximum",
    "exclusiveMinimum",
    "exclusiveMaximum",
    "multipleOf",
    "minLength",
    "maxLength",
    "minProperties",
    "maxProperties",
    "readOnly",
    "writeOnly",
    "nullable",
];

/// Composition keywords only accepted on named models.
const COMPOSITIONS: &[&str] = &["allOf", "oneOf", "anyOf", "not"];

/// Where an inline schema is declared. Embedded enums are named after it.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Declared<'n> {
    pub model: Option<&'n str>,
    pub property: Option<&'n str>,
}

impl<'n> Declared<'n> {
    pub fn model(model: &'n str) -> Self {
        Self {
            model: Some(model),
            property: None,
        }
    }

    pub fn property(self, property: &'n str) -> Self {
        Self {
            property: Some(property),
            ..self
        }
    }
}

/// Parse the `$ref` under `node` and record it on the spec.
pub(crate) fn reference(node: &MappingNode<'_>, spec: &mut OpenapiSpec) -> Result<SchemaRef> {
    let raw = node.string("$ref")?.required()?;
    let reference = match SchemaRef::parse(&raw, node.relative_filename()) {
        Ok(reference) => reference,
        Err(ReferenceProblem::Malformed) => return Err(node.invalid_reference_at("$ref", raw)),
        Err(ReferenceProblem::NotASchema) => {
            return Err(node.unsupported_at(
                "$ref",
                format!("reference '{raw}' (only '{SCHEMAS_ANCHOR}<Name>' targets are modeled)"),
            ));
        }
    };
    // siblings of a reference carry no meaning
    node.ignore(&["description", "summary"]);
    spec.add_reference(&reference);
    Ok(reference)
}

/// Build the schema of `node`.
///
/// Shapes are tried in order: `$ref`, single-value `enum`, `enum`,
/// `properties`, `additionalProperties`, `type: array`, then a primitive
/// `type` with its optional `format`.
pub(crate) fn build_schema(
    node: &MappingNode<'_>,
    declared: Declared<'_>,
    spec: &mut OpenapiSpec,
) -> Result<Schema> {
    if node.contains_key("$ref") {
        return reference(node, spec).map(Schema::Ref);
    }
    if let Some(keyword) = COMPOSITIONS.iter().find(|keyword| node.contains_key(keyword)) {
        return Err(node.unsupported_at(
            keyword,
            format!("inline {keyword} (declare the schema under components.schemas)"),
        ));
    }
    node.ignore(ANNOTATIONS);

    if let Some(values) = node.sequence_node("enum")?.optional() {
        let values = values.string_list()?;
        let value_type = node.string("type")?.unwrap_or_else(|| "string".to_string());
        return match values.as_slice() {
            [] => Err(node.invalid_value_at("enum", "enum must list at least one value")),
            [value] => Ok(Schema::Constant(ConstantSchema {
                value: value.clone(),
            })),
            _ => Ok(Schema::EmbeddedEnum(EmbeddedEnum {
                value_type,
                values,
                description: node.string("description")?.optional(),
                declared_model: declared.model.map(str::to_string),
                declared_property: declared.property.map(str::to_string),
            })),
        };
    }

    if node.contains_key("properties") {
        node.ignore(&["type", "additionalProperties"]);
        return build_object(node, declared, spec).map(Schema::Object);
    }

    if let Some(values) = additional_properties(node, declared, spec)? {
        node.ignore(&["type"]);
        return Ok(Schema::Record(RecordSchema {
            values: Box::new(values),
        }));
    }

    let type_name = node.string("type")?.required()?;
    if type_name == "array" {
        return array_schema(node, declared, spec).map(Schema::Array);
    }
    Ok(Schema::primitive(type_name, node.string("format")?.optional()))
}

/// Values of a map schema. A free-form `additionalProperties: true` or `{}`
/// gives values of type `object`; `false` is no map at all.
fn additional_properties(
    node: &MappingNode<'_>,
    declared: Declared<'_>,
    spec: &mut OpenapiSpec,
) -> Result<Option<Schema>> {
    match node.kind_of("additionalProperties") {
        Some(NodeKind::Mapping) => {
            let values = node.mapping_node("additionalProperties")?.required()?;
            if values.is_empty() {
                Ok(Some(Schema::primitive("object", None)))
            } else {
                build_schema(&values, declared, spec).map(Some)
            }
        }
        Some(NodeKind::Null) | None => Ok(None),
        Some(_) => {
            let free_form = node.boolean("additionalProperties")?.unwrap_or(false);
            Ok(free_form.then(|| Schema::primitive("object", None)))
        }
    }
}

/// `type: array` with its `items` and size hints.
pub(crate) fn array_schema(
    node: &MappingNode<'_>,
    declared: Declared<'_>,
    spec: &mut OpenapiSpec,
) -> Result<ArraySchema> {
    let items = node.mapping_node("items")?.required()?;
    Ok(ArraySchema {
        items: Box::new(build_schema(&items, declared, spec)?),
        unique_items: node.boolean("uniqueItems")?.unwrap_or(false),
        min_items: node.number("minItems")?.optional(),
        max_items: node.number("maxItems")?.optional(),
    })
}

/// Inline `properties` together with their `required` list.
pub(crate) fn build_object(
    node: &MappingNode<'_>,
    declared: Declared<'_>,
    spec: &mut OpenapiSpec,
) -> Result<ObjectSchema> {
    let required = required_list(node)?;
    let mut object = ObjectSchema::default();
    for property in build_properties(node, &required, declared, spec)? {
        object.insert(property);
    }
    Ok(object)
}

/// The `required` list of a schema, empty when absent.
pub(crate) fn required_list(node: &MappingNode<'_>) -> Result<Vec<String>> {
    match node.sequence_node("required")?.optional() {
        Some(required) => required.string_list(),
        None => Ok(Vec::new()),
    }
}

/// Every entry of `properties`, in declaration order.
pub(crate) fn build_properties(
    node: &MappingNode<'_>,
    required: &[String],
    declared: Declared<'_>,
    spec: &mut OpenapiSpec,
) -> Result<Vec<Property>> {
    let Some(properties) = node.mapping_node("properties")?.optional() else {
        return Ok(Vec::new());
    };
    properties
        .mapping_entries()?
        .into_iter()
        .map(|(name, property)| {
            let is_required = required.contains(&name);
            build_property(&name, &property, is_required, declared.property(&name), spec)
        })
        .collect()
}

fn build_property(
    name: &str,
    node: &MappingNode<'_>,
    required: bool,
    declared: Declared<'_>,
    spec: &mut OpenapiSpec,
) -> Result<Property> {
    Ok(Property {
        name: name.to_string(),
        description: node.string("description")?.optional(),
        example: node.value("example")?.optional(),
        required,
        read_only: node.boolean("readOnly")?.unwrap_or(false),
        write_only: node.boolean("writeOnly")?.unwrap_or(false),
        nullable: node.boolean("nullable")?.unwrap_or(false),
        owner: declared.model.map(str::to_string),
        schema: build_schema(node, declared, spec)?,
    })
}
