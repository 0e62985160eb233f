//! Named models from `components.schemas`.

use openapi_factory_document::{MappingNode, Result};
use openapi_factory_ir::{
    AllOfModel, ArrayModel, Discriminator, EnumModel, GenericModel, Model, OneOfModel, OpenapiSpec,
    SchemaRef,
};
use tracing::{debug, warn};

use crate::schema::{self, Declared};

/// Keys an `allOf` member may carry without contributing anything.
const INERT_MEMBER_KEYS: &[&str] = &["type", "title", "description"];

/// Build every entry of `components.schemas` into `spec`.
pub(crate) fn build_models(schemas: &MappingNode<'_>, spec: &mut OpenapiSpec) -> Result<()> {
    let file = schemas.relative_filename();
    for (name, node) in schemas.mapping_entries()? {
        let model = build_model(&name, &node, spec)?;
        debug!(model = %name, kind = %model.kind(), file, "built model");
        spec.add_model(file, model)?;
    }
    Ok(())
}

/// Dispatch on the shape of a named schema.
fn build_model(name: &str, node: &MappingNode<'_>, spec: &mut OpenapiSpec) -> Result<Model> {
    node.ignore(&["title", "example", "examples", "externalDocs", "xml", "deprecated"]);
    let description = node.string("description")?.optional();

    let model = if node.contains_key("properties") {
        node.ignore(&["type", "additionalProperties"]);
        let required = schema::required_list(node)?;
        let mut generic = GenericModel::new(name);
        for property in schema::build_properties(node, &required, Declared::model(name), spec)? {
            generic.insert(property);
        }
        generic.description = description;
        Model::Generic(generic)
    } else if node.contains_key("enum") {
        let values = node.sequence_node("enum")?.required()?.string_list()?;
        if values.is_empty() {
            return Err(node.invalid_value_at("enum", "enum must list at least one value"));
        }
        Model::Enum(EnumModel {
            name: name.to_string(),
            description,
            value_type: node.string("type")?.unwrap_or_else(|| "string".to_string()),
            values,
        })
    } else if node.contains_key("allOf") {
        let mut all_of = build_all_of(name, node, spec)?;
        all_of.description = description;
        Model::AllOf(all_of)
    } else if node.contains_key("oneOf") {
        let mut one_of = build_one_of(name, node, spec)?;
        one_of.description = description;
        Model::OneOf(one_of)
    } else if node.string("type")?.optional().as_deref() == Some("array") {
        Model::Array(ArrayModel {
            name: name.to_string(),
            description,
            array: schema::array_schema(node, Declared::model(name), spec)?,
        })
    } else {
        return Err(node.unsupported(format!(
            "schema '{name}' (expected properties, enum, allOf, oneOf or type: array)"
        )));
    };
    Ok(model)
}

fn build_all_of(name: &str, node: &MappingNode<'_>, spec: &mut OpenapiSpec) -> Result<AllOfModel> {
    node.ignore(&["type"]);
    let mut all_of = AllOfModel::new(name);
    all_of.required = schema::required_list(node)?;

    let members = node.sequence_node("allOf")?.required()?;
    for member in members.mapping_nodes()? {
        if member.contains_key("$ref") {
            all_of.supers.push(schema::reference(&member, spec)?);
        } else if member.contains_key("properties") {
            member.ignore(&["type", "title", "description", "additionalProperties"]);
            let object = schema::build_object(&member, Declared::model(name), spec)?;
            // names required here but declared elsewhere are inherited
            for required in schema::required_list(&member)? {
                if object.property(&required).is_none() && !all_of.required.contains(&required) {
                    all_of.required.push(required);
                }
            }
            all_of.inline_supers.push(object);
        } else if member.contains_key("required") {
            member.ignore(INERT_MEMBER_KEYS);
            for required in schema::required_list(&member)? {
                if !all_of.required.contains(&required) {
                    all_of.required.push(required);
                }
            }
        } else if member.key_set().iter().all(|key| INERT_MEMBER_KEYS.contains(&key.as_str())) {
            member.ignore(INERT_MEMBER_KEYS);
            warn!(model = name, member = %member.location(), "ignoring allOf member without properties");
        } else {
            return Err(member.unsupported(format!(
                "allOf member of '{name}' (expected $ref, properties or required)"
            )));
        }
    }
    // a name required by any member is required where it is declared inline
    for inline in &mut all_of.inline_supers {
        for property in inline.properties.values_mut() {
            if all_of.required.contains(&property.name) {
                property.required = true;
            }
        }
    }
    Ok(all_of)
}

fn build_one_of(name: &str, node: &MappingNode<'_>, spec: &mut OpenapiSpec) -> Result<OneOfModel> {
    node.ignore(&["type"]);
    let mut one_of = OneOfModel::new(name);

    let members = node.sequence_node("oneOf")?.required()?;
    for member in members.mapping_nodes()? {
        if !member.contains_key("$ref") {
            return Err(member.unsupported(format!(
                "inline oneOf member of '{name}' (declare it under components.schemas)"
            )));
        }
        one_of.members.push(schema::reference(&member, spec)?);
    }

    if let Some(discriminator) = node.mapping_node("discriminator")?.optional() {
        one_of.discriminator = build_discriminator(&discriminator, spec)?;
    }
    Ok(one_of)
}

fn build_discriminator(node: &MappingNode<'_>, spec: &mut OpenapiSpec) -> Result<Discriminator> {
    let mut discriminator = Discriminator {
        property_name: node.string("propertyName")?.optional(),
        ..Default::default()
    };
    if let Some(mapping) = node.mapping_node("mapping")?.optional() {
        for value in mapping.key_set() {
            let raw = mapping.string(&value)?.required()?;
            let reference = SchemaRef::parse(&raw, mapping.relative_filename())
                .map_err(|_| mapping.invalid_reference_at(&value, raw))?;
            spec.add_reference(&reference);
            discriminator.mapping.insert(value, reference);
        }
    }
    Ok(discriminator)
}

#[cfg(test)]
mod tests {
    use openapi_factory_document::{Document, ErrorKind};
    use openapi_factory_ir::{ModelKind, Schema};

    use super::*;

    fn build(yaml: &str) -> Result<OpenapiSpec> {
        let document = Document::parse(yaml, "api.yaml")?;
        let mut spec = OpenapiSpec::new("api.yaml");
        build_models(&document.root()?, &mut spec)?;
        Ok(spec)
    }

    #[test]
    fn test_generic_model() {
        let spec = build(
            r#"
Pet:
  type: object
  description: A pet
  required: [id]
  properties:
    id:
      type: string
      readOnly: true
    name:
      type: string
"#,
        )
        .unwrap();
        let pet = spec.model_named("Pet").unwrap().as_generic().unwrap();
        assert_eq!(pet.description.as_deref(), Some("A pet"));
        let id = pet.property("id").unwrap();
        assert!(id.required && id.read_only);
        assert_eq!(id.owner.as_deref(), Some("Pet"));
        assert!(!pet.property("name").unwrap().required);
    }

    #[test]
    fn test_enum_model() {
        let spec = build("Status:\n  type: string\n  enum: [active, inactive]\n").unwrap();
        let status = spec.model_named("Status").unwrap().as_enum().unwrap();
        assert_eq!(status.value_type, "string");
        assert_eq!(status.values, vec!["active", "inactive"]);
    }

    #[test]
    fn test_array_model() {
        let spec = build("Pets:\n  type: array\n  items:\n    $ref: '#/components/schemas/Pet'\n").unwrap();
        let pets = spec.model_named("Pets").unwrap().as_array().unwrap();
        assert!(matches!(*pets.array.items, Schema::Ref(_)));
        assert_eq!(spec.unresolved_references(), vec!["api.yaml#/components/schemas/Pet"]);
    }

    #[test]
    fn test_all_of_members() {
        let spec = build(
            r#"
Note:
  allOf:
    - $ref: '#/components/schemas/Entity'
    - $ref: '#/components/schemas/Timestamps'
    - type: object
      required: [notes, id]
      properties:
        notes:
          type: string
    - required: [created]
    - description: nothing to see here
"#,
        )
        .unwrap();
        let note = spec.model_named("Note").unwrap().as_all_of().unwrap();
        let supers: Vec<_> = note.supers.iter().map(|s| s.class_name()).collect();
        assert_eq!(supers, vec!["Entity", "Timestamps"]);
        assert_eq!(note.inline_supers.len(), 1);
        assert!(note.inline_supers[0].property("notes").unwrap().required);
        assert_eq!(note.required, vec!["id", "created"]);
    }

    #[test]
    fn test_all_of_member_with_other_shape_is_unsupported() {
        let error = build("Note:\n  allOf:\n    - type: string\n      enum: [a]\n").unwrap_err();
        assert_eq!(error.kind(), ErrorKind::UnsupportedShape);
    }

    #[test]
    fn test_one_of_with_discriminator() {
        let spec = build(
            r#"
Pet:
  oneOf:
    - $ref: '#/components/schemas/Cat'
    - $ref: '#/components/schemas/Dog'
  discriminator:
    propertyName: petType
    mapping:
      cat: '#/components/schemas/Cat'
"#,
        )
        .unwrap();
        let pet = spec.model_named("Pet").unwrap().as_one_of().unwrap();
        assert_eq!(pet.members.len(), 2);
        assert_eq!(pet.discriminator.property_name.as_deref(), Some("petType"));
        let mapping: Vec<_> = pet.discriminator.mapping.keys().map(String::as_str).collect();
        assert_eq!(mapping, vec!["cat"]);
    }

    #[test]
    fn test_inline_one_of_member_is_unsupported() {
        let error = build("Pet:\n  oneOf:\n    - type: object\n      properties: {}\n").unwrap_err();
        assert_eq!(error.kind(), ErrorKind::UnsupportedShape);
    }

    #[test]
    fn test_unrecognized_shape_names_the_schema() {
        let error = build("Pets:\n  type: object\n  additionalProperties:\n    type: string\n").unwrap_err();
        insta::assert_snapshot!(error.to_string(), @"unsupported schema 'Pets' (expected properties, enum, allOf, oneOf or type: array) at api.yaml#/Pets (api.yaml:1)");
    }

    #[test]
    fn test_models_keep_declaration_and_sort_by_name() {
        let spec = build(
            "Zebra:\n  properties: {}\nApple:\n  enum: [a, b]\nMango:\n  oneOf:\n    - $ref: '#/components/schemas/Apple'\n",
        )
        .unwrap();
        let declared: Vec<_> = spec.declared_models().map(|(_, m)| m.name()).collect();
        assert_eq!(declared, vec!["Zebra", "Apple", "Mango"]);
        assert_eq!(spec.model_names(), vec!["Apple", "Mango", "Zebra"]);
        assert_eq!(spec.model_named("Zebra").unwrap().kind(), ModelKind::Generic);
    }
}
