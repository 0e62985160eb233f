//! Operations from `paths`.

use indexmap::IndexMap;
use openapi_factory_document::{MappingNode, Result, Variants};
use openapi_factory_ir::{
    Content, GenericModel, HttpMethod, Model, ObjectSchema, OpenapiSpec, Operation, Parameter,
    ParameterLocation, ParameterStyle, Response, Schema, SchemaRef, SecurityRequirement, StatusCode,
    to_pascal_case,
};
use tracing::{debug, warn};

use crate::{
    schema::{self, Declared},
    security,
};

/// Keys of a path item that are not operations.
const PATH_ITEM_KEYS: &[&str] = &["parameters", "summary", "description", "servers"];

/// Settings shared by every operation of a document.
#[derive(Debug, Clone)]
pub(crate) struct OperationDefaults<'o> {
    /// Tag for operations without `tags`.
    pub tag: &'o str,
    /// Root-level `security`, used by operations without their own.
    pub security: Vec<SecurityRequirement>,
}

/// Operation id derived from the path template and method:
/// `/pets/{id}` with `get` gives `PetsIdGet`.
pub fn derive_operation_id(path: &str, method: HttpMethod) -> String {
    let mut id: String = path
        .split('/')
        .map(|segment| to_pascal_case(&segment.replace(['{', '}'], "")))
        .collect();
    id.push_str(&to_pascal_case(method.as_str()));
    id
}

pub(crate) fn build_paths(
    paths: &MappingNode<'_>,
    defaults: &OperationDefaults<'_>,
    spec: &mut OpenapiSpec,
) -> Result<()> {
    for (template, item) in paths.mapping_entries()? {
        item.ignore(&["summary", "description", "servers"]);
        let common = match item.sequence_node("parameters")?.optional() {
            Some(parameters) => build_parameters(&parameters.mapping_nodes()?, None, spec)?,
            None => Vec::new(),
        };

        for key in item.key_set() {
            if PATH_ITEM_KEYS.contains(&key.as_str()) || key.starts_with("x-") {
                continue;
            }
            let Some(method) = HttpMethod::from_variant(&key) else {
                return Err(item.unsupported_at(&key, format!("path item key '{key}'")));
            };
            let node = item.mapping_node(&key)?.required()?;
            let operation = build_operation(&template, method, &node, &common, defaults, spec)?;
            debug!(
                method = %operation.method,
                path = %operation.path,
                operation_id = %operation.operation_id,
                "built operation"
            );
            spec.add_operation(operation)?;
        }
    }
    Ok(())
}

fn build_operation(
    template: &str,
    method: HttpMethod,
    node: &MappingNode<'_>,
    common: &[Parameter],
    defaults: &OperationDefaults<'_>,
    spec: &mut OpenapiSpec,
) -> Result<Operation> {
    node.ignore(&["deprecated", "externalDocs", "servers", "callbacks"]);
    let operation_id = node
        .string("operationId")?
        .unwrap_or_else(|| derive_operation_id(template, method));
    let mut operation = Operation::new(method, template, operation_id);
    operation.summary = node.string("summary")?.optional();
    operation.description = node.string("description")?.optional();
    operation.tags = build_tags(node, defaults.tag)?;

    let type_name = to_pascal_case(&operation.operation_id);
    operation.parameters = common.to_vec();
    if let Some(parameters) = node.sequence_node("parameters")?.optional() {
        for parameter in build_parameters(&parameters.mapping_nodes()?, Some(type_name.as_str()), spec)? {
            let existing = operation
                .parameters
                .iter_mut()
                .find(|p| p.name == parameter.name && p.location == parameter.location);
            match existing {
                Some(existing) => *existing = parameter,
                None => operation.parameters.push(parameter),
            }
        }
    }

    if let Some(body) = node.mapping_node("requestBody")?.optional() {
        operation.request_bodies = build_request_body(&body, &type_name, spec)?;
    }
    if let Some(responses) = node.mapping_node("responses")?.optional() {
        operation.responses = build_responses(&responses, &type_name, spec)?;
    }

    operation.security = match node.sequence_node("security")?.optional() {
        Some(requirements) => security::build_requirements(&requirements)?,
        None => defaults.security.clone(),
    };
    Ok(operation)
}

fn build_tags(node: &MappingNode<'_>, default_tag: &str) -> Result<Vec<String>> {
    let declared = match node.sequence_node("tags")?.optional() {
        Some(tags) => tags.string_list()?,
        None => Vec::new(),
    };
    if declared.is_empty() {
        return Ok(vec![default_tag.to_string()]);
    }
    let mut tags: Vec<String> = Vec::with_capacity(declared.len());
    for tag in declared {
        if tags.contains(&tag) {
            warn!(tag = %tag, operation = %node.location(), "duplicate tag on operation");
        } else {
            tags.push(tag);
        }
    }
    Ok(tags)
}

/// `type_name` names embedded enums of operation parameters; path-level
/// parameters have none.
fn build_parameters(
    nodes: &[MappingNode<'_>],
    type_name: Option<&str>,
    spec: &mut OpenapiSpec,
) -> Result<Vec<Parameter>> {
    nodes
        .iter()
        .map(|node| build_parameter(node, type_name, spec))
        .collect()
}

fn build_parameter(node: &MappingNode<'_>, type_name: Option<&str>, spec: &mut OpenapiSpec) -> Result<Parameter> {
    if node.contains_key("$ref") {
        return Err(node.unsupported_at("$ref", "parameter reference (components.parameters is not modeled)"));
    }
    if node.contains_key("content") && !node.contains_key("schema") {
        return Err(node.unsupported_at("content", "parameter content (use schema instead)"));
    }
    node.ignore(&["example", "examples", "deprecated", "allowEmptyValue", "allowReserved"]);

    let name = node.string("name")?.required()?;
    let location = node.enumeration::<ParameterLocation>("in")?.required()?;
    let declared = Declared {
        model: type_name,
        property: Some(name.as_str()),
    };
    let schema_node = node.mapping_node("schema")?.required()?;
    let mut parameter = Parameter::new(
        name.clone(),
        location,
        schema::build_schema(&schema_node, declared, spec)?,
    );
    parameter.description = node.string("description")?.optional();
    parameter.required = node
        .boolean("required")?
        .unwrap_or(location == ParameterLocation::Path);
    parameter.style = node.enumeration::<ParameterStyle>("style")?.optional();
    parameter.explode = node.boolean("explode")?.unwrap_or(true);
    Ok(parameter)
}

/// Text of a content type before any `;` parameters.
fn essence(content_type: &str) -> &str {
    content_type
        .split_once(';')
        .map_or(content_type, |(essence, _)| essence)
        .trim()
}

fn build_request_body(
    body: &MappingNode<'_>,
    type_name: &str,
    spec: &mut OpenapiSpec,
) -> Result<IndexMap<String, Content>> {
    if body.contains_key("$ref") {
        return Err(body.unsupported_at("$ref", "request body reference (components.requestBodies is not modeled)"));
    }
    body.ignore(&["description"]);
    let required = body.boolean("required")?.unwrap_or(false);
    let content = body.mapping_node("content")?.required()?;
    build_contents(&content, required, &format!("{type_name}Request"), spec)
}

fn build_responses(
    responses: &MappingNode<'_>,
    type_name: &str,
    spec: &mut OpenapiSpec,
) -> Result<Vec<Response>> {
    let mut built = Vec::new();
    for (key, node) in responses.mapping_entries()? {
        let Some(status) = StatusCode::parse(&key) else {
            return Err(responses.invalid_value_at(&key, format!("invalid response status '{key}'")));
        };
        if node.contains_key("$ref") {
            return Err(node.unsupported_at("$ref", "response reference (components.responses is not modeled)"));
        }
        node.ignore(&["headers", "links"]);
        let model_name = format!("{type_name}{}Response", to_pascal_case(&status.to_string()));
        let contents = match node.mapping_node("content")?.optional() {
            Some(content) => build_contents(&content, true, &model_name, spec)?,
            None => IndexMap::new(),
        };
        built.push(Response {
            status,
            description: node.string("description")?.optional(),
            contents,
        });
    }
    Ok(built)
}

/// Contents keyed by essence. Inline objects of non-form contents become
/// models named `model_name`.
fn build_contents(
    content: &MappingNode<'_>,
    required: bool,
    model_name: &str,
    spec: &mut OpenapiSpec,
) -> Result<IndexMap<String, Content>> {
    let mut contents = IndexMap::new();
    for (content_type, media) in content.mapping_entries()? {
        media.ignore(&["example", "examples", "encoding"]);
        let Some(schema_node) = media.mapping_node("schema")?.optional() else {
            warn!(content_type = %content_type, at = %media.location(), "skipping content without schema");
            continue;
        };
        let mut content = Content {
            content_type: essence(&content_type).to_string(),
            required,
            schema: schema::build_schema(&schema_node, Declared::model(model_name), spec)?,
        };
        if !content.is_form_content() {
            if let Schema::Object(object) = &content.schema {
                let reference =
                    name_inline_object(object, model_name, &content.content_type, &schema_node, spec)?;
                content.schema = Schema::Ref(reference);
            }
        }
        contents.insert(content.content_type.clone(), content);
    }
    Ok(contents)
}

/// Register an inline body object as a generic model. Several content types
/// declaring the same object share the model.
fn name_inline_object(
    object: &ObjectSchema,
    name: &str,
    content_type: &str,
    node: &MappingNode<'_>,
    spec: &mut OpenapiSpec,
) -> Result<SchemaRef> {
    let file = node.relative_filename();
    let reference = SchemaRef::to_model(file, name);
    let mut model = GenericModel::new(name);
    for property in object.properties.values() {
        model.insert(property.clone());
    }
    match spec.model_named(name) {
        Some(Model::Generic(existing)) if existing.properties == model.properties => {}
        Some(_) => {
            return Err(node.unsupported(format!(
                "second inline {content_type} body of '{name}' with a different shape"
            )));
        }
        None => {
            model.description = node.string("description")?.optional();
            debug!(model = %name, content_type, "named inline body");
            spec.add_model(file, Model::Generic(model))?;
        }
    }
    spec.add_reference(&reference);
    Ok(reference)
}

#[cfg(test)]
mod tests {
    use openapi_factory_document::{Document, ErrorKind};

    use super::*;

    fn build(yaml: &str) -> Result<OpenapiSpec> {
        let document = Document::parse(yaml, "api.yaml")?;
        let mut spec = OpenapiSpec::new("api.yaml");
        let defaults = OperationDefaults {
            tag: "default",
            security: Vec::new(),
        };
        build_paths(&document.root()?, &defaults, &mut spec)?;
        Ok(spec)
    }

    #[test]
    fn test_derive_operation_id() {
        assert_eq!(derive_operation_id("/pets/{id}", HttpMethod::Get), "PetsIdGet");
        assert_eq!(derive_operation_id("/pet-types", HttpMethod::Post), "PetTypesPost");
        assert_eq!(derive_operation_id("/users/{userId}/orders", HttpMethod::Delete), "UsersUserIdOrdersDelete");
        assert_eq!(derive_operation_id("/", HttpMethod::Head), "Head");
    }

    #[test]
    fn test_derived_id_and_path_parameter() {
        let spec = build(
            r#"
/pets/{id}:
  get:
    parameters:
      - name: id
        in: path
        required: true
        schema:
          type: string
"#,
        )
        .unwrap();
        let operation = spec.operation("PetsIdGet").unwrap();
        assert_eq!(operation.method, HttpMethod::Get);
        assert_eq!(operation.path, "/pets/{id}");
        let path_params = operation.path_params();
        assert_eq!(path_params.len(), 1);
        assert_eq!(path_params[0].name, "id");
        assert!(path_params[0].required);
        assert!(path_params[0].explode);
        assert_eq!(path_params[0].style, None);
        assert_eq!(operation.tags, vec!["default"]);
    }

    #[test]
    fn test_operation_parameters_override_common_ones() {
        let spec = build(
            r#"
/pets:
  parameters:
    - name: limit
      in: query
      schema: {type: integer}
    - name: X-Trace
      in: header
      schema: {type: string}
  get:
    operationId: listPets
    parameters:
      - name: limit
        in: query
        required: true
        style: form
        explode: false
        schema: {type: integer, format: int32}
      - name: status
        in: query
        schema:
          type: string
          enum: [available, sold]
"#,
        )
        .unwrap();
        let operation = spec.operation("listPets").unwrap();
        let names: Vec<_> = operation.parameters.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["limit", "X-Trace", "status"]);
        let limit = &operation.parameters[0];
        assert!(limit.required);
        assert_eq!(limit.style, Some(ParameterStyle::Form));
        assert!(!limit.explode);
        assert_eq!(operation.header_params().len(), 1);
        let Schema::EmbeddedEnum(status) = &operation.parameters[2].schema else {
            panic!("expected an embedded enum");
        };
        assert_eq!(status.type_name(), "ListPetsStatusEnum");
    }

    #[test]
    fn test_inline_bodies_become_models() {
        let spec = build(
            r#"
/pets:
  post:
    operationId: createPet
    requestBody:
      required: true
      content:
        application/json:
          schema:
            type: object
            properties:
              name: {type: string}
        application/x-www-form-urlencoded:
          schema:
            type: object
            properties:
              name: {type: string}
    responses:
      '201':
        description: Created
        content:
          application/json; charset=utf-8:
            schema:
              type: object
              properties:
                id: {type: string}
      default:
        description: Error
"#,
        )
        .unwrap();
        let operation = spec.operation("createPet").unwrap();
        let body = operation.request_body().unwrap();
        assert_eq!(body.content_type, "application/json");
        assert!(body.required);
        assert_eq!(
            body.schema.as_reference().unwrap().class_name(),
            "CreatePetRequest"
        );
        let form = &operation.request_bodies["application/x-www-form-urlencoded"];
        assert!(matches!(form.schema, Schema::Object(_)));
        assert!(!operation.has_only_optional_params());

        let created = operation.success_response().unwrap();
        assert_eq!(created.status, StatusCode::Code(201));
        let json = created.json().unwrap();
        assert_eq!(json.schema.as_reference().unwrap().class_name(), "CreatePet201Response");
        assert_eq!(operation.responses[1].status, StatusCode::Default);
        assert!(operation.responses[1].contents.is_empty());
        assert_eq!(spec.model_names(), vec!["CreatePet201Response", "CreatePetRequest"]);
        assert!(spec.unresolved_references().is_empty());
    }

    #[test]
    fn test_non_preferred_content_types_keep_the_first() {
        let spec = build(
            r#"
/upload:
  put:
    operationId: upload
    requestBody:
      content:
        text/plain:
          schema: {type: string}
        application/octet-stream:
          schema: {type: string, format: binary}
"#,
        )
        .unwrap();
        let operation = spec.operation("upload").unwrap();
        assert_eq!(operation.request_body().unwrap().content_type, "text/plain");
        assert!(operation.has_only_optional_params());
    }

    #[test]
    fn test_tags_group_operations() {
        let spec = build(
            r#"
/pets:
  get:
    operationId: listPets
    tags: [pets, pets, store]
  post:
    operationId: createPet
    tags: [pets]
"#,
        )
        .unwrap();
        assert_eq!(spec.operation("listPets").unwrap().tags, vec!["pets", "store"]);
        let pets: Vec<_> = spec.api("pets").unwrap().operation_ids().collect();
        assert_eq!(pets, vec!["createPet", "listPets"]);
        assert_eq!(spec.api("store").unwrap().operation_ids().count(), 1);
    }

    #[test]
    fn test_unknown_path_item_key() {
        let error = build("/pets:\n  fetch:\n    operationId: x\n").unwrap_err();
        assert_eq!(error.kind(), ErrorKind::UnsupportedShape);
        insta::assert_snapshot!(error.to_string(), @"unsupported path item key 'fetch' at api.yaml#/~1pets/fetch (api.yaml:2)");
    }

    #[test]
    fn test_parameter_reference_is_unsupported() {
        let error = build(
            "/pets:\n  get:\n    parameters:\n      - $ref: '#/components/parameters/Limit'\n",
        )
        .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::UnsupportedShape);
    }

    #[test]
    fn test_invalid_status_code() {
        let error = build("/pets:\n  get:\n    responses:\n      '600':\n        description: nope\n").unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Structural);
    }

    #[test]
    fn test_missing_parameter_location_is_located() {
        let error = build("/pets:\n  get:\n    parameters:\n      - name: limit\n        schema: {type: integer}\n").unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Structural);
        assert!(error.to_string().starts_with("missing required key 'in' (keys: [name, schema])"));
    }

    #[test]
    fn test_duplicate_operation_ids() {
        let error = build(
            "/a:\n  get:\n    operationId: same\n/b:\n  get:\n    operationId: same\n",
        )
        .unwrap_err();
        insta::assert_snapshot!(error.to_string(), @"duplicate operation id 'same'");
    }
}
