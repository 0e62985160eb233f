use std::fs;

use openapi_factory_builder::{BuildOptions, SpecBuilder, build_file};
use openapi_factory_document::{ErrorKind, MemoryLoader};
use openapi_factory_ir::SchemaRef;

const API: &str = r#"
openapi: 3.0.3
paths:
  /pets:
    get:
      operationId: listPets
      responses:
        '200':
          description: ok
          content:
            application/json:
              schema:
                type: array
                items:
                  $ref: './models/pet.yaml#/components/schemas/Pet'
"#;

const PET: &str = r#"
openapi: 3.0.3
info:
  title: shared models
components:
  parameters:
    Limit:
      name: limit
      in: query
  schemas:
    Pet:
      type: object
      properties:
        name:
          type: string
        owner:
          $ref: './owner.yaml#/components/schemas/Owner'
"#;

const OWNER: &str = r#"
components:
  schemas:
    Owner:
      type: object
      properties:
        name:
          type: string
"#;

fn loader() -> MemoryLoader {
    MemoryLoader::new()
        .with("api.yaml", API)
        .with("models/pet.yaml", PET)
        .with("models/owner.yaml", OWNER)
}

#[test]
fn test_referenced_documents_are_loaded_transitively() {
    let spec = SpecBuilder::new(loader())
        .options(BuildOptions::default().strict(true))
        .build("api.yaml")
        .unwrap();

    assert_eq!(spec.model_names(), vec!["Owner", "Pet"]);
    let pet = spec
        .model_id(&SchemaRef::to_model("models/pet.yaml", "Pet"))
        .unwrap();
    assert_eq!(spec.model_file(pet), Some("models/pet.yaml"));
    let owner = spec
        .model_id(&SchemaRef::to_model("models/owner.yaml", "Owner"))
        .unwrap();
    assert_eq!(spec.model_file(owner), Some("models/owner.yaml"));

    let property = spec
        .model_named("Pet")
        .unwrap()
        .as_generic()
        .unwrap()
        .property("owner")
        .unwrap();
    let reference = property.schema.as_reference().unwrap();
    assert_eq!(reference.reference(), "models/owner.yaml#/components/schemas/Owner");
    assert_eq!(spec.get_model(reference).unwrap().name(), "Owner");
    assert!(spec.unresolved_references().is_empty());
}

#[test]
fn test_missing_referenced_document_is_reported_with_other_references() {
    let document = r#"
components:
  schemas:
    Pet:
      type: object
      properties:
        owner:
          $ref: './missing.yaml#/components/schemas/Owner'
        toy:
          $ref: '#/components/schemas/Toy'
"#;
    let loader = MemoryLoader::new().with("api.yaml", document);
    let error = SpecBuilder::new(&loader).build("api.yaml").unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Reference);
    insta::assert_snapshot!(error.to_string(), @"unresolved references: api.yaml#/components/schemas/Toy, missing.yaml#/components/schemas/Owner");

    let spec = SpecBuilder::new(&loader)
        .options(BuildOptions::default().validate_references(false))
        .build("api.yaml")
        .unwrap();
    assert_eq!(spec.model_names(), vec!["Pet"]);
    assert_eq!(spec.unresolved_references().len(), 2);
}

#[test]
fn test_unparseable_referenced_document_fails_the_build() {
    let loader = loader().with("models/owner.yaml", "components: [unclosed\n");
    let error = SpecBuilder::new(loader).build("api.yaml").unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Parse);
}

#[test]
fn test_model_names_are_unique_across_documents() {
    let owner = OWNER.replace("Owner:", "Pet:");
    let loader = loader().with("models/owner.yaml", owner);
    let error = SpecBuilder::new(loader).build("api.yaml").unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Invariant);
    insta::assert_snapshot!(error.to_string(), @"duplicate model 'Pet'");
}

#[test]
fn test_build_from_disk_through_a_link() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("models")).unwrap();
    fs::write(dir.path().join("api-v1.yaml"), API).unwrap();
    fs::write(dir.path().join("models/pet.yaml"), PET).unwrap();
    fs::write(dir.path().join("models/owner.yaml"), OWNER).unwrap();
    fs::write(dir.path().join("api.yaml.link"), "api-v1.yaml\n").unwrap();

    let spec = build_file(dir.path().join("api-v1.yaml"), BuildOptions::default()).unwrap();
    assert_eq!(spec.entry_file(), "api-v1.yaml");
    assert_eq!(spec.model_count(), 2);

    let linked = build_file(dir.path().join("api.yaml.link"), BuildOptions::default()).unwrap();
    assert_eq!(linked.entry_file(), "api-v1.yaml");
    assert_eq!(linked.model_names(), vec!["Owner", "Pet"]);
    assert!(linked.operation("listPets").is_some());
}

#[test]
fn test_missing_entry_file() {
    let dir = tempfile::tempdir().unwrap();
    let error = build_file(dir.path().join("absent.yaml"), BuildOptions::default()).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Io);
}
