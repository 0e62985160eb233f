//! The root of the IR.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use indexmap::IndexMap;
use openapi_factory_document::{Error, Result};
use serde::Serialize;
use tracing::trace;

use crate::{
    model::{Model, ModelId},
    operation::{Operation, SecurityScheme},
    reference::SchemaRef,
};

/// `info` section of the document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Info {
    pub title: Option<String>,
    pub description: Option<String>,
    pub version: Option<String>,
    pub contact: Option<Contact>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Contact {
    pub name: Option<String>,
    pub email: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Server {
    pub url: String,
    pub description: Option<String>,
    pub name: Option<String>,
}

/// Operations sharing a tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Api {
    tag: String,
    operation_ids: BTreeSet<String>,
}

impl Api {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            operation_ids: BTreeSet::new(),
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Operation ids, sorted.
    pub fn operation_ids(&self) -> impl Iterator<Item = &str> {
        self.operation_ids.iter().map(String::as_str)
    }

    /// Operations of this group, sorted by operation id.
    pub fn operations<'s>(&self, spec: &'s OpenapiSpec) -> Vec<&'s Operation> {
        self.operation_ids
            .iter()
            .filter_map(|id| spec.operation(id))
            .collect()
    }
}

/// A fully built API description.
///
/// Owns every named model in an arena. Schemas refer to models only through
/// [`SchemaRef`], which is resolved against this table on access.
#[derive(Debug, Clone)]
pub struct OpenapiSpec {
    pub info: Info,
    pub servers: Vec<Server>,
    entry_file: String,
    models: Vec<Model>,
    model_files: Vec<String>,
    by_name: HashMap<String, ModelId>,
    by_reference: HashMap<String, ModelId>,
    references: BTreeSet<String>,
    operations: IndexMap<String, Operation>,
    apis: BTreeMap<String, Api>,
    security_schemes: Vec<SecurityScheme>,
}

impl OpenapiSpec {
    /// An empty spec built from the document `entry_file`.
    pub fn new(entry_file: impl Into<String>) -> Self {
        Self {
            info: Info::default(),
            servers: Vec::new(),
            entry_file: entry_file.into(),
            models: Vec::new(),
            model_files: Vec::new(),
            by_name: HashMap::new(),
            by_reference: HashMap::new(),
            references: BTreeSet::new(),
            operations: IndexMap::new(),
            apis: BTreeMap::new(),
            security_schemes: Vec::new(),
        }
    }

    /// Relative filename of the entry document.
    pub fn entry_file(&self) -> &str {
        &self.entry_file
    }

    /// Register a model declared in `file`. Model names are unique across files.
    pub fn add_model(&mut self, file: &str, model: Model) -> Result<ModelId> {
        let name = model.name().to_string();
        if self.by_name.contains_key(&name) {
            return Err(Box::new(Error::DuplicateModel { name }));
        }
        let id = ModelId(self.models.len());
        self.by_reference
            .insert(SchemaRef::to_model(file, &name).reference().to_string(), id);
        self.by_name.insert(name, id);
        self.models.push(model);
        self.model_files.push(file.to_string());
        Ok(id)
    }

    pub fn model(&self, id: ModelId) -> Option<&Model> {
        self.models.get(id.0)
    }

    /// Relative filename of the document that declared the model.
    pub fn model_file(&self, id: ModelId) -> Option<&str> {
        self.model_files.get(id.0).map(String::as_str)
    }

    pub fn model_named(&self, name: &str) -> Option<&Model> {
        self.by_name.get(name).and_then(|id| self.model(*id))
    }

    pub fn model_id(&self, reference: &SchemaRef) -> Result<ModelId> {
        self.by_reference
            .get(reference.reference())
            .copied()
            .ok_or_else(|| {
                Box::new(Error::MissingReference {
                    reference: reference.reference().to_string(),
                    known: self.model_names().into_iter().map(str::to_string).collect(),
                })
            })
    }

    /// Resolve a reference to the model it names.
    pub fn get_model(&self, reference: &SchemaRef) -> Result<&Model> {
        let id = self.model_id(reference)?;
        self.model(id)
            .ok_or_else(|| Error::invariant(format!("model id {} out of range", id.index())))
    }

    /// Every model, sorted by name.
    pub fn models(&self) -> Vec<&Model> {
        let mut models: Vec<&Model> = self.models.iter().collect();
        models.sort_by(|a, b| a.name().cmp(b.name()));
        models
    }

    /// Every model in the order it was declared.
    pub fn declared_models(&self) -> impl Iterator<Item = (ModelId, &Model)> {
        self.models
            .iter()
            .enumerate()
            .map(|(index, model)| (ModelId(index), model))
    }

    /// Model names, sorted.
    pub fn model_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.by_name.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn model_count(&self) -> usize {
        self.models.len()
    }

    /// Record a reference so that [`OpenapiSpec::validate_references`] checks it.
    pub fn add_reference(&mut self, reference: &SchemaRef) {
        if self.references.insert(reference.reference().to_string()) {
            trace!(reference = %reference, declared_in = reference.declared_in(), "registered reference");
        }
    }

    /// Every reference recorded so far, sorted.
    pub fn references(&self) -> impl Iterator<Item = &str> {
        self.references.iter().map(String::as_str)
    }

    /// Files named by recorded references.
    pub fn referenced_files(&self) -> BTreeSet<&str> {
        self.references
            .iter()
            .filter_map(|reference| reference.split_once('#').map(|(file, _)| file))
            .collect()
    }

    /// Recorded references that name no model, sorted.
    pub fn unresolved_references(&self) -> Vec<&str> {
        self.references
            .iter()
            .filter(|reference| !self.by_reference.contains_key(*reference))
            .map(String::as_str)
            .collect()
    }

    /// Fail with one error listing every unresolved reference.
    pub fn validate_references(&self) -> Result<()> {
        let unresolved = self.unresolved_references();
        if unresolved.is_empty() {
            return Ok(());
        }
        Err(Box::new(Error::UnresolvedReferences {
            references: unresolved.into_iter().map(str::to_string).collect(),
        }))
    }

    /// Register an operation under each of its tags. Operation ids are unique.
    pub fn add_operation(&mut self, operation: Operation) -> Result<()> {
        if self.operations.contains_key(&operation.operation_id) {
            return Err(Box::new(Error::DuplicateOperation {
                operation_id: operation.operation_id,
            }));
        }
        for tag in &operation.tags {
            self.apis
                .entry(tag.clone())
                .or_insert_with(|| Api::new(tag))
                .operation_ids
                .insert(operation.operation_id.clone());
        }
        self.operations
            .insert(operation.operation_id.clone(), operation);
        Ok(())
    }

    pub fn operation(&self, operation_id: &str) -> Option<&Operation> {
        self.operations.get(operation_id)
    }

    /// Every operation once, in declaration order.
    pub fn operations(&self) -> impl Iterator<Item = &Operation> {
        self.operations.values()
    }

    /// Operation groups keyed by tag.
    pub fn apis(&self) -> &BTreeMap<String, Api> {
        &self.apis
    }

    pub fn api(&self, tag: &str) -> Option<&Api> {
        self.apis.get(tag)
    }

    pub fn add_security_scheme(&mut self, scheme: SecurityScheme) {
        self.security_schemes.push(scheme);
    }

    pub fn security_schemes(&self) -> &[SecurityScheme] {
        &self.security_schemes
    }

    pub fn security_scheme(&self, key: &str) -> Option<&SecurityScheme> {
        self.security_schemes.iter().find(|scheme| scheme.key == key)
    }
}

#[cfg(test)]
mod tests {
    use openapi_factory_document::ErrorKind;

    use super::*;
    use crate::{
        model::{EnumModel, GenericModel},
        operation::HttpMethod,
    };

    fn pet() -> Model {
        Model::Generic(GenericModel::new("Pet"))
    }

    fn status() -> Model {
        Model::Enum(EnumModel {
            name: "Status".into(),
            description: None,
            value_type: "string".into(),
            values: vec!["active".into(), "inactive".into()],
        })
    }

    #[test]
    fn test_resolution_is_stable() {
        let mut spec = OpenapiSpec::new("api.yaml");
        let reference = SchemaRef::parse("#/components/schemas/Pet", "api.yaml").unwrap();
        spec.add_reference(&reference);
        // the reference is created before the model exists
        assert!(spec.get_model(&reference).is_err());
        spec.add_model("api.yaml", pet()).unwrap();

        let first = spec.get_model(&reference).unwrap();
        let second = spec.get_model(&reference).unwrap();
        assert!(std::ptr::eq(first, second));
        assert_eq!(first.name(), "Pet");
        assert!(spec.validate_references().is_ok());
    }

    #[test]
    fn test_missing_reference_lists_known_names() {
        let mut spec = OpenapiSpec::new("api.yaml");
        spec.add_model("api.yaml", status()).unwrap();
        spec.add_model("api.yaml", pet()).unwrap();
        let reference = SchemaRef::parse("#/components/schemas/Cat", "api.yaml").unwrap();
        let error = spec.get_model(&reference).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Reference);
        insta::assert_snapshot!(error, @"missing $ref 'api.yaml#/components/schemas/Cat' (known models: [Pet, Status])");
    }

    #[test]
    fn test_unresolved_references_are_aggregated() {
        let mut spec = OpenapiSpec::new("api.yaml");
        spec.add_model("api.yaml", pet()).unwrap();
        for raw in [
            "#/components/schemas/Pet",
            "#/components/schemas/Dog",
            "#/components/schemas/Cat",
            "#/components/schemas/Dog",
        ] {
            spec.add_reference(&SchemaRef::parse(raw, "api.yaml").unwrap());
        }
        assert_eq!(
            spec.unresolved_references(),
            vec!["api.yaml#/components/schemas/Cat", "api.yaml#/components/schemas/Dog"]
        );
        let error = spec.validate_references().unwrap_err();
        insta::assert_snapshot!(error, @"unresolved references: api.yaml#/components/schemas/Cat, api.yaml#/components/schemas/Dog");
    }

    #[test]
    fn test_models_sorted_by_name() {
        let mut spec = OpenapiSpec::new("api.yaml");
        spec.add_model("api.yaml", status()).unwrap();
        spec.add_model("api.yaml", pet()).unwrap();
        let names: Vec<&str> = spec.models().iter().map(|m| m.name()).collect();
        assert_eq!(names, vec!["Pet", "Status"]);
        let declared: Vec<&str> = spec.declared_models().map(|(_, m)| m.name()).collect();
        assert_eq!(declared, vec!["Status", "Pet"]);
    }

    #[test]
    fn test_duplicate_model_is_rejected() {
        let mut spec = OpenapiSpec::new("api.yaml");
        spec.add_model("api.yaml", pet()).unwrap();
        let error = spec.add_model("schemas/pet.yaml", pet()).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Invariant);
    }

    #[test]
    fn test_cross_file_model_resolves_by_file() {
        let mut spec = OpenapiSpec::new("api.yaml");
        spec.add_model("schemas/pet.yaml", pet()).unwrap();
        let local = SchemaRef::parse("#/components/schemas/Pet", "api.yaml").unwrap();
        let remote =
            SchemaRef::parse("schemas/pet.yaml#/components/schemas/Pet", "api.yaml").unwrap();
        assert!(spec.get_model(&local).is_err());
        assert_eq!(spec.get_model(&remote).unwrap().name(), "Pet");
        spec.add_reference(&remote);
        assert_eq!(
            spec.referenced_files().into_iter().collect::<Vec<_>>(),
            vec!["schemas/pet.yaml"]
        );
    }

    #[test]
    fn test_operations_grouped_by_tag() {
        let mut spec = OpenapiSpec::new("api.yaml");
        let mut list = Operation::new(HttpMethod::Get, "/pets", "listPets");
        list.tags = vec!["pets".into(), "public".into()];
        let mut create = Operation::new(HttpMethod::Post, "/pets", "createPet");
        create.tags = vec!["pets".into()];
        spec.add_operation(list).unwrap();
        spec.add_operation(create).unwrap();

        let pets = spec.api("pets").unwrap();
        let ids: Vec<&str> = pets.operation_ids().collect();
        assert_eq!(ids, vec!["createPet", "listPets"]);
        assert_eq!(spec.api("public").unwrap().operations(&spec).len(), 1);
        assert_eq!(spec.operations().count(), 2);

        let duplicate = Operation::new(HttpMethod::Get, "/other", "listPets");
        let error = spec.add_operation(duplicate).unwrap_err();
        assert_eq!(error.to_string(), "duplicate operation id 'listPets'");
    }
}
