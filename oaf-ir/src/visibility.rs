//! Read and write views of models.
//!
//! A request body never carries `readOnly` properties and a response never
//! carries `writeOnly` ones. For each model we compute which properties an
//! emitter must leave out of the corresponding view: properties that are
//! themselves required and flagged, and properties whose schema reaches a
//! flagged property through references, arrays, records or inline objects.

use std::collections::HashSet;

use openapi_factory_document::Result;

use crate::{
    model::Model,
    schema::{Property, Schema},
    spec::OpenapiSpec,
};

/// Which flag a view filters on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Visibility {
    /// `readOnly`: omitted from request shapes.
    ReadOnly,
    /// `writeOnly`: omitted from response shapes.
    WriteOnly,
}

impl Visibility {
    fn flags(self, property: &Property) -> bool {
        match self {
            Visibility::ReadOnly => property.read_only,
            Visibility::WriteOnly => property.write_only,
        }
    }

    fn omits_directly(self, property: &Property) -> bool {
        property.required && self.flags(property)
    }
}

impl Model {
    /// Properties to leave out of a request shape of this model.
    pub fn omitted_for_read(&self, spec: &OpenapiSpec) -> Result<Vec<Property>> {
        omitted(self, spec, Visibility::ReadOnly)
    }

    /// Properties to leave out of a response shape of this model.
    pub fn omitted_for_write(&self, spec: &OpenapiSpec) -> Result<Vec<Property>> {
        omitted(self, spec, Visibility::WriteOnly)
    }

    pub fn has_read_only_properties(&self, spec: &OpenapiSpec) -> Result<bool> {
        model_has(self, spec, Visibility::ReadOnly, &mut HashSet::new())
    }

    pub fn has_write_only_properties(&self, spec: &OpenapiSpec) -> Result<bool> {
        model_has(self, spec, Visibility::WriteOnly, &mut HashSet::new())
    }

    /// True when no property of the model is required.
    pub fn has_no_required_properties(&self, spec: &OpenapiSpec) -> Result<bool> {
        Ok(self
            .all_properties(spec)?
            .iter()
            .all(|property| !property.required))
    }
}

impl Schema {
    pub fn has_read_only_properties(&self, spec: &OpenapiSpec) -> Result<bool> {
        schema_has(self, spec, Visibility::ReadOnly, &mut HashSet::new())
    }

    pub fn has_write_only_properties(&self, spec: &OpenapiSpec) -> Result<bool> {
        schema_has(self, spec, Visibility::WriteOnly, &mut HashSet::new())
    }
}

/// Unions, arrays and enums have no properties of their own to omit.
fn omitted(model: &Model, spec: &OpenapiSpec, visibility: Visibility) -> Result<Vec<Property>> {
    let mut result = Vec::new();
    for property in model.all_properties(spec)? {
        // a fresh walk per property, so that a cycle back to `model` still counts
        if visibility.omits_directly(&property)
            || schema_has(&property.schema, spec, visibility, &mut HashSet::new())?
        {
            result.push(property);
        }
    }
    Ok(result)
}

/// Whether `model` reaches a required flagged property. Models already in
/// `visited` are treated as not reaching one, which ends cycles.
fn model_has<'s>(
    model: &'s Model,
    spec: &'s OpenapiSpec,
    visibility: Visibility,
    visited: &mut HashSet<&'s str>,
) -> Result<bool> {
    if !visited.insert(model.name()) {
        return Ok(false);
    }
    match model {
        Model::Generic(_) | Model::AllOf(_) => {
            for property in model.all_properties(spec)? {
                if visibility.omits_directly(&property)
                    || schema_has(&property.schema, spec, visibility, visited)?
                {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        Model::OneOf(one_of) => {
            for reference in one_of.models() {
                if model_has(spec.get_model(reference)?, spec, visibility, visited)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        Model::Array(array) => schema_has(&array.array.items, spec, visibility, visited),
        Model::Enum(_) => Ok(false),
    }
}

fn schema_has<'s>(
    schema: &Schema,
    spec: &'s OpenapiSpec,
    visibility: Visibility,
    visited: &mut HashSet<&'s str>,
) -> Result<bool> {
    match schema {
        Schema::Ref(reference) => model_has(spec.get_model(reference)?, spec, visibility, visited),
        Schema::Array(array) => schema_has(&array.items, spec, visibility, visited),
        Schema::Record(record) => schema_has(&record.values, spec, visibility, visited),
        Schema::Object(object) => {
            for property in object.properties.values() {
                if visibility.omits_directly(property)
                    || schema_has(&property.schema, spec, visibility, visited)?
                {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        Schema::Primitive(_) | Schema::Constant(_) | Schema::EmbeddedEnum(_) => Ok(false),
    }
}
