//! Flattening of `allOf` models and discriminator resolution for `oneOf`.
//!
//! Nothing here is computed eagerly: super models are resolved through the
//! spec each time, so composition works regardless of declaration order.

use indexmap::IndexMap;
use openapi_factory_document::{Error, Result};

use crate::{
    model::{AllOfModel, GenericModel, Model, OneOfModel},
    reference::SchemaRef,
    schema::{Property, Schema},
    spec::OpenapiSpec,
};

/// Names of the allOf models currently being expanded.
type Chain<'s> = Vec<&'s str>;

fn enter<'s>(chain: &mut Chain<'s>, name: &'s str) -> Result<()> {
    if chain.contains(&name) {
        let mut cycle = chain.clone();
        cycle.push(name);
        return Err(Error::invariant(format!(
            "cyclic allOf inheritance: {}",
            cycle.join(" -> ")
        )));
    }
    chain.push(name);
    Ok(())
}

fn not_an_object(model: &str, super_model: &Model) -> Box<Error> {
    Error::invariant(format!(
        "allOf model '{model}' extends '{}', which is a {} model",
        super_model.name(),
        super_model.kind()
    ))
}

impl Model {
    /// Look up a property by name, through allOf super models.
    ///
    /// Models without properties (enums, unions, arrays) have none.
    pub fn get_property<'s>(&'s self, spec: &'s OpenapiSpec, name: &str) -> Result<Option<&'s Property>> {
        find_property(self, spec, name, &mut Vec::new())
    }

    /// Every property a value of this model carries, inherited ones included.
    pub fn all_properties(&self, spec: &OpenapiSpec) -> Result<Vec<Property>> {
        match self {
            Model::Generic(model) => Ok(model.all_properties().into_iter().cloned().collect()),
            Model::AllOf(model) => model.all_properties(spec),
            Model::Enum(_) | Model::OneOf(_) | Model::Array(_) => Ok(Vec::new()),
        }
    }
}

impl GenericModel {
    pub fn all_properties(&self) -> Vec<&Property> {
        self.properties.values().collect()
    }
}

fn find_property<'s>(
    model: &'s Model,
    spec: &'s OpenapiSpec,
    name: &str,
    chain: &mut Chain<'s>,
) -> Result<Option<&'s Property>> {
    match model {
        Model::Generic(generic) => Ok(generic.property(name)),
        Model::AllOf(all_of) => find_all_of_property(all_of, spec, name, chain),
        Model::Enum(_) | Model::OneOf(_) | Model::Array(_) => Ok(None),
    }
}

fn find_all_of_property<'s>(
    all_of: &'s AllOfModel,
    spec: &'s OpenapiSpec,
    name: &str,
    chain: &mut Chain<'s>,
) -> Result<Option<&'s Property>> {
    enter(chain, &all_of.name)?;
    let inline = all_of
        .inline_supers
        .iter()
        .find_map(|inline| inline.property(name));
    if inline.is_some() {
        chain.pop();
        return Ok(inline);
    }
    for reference in &all_of.supers {
        let super_model = spec.get_model(reference)?;
        if !matches!(super_model, Model::Generic(_) | Model::AllOf(_)) {
            return Err(not_an_object(&all_of.name, super_model));
        }
        if let Some(property) = find_property(super_model, spec, name, chain)? {
            chain.pop();
            return Ok(Some(property));
        }
    }
    chain.pop();
    Ok(None)
}

fn collect_properties<'s>(
    model: &'s Model,
    spec: &'s OpenapiSpec,
    chain: &mut Chain<'s>,
    into: &mut IndexMap<String, Property>,
) -> Result<()> {
    match model {
        Model::Generic(generic) => {
            for property in generic.properties.values() {
                into.insert(property.name.clone(), property.clone());
            }
            Ok(())
        }
        Model::AllOf(all_of) => collect_all_of_properties(all_of, spec, chain, into),
        other => Err(Error::invariant(format!(
            "'{}' is a {} model and has no properties",
            other.name(),
            other.kind()
        ))),
    }
}

fn collect_all_of_properties<'s>(
    all_of: &'s AllOfModel,
    spec: &'s OpenapiSpec,
    chain: &mut Chain<'s>,
    into: &mut IndexMap<String, Property>,
) -> Result<()> {
    enter(chain, &all_of.name)?;
    for super_model in all_of.super_models(spec)? {
        if !matches!(super_model, Model::Generic(_) | Model::AllOf(_)) {
            return Err(not_an_object(&all_of.name, super_model));
        }
        collect_properties(super_model, spec, chain, into)?;
    }
    for property in own_properties(all_of, spec, chain)? {
        into.insert(property.name.clone(), property);
    }
    chain.pop();
    Ok(())
}

fn own_properties<'s>(
    all_of: &'s AllOfModel,
    spec: &'s OpenapiSpec,
    chain: &mut Chain<'s>,
) -> Result<Vec<Property>> {
    let mut properties = Vec::new();
    for name in &all_of.required {
        let declared_inline = all_of
            .inline_supers
            .iter()
            .any(|inline| inline.property(name).is_some());
        if declared_inline {
            continue;
        }
        // `chain` already holds this model; look through its supers directly
        let mut inherited = None;
        for reference in &all_of.supers {
            let super_model = spec.get_model(reference)?;
            if let Some(property) = find_property(super_model, spec, name, chain)? {
                inherited = Some(property);
                break;
            }
        }
        let property = inherited.ok_or_else(|| {
            Box::new(Error::MissingProperty {
                property: name.clone(),
                model: all_of.name.clone(),
            })
        })?;
        properties.push(property.with_required(true));
    }
    for inline in &all_of.inline_supers {
        properties.extend(inline.properties.values().cloned());
    }
    Ok(properties)
}

impl AllOfModel {
    /// Inline super schemas first, then each referenced super model in order.
    pub fn get_property<'s>(&'s self, spec: &'s OpenapiSpec, name: &str) -> Result<Option<&'s Property>> {
        find_all_of_property(self, spec, name, &mut Vec::new())
    }

    /// Like [`AllOfModel::get_property`], failing when the property is absent.
    pub fn property<'s>(&'s self, spec: &'s OpenapiSpec, name: &str) -> Result<&'s Property> {
        self.get_property(spec, name)?.ok_or_else(|| {
            Box::new(Error::MissingProperty {
                property: name.to_string(),
                model: self.name.clone(),
            })
        })
    }

    /// Required names not declared inline, inherited and forced required,
    /// followed by every inline property.
    pub fn own_properties(&self, spec: &OpenapiSpec) -> Result<Vec<Property>> {
        let mut chain = vec![self.name.as_str()];
        own_properties(self, spec, &mut chain)
    }

    /// Properties of every referenced super model (recursively), then the
    /// own properties. A later property replaces an earlier one of the same
    /// name in place.
    pub fn all_properties(&self, spec: &OpenapiSpec) -> Result<Vec<Property>> {
        let mut properties = IndexMap::new();
        collect_all_of_properties(self, spec, &mut Vec::new(), &mut properties)?;
        Ok(properties.into_values().collect())
    }

    /// The referenced super models, resolved.
    pub fn super_models<'s>(&self, spec: &'s OpenapiSpec) -> Result<Vec<&'s Model>> {
        self.supers
            .iter()
            .map(|reference| spec.get_model(reference))
            .collect()
    }
}

impl OneOfModel {
    /// Member references: the explicit mapping's targets when a mapping is
    /// declared, otherwise the `oneOf` list.
    pub fn models(&self) -> Vec<&SchemaRef> {
        if self.discriminator.mapping.is_empty() {
            self.members.iter().collect()
        } else {
            self.discriminator.mapping.values().collect()
        }
    }

    /// Discriminator value to member model.
    ///
    /// An explicit mapping is used as is. Without one, nested unions map from
    /// their class name, and other members from the constant value of their
    /// discriminator property, falling back to their class name.
    pub fn mapped_models<'s>(&self, spec: &'s OpenapiSpec) -> Result<IndexMap<String, &'s Model>> {
        if !self.discriminator.mapping.is_empty() {
            return self
                .discriminator
                .mapping
                .iter()
                .map(|(value, reference)| Ok((value.clone(), spec.get_model(reference)?)))
                .collect();
        }
        let Some(property_name) = &self.discriminator.property_name else {
            return Err(Error::invariant(format!(
                "oneOf model '{}' has no discriminator propertyName",
                self.name
            )));
        };

        let mut mapped = IndexMap::new();
        for reference in &self.members {
            let model = spec.get_model(reference)?;
            if let Model::OneOf(_) = model {
                mapped.insert(reference.class_name().to_string(), model);
                continue;
            }
            let property = model.get_property(spec, property_name)?.ok_or_else(|| {
                Box::new(Error::MissingProperty {
                    property: property_name.clone(),
                    model: model.name().to_string(),
                })
            })?;
            let value = match &property.schema {
                Schema::Constant(constant) => constant.value.clone(),
                _ => reference.class_name().to_string(),
            };
            mapped.insert(value, model);
        }
        Ok(mapped)
    }
}
