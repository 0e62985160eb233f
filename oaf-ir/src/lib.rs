//! Intermediate representation for OpenAPI Factory.
//!
//! The types in this crate describe an API after every document has been
//! read: named models, unnamed schemas, operations grouped by tag and the
//! security schemes they use. Emitters consume an [`OpenapiSpec`] and never
//! look at YAML or JSON again.
//!
//! # Architecture
//!
//! ```text
//! oaf-document (nodes) → oaf-builder (modeling) → oaf-ir (OpenapiSpec) → emitters
//! ```
//!
//! Models live in an arena owned by [`OpenapiSpec`]. A [`Schema::Ref`] holds a
//! normalized [`SchemaRef`] and is resolved against that arena on access, so
//! self-referencing and mutually recursive models need no special handling.
//! Inherited properties ([`AllOfModel`]), discriminator mappings
//! ([`OneOfModel`]) and read/write views ([`Visibility`]) are computed from
//! the arena when asked for.

mod composition;
mod model;
mod naming;
mod operation;
mod reference;
mod schema;
mod spec;
mod visibility;

pub use model::{
    AllOfModel, ArrayModel, Discriminator, EnumModel, GenericModel, Model, ModelId, ModelKind,
    OneOfModel,
};
pub use naming::to_pascal_case;
pub use operation::{
    APPLICATION_JSON, Content, FORM_URLENCODED, HttpMethod, MULTIPART_FORM_DATA, Operation,
    Parameter, ParameterLocation, ParameterStyle, REQUEST_BODY_PREFERENCE, Response,
    SecurityRequirement, SecurityScheme, StatusCode,
};
pub use reference::{ReferenceProblem, SCHEMAS_ANCHOR, SchemaRef};
pub use schema::{
    ArraySchema, ConstantSchema, EmbeddedEnum, MAX_TUPLE_LENGTH, ObjectSchema, PrimitiveSchema,
    Property, RecordSchema, Schema,
};
pub use spec::{Api, Contact, Info, OpenapiSpec, Server};
pub use visibility::Visibility;
