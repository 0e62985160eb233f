//! Operations, their parameters, bodies, responses and security.

use std::fmt;

use indexmap::IndexMap;
use openapi_factory_document::Variants;
use serde::Serialize;

use crate::schema::Schema;

pub const APPLICATION_JSON: &str = "application/json";
pub const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";
pub const MULTIPART_FORM_DATA: &str = "multipart/form-data";

/// Request body content types in order of preference.
pub const REQUEST_BODY_PREFERENCE: [&str; 3] = [APPLICATION_JSON, FORM_URLENCODED, MULTIPART_FORM_DATA];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpMethod {
    Get,
    Put,
    Post,
    Delete,
    Options,
    Head,
    Patch,
    Trace,
}

impl Variants for HttpMethod {
    const ALL: &'static [Self] = &[
        HttpMethod::Get,
        HttpMethod::Put,
        HttpMethod::Post,
        HttpMethod::Delete,
        HttpMethod::Options,
        HttpMethod::Head,
        HttpMethod::Patch,
        HttpMethod::Trace,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "get",
            HttpMethod::Put => "put",
            HttpMethod::Post => "post",
            HttpMethod::Delete => "delete",
            HttpMethod::Options => "options",
            HttpMethod::Head => "head",
            HttpMethod::Patch => "patch",
            HttpMethod::Trace => "trace",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str().to_ascii_uppercase())
    }
}

/// Where a parameter is sent (`in`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    Path,
    Query,
    Header,
    Cookie,
}

impl Variants for ParameterLocation {
    const ALL: &'static [Self] = &[
        ParameterLocation::Path,
        ParameterLocation::Query,
        ParameterLocation::Header,
        ParameterLocation::Cookie,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            ParameterLocation::Path => "path",
            ParameterLocation::Query => "query",
            ParameterLocation::Header => "header",
            ParameterLocation::Cookie => "cookie",
        }
    }
}

/// Serialization `style` of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ParameterStyle {
    Matrix,
    Label,
    Form,
    Simple,
    SpaceDelimited,
    PipeDelimited,
    DeepObject,
}

impl Variants for ParameterStyle {
    const ALL: &'static [Self] = &[
        ParameterStyle::Matrix,
        ParameterStyle::Label,
        ParameterStyle::Form,
        ParameterStyle::Simple,
        ParameterStyle::SpaceDelimited,
        ParameterStyle::PipeDelimited,
        ParameterStyle::DeepObject,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            ParameterStyle::Matrix => "matrix",
            ParameterStyle::Label => "label",
            ParameterStyle::Form => "form",
            ParameterStyle::Simple => "simple",
            ParameterStyle::SpaceDelimited => "spaceDelimited",
            ParameterStyle::PipeDelimited => "pipeDelimited",
            ParameterStyle::DeepObject => "deepObject",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Parameter {
    pub name: String,
    pub description: Option<String>,
    pub required: bool,
    pub location: ParameterLocation,
    /// No default: `None` means the location's natural serialization.
    pub style: Option<ParameterStyle>,
    pub explode: bool,
    pub schema: Schema,
}

impl Parameter {
    pub fn new(name: impl Into<String>, location: ParameterLocation, schema: Schema) -> Self {
        Self {
            name: name.into(),
            description: None,
            required: false,
            location,
            style: None,
            explode: true,
            schema,
        }
    }
}

/// One content type of a request body or response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Content {
    pub content_type: String,
    pub required: bool,
    pub schema: Schema,
}

impl Content {
    /// Form-encoded or multipart, by prefix.
    pub fn is_form_content(&self) -> bool {
        self.content_type.starts_with(FORM_URLENCODED) || self.content_type.starts_with(MULTIPART_FORM_DATA)
    }

    pub fn is_json(&self) -> bool {
        self.content_type == APPLICATION_JSON || self.content_type.ends_with("+json")
    }
}

/// A response status key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusCode {
    /// An exact code such as `200`.
    Code(u16),
    /// A range such as `2XX`, holding the leading digit.
    Range(u8),
    Default,
}

impl StatusCode {
    pub fn parse(text: &str) -> Option<Self> {
        if text == "default" {
            return Some(StatusCode::Default);
        }
        let bytes = text.as_bytes();
        if bytes.len() != 3 || !(b'1'..=b'5').contains(&bytes[0]) {
            return None;
        }
        if bytes[1..].eq_ignore_ascii_case(b"XX") {
            return Some(StatusCode::Range(bytes[0] - b'0'));
        }
        text.parse().ok().map(StatusCode::Code)
    }

    /// Leading digit of the code or range.
    pub fn class(&self) -> Option<u8> {
        match self {
            StatusCode::Code(code) => u8::try_from(code / 100).ok(),
            StatusCode::Range(class) => Some(*class),
            StatusCode::Default => None,
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusCode::Code(code) => write!(f, "{code}"),
            StatusCode::Range(class) => write!(f, "{class}XX"),
            StatusCode::Default => f.write_str("default"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    pub status: StatusCode,
    pub description: Option<String>,
    /// Keyed by content type essence.
    pub contents: IndexMap<String, Content>,
}

impl Response {
    pub fn is_2xx(&self) -> bool {
        self.status.class() == Some(2)
    }

    pub fn is_4xx(&self) -> bool {
        self.status.class() == Some(4)
    }

    pub fn json(&self) -> Option<&Content> {
        self.contents.get(APPLICATION_JSON)
    }
}

/// A security scheme key plus scopes attached to an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SecurityRequirement {
    pub scheme: String,
    pub scopes: Vec<String>,
}

/// An entry of `components.securitySchemes`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SecurityScheme {
    pub key: String,
    #[serde(rename = "type")]
    pub scheme_type: String,
    /// Header, query or cookie name for `apiKey` schemes.
    pub name: Option<String>,
    pub location: Option<ParameterLocation>,
    /// HTTP authorization scheme, e.g. `bearer`.
    pub scheme: Option<String>,
    pub bearer_format: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Operation {
    pub method: HttpMethod,
    pub path: String,
    pub operation_id: String,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub parameters: Vec<Parameter>,
    /// Keyed by content type essence, in declaration order.
    pub request_bodies: IndexMap<String, Content>,
    pub responses: Vec<Response>,
    pub security: Vec<SecurityRequirement>,
}

impl Operation {
    pub fn new(method: HttpMethod, path: impl Into<String>, operation_id: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            operation_id: operation_id.into(),
            summary: None,
            description: None,
            tags: Vec::new(),
            parameters: Vec::new(),
            request_bodies: IndexMap::new(),
            responses: Vec::new(),
            security: Vec::new(),
        }
    }

    fn params_in(&self, location: ParameterLocation) -> Vec<&Parameter> {
        self.parameters
            .iter()
            .filter(|parameter| parameter.location == location)
            .collect()
    }

    pub fn path_params(&self) -> Vec<&Parameter> {
        self.params_in(ParameterLocation::Path)
    }

    pub fn query_params(&self) -> Vec<&Parameter> {
        self.params_in(ParameterLocation::Query)
    }

    pub fn header_params(&self) -> Vec<&Parameter> {
        self.params_in(ParameterLocation::Header)
    }

    pub fn cookie_params(&self) -> Vec<&Parameter> {
        self.params_in(ParameterLocation::Cookie)
    }

    /// The request body a client sends: JSON, then form, then multipart,
    /// otherwise the first declared content type.
    pub fn request_body(&self) -> Option<&Content> {
        REQUEST_BODY_PREFERENCE
            .iter()
            .find_map(|content_type| self.request_bodies.get(*content_type))
            .or_else(|| self.request_bodies.values().next())
    }

    /// No required parameter, no required body and no security requirement.
    pub fn has_only_optional_params(&self) -> bool {
        !self.parameters.iter().any(|parameter| parameter.required)
            && !self.request_bodies.values().any(|content| content.required)
            && self.security.is_empty()
    }

    /// The first 2xx response.
    pub fn success_response(&self) -> Option<&Response> {
        self.responses.iter().find(|response| response.is_2xx())
    }

    /// Schema of the JSON content of the first 2xx response.
    pub fn response_type(&self) -> Option<&Schema> {
        self.success_response()
            .and_then(Response::json)
            .map(|content| &content.schema)
    }
}
