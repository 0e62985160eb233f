//! `components.securitySchemes` and security requirements.

use openapi_factory_document::{MappingNode, Result, SequenceNode};
use openapi_factory_ir::{OpenapiSpec, ParameterLocation, SecurityRequirement, SecurityScheme};
use tracing::debug;

pub(crate) fn build_security_schemes(schemes: &MappingNode<'_>, spec: &mut OpenapiSpec) -> Result<()> {
    for (key, node) in schemes.mapping_entries()? {
        node.ignore(&["description", "flows", "openIdConnectUrl"]);
        let scheme = SecurityScheme {
            scheme_type: node.string("type")?.required()?,
            name: node.string("name")?.optional(),
            location: node.enumeration::<ParameterLocation>("in")?.optional(),
            scheme: node.string("scheme")?.optional(),
            bearer_format: node.string("bearerFormat")?.optional(),
            key,
        };
        debug!(key = %scheme.key, scheme_type = %scheme.scheme_type, "built security scheme");
        spec.add_security_scheme(scheme);
    }
    Ok(())
}

/// A `security` list. Each entry maps scheme keys to their scopes; an empty
/// entry (`{}`) makes authentication optional and contributes nothing.
pub(crate) fn build_requirements(security: &SequenceNode<'_>) -> Result<Vec<SecurityRequirement>> {
    let mut requirements = Vec::new();
    for entry in security.mapping_nodes()? {
        for scheme in entry.key_set() {
            let scopes = entry.sequence_node(&scheme)?.required()?.string_list()?;
            requirements.push(SecurityRequirement { scheme, scopes });
        }
    }
    Ok(requirements)
}

#[cfg(test)]
mod tests {
    use openapi_factory_document::{Document, ErrorKind};

    use super::*;

    #[test]
    fn test_security_schemes() {
        let document = Document::parse(
            r#"
api_key:
  type: apiKey
  name: X-API-Key
  in: header
bearer:
  type: http
  scheme: bearer
  bearerFormat: JWT
oauth:
  type: oauth2
  flows:
    implicit:
      authorizationUrl: https://example.com/auth
      scopes: {}
"#,
            "api.yaml",
        )
        .unwrap();
        let mut spec = OpenapiSpec::new("api.yaml");
        build_security_schemes(&document.root().unwrap(), &mut spec).unwrap();

        let api_key = spec.security_scheme("api_key").unwrap();
        assert_eq!(api_key.scheme_type, "apiKey");
        assert_eq!(api_key.name.as_deref(), Some("X-API-Key"));
        assert_eq!(api_key.location, Some(ParameterLocation::Header));
        let bearer = spec.security_scheme("bearer").unwrap();
        assert_eq!(bearer.bearer_format.as_deref(), Some("JWT"));
        assert_eq!(spec.security_schemes().len(), 3);
        assert!(document.unused_keys().is_empty());
    }

    #[test]
    fn test_unknown_location_is_rejected() {
        let document = Document::parse("key:\n  type: apiKey\n  in: body\n", "api.yaml").unwrap();
        let mut spec = OpenapiSpec::new("api.yaml");
        let error = build_security_schemes(&document.root().unwrap(), &mut spec).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Structural);
        insta::assert_snapshot!(error.to_string(), @"invalid value 'body' at api.yaml#/key/in (api.yaml:3)");
    }

    #[test]
    fn test_requirements_read_scopes_of_each_scheme() {
        let document = Document::parse(
            "security:\n  - petstore_auth: [write:pets, read:pets]\n    api_key: []\n  - {}\n",
            "api.yaml",
        )
        .unwrap();
        let security = document.root().unwrap().sequence_node("security").unwrap().required().unwrap();
        let requirements = build_requirements(&security).unwrap();
        assert_eq!(
            requirements,
            vec![
                SecurityRequirement {
                    scheme: "petstore_auth".into(),
                    scopes: vec!["write:pets".into(), "read:pets".into()],
                },
                SecurityRequirement {
                    scheme: "api_key".into(),
                    scopes: vec![],
                },
            ]
        );
    }
}
