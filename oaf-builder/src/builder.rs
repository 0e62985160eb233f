//! Orchestration of a build: entry document, referenced documents, checks.

use std::{collections::BTreeSet, path::Path};

use openapi_factory_document::{
    DocumentLoader, ErrorKind, FileLoader, MappingNode, MemoryLoader, Result,
};
use openapi_factory_ir::{Contact, Info, Model, OpenapiSpec, Server};
use tracing::{debug, info, warn};

use crate::{
    models::build_models,
    options::BuildOptions,
    paths::{OperationDefaults, build_paths},
    security::{build_requirements, build_security_schemes},
};

/// Root keys read from documents that are only consulted for their schemas.
const FOREIGN_ROOT_KEYS: &[&str] = &[
    "openapi",
    "info",
    "servers",
    "paths",
    "security",
    "tags",
    "externalDocs",
    "webhooks",
];

/// Builds an [`OpenapiSpec`] from an entry document and every document it
/// references.
///
/// # Example
///
/// ```ignore
/// use openapi_factory_builder::{BuildOptions, SpecBuilder};
/// use openapi_factory_document::FileLoader;
///
/// let spec = SpecBuilder::new(FileLoader::new("specs"))
///     .options(BuildOptions::default().strict(true))
///     .build("petstore.yaml")?;
/// for model in spec.models() {
///     println!("{} ({})", model.name(), model.kind());
/// }
/// ```
#[derive(Debug)]
pub struct SpecBuilder<L> {
    loader: L,
    options: BuildOptions,
}

impl<L: DocumentLoader> SpecBuilder<L> {
    pub fn new(loader: L) -> Self {
        Self {
            loader,
            options: BuildOptions::default(),
        }
    }

    pub fn options(mut self, options: BuildOptions) -> Self {
        self.options = options;
        self
    }

    pub fn build_options(&self) -> &BuildOptions {
        &self.options
    }

    /// Build the [`OpenapiSpec`] whose entry document is `entry`, relative to the loader.
    ///
    /// # Errors
    ///
    /// Structural and unsupported-shape errors abort at the first occurrence.
    /// References that name no model, including models of referenced
    /// documents that could not be read, are reported together once every
    /// document has been read.
    pub fn build(&self, entry: &str) -> Result<OpenapiSpec> {
        let document = self.loader.load(entry)?;
        let mut spec = OpenapiSpec::new(document.filename());
        self.read_entry(&document.root()?, &mut spec)?;

        let mut loaded = BTreeSet::from([entry.to_string(), document.filename().to_string()]);
        let mut documents = vec![document];
        loop {
            let pending: Vec<String> = spec
                .referenced_files()
                .into_iter()
                .filter(|file| !loaded.contains(*file))
                .map(str::to_string)
                .collect();
            if pending.is_empty() {
                break;
            }
            for file in pending {
                let document = match self.loader.load(&file) {
                    Ok(document) => document,
                    // its references stay unresolved and are reported with the others
                    Err(error) if error.kind() == ErrorKind::Io => {
                        warn!(file = %file, error = %error, "referenced document could not be loaded");
                        loaded.insert(file);
                        continue;
                    }
                    Err(error) => return Err(error),
                };
                debug!(file = %file, "loading referenced document");
                read_foreign(&document.root()?, &mut spec)?;
                loaded.insert(file);
                loaded.insert(document.filename().to_string());
                documents.push(document);
            }
        }

        if self.options.validate_references {
            spec.validate_references()?;
            check_compositions(&spec)?;
        }
        if self.options.strict {
            for document in &documents {
                document.check_unused()?;
            }
        }

        info!(
            entry = spec.entry_file(),
            documents = documents.len(),
            models = spec.model_count(),
            operations = spec.operations().count(),
            "built spec"
        );
        Ok(spec)
    }

    /// `info`, `servers`, `components.schemas`, `paths`, then
    /// `components.securitySchemes`.
    fn read_entry(&self, root: &MappingNode<'_>, spec: &mut OpenapiSpec) -> Result<()> {
        root.ignore(&["openapi", "tags", "externalDocs"]);
        if let Some(info) = root.mapping_node("info")?.optional() {
            spec.info = read_info(&info)?;
        }
        spec.servers = read_servers(root)?;

        let components = root.mapping_node("components")?.optional();
        if let Some(components) = &components {
            if let Some(schemas) = components.mapping_node("schemas")?.optional() {
                build_models(&schemas, spec)?;
            }
        }

        let security = match root.sequence_node("security")?.optional() {
            Some(security) => build_requirements(&security)?,
            None => Vec::new(),
        };
        if let Some(paths) = root.mapping_node("paths")?.optional() {
            let defaults = OperationDefaults {
                tag: &self.options.default_tag,
                security,
            };
            build_paths(&paths, &defaults, spec)?;
        }

        if let Some(components) = components {
            if let Some(schemes) = components.mapping_node("securitySchemes")?.optional() {
                build_security_schemes(&schemes, spec)?;
            }
        }
        Ok(())
    }
}

impl SpecBuilder<FileLoader> {
    /// A builder reading from the directory of `entry`, plus the entry's
    /// relative filename.
    pub fn for_file(entry: impl AsRef<Path>) -> (Self, String) {
        let (loader, filename) = FileLoader::for_entry(entry.as_ref());
        (Self::new(loader), filename)
    }
}

/// Build the [`OpenapiSpec`] of a file on disk and the documents it references.
pub fn build_file(entry: impl AsRef<Path>, options: BuildOptions) -> Result<OpenapiSpec> {
    let (builder, filename) = SpecBuilder::for_file(entry);
    builder.options(options).build(&filename)
}

/// Build the [`OpenapiSpec`] of a single in-memory document.
pub fn build_str(content: &str, filename: &str, options: BuildOptions) -> Result<OpenapiSpec> {
    let loader = MemoryLoader::new().with(filename, content);
    SpecBuilder::new(loader).options(options).build(filename)
}

fn read_info(info: &MappingNode<'_>) -> Result<Info> {
    info.ignore(&["license", "termsOfService", "summary"]);
    let contact = match info.mapping_node("contact")?.optional() {
        Some(contact) => Some(Contact {
            name: contact.string("name")?.optional(),
            email: contact.string("email")?.optional(),
            url: contact.string("url")?.optional(),
        }),
        None => None,
    };
    Ok(Info {
        title: info.string("title")?.optional(),
        description: info.string("description")?.optional(),
        version: info.string("version")?.optional(),
        contact,
    })
}

/// Declared servers, or one server with an empty url when none are.
fn read_servers(root: &MappingNode<'_>) -> Result<Vec<Server>> {
    let mut servers = Vec::new();
    if let Some(declared) = root.sequence_node("servers")?.optional() {
        for server in declared.mapping_nodes()? {
            server.ignore(&["variables"]);
            servers.push(Server {
                url: server.string("url")?.required()?,
                description: server.string("description")?.optional(),
                name: server.string("name")?.optional(),
            });
        }
    }
    if servers.is_empty() {
        servers.push(Server::default());
    }
    Ok(servers)
}

/// A referenced document contributes its `components.schemas` only.
fn read_foreign(root: &MappingNode<'_>, spec: &mut OpenapiSpec) -> Result<()> {
    root.ignore(FOREIGN_ROOT_KEYS);
    let Some(components) = root.mapping_node("components")?.optional() else {
        return Ok(());
    };
    let others: Vec<String> = components
        .key_set()
        .into_iter()
        .filter(|key| key != "schemas")
        .collect();
    components.ignore(&others.iter().map(String::as_str).collect::<Vec<_>>());
    if let Some(schemas) = components.mapping_node("schemas")?.optional() {
        build_models(&schemas, spec)?;
    }
    Ok(())
}

/// Flatten every `allOf` model once. Cyclic inheritance and supers without
/// properties fail here.
fn check_compositions(spec: &OpenapiSpec) -> Result<()> {
    for (_, model) in spec.declared_models() {
        if let Model::AllOf(all_of) = model {
            all_of.all_properties(spec)?;
        }
    }
    Ok(())
}
