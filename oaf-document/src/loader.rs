//! Turning relative filenames into parsed documents.

use std::{
    collections::BTreeMap,
    io,
    path::{Path, PathBuf},
};

use tracing::debug;
use url::Url;

use crate::{
    document::{Document, Format},
    error::{Error, Result},
};

/// Loads documents by their filename relative to the entry document.
pub trait DocumentLoader {
    fn load(&self, relative_filename: &str) -> Result<Document>;
}

impl<L: DocumentLoader + ?Sized> DocumentLoader for &L {
    fn load(&self, relative_filename: &str) -> Result<Document> {
        (**self).load(relative_filename)
    }
}

/// Reads documents from a directory on disk, following `.link` files.
#[derive(Debug, Clone)]
pub struct FileLoader {
    root: PathBuf,
}

impl FileLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// A loader rooted at the directory of `entry`, and the entry's filename
    /// relative to it.
    pub fn for_entry(entry: &Path) -> (Self, String) {
        let root = entry
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let filename = entry
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        (Self::new(root), filename)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn follow_link(&self, relative_filename: &str, link_path: &Path, content: &str) -> Result<Document> {
        let link_error = |message: String| {
            Box::new(Error::Link {
                link: relative_filename.to_string(),
                message,
            })
        };

        let target = content.lines().next().unwrap_or_default().trim();
        if target.is_empty() {
            return Err(link_error("link file is empty".to_string()));
        }

        let absolute = std::path::absolute(link_path).map_err(|e| link_error(e.to_string()))?;
        let base = Url::from_file_path(&absolute)
            .map_err(|()| link_error(format!("cannot express '{}' as a URL", absolute.display())))?;
        let url = base.join(target).map_err(|e| link_error(e.to_string()))?;

        let file_name = url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .filter(|segment| !segment.is_empty())
            .map(str::to_string)
            .ok_or_else(|| link_error(format!("'{url}' does not name a file")))?;
        let format = Format::from_filename(&file_name)
            .ok_or_else(|| link_error(format!("unsupported document format '{file_name}'")))?;

        let content = match url.scheme() {
            "file" => {
                let path = url
                    .to_file_path()
                    .map_err(|()| link_error(format!("invalid file URL '{url}'")))?;
                read_file(&path)?
            }
            "http" | "https" => fetch(&url).map_err(link_error)?,
            other => return Err(link_error(format!("unsupported URL scheme '{other}'"))),
        };

        let linked_name = match relative_filename.rsplit_once('/') {
            Some((directory, _)) => format!("{directory}/{file_name}"),
            None => file_name,
        };
        debug!(link = relative_filename, target = %url, "followed link");
        Document::parse_as(content, linked_name, format)
    }
}

impl DocumentLoader for FileLoader {
    fn load(&self, relative_filename: &str) -> Result<Document> {
        let path = self.root.join(relative_filename);
        let content = read_file(&path)?;
        if relative_filename.ends_with(".link") {
            return self.follow_link(relative_filename, &path, &content);
        }
        debug!(file = relative_filename, "loaded document");
        Document::parse(content, relative_filename)
    }
}

fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| {
        Box::new(Error::Io {
            path: path.to_path_buf(),
            source,
        })
    })
}

#[cfg(feature = "remote")]
fn fetch(url: &Url) -> std::result::Result<String, String> {
    let mut response = ureq::get(url.as_str()).call().map_err(|e| e.to_string())?;
    response.body_mut().read_to_string().map_err(|e| e.to_string())
}

#[cfg(not(feature = "remote"))]
fn fetch(url: &Url) -> std::result::Result<String, String> {
    Err(format!("fetching '{url}' requires the `remote` feature"))
}

/// Serves documents from memory, keyed by relative filename.
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    documents: BTreeMap<String, String>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a document, builder style.
    pub fn with(mut self, filename: impl Into<String>, content: impl Into<String>) -> Self {
        self.insert(filename, content);
        self
    }

    pub fn insert(&mut self, filename: impl Into<String>, content: impl Into<String>) {
        self.documents.insert(filename.into(), content.into());
    }
}

impl DocumentLoader for MemoryLoader {
    fn load(&self, relative_filename: &str) -> Result<Document> {
        let content = self.documents.get(relative_filename).ok_or_else(|| {
            Box::new(Error::Io {
                path: PathBuf::from(relative_filename),
                source: io::Error::new(io::ErrorKind::NotFound, "no such document"),
            })
        })?;
        debug!(file = relative_filename, "loaded document");
        Document::parse(content.clone(), relative_filename)
    }
}
