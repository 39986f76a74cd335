//! Documents shown in the comparison viewer.
//!
//! The viewer only needs page geometry: how many pages a document has and how
//! big each page is. Glyph rasterization is left to external tools, so a
//! [`PageSource`] can be backed by a real PDF ([`PdfDocument`]) or by anything
//! else that knows its page sizes.

use std::path::{Path, PathBuf};

use lopdf::{Document, Object, ObjectId};

use crate::data::BackendClient;
use crate::error::AppError;

/// US Letter, used when a page has no readable MediaBox.
pub const FALLBACK_PAGE: PageSize = PageSize { width: 612.0, height: 792.0 };

/// Page size in PDF points at scale 1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width: f64,
    pub height: f64,
}

impl PageSize {
    pub fn scaled(&self, scale: f64) -> Self {
        Self { width: self.width * scale, height: self.height * scale }
    }
}

pub trait PageSource {
    /// Name the backend knows this document by.
    fn file_name(&self) -> &str;
    fn page_count(&self) -> u32;
    /// Size of 1-based `page`, or `None` past the end.
    fn page_size(&self, page: u32) -> Option<PageSize>;
}

/// Where a document comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentLocation {
    Local(PathBuf),
    Remote(String),
}

impl DocumentLocation {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            DocumentLocation::Remote(trimmed.to_string())
        } else {
            DocumentLocation::Local(PathBuf::from(trimmed))
        }
    }

    /// Last path segment; this is what `/textdiff` expects in `l` / `r`.
    pub fn file_name(&self) -> String {
        match self {
            DocumentLocation::Remote(url) => url.rsplit('/').next().unwrap_or_default().to_string(),
            DocumentLocation::Local(path) => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
        }
    }
}

impl std::fmt::Display for DocumentLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentLocation::Local(path) => write!(f, "{}", path.display()),
            DocumentLocation::Remote(url) => write!(f, "{url}"),
        }
    }
}

/// Page geometry read from a PDF.
#[derive(Debug, Clone, PartialEq)]
pub struct PdfDocument {
    name: String,
    pages: Vec<PageSize>,
}

impl PdfDocument {
    pub fn new(name: impl Into<String>, pages: Vec<PageSize>) -> Self {
        Self { name: name.into(), pages }
    }

    /// Load from disk or over HTTP.
    pub fn open(location: &DocumentLocation, client: &BackendClient) -> Result<Self, AppError> {
        let bytes = match location {
            DocumentLocation::Local(path) => read_file(path)?,
            DocumentLocation::Remote(url) => client
                .fetch_bytes(url)
                .map_err(|e| AppError::new(4, format!("Failed to download '{url}': {e}")))?,
        };
        Self::from_bytes(location.file_name(), &bytes)
            .map_err(|e| AppError::new(4, format!("{location}: {e}")))
    }

    pub fn from_bytes(name: impl Into<String>, bytes: &[u8]) -> Result<Self, AppError> {
        let doc = Document::load_mem(bytes).map_err(|e| AppError::new(4, format!("Invalid PDF: {e}")))?;

        // get_pages is keyed by 1-based page number, already in order.
        let pages = doc
            .get_pages()
            .values()
            .map(|&id| media_box(&doc, id).unwrap_or(FALLBACK_PAGE))
            .collect::<Vec<_>>();

        tracing::debug!(pages = pages.len(), "loaded document geometry");
        Ok(Self::new(name, pages))
    }
}

impl PageSource for PdfDocument {
    fn file_name(&self) -> &str {
        &self.name
    }

    fn page_count(&self) -> u32 {
        u32::try_from(self.pages.len()).unwrap_or(u32::MAX)
    }

    fn page_size(&self, page: u32) -> Option<PageSize> {
        let idx = usize::try_from(page).ok()?.checked_sub(1)?;
        self.pages.get(idx).copied()
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>, AppError> {
    std::fs::read(path).map_err(|e| AppError::new(4, format!("Failed to open '{}': {e}", path.display())))
}

/// MediaBox is inheritable, so walk up the page tree until one is found.
fn media_box(doc: &Document, page_id: ObjectId) -> Option<PageSize> {
    let mut current = Some(page_id);
    let mut depth = 0;
    while let Some(id) = current {
        let dict = doc.get_dictionary(id).ok()?;
        if let Ok(obj) = dict.get(b"MediaBox") {
            return parse_box(doc, obj);
        }
        depth += 1;
        if depth > 32 {
            return None;
        }
        current = dict.get(b"Parent").and_then(Object::as_reference).ok();
    }
    None
}

fn parse_box(doc: &Document, obj: &Object) -> Option<PageSize> {
    let obj = match obj {
        Object::Reference(id) => doc.get_object(*id).ok()?,
        other => other,
    };
    let values = obj
        .as_array()
        .ok()?
        .iter()
        .map(number)
        .collect::<Option<Vec<f64>>>()?;
    let [x0, y0, x1, y1] = values.as_slice() else {
        return None;
    };

    let size = PageSize { width: (x1 - x0).abs(), height: (y1 - y0).abs() };
    (size.width > 0.0 && size.height > 0.0).then_some(size)
}

fn number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(v) => Some(*v as f64),
        Object::Real(v) => Some(f64::from(*v)),
        _ => None,
    }
}
