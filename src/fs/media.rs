use std::collections::HashMap;

use mime::Mime;

use crate::fs::resolver::File;

/// A media type plus whether responses should announce `charset=utf-8`.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaType {
    mime: Mime,
    include_charset: bool,
}

impl MediaType {
    /// Textual types (`text/*`) carry a charset.
    pub fn new(mime: Mime) -> Self {
        let include_charset = mime.type_() == mime::TEXT;
        Self::with_charset(mime, include_charset)
    }

    pub fn with_charset(mime: Mime, include_charset: bool) -> Self {
        Self {
            mime,
            include_charset,
        }
    }

    pub fn html() -> Self {
        Self::new(mime::TEXT_HTML)
    }

    pub fn plain_text() -> Self {
        Self::new(mime::TEXT_PLAIN)
    }

    pub fn octet_stream() -> Self {
        Self::new(mime::APPLICATION_OCTET_STREAM)
    }

    pub fn type_(&self) -> &str {
        self.mime.type_().as_str()
    }

    pub fn subtype(&self) -> &str {
        self.mime.subtype().as_str()
    }

    /// `type/subtype`, without parameters.
    pub fn complete_type(&self) -> &str {
        self.mime.essence_str()
    }

    pub fn include_charset(&self) -> bool {
        self.include_charset
    }
}

pub trait MediaTypeDetector: Send + Sync {
    fn detect(&self, file: &File) -> MediaType;
}

/// Detection by file extension, falling back to `application/octet-stream`.
#[derive(Debug, Clone)]
pub struct ExtensionMediaTypes {
    by_extension: HashMap<&'static str, Mime>,
}

impl Default for ExtensionMediaTypes {
    fn default() -> Self {
        let mut by_extension = HashMap::new();
        for (ext, mime) in [
            ("html", mime::TEXT_HTML),
            ("htm", mime::TEXT_HTML),
            ("css", mime::TEXT_CSS),
            ("js", mime::TEXT_JAVASCRIPT),
            ("mjs", mime::TEXT_JAVASCRIPT),
            ("txt", mime::TEXT_PLAIN),
            ("csv", mime::TEXT_CSV),
            ("xml", mime::TEXT_XML),
            ("json", mime::APPLICATION_JSON),
            ("pdf", mime::APPLICATION_PDF),
            ("svg", mime::IMAGE_SVG),
            ("png", mime::IMAGE_PNG),
            ("jpg", mime::IMAGE_JPEG),
            ("jpeg", mime::IMAGE_JPEG),
            ("gif", mime::IMAGE_GIF),
            ("bmp", mime::IMAGE_BMP),
            ("woff", mime::FONT_WOFF),
            ("woff2", mime::FONT_WOFF2),
        ] {
            by_extension.insert(ext, mime);
        }

        for (ext, essence) in [
            ("ico", "image/x-icon"),
            ("webp", "image/webp"),
            ("wasm", "application/wasm"),
            ("mp4", "video/mp4"),
            ("webm", "video/webm"),
        ] {
            if let Ok(mime) = essence.parse() {
                by_extension.insert(ext, mime);
            }
        }

        Self { by_extension }
    }
}

impl ExtensionMediaTypes {
    pub fn lookup(&self, extension: &str) -> MediaType {
        self.by_extension
            .get(extension.to_ascii_lowercase().as_str())
            .cloned()
            .map(MediaType::new)
            .unwrap_or_else(MediaType::octet_stream)
    }
}

impl MediaTypeDetector for ExtensionMediaTypes {
    fn detect(&self, file: &File) -> MediaType {
        file.path()
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| self.lookup(ext))
            .unwrap_or_else(MediaType::octet_stream)
    }
}
