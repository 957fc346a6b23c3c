//! Filesystem collaborators: request-to-file resolution and media types.

pub mod media;
pub mod resolver;

pub use media::{ExtensionMediaTypes, MediaType, MediaTypeDetector};
pub use resolver::{File, FileResolver, RootFileResolver};
