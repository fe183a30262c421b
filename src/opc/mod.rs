//! Open Packaging Conventions (OPC) implementation.
//!
//! The structure and packaging format underneath `.pptx` files: parts
//! addressed by pack URI, relationships between them, a content-type index,
//! and ZIP physical packaging.

pub mod constants;
pub mod content_types;
pub mod package;
pub mod packuri;
pub mod rel;

pub use content_types::ContentTypes;
pub use package::OpcPackage;
pub use packuri::PackUri;
pub use rel::{Relationship, Relationships};
