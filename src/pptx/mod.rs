//! PresentationML (.pptx) layer.
//!
//! Template-focused subset of the format: open a deck, address slides by
//! number, rewrite positionally-addressed text boxes without losing their
//! formatting, embed pictures, save.

pub mod package;
pub(crate) mod picture;
pub mod presentation;
pub(crate) mod textframe;

pub use package::Package;
pub use presentation::Presentation;
