//! genedeck - populate a PowerPoint template with protein annotation data
//!
//! A linear batch job around one deck: fetch a protein's annotations from
//! UniProt, NCBI Entrez, and Open Targets, substitute the template's
//! positionally-addressed text boxes without losing their formatting,
//! render two tissue-expression bar charts as PNG, embed them, and save a
//! new presentation named after the accession.
//!
//! # Example - populating a template
//!
//! ```no_run
//! use genedeck::report::{DataSources, ReportOptions, generate};
//! use std::time::Duration;
//!
//! # fn main() -> genedeck::Result<()> {
//! let opts = ReportOptions {
//!     accession: "P04637".to_string(),
//!     template: "powerpoints/input.pptx".into(),
//!     out_dir: "powerpoints".into(),
//!     scratch_dir: "scratch".into(),
//! };
//! let sources = DataSources::new(Duration::from_secs(30))?;
//! let output = generate(&opts, &sources)?;
//! println!("Wrote {}", output.display());
//! # Ok(())
//! # }
//! ```
//!
//! # Example - editing a deck directly
//!
//! ```no_run
//! use genedeck::pptx::Package;
//!
//! # fn main() -> genedeck::Result<()> {
//! let mut pkg = Package::open("powerpoints/input.pptx")?;
//!
//! // Slide numbers and text-box ordinals are 1-based
//! pkg.replace_text_box(1, 1, "P04637")?;
//!
//! for (ordinal, text) in pkg.text_boxes(2)?.iter().enumerate() {
//!     println!("Text Box {}: {}", ordinal + 1, text);
//! }
//!
//! pkg.save("powerpoints/out.pptx")?;
//! # Ok(())
//! # }
//! ```

pub mod chart;
pub mod error;
pub mod expression;
pub mod fetch;
pub mod opc;
pub mod pptx;
pub mod report;
pub mod units;

pub use error::{Error, Result};
pub use pptx::Package;
