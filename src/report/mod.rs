//! PDF report assembly from a directory tree of per-host blurbs and
//! pre-rendered chart images.

pub mod markup;
pub mod paginate;
pub mod scan;
pub mod writer;

pub use paginate::*;
pub use scan::*;
pub use writer::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("PDF generation failed: {0}")]
    Pdf(String),
    #[error("could not persist report: {0}")]
    Persist(String),
}
