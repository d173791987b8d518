//! Slicer Core - Section model, structural edits, and persisted state
//!
//! This crate contains the segmentation engine behind slicer:
//! - Word/paragraph tokenization of section text
//! - Sections spanning the document-wide token stream
//! - Document model with split, join, discard and slice edits
//! - Slice planning for ranges that leave or borrow fragments
//! - JSON state persistence and configuration

pub mod config;
pub mod doc;
pub mod error;
pub mod section;
pub mod segment;
pub mod selection;
pub mod slice;
pub mod state;
pub mod token;

// Re-export commonly used types
pub use config::Config;
pub use doc::Document;
pub use error::{Side, SliceError};
pub use section::{Section, Span};
pub use segment::Segment;
pub use selection::TokenSelection;
pub use slice::{Disposition, SliceChoices, SlicePlan};
pub use state::{SectionRecord, StateFile};
pub use token::Token;
