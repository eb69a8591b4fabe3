//! Declarative extraction engine.
//!
//! Institutions own document types, document types own blocks, blocks own a
//! transaction builder made of ordered sections. The [`Extractor`] interprets
//! these definitions over a [`Document`](crate::document::Document).

pub mod block;
pub mod classifier;
pub mod context;
pub mod document_type;
pub mod engine;
pub mod institution;
pub mod rules;
pub mod section;
pub mod transaction;

pub use block::{Block, BlockTransaction};
pub use classifier::{classify, Classification};
pub use context::{Context, ContextValue};
pub use document_type::{DocumentType, PreScan};
pub use engine::{ExtractionResult, Extractor};
pub use institution::Institution;
pub use rules::NumberLocale;
pub use section::{CaptureMap, Matcher, MatcherKind, Section, Unmatched};
pub use transaction::{Assignment, TransactionBuilder};
