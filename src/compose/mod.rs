//! Budget-bounded, two-phase generative guide composition.
//!
//! * [`budget`] — ceilings and the running ledger bounding provider calls.
//! * [`draft`] — the per-request accumulator and defensive extraction parsing.
//! * [`pipeline`] — the extract-then-finalize composer itself.

pub mod budget;
pub mod draft;
pub mod pipeline;

pub use budget::{BudgetLedger, ComposeBudget};
pub use draft::{ChunkExtraction, DraftSource, GuideDraft, json_object_span, parse_extraction};
pub use pipeline::{ComposeChunking, ComposedGuide, Composer, NO_BOOKS_MESSAGE};
