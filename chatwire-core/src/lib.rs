//! # chatwire-core
//!
//! Core types shared by every stage of the chatwire streaming pipeline.
//!
//! - **Actions**: [`CanonicalAction`], the vendor-agnostic vocabulary dialect
//!   parsers emit
//! - **Parts**: [`Part`], typed spans of generated output with an
//!   open/closed lifecycle
//! - **Counters**: token counts and latency markers
//! - **End reasons**: why a stream stopped
//! - **Errors**: pre-stream failures and rejected action sequences
//!
//! ## Example
//!
//! ```rust
//! use chatwire_core::{CanonicalAction, Part, PartKind};
//!
//! let action = CanonicalAction::text("Hello");
//! assert_eq!(action.kind(), "text");
//!
//! let mut part = Part::text("Hello");
//! part.append_text(", world").unwrap();
//! part.close();
//! assert_eq!(part.kind(), PartKind::Text);
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod actions;
pub mod counters;
pub mod end_reason;
pub mod errors;
pub mod identifier;
pub mod parts;

// Re-exports for convenience
pub use actions::{ArgsFormat, CanonicalAction, DialectIssue};
pub use counters::{Counters, Latency};
pub use end_reason::EndReason;
pub use errors::{ChatwireError, InvalidActionSequence, Result, TransportError};
pub use identifier::{generate_part_id, generate_stream_id, generate_tool_call_id, PartId};
pub use parts::{
    CodeExecRequest, CodeExecResponse, FunctionCall, Part, PartContent, PartKind, PartState,
};

/// Prelude module for common imports.
pub mod prelude {
    pub use crate::actions::{ArgsFormat, CanonicalAction, DialectIssue};
    pub use crate::counters::{Counters, Latency};
    pub use crate::end_reason::EndReason;
    pub use crate::errors::{ChatwireError, Result};
    pub use crate::parts::{Part, PartContent, PartKind, PartState};
}
