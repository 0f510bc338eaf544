//! EffortProof Stream
//!
//! Telemetry session lifecycle: bounded buffering, session statistics,
//! proving hand-off and the archive side channel.

#![warn(missing_docs)]

pub mod archive;
pub mod buffer;
pub mod error;
pub mod session;

pub use archive::{ArchiveRecord, FileArchive, NullArchive, TelemetryArchive};
pub use buffer::{SessionStats, TelemetryBuffer, DEFAULT_CAPACITY};
pub use error::{StreamError, StreamResult};
pub use session::{SessionMetadata, SessionProof, SessionReport, TelemetrySession};
