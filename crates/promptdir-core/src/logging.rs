//! Structured logging field name constants.
//!
//! All crates use these names so that log output can be queried by the same
//! keys regardless of which subsystem emitted it.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, automatic fallback applied |
//! | INFO  | Lifecycle events, operation completions |
//! | DEBUG | Decision points, stage transitions, config choices |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Subsystem originating the log event.
/// Values: "store", "bucket", "inference", "submit", "cli"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "local_store", "remote_store", "gemini", "pipeline"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "load_all", "insert", "upload", "generate_image"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Record id being operated on.
pub const RECORD_ID: &str = "record_id";

/// Object storage key.
pub const STORAGE_KEY: &str = "storage_key";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of records returned by a load.
pub const RESULT_COUNT: &str = "result_count";

/// Byte length of an image payload.
pub const IMAGE_BYTES: &str = "image_bytes";

// ─── Inference fields ──────────────────────────────────────────────────────

/// Model name used for inference.
pub const MODEL: &str = "model";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Connectivity status after an operation.
pub const STATUS: &str = "status";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";
