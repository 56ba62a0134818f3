//! Centralized default constants for the prompt directory.
//!
//! Every crate references these constants instead of defining its own magic
//! values. Organized by domain area.

// =============================================================================
// IMAGES
// =============================================================================

/// Longest allowed side of a normalized image, in pixels.
pub const MAX_IMAGE_DIMENSION: u32 = 1024;

/// JPEG quality used when re-encoding normalized images (0-100).
pub const JPEG_QUALITY: u8 = 75;

/// MIME type of every normalized image.
pub const NORMALIZED_MIME_TYPE: &str = "image/jpeg";

/// Key extension for uploads whose bytes are not a recognised image.
pub const UPLOAD_EXTENSION: &str = "jpg";

/// Largest raw upload accepted by the normalizer (20 MiB).
pub const MAX_SOURCE_IMAGE_BYTES: usize = 20 * 1024 * 1024;

// =============================================================================
// DIRECTORY
// =============================================================================

/// Tag filter value that matches every record.
pub const ALL_TAGS: &str = "All";

/// Maximum tags produced by tag synthesis.
pub const MAX_GENERATED_TAGS: usize = 5;

/// Tags returned when tag synthesis fails.
pub const FALLBACK_TAGS: [&str; 2] = ["creative", "ai-art"];

/// Maximum length of a single tag.
pub const TAG_NAME_MAX_LENGTH: usize = 40;

/// Prefix of locally assigned record ids.
pub const LOCAL_ID_PREFIX: &str = "p-";

/// Body placed in a fresh submission form.
pub const DEFAULT_SUBMISSION_BODY: &str = "{\n  \"style\": \"cinematic\"\n}";

/// Body placed in the workbench after "clear".
pub const EMPTY_WORKBENCH_BODY: &str = "{\n  \"prompt\": \"\"\n}";

// =============================================================================
// LOCAL STORE
// =============================================================================

/// Storage key of the persisted local snapshot.
pub const SNAPSHOT_KEY: &str = "jsonprompts_data.json";

/// Default directory for the local snapshot.
pub const DATA_DIR: &str = ".promptdir";

// =============================================================================
// REMOTE STORE
// =============================================================================

/// Default remote table name.
pub const REMOTE_TABLE: &str = "prompts";

/// Default remote bucket name.
pub const REMOTE_BUCKET: &str = "prompt-images";

/// Timeout for remote table and bucket requests in seconds.
pub const REMOTE_TIMEOUT_SECS: u64 = 30;

// =============================================================================
// INFERENCE
// =============================================================================

/// Default Gemini API base URL.
pub const GEMINI_URL: &str = "https://generativelanguage.googleapis.com";

/// Default image synthesis model.
pub const IMAGE_MODEL: &str = "gemini-2.5-flash-image";

/// Default text model used for tag synthesis.
pub const TEXT_MODEL: &str = "gemini-2.5-flash";

/// Timeout for generation requests in seconds.
pub const GEN_TIMEOUT_SECS: u64 = 120;

// =============================================================================
// ENVIRONMENT VARIABLES
// =============================================================================

pub const ENV_DATA_DIR: &str = "PROMPTDIR_DATA_DIR";
pub const ENV_REMOTE_URL: &str = "PROMPTDIR_REMOTE_URL";
pub const ENV_REMOTE_KEY: &str = "PROMPTDIR_REMOTE_KEY";
pub const ENV_REMOTE_TABLE: &str = "PROMPTDIR_REMOTE_TABLE";
pub const ENV_REMOTE_BUCKET: &str = "PROMPTDIR_REMOTE_BUCKET";
pub const ENV_REMOTE_TIMEOUT_SECS: &str = "PROMPTDIR_REMOTE_TIMEOUT_SECS";
pub const ENV_GEN_TIMEOUT_SECS: &str = "PROMPTDIR_GEN_TIMEOUT_SECS";
