//! # promptdir-submit
//!
//! Getting new records into the directory.
//!
//! - [`SubmissionPipeline`]: validate, upload and persist one draft at a time
//! - [`SubmissionForm`] / [`Prefill`]: the editable form around a draft
//! - [`Workbench`]: render a JSON body to an image and hand it to the form

pub mod form;
pub mod pipeline;
pub mod workbench;

pub use form::{Prefill, SubmissionForm};
pub use pipeline::{upload_key, validate_draft, SubmissionPipeline, SubmissionState};
pub use workbench::{GenerationState, Workbench};
