//! Workflows driven by the command-line front end.

pub mod orchestration;

pub use orchestration::{
    run_generation_body, run_release_notes, GenerationOutcome, LibraryRelease, ReleaseOutcome,
    WorkflowOptions,
};
