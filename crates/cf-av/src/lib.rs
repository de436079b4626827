//! # cf-av
//!
//! External media tooling for clipforge.
//!
//! - **Command execution** ([`ToolCommand`]) -- async process builder with a
//!   timeout and a cancellation token that kills the child when fired.
//! - **Tool discovery** ([`ToolRegistry`]) -- locate ffmpeg and ffprobe from
//!   config overrides or `PATH`.
//! - **Probing** ([`MediaProbe`], [`FfprobeProber`]) -- read-only inspection
//!   yielding duration, size and container format.
//! - **Editing** ([`MediaEditor`], [`FfmpegEditor`]) -- trim a sub-range and
//!   concatenate inputs through a scoped concat manifest.

pub mod command;
pub mod editor;
pub mod manifest;
pub mod probe;
pub mod tools;

pub use command::{ToolCommand, ToolOutput};
pub use editor::{validate_merge_inputs, validate_trim_range, FfmpegEditor, MediaEditor};
pub use manifest::ConcatManifest;
pub use probe::{parse_ffprobe_output, FfprobeProber, MediaProbe, ProbeInfo};
pub use tools::{ToolInfo, ToolRegistry};
