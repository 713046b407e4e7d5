// src/labels/mod.rs

//! Everything that knows about labeled-data files without opening them.
//!
//! - [`naming`]: output file names (tracker output, rendered video, CSV).
//! - [`pairing`]: matching a labels file with its source video.
//! - [`discover`]: finding files by extension in output directories.
//! - [`exporter`]: the opaque labels-to-CSV conversion seam.

pub mod discover;
pub mod exporter;
pub mod naming;
pub mod pairing;

pub use discover::{ExtensionMatcher, find_files};
pub use exporter::{ConvertExporter, ExportFuture, LabelsExporter};
pub use naming::{csv_file_name, file_name, render_output_path, track_output_path};
pub use pairing::resolve_paired_video;
