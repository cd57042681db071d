//! Core data structures for ccline.
//!
//! This module contains the description of a single compilation:
//! - Source languages
//! - Compile specs (the immutable input to argument assembly)
//! - Unit files (the on-disk form of a spec)

pub mod language;
pub mod spec;
pub mod unit;

pub use language::Language;
pub use spec::{CompileSpec, Macro};
pub use unit::{load_spec, CompileUnit};
