//! Engine module housing the inspection run core.
//!
//! This module exposes the collaborator seams (`backend`) and the
//! `InspectionHandle` orchestration layer (`core`). The CLI and debug HTTP
//! surfaces both drive runs through the handle.

pub mod backend;
pub mod core;

pub use backend::{Classifier, Frame, FrameSource, ScriptedClassifier, SyntheticCamera};
pub use core::{InspectionHandle, RunTrigger};
