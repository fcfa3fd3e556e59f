//! Template parameterization: prompt text, geometry, seeds, edit inputs.
pub mod aspect;
pub mod constructor;
pub mod seeds;

pub use aspect::AspectRatio;
pub use constructor::{EditInputs, EditParams, GenerationParams, PromptConstructor};
