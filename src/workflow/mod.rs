//! Job kinds and their static node-graph templates.
use std::fmt;
use std::str::FromStr;

use crate::error::AppError;

pub mod defaults;
pub mod templates;

pub use defaults::{Defaults, KindDefaults};
pub use templates::{JobTemplate, TemplateStore};

/// Well-known node ids inside the bundled templates.
pub mod nodes {
    /// Text encoder carrying `prompt1` (positive) and `prompt2` (negative).
    pub const PROMPT: &str = "76";
    /// Empty latent carrying `width`, `height`, `batch_size`.
    pub const LATENT: &str = "77";
    /// Checkpoint loader carrying `ckpt_name`.
    pub const CHECKPOINT: &str = "4";
    /// Image edit node carrying `prompt`, `aspect_ratio`, `guidance`, `steps`.
    pub const EDIT: &str = "83";
    /// Loader for the first input image.
    pub const FIRST_IMAGE: &str = "84";
    /// Compositor joining `image1` and `image2`.
    pub const STITCH: &str = "91";
    /// Loader for the optional second input image.
    pub const SECOND_IMAGE: &str = "102";
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum JobKind {
    Txt2Img,
    Txt2Bg,
    ImgEdit,
}

impl JobKind {
    pub const ALL: [JobKind; 3] = [JobKind::Txt2Img, JobKind::Txt2Bg, JobKind::ImgEdit];

    /// Name used for template files (`<name>_api.json`) and tool routes.
    pub fn api_name(&self) -> &'static str {
        match self {
            JobKind::Txt2Img => "txt2img",
            JobKind::Txt2Bg => "txt2bg",
            JobKind::ImgEdit => "imgedit",
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.api_name())
    }
}

impl FromStr for JobKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        JobKind::ALL
            .into_iter()
            .find(|kind| kind.api_name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| AppError::InvalidInput(format!("unknown job kind '{}'", s)))
    }
}
