//! Per-kind tool defaults read out of the templates.
//!
//! Built once at startup and handed to the tool handlers. Extraction never
//! fails: a missing or oddly typed field is logged and replaced by the
//! hardcoded fallback.
use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value;

use crate::prompt::AspectRatio;
use crate::workflow::{nodes, JobKind, JobTemplate, TemplateStore};

pub const FALLBACK_PROMPT: &str = "beautiful scenery nature glass bottle landscape, , purple galaxy bottle,";
pub const FALLBACK_SIZE: u32 = 512;
pub const FALLBACK_BATCH_SIZE: u32 = 1;
pub const FALLBACK_GUIDANCE: f64 = 3.5;
pub const FALLBACK_STEPS: u32 = 50;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct KindDefaults {
    pub prompt: String,
    pub width: u32,
    pub height: u32,
    pub batch_size: u32,
    pub aspect_ratio: Option<AspectRatio>,
    pub guidance: Option<f64>,
    pub steps: Option<u32>,
}

impl KindDefaults {
    pub fn fallback(kind: JobKind) -> Self {
        match kind {
            JobKind::Txt2Img | JobKind::Txt2Bg => KindDefaults {
                prompt: FALLBACK_PROMPT.to_string(),
                width: FALLBACK_SIZE,
                height: FALLBACK_SIZE,
                batch_size: FALLBACK_BATCH_SIZE,
                aspect_ratio: None,
                guidance: None,
                steps: None,
            },
            JobKind::ImgEdit => KindDefaults {
                prompt: String::new(),
                width: FALLBACK_SIZE,
                height: FALLBACK_SIZE,
                batch_size: FALLBACK_BATCH_SIZE,
                aspect_ratio: Some(AspectRatio::Wide),
                guidance: Some(FALLBACK_GUIDANCE),
                steps: Some(FALLBACK_STEPS),
            },
        }
    }

    pub fn from_template(kind: JobKind, template: &JobTemplate) -> Self {
        let fallback = KindDefaults::fallback(kind);
        let mut reader = FieldReader { kind, template, degraded: false };
        let defaults = match kind {
            JobKind::Txt2Img | JobKind::Txt2Bg => KindDefaults {
                prompt: reader.string(nodes::PROMPT, "prompt1", fallback.prompt),
                width: reader.uint(nodes::LATENT, "width", fallback.width),
                height: reader.uint(nodes::LATENT, "height", fallback.height),
                batch_size: reader.uint(nodes::LATENT, "batch_size", fallback.batch_size),
                ..fallback
            },
            JobKind::ImgEdit => KindDefaults {
                prompt: reader.string(nodes::EDIT, "prompt", fallback.prompt),
                aspect_ratio: Some(AspectRatio::parse_lenient(&reader.string(
                    nodes::EDIT,
                    "aspect_ratio",
                    AspectRatio::Wide.as_str().to_string(),
                ))),
                guidance: Some(reader.float(nodes::EDIT, "guidance", FALLBACK_GUIDANCE)),
                steps: Some(reader.uint(nodes::EDIT, "steps", FALLBACK_STEPS)),
                ..fallback
            },
        };
        if reader.degraded {
            tracing::warn!(kind = %kind, "Template defaults incomplete, hardcoded values filled in");
        }
        defaults
    }
}

struct FieldReader<'a> {
    kind: JobKind,
    template: &'a JobTemplate,
    degraded: bool,
}

impl<'a> FieldReader<'a> {
    fn field(&mut self, node: &str, field: &str) -> Option<&'a Value> {
        let template = self.template;
        let value = template.input(node, field);
        if value.is_none() {
            tracing::warn!(kind = %self.kind, node, field, "Default field missing from template");
            self.degraded = true;
        }
        value
    }

    fn string(&mut self, node: &str, field: &str, fallback: String) -> String {
        match self.field(node, field).map(|v| v.as_str().map(str::to_string)) {
            Some(Some(s)) => s,
            Some(None) => {
                self.degraded = true;
                fallback
            }
            None => fallback,
        }
    }

    fn uint(&mut self, node: &str, field: &str, fallback: u32) -> u32 {
        let parsed = self.field(node, field).map(|v| {
            v.as_u64()
                .or_else(|| v.as_str().and_then(|s| s.trim().parse().ok()))
                .and_then(|n| u32::try_from(n).ok())
        });
        match parsed {
            Some(Some(n)) => n,
            Some(None) => {
                self.degraded = true;
                fallback
            }
            None => fallback,
        }
    }

    fn float(&mut self, node: &str, field: &str, fallback: f64) -> f64 {
        let parsed = self
            .field(node, field)
            .map(|v| v.as_f64().or_else(|| v.as_str().and_then(|s| s.trim().parse().ok())));
        match parsed {
            Some(Some(n)) => n,
            Some(None) => {
                self.degraded = true;
                fallback
            }
            None => fallback,
        }
    }
}

/// Defaults for every job kind.
#[derive(Clone, Debug)]
pub struct Defaults {
    by_kind: HashMap<JobKind, KindDefaults>,
}

impl Defaults {
    pub fn load(store: &TemplateStore) -> Self {
        let by_kind = JobKind::ALL
            .into_iter()
            .map(|kind| {
                let defaults = match store.template(kind) {
                    Ok(template) => KindDefaults::from_template(kind, template),
                    Err(e) => {
                        tracing::warn!(kind = %kind, error = %e, "Using hardcoded defaults");
                        KindDefaults::fallback(kind)
                    }
                };
                (kind, defaults)
            })
            .collect();
        Defaults { by_kind }
    }

    pub fn get(&self, kind: JobKind) -> KindDefaults {
        self.by_kind
            .get(&kind)
            .cloned()
            .unwrap_or_else(|| KindDefaults::fallback(kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn template(value: Value) -> JobTemplate {
        match value {
            Value::Object(graph) => JobTemplate::from_graph(graph),
            _ => unreachable!(),
        }
    }

    #[test]
    fn reads_builtin_defaults() {
        let store = TemplateStore::builtin().unwrap();
        let defaults = Defaults::load(&store);
        let bg = defaults.get(JobKind::Txt2Bg);
        assert_eq!(bg.prompt, FALLBACK_PROMPT);
        assert_eq!((bg.width, bg.height, bg.batch_size), (1024, 576, 1));
        let edit = defaults.get(JobKind::ImgEdit);
        assert_eq!(edit.aspect_ratio, Some(AspectRatio::Wide));
        assert_eq!(edit.guidance, Some(3.5));
        assert_eq!(edit.steps, Some(50));
    }

    #[test]
    fn missing_fields_fall_back() {
        let sparse = template(json!({
            "77": {"inputs": {"width": "768", "height": "wide"}, "class_type": "EmptyLatentImage"}
        }));
        let defaults = KindDefaults::from_template(JobKind::Txt2Img, &sparse);
        assert_eq!(defaults.prompt, FALLBACK_PROMPT);
        assert_eq!(defaults.width, 768);
        assert_eq!(defaults.height, FALLBACK_SIZE);
        assert_eq!(defaults.batch_size, FALLBACK_BATCH_SIZE);
    }

    #[test]
    fn edit_defaults_tolerate_odd_types() {
        let odd = template(json!({
            "83": {
                "inputs": {"prompt": 7, "aspect_ratio": "2:1", "guidance": "4.5", "steps": -1},
                "class_type": "FluxKontextProImageNode"
            }
        }));
        let defaults = KindDefaults::from_template(JobKind::ImgEdit, &odd);
        assert_eq!(defaults.prompt, "");
        assert_eq!(defaults.aspect_ratio, Some(AspectRatio::Wide));
        assert_eq!(defaults.guidance, Some(4.5));
        assert_eq!(defaults.steps, Some(FALLBACK_STEPS));
    }
}
