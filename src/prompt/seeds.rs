use rand::Rng;
use serde_json::{Map, Value};

use crate::utils::prompt_ops::is_link;

const SEED_FIELDS: [&str; 2] = ["seed", "noise_seed"];

/// Fresh 15-digit seed.
pub fn random_seed() -> u64 {
    rand::thread_rng().gen_range(100_000_000_000_000..1_000_000_000_000_000)
}

/// Rewrite every `seed` / `noise_seed` input of every node. Inputs wired to
/// another node's output are left alone. Returns how many fields changed.
pub fn randomize_seeds(graph: &mut Map<String, Value>) -> usize {
    let mut changed = 0;
    for node in graph.values_mut() {
        let Some(inputs) = node.get_mut("inputs").and_then(Value::as_object_mut) else {
            continue;
        };
        for field in SEED_FIELDS {
            if let Some(slot) = inputs.get_mut(field) {
                if is_link(slot) {
                    continue;
                }
                *slot = Value::from(random_seed());
                changed += 1;
            }
        }
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn seeds_have_fifteen_digits() {
        for _ in 0..100 {
            assert_eq!(random_seed().to_string().len(), 15);
        }
    }

    #[test]
    fn rewrites_seed_and_noise_seed_but_not_links() {
        let mut graph = match json!({
            "3": {"inputs": {"seed": 1, "steps": 20}, "class_type": "KSampler"},
            "5": {"inputs": {"noise_seed": 2}, "class_type": "SamplerCustomAdvanced"},
            "6": {"inputs": {"seed": ["12", 0]}, "class_type": "KSampler"},
            "7": {"class_type": "Note"}
        }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        assert_eq!(randomize_seeds(&mut graph), 2);
        assert_ne!(graph["3"]["inputs"]["seed"], json!(1));
        assert_ne!(graph["5"]["inputs"]["noise_seed"], json!(2));
        assert_eq!(graph["6"]["inputs"]["seed"], json!(["12", 0]));
        assert_eq!(graph["3"]["inputs"]["steps"], json!(20));
    }
}
