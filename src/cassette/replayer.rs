//! Serves recorded interactions back in order.

use std::collections::{HashMap, VecDeque};

use super::format::{Cassette, Interaction};

/// Replays a cassette, handing out interactions per `(port, method)` pair in
/// the order they were recorded.
#[derive(Debug)]
pub struct CassetteReplayer {
    queues: HashMap<(String, String), VecDeque<Interaction>>,
}

impl CassetteReplayer {
    /// Index a loaded cassette for replay.
    #[must_use]
    pub fn new(cassette: &Cassette) -> Self {
        let mut queues: HashMap<(String, String), VecDeque<Interaction>> = HashMap::new();
        for interaction in &cassette.interactions {
            queues
                .entry((interaction.port.clone(), interaction.method.clone()))
                .or_default()
                .push_back(interaction.clone());
        }
        for queue in queues.values_mut() {
            queue.make_contiguous().sort_by_key(|i| i.seq);
        }
        Self { queues }
    }

    /// Take the next interaction for `port`/`method`.
    ///
    /// # Errors
    ///
    /// Returns an error if the cassette holds no (more) interactions for the pair.
    pub fn next_interaction(&mut self, port: &str, method: &str) -> Result<Interaction, String> {
        let key = (port.to_string(), method.to_string());
        let Some(queue) = self.queues.get_mut(&key) else {
            let mut available: Vec<String> =
                self.queues.keys().map(|(p, m)| format!("{p}::{m}")).collect();
            available.sort();
            return Err(format!(
                "Cassette has no interactions for {port}::{method}. Available: [{}]",
                available.join(", ")
            ));
        };
        queue
            .pop_front()
            .ok_or_else(|| format!("Cassette exhausted: all {port}::{method} interactions consumed"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn interaction(seq: u64, prompt: &str) -> Interaction {
        Interaction {
            seq,
            port: "image_generator".into(),
            method: "generate".into(),
            input: json!({ "prompt": prompt }),
            output: json!({"Ok": {"images": []}}),
        }
    }

    fn cassette(interactions: Vec<Interaction>) -> Cassette {
        Cassette { name: "test".into(), recorded_at: Utc::now(), commit: "abc".into(), interactions }
    }

    #[test]
    fn replays_in_sequence_order() {
        let mut replayer =
            CassetteReplayer::new(&cassette(vec![interaction(1, "second"), interaction(0, "first")]));

        let first = replayer.next_interaction("image_generator", "generate").unwrap();
        assert_eq!(first.input["prompt"], "first");
        let second = replayer.next_interaction("image_generator", "generate").unwrap();
        assert_eq!(second.input["prompt"], "second");
    }

    #[test]
    fn exhausted_cassette_errors() {
        let mut replayer = CassetteReplayer::new(&cassette(vec![interaction(0, "only")]));
        assert!(replayer.next_interaction("image_generator", "generate").is_ok());

        let err = replayer.next_interaction("image_generator", "generate").unwrap_err();
        assert!(err.contains("Cassette exhausted"));
    }

    #[test]
    fn unknown_port_lists_available_pairs() {
        let mut replayer = CassetteReplayer::new(&cassette(vec![interaction(0, "only")]));
        let err = replayer.next_interaction("unknown", "method").unwrap_err();
        assert!(err.contains("image_generator::generate"));
    }
}
