//! Wire format spoken with the recommendation worker.
//!
//! Requests are one JSON object per line on the worker's stdin:
//!
//! ```text
//! {"action":"recommend","liked_paintings":["a1"],"exclude_paintings":["a2"],"count":10}
//! ```
//!
//! Replies are one complete JSON value on stdout (the worker happens to
//! newline-terminate them, but framing relies on the value being complete):
//!
//! ```text
//! {"recommendations":[{"id":"a3","score":0.91}]}
//! {"error":"No liked paintings provided","recommendations":[]}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Which similarity strategy to ask the worker for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecommendAction {
    /// Nearest neighbours of the centroid of the liked set
    #[default]
    Recommend,
    /// Mix of centroid and weighted neighbours for varied tastes
    Diverse,
}

impl std::str::FromStr for RecommendAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "recommend" => Ok(RecommendAction::Recommend),
            "diverse" => Ok(RecommendAction::Diverse),
            other => Err(format!("unknown recommendation action: {other}")),
        }
    }
}

/// One request to the worker
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum WorkerRequest {
    Recommend {
        liked_paintings: Vec<String>,
        exclude_paintings: Vec<String>,
        count: usize,
    },
    Diverse {
        liked_paintings: Vec<String>,
        exclude_paintings: Vec<String>,
        count: usize,
    },
    /// Artist-affinity workload: artist names weighted by like counts
    Artists {
        artists: Vec<String>,
        weights: Vec<u32>,
    },
    /// Worker health and collection statistics
    Stats,
}

impl WorkerRequest {
    pub fn similar(
        action: RecommendAction,
        liked: Vec<String>,
        excluded: Vec<String>,
        count: usize,
    ) -> Self {
        match action {
            RecommendAction::Recommend => WorkerRequest::Recommend {
                liked_paintings: liked,
                exclude_paintings: excluded,
                count,
            },
            RecommendAction::Diverse => WorkerRequest::Diverse {
                liked_paintings: liked,
                exclude_paintings: excluded,
                count,
            },
        }
    }

    pub fn action(&self) -> &'static str {
        match self {
            WorkerRequest::Recommend { .. } => "recommend",
            WorkerRequest::Diverse { .. } => "diverse",
            WorkerRequest::Artists { .. } => "artists",
            WorkerRequest::Stats => "stats",
        }
    }

    /// Serialise as a single newline-terminated record
    pub fn encode(&self) -> Result<Vec<u8>, serde_json::Error> {
        let mut line = serde_json::to_vec(self)?;
        line.push(b'\n');
        Ok(line)
    }
}

// =============================================================================
// Replies
// =============================================================================

/// A key in the worker's identifier space: a string or a number
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
enum WorkerKey {
    Text(String),
    Number(serde_json::Number),
}

impl fmt::Display for WorkerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerKey::Text(s) => f.write_str(s),
            WorkerKey::Number(n) => write!(f, "{n}"),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawCandidate {
    Scored {
        #[serde(alias = "_id")]
        id: WorkerKey,
        #[serde(default, alias = "mongodb_id")]
        catalog_id: Option<WorkerKey>,
        #[serde(default, alias = "similarity_score")]
        score: Option<f64>,
    },
    Bare(WorkerKey),
}

/// One recommended item as the worker named it.
///
/// `key` lives in the worker's identifier space. `catalog_id`, when the
/// worker provides it, is the document-store id of the same artwork.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawCandidate")]
pub struct WorkerCandidate {
    #[serde(rename = "id")]
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catalog_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

impl From<RawCandidate> for WorkerCandidate {
    fn from(raw: RawCandidate) -> Self {
        match raw {
            RawCandidate::Scored { id, catalog_id, score } => Self {
                key: id.to_string(),
                catalog_id: catalog_id.map(|k| k.to_string()),
                score,
            },
            RawCandidate::Bare(key) => Self {
                key: key.to_string(),
                catalog_id: None,
                score: None,
            },
        }
    }
}

/// A parsed worker reply.
///
/// Fields other than `recommendations` and `error` (timings, source,
/// collection stats) are kept in `metadata`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkerReply {
    #[serde(default)]
    pub recommendations: Vec<WorkerCandidate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

impl WorkerReply {
    /// Decode one complete JSON value taken off the worker's stdout
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_recommend_request_encoding() {
        let request = WorkerRequest::similar(
            RecommendAction::Recommend,
            vec!["a1".into()],
            vec!["a2".into(), "a3".into()],
            10,
        );

        let line = request.encode().unwrap();
        assert_eq!(line.last(), Some(&b'\n'));
        assert_eq!(line.iter().filter(|&&b| b == b'\n').count(), 1);

        let value: Value = serde_json::from_slice(&line).unwrap();
        assert_eq!(
            value,
            json!({
                "action": "recommend",
                "liked_paintings": ["a1"],
                "exclude_paintings": ["a2", "a3"],
                "count": 10
            })
        );
    }

    #[test]
    fn test_other_request_shapes() {
        let stats: Value = serde_json::to_value(WorkerRequest::Stats).unwrap();
        assert_eq!(stats, json!({"action": "stats"}));

        let artists = WorkerRequest::Artists {
            artists: vec!["Claude Monet".into()],
            weights: vec![3],
        };
        assert_eq!(artists.action(), "artists");
        assert_eq!(
            serde_json::to_value(&artists).unwrap(),
            json!({"action": "artists", "artists": ["Claude Monet"], "weights": [3]})
        );

        let diverse = WorkerRequest::similar(RecommendAction::Diverse, vec![], vec![], 5);
        assert_eq!(diverse.action(), "diverse");
    }

    #[test]
    fn test_reply_with_plain_candidates() {
        let reply = WorkerReply::from_value(json!({
            "recommendations": [{"id": "a3", "score": 0.9}, {"id": 17, "score": 0.5}]
        }))
        .unwrap();

        assert_eq!(reply.recommendations.len(), 2);
        assert_eq!(reply.recommendations[0].key, "a3");
        assert_eq!(reply.recommendations[0].score, Some(0.9));
        assert_eq!(reply.recommendations[1].key, "17");
        assert!(reply.error.is_none());
    }

    #[test]
    fn test_reply_with_document_store_fields() {
        let reply = WorkerReply::from_value(json!({
            "recommendations": [{
                "_id": "chroma-12",
                "mongodb_id": "65a1f0c2e4b0a1b2c3d4e5f6",
                "similarity_score": 0.77,
                "distance": 0.23
            }],
            "source": "chromadb",
            "processing_time_ms": 12.5
        }))
        .unwrap();

        let candidate = &reply.recommendations[0];
        assert_eq!(candidate.key, "chroma-12");
        assert_eq!(candidate.catalog_id.as_deref(), Some("65a1f0c2e4b0a1b2c3d4e5f6"));
        assert_eq!(candidate.score, Some(0.77));
        assert_eq!(reply.metadata["source"], "chromadb");
    }

    #[test]
    fn test_reply_with_bare_keys_and_error() {
        let artists = WorkerReply::from_value(json!({"recommendations": ["Paul Cezanne", "Edgar Degas"]})).unwrap();
        assert_eq!(artists.recommendations[1].key, "Edgar Degas");
        assert!(artists.recommendations[1].score.is_none());

        let rejected = WorkerReply::from_value(json!({"error": "Unknown action: x", "recommendations": []})).unwrap();
        assert_eq!(rejected.error.as_deref(), Some("Unknown action: x"));

        let stats = WorkerReply::from_value(json!({"service": "chromadb_recommendation", "status": "healthy"})).unwrap();
        assert!(stats.recommendations.is_empty());
        assert_eq!(stats.metadata["status"], "healthy");
    }

    #[test]
    fn test_non_object_reply_is_protocol_error() {
        assert!(WorkerReply::from_value(json!(["a", "b"])).is_err());
    }

    #[test]
    fn test_action_from_str() {
        assert_eq!("Diverse".parse::<RecommendAction>().unwrap(), RecommendAction::Diverse);
        assert!("nearest".parse::<RecommendAction>().is_err());
    }
}
