//! Composite map search: Overpass feature lookup followed by a similarity
//! batch over the returned feature locations.

use async_trait::async_trait;
use geoscout_core::{BoundingBox, FeatureResult};
use geoscout_overpass::{DEFAULT_RESULT_LIMIT, OverpassClient, SearchFilter};
use geoscout_vector::SimilarityEngine;
use serde::{Deserialize, Serialize};

use super::{CallToolResult, Tool, ToolDefinition};
use crate::{Error, Result, TRACING_TARGET_TOOL};

/// Name under which the tool is advertised.
pub const SEARCH_MAP_TOOL: &str = "search_map";

/// Upper bound on the `limit` argument.
const MAX_RESULT_LIMIT: usize = 50;

const DESCRIPTION: &str = "\
Search OpenStreetMap for geographic features by name and/or OSM tags, then \
find imagery chips that look similar to the chip covering each feature.

Prefer tags for feature types, e.g. {\"leisure\": \"marina\"}, \
{\"aeroway\": \"aerodrome\"}, {\"amenity\": \"parking\"}, {\"leisure\": \"park\"}, \
{\"natural\": \"water\"}. Use \"*\" as a value to match any value of a key, \
e.g. {\"parking\": \"*\"}. Name and tags can be combined.

Nodes, ways and relations are searched. Each returned feature carries its \
coordinates and up to five similar embeddings (chip id, cosine similarity \
between 0 and 1, footprint geometry in WKT and capture time). Each chip covers \
roughly 160 by 160 meters. When omitted, the search area is the extent of the \
imagery archive.";

/// Arguments accepted by the `search_map` tool.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchMapArgs {
    /// Case-insensitive name pattern.
    #[serde(default)]
    pub name: Option<String>,
    /// OSM tags, in the order the model wrote them.
    #[serde(default)]
    pub tags: Option<serde_json::Map<String, serde_json::Value>>,
    /// Search area as `[south, west, north, east]`.
    #[serde(default)]
    pub bbox: Option<[f64; 4]>,
    /// Maximum number of features.
    #[serde(default)]
    pub limit: Option<usize>,
}

impl SearchMapArgs {
    /// Builds the search filter, leaving the bounding box for the caller.
    fn into_filter(self) -> Result<(SearchFilter, Option<BoundingBox>)> {
        let mut filter = SearchFilter::new();

        if let Some(name) = self.name {
            filter = filter.with_name(name);
        }

        for (key, value) in self.tags.unwrap_or_default() {
            let serde_json::Value::String(value) = value else {
                return Err(Error::invalid_arguments(
                    SEARCH_MAP_TOOL,
                    format!("tag {key:?} must have a string value"),
                ));
            };
            filter = filter.with_tag(key, value);
        }

        let limit = self.limit.unwrap_or(DEFAULT_RESULT_LIMIT);
        filter = filter.with_result_limit(limit.min(MAX_RESULT_LIMIT));

        let bbox = self
            .bbox
            .map(BoundingBox::from_array)
            .transpose()
            .map_err(|e| Error::invalid_arguments(SEARCH_MAP_TOOL, e))?;

        Ok((filter, bbox))
    }
}

/// Structured output of the `search_map` tool.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchMapOutput {
    /// Features in Overpass order with their similar chips.
    pub features: Vec<FeatureResult>,
    /// Set when at least one similarity lookup failed or timed out.
    #[serde(default)]
    pub degraded: bool,
}

/// The `search_map` tool.
#[derive(Debug, Clone)]
pub struct SearchMapTool {
    overpass: OverpassClient,
    engine: SimilarityEngine,
}

impl SearchMapTool {
    /// Creates the tool over an Overpass client and a similarity engine.
    pub fn new(overpass: OverpassClient, engine: SimilarityEngine) -> Self {
        Self { overpass, engine }
    }

    fn input_schema() -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "name": {
                    "type": "string",
                    "description": "Search by place name (case-insensitive regex match)"
                },
                "tags": {
                    "type": "object",
                    "additionalProperties": { "type": "string" },
                    "description": "OSM tags as key-value pairs, e.g. {\"leisure\": \"marina\"}. Use \"*\" as value for wildcard matches."
                },
                "bbox": {
                    "type": "array",
                    "items": { "type": "number" },
                    "minItems": 4,
                    "maxItems": 4,
                    "description": "Optional search area as [south, west, north, east]"
                },
                "limit": {
                    "type": "integer",
                    "minimum": 1,
                    "maximum": MAX_RESULT_LIMIT,
                    "description": "Maximum number of features (default 5)"
                }
            }
        })
    }
}

#[async_trait]
impl Tool for SearchMapTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(SEARCH_MAP_TOOL, DESCRIPTION, Self::input_schema())
    }

    #[tracing::instrument(skip_all, target = TRACING_TARGET_TOOL, fields(tool = SEARCH_MAP_TOOL))]
    async fn call(&self, arguments: serde_json::Value) -> Result<CallToolResult> {
        let args: SearchMapArgs = serde_json::from_value(arguments)
            .map_err(|e| Error::invalid_arguments(SEARCH_MAP_TOOL, e))?;

        let (filter, bbox) = args.into_filter()?;
        filter
            .validate()
            .map_err(|e| Error::tool(SEARCH_MAP_TOOL, e))?;

        let bbox = match bbox {
            Some(bbox) => bbox,
            None => self.engine.bounding_box().await,
        };
        let filter = filter.with_bbox(bbox);

        let features = self
            .overpass
            .search(&filter)
            .await
            .map_err(|e| Error::tool(SEARCH_MAP_TOOL, e))?;

        let outcome = self.engine.batch_find_similar(&features, 0).await;

        tracing::info!(
            target: TRACING_TARGET_TOOL,
            features = outcome.results.len(),
            degraded = outcome.degraded,
            %bbox,
            "Map search completed"
        );

        let output = SearchMapOutput {
            features: outcome.results,
            degraded: outcome.degraded,
        };

        Ok(CallToolResult::structured(serde_json::to_value(&output)?))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use geoscout_core::{ErrorKind, MatchStatus};
    use geoscout_overpass::OverpassConfig;
    use geoscout_vector::{BoundingBoxCache, EngineConfig, MockChip, MockEmbeddingStore};
    use serde_json::json;
    use wiremock::matchers::{method, query_param_contains};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn engine(store: MockEmbeddingStore) -> SimilarityEngine {
        SimilarityEngine::new(
            Arc::new(store),
            Arc::new(BoundingBoxCache::new()),
            EngineConfig::default(),
        )
        .unwrap()
    }

    fn store() -> MockEmbeddingStore {
        MockEmbeddingStore::new(vec![
            MockChip::new("chip-a", BoundingBox::new(37.80, -122.44, 37.81, -122.43), vec![1.0, 0.0]),
            MockChip::new("chip-b", BoundingBox::new(37.76, -122.40, 37.77, -122.39), vec![0.9, 0.1]),
            MockChip::new("chip-c", BoundingBox::new(37.72, -122.48, 37.73, -122.47), vec![0.0, 1.0]),
        ])
    }

    fn tool(server: &MockServer, store: MockEmbeddingStore) -> SearchMapTool {
        let overpass = OverpassClient::new(OverpassConfig::new(server.uri())).unwrap();
        SearchMapTool::new(overpass, engine(store))
    }

    #[test]
    fn tags_keep_model_order() {
        let args: SearchMapArgs = serde_json::from_value(json!({
            "tags": {"leisure": "marina", "access": "*", "boat": "yes"}
        }))
        .unwrap();
        let (filter, bbox) = args.into_filter().unwrap();

        let keys: Vec<_> = filter.tags().iter().map(|t| t.key.as_str()).collect();
        assert_eq!(keys, ["leisure", "access", "boat"]);
        assert!(bbox.is_none());
        assert_eq!(filter.result_limit(), DEFAULT_RESULT_LIMIT);
    }

    #[test]
    fn non_string_tag_values_are_rejected() {
        let args: SearchMapArgs =
            serde_json::from_value(json!({"tags": {"capacity": 40}})).unwrap();
        let err = args.into_filter().unwrap_err();
        assert!(matches!(err, Error::InvalidArguments { .. }));
    }

    #[test]
    fn invalid_bbox_is_rejected() {
        let args: SearchMapArgs =
            serde_json::from_value(json!({"name": "Pier 39", "bbox": [38.0, -122.0, 37.0, -123.0]}))
                .unwrap();
        assert!(args.into_filter().is_err());
    }

    #[test]
    fn limit_is_capped() {
        let args = SearchMapArgs {
            name: Some("park".into()),
            limit: Some(1_000),
            ..SearchMapArgs::default()
        };
        let (filter, _) = args.into_filter().unwrap();
        assert_eq!(filter.result_limit(), MAX_RESULT_LIMIT);
    }

    #[tokio::test]
    async fn searches_within_archive_extent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param_contains("data", "node(37.72,-122.48,37.81,-122.39)"))
            .and(query_param_contains("data", "[\"leisure\"=\"marina\"]"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"elements": [
                {"type": "node", "id": 1, "lon": -122.435, "lat": 37.805, "tags": {"name": "Marina"}},
                {"type": "node", "id": 2, "lon": -100.0, "lat": 40.0},
            ]})))
            .expect(1)
            .mount(&server)
            .await;

        let result = tool(&server, store())
            .call(json!({"tags": {"leisure": "marina"}}))
            .await
            .unwrap();

        assert!(!result.is_error);
        let output: SearchMapOutput =
            serde_json::from_value(result.structured_content.unwrap()).unwrap();
        assert_eq!(output.features.len(), 2);
        assert!(!output.degraded);

        let chips: Vec<_> = output.features[0]
            .matches
            .iter()
            .map(|m| m.chip_id.as_str())
            .collect();
        assert_eq!(chips, ["chip-b", "chip-c"]);
        assert_eq!(output.features[1].status, MatchStatus::NoContainingChip);
    }

    #[tokio::test]
    async fn missing_name_and_tags_fails_before_any_lookup() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let store = Arc::new(store());
        let overpass = OverpassClient::new(OverpassConfig::new(server.uri())).unwrap();
        let engine = SimilarityEngine::new(
            store.clone(),
            Arc::new(BoundingBoxCache::new()),
            EngineConfig::default(),
        )
        .unwrap();

        let err = SearchMapTool::new(overpass, engine)
            .call(json!({"name": "  "}))
            .await
            .unwrap_err();

        assert_eq!(geoscout_core::Error::from(err).kind(), ErrorKind::InvalidFilter);
        assert_eq!(store.extent_calls(), 0);
    }

    #[tokio::test]
    async fn upstream_failure_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(504).set_body_string("gateway timeout"))
            .mount(&server)
            .await;

        let err = tool(&server, store())
            .call(json!({"name": "Ferry Building"}))
            .await
            .unwrap_err();

        assert!(err.is_retryable());
        assert_eq!(
            geoscout_core::Error::from(err).kind(),
            ErrorKind::UpstreamUnavailable
        );
    }
}
