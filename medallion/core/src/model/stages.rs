//! Models for transformation stages

use serde::{Deserialize, Serialize};

/// A medallion layer. The declaration order of the variants is the canonical
/// lineage order: earlier layers must complete before later layers start.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[cfg_attr(feature = "schema_gen", derive(schemars::JsonSchema))]
#[serde(rename_all = "snake_case")]
pub enum Layer {
    /// Raw ingested data, loaded as-is
    Bronze,
    /// Cleaned and conformed data
    Silver,
    /// Business-level aggregates
    Gold,
    /// Consumer-facing marts
    Datamart,
}

impl Layer {
    /// All layers in lineage order.
    pub const ALL: [Layer; 4] = [Layer::Bronze, Layer::Silver, Layer::Gold, Layer::Datamart];

    pub fn name(&self) -> &'static str {
        match self {
            Layer::Bronze => "bronze",
            Layer::Silver => "silver",
            Layer::Gold => "gold",
            Layer::Datamart => "datamart",
        }
    }

    /// Default dbt selection filter for this layer.
    pub fn path_filter(&self) -> String {
        format!("path:models/{}", self.name())
    }
}

impl std::fmt::Display for Layer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Definition for a transformation stage: a named group of jobs selected by
/// a path filter and executed as one unit by the transformation tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema_gen", derive(schemars::JsonSchema))]
#[serde(rename_all = "snake_case")]
pub struct Stage {
    /// Layer this stage materializes
    pub layer: Layer,

    /// Group identifier, defaults to the layer name
    #[serde(default)]
    pub name: Option<String>,

    /// Selection filter passed to the transformation tool, defaults to the
    /// layer's `path:models/<layer>` filter
    #[serde(default)]
    pub select: Option<String>,
}

impl Stage {
    /// Stage with the layer defaults for name and selection filter.
    pub fn for_layer(layer: Layer) -> Self {
        Self {
            layer,
            name: None,
            select: None,
        }
    }

    /// Effective group identifier.
    pub fn group_id(&self) -> &str {
        self.name.as_deref().unwrap_or_else(|| self.layer.name())
    }

    /// Effective selection filter.
    pub fn select_filter(&self) -> String {
        self.select
            .clone()
            .unwrap_or_else(|| self.layer.path_filter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layer_order_matches_lineage() {
        assert!(Layer::Bronze < Layer::Silver);
        assert!(Layer::Silver < Layer::Gold);
        assert!(Layer::Gold < Layer::Datamart);
    }

    #[test]
    fn stage_defaults_derive_from_layer() {
        let stage = Stage::for_layer(Layer::Silver);
        assert_eq!(stage.group_id(), "silver");
        assert_eq!(stage.select_filter(), "path:models/silver");
    }

    #[test]
    fn stage_overrides_take_precedence() {
        let stage = Stage {
            layer: Layer::Gold,
            name: Some("gold_finance".to_string()),
            select: Some("path:models/gold/finance".to_string()),
        };
        assert_eq!(stage.group_id(), "gold_finance");
        assert_eq!(stage.select_filter(), "path:models/gold/finance");
    }
}
