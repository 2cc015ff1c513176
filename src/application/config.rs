// ============================================================
// Layer 2 - Pipeline Configuration
// ============================================================
// Every knob of a run in one serde struct. Missing fields fall
// back to their defaults, so a config file only has to name
// what it changes:
//
//   {
//     "data_path": "data/spam.csv",
//     "variants": [ { "name": "max_ft_3000", "max_features": 3000 } ],
//     "stacking_final": { "model": "random_forest", "n_trees": 100, "seed": 2 }
//   }
//
// The cleaning rules (`drop_columns`, `rename_columns`,
// `label_column`, `text_column`) sit at the top level of the
// same JSON object.

use serde::{Deserialize, Serialize};

use crate::data::cleaner::CleaningRules;
use crate::ml::classifier::ModelKind;

// ─── Feature variants ─────────────────────────────────────────────────────────
// One row of experiments: how the TF-IDF matrix is built before
// the model zoo runs on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVariant {
    pub name:              String,
    #[serde(default)]
    pub max_features:      Option<usize>,
    /// Min-max scale every column to [0, 1]
    #[serde(default)]
    pub scale:             bool,
    /// Append the raw character count as one extra column
    #[serde(default)]
    pub append_char_count: bool,
}

impl FeatureVariant {
    pub fn new(name: impl Into<String>, max_features: Option<usize>) -> Self {
        Self { name: name.into(), max_features, scale: false, append_char_count: false }
    }
}

fn default_variants() -> Vec<FeatureVariant> {
    vec![
        FeatureVariant::new("max_ft_3000", Some(3000)),
        FeatureVariant { scale: true, ..FeatureVariant::new("scaling", Some(3000)) },
        FeatureVariant {
            scale: true,
            append_char_count: true,
            ..FeatureVariant::new("num_chars", Some(3000))
        },
    ]
}

// ─── Pipeline configuration ───────────────────────────────────────────────────
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub data_path:        String,
    #[serde(flatten)]
    pub cleaning:         CleaningRules,
    pub test_fraction:    f64,
    pub seed:             u64,
    pub variants:         Vec<FeatureVariant>,
    pub histogram_bins:   usize,
    pub top_words:        usize,
    pub voting_members:   Vec<String>,
    pub stacking_members: Vec<String>,
    pub stacking_final:   ModelKind,
    pub stacking_folds:   usize,
    /// Directory for performance.csv; no report file when unset
    pub report_dir:       Option<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let members = vec!["SVC".to_string(), "NB".to_string(), "ETC".to_string()];
        Self {
            data_path:        "data/spam.csv".to_string(),
            cleaning:         CleaningRules::default(),
            test_fraction:    0.2,
            seed:             2,
            variants:         default_variants(),
            histogram_bins:   20,
            top_words:        30,
            voting_members:   members.clone(),
            stacking_members: members,
            stacking_final:   ModelKind::RandomForest { n_trees: 100, seed: 2 },
            stacking_folds:   5,
            report_dir:       None,
        }
    }
}

impl PipelineConfig {
    /// Rejects settings no run could succeed with.
    pub fn validate(&self) -> anyhow::Result<()> {
        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            anyhow::bail!("test_fraction must lie in (0, 1), got {}", self.test_fraction);
        }
        if self.variants.is_empty() {
            anyhow::bail!("at least one feature variant is required");
        }
        if self.histogram_bins == 0 {
            anyhow::bail!("histogram_bins must be at least 1");
        }
        if self.stacking_folds < 2 {
            anyhow::bail!("stacking_folds must be at least 2, got {}", self.stacking_folds);
        }
        Ok(())
    }
}
