// ============================================================
// Layer 6 - Infrastructure Layer
// ============================================================
// Cross-cutting concerns that don't belong in any business
// layer:
//
//   config_store.rs - Pipeline configuration
//                     Loads PipelineConfig from a JSON file
//                     ($SMS_SPAM_CONFIG or pipeline.json) and
//                     falls back to the defaults when the file
//                     does not exist.
//
//   metrics.rs      - Score report
//                     Writes every model's accuracy and
//                     precision per feature variant to
//                     performance.csv.
//
//   charts.rs       - Terminal charts
//                     Text versions of the pie chart,
//                     histograms, correlation heatmap and bar
//                     charts of the report.
//
// Reference: Rust Book §7 (Modules)
//            Rust Book §9 (Error Handling with anyhow)

/// Pipeline configuration loading and saving
pub mod config_store;

/// CSV score report
pub mod metrics;

/// Text charts for the terminal report
pub mod charts;
