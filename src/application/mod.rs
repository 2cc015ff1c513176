// ============================================================
// Layer 2 - Application / Use Cases
// ============================================================
// Orchestrates the other layers; no ML math and no file
// formats live here, only the order things happen in.
//
//   config.rs            - PipelineConfig and feature variants
//   prepare_use_case.rs  - load, clean, measure, normalise and
//                          print the exploration report
//   compare_use_case.rs  - vectorise, split, run the model zoo
//                          and the ensembles, pick the best model
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

pub mod config;

pub mod prepare_use_case;

pub mod compare_use_case;
