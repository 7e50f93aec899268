//! Data layer: core types, loading, filtering, and derived tables.
//!
//! Architecture:
//! ```text
//!  remote snapshot ──▶ snapshot ──▶ local .csv
//!                                      │
//!  .csv / .json / .parquet             ▼
//!        └──────────────────▶   ┌──────────┐
//!                               │  loader   │  parse file → CatchDataset
//!                               └──────────┘
//!                                      │
//!                                      ▼
//!                             ┌──────────────┐
//!                             │ CatchDataset  │  Vec<CatchRecord>, capabilities
//!                             └──────────────┘
//!                                      │
//!                                      ▼
//!                               ┌──────────┐
//!                               │  filter   │  port/species/year → indices
//!                               └──────────┘
//!                                      │
//!                                      ▼
//!                              ┌───────────┐
//!                              │ aggregate  │  totals, pivots, CPUE
//!                              └───────────┘
//! ```
pub mod aggregate;
pub mod filter;
pub mod loader;
pub mod model;
pub mod sample;
pub mod snapshot;
