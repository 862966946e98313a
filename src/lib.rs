//! # Pantry Match
//!
//! Ingredient normalization and recipe matching.
//!
//! Free-text ingredient phrases ("2 tablespoons packed light brown sugar")
//! are mapped to canonical catalog names ("brown sugar"), first by exact
//! lookup against every name and alias, then by embedding similarity. The
//! normalized list is ranked against stored recipes by how many required
//! ingredients are missing.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────┐   ┌───────────────┐
//! │   Catalog   │──▶│  Vocabulary  │──▶│ EmbeddingIndex│
//! │ JSON/SQLite │   │ exact lookup │   │ cosine search │
//! └─────────────┘   └──────┬───────┘   └──────┬────────┘
//!                          └────────┬─────────┘
//!                                   ▼
//!                          ┌─────────────────┐   ┌──────────┐
//!                          │   Normalizer    │──▶│  Ranker  │◀── recipes
//!                          └─────────────────┘   └────┬─────┘
//!                                                     │
//!                                ┌────────────────────┤
//!                                ▼                    ▼
//!                           ┌──────────┐        ┌──────────┐
//!                           │   CLI    │        │   HTTP   │
//!                           │ (pantry) │        │  (axum)  │
//!                           └──────────┘        └──────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`error`] | Typed matching errors |
//! | [`models`] | Core data types |
//! | [`catalog`] | Validated catalog and canonical-name resolution |
//! | [`vocabulary`] | Unrolled vocabulary and exact matching |
//! | [`parser`] | Phrase parser seam and heuristic parser |
//! | [`embedding`] | Embedding provider abstraction |
//! | [`semantic`] | Embedding index and semantic matcher |
//! | [`match_log`] | Audit and miss logs for fuzzy matches |
//! | [`normalizer`] | Ingredient normalizer |
//! | [`ranker`] | Recipe ranking and admission |
//! | [`store`] | Catalog and recipe storage backends |
//! | [`engine`] | Constructed matching context |
//! | [`api`] | Service request/response shapes |
//! | [`import`] | Bulk recipe import |
//! | [`server`] | HTTP server |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |

pub mod api;
pub mod catalog;
pub mod catalog_cmd;
pub mod config;
pub mod db;
pub mod embedding;
pub mod engine;
pub mod error;
pub mod import;
pub mod match_log;
pub mod migrate;
pub mod models;
pub mod normalizer;
pub mod parser;
pub mod query_cmd;
pub mod ranker;
pub mod semantic;
pub mod server;
pub mod store;
pub mod vocabulary;
