//! Cinemap Vector crate - embedding codec, vector store, similarity ranking,
//! catalog snapshots, search, and the embedding backfill pipeline.
//!
//! Similarity search is an exact linear scan with normalized cosine
//! similarity. The embedding model is an injected collaborator behind the
//! `EmbeddingService` trait, with a deterministic mock for testing.

pub mod catalog;
pub mod codec;
pub mod embedding;
pub mod error;
pub mod pipeline;
pub mod ranker;
pub mod search;
pub mod similarity;
pub mod store;

pub use catalog::{Catalog, CatalogSnapshot};
pub use codec::{decode_embedding, encode_embedding, DecodeError};
pub use embedding::{DynEmbeddingService, EmbeddingService, MockEmbedding};
pub use error::VectorError;
pub use pipeline::{BackfillReport, EmbedOutcome, EmbeddingPipeline};
pub use ranker::{ScoredMovie, SimilarityRanker};
pub use search::{SearchEngine, SimilarMovie};
pub use similarity::cosine_similarity;
pub use store::{Rejection, RejectionReason, StoreDiagnostics, VectorStore};
