pub mod chunker;

pub use chunker::{ChunkResult, TextChunker};
