//! ABI infrastructure - selector indexing and alloy-based decoding

mod decoder;
mod indexer;

pub use decoder::InterfaceDecoder;
pub use indexer::InterfaceIndexer;
