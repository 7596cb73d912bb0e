// compcut: connected-component partitioning of k-mer graphs
//
// Splits the implicit de Bruijn graph of a k-mer multiset into connected
// components of bounded size, refining oversized components by raising a
// frequency threshold.

//! Partition a k-mer de Bruijn graph into size-bounded components.
//!
//! The graph is never materialized: vertices are the k-mer codes stored in a
//! [`VertexIndex`] and edges are derived from the codes on the fly (see
//! [`neighbors`]). [`split`] runs one of the [`SplitStrategy`] variants and
//! returns a list of [`ConnectedComponent`]s, which can be persisted with
//! [`save_components`] and exported as FASTA with [`export_fasta`].

#![warn(missing_docs)]

pub mod component;
pub mod constants;
pub mod encoding;
pub mod export;
pub mod index;
pub mod kmer;
pub mod neighbors;
pub mod parse;
pub mod scheduler;
pub mod serialization;
pub mod splitter;

// Re-export common types at crate root
pub use component::{ComponentBody, ConnectedComponent};
pub use export::export_fasta;
pub use index::{VertexIndex, VertexState};
pub use neighbors::{Adjacency, DegreeCensus};
pub use serialization::{
    load_components, save_component_stats, save_components, save_components_as,
    ComponentFileError, ComponentFileFormat,
};
pub use splitter::{split, SplitConfiguration, SplitError, SplitStrategy};

/// Version information
pub fn version() -> (u8, u8, u8) {
    constants::VERSION
}
