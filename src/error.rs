//! Error types for the one genuinely recoverable layer of this crate: reading
//! a user-supplied character matrix. Everything downstream of a successful
//! read (tree construction, mutation, comparison, printing) operates on
//! data already known to satisfy the engine's structural invariants, so it
//! reports failure by panicking (§7) rather than by threading a `Result`
//! through every call.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Everything that can go wrong while reading and decoding a character
/// matrix file, grounded in `CReadFiles`'s format-specific validation.
#[derive(Debug, Error)]
pub enum MatrixError {
    #[error("could not read matrix file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("could not determine matrix format for {path} (not FASTA, PHYLIP, Clustal, MSF, or NEXUS)")]
    UnknownFormat { path: PathBuf },

    #[error("{format} header at {path}:{line} is malformed: {detail}")]
    MalformedHeader { format: &'static str, path: PathBuf, line: usize, detail: String },

    #[error("{path}: declared {declared} taxa but found {found}")]
    TaxonCountMismatch { path: PathBuf, declared: usize, found: usize },

    #[error("{path}: declared sequence length {declared} but taxon {name:?} has length {found}")]
    SequenceLengthMismatch { path: PathBuf, name: String, declared: usize, found: usize },

    #[error("{path}: taxon name {name:?} appears more than once")]
    DuplicateTaxonName { path: PathBuf, name: String },

    #[error("{path}: no sequences found")]
    EmptyMatrix { path: PathBuf },

    #[error("{path}: character {ch:?} at taxon {name:?}, column {column} is not a recognised residue code")]
    UnsupportedCharacter { path: PathBuf, name: String, column: usize, ch: char },

    #[error(
        "{path}: character {ch:?} at taxon {name:?}, column {column} is a valid PHYLIP protein residue, \
         but this reader only encodes nucleotide alignments (see SPEC_FULL.md §12)"
    )]
    UnsupportedMoleculeType { path: PathBuf, name: String, column: usize, ch: char },
}
