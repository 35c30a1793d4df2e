//! Character matrix reader: the external collaborator that turns a user's
//! alignment file into the per-object encoded statesets [`crate::arena::TreeArena::init_statesets`]
//! expects.
//!
//! Grounded in the original engine's `CReadFiles`: format sniffing, PHYLIP's
//! fixed ten-character name field and sequential/interleaved auto-detection,
//! and the character-cleaning rules for Clustal/MSF/PHYLIP bodies all follow
//! that implementation. Unlike `CReadFiles` (which threw, by convention,
//! only on truly unrecoverable I/O failure and otherwise used return codes),
//! every format or content problem here is a [`MatrixError`] - this is the
//! one layer of the engine where malformed input is an ordinary, expected
//! occurrence rather than a programming error.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::MatrixError;

/// Width of the fixed name field in classic (non-relaxed) PHYLIP format.
pub const PHYLIP_NAME_LENGTH: usize = 10;

/// §6's full PHYLIP-allowed per-site alphabet: nucleotide and protein
/// residues plus stop/gap/unknown. `encode_residue` below only *encodes* the
/// nucleotide subset of this set (see its doc comment); this constant exists
/// so a rejected protein residue can still be told apart from a genuinely
/// invalid character.
pub const PHYLIP_ALLOWED_CHARACTERS: &str = "ABCDEFGHIKLMNPQRSTVWXYZ*?-";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Fasta,
    Phylip,
    Clustal,
    Msf,
    Nexus,
}

/// A fully decoded character matrix: object names paired with per-object
/// encoded rows, ready for [`crate::arena::TreeArena::init_statesets`].
#[derive(Debug, Clone)]
pub struct Matrix {
    pub names: Vec<String>,
    pub rows: Vec<Vec<u8>>,
    pub n: i64,
    pub m: i64,
}

/// Read and decode the matrix at `path`, sniffing its format from content.
pub fn read_matrix(path: impl AsRef<Path>) -> Result<Matrix, MatrixError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .map_err(|source| MatrixError::Io { path: path.to_path_buf(), source })?;
    let format = sniff_format(&text).ok_or_else(|| MatrixError::UnknownFormat { path: path.to_path_buf() })?;
    read_matrix_as(path, format)
}

/// Read and decode the matrix at `path` using an explicitly chosen format,
/// bypassing content sniffing - the CLI's `--format` flag uses this when the
/// caller already knows the file's format (e.g. a `.phy` file whose content
/// happens to sniff ambiguously).
pub fn read_matrix_as(path: impl AsRef<Path>, format: Format) -> Result<Matrix, MatrixError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .map_err(|source| MatrixError::Io { path: path.to_path_buf(), source })?;
    let sequences = match format {
        Format::Fasta => read_fasta(&text, path)?,
        Format::Phylip => read_phylip(&text, path)?,
        Format::Clustal => read_clustal(&text, path)?,
        Format::Msf => read_msf(&text, path)?,
        Format::Nexus => read_nexus(&text, path)?,
    };
    build_matrix(sequences, path)
}

/// Read just the `ntax`/`nchar` header of a PHYLIP file, without decoding
/// the body - mirrors `phylip_mat_dims_in`, used to size an arena before
/// the (possibly large) body is parsed.
pub fn phylip_mat_dims_in(path: impl AsRef<Path>) -> Result<(i64, i64), MatrixError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .map_err(|source| MatrixError::Io { path: path.to_path_buf(), source })?;
    let header = text
        .lines()
        .find(|l| !l.trim().is_empty())
        .ok_or_else(|| MatrixError::MalformedHeader {
            format: "PHYLIP",
            path: path.to_path_buf(),
            line: 1,
            detail: "file is empty".into(),
        })?;
    parse_phylip_header(header, path)
}

fn parse_phylip_header(line: &str, path: &Path) -> Result<(i64, i64), MatrixError> {
    let mut fields = line.split_whitespace();
    let ntax = fields.next().and_then(|f| f.parse::<i64>().ok());
    let nchar = fields.next().and_then(|f| f.parse::<i64>().ok());
    match (ntax, nchar) {
        (Some(ntax), Some(nchar)) if ntax > 0 && nchar > 0 => Ok((ntax, nchar)),
        _ => Err(MatrixError::MalformedHeader {
            format: "PHYLIP",
            path: path.to_path_buf(),
            line: 1,
            detail: format!("expected \"<ntax> <nchar>\", got {line:?}"),
        }),
    }
}

fn sniff_format(text: &str) -> Option<Format> {
    let first = text.lines().find(|l| !l.trim().is_empty())?.trim();
    let upper = first.to_ascii_uppercase();

    if first.starts_with('>') {
        return Some(Format::Fasta);
    }
    if upper.starts_with("#NEXUS") {
        return Some(Format::Nexus);
    }
    if upper.starts_with("CLUSTAL") {
        return Some(Format::Clustal);
    }
    if upper.contains("MSF:") || upper.starts_with("!!NA_MULTIPLE_ALIGNMENT") || upper.starts_with("!!AA_MULTIPLE_ALIGNMENT") {
        return Some(Format::Msf);
    }
    if parse_phylip_header(first, Path::new("")).is_ok() {
        return Some(Format::Phylip);
    }
    None
}

/// Residue -> possible-states bitmask, per IUPAC nucleotide ambiguity codes.
/// Gaps and fully-ambiguous codes map to the all-states mask.
///
/// This only covers nucleotide data: the bitmask has four data bits (one per
/// base), leaving no room to also distinguish the ~20 amino acids in §6's
/// wider PHYLIP-allowed alphabet without colliding distinct residues onto the
/// same bits and silently mis-scoring them. A protein-only residue (valid
/// per §6, just not encodable here) is reported by the caller as
/// [`MatrixError::UnsupportedMoleculeType`] rather than accepted and
/// corrupted; see SPEC_FULL.md §12.
fn encode_residue(ch: char) -> Option<u8> {
    Some(match ch.to_ascii_uppercase() {
        'A' => 0b0001,
        'C' => 0b0010,
        'G' => 0b0100,
        'T' | 'U' => 0b1000,
        'R' => 0b0101,
        'Y' => 0b1010,
        'S' => 0b0110,
        'W' => 0b1001,
        'K' => 0b1100,
        'M' => 0b0011,
        'B' => 0b1110,
        'D' => 0b1101,
        'H' => 0b1011,
        'V' => 0b0111,
        'N' | '?' | '-' | 'X' => 0b1111,
        _ => return None,
    })
}

fn encode_sequence(name: &str, seq: &str, path: &Path) -> Result<Vec<u8>, MatrixError> {
    seq.chars()
        .enumerate()
        .map(|(column, ch)| {
            encode_residue(ch).ok_or_else(|| {
                if PHYLIP_ALLOWED_CHARACTERS.contains(ch.to_ascii_uppercase()) {
                    MatrixError::UnsupportedMoleculeType {
                        path: path.to_path_buf(),
                        name: name.to_string(),
                        column,
                        ch,
                    }
                } else {
                    MatrixError::UnsupportedCharacter {
                        path: path.to_path_buf(),
                        name: name.to_string(),
                        column,
                        ch,
                    }
                }
            })
        })
        .collect()
}

/// Strip whitespace and digits (position numbering, as PHYLIP/Clustal files
/// sometimes interleave) from a sequence fragment, keeping only residue and
/// gap characters - mirrors `clean_phylip_dna_sequence`.
fn clean_sequence_fragment(fragment: &str) -> String {
    fragment.chars().filter(|c| !c.is_whitespace() && !c.is_ascii_digit()).collect()
}

/// Append `fragment`'s cleaned residues onto the sequence already
/// accumulated for `name`, preserving first-seen name order.
fn accumulate(seqs: &mut Vec<(String, String)>, name: &str, fragment: &str) {
    let cleaned = clean_sequence_fragment(fragment);
    if let Some(entry) = seqs.iter_mut().find(|(n, _)| n == name) {
        entry.1.push_str(&cleaned);
    } else {
        seqs.push((name.to_string(), cleaned));
    }
}

fn read_fasta(text: &str, path: &Path) -> Result<Vec<(String, String)>, MatrixError> {
    let mut seqs: Vec<(String, String)> = Vec::new();
    let mut current: Option<String> = None;

    for line in text.lines() {
        let line = line.trim_end();
        if line.trim().is_empty() {
            continue;
        }
        if let Some(rest) = line.strip_prefix('>') {
            let name = rest.trim().split_whitespace().next().unwrap_or("").to_string();
            if seqs.iter().any(|(n, _)| n == &name) {
                return Err(MatrixError::DuplicateTaxonName { path: path.to_path_buf(), name });
            }
            seqs.push((name.clone(), String::new()));
            current = Some(name);
        } else {
            let name = current.as_ref().ok_or_else(|| MatrixError::MalformedHeader {
                format: "FASTA",
                path: path.to_path_buf(),
                line: 1,
                detail: "sequence data before the first header".into(),
            })?;
            accumulate(&mut seqs, name, line);
        }
    }
    Ok(seqs)
}

fn read_phylip(text: &str, path: &Path) -> Result<Vec<(String, String)>, MatrixError> {
    let mut lines = text.lines().filter(|l| !l.trim().is_empty());
    let header = lines.next().ok_or_else(|| MatrixError::MalformedHeader {
        format: "PHYLIP",
        path: path.to_path_buf(),
        line: 1,
        detail: "file is empty".into(),
    })?;
    let (ntax, nchar) = parse_phylip_header(header, path)?;
    let ntax = ntax as usize;
    let nchar = nchar as usize;

    let mut seqs: Vec<(String, String)> = Vec::new();
    for line in lines.by_ref().take(ntax) {
        let (name_field, rest) = if line.len() >= PHYLIP_NAME_LENGTH {
            line.split_at(PHYLIP_NAME_LENGTH)
        } else {
            (line, "")
        };
        let name = name_field.trim().to_string();
        if seqs.iter().any(|(n, _)| n == &name) {
            return Err(MatrixError::DuplicateTaxonName { path: path.to_path_buf(), name });
        }
        seqs.push((name.clone(), clean_sequence_fragment(rest)));
    }
    if seqs.len() != ntax {
        return Err(MatrixError::TaxonCountMismatch { path: path.to_path_buf(), declared: ntax, found: seqs.len() });
    }

    // Sequential format already has every taxon at full length; anything
    // short means the file is interleaved and continuation blocks follow,
    // one per taxon, in the same order, with no name field.
    let complete = seqs.iter().all(|(_, s)| s.len() >= nchar);
    if !complete {
        'blocks: loop {
            for i in 0..ntax {
                match lines.next() {
                    Some(line) => {
                        let cleaned = clean_sequence_fragment(line);
                        seqs[i].1.push_str(&cleaned);
                    }
                    None => break 'blocks,
                }
            }
            if seqs.iter().all(|(_, s)| s.len() >= nchar) {
                break;
            }
        }
    }

    for (name, seq) in &seqs {
        if seq.len() != nchar {
            return Err(MatrixError::SequenceLengthMismatch {
                path: path.to_path_buf(),
                name: name.clone(),
                declared: nchar,
                found: seq.len(),
            });
        }
    }
    Ok(seqs)
}

fn read_clustal(text: &str, path: &Path) -> Result<Vec<(String, String)>, MatrixError> {
    let mut seqs: Vec<(String, String)> = Vec::new();
    for line in text.lines().skip(1) {
        let trimmed = line.trim_end();
        if trimmed.trim().is_empty() {
            continue;
        }
        // Consensus/conservation lines have no leading name field (they
        // start with whitespace in the original alignment, already
        // excluded above) or consist solely of match-indicator characters.
        let mut fields = trimmed.split_whitespace();
        let name = match fields.next() {
            Some(n) if n.chars().any(|c| c.is_alphanumeric()) => n,
            _ => continue,
        };
        let seq_field = match fields.next() {
            Some(f) => f,
            None => continue,
        };
        if seq_field.chars().all(|c| matches!(c, '*' | ':' | '.' | ' ')) {
            continue;
        }
        accumulate(&mut seqs, name, seq_field);
    }
    if seqs.is_empty() {
        return Err(MatrixError::EmptyMatrix { path: path.to_path_buf() });
    }
    Ok(seqs)
}

fn read_msf(text: &str, path: &Path) -> Result<Vec<(String, String)>, MatrixError> {
    let mut lines = text.lines();
    for line in lines.by_ref() {
        if line.trim() == "//" {
            break;
        }
    }
    let mut seqs: Vec<(String, String)> = Vec::new();
    for line in lines {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let mut fields = trimmed.split_whitespace();
        let name = match fields.next() {
            Some(n) => n,
            None => continue,
        };
        for field in fields {
            accumulate(&mut seqs, name, field);
        }
    }
    if seqs.is_empty() {
        return Err(MatrixError::EmptyMatrix { path: path.to_path_buf() });
    }
    Ok(seqs)
}

fn read_nexus(text: &str, path: &Path) -> Result<Vec<(String, String)>, MatrixError> {
    let upper = text.to_ascii_uppercase();
    let matrix_at = upper.find("MATRIX").ok_or_else(|| MatrixError::MalformedHeader {
        format: "NEXUS",
        path: path.to_path_buf(),
        line: 1,
        detail: "no MATRIX block found".into(),
    })?;
    let body_start = matrix_at + "MATRIX".len();
    let body_end = text[body_start..].find(';').map(|i| body_start + i).unwrap_or(text.len());
    let body = &text[body_start..body_end];

    let mut seqs: Vec<(String, String)> = Vec::new();
    for line in body.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('[') {
            continue;
        }
        let mut fields = trimmed.splitn(2, char::is_whitespace);
        let name = match fields.next() {
            Some(n) if !n.is_empty() => n,
            _ => continue,
        };
        let seq = fields.next().unwrap_or("");
        accumulate(&mut seqs, name, seq);
    }
    if seqs.is_empty() {
        return Err(MatrixError::EmptyMatrix { path: path.to_path_buf() });
    }
    Ok(seqs)
}

fn build_matrix(sequences: Vec<(String, String)>, path: &Path) -> Result<Matrix, MatrixError> {
    if sequences.is_empty() {
        return Err(MatrixError::EmptyMatrix { path: path.to_path_buf() });
    }
    let width = sequences[0].1.len();
    for (name, seq) in &sequences {
        if seq.len() != width {
            return Err(MatrixError::SequenceLengthMismatch {
                path: path.to_path_buf(),
                name: name.clone(),
                declared: width,
                found: seq.len(),
            });
        }
    }

    let mut names = Vec::with_capacity(sequences.len());
    let mut rows = Vec::with_capacity(sequences.len());
    for (name, seq) in &sequences {
        rows.push(encode_sequence(name, seq, path)?);
        names.push(name.clone());
    }

    Ok(Matrix { n: names.len() as i64, m: width as i64, names, rows })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(contents: &str) -> tempfile_like::TempPath {
        tempfile_like::write(contents)
    }

    /// A tiny ad hoc stand-in for a temp-file crate: the teacher pack does
    /// not depend on one, and these tests only need a path `read_matrix`
    /// can open.
    mod tempfile_like {
        use std::fs::File;
        use std::io::Write as _;
        use std::path::PathBuf;
        use std::sync::atomic::{AtomicU64, Ordering};

        static COUNTER: AtomicU64 = AtomicU64::new(0);

        pub struct TempPath(pub PathBuf);
        impl Drop for TempPath {
            fn drop(&mut self) {
                let _ = std::fs::remove_file(&self.0);
            }
        }
        impl AsRef<std::path::Path> for TempPath {
            fn as_ref(&self) -> &std::path::Path {
                &self.0
            }
        }

        pub fn write(contents: &str) -> TempPath {
            let mut path = std::env::temp_dir();
            let unique = format!("lvb_matrix_test_{}_{}", std::process::id(), COUNTER.fetch_add(1, Ordering::Relaxed));
            path.push(unique);
            let mut f = File::create(&path).expect("create temp file");
            f.write_all(contents.as_bytes()).expect("write temp file");
            TempPath(path)
        }
    }

    #[test]
    fn sniffs_fasta() {
        let text = ">a\nACGT\n>b\nACGA\n";
        assert_eq!(sniff_format(text), Some(Format::Fasta));
    }

    #[test]
    fn sniffs_phylip() {
        assert_eq!(sniff_format(" 4 6\n"), Some(Format::Phylip));
    }

    #[test]
    fn sniffs_nexus() {
        assert_eq!(sniff_format("#NEXUS\nBEGIN DATA;\n"), Some(Format::Nexus));
    }

    #[test]
    fn reads_fasta_matrix() {
        let path = write_temp(">alpha\nACGT\n>beta\nACGA\n");
        let m = read_matrix(&path).expect("parse");
        assert_eq!(m.n, 2);
        assert_eq!(m.m, 4);
        assert_eq!(m.names, vec!["alpha", "beta"]);
    }

    #[test]
    fn reads_sequential_phylip_matrix() {
        let path = write_temp("2 4\nalpha     ACGT\nbeta      ACGA\n");
        let m = read_matrix(&path).expect("parse");
        assert_eq!(m.n, 2);
        assert_eq!(m.m, 4);
    }

    #[test]
    fn reads_interleaved_phylip_matrix() {
        let path = write_temp("2 8\nalpha     ACGT\nbeta      ACGA\n\nACGT\nACGA\n");
        let m = read_matrix(&path).expect("parse");
        assert_eq!(m.n, 2);
        assert_eq!(m.m, 8);
    }

    #[test]
    fn rejects_unrecognised_residue() {
        let path = write_temp(">a\nACGJ\n>b\nACGT\n");
        let err = read_matrix(&path).unwrap_err();
        assert!(matches!(err, MatrixError::UnsupportedCharacter { .. }));
    }

    #[test]
    fn rejects_protein_residue_as_unsupported_molecule_type() {
        // 'E' is in §6's PHYLIP-allowed alphabet (it's Glutamate) but is not
        // one of the nucleotide/ambiguity codes this reader encodes.
        let path = write_temp(">a\nACGE\n>b\nACGT\n");
        let err = read_matrix(&path).unwrap_err();
        assert!(matches!(err, MatrixError::UnsupportedMoleculeType { .. }));
    }

    #[test]
    fn rejects_mismatched_lengths() {
        let path = write_temp(">a\nACGT\n>b\nACG\n");
        let err = read_matrix(&path).unwrap_err();
        assert!(matches!(err, MatrixError::SequenceLengthMismatch { .. }));
    }

    #[test]
    fn phylip_dims_probe_reads_header_only() {
        let path = write_temp("3 10\nalpha     AAAAAAAAAA\nbeta      AAAAAAAAAA\ngamma     AAAAAAAAAA\n");
        let (n, m) = phylip_mat_dims_in(&path).expect("dims");
        assert_eq!((n, m), (3, 10));
    }
}
