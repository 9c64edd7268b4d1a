//! Program files on disk.
//!
//! The format is chosen by extension:
//! - `.txt`: binary text format (see [`formats`](crate::asm::formats))
//! - `.hex`: hex format
//! - `.asm`: assembly source

use crate::asm::assembler::{assemble, AssemblerError};
use crate::asm::formats::{parse_hex, parse_text, render_text, ParsedProgram};
use crate::bits::InstructionWord;
use crate::cpu::PROGRAM_SIZE;
use std::path::Path;
use thiserror::Error;

/// Program file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgramFormat {
    Text,
    Hex,
    Assembly,
}

impl ProgramFormat {
    /// Pick the format from a file extension.
    pub fn from_path(path: &Path) -> Result<Self, ProgramError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("txt") => Ok(ProgramFormat::Text),
            Some("hex") => Ok(ProgramFormat::Hex),
            Some("asm") => Ok(ProgramFormat::Assembly),
            _ => Err(ProgramError::UnknownFormat(path.display().to_string())),
        }
    }
}

/// Parse program source in the given format.
///
/// Programs longer than the 64-word store are rejected.
pub fn parse_program(source: &str, format: ProgramFormat) -> Result<Vec<InstructionWord>, ProgramError> {
    let words = match format {
        ProgramFormat::Text => report_skipped(parse_text(source)),
        ProgramFormat::Hex => report_skipped(parse_hex(source)),
        ProgramFormat::Assembly => assemble(source)?,
    };

    if words.len() > PROGRAM_SIZE {
        return Err(ProgramError::Overflow { size: words.len(), capacity: PROGRAM_SIZE });
    }
    Ok(words)
}

fn report_skipped(program: ParsedProgram) -> Vec<InstructionWord> {
    if !program.skipped.is_empty() {
        log::debug!("{} non-instruction lines skipped", program.skipped.len());
    }
    program.words
}

/// Load a program file from disk.
pub fn load_program<P: AsRef<Path>>(path: P) -> Result<Vec<InstructionWord>, ProgramError> {
    let path = path.as_ref();
    let format = ProgramFormat::from_path(path)?;
    let source = std::fs::read_to_string(path)
        .map_err(|e| ProgramError::IoError(format!("{}: {}", path.display(), e)))?;

    let words = parse_program(&source, format)?;
    log::info!("loaded {} words from {}", words.len(), path.display());
    Ok(words)
}

/// Save instructions to disk in the text format.
pub fn save_text<P: AsRef<Path>>(path: P, words: &[InstructionWord]) -> Result<(), ProgramError> {
    let path = path.as_ref();
    let mut contents = format!("# {} instructions\n", words.len());
    contents.push_str(&render_text(words));

    std::fs::write(path, contents)
        .map_err(|e| ProgramError::IoError(format!("{}: {}", path.display(), e)))
}

/// Errors that can occur while loading or saving programs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProgramError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("unknown program format: {0} (expected .txt, .hex or .asm)")]
    UnknownFormat(String),

    #[error("program has {size} words, store holds {capacity}")]
    Overflow { size: usize, capacity: usize },

    #[error(transparent)]
    Assembly(#[from] AssemblerError),
}
