//! Octal program image loader.
//!
//! A program image is plain text: whitespace-separated octal numbers, one
//! per memory word, loaded from word 0 upwards. Reading stops quietly at
//! the first token that is not an octal number.
//!
//! ```text
//! 012701 000005   ; anything after a non-octal token is ignored
//! ```

use std::io::Read;
use std::num::IntErrorKind;
use std::path::Path;
use thiserror::Error;
use tracing::warn;

/// A parsed program image.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgramImage {
    /// Words in load order.
    pub words: Vec<u16>,
    /// The token that stopped parsing, if input remained.
    pub stopped_at: Option<String>,
}

impl ProgramImage {
    /// Get the number of words.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// Parse an image from text.
pub fn parse_image(text: &str) -> Result<ProgramImage, LoadError> {
    let mut image = ProgramImage::default();

    for token in text.split_whitespace() {
        match u32::from_str_radix(token, 8) {
            Ok(value) => {
                let word = u16::try_from(value).map_err(|_| LoadError::WordOutOfRange {
                    index: image.words.len(),
                    token: token.to_string(),
                })?;
                image.words.push(word);
            }
            Err(e) if *e.kind() == IntErrorKind::PosOverflow => {
                return Err(LoadError::WordOutOfRange {
                    index: image.words.len(),
                    token: token.to_string(),
                });
            }
            Err(_) => {
                warn!(token, loaded = image.words.len(), "stopped reading program image");
                image.stopped_at = Some(token.to_string());
                break;
            }
        }
    }

    Ok(image)
}

/// Read and parse an image from any reader.
pub fn read_image<R: Read>(mut reader: R) -> Result<ProgramImage, LoadError> {
    let mut text = String::new();
    reader
        .read_to_string(&mut text)
        .map_err(|e| LoadError::IoError(e.to_string()))?;
    parse_image(&text)
}

/// Load an image from disk.
pub fn load_file<P: AsRef<Path>>(path: P) -> Result<ProgramImage, LoadError> {
    let file = std::fs::File::open(path.as_ref())
        .map_err(|e| LoadError::IoError(format!("{}: {}", path.as_ref().display(), e)))?;
    read_image(file)
}

/// Errors that can occur while loading an image.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("word {index} ({token}) does not fit in 16 bits")]
    WordOutOfRange { index: usize, token: String },
}
