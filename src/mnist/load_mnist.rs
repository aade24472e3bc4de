use std::io::{self, BufRead, Read};
use std::path::Path;

use csv::ByteRecord;
use rayon::prelude::*;
use tracing::debug;

use crate::error::{Error, Result};
use crate::image::ImageRecord;
use crate::{IMAGE_AREA, N_CLASSES};

/// Which of the two Kaggle digit layouts a file uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RowKind {
    /// `label,pixel0,...,pixel783`
    Labeled,
    /// `pixel0,...,pixel783`
    Unlabeled,
}

impl RowKind {
    pub fn field_count(self) -> usize {
        IMAGE_AREA + self.label_offset()
    }

    // Number of fields in front of the pixels
    fn label_offset(self) -> usize {
        match self {
            RowKind::Labeled => 1,
            RowKind::Unlabeled => 0,
        }
    }
}

// Load digit images from a csv file.
// The expected format is:
// - One header line, always skipped
// - One image per row, labeled rows start with the class label 0-9
// - The rest of the row consists of 28x28 pixel values, row-major
// - The pixel values are represented as integers, 0-255
// Any bad row fails the whole load.
pub fn load_mnist(path: impl AsRef<Path>, kind: RowKind) -> Result<Vec<ImageRecord>> {
    let path = path.as_ref();
    debug!("Reading {:?} rows from {}", kind, path.display());
    // The file is closed when the reader drops, on success and error alike
    let file = std::fs::File::open(path)?;
    read_mnist(file, kind)
}

// Same as load_mnist, for any byte source
pub fn read_mnist(source: impl io::Read, kind: RowKind) -> Result<Vec<ImageRecord>> {
    let mut source = io::BufReader::new(source);
    // The header is exactly one physical line, whatever it holds
    let mut header = Vec::new();
    source.read_until(b'\n', &mut header)?;
    let mut body = Vec::new();
    source.read_to_end(&mut body)?;

    // The csv reader silently skips empty lines, so they are caught here
    if let Some(index) = find_blank_line(&body) {
        return Err(Error::MalformedRecord {
            line: index as u64 + 2,
            content: String::new(),
            reason: "empty line".to_string(),
        });
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        // Field counts are checked per row so the error can name the line
        .flexible(true)
        // Plain comma splitting, quotes are just bytes
        .quoting(false)
        .from_reader(body.as_slice());

    let rows = reader
        .byte_records()
        .collect::<std::result::Result<Vec<ByteRecord>, csv::Error>>()?;
    debug!("Read {} rows, parsing", rows.len());

    // Indexed parallel iteration keeps file order, and ids are the row index
    rows.par_iter()
        .enumerate()
        .map(|(id, row)| parse_row(id, row, kind))
        .collect()
}

// Index of the first empty line, ignoring the end of input after a final newline
fn find_blank_line(body: &[u8]) -> Option<usize> {
    if body.is_empty() {
        return None;
    }
    let body = body.strip_suffix(b"\n").unwrap_or(body);
    body.split(|&byte| byte == b'\n')
        .position(|line| line.strip_suffix(b"\r").unwrap_or(line).is_empty())
}

fn parse_field(field: &[u8]) -> Option<u8> {
    std::str::from_utf8(field).ok()?.parse().ok()
}

fn parse_row(id: usize, row: &ByteRecord, kind: RowKind) -> Result<ImageRecord> {
    let malformed = |reason: String| Error::MalformedRecord {
        // No blank lines get this far, so row id 0 sits on line 2, after the header
        line: id as u64 + 2,
        content: row
            .iter()
            .map(String::from_utf8_lossy)
            .collect::<Vec<_>>()
            .join(","),
        reason,
    };

    if row.len() != kind.field_count() {
        return Err(malformed(format!(
            "expected {} fields, found {}",
            kind.field_count(),
            row.len()
        )));
    }

    let pixels = row
        .iter()
        .skip(kind.label_offset())
        .map(|field| {
            parse_field(field).ok_or_else(|| {
                malformed(format!(
                    "pixel {:?} is not an integer in 0..=255",
                    String::from_utf8_lossy(field)
                ))
            })
        })
        .collect::<Result<Vec<u8>>>()?;

    let record = ImageRecord::from_pixels(id, &pixels)
        .ok_or_else(|| malformed(format!("expected {} pixels", IMAGE_AREA)))?;

    match kind {
        RowKind::Unlabeled => Ok(record),
        RowKind::Labeled => {
            let field = &row[0];
            let label = parse_field(field)
                .filter(|&label| (label as usize) < N_CLASSES)
                .ok_or_else(|| {
                    malformed(format!(
                        "label {:?} is not a digit 0-9",
                        String::from_utf8_lossy(field)
                    ))
                })?;
            Ok(record.with_label(label))
        }
    }
}
