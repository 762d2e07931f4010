//! Delimiter detection over a small sample of leading lines.

use std::io::{BufRead, BufReader, Cursor, Read, Seek, SeekFrom};

use crate::delimiter::{DEFAULT_SAMPLE_LINES, Delimiter};
use crate::encoding::decode;
use crate::error::{CombineError, Result};

/// Delimiter detector.
///
/// Reads the first few lines of a stream, scores every [`Delimiter`] candidate
/// by how many quote-aware field splits it produces, and picks the best one.
/// The stream position is left exactly where it was found.
///
/// # Example
///
/// ```
/// use csv_combine::{Delimiter, Detector};
///
/// let detector = Detector::new();
/// let delimiter = detector.detect_bytes(b"a;b;c\n1;2;3\n").unwrap();
/// assert_eq!(delimiter, Delimiter::Semicolon);
/// ```
#[derive(Debug, Clone)]
pub struct Detector {
    /// Maximum number of lines to sample.
    sample_lines: usize,
}

impl Default for Detector {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of one detection, with the score of every candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detection {
    /// The chosen delimiter.
    pub delimiter: Delimiter,
    /// Split count per candidate, in candidate order.
    pub scores: Vec<(Delimiter, usize)>,
    /// Number of non-blank lines that were scored.
    pub sampled_lines: usize,
}

impl Detector {
    /// Create a detector sampling [`DEFAULT_SAMPLE_LINES`] lines.
    pub const fn new() -> Self {
        Self {
            sample_lines: DEFAULT_SAMPLE_LINES,
        }
    }

    /// Set the number of lines to sample. Must be positive.
    pub fn sample_lines(&mut self, sample_lines: usize) -> &mut Self {
        self.sample_lines = sample_lines;
        self
    }

    /// Detect the delimiter of a seekable stream.
    ///
    /// Never fails on empty or short input; those fall back to
    /// [`Delimiter::Comma`]. Errors only on IO/seek failures or a zero sample
    /// size.
    pub fn detect<R: Read + Seek>(&self, reader: R) -> Result<Delimiter> {
        Ok(self.detect_with_scores(reader)?.delimiter)
    }

    /// Detect the delimiter of in-memory data.
    pub fn detect_bytes(&self, data: &[u8]) -> Result<Delimiter> {
        self.detect(Cursor::new(data))
    }

    /// Like [`Detector::detect`], but also returns the candidate scores.
    pub fn detect_with_scores<R: Read + Seek>(&self, mut reader: R) -> Result<Detection> {
        self.validate()?;

        let sample = self.read_sample(&mut reader)?;
        let detection = self.score_sample(&sample);

        tracing::debug!(
            delimiter = %detection.delimiter,
            sampled_lines = detection.sampled_lines,
            scores = ?detection.scores,
            "detected delimiter"
        );

        Ok(detection)
    }

    /// Check the configuration before touching any stream.
    pub(crate) fn validate(&self) -> Result<()> {
        if self.sample_lines == 0 {
            return Err(CombineError::InvalidConfig(
                "sample_lines must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Read up to `sample_lines` raw lines, then seek back to where we started.
    fn read_sample<R: Read + Seek>(&self, reader: &mut R) -> Result<Vec<u8>> {
        let start = reader.stream_position()?;

        let mut sample = Vec::new();
        let read = {
            let mut buffered = BufReader::new(&mut *reader);
            let mut read = Ok(());
            for _ in 0..self.sample_lines {
                match buffered.read_until(b'\n', &mut sample) {
                    Ok(0) => break,
                    Ok(_) => {}
                    Err(e) => {
                        read = Err(e);
                        break;
                    }
                }
            }
            read
        };

        // Restore the position even when the read failed part-way.
        reader.seek(SeekFrom::Start(start))?;
        read?;

        Ok(sample)
    }

    fn score_sample(&self, sample: &[u8]) -> Detection {
        let text = decode(sample);
        let lines: Vec<&str> = text
            .lines()
            .filter(|line| !line.trim().is_empty())
            .take(self.sample_lines)
            .collect();

        let scores: Vec<(Delimiter, usize)> = Delimiter::CANDIDATES
            .iter()
            .map(|&candidate| (candidate, score_candidate(&lines, candidate)))
            .collect();

        // First maximum wins, so ties resolve in candidate order.
        let mut best = scores[0];
        for &(candidate, score) in &scores[1..] {
            if score > best.1 {
                best = (candidate, score);
            }
        }

        // Require at least one split per sampled line on average.
        let delimiter = if lines.is_empty() || best.1 < lines.len() {
            Delimiter::Comma
        } else {
            best.0
        };

        Detection {
            delimiter,
            scores,
            sampled_lines: lines.len(),
        }
    }
}

/// Sum, over the sampled lines, of the field splits a CSV tokenizer makes
/// with this delimiter. Delimiters inside quoted segments do not count.
fn score_candidate(lines: &[&str], candidate: Delimiter) -> usize {
    let mut builder = csv::ReaderBuilder::new();
    builder
        .delimiter(candidate.as_byte())
        .quote(b'"')
        .has_headers(false)
        .flexible(true);

    let mut record = csv::ByteRecord::new();
    lines
        .iter()
        .map(|line| {
            let mut reader = builder.from_reader(line.as_bytes());
            match reader.read_byte_record(&mut record) {
                Ok(true) => record.len().saturating_sub(1),
                _ => 0,
            }
        })
        .sum()
}
