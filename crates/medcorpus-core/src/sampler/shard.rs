//! Shard buffer and writer.
//!
//! Sentences accumulate in memory until the configured threshold, then the
//! buffer is shuffled and written as `<prefix>_partNNN.csv`. A shard is
//! serialized to a temporary file and renamed into place before the buffer
//! is cleared and the sequence number advances, so a failed write loses
//! nothing that was buffered and never leaves a gap in the numbering.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use regex::Regex;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::errors::{CorpusError, CorpusResult};
use crate::models::SynthesizedSentence;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";
const RETRY_BASE_DELAY: Duration = Duration::from_millis(100);
const RETRY_MAX_DELAY: Duration = Duration::from_secs(5);

static SHARD_FILE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?P<prefix>.+)_part(?P<seq>\d+)\.csv$").unwrap());

/// A shard that has been durably written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShardInfo {
    pub seq: u32,
    pub path: PathBuf,
    pub rows: usize,
    /// Hex SHA-256 of the file bytes.
    pub sha256: String,
}

pub struct ShardWriter {
    output_dir: PathBuf,
    prefix: String,
    threshold: usize,
    buffer: Vec<SynthesizedSentence>,
    next_seq: u32,
    rng: StdRng,
    write_bom: bool,
    flush_retries: u32,
    written: Vec<ShardInfo>,
}

impl std::fmt::Debug for ShardWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShardWriter")
            .field("output_dir", &self.output_dir)
            .field("prefix", &self.prefix)
            .field("threshold", &self.threshold)
            .field("buffered", &self.buffer.len())
            .field("next_seq", &self.next_seq)
            .finish()
    }
}

impl ShardWriter {
    /// Create the output directory if needed. Numbering starts at 1.
    pub fn new(output_dir: &Path, prefix: &str, threshold: usize, rng: StdRng) -> CorpusResult<Self> {
        std::fs::create_dir_all(output_dir).map_err(|e| CorpusError::ShardWrite {
            path: output_dir.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(Self {
            output_dir: output_dir.to_path_buf(),
            prefix: prefix.to_string(),
            threshold: threshold.max(1),
            buffer: Vec::with_capacity(threshold.max(1)),
            next_seq: 1,
            rng,
            write_bom: true,
            flush_retries: 0,
            written: Vec::new(),
        })
    }

    pub fn with_bom(mut self, write_bom: bool) -> Self {
        self.write_bom = write_bom;
        self
    }

    pub fn with_retries(mut self, flush_retries: u32) -> Self {
        self.flush_retries = flush_retries;
        self
    }

    pub fn shard_path(&self, seq: u32) -> PathBuf {
        self.output_dir
            .join(format!("{}_part{:03}.csv", self.prefix, seq))
    }

    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    pub fn written(&self) -> &[ShardInfo] {
        &self.written
    }

    /// Buffer one sentence, flushing when the threshold is reached.
    pub fn append(&mut self, sentence: SynthesizedSentence) -> CorpusResult<Option<ShardInfo>> {
        self.buffer.push(sentence);
        if self.buffer.len() >= self.threshold {
            return self.flush();
        }
        Ok(None)
    }

    /// Shuffle and write the buffer as the next shard. No-op when empty.
    pub fn flush(&mut self) -> CorpusResult<Option<ShardInfo>> {
        if self.buffer.is_empty() {
            return Ok(None);
        }
        self.buffer.shuffle(&mut self.rng);
        let seq = self.next_seq;
        let path = self.shard_path(seq);
        let (rows, sha256) = self.write_with_retry(&path)?;

        self.buffer.clear();
        self.next_seq += 1;
        let shard = ShardInfo {
            seq,
            path,
            rows,
            sha256,
        };
        info!("Wrote shard {} ({} rows)", shard.path.display(), rows);
        self.written.push(shard.clone());
        Ok(Some(shard))
    }

    /// Flush the remainder and return every shard written by this writer.
    pub fn finish(mut self) -> CorpusResult<Vec<ShardInfo>> {
        self.flush()?;
        Ok(self.written)
    }

    fn write_with_retry(&self, path: &Path) -> CorpusResult<(usize, String)> {
        let mut attempt = 0;
        loop {
            match write_shard(path, &self.buffer, self.write_bom) {
                Ok(digest) => return Ok((self.buffer.len(), digest)),
                Err(e) if attempt < self.flush_retries => {
                    let delay = RETRY_BASE_DELAY
                        .saturating_mul(1 << attempt.min(16))
                        .min(RETRY_MAX_DELAY);
                    warn!(
                        "Shard write attempt {} failed: {e}; retrying in {} ms",
                        attempt + 1,
                        delay.as_millis()
                    );
                    std::thread::sleep(delay);
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

fn shard_write_error(path: &Path, message: impl std::fmt::Display) -> CorpusError {
    CorpusError::ShardWrite {
        path: path.to_path_buf(),
        message: message.to_string(),
    }
}

/// Serialize `rows` as CSV, write through a temp file and rename into
/// place. Returns the SHA-256 of the written bytes.
fn write_shard(path: &Path, rows: &[SynthesizedSentence], write_bom: bool) -> CorpusResult<String> {
    let mut bytes = Vec::new();
    if write_bom {
        bytes.extend_from_slice(UTF8_BOM);
    }
    let mut writer = csv::Writer::from_writer(bytes);
    for row in rows {
        writer
            .serialize(row)
            .map_err(|e| shard_write_error(path, e))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| shard_write_error(path, e))?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp_path = path.with_file_name(format!(".{file_name}.tmp"));
    let write_result = std::fs::write(&tmp_path, &bytes)
        .and_then(|_| std::fs::rename(&tmp_path, path));
    if let Err(e) = write_result {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(shard_write_error(path, e));
    }
    Ok(sha256_hex(&bytes))
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

// ---------------------------------------------------------------------------
// Reading shards back
// ---------------------------------------------------------------------------

/// Parse every row of a shard file.
pub fn read_shard(path: &Path) -> CorpusResult<Vec<SynthesizedSentence>> {
    let bytes = std::fs::read(path)?;
    parse_rows(path, &bytes)
}

fn parse_rows(path: &Path, bytes: &[u8]) -> CorpusResult<Vec<SynthesizedSentence>> {
    let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let mut reader = csv::Reader::from_reader(body);
    let mut rows = Vec::new();
    for row in reader.deserialize() {
        let row: SynthesizedSentence = row.map_err(|e| {
            CorpusError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("{}: {e}", path.display()),
            ))
        })?;
        rows.push(row);
    }
    Ok(rows)
}

/// Shards named `<prefix>_partNNN.csv` directly inside `output_dir`, in
/// sequence order.
pub fn list_shards(output_dir: &Path, prefix: &str) -> CorpusResult<Vec<ShardInfo>> {
    let mut shards = Vec::new();
    for entry in WalkDir::new(output_dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| CorpusError::Io(std::io::Error::other(e.to_string())))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        let Some(caps) = SHARD_FILE_RE.captures(&name) else {
            continue;
        };
        if &caps["prefix"] != prefix {
            continue;
        }
        let Ok(seq) = caps["seq"].parse::<u32>() else {
            continue;
        };
        let bytes = std::fs::read(entry.path())?;
        let rows = parse_rows(entry.path(), &bytes)?.len();
        shards.push(ShardInfo {
            seq,
            path: entry.path().to_path_buf(),
            rows,
            sha256: sha256_hex(&bytes),
        });
    }
    shards.sort_by_key(|s| s.seq);
    Ok(shards)
}
