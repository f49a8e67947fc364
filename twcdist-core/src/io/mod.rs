// Imports
use std::{
    io::{Read, Write},
    path::Path,
};

use thiserror::Error;

use crate::{
    data::{Datum, Float, ScoreMap},
    stats::Summary,
};

/// First-column value marking a header row
pub const HEADER_KEY: &str = "resNum";
pub const REPORT_SUMMARY_PREFIX: &str = "TWC signature threshold and STD";
pub const REPORT_HEADER: [&str; 2] = ["Residue", "TWC"];

pub fn read_scores_from_file<Q: AsRef<Path>>(filepath: Q) -> Result<ScoreMap, Error> {
    let filepath: &Path = filepath.as_ref();
    let compression = filepath
        .extension()
        .and_then(|s| s.to_str())
        .map(CompressionMethod::from)
        .unwrap_or_default();

    read_scores(std::fs::OpenOptions::new().read(true).open(filepath)?, &compression)
}

/// Reads `residue,score` rows, header rows (`resNum`) and missing scores (`NA`) are skipped
pub fn read_scores<R: Read>(
    input: R,
    compression: &CompressionMethod,
) -> Result<ScoreMap, Error> {
    let csv_string = compression.decompress_to_string(input)?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(csv_string.as_bytes());

    let mut scores = ScoreMap::new();
    for (record_idx, record) in reader.records().enumerate() {
        let record = record?;
        let line = record.position().map(|pos| pos.line() as usize).unwrap_or(record_idx + 1);

        let Some(residue) = record.get(0) else {
            return Err(ParsingError::MissingField(line).into());
        };
        if residue == HEADER_KEY {
            continue;
        }
        let Some(raw_score) = record.get(1) else {
            return Err(ParsingError::MissingField(line).into());
        };
        match raw_score.parse::<Datum>() {
            Ok(Datum::Score(score)) => {
                scores.insert(residue, score);
            }
            Ok(Datum::Missing) => continue,
            Err(err) => return Err(ParsingError::InvalidScore(err, raw_score.to_string(), line).into()),
        }
    }

    Ok(scores)
}

pub fn write_report_to_file<Q: AsRef<Path>>(
    filepath: Q,
    signature: &Summary,
    anomalies: &ScoreMap,
) -> Result<(), Error> {
    let filepath = filepath.as_ref();

    let file = write_report(
        std::fs::OpenOptions::new().create(true).write(true).truncate(true).open(filepath)?,
        signature,
        anomalies,
    )?;
    file.sync_all()?;
    Ok(())
}

/// Writes the threshold summary line, the `Residue,TWC` header, then one row per anomalous residue
pub fn write_report<W: Write>(
    output: W,
    signature: &Summary,
    anomalies: &ScoreMap,
) -> Result<W, Error> {
    let mut writer = csv::WriterBuilder::new().flexible(true).from_writer(output);

    writer.write_record([
        format!("{REPORT_SUMMARY_PREFIX} {}", format_float(round_to(signature.mean, 3))),
        format_float(round_to(signature.std, 3)),
    ])?;
    writer.write_record(REPORT_HEADER)?;
    for (residue, score) in anomalies.iter() {
        writer.write_record([residue, format_float(score).as_str()])?;
    }

    writer.into_inner().map_err(|err| Error::IO(err.into_error()))
}

/// Rounds the exact binary value to `decimals` places, ties to even (`0.0625` → `0.062`, `1.0005` → `1.0`)
pub fn round_to(
    value: Float,
    decimals: usize,
) -> Float {
    format!("{value:.decimals$}").parse().unwrap_or(value)
}

/// Shortest round-trip representation, always showing a fractional part or an exponent (`1` → `1.0`, `1e-7` → `1e-07`)
pub fn format_float(value: Float) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf".to_string() } else { "-inf".to_string() };
    }

    let abs = value.abs();
    if abs != 0.0 && !(1e-4..1e16).contains(&abs) {
        let repr = format!("{value:e}");
        if let Some((mantissa, exponent)) = repr.split_once('e')
            && let Ok(exponent) = exponent.parse::<i32>()
        {
            let sign = if exponent < 0 { '-' } else { '+' };
            return format!("{mantissa}e{sign}{:02}", exponent.abs());
        }
        return repr;
    }

    let repr = format!("{value}");
    if repr.contains('.') { repr } else { repr + ".0" }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompressionMethod {
    Gzip,
    Zstd,
    #[default]
    None,
}

impl From<&str> for CompressionMethod {
    fn from(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "gz" | "gzip" => Self::Gzip,
            "zst" | "zstd" => Self::Zstd,
            _ => Self::None,
        }
    }
}

impl CompressionMethod {
    pub fn decompress_to_string<R: Read>(
        &self,
        mut input: R,
    ) -> std::io::Result<String> {
        let mut buffer: String = String::new();
        match self {
            Self::Gzip => {
                let mut decoder = flate2::read::GzDecoder::new(input);
                decoder.read_to_string(&mut buffer)?;
            }
            Self::Zstd => {
                let mut decoder = zstd::Decoder::new(input)?;
                decoder.read_to_string(&mut buffer)?;
            }
            Self::None => {
                input.read_to_string(&mut buffer)?;
            }
        }
        Ok(buffer)
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    IO(#[from] std::io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Parse(#[from] ParsingError),
}

#[derive(Debug, Error)]
pub enum ParsingError {
    #[error("Expected a residue and a score on line {0}")]
    MissingField(usize),
    #[error("Failed to parse the score `{1}` on line {2}, {0}")]
    InvalidScore(std::num::ParseFloatError, String, usize),
}
