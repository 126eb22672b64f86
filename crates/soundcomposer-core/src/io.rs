//! WAV and two-column text readers used by sources, controls and filters.
//!
//! Text tables hold one `(x, y)` pair per line. An optional header line (the
//! first non-numeric line, e.g. `AnsysSound_SoundSamples`), `#` comments and
//! blank lines are skipped; columns may be separated by whitespace, `,` or `;`.
//! Multi-column source data uses [`KeyedTable`], which follows the same rules.

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::{ComposerError, ComposerResult};
use crate::signal::{ControlAxis, Signal};

static SEPARATOR_REGEX: OnceLock<Regex> = OnceLock::new();

fn separator_regex() -> &'static Regex {
    SEPARATOR_REGEX.get_or_init(|| Regex::new(r"[\s,;]+").expect("invalid regex pattern"))
}

/// Returns true if the path has a `.wav` extension (any case).
pub fn is_wave_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("wav"))
        .unwrap_or(false)
}

/// Reads the first channel of a WAV file.
///
/// Integer samples are normalized to [-1, 1].
pub fn read_wav(path: &Path) -> ComposerResult<Signal> {
    let load_error = |e: hound::Error| {
        ComposerError::invalid_input(format!(
            "failed to load WAV file '{}': {}",
            path.display(),
            e
        ))
    };

    let reader = hound::WavReader::open(path).map_err(load_error)?;
    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;

    let interleaved: Vec<f64> = match spec.sample_format {
        hound::SampleFormat::Int => {
            let max_val = (1i64 << (spec.bits_per_sample.saturating_sub(1))) as f64;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|s| s as f64 / max_val))
                .collect::<Result<_, _>>()
                .map_err(load_error)?
        }
        hound::SampleFormat::Float => reader
            .into_samples::<f32>()
            .map(|s| s.map(f64::from))
            .collect::<Result<_, _>>()
            .map_err(load_error)?,
    };

    let samples = interleaved.into_iter().step_by(channels).collect();
    Ok(Signal::new(samples, spec.sample_rate as f64)?.with_name(file_stem_name(path)))
}

/// Writes a signal as a mono 32-bit float WAV file.
pub fn write_wav(path: &Path, signal: &Signal) -> ComposerResult<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: signal.sampling_frequency.round() as u32,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let map_error = |e: hound::Error| match e {
        hound::Error::IoError(io) => ComposerError::Io(io),
        other => ComposerError::invalid_input(format!(
            "failed to write WAV file '{}': {}",
            path.display(),
            other
        )),
    };

    let mut writer = hound::WavWriter::create(path, spec).map_err(map_error)?;
    for &sample in &signal.samples {
        writer.write_sample(sample as f32).map_err(map_error)?;
    }
    writer.finalize().map_err(map_error)
}

/// Reads a two-column text table from a file.
pub fn read_two_column_text(path: &Path) -> ComposerResult<(Vec<f64>, Vec<f64>)> {
    let content = read_text_file(path)?;
    parse_two_column_text(&content).map_err(|e| prefix_path(path, e))
}

/// Reads a keyed table from a file, requiring `header` as its first line.
pub fn read_keyed_table(path: &Path, header: &str) -> ComposerResult<KeyedTable> {
    let content = read_text_file(path)?;
    KeyedTable::parse(&content, header).map_err(|e| prefix_path(path, e))
}

/// File name without its extension, or an empty string.
pub(crate) fn file_stem_name(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string()
}

fn read_text_file(path: &Path) -> ComposerResult<String> {
    std::fs::read_to_string(path).map_err(|e| {
        ComposerError::invalid_input(format!(
            "failed to read text file '{}': {}",
            path.display(),
            e
        ))
    })
}

pub(crate) fn prefix_path(path: &Path, error: ComposerError) -> ComposerError {
    match error {
        ComposerError::InvalidInput(msg) => {
            ComposerError::invalid_input(format!("{}: {}", path.display(), msg))
        }
        other => other,
    }
}

fn split_fields(line: &str) -> Vec<&str> {
    separator_regex()
        .split(line)
        .filter(|f| !f.is_empty())
        .collect()
}

/// Parses a two-column text table.
pub fn parse_two_column_text(content: &str) -> ComposerResult<(Vec<f64>, Vec<f64>)> {
    let mut xs = Vec::new();
    let mut ys = Vec::new();
    let mut header_allowed = true;

    for (index, raw) in content.lines().enumerate() {
        let line = raw.split('#').next().unwrap_or_default().trim();
        if line.is_empty() {
            continue;
        }

        let fields = split_fields(line);
        let parsed: Option<Vec<f64>> = fields.iter().map(|f| f.parse::<f64>().ok()).collect();

        match parsed {
            Some(values) if values.len() == 2 => {
                xs.push(values[0]);
                ys.push(values[1]);
                header_allowed = false;
            }
            None if header_allowed => {
                header_allowed = false;
            }
            _ => {
                return Err(ComposerError::invalid_input(format!(
                    "line {}: expected two numeric columns, got '{}'",
                    index + 1,
                    line
                )));
            }
        }
    }

    if xs.is_empty() {
        return Err(ComposerError::invalid_input(
            "text table contains no data lines",
        ));
    }
    Ok((xs, ys))
}


#[derive(Debug, Clone, PartialEq)]
struct TableEntry {
    key: String,
    fields: Vec<String>,
    line: usize,
}

#[derive(Debug, Clone, PartialEq)]
struct TableRow {
    values: Vec<f64>,
    line: usize,
}

/// A numeric table introduced by a header and `Key field...` entries.
///
/// ```text
/// AnsysSound_BBN
/// Type Narrowband
/// Control Speed km/h 0 100
/// 0     1e-6 1e-4
/// 4000  1e-6 1e-4
/// ```
///
/// The first line must start with the header. Entry lines follow, then data
/// rows: a row is any line whose first field is a number. Entry keys match
/// case-insensitively. Line numbers in errors are 1-based.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyedTable {
    entries: Vec<TableEntry>,
    rows: Vec<TableRow>,
}

impl KeyedTable {
    /// Parses a table whose first line starts with `header`.
    pub fn parse(content: &str, header: &str) -> ComposerResult<Self> {
        let mut header_seen = false;
        let mut entries: Vec<TableEntry> = Vec::new();
        let mut rows = Vec::new();

        for (index, raw) in content.lines().enumerate() {
            let line_number = index + 1;
            let line = raw.split('#').next().unwrap_or_default().trim();
            if line.is_empty() {
                continue;
            }
            let fields = split_fields(line);
            if fields.is_empty() {
                continue;
            }

            if !header_seen {
                if fields.first() != Some(&header) {
                    return Err(ComposerError::invalid_input(format!(
                        "line {line_number}: expected header '{header}', got '{line}'"
                    )));
                }
                header_seen = true;
                continue;
            }

            if fields[0].parse::<f64>().is_ok() {
                let values = fields
                    .iter()
                    .map(|f| {
                        f.parse::<f64>().map_err(|_| {
                            ComposerError::invalid_input(format!(
                                "line {line_number}: invalid number '{f}'"
                            ))
                        })
                    })
                    .collect::<ComposerResult<Vec<f64>>>()?;
                rows.push(TableRow {
                    values,
                    line: line_number,
                });
                continue;
            }

            let key = fields[0];
            if !rows.is_empty() {
                return Err(ComposerError::invalid_input(format!(
                    "line {line_number}: unexpected entry '{key}' after data rows"
                )));
            }
            if entries.iter().any(|e| e.key.eq_ignore_ascii_case(key)) {
                return Err(ComposerError::invalid_input(format!(
                    "line {line_number}: duplicate entry '{key}'"
                )));
            }
            entries.push(TableEntry {
                key: key.to_string(),
                fields: fields[1..].iter().map(|f| f.to_string()).collect(),
                line: line_number,
            });
        }

        if !header_seen {
            return Err(ComposerError::invalid_input(format!(
                "missing header '{header}'"
            )));
        }
        Ok(Self { entries, rows })
    }

    fn entry(&self, key: &str) -> Option<&TableEntry> {
        self.entries.iter().find(|e| e.key.eq_ignore_ascii_case(key))
    }

    /// Line number of an entry, if present.
    pub fn line(&self, key: &str) -> Option<usize> {
        self.entry(key).map(|e| e.line)
    }

    /// Fields of an entry joined by single spaces, if present.
    pub fn text(&self, key: &str) -> Option<String> {
        self.entry(key).map(|e| e.fields.join(" "))
    }

    /// Reads a `Key <name> <unit> <values...>` entry as a control axis.
    ///
    /// A unit of `-` stands for no unit.
    pub fn axis(&self, key: &str) -> ComposerResult<ControlAxis> {
        let entry = self.entry(key).ok_or_else(|| {
            ComposerError::invalid_input(format!("missing '{key}' entry"))
        })?;
        let line = entry.line;
        if entry.fields.len() < 3 {
            return Err(ComposerError::invalid_input(format!(
                "line {line}: '{key}' needs a name, a unit and at least one value"
            )));
        }
        let values = entry.fields[2..]
            .iter()
            .map(|f| {
                f.parse::<f64>().map_err(|_| {
                    ComposerError::invalid_input(format!("line {line}: invalid number '{f}'"))
                })
            })
            .collect::<ComposerResult<Vec<f64>>>()?;
        let unit = match entry.fields[1].as_str() {
            "-" => "",
            unit => unit,
        };
        ControlAxis::new(entry.fields[0].as_str(), unit, values).map_err(|e| match e {
            ComposerError::InvalidInput(msg) => {
                ComposerError::invalid_input(format!("line {line}: {msg}"))
            }
            other => other,
        })
    }

    /// Splits the data rows into their first column and `width` value columns.
    ///
    /// `columns[c][r]` is the value in column `c + 1` of row `r`.
    pub fn columns(&self, width: usize) -> ComposerResult<(Vec<f64>, Vec<Vec<f64>>)> {
        if self.rows.is_empty() {
            return Err(ComposerError::invalid_input("table contains no data rows"));
        }
        let mut first = Vec::with_capacity(self.rows.len());
        let mut columns = vec![Vec::with_capacity(self.rows.len()); width];
        for row in &self.rows {
            if row.values.len() != width + 1 {
                return Err(ComposerError::invalid_input(format!(
                    "line {}: expected {} columns, got {}",
                    row.line,
                    width + 1,
                    row.values.len()
                )));
            }
            first.push(row.values[0]);
            for (column, &value) in columns.iter_mut().zip(&row.values[1..]) {
                column.push(value);
            }
        }
        Ok((first, columns))
    }
}
