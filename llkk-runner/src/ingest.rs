//! Submission ingestion from CSV.
//!
//! Accepts the spreadsheet headers labs actually upload (`CV (%)`, `n (QC)`,
//! `Working Days`) as well as the plain field names. Blank or non-numeric
//! CV/Ratio cells become missing metrics rather than zeros.
//!
//! Only rows without usable counts are dropped here. Blank identity cells
//! (Lab, Parameter, Level, Month) are kept as empty strings so batch
//! validation rejects the whole upload and names them.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;
use thiserror::Error;
use tracing::{debug, warn};

use llkk_core::{Month, SubmissionRecord};

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("open submissions {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("missing required column '{0}'")]
    MissingColumn(&'static str),
}

/// Rows that could not become submissions.
#[derive(Debug, Clone, PartialEq)]
pub struct DroppedRow {
    /// 1-based data row (header excluded).
    pub row: usize,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct IngestReport {
    pub records: Vec<SubmissionRecord>,
    pub dropped: Vec<DroppedRow>,
    /// True when the file had no Ratio column and ratios were derived.
    pub derived_ratios: bool,
}

const LAB: &[&str] = &["lab"];
const PARAMETER: &[&str] = &["parameter"];
const LEVEL: &[&str] = &["level"];
const MONTH: &[&str] = &["month"];
const CV: &[&str] = &["cv (%)", "cv", "cv%"];
const RATIO: &[&str] = &["ratio"];
const SAMPLE_COUNT: &[&str] = &["n (qc)", "samplecount", "sample_count"];
const WORKING_DAYS: &[&str] = &["working days", "workingdays", "working_days"];

struct Columns {
    lab: usize,
    parameter: usize,
    level: usize,
    month: usize,
    cv: Option<usize>,
    ratio: Option<usize>,
    sample_count: usize,
    working_days: usize,
}

impl Columns {
    fn locate(headers: &StringRecord) -> Result<Self, IngestError> {
        let index: HashMap<String, usize> = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.trim().to_ascii_lowercase(), i))
            .collect();
        let find = |aliases: &[&str]| aliases.iter().find_map(|a| index.get(*a).copied());
        let require = |aliases: &[&'static str]| find(aliases).ok_or(IngestError::MissingColumn(aliases[0]));

        Ok(Self {
            lab: require(LAB)?,
            parameter: require(PARAMETER)?,
            level: require(LEVEL)?,
            month: require(MONTH)?,
            cv: find(CV),
            ratio: find(RATIO),
            sample_count: require(SAMPLE_COUNT)?,
            working_days: require(WORKING_DAYS)?,
        })
    }
}

/// Lab names are trimmed and inner whitespace becomes underscores.
pub fn normalize_lab(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join("_")
}

fn parse_metric(cell: Option<&str>) -> Option<f64> {
    let cell = cell?.trim().trim_end_matches('%').trim();
    if cell.is_empty() {
        return None;
    }
    cell.parse::<f64>().ok()
}

fn parse_count(cell: Option<&str>) -> Result<u32, String> {
    let cell = cell.map(str::trim).unwrap_or_default();
    if cell.is_empty() {
        return Err("blank count".into());
    }
    // Spreadsheets export whole counts as "22.0".
    match cell.parse::<u32>() {
        Ok(v) => Ok(v),
        Err(_) => match cell.parse::<f64>() {
            Ok(v) if v.is_finite() && v >= 0.0 && v.fract() == 0.0 && v <= u32::MAX as f64 => {
                Ok(v as u32)
            }
            _ => Err(format!("'{cell}' is not a whole count")),
        },
    }
}

pub fn read_submissions<R: Read>(reader: R) -> Result<IngestReport, IngestError> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);
    let columns = Columns::locate(rdr.headers()?)?;
    let derive = columns.ratio.is_none();

    let mut report = IngestReport {
        derived_ratios: derive,
        ..IngestReport::default()
    };

    for (i, row) in rdr.records().enumerate() {
        let row = row?;
        let row_no = i + 1;
        match parse_row(&row, &columns) {
            Ok(mut record) => {
                if derive {
                    record.ratio = record.derived_ratio();
                }
                report.records.push(record);
            }
            Err(reason) => {
                warn!(row = row_no, %reason, "dropping submission row");
                report.dropped.push(DroppedRow { row: row_no, reason });
            }
        }
    }

    debug!(
        records = report.records.len(),
        dropped = report.dropped.len(),
        derived_ratios = derive,
        "ingested submissions"
    );
    Ok(report)
}

fn parse_row(row: &StringRecord, c: &Columns) -> Result<SubmissionRecord, String> {
    let text = |idx: usize| row.get(idx).map(str::trim).unwrap_or_default().to_string();

    let lab = normalize_lab(&text(c.lab));
    let parameter = text(c.parameter);
    let level = text(c.level);
    let month = Month::new(text(c.month));
    let sample_count = parse_count(row.get(c.sample_count)).map_err(|e| format!("n (QC): {e}"))?;
    let working_days =
        parse_count(row.get(c.working_days)).map_err(|e| format!("Working Days: {e}"))?;

    Ok(SubmissionRecord {
        lab,
        parameter,
        level,
        month,
        cv: c.cv.and_then(|idx| parse_metric(row.get(idx))),
        ratio: c.ratio.and_then(|idx| parse_metric(row.get(idx))),
        sample_count,
        working_days,
    })
}

pub fn read_submissions_file(path: &Path) -> Result<IngestReport, IngestError> {
    let file = std::fs::File::open(path).map_err(|source| IngestError::Open {
        path: path.display().to_string(),
        source,
    })?;
    read_submissions(file)
}

/// Write submissions with the canonical upload headers.
pub fn write_submissions<W: std::io::Write>(
    writer: W,
    records: &[SubmissionRecord],
) -> Result<(), csv::Error> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record([
        "Lab",
        "Parameter",
        "Level",
        "Month",
        "CV (%)",
        "Ratio",
        "n (QC)",
        "Working Days",
    ])?;
    let fmt_opt = |v: Option<f64>| v.map(|x| x.to_string()).unwrap_or_default();
    for r in records {
        wtr.write_record([
            r.lab.as_str(),
            r.parameter.as_str(),
            r.level.as_str(),
            r.month.as_str(),
            fmt_opt(r.cv).as_str(),
            fmt_opt(r.ratio).as_str(),
            r.sample_count.to_string().as_str(),
            r.working_days.to_string().as_str(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}
