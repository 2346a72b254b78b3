use crate::domain::model::ReferenceTable;
use crate::utils::error::{HsnError, Result};
use serde::{Deserialize, Serialize};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::path::PathBuf;

pub const DEFAULT_CODE_COLUMN: &str = "HSNCode";
pub const DEFAULT_DESCRIPTION_COLUMN: &str = "Description";

/// Which row survives when a code appears more than once in the source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    #[default]
    FirstWins,
    LastWins,
}

/// Where and how to read the reference table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSource {
    pub path: PathBuf,
    pub code_column: String,
    pub description_column: String,
    /// `None` picks tab for `.tsv` files and comma otherwise.
    pub delimiter: Option<u8>,
    pub duplicate_policy: DuplicatePolicy,
}

impl TableSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            code_column: DEFAULT_CODE_COLUMN.to_string(),
            description_column: DEFAULT_DESCRIPTION_COLUMN.to_string(),
            delimiter: None,
            duplicate_policy: DuplicatePolicy::default(),
        }
    }

    pub fn with_columns(mut self, code: impl Into<String>, description: impl Into<String>) -> Self {
        self.code_column = code.into();
        self.description_column = description.into();
        self
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = Some(delimiter);
        self
    }

    pub fn with_duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicate_policy = policy;
        self
    }

    pub fn effective_delimiter(&self) -> u8 {
        self.delimiter.unwrap_or_else(|| {
            match self.path.extension().and_then(|ext| ext.to_str()) {
                Some(ext) if ext.eq_ignore_ascii_case("tsv") => b'\t',
                _ => b',',
            }
        })
    }
}

/// Load the reference table, degrading to an empty table on any failure.
///
/// A missing or malformed source is a startup condition rather than a request
/// error: the failure is logged and every later validation reports
/// `DATASTORE_UNAVAILABLE`.
pub fn load(source: &TableSource) -> ReferenceTable {
    tracing::info!("Loading HSN reference data from: {}", source.path.display());

    match try_load(source) {
        Ok(table) => {
            tracing::info!("Loaded {} HSN codes into memory", table.len());
            table
        }
        Err(e) => {
            tracing::error!(
                "Failed to load HSN reference data: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("Recovery suggestion: {}", e.recovery_suggestion());
            tracing::warn!("Validation will report DATASTORE_UNAVAILABLE until a reload succeeds");
            ReferenceTable::empty().with_source(source.path.clone())
        }
    }
}

/// Fallible variant of [`load`] for callers that want the error.
pub fn try_load(source: &TableSource) -> Result<ReferenceTable> {
    if !source.path.exists() {
        return Err(HsnError::SourceNotFound {
            path: source.path.display().to_string(),
        });
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .delimiter(source.effective_delimiter())
        .flexible(true)
        .from_path(&source.path)?;

    let headers = reader.headers()?.clone();
    let code_idx = find_column(&headers, &source.code_column)?;
    let description_idx = find_column(&headers, &source.description_column)?;

    let mut entries: HashMap<String, String> = HashMap::new();
    let mut blank_codes = 0usize;
    let mut duplicates = 0usize;

    for record in reader.records() {
        let record = record?;

        let code = record.get(code_idx).map(str::trim).unwrap_or_default();
        if code.is_empty() {
            blank_codes += 1;
            continue;
        }
        // descriptions are opaque; only the code is normalized
        let description = record.get(description_idx).unwrap_or_default().to_string();

        match entries.entry(code.to_string()) {
            Entry::Vacant(slot) => {
                slot.insert(description);
            }
            Entry::Occupied(mut slot) => {
                duplicates += 1;
                if source.duplicate_policy == DuplicatePolicy::LastWins {
                    slot.insert(description);
                }
            }
        }
    }

    if blank_codes > 0 {
        tracing::debug!("Dropped {} rows with a blank code", blank_codes);
    }
    if duplicates > 0 {
        tracing::warn!(
            "{} duplicate codes resolved with policy {:?}",
            duplicates,
            source.duplicate_policy
        );
    }

    Ok(ReferenceTable::from_map(entries).with_source(source.path.clone()))
}

fn normalize_header(raw: &str) -> &str {
    raw.trim_start_matches('\u{feff}').trim()
}

fn find_column(headers: &csv::StringRecord, name: &str) -> Result<usize> {
    let wanted = name.trim();
    headers
        .iter()
        .position(|h| normalize_header(h) == wanted)
        .or_else(|| {
            headers
                .iter()
                .position(|h| normalize_header(h).eq_ignore_ascii_case(wanted))
        })
        .ok_or_else(|| HsnError::MissingColumn {
            column: wanted.to_string(),
        })
}
