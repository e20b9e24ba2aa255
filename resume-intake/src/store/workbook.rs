use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, SecondsFormat, Utc};

use super::schema::{ColumnKind, ColumnSchema, CANONICAL_COLUMNS};
use super::view::TableView;
use super::xlsx::{self, excel_serial_to_datetime, DEFAULT_SHEET_NAME};
use crate::config::{Config, DEFAULT_DUPLICATE_WINDOW_DAYS};
use crate::error::{IntakeError, Result};
use crate::models::{AppendOutcome, CandidateRecord, RejectReason};

const MULTI_VALUE_SEPARATOR: &str = ", ";

/// Store behaviour taken from [`Config`] at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreOptions {
    pub duplicate_check_enabled: bool,
    pub duplicate_window: Duration,
    /// Header for newly created or empty workbooks.
    pub default_columns: Vec<String>,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            duplicate_check_enabled: true,
            duplicate_window: Duration::days(i64::from(DEFAULT_DUPLICATE_WINDOW_DAYS)),
            default_columns: CANONICAL_COLUMNS.iter().map(|c| c.to_string()).collect(),
        }
    }
}

impl From<&Config> for StoreOptions {
    fn from(config: &Config) -> Self {
        Self {
            duplicate_check_enabled: config.duplicate_check_enabled,
            duplicate_window: Duration::days(i64::from(config.duplicate_window_days)),
            default_columns: config.default_columns.clone(),
        }
    }
}

/// The workbook of record: one header row plus one row per accepted
/// candidate. Every mutation is persisted before it returns.
#[derive(Debug)]
pub struct SpreadsheetStore {
    path: PathBuf,
    sheet_name: String,
    schema: ColumnSchema,
    rows: Vec<Vec<String>>,
    options: StoreOptions,
}

impl SpreadsheetStore {
    /// Loads the workbook at `path`, creating it with the default header when
    /// missing. An existing file that is not a spreadsheet, or whose header
    /// has no email column, is `WorkbookCorrupt`.
    pub fn open(path: impl Into<PathBuf>, options: StoreOptions) -> Result<Self> {
        let path = path.into();

        if !path.exists() {
            let schema = ColumnSchema::new(options.default_columns.clone())
                .map_err(|e| IntakeError::Config(format!("default_columns: {}", e.reason())))?;
            let store = Self {
                path,
                sheet_name: DEFAULT_SHEET_NAME.to_string(),
                schema,
                rows: Vec::new(),
                options,
            };
            if let Some(parent) = store.path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).map_err(|e| {
                    IntakeError::WriteFailure(format!("cannot create {}: {e}", parent.display()))
                })?;
            }
            store.save()?;
            tracing::info!(path = %store.path.display(), "Created workbook");
            return Ok(store);
        }

        let bytes = fs::read(&path).map_err(|e| {
            IntakeError::WorkbookCorrupt(format!("cannot read {}: {e}", path.display()))
        })?;
        let sheet = xlsx::read_sheet(&bytes)?;
        let mut rows = sheet.rows.into_iter();

        let (schema, needs_header) = match rows.next() {
            Some(header) => {
                let header: Vec<String> = header.into_iter().map(|h| h.trim().to_string()).collect();
                let schema = ColumnSchema::new(header).map_err(|e| {
                    IntakeError::WorkbookCorrupt(format!("{}: {}", path.display(), e.reason()))
                })?;
                (schema, false)
            }
            None => {
                let schema = ColumnSchema::new(options.default_columns.clone()).map_err(|e| {
                    IntakeError::Config(format!("default_columns: {}", e.reason()))
                })?;
                (schema, true)
            }
        };

        let width = schema.len();
        let rows = rows
            .map(|mut row| {
                if row.len() < width {
                    row.resize(width, String::new());
                }
                row
            })
            .collect();

        let store = Self {
            path,
            sheet_name: sheet.name,
            schema,
            rows,
            options,
        };

        if needs_header {
            store.save()?;
            tracing::info!(path = %store.path.display(), "Wrote header into empty workbook");
        }

        tracing::debug!(
            path = %store.path.display(),
            rows = store.rows.len(),
            columns = store.schema.len(),
            "Opened workbook"
        );
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn columns(&self) -> &[String] {
        self.schema.columns()
    }

    /// Data rows, header excluded.
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    /// Serial the next appended row receives.
    pub fn next_serial(&self) -> u64 {
        self.rows.len() as u64 + 1
    }

    /// First stored row sharing an email with `emails` whose DateApplied is
    /// within the duplicate window before `now`. Rows with a missing or
    /// unreadable date count as inside the window.
    pub fn find_duplicate(&self, emails: &[String], now: DateTime<Utc>) -> Option<RejectReason> {
        if !self.options.duplicate_check_enabled || emails.is_empty() {
            return None;
        }
        let email_col = self.schema.index_of(ColumnKind::Email)?;
        let date_col = self.schema.index_of(ColumnKind::DateApplied);
        let serial_col = self.schema.index_of(ColumnKind::Serial);

        let wanted: Vec<String> = emails.iter().map(|e| e.trim().to_lowercase()).collect();

        for (i, row) in self.rows.iter().enumerate() {
            let Some(cell) = row.get(email_col) else {
                continue;
            };
            let Some(email) = split_multi(cell)
                .map(str::to_lowercase)
                .find(|stored| wanted.contains(stored))
            else {
                continue;
            };

            let applied = date_col
                .and_then(|c| row.get(c))
                .and_then(|d| parse_date_applied(d));
            let within = match applied {
                Some(applied) => now.signed_duration_since(applied) <= self.options.duplicate_window,
                None => true,
            };

            if within {
                let serial = serial_col
                    .and_then(|c| row.get(c))
                    .and_then(|s| s.trim().parse::<u64>().ok())
                    .or(Some(i as u64 + 1));
                return Some(RejectReason::DuplicateEmail { email, serial });
            }
        }

        None
    }

    /// Appends `record` unless it duplicates a stored row, then saves.
    pub fn append(&mut self, record: &CandidateRecord) -> Result<AppendOutcome> {
        if let Some(reason) = self.find_duplicate(&record.emails, record.date_applied) {
            tracing::info!(
                file = %record.original_file_name,
                reason = %reason,
                "Rejected duplicate candidate"
            );
            return Ok(AppendOutcome::Rejected(reason));
        }

        let serial = self.next_serial();
        let row = self.row_for(record, serial);
        self.rows.push(row);

        if let Err(e) = self.save() {
            self.rows.pop();
            return Err(e);
        }

        tracing::info!(file = %record.original_file_name, serial, "Appended candidate");
        Ok(AppendOutcome::Accepted { serial })
    }

    fn row_for(&self, record: &CandidateRecord, serial: u64) -> Vec<String> {
        self.schema
            .kinds()
            .into_iter()
            .map(|kind| match kind {
                Some(ColumnKind::Serial) => serial.to_string(),
                Some(ColumnKind::Name) => record.name.clone(),
                Some(ColumnKind::Email) => record.emails.join(MULTI_VALUE_SEPARATOR),
                Some(ColumnKind::Phone) => record.phones.join(MULTI_VALUE_SEPARATOR),
                Some(ColumnKind::Skills) => record.skills.join(MULTI_VALUE_SEPARATOR),
                Some(ColumnKind::Experience) => record.experience_label(),
                Some(ColumnKind::OriginalFile) => record.original_file_name.clone(),
                Some(ColumnKind::DateApplied) => record
                    .date_applied
                    .to_rfc3339_opts(SecondsFormat::Secs, true),
                Some(ColumnKind::ResumePath) => record.resume_copy_path.display().to_string(),
                None => String::new(),
            })
            .collect()
    }

    /// Inserts an empty column at `position` (end when `None`).
    pub fn add_column(&mut self, name: &str, position: Option<usize>) -> Result<()> {
        let name = name.trim().to_string();
        let index = position.unwrap_or(self.schema.len()).min(self.schema.len());

        let mut schema = self.schema.clone();
        schema.insert(index, name.clone())?;

        self.rewrite_header(schema, |row| row.insert(index, String::new()))?;
        tracing::info!(column = %name, index, "Added column");
        Ok(())
    }

    /// Drops a column and its cells. The email column cannot be removed.
    pub fn remove_column(&mut self, name: &str) -> Result<()> {
        let index = self.column_index(name)?;

        let mut schema = self.schema.clone();
        schema.remove(index)?;

        self.rewrite_header(schema, |row| {
            if index < row.len() {
                row.remove(index);
            }
        })?;
        tracing::info!(column = %name, "Removed column");
        Ok(())
    }

    pub fn rename_column(&mut self, old: &str, new: &str) -> Result<()> {
        let index = self.column_index(old)?;

        let mut schema = self.schema.clone();
        schema.rename(index, new.trim().to_string())?;

        self.rewrite_header(schema, |_| {})?;
        tracing::info!(from = %old, to = %new, "Renamed column");
        Ok(())
    }

    /// Moves a column to `new_index`, clamped to the last position.
    pub fn move_column(&mut self, name: &str, new_index: usize) -> Result<()> {
        let from = self.column_index(name)?;
        let to = new_index.min(self.schema.len() - 1);
        if from == to {
            return Ok(());
        }

        let mut schema = self.schema.clone();
        schema.relocate(from, to);

        self.rewrite_header(schema, |row| {
            let cell = row.remove(from);
            row.insert(to, cell);
        })?;
        tracing::info!(column = %name, from, to, "Moved column");
        Ok(())
    }

    fn column_index(&self, name: &str) -> Result<usize> {
        self.schema
            .position(name)
            .ok_or_else(|| IntakeError::Validation(format!("no column named '{name}'")))
    }

    /// Backs the file up, applies `edit` to every row, and saves. On a failed
    /// save the in-memory state is left untouched.
    fn rewrite_header<F>(&mut self, schema: ColumnSchema, edit: F) -> Result<()>
    where
        F: Fn(&mut Vec<String>),
    {
        self.backup()?;

        let previous_schema = std::mem::replace(&mut self.schema, schema);
        let previous_rows = self.rows.clone();
        for row in &mut self.rows {
            edit(row);
        }

        if let Err(e) = self.save() {
            self.schema = previous_schema;
            self.rows = previous_rows;
            return Err(e);
        }
        Ok(())
    }

    pub fn backup_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(".bak");
        PathBuf::from(name)
    }

    fn backup(&self) -> Result<()> {
        if !self.path.exists() {
            return Ok(());
        }
        let backup = self.backup_path();
        fs::copy(&self.path, &backup).map_err(|e| {
            IntakeError::WriteFailure(format!("cannot back up to {}: {e}", backup.display()))
        })?;
        tracing::debug!(backup = %backup.display(), "Backed up workbook");
        Ok(())
    }

    /// Case-insensitive substring filter over whole rows, projected onto
    /// `columns` (all columns, in sheet order, when `None`).
    pub fn view(&self, filter: Option<&str>, columns: Option<&[String]>) -> Result<TableView> {
        let indices: Vec<usize> = match columns {
            Some(names) if !names.is_empty() => names
                .iter()
                .map(|n| self.column_index(n))
                .collect::<Result<_>>()?,
            _ => (0..self.schema.len()).collect(),
        };

        let needle = filter
            .map(|f| f.trim().to_lowercase())
            .filter(|f| !f.is_empty());

        let rows = self
            .rows
            .iter()
            .filter(|row| match &needle {
                Some(needle) => row.join(" ").to_lowercase().contains(needle.as_str()),
                None => true,
            })
            .map(|row| {
                indices
                    .iter()
                    .map(|&i| row.get(i).cloned().unwrap_or_default())
                    .collect()
            })
            .collect();

        let columns = indices
            .iter()
            .map(|&i| self.schema.columns()[i].clone())
            .collect();

        Ok(TableView::new(columns, rows))
    }

    /// Writes the visible rows to `destination` as CSV. Returns the row count.
    pub fn export_visible(&self, view: &TableView, destination: &Path) -> Result<usize> {
        view.export_csv(destination)
    }

    /// Writes to a sibling temp file, then renames it over the workbook.
    pub fn save(&self) -> Result<()> {
        let mut rows = Vec::with_capacity(self.rows.len() + 1);
        rows.push(self.schema.columns().to_vec());
        rows.extend(self.rows.iter().cloned());

        let numeric: Vec<usize> = self.schema.index_of(ColumnKind::Serial).into_iter().collect();
        let bytes = xlsx::write_sheet(&self.sheet_name, &rows, &numeric)?;

        let mut tmp_name = self.path.as_os_str().to_os_string();
        tmp_name.push(".tmp");
        let tmp = PathBuf::from(tmp_name);

        fs::write(&tmp, bytes).map_err(|e| {
            IntakeError::WriteFailure(format!("cannot write {}: {e}", tmp.display()))
        })?;
        if let Err(e) = fs::rename(&tmp, &self.path) {
            let _ = fs::remove_file(&tmp);
            return Err(IntakeError::WriteFailure(format!(
                "cannot replace {} (open in another program?): {e}",
                self.path.display()
            )));
        }
        Ok(())
    }
}

/// Splits a stored multi-value cell on commas, semicolons and whitespace.
fn split_multi(cell: &str) -> impl Iterator<Item = &str> {
    cell.split(|c: char| c == ',' || c == ';' || c.is_whitespace())
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Accepts RFC3339, `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DD`, and Excel serial
/// numbers. Naive forms are taken as UTC.
pub fn parse_date_applied(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|d| d.and_utc());
    }
    value.parse::<f64>().ok().and_then(excel_serial_to_datetime)
}
