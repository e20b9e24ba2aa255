use std::env;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};

use crate::config::{Config, CONFIG_FILE_NAME};
use crate::error::{ErrorKind, IntakeError, Result};

pub const WORKSPACE_ENV: &str = "INTAKE_WORKSPACE";
pub const DEFAULT_WORKSPACE_DIR: &str = "ResumeIntakeWorkspace";
pub const DEFAULT_WORKBOOK_NAME: &str = "resumes_data.xlsx";
pub const ERROR_LOG_NAME: &str = "errors.log";

const EXCEL_DIR: &str = "excel";
const RESUMES_DIR: &str = "resumes";
const LOGS_DIR: &str = "logs";

/// Fixed on-disk layout:
///
/// ```text
/// <root>/
///   config.json
///   excel/resumes_data.xlsx
///   resumes/            archived source files
///   logs/errors.log
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    /// `explicit`, else `$INTAKE_WORKSPACE`, else `~/ResumeIntakeWorkspace`.
    pub fn resolve_root(explicit: Option<PathBuf>) -> Result<PathBuf> {
        if let Some(root) = explicit {
            return Ok(root);
        }
        if let Some(root) = env::var_os(WORKSPACE_ENV).filter(|v| !v.is_empty()) {
            return Ok(PathBuf::from(root));
        }
        dirs::home_dir()
            .map(|home| home.join(DEFAULT_WORKSPACE_DIR))
            .ok_or_else(|| {
                IntakeError::Config(format!(
                    "cannot determine home directory; set {WORKSPACE_ENV} or pass --workspace"
                ))
            })
    }

    /// Creates the folder layout if missing.
    pub fn init(root: impl Into<PathBuf>) -> Result<Self> {
        let workspace = Self { root: root.into() };
        for dir in [
            workspace.root.clone(),
            workspace.excel_dir(),
            workspace.resumes_dir(),
            workspace.logs_dir(),
        ] {
            fs::create_dir_all(&dir).map_err(|e| {
                IntakeError::WriteFailure(format!("cannot create {}: {e}", dir.display()))
            })?;
        }
        tracing::debug!(root = %workspace.root.display(), "Workspace ready");
        Ok(workspace)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn excel_dir(&self) -> PathBuf {
        self.root.join(EXCEL_DIR)
    }

    pub fn resumes_dir(&self) -> PathBuf {
        self.root.join(RESUMES_DIR)
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.root.join(LOGS_DIR)
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join(CONFIG_FILE_NAME)
    }

    pub fn default_workbook(&self) -> PathBuf {
        self.excel_dir().join(DEFAULT_WORKBOOK_NAME)
    }

    /// Active workbook from config. Relative paths resolve inside `excel/`.
    pub fn workbook_path(&self, config: &Config) -> PathBuf {
        match &config.active_workbook {
            Some(path) if path.is_absolute() => path.clone(),
            Some(path) => self.excel_dir().join(path),
            None => self.default_workbook(),
        }
    }

    pub fn error_log(&self) -> ErrorLog {
        ErrorLog::new(self.logs_dir().join(ERROR_LOG_NAME))
    }

    /// Copies `source` into `resumes/`, picking `name_1.ext`, `name_2.ext`,
    /// ... when the plain name is taken.
    pub fn archive_copy(&self, source: &Path) -> Result<PathBuf> {
        let file_name = source.file_name().ok_or_else(|| {
            IntakeError::Validation(format!("{} has no file name", source.display()))
        })?;
        let destination = unique_path(&self.resumes_dir(), Path::new(file_name));

        fs::copy(source, &destination).map_err(|e| {
            IntakeError::Io(std::io::Error::new(
                e.kind(),
                format!("cannot archive to {}: {e}", destination.display()),
            ))
        })?;
        tracing::debug!(from = %source.display(), to = %destination.display(), "Archived resume");
        Ok(destination)
    }
}

fn unique_path(dir: &Path, file_name: &Path) -> PathBuf {
    let candidate = dir.join(file_name);
    if !candidate.exists() {
        return candidate;
    }

    let stem = file_name
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = file_name
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    (1..)
        .map(|n| dir.join(format!("{stem}_{n}{extension}")))
        .find(|p| !p.exists())
        .unwrap_or(candidate)
}

/// Append-only failure log, one tab-separated line per failure:
/// `timestamp  file  kind  reason`.
#[derive(Debug, Clone)]
pub struct ErrorLog {
    path: PathBuf,
}

impl ErrorLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, file: &str, kind: ErrorKind, reason: &str) -> Result<()> {
        let line = format!(
            "{}\t{}\t{}\t{}\n",
            Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            single_line(file),
            kind,
            single_line(reason)
        );

        let mut log = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        log.write_all(line.as_bytes())?;
        Ok(())
    }
}

fn single_line(value: &str) -> String {
    value
        .chars()
        .map(|c| if c == '\t' || c.is_control() { ' ' } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serial_test::serial;

    #[test]
    fn test_init_creates_layout() {
        let dir = tempfile::tempdir().unwrap();
        let ws = Workspace::init(dir.path().join("ws")).unwrap();
        assert!(ws.excel_dir().is_dir());
        assert!(ws.resumes_dir().is_dir());
        assert!(ws.logs_dir().is_dir());
        assert_eq!(ws.default_workbook(), dir.path().join("ws/excel/resumes_data.xlsx"));
    }

    #[test]
    fn test_archive_copy_avoids_collisions() {
        let dir = tempfile::tempdir().unwrap();
        let ws = Workspace::init(dir.path().join("ws")).unwrap();
        let source = dir.path().join("cv.pdf");
        fs::write(&source, b"%PDF-1.4").unwrap();

        let first = ws.archive_copy(&source).unwrap();
        let second = ws.archive_copy(&source).unwrap();
        let third = ws.archive_copy(&source).unwrap();

        assert_eq!(first.file_name().unwrap(), "cv.pdf");
        assert_eq!(second.file_name().unwrap(), "cv_1.pdf");
        assert_eq!(third.file_name().unwrap(), "cv_2.pdf");
        assert_eq!(fs::read(&third).unwrap(), b"%PDF-1.4");
    }

    #[test]
    fn test_workbook_path_resolution() {
        let ws = Workspace {
            root: PathBuf::from("/ws"),
        };
        let mut config = Config::default();
        assert_eq!(ws.workbook_path(&config), PathBuf::from("/ws/excel/resumes_data.xlsx"));

        config.active_workbook = Some(PathBuf::from("2026.xlsx"));
        assert_eq!(ws.workbook_path(&config), PathBuf::from("/ws/excel/2026.xlsx"));

        config.active_workbook = Some(PathBuf::from("/data/shared.xlsx"));
        assert_eq!(ws.workbook_path(&config), PathBuf::from("/data/shared.xlsx"));
    }

    #[test]
    fn test_error_log_lines() {
        let dir = tempfile::tempdir().unwrap();
        let log = ErrorLog::new(dir.path().join("errors.log"));
        log.append("a.pdf", ErrorKind::ExtractionFailure, "no text\nat all")
            .unwrap();
        log.append("b.txt", ErrorKind::UnsupportedFormat, "txt").unwrap();

        let content = fs::read_to_string(log.path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);

        let fields: Vec<&str> = lines[0].split('\t').collect();
        assert_eq!(fields.len(), 4);
        assert!(chrono::DateTime::parse_from_rfc3339(fields[0]).is_ok());
        assert_eq!(&fields[1..], &["a.pdf", "ExtractionFailure", "no text at all"]);
    }

    #[test]
    #[serial]
    fn test_resolve_root_precedence() {
        std::env::set_var(WORKSPACE_ENV, "/from/env");
        assert_eq!(
            Workspace::resolve_root(Some(PathBuf::from("/explicit"))).unwrap(),
            PathBuf::from("/explicit")
        );
        assert_eq!(Workspace::resolve_root(None).unwrap(), PathBuf::from("/from/env"));
        std::env::remove_var(WORKSPACE_ENV);
    }
}
