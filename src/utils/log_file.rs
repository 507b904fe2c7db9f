use chrono::Local;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};

use crate::utils::logging::LogEntry;

/// Echo every log line to stderr when set
pub const DEBUG_ENV: &str = "SYMPTOM_CLI_DEBUG";

static LOG_FILE: OnceLock<Option<LogFile>> = OnceLock::new();

/// Timestamped log file, one per run, with a `latest.log` pointer next to it
pub struct LogFile {
    file: Mutex<File>,
    path: PathBuf,
}

impl LogFile {
    pub fn open(log_dir: &Path) -> std::io::Result<Self> {
        std::fs::create_dir_all(log_dir)?;

        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let path = log_dir.join(format!("symptom-cli_{}.log", timestamp));
        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        let latest_path = log_dir.join("latest.log");

        #[cfg(unix)]
        {
            let _ = std::fs::remove_file(&latest_path);
            let _ = std::os::unix::fs::symlink(&path, &latest_path);
        }

        #[cfg(windows)]
        {
            // Symlinks need elevated rights on Windows
            let _ = std::fs::write(&latest_path, format!("Current log file: {}\n", path.display()));
        }

        Ok(Self {
            file: Mutex::new(file),
            path,
        })
    }

    pub fn write_entry(&self, entry: &LogEntry) {
        if let Ok(mut file) = self.file.lock() {
            let _ = writeln!(file, "{}", entry.format_for_display());
            let _ = file.flush();
        }

        if std::env::var_os(DEBUG_ENV).is_some() {
            eprintln!("{}", entry.format_for_display());
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn flush(&self) {
        if let Ok(mut file) = self.file.lock() {
            let _ = file.flush();
        }
    }
}

/// Open the global log file once; later calls return the first result
pub fn init_log_file(log_dir: PathBuf) -> Option<&'static LogFile> {
    LOG_FILE
        .get_or_init(|| LogFile::open(&log_dir).ok())
        .as_ref()
}

pub fn get_log_file() -> Option<&'static LogFile> {
    LOG_FILE.get().and_then(Option::as_ref)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::Level;

    #[test]
    fn test_entries_are_appended() {
        let dir = tempfile::tempdir().unwrap();
        let log = LogFile::open(dir.path()).unwrap();
        log.write_entry(&LogEntry::new(Level::INFO, "api", "GET /get-events".to_string()));
        log.flush();

        let contents = std::fs::read_to_string(log.path()).unwrap();
        assert!(contents.contains("INFO [api] GET /get-events"));
        assert!(log
            .path()
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("symptom-cli_"));
    }
}
