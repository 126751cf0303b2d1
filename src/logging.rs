use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use chrono::Utc;
use log::{LevelFilter, Log, Metadata, Record};

use crate::error::Result;

fn timestamped(data: &str) -> String {
    format!("[{}] {}", Utc::now().format("%Y-%m-%d %H:%M:%S%.3f"), data)
}

/// Appends every record to a single file, one timestamped line each.
pub struct FileLogger {
    file: Mutex<File>,
    level: LevelFilter,
}

impl FileLogger {
    pub fn open(path: &Path, level: LevelFilter) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().append(true).create(true).open(path)?;
        Ok(FileLogger {
            file: Mutex::new(file),
            level,
        })
    }
}

impl Log for FileLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let message = record.args().to_string();
        let Ok(mut file) = self.file.lock() else {
            return;
        };
        for line in message.split('\n') {
            let _ = writeln!(
                file,
                "{}",
                timestamped(&format!("{} {}: {line}", record.level(), record.target()))
            );
        }
    }

    fn flush(&self) {
        if let Ok(mut file) = self.file.lock() {
            let _ = file.flush();
        }
    }
}

/// Installs a [`FileLogger`] as the global `log` backend.
pub fn init_file_logger(path: &Path, level: LevelFilter) -> Result<()> {
    let logger = FileLogger::open(path, level)?;
    log::set_boxed_logger(Box::new(logger))?;
    log::set_max_level(level);
    Ok(())
}
