//! File backend that starts a fresh, timestamp-named file on size or day rollover.

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Local};
use log4rs::append::Append;
use log4rs::encode::{self, Encode};
use parking_lot::Mutex;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::errors::Error;

use super::sink::line_encoder;

pub const DEFAULT_FILE_PATTERN: &str = "log_%Y-%m-%d_%H-%M-%S.%6f.log";
pub const DEFAULT_ROTATION_SIZE: u64 = 10 * 1024 * 1024;

/// When to abandon the active file.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RotationPolicy {
    pub max_size: u64,
}

impl RotationPolicy {
    /// True once `written` reached the size cap or local midnight passed since `opened_at`.
    pub fn should_rotate(
        &self,
        written: u64,
        opened_at: DateTime<Local>,
        now: DateTime<Local>,
    ) -> bool {
        written >= self.max_size || now.date_naive() > opened_at.date_naive()
    }
}

impl Default for RotationPolicy {
    fn default() -> Self {
        Self { max_size: DEFAULT_ROTATION_SIZE }
    }
}

#[derive(Debug)]
struct ActiveFile {
    path: PathBuf,
    file: File,
    written: u64,
    opened_at: DateTime<Local>,
}

/// Counts bytes on their way to the file so rotation needs no `stat`.
struct CountingWriter<'a> {
    inner: &'a mut File,
    count: u64,
}

impl io::Write for CountingWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.count += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl encode::Write for CountingWriter<'_> {}

#[derive(Debug)]
pub struct RotatingFileAppender {
    dir: PathBuf,
    pattern: String,
    policy: RotationPolicy,
    sync_every_write: bool,
    encoder: Box<dyn Encode>,
    active: Mutex<ActiveFile>,
}

impl RotatingFileAppender {
    pub fn builder() -> RotatingFileAppenderBuilder {
        RotatingFileAppenderBuilder {
            pattern: DEFAULT_FILE_PATTERN.to_string(),
            policy: RotationPolicy::default(),
            sync_every_write: true,
            encoder: None,
        }
    }

    /// Path of the file currently receiving records.
    pub fn current_path(&self) -> PathBuf {
        self.active.lock().path.clone()
    }

    /// Remove the active file when nothing has been written to it yet.
    /// The appender must not receive records afterwards.
    pub fn remove_if_empty(&self) -> io::Result<bool> {
        let active = self.active.lock();
        if active.written > 0 {
            return Ok(false);
        }
        fs::remove_file(&active.path)?;
        Ok(true)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn open_file(dir: &Path, pattern: &str, now: DateTime<Local>) -> io::Result<ActiveFile> {
        let stem = now.format(pattern).to_string();
        let mut path = dir.join(&stem);
        let mut attempt = 0u32;
        loop {
            match OpenOptions::new().create_new(true).append(true).open(&path) {
                Ok(file) => {
                    return Ok(ActiveFile { path, file, written: 0, opened_at: now });
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists && attempt < 1000 => {
                    attempt += 1;
                    path = dir.join(format!("{stem}.{attempt}"));
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl Append for RotatingFileAppender {
    fn append(&self, record: &log::Record) -> anyhow::Result<()> {
        let mut active = self.active.lock();
        let now = Local::now();
        if self.policy.should_rotate(active.written, active.opened_at, now) {
            // On failure the previous file stays active.
            *active = Self::open_file(&self.dir, &self.pattern, now)?;
        }
        let mut writer = CountingWriter { inner: &mut active.file, count: 0 };
        let encoded = self.encoder.encode(&mut writer, record);
        let count = writer.count;
        active.written += count;
        encoded?;
        active.file.flush()?;
        if self.sync_every_write {
            active.file.sync_data()?;
        }
        Ok(())
    }

    fn flush(&self) {
        let _ = self.active.lock().file.flush();
    }
}

pub struct RotatingFileAppenderBuilder {
    pattern: String,
    policy: RotationPolicy,
    sync_every_write: bool,
    encoder: Option<Box<dyn Encode>>,
}

impl RotatingFileAppenderBuilder {
    /// strftime pattern for new file names.
    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = pattern.into();
        self
    }

    pub fn rotation_size(mut self, bytes: u64) -> Self {
        self.policy.max_size = bytes;
        self
    }

    pub fn sync_every_write(mut self, sync: bool) -> Self {
        self.sync_every_write = sync;
        self
    }

    pub fn encoder(mut self, encoder: Box<dyn Encode>) -> Self {
        self.encoder = Some(encoder);
        self
    }

    /// Create `dir` if needed and open the first file.
    ///
    /// # Errors
    /// `Error::SinkInit` if the pattern is not a valid strftime string or the file cannot be opened.
    pub fn build(self, dir: impl AsRef<Path>) -> Result<RotatingFileAppender, Error> {
        let dir = dir.as_ref().to_path_buf();
        if self.pattern.is_empty()
            || StrftimeItems::new(&self.pattern).any(|item| matches!(item, Item::Error))
        {
            return Err(Error::SinkInit(format!("invalid file name pattern: {}", self.pattern)));
        }
        if self.policy.max_size == 0 {
            return Err(Error::SinkInit("rotation size must be positive".into()));
        }
        fs::create_dir_all(&dir)
            .map_err(|e| Error::SinkInit(format!("cannot create {}: {e}", dir.display())))?;
        let active = RotatingFileAppender::open_file(&dir, &self.pattern, Local::now())
            .map_err(|e| Error::SinkInit(format!("cannot open log file in {}: {e}", dir.display())))?;
        Ok(RotatingFileAppender {
            dir,
            pattern: self.pattern,
            policy: self.policy,
            sync_every_write: self.sync_every_write,
            encoder: self.encoder.unwrap_or_else(line_encoder),
            active: Mutex::new(active),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::tempdir;

    fn at(h: u32, m: u32, day: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 6, day, h, m, 0).unwrap()
    }

    #[test]
    fn rotates_on_size_cap() {
        let p = RotationPolicy { max_size: 100 };
        assert!(!p.should_rotate(99, at(10, 0, 1), at(10, 1, 1)));
        assert!(p.should_rotate(100, at(10, 0, 1), at(10, 1, 1)));
    }

    #[test]
    fn rotates_after_midnight() {
        let p = RotationPolicy::default();
        assert!(!p.should_rotate(0, at(0, 0, 1), at(23, 59, 1)));
        assert!(p.should_rotate(0, at(23, 59, 1), at(0, 1, 2)));
    }

    #[test]
    fn default_cap_is_ten_mib() {
        assert_eq!(RotationPolicy::default().max_size, 10 * 1024 * 1024);
    }

    #[test]
    fn invalid_pattern_is_sink_init_error() {
        let dir = tempdir().unwrap();
        let err = RotatingFileAppender::builder().pattern("log_%").build(dir.path()).unwrap_err();
        assert!(matches!(err, Error::SinkInit(_)));
    }

    #[test]
    fn unwritable_target_is_sink_init_error() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("not_a_dir");
        fs::write(&blocker, b"x").unwrap();
        let err = RotatingFileAppender::builder().build(blocker.join("logs")).unwrap_err();
        assert!(matches!(err, Error::SinkInit(_)));
    }

    #[test]
    fn same_instant_names_get_suffix() {
        let dir = tempdir().unwrap();
        let now = Local::now();
        let a = RotatingFileAppender::open_file(dir.path(), "fixed.log", now).unwrap();
        let b = RotatingFileAppender::open_file(dir.path(), "fixed.log", now).unwrap();
        assert_eq!(a.path.file_name().unwrap(), "fixed.log");
        assert_eq!(b.path.file_name().unwrap(), "fixed.log.1");
    }

    #[test]
    fn remove_if_empty_keeps_written_files() {
        let dir = tempdir().unwrap();
        let unused = RotatingFileAppender::builder().sync_every_write(false).build(dir.path()).unwrap();
        let path = unused.current_path();
        assert!(unused.remove_if_empty().unwrap());
        assert!(!path.exists());

        let used = RotatingFileAppender::builder().sync_every_write(false).build(dir.path()).unwrap();
        used.append(&log::Record::builder().args(format_args!("kept")).build()).unwrap();
        assert!(!used.remove_if_empty().unwrap());
        assert!(used.current_path().exists());
    }

    #[test]
    fn writes_lines_and_rolls_to_new_file() {
        let dir = tempdir().unwrap();
        let appender = RotatingFileAppender::builder()
            .rotation_size(64)
            .sync_every_write(false)
            .build(dir.path())
            .unwrap();
        let first = appender.current_path();
        let name = first.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("log_") && name.ends_with(".log"), "{name}");
        for i in 0..10 {
            appender
                .append(&log::Record::builder().args(format_args!("line number {i:04} padded")).build())
                .unwrap();
        }
        assert_ne!(appender.current_path(), first);
        let files = fs::read_dir(dir.path()).unwrap().count();
        assert!(files >= 2, "expected rotation, found {files} file(s)");
        let first_body = fs::read_to_string(&first).unwrap();
        assert!(first_body.starts_with("line number 0000 padded"));
    }
}
