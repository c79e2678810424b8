use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant, SystemTime};

use parking_lot::Mutex;

use super::KeyValueBackend;

const LOCK_TIMEOUT: Duration = Duration::from_secs(2);
const LOCK_RETRY: Duration = Duration::from_millis(5);
/// A lock file older than this was left behind by a writer that died.
const LOCK_STALE_AFTER: Duration = Duration::from_secs(30);

type Items = BTreeMap<String, String>;

/// Backend persisted as a single JSON object on disk, so resumption state
/// survives process restarts.
///
/// Several handles (in one process or many) may share a file. Writers take
/// a sibling `<file>.lock`, merge their key into the current file contents
/// and replace the file through `<file>.tmp` and a rename, so a write to one
/// key never drops another and a crash mid-write leaves the previous
/// snapshot intact. Reads always go to disk.
#[derive(Debug)]
pub struct FileBackend {
    path: PathBuf,
    /// Last snapshot read or written, served when the file cannot be read.
    snapshot: Mutex<Items>,
}

impl FileBackend {
    /// Open (or lazily create) the store at `path`. A missing file is an
    /// empty store; an unreadable or corrupt one is an error.
    pub fn open(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        let items = read_items(&path)?;
        Ok(Self {
            path,
            snapshot: Mutex::new(items),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        sibling(&self.path, ".tmp")
    }

    fn lock_path(&self) -> PathBuf {
        sibling(&self.path, ".lock")
    }

    fn flush(&self, items: &Items) -> io::Result<()> {
        let bytes = serde_json::to_vec(items)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        let tmp = self.tmp_path();
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, &self.path)
    }
}

impl KeyValueBackend for FileBackend {
    fn get_item(&self, key: &str) -> Option<String> {
        match read_items(&self.path) {
            Ok(items) => {
                let value = items.get(key).cloned();
                *self.snapshot.lock() = items;
                value
            }
            Err(_) => self.snapshot.lock().get(key).cloned(),
        }
    }

    fn set_item(&self, key: &str, value: String) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let _lock = WriteLock::acquire(self.lock_path())?;
        let mut items = read_items(&self.path)?;
        items.insert(key.to_string(), value);
        self.flush(&items)?;
        *self.snapshot.lock() = items;
        Ok(())
    }
}

fn read_items(path: &Path) -> io::Result<Items> {
    match fs::read(path) {
        Ok(bytes) if bytes.is_empty() => Ok(Items::new()),
        Ok(bytes) => serde_json::from_slice(&bytes)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Items::new()),
        Err(e) => Err(e),
    }
}

/// `<dir>/<file name><suffix>`; the whole file name is kept so stores that
/// differ only by extension never share a sibling.
fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_default();
    name.push(suffix);
    path.with_file_name(name)
}

/// Exclusive writer lock: a lock file created with `create_new`, removed on
/// drop.
struct WriteLock {
    path: PathBuf,
}

impl WriteLock {
    fn acquire(path: PathBuf) -> io::Result<Self> {
        let deadline = Instant::now() + LOCK_TIMEOUT;
        loop {
            match fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
            {
                Ok(_) => return Ok(Self { path }),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    if is_stale(&path) {
                        let _ = fs::remove_file(&path);
                        continue;
                    }
                    if Instant::now() >= deadline {
                        return Err(io::Error::new(
                            io::ErrorKind::WouldBlock,
                            format!("{} is held by another writer", path.display()),
                        ));
                    }
                    thread::sleep(LOCK_RETRY);
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl Drop for WriteLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

fn is_stale(path: &Path) -> bool {
    fs::metadata(path)
        .and_then(|meta| meta.modified())
        .ok()
        .and_then(|modified| SystemTime::now().duration_since(modified).ok())
        .is_some_and(|age| age > LOCK_STALE_AFTER)
}
