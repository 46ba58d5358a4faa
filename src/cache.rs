// Process-wide cache of normalized tables.
//
// The load step is idempotent, so the table for a workbook is materialized
// once per (path, modification time) and shared read-only afterwards. A
// rewritten file changes its mtime and misses the cache; stale entries are
// only dropped by explicit eviction, entries otherwise live for the
// process lifetime.
use crate::config::IngestOptions;
use crate::error::Result;
use crate::ingest::{self, IngestReport};
use crate::types::SalesTable;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::SystemTime;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    path: PathBuf,
    modified: SystemTime,
}

static TABLES: Lazy<Mutex<HashMap<CacheKey, Arc<(SalesTable, IngestReport)>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

fn key_for(path: &Path) -> Result<CacheKey> {
    let canonical = fs::canonicalize(path)?;
    let modified = fs::metadata(&canonical)?.modified()?;
    Ok(CacheKey {
        path: canonical,
        modified,
    })
}

/// Load a workbook through the cache.
pub fn load(path: &Path, opts: &IngestOptions) -> Result<Arc<(SalesTable, IngestReport)>> {
    load_with(path, || ingest::load_workbook(path, opts))
}

fn load_with<F>(path: &Path, loader: F) -> Result<Arc<(SalesTable, IngestReport)>>
where
    F: FnOnce() -> Result<(SalesTable, IngestReport)>,
{
    let key = key_for(path)?;
    if let Some(hit) = TABLES.lock().unwrap().get(&key) {
        debug!(path = %key.path.display(), "table cache hit");
        return Ok(Arc::clone(hit));
    }
    // Loading happens outside the lock; a racing duplicate load is
    // idempotent and the second insert wins harmlessly.
    let loaded = Arc::new(loader()?);
    TABLES.lock().unwrap().insert(key, Arc::clone(&loaded));
    Ok(loaded)
}

/// Drop every cached entry for a path, regardless of modification time.
pub fn evict(path: &Path) {
    let canonical = match fs::canonicalize(path) {
        Ok(p) => p,
        Err(_) => path.to_path_buf(),
    };
    TABLES.lock().unwrap().retain(|key, _| key.path != canonical);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn counting_loader(count: &AtomicUsize) -> impl FnOnce() -> Result<(SalesTable, IngestReport)> + '_ {
        move || {
            count.fetch_add(1, Ordering::SeqCst);
            Ok((SalesTable::default(), IngestReport::default()))
        }
    }

    fn set_mtime(path: &Path, time: SystemTime) {
        File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(time)
            .unwrap();
    }

    #[test]
    fn same_file_identity_hits_the_cache() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let loads = AtomicUsize::new(0);

        load_with(file.path(), counting_loader(&loads)).unwrap();
        load_with(file.path(), counting_loader(&loads)).unwrap();
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn touched_file_misses_the_cache() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let loads = AtomicUsize::new(0);

        let t0 = SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        set_mtime(file.path(), t0);
        load_with(file.path(), counting_loader(&loads)).unwrap();

        set_mtime(file.path(), t0 + Duration::from_secs(60));
        load_with(file.path(), counting_loader(&loads)).unwrap();
        assert_eq!(loads.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn eviction_forces_a_reload() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let loads = AtomicUsize::new(0);

        load_with(file.path(), counting_loader(&loads)).unwrap();
        evict(file.path());
        load_with(file.path(), counting_loader(&loads)).unwrap();
        assert_eq!(loads.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn unreadable_path_fails_fast() {
        let missing = Path::new("definitely/not/here.xlsx");
        assert!(load_with(missing, || Ok((SalesTable::default(), IngestReport::default()))).is_err());
    }
}
