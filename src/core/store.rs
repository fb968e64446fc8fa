//! Category and template stores with modification-time reloads.
//!
//! Each store caches one immutable snapshot behind an `Arc`. A reload
//! builds a complete replacement and swaps it in, so readers see either
//! the old snapshot or the new one, never a partial one.

use rustc_hash::FxHashSet;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::SystemTime;
use tracing::{debug, info, warn};

use crate::schema::category::{
    category_name, load_category_file, CategoryMap, CATEGORY_EXTENSIONS,
};
use crate::schema::template::TemplateSet;

/// File path → (modified time, length) for every tracked file.
type Fingerprint = BTreeMap<PathBuf, (SystemTime, u64)>;

fn stamp(path: &Path) -> Option<(SystemTime, u64)> {
    let meta = std::fs::metadata(path).ok()?;
    if !meta.is_file() {
        return None;
    }
    Some((meta.modified().ok()?, meta.len()))
}

struct Snapshot<T> {
    fingerprint: Fingerprint,
    content: Arc<T>,
}

/// Shared snapshot slot plus the lock that serializes rebuilds.
struct ContentCache<T> {
    snapshot: RwLock<Option<Arc<Snapshot<T>>>>,
    reload: Mutex<()>,
}

impl<T> ContentCache<T> {
    fn empty() -> Self {
        Self {
            snapshot: RwLock::new(None),
            reload: Mutex::new(()),
        }
    }

    fn preloaded(content: T) -> Self {
        let snapshot = Snapshot {
            fingerprint: Fingerprint::new(),
            content: Arc::new(content),
        };
        Self {
            snapshot: RwLock::new(Some(Arc::new(snapshot))),
            reload: Mutex::new(()),
        }
    }

    fn current(&self) -> Option<Arc<Snapshot<T>>> {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn is_stale(&self, fingerprint: &Fingerprint) -> bool {
        match self.current() {
            Some(snapshot) => snapshot.fingerprint != *fingerprint,
            None => true,
        }
    }

    /// Rebuild if `fingerprint` differs from the cached one. Concurrent
    /// callers queue on the reload lock and re-check before rebuilding.
    fn refresh_with<F>(&self, fingerprint: Fingerprint, load: F) -> bool
    where
        F: FnOnce() -> T,
    {
        if !self.is_stale(&fingerprint) {
            return false;
        }
        let _guard = self.reload.lock().unwrap_or_else(PoisonError::into_inner);
        if !self.is_stale(&fingerprint) {
            return false;
        }
        let snapshot = Arc::new(Snapshot {
            fingerprint,
            content: Arc::new(load()),
        });
        *self.snapshot.write().unwrap_or_else(PoisonError::into_inner) = Some(snapshot);
        true
    }
}

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

enum CategorySource {
    Directory(PathBuf),
    Static,
}

/// Category library loaded from a directory of `.json` / `.ron` files.
pub struct CategoryStore {
    source: CategorySource,
    cache: ContentCache<CategoryMap>,
}

impl CategoryStore {
    /// A store over `dir`. Nothing is read until first access.
    pub fn open(dir: impl Into<PathBuf>) -> Self {
        Self {
            source: CategorySource::Directory(dir.into()),
            cache: ContentCache::empty(),
        }
    }

    /// A fixed, in-memory library that never reloads.
    pub fn from_map(categories: CategoryMap) -> Self {
        Self {
            source: CategorySource::Static,
            cache: ContentCache::preloaded(categories),
        }
    }

    /// The current library, loading it on first access.
    pub fn categories(&self) -> Arc<CategoryMap> {
        if let Some(snapshot) = self.cache.current() {
            return Arc::clone(&snapshot.content);
        }
        self.refresh_if_stale();
        self.cache
            .current()
            .map(|snapshot| Arc::clone(&snapshot.content))
            .unwrap_or_default()
    }

    /// Reload if any category file was added, removed, or modified.
    /// Returns whether a reload happened.
    pub fn refresh_if_stale(&self) -> bool {
        let dir = match &self.source {
            CategorySource::Directory(dir) => dir,
            CategorySource::Static => return false,
        };
        let fingerprint = scan_fingerprint(dir);
        self.cache
            .refresh_with(fingerprint, || load_category_dir(dir))
    }
}

fn category_files(dir: &Path) -> Vec<PathBuf> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return Vec::new(),
    };
    let mut files: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && category_name(path).is_some())
        .collect();
    // Later extensions override earlier ones for the same category name.
    files.sort_by_key(|path| {
        let rank = path
            .extension()
            .and_then(|s| s.to_str())
            .and_then(|ext| CATEGORY_EXTENSIONS.iter().position(|e| *e == ext))
            .unwrap_or(0);
        (rank, path.clone())
    });
    files
}

fn scan_fingerprint(dir: &Path) -> Fingerprint {
    category_files(dir)
        .into_iter()
        .filter_map(|path| stamp(&path).map(|s| (path, s)))
        .collect()
}

/// Load every category file in `dir`. A bad file becomes an empty
/// category and never stops the others from loading.
fn load_category_dir(dir: &Path) -> CategoryMap {
    if !dir.is_dir() {
        warn!(dir = %dir.display(), "category directory not found; no categories loaded");
        return CategoryMap::new();
    }

    let mut categories = CategoryMap::new();
    for path in category_files(dir) {
        match load_category_file(&path) {
            Ok((name, snippets)) => {
                debug!(category = %name, count = snippets.len(), "loaded category");
                categories.insert(name, snippets);
            }
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to load category; treating as empty"
                );
                if let Some(name) = category_name(&path) {
                    categories.insert(name, Vec::new());
                }
            }
        }
    }
    info!(dir = %dir.display(), count = categories.len(), "category library loaded");
    categories
}

// ---------------------------------------------------------------------------
// Templates
// ---------------------------------------------------------------------------

enum TemplateSource {
    File(PathBuf),
    Static,
}

/// Template definitions loaded from a single `.json` or `.ron` file.
pub struct TemplateStore {
    source: TemplateSource,
    reserved: FxHashSet<String>,
    cache: ContentCache<TemplateSet>,
}

impl TemplateStore {
    /// A store over `path`, classifying `reserved` tokens as markers.
    pub fn open(path: impl Into<PathBuf>, reserved: FxHashSet<String>) -> Self {
        Self {
            source: TemplateSource::File(path.into()),
            reserved,
            cache: ContentCache::empty(),
        }
    }

    /// A fixed, in-memory template set that never reloads.
    pub fn from_set(templates: TemplateSet) -> Self {
        Self {
            source: TemplateSource::Static,
            reserved: FxHashSet::default(),
            cache: ContentCache::preloaded(templates),
        }
    }

    /// The current templates, loading them on first access.
    pub fn templates(&self) -> Arc<TemplateSet> {
        if let Some(snapshot) = self.cache.current() {
            return Arc::clone(&snapshot.content);
        }
        self.refresh_if_stale();
        match self.cache.current() {
            Some(snapshot) => Arc::clone(&snapshot.content),
            None => Arc::new(TemplateSet::fallback(&self.reserved)),
        }
    }

    /// Reload if the template file appeared, disappeared, or changed.
    pub fn refresh_if_stale(&self) -> bool {
        let path = match &self.source {
            TemplateSource::File(path) => path,
            TemplateSource::Static => return false,
        };
        let fingerprint: Fingerprint = stamp(path)
            .map(|s| (path.clone(), s))
            .into_iter()
            .collect();
        self.cache
            .refresh_with(fingerprint, || load_template_file(path, &self.reserved))
    }
}

fn load_template_file(path: &Path, reserved: &FxHashSet<String>) -> TemplateSet {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) => {
            warn!(
                path = %path.display(),
                error = %e,
                "template source unreadable; using fallback template"
            );
            return TemplateSet::fallback(reserved);
        }
    };
    let parsed = match path.extension().and_then(|s| s.to_str()) {
        Some("ron") => TemplateSet::parse_ron(&contents, reserved),
        _ => TemplateSet::parse_json(&contents, reserved),
    };
    match parsed {
        Ok(set) => {
            info!(path = %path.display(), templates = ?set.names(), "templates loaded");
            set
        }
        Err(e) => {
            warn!(
                path = %path.display(),
                error = %e,
                "malformed template source; using fallback template"
            );
            TemplateSet::fallback(reserved)
        }
    }
}
