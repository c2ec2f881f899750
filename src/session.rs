//! Load-once table cache and the per-session dashboard context.
//!
//! A [`TableCache`] is created once by the host and handed to whoever needs a
//! table. The first request for a source runs the full load → clean → derive
//! pipeline; later requests for the same source get the same
//! `Arc<SalesTable>` back without touching the file. Concurrent first access
//! loads exactly once. Failed loads are not cached.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use log::{debug, info};

use crate::{
    aggregate::DashboardView,
    clean::Cleaner,
    config::DashboardConfig,
    derive::{SalesTable, derive_calendar_features},
    error::SourceUnreadable,
    filter::Selection,
    loader::Loader,
};

/// Everything that determines the table produced for a source.
#[derive(Debug, Clone)]
pub struct SourceSpec {
    pub path: PathBuf,
    pub loader: Loader,
    pub cleaner: Cleaner,
}

impl SourceSpec {
    pub fn new(path: impl Into<PathBuf>, loader: Loader, cleaner: Cleaner) -> Self {
        SourceSpec {
            path: path.into(),
            loader,
            cleaner,
        }
    }

    /// Runs the full pipeline without any caching.
    pub fn load_table(&self) -> Result<SalesTable, SourceUnreadable> {
        let raw = self.loader.load(&self.path)?;
        let cleaned = self.cleaner.clean(&raw);
        info!(
            "Retained {} of {} row(s) from {:?} after cleaning",
            cleaned.len(),
            raw.len(),
            self.path
        );
        Ok(derive_calendar_features(cleaned))
    }

    fn cache_key(&self) -> CacheKey {
        CacheKey {
            path: self.path.clone(),
            delimiter: self.loader.delimiter(),
            encoding: self.loader.encoding().name(),
            dropped_columns: self.cleaner.dropped_columns().to_vec(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    path: PathBuf,
    delimiter: Option<u8>,
    encoding: &'static str,
    dropped_columns: Vec<String>,
}

type Slot = Arc<Mutex<Option<Arc<SalesTable>>>>;

#[derive(Debug, Default)]
pub struct TableCache {
    slots: Mutex<HashMap<CacheKey, Slot>>,
}

impl TableCache {
    pub fn new() -> Self {
        TableCache::default()
    }

    pub fn get_or_load(&self, source: &SourceSpec) -> Result<Arc<SalesTable>, SourceUnreadable> {
        let slot = {
            let mut slots = lock(&self.slots);
            Arc::clone(slots.entry(source.cache_key()).or_default())
        };
        let mut guard = lock(&slot);
        if let Some(table) = guard.as_ref() {
            debug!("Reusing cached table for {:?}", source.path);
            return Ok(Arc::clone(table));
        }
        let table = Arc::new(source.load_table()?);
        *guard = Some(Arc::clone(&table));
        Ok(table)
    }

    pub fn is_loaded(&self, source: &SourceSpec) -> bool {
        let Some(slot) = lock(&self.slots).get(&source.cache_key()).cloned() else {
            return false;
        };
        let loaded = lock(&slot).is_some();
        loaded
    }
}

// A poisoned slot still holds either nothing or a complete table.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// One user's view onto a shared, immutable table.
#[derive(Debug, Clone)]
pub struct Dashboard {
    table: Arc<SalesTable>,
    config: DashboardConfig,
}

impl Dashboard {
    pub fn new(table: Arc<SalesTable>, config: DashboardConfig) -> Self {
        Dashboard { table, config }
    }

    /// Loads (or reuses) the table for `path` through `cache`.
    pub fn open(
        cache: &TableCache,
        path: &Path,
        loader: Loader,
        config: DashboardConfig,
    ) -> Result<Self, SourceUnreadable> {
        let cleaner = Cleaner::new(config.dropped_columns.iter().cloned());
        let source = SourceSpec::new(path, loader, cleaner);
        let table = cache.get_or_load(&source)?;
        Ok(Dashboard::new(table, config))
    }

    pub fn table(&self) -> &SalesTable {
        &self.table
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut DashboardConfig {
        &mut self.config
    }

    pub fn categories(&self) -> Vec<&str> {
        self.table.categories()
    }

    pub fn default_selection(&self) -> Selection {
        Selection::first(&self.table, self.config.default_category_count)
    }

    pub fn view(&self, selection: &Selection) -> DashboardView<'_> {
        DashboardView::compute(&self.table, selection, self.config.trend_window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{fs, thread};

    const SALES: &str = "index,Date,Category,Size,Qty,Amount\n\
        0,2022-04-01,Set,S,1,100\n\
        1,2022-04-02,kurta,M,2,200\n\
        2,2022-04-02,Top,L,1,50\n\
        3,2022-04-03,Blouse,XL,1,75\n";

    fn source(path: &Path) -> SourceSpec {
        SourceSpec::new(path, Loader::default(), Cleaner::default())
    }

    #[test]
    fn cache_returns_same_table_without_rereading() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("sales.csv");
        fs::write(&path, SALES).expect("write");
        let cache = TableCache::new();
        let sales = source(&path);
        assert!(!cache.is_loaded(&sales));

        let first = cache.get_or_load(&sales).expect("first load");
        fs::remove_file(&path).expect("remove source");
        let second = cache.get_or_load(&sales).expect("cached load");

        assert!(Arc::ptr_eq(&first, &second));
        assert!(cache.is_loaded(&sales));
        assert_eq!(second.len(), 4);
    }

    #[test]
    fn failed_loads_are_not_cached() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("late.csv");
        let cache = TableCache::new();
        let sales = source(&path);
        assert!(cache.get_or_load(&sales).is_err());
        assert!(!cache.is_loaded(&sales));

        fs::write(&path, SALES).expect("write");
        assert_eq!(cache.get_or_load(&sales).expect("load").len(), 4);
    }

    #[test]
    fn concurrent_first_access_shares_one_table() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("sales.csv");
        fs::write(&path, SALES).expect("write");
        let cache = TableCache::new();
        let sales = source(&path);

        let tables = thread::scope(|scope| {
            let handles = (0..4)
                .map(|_| scope.spawn(|| cache.get_or_load(&sales).expect("load")))
                .collect::<Vec<_>>();
            handles
                .into_iter()
                .map(|h| h.join().expect("join"))
                .collect::<Vec<_>>()
        });
        assert!(tables.windows(2).all(|pair| Arc::ptr_eq(&pair[0], &pair[1])));
    }

    #[test]
    fn dashboard_default_selection_uses_configured_count() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("sales.csv");
        fs::write(&path, SALES).expect("write");
        let cache = TableCache::new();
        let config = DashboardConfig {
            default_category_count: 2,
            ..DashboardConfig::default()
        };
        let dashboard =
            Dashboard::open(&cache, &path, Loader::default(), config).expect("dashboard");
        assert_eq!(dashboard.categories(), vec!["Set", "kurta", "Top", "Blouse"]);
        let selection = dashboard.default_selection();
        assert_eq!(selection.len(), 2);
        assert!(selection.contains("Set") && selection.contains("kurta"));
        let view = dashboard.view(&selection);
        assert_eq!(view.kpis.order_count, 2);
    }

    #[test]
    fn sessions_share_the_table_but_not_views() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("sales.csv");
        fs::write(&path, SALES).expect("write");
        let cache = TableCache::new();
        let a = Dashboard::open(&cache, &path, Loader::default(), DashboardConfig::default())
            .expect("a");
        let b = Dashboard::open(&cache, &path, Loader::default(), DashboardConfig::default())
            .expect("b");
        assert!(std::ptr::eq(a.table(), b.table()));
        let top = a.view(&Selection::from_iter(["Top"]));
        let all = b.view(&Selection::all(b.table()));
        assert_eq!(top.kpis.order_count, 1);
        assert_eq!(all.kpis.order_count, 4);
    }
}
