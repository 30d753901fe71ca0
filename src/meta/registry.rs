// ============================================================================
// Accessor Registry
// ============================================================================
//
// Memoizes one AccessorTable per entity type.
//
// - Lookups read a Copy-on-Write snapshot of the table map; the read lock is
//   held only long enough to clone the Arc.
// - Construction is serialized by a single mutex. The snapshot is checked
//   again under the mutex so a racing caller never builds a second table.
// - A published table is never rebuilt or replaced.
//
// ============================================================================

use super::{AccessorTable, Entity};
use crate::core::{EditError, Result};
use lazy_static::lazy_static;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use tracing::debug;

type ErasedTable = Arc<dyn Any + Send + Sync>;

lazy_static! {
    static ref SHARED_REGISTRY: Arc<AccessorRegistry> = Arc::new(AccessorRegistry::new());
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RegistryStats {
    /// Number of cached tables
    pub tables: usize,
    /// Number of tables actually constructed
    pub builds: u64,
    /// Number of lookups served from the cache
    pub hits: u64,
}

pub struct AccessorRegistry {
    tables: RwLock<Arc<HashMap<TypeId, ErasedTable>>>,
    build_lock: Mutex<()>,
    builds: AtomicU64,
    hits: AtomicU64,
}

impl Default for AccessorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl AccessorRegistry {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Arc::new(HashMap::new())),
            build_lock: Mutex::new(()),
            builds: AtomicU64::new(0),
            hits: AtomicU64::new(0),
        }
    }

    /// Process-wide default registry, created on first use.
    ///
    /// Prefer passing an explicit registry handle where the caller controls
    /// lifecycle; this exists for code that does not care.
    pub fn shared() -> Arc<AccessorRegistry> {
        Arc::clone(&SHARED_REGISTRY)
    }

    /// Returns the accessor table for `T`, building it on first request.
    pub fn table<T: Entity>(&self) -> Result<Arc<AccessorTable<T>>> {
        if let Some(table) = self.lookup::<T>()? {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(table);
        }

        let _guard = self.build_lock.lock()?;

        // Another caller may have published the table while we waited.
        if let Some(table) = self.lookup::<T>()? {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(table);
        }

        let table = Arc::new(AccessorTable::<T>::build());
        self.builds.fetch_add(1, Ordering::SeqCst);

        {
            let mut slot = self.tables.write()?;
            let mut next = (**slot).clone();
            next.insert(TypeId::of::<T>(), Arc::clone(&table) as ErasedTable);
            *slot = Arc::new(next);
        }

        debug!(
            entity = T::type_name(),
            properties = table.len(),
            "built accessor table"
        );

        Ok(table)
    }

    /// Builds the table for `T` ahead of first use.
    pub fn warm_up<T: Entity>(&self) -> Result<()> {
        self.table::<T>().map(|_| ())
    }

    pub fn contains<T: Entity>(&self) -> bool {
        self.snapshot()
            .map(|tables| tables.contains_key(&TypeId::of::<T>()))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.snapshot().map(|tables| tables.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            tables: self.len(),
            builds: self.builds.load(Ordering::SeqCst),
            hits: self.hits.load(Ordering::Relaxed),
        }
    }

    fn snapshot(&self) -> Result<Arc<HashMap<TypeId, ErasedTable>>> {
        Ok(Arc::clone(&*self.tables.read()?))
    }

    fn lookup<T: Entity>(&self) -> Result<Option<Arc<AccessorTable<T>>>> {
        let tables = self.snapshot()?;
        let Some(erased) = tables.get(&TypeId::of::<T>()) else {
            return Ok(None);
        };

        Arc::clone(erased)
            .downcast::<AccessorTable<T>>()
            .map(Some)
            .map_err(|_| {
                EditError::TypeMismatch(format!(
                    "cached accessor table does not belong to '{}'",
                    T::type_name()
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{DataType, Value};
    use crate::meta::PropertySpec;

    #[derive(Default)]
    struct Counter {
        hits: i64,
    }

    impl Entity for Counter {
        fn properties() -> Vec<PropertySpec<Self>> {
            vec![PropertySpec::read_only(
                "hits",
                DataType::Integer,
                |c: &Counter| Value::Integer(c.hits),
            )]
        }
    }

    #[test]
    fn test_table_is_built_once() {
        let registry = AccessorRegistry::new();
        assert!(!registry.contains::<Counter>());

        let first = registry.table::<Counter>().unwrap();
        let second = registry.table::<Counter>().unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert!(registry.contains::<Counter>());

        let stats = registry.stats();
        assert_eq!(stats.tables, 1);
        assert_eq!(stats.builds, 1);
        assert_eq!(stats.hits, 1);
    }

    #[test]
    fn test_registries_are_independent() {
        let a = AccessorRegistry::new();
        let b = AccessorRegistry::new();
        a.warm_up::<Counter>().unwrap();
        assert_eq!(a.len(), 1);
        assert!(b.is_empty());
    }
}
