#![forbid(unsafe_code)]

use crate::column::{dispatch, Column};
use crate::element::Element;
use crate::error::ColumnError;
use crate::typed::{cmp_rows, TypedColumn};
use std::cmp::Ordering;
#[cfg(all(feature = "parallel", not(target_arch = "wasm32")))]
use std::sync::OnceLock;

#[cfg(all(feature = "parallel", not(target_arch = "wasm32")))]
use rayon::ThreadPool;

/// Comparator over 0-based row indices.
pub type RowComparator<'a> = dyn Fn(usize, usize) -> Ordering + Sync + 'a;

/// Blocking sort of row positions.
///
/// Implementations make no stability promise and cannot be cancelled; the
/// call returns once `positions` is fully ordered under `cmp`.
pub trait SortService: Send + Sync {
    fn sort_positions(&self, positions: &mut [usize], cmp: &RowComparator<'_>);
}

/// Sorts on the calling thread.
#[derive(Clone, Copy, Debug, Default)]
pub struct SequentialSort;

impl SortService for SequentialSort {
    fn sort_positions(&self, positions: &mut [usize], cmp: &RowComparator<'_>) {
        positions.sort_unstable_by(|a, b| cmp(*a, *b));
    }
}

/// Tuning for [`ParallelSort`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SortOptions {
    /// Inputs shorter than this are sorted on the calling thread.
    pub parallel_threshold: usize,
    /// Worker count; `None` reads `RAYON_NUM_THREADS`, then the available
    /// parallelism.
    pub threads: Option<usize>,
}

impl Default for SortOptions {
    fn default() -> Self {
        Self {
            parallel_threshold: 16_384,
            threads: None,
        }
    }
}

/// Sorts large inputs on a private Rayon pool.
///
/// The pool is built on first use and kept for the lifetime of the service.
/// When it cannot be created (or the `parallel` feature is off) every sort
/// runs on the calling thread instead.
#[derive(Debug, Default)]
pub struct ParallelSort {
    options: SortOptions,
    #[cfg(all(feature = "parallel", not(target_arch = "wasm32")))]
    pool: OnceLock<Option<ThreadPool>>,
}

#[cfg(all(feature = "parallel", not(target_arch = "wasm32")))]
fn desired_threads(configured: Option<usize>) -> usize {
    let from_env = || {
        std::env::var("RAYON_NUM_THREADS")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .filter(|&n| n > 0)
    };
    configured
        .filter(|&n| n > 0)
        .or_else(from_env)
        .unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
}

#[cfg(all(feature = "parallel", not(target_arch = "wasm32")))]
fn build_pool(configured: Option<usize>) -> Option<ThreadPool> {
    let requested = desired_threads(configured).max(1);
    let try_build = |n| {
        rayon::ThreadPoolBuilder::new()
            .num_threads(n)
            .thread_name(|i| format!("columnar-sort-{i}"))
            .build()
    };

    let pool = match try_build(requested) {
        Ok(pool) => Some(pool),
        Err(_) if requested > 1 => try_build(1).ok(),
        Err(_) => None,
    };
    if let Some(pool) = &pool {
        log::debug!("built sort pool with {} threads", pool.current_num_threads());
    }
    pool
}

impl ParallelSort {
    pub fn new(options: SortOptions) -> Self {
        Self {
            options,
            #[cfg(all(feature = "parallel", not(target_arch = "wasm32")))]
            pool: OnceLock::new(),
        }
    }

    pub fn options(&self) -> &SortOptions {
        &self.options
    }

    #[cfg(all(feature = "parallel", not(target_arch = "wasm32")))]
    fn pool(&self) -> Option<&ThreadPool> {
        self.pool
            .get_or_init(|| build_pool(self.options.threads))
            .as_ref()
    }
}

impl SortService for ParallelSort {
    fn sort_positions(&self, positions: &mut [usize], cmp: &RowComparator<'_>) {
        if positions.len() < self.options.parallel_threshold {
            positions.sort_unstable_by(|a, b| cmp(*a, *b));
            return;
        }

        #[cfg(all(feature = "parallel", not(target_arch = "wasm32")))]
        {
            use rayon::slice::ParallelSliceMut;

            if let Some(pool) = self.pool() {
                log::debug!(
                    "sorting {} rows on {} threads",
                    positions.len(),
                    pool.current_num_threads()
                );
                pool.install(|| positions.par_sort_unstable_by(|a, b| cmp(*a, *b)));
                return;
            }
            log::warn!(
                "sort pool unavailable; sorting {} rows on the calling thread",
                positions.len()
            );
        }

        positions.sort_unstable_by(|a, b| cmp(*a, *b));
    }
}

impl<T: Element> TypedColumn<T> {
    /// Fails with the first pair of present rows that cannot be ordered.
    ///
    /// Row kinds form comparability classes (numbers, booleans, dates,
    /// strings), so checking every row against the first present one is
    /// enough to make the column totally ordered.
    fn check_orderable(&self) -> Result<(), ColumnError> {
        let mut present = self.buffer().iter().flatten();
        if let Some(first) = present.next() {
            for v in present {
                first.compare(v)?;
            }
        }
        Ok(())
    }

    /// 1-based positions in ascending row order (nulls first).
    ///
    /// Object columns holding values of unrelated kinds are rejected before
    /// any sorting starts.
    pub fn sort_positions(&self, service: &dyn SortService) -> Result<Vec<usize>, ColumnError> {
        self.check_orderable()?;
        Ok(self.sort_positions_by(service, |a, b| {
            cmp_rows(a, b).unwrap_or(Ordering::Equal)
        }))
    }

    /// 1-based positions ordered by `cmp`, which must be a total order over
    /// the rows. Equal rows keep their relative order.
    pub fn sort_positions_by<F>(&self, service: &dyn SortService, cmp: F) -> Vec<usize>
    where
        F: Fn(Option<&T>, Option<&T>) -> Ordering + Sync,
    {
        let buf = self.buffer();
        let mut positions: Vec<usize> = (0..buf.len()).collect();
        service.sort_positions(&mut positions, &|a, b| {
            cmp(buf.get(a), buf.get(b)).then(a.cmp(&b))
        });
        positions.into_iter().map(|i| i + 1).collect()
    }

    /// Ascending copy of the column (nulls first).
    pub fn sort(&self, service: &dyn SortService) -> Result<Self, ColumnError> {
        let positions = self.sort_positions(service)?;
        Ok(self.take(&positions))
    }

    /// Copy of the column ordered by `cmp` (see
    /// [`TypedColumn::sort_positions_by`]).
    pub fn sort_by<F>(&self, service: &dyn SortService, cmp: F) -> Self
    where
        F: Fn(Option<&T>, Option<&T>) -> Ordering + Sync,
    {
        self.take(&self.sort_positions_by(service, cmp))
    }
}

impl Column {
    pub fn sort(&self, service: &dyn SortService) -> Result<Column, ColumnError> {
        dispatch!(self, c => Ok(c.sort(service)?.into_column()), k => Ok(Column::Const(k.clone())))
    }
}
