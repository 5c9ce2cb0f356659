//! In-memory keyset-paginated store.
//!
//! Mirrors what a SQL storage layer does with a scope: the scope is AND-ed
//! into the listing query, rows are ordered by `(created_at, id)` and the
//! `after_id` cursor continues strictly after the referenced row.

use authz_scope::AccessScope;
use parking_lot::RwLock;
use time::OffsetDateTime;

use crate::error::StoreError;
use crate::secure::{ScopableRow, row_matches};

/// Property consulted by [`PruneFilter::status`].
pub const STATUS_PROPERTY: &str = "status";

/// A row kept by [`InMemoryStore`].
pub trait StoredRow: ScopableRow + Clone + Send + Sync {
    fn row_id(&self) -> &str;
    fn created_at(&self) -> OffsetDateTime;
}

/// Keyset pagination parameters. A `limit` of zero means "no limit".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageRequest {
    pub after_id: Option<String>,
    pub limit: usize,
    pub offset: usize,
}

impl PageRequest {
    #[must_use]
    pub fn first(limit: usize) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn after(mut self, id: impl Into<String>) -> Self {
        self.after_id = Some(id.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageInfo {
    /// Cursor for the next page, `None` when this page is the last one.
    pub next_cursor: Option<String>,
    pub limit: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page_info: PageInfo,
}

/// Optional status restriction applied by [`InMemoryStore::prune`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PruneFilter {
    pub status: Option<String>,
}

#[derive(Debug, Clone)]
struct Entry<R> {
    row: R,
    deleted: bool,
}

/// Rows kept in `(created_at, id)` order behind a read-write lock.
#[derive(Debug)]
pub struct InMemoryStore<R> {
    rows: RwLock<Vec<Entry<R>>>,
}

impl<R> Default for InMemoryStore<R> {
    fn default() -> Self {
        Self {
            rows: RwLock::new(Vec::new()),
        }
    }
}

fn sort_key<R: StoredRow>(row: &R) -> (OffsetDateTime, &str) {
    (row.created_at(), row.row_id())
}

impl<R: StoredRow> InMemoryStore<R> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a row, keeping keyset order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicateId`] if a row with the same ID exists.
    pub fn insert(&self, row: R) -> Result<(), StoreError> {
        let mut rows = self.rows.write();
        if rows.iter().any(|e| e.row.row_id() == row.row_id()) {
            return Err(StoreError::DuplicateId(row.row_id().to_owned()));
        }
        let pos = rows.partition_point(|e| sort_key(&e.row) < sort_key(&row));
        rows.insert(pos, Entry { row, deleted: false });
        Ok(())
    }

    /// Number of rows not soft-deleted.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.rows.read().iter().filter(|e| !e.deleted).count()
    }

    /// List one page of rows visible under `scope`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::CursorNotFound`] if `after_id` references no row.
    pub fn list_page(&self, scope: &AccessScope, req: &PageRequest) -> Result<Page<R>, StoreError> {
        let rows = self.rows.read();

        let start = match &req.after_id {
            Some(cursor) => {
                let idx = rows
                    .iter()
                    .position(|e| e.row.row_id() == cursor)
                    .ok_or_else(|| StoreError::CursorNotFound(cursor.clone()))?;
                idx + 1
            }
            None => 0,
        };

        let visible = rows[start..]
            .iter()
            .filter(|e| !e.deleted && row_matches(scope, &e.row))
            .skip(req.offset);

        let mut items = Vec::new();
        let mut has_more = false;
        for entry in visible {
            if req.limit != 0 && items.len() == req.limit {
                has_more = true;
                break;
            }
            items.push(entry.row.clone());
        }

        let next_cursor = if has_more {
            items.last().map(|r: &R| r.row_id().to_owned())
        } else {
            None
        };

        tracing::debug!(
            returned = items.len(),
            has_more,
            acl_checked = scope.requires_acl_check(),
            "listed scoped page"
        );

        Ok(Page {
            items,
            page_info: PageInfo {
                next_cursor,
                limit: req.limit,
            },
        })
    }

    /// Soft-delete rows visible under `scope` that satisfy `criteria` and the
    /// optional status filter. Returns the number of rows pruned.
    pub fn prune<F>(&self, scope: &AccessScope, filter: &PruneFilter, criteria: F) -> usize
    where
        F: Fn(&R) -> bool,
    {
        let mut rows = self.rows.write();
        let mut pruned = 0;
        for entry in rows.iter_mut().filter(|e| !e.deleted) {
            if let Some(status) = &filter.status
                && entry.row.resolve_property(STATUS_PROPERTY) != Some(status.as_str())
            {
                continue;
            }
            if row_matches(scope, &entry.row) && criteria(&entry.row) {
                entry.deleted = true;
                pruned += 1;
            }
        }
        tracing::debug!(pruned, "pruned scoped rows");
        pruned
    }
}
