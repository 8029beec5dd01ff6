//! In-memory table
//!
//! A `Table<T>` is a vector of records behind one `tokio::sync::RwLock`,
//! together with the id counter. Every check-then-mutate sequence
//! (uniqueness, in-use guards, like toggles) runs inside a single write
//! guard, so two requests can never both pass the same check.

use super::StoreError;
use tokio::sync::RwLock;

/// A record stored in a `Table`
pub trait Record: Clone + Send + Sync + 'static {
    fn id(&self) -> i64;
    fn set_id(&mut self, id: i64);
}

/// Rows of a table, as seen inside a write guard
#[derive(Debug)]
pub struct Rows<T> {
    items: Vec<T>,
    next_id: i64,
}

impl<T: Record> Rows<T> {
    /// Append a record, assigning the next id
    pub fn push(&mut self, mut row: T) -> T {
        row.set_id(self.next_id);
        self.next_id += 1;
        self.items.push(row.clone());
        row
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    /// Whether a row other than `id` matches `pred`
    pub fn any_other(&self, id: i64, pred: impl Fn(&T) -> bool) -> bool {
        self.items.iter().any(|r| r.id() != id && pred(r))
    }

    pub fn get_mut(&mut self, id: i64) -> Option<&mut T> {
        self.items.iter_mut().find(|r| r.id() == id)
    }

    /// Keep the rows matching `keep`, returning how many were dropped
    pub fn retain(&mut self, keep: impl FnMut(&T) -> bool) -> usize {
        let before = self.items.len();
        self.items.retain(keep);
        before - self.items.len()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Process-memory table of records
#[derive(Debug)]
pub struct Table<T> {
    rows: RwLock<Rows<T>>,
}

impl<T: Record> Default for Table<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Record> Table<T> {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(Rows {
                items: Vec::new(),
                next_id: 1,
            }),
        }
    }

    /// Run `f` with exclusive access to the rows
    pub async fn write<R>(&self, f: impl FnOnce(&mut Rows<T>) -> R) -> R {
        let mut rows = self.rows.write().await;
        f(&mut rows)
    }

    /// Run `f` with shared access to the rows
    pub async fn read<R>(&self, f: impl FnOnce(&Rows<T>) -> R) -> R {
        let rows = self.rows.read().await;
        f(&rows)
    }

    pub async fn insert(&self, row: T) -> T {
        self.write(|rows| rows.push(row)).await
    }

    /// Insert unless an existing row conflicts with it
    pub async fn insert_unique(
        &self,
        row: T,
        conflicts: impl Fn(&T) -> bool,
        what: &str,
    ) -> Result<T, StoreError> {
        self.write(|rows| {
            if rows.iter().any(&conflicts) {
                return Err(StoreError::Conflict(what.to_string()));
            }
            Ok(rows.push(row))
        })
        .await
    }

    /// Edit one row under the write guard
    ///
    /// `f` works on a copy and sees the other rows, so it can enforce
    /// uniqueness or counting rules. The copy is stored only when `f`
    /// returns `Ok`; fields `f` leaves alone keep their stored values.
    pub async fn modify<R>(
        &self,
        id: i64,
        f: impl FnOnce(&mut T, &Rows<T>) -> Result<R, StoreError>,
    ) -> Result<(T, R), StoreError> {
        self.write(|rows| {
            let mut edited = rows
                .iter()
                .find(|r| r.id() == id)
                .cloned()
                .ok_or(StoreError::NotFound(id))?;
            let out = f(&mut edited, rows)?;
            let slot = rows.get_mut(id).ok_or(StoreError::NotFound(id))?;
            *slot = edited.clone();
            Ok((edited, out))
        })
        .await
    }

    /// Mutate one row in place, returning the updated copy
    pub async fn update_with(&self, id: i64, f: impl FnOnce(&mut T)) -> Option<T> {
        self.write(|rows| {
            let row = rows.get_mut(id)?;
            f(row);
            Some(row.clone())
        })
        .await
    }

    pub async fn get(&self, id: i64) -> Option<T> {
        self.read(|rows| rows.iter().find(|r| r.id() == id).cloned())
            .await
    }

    pub async fn find(&self, pred: impl Fn(&T) -> bool) -> Option<T> {
        self.read(|rows| rows.iter().find(|r| pred(r)).cloned()).await
    }

    pub async fn filter(&self, pred: impl Fn(&T) -> bool) -> Vec<T> {
        self.read(|rows| rows.iter().filter(|r| pred(r)).cloned().collect())
            .await
    }

    pub async fn all(&self) -> Vec<T> {
        self.read(|rows| rows.iter().cloned().collect()).await
    }

    pub async fn count(&self, pred: impl Fn(&T) -> bool) -> usize {
        self.read(|rows| rows.iter().filter(|r| pred(r)).count()).await
    }

    /// Remove a row after `guard` accepts it
    pub async fn remove_if(
        &self,
        id: i64,
        guard: impl FnOnce(&T) -> Result<(), StoreError>,
    ) -> Result<T, StoreError> {
        self.write(|rows| {
            let row = rows
                .iter()
                .find(|r| r.id() == id)
                .cloned()
                .ok_or(StoreError::NotFound(id))?;
            guard(&row)?;
            rows.retain(|r| r.id() != id);
            Ok(row)
        })
        .await
    }

    pub async fn remove(&self, id: i64) -> Result<T, StoreError> {
        self.remove_if(id, |_| Ok(())).await
    }

    /// Remove every row matching `pred`, returning how many went
    pub async fn remove_where(&self, pred: impl Fn(&T) -> bool) -> usize {
        self.write(|rows| rows.retain(|r| !pred(r))).await
    }
}
