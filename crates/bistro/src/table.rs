//! The dining room: a fixed pool of tables and their waiting customers.
//!
//! [`TableRegistry`] is the only owner of table state. Every method takes the
//! registry's `RwLock` once, performs a complete read or mutation, and
//! releases it; callers never see a live table, only [`TableSnapshot`] copies.
//!
//! Invariants held by every mutation:
//!
//! - a table has a wait start time exactly while it has customers, and that
//!   time is set when the table goes from empty to occupied;
//! - `has_dish` implies the table has customers.

use crate::{Error, Result};
use core::time::Duration;
use parking_lot::RwLock;
use tokio::time::Instant;

/// A point on the restaurant floor.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_squared(&self, other: Position) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }
}

/// A read-only copy of one table, safe to hold while the service runs.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TableSnapshot {
    pub id: usize,
    pub position: Position,
    pub active_customers: usize,
    pub has_dish: bool,
    /// `0.0` for a fresh (or empty) table, `1.0` once patience has run out.
    pub patience_ratio: f64,
}

/// One seating of a table, from the moment it became occupied until it was
/// emptied again. Used to make sure a delayed clear only frees the party it
/// was scheduled for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Visit {
    pub table: usize,
    seq: u64,
}

/// Customers removed from a table whose patience ran out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Expired {
    pub table: usize,
    pub customers: usize,
}

#[derive(Debug, Clone)]
struct Table {
    id: usize,
    position: Position,
    active_customers: usize,
    has_dish: bool,
    wait_started_at: Option<Instant>,
    patience: Duration,
    visit: u64,
}

impl Table {
    const fn new(id: usize, position: Position, patience: Duration) -> Self {
        Self {
            id,
            position,
            active_customers: 0,
            has_dish: false,
            wait_started_at: None,
            patience,
            visit: 0,
        }
    }

    fn seat(&mut self, count: usize, now: Instant) {
        if count == 0 {
            return;
        }
        if self.active_customers == 0 {
            self.wait_started_at = Some(now);
            self.visit += 1;
        }
        self.active_customers = self.active_customers.saturating_add(count);
    }

    fn clear(&mut self) {
        self.active_customers = 0;
        self.has_dish = false;
        self.wait_started_at = None;
    }

    const fn is_waiting(&self) -> bool {
        self.active_customers > 0 && !self.has_dish
    }

    fn elapsed(&self, now: Instant) -> Option<Duration> {
        self.wait_started_at
            .map(|started| now.saturating_duration_since(started))
    }

    fn is_out_of_patience(&self, now: Instant) -> bool {
        self.active_customers > 0 && self.elapsed(now).is_some_and(|e| e >= self.patience)
    }

    fn patience_ratio(&self, now: Instant) -> f64 {
        match self.elapsed(now) {
            Some(elapsed) if self.active_customers > 0 => {
                (elapsed.as_secs_f64() / self.patience.as_secs_f64()).min(1.0)
            }
            _ => 0.0,
        }
    }

    const fn current_visit(&self) -> Visit {
        Visit {
            table: self.id,
            seq: self.visit,
        }
    }

    fn snapshot(&self, now: Instant) -> TableSnapshot {
        TableSnapshot {
            id: self.id,
            position: self.position,
            active_customers: self.active_customers,
            has_dish: self.has_dish,
            patience_ratio: self.patience_ratio(now),
        }
    }
}

/// The fixed pool of tables, guarded by a single reader/writer lock.
#[derive(Debug)]
pub struct TableRegistry {
    tables: RwLock<Vec<Table>>,
}

impl TableRegistry {
    /// Creates one empty table per position, numbered in iteration order.
    pub fn new(layout: impl IntoIterator<Item = Position>, patience: Duration) -> Self {
        let tables = layout
            .into_iter()
            .enumerate()
            .map(|(id, position)| Table::new(id, position, patience))
            .collect();
        Self {
            tables: RwLock::new(tables),
        }
    }

    pub fn len(&self) -> usize {
        self.tables.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.read().is_empty()
    }

    /// Whether any table has customers still waiting for a dish.
    pub fn has_waiting(&self) -> bool {
        self.tables.read().iter().any(Table::is_waiting)
    }

    /// Total customers seated across all tables.
    pub fn active_customers(&self) -> usize {
        self.tables
            .read()
            .iter()
            .fold(0, |total: usize, t| total.saturating_add(t.active_customers))
    }

    /// Copies out every table in registry order.
    pub fn snapshot(&self) -> Vec<TableSnapshot> {
        let now = Instant::now();
        self.tables.read().iter().map(|t| t.snapshot(now)).collect()
    }

    /// Seats `count` customers at a specific table.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownTable`] if `table` is not in the registry.
    pub fn seat(&self, table: usize, count: usize) -> Result<()> {
        let now = Instant::now();
        let mut tables = self.tables.write();
        let target = tables
            .get_mut(table)
            .ok_or(Error::UnknownTable { id: table })?;
        target.seat(count, now);
        Ok(())
    }

    /// Spreads `count` customers across the room as if seating them one at a
    /// time at whichever table has the fewest, ties going to the table that
    /// comes first in registry order.
    ///
    /// The final counts are computed in one pass: every table below the
    /// resulting level is raised to it, and what is left over goes one each
    /// to the tables at that level in registry order.
    pub fn add_customers(&self, count: usize) {
        if count == 0 {
            return;
        }
        let now = Instant::now();
        let mut tables = self.tables.write();
        let mut counts: Vec<usize> = tables.iter().map(|t| t.active_customers).collect();
        counts.sort_unstable();
        let Some((level, mut extra)) = fill_level(&counts, count) else {
            return;
        };
        for table in tables.iter_mut() {
            if table.active_customers < level {
                table.seat(level - table.active_customers, now);
            }
            if extra > 0 && table.active_customers == level {
                table.seat(1, now);
                extra -= 1;
            }
        }
    }

    /// Customers leave of their own accord, one at a time from the fullest
    /// table (ties go to the table that comes last in registry order).
    ///
    /// These customers are not counted as lost. Returns how many left, which
    /// is less than `count` only when the room empties first.
    pub fn remove_customers(&self, count: usize) -> usize {
        let mut tables = self.tables.write();
        let mut removed = 0;
        while removed < count {
            let Some(target) = tables
                .iter_mut()
                .filter(|t| t.active_customers > 0)
                .max_by_key(|t| t.active_customers)
            else {
                break;
            };
            target.active_customers -= 1;
            if target.active_customers == 0 {
                target.clear();
            }
            removed += 1;
        }
        removed
    }

    /// Marks the first waiting table strictly within `max_range` of
    /// `position` as served.
    ///
    /// Tables are scanned in registry order and the first match wins, even
    /// if a later table is closer.
    pub fn serve_near(&self, position: Position, max_range: f64) -> Option<Visit> {
        let range_squared = max_range * max_range;
        let mut tables = self.tables.write();
        let table = tables.iter_mut().find(|t| {
            t.is_waiting() && t.position.distance_squared(position) < range_squared
        })?;
        table.has_dish = true;
        Some(table.current_visit())
    }

    /// Frees a served table, unless it has been emptied or re-seated since
    /// `visit` began. Returns whether the table was cleared.
    pub fn clear_visit(&self, visit: Visit) -> bool {
        let mut tables = self.tables.write();
        match tables.get_mut(visit.table) {
            Some(table) if table.active_customers > 0 && table.visit == visit.seq => {
                table.clear();
                true
            }
            _ => false,
        }
    }

    /// Empties every occupied table whose customers have waited at least
    /// their patience threshold, returning who left.
    pub fn expire_impatient(&self) -> Vec<Expired> {
        let now = Instant::now();
        let mut tables = self.tables.write();
        let mut expired = Vec::new();
        for table in tables.iter_mut().filter(|t| t.is_out_of_patience(now)) {
            expired.push(Expired {
                table: table.id,
                customers: table.active_customers,
            });
            table.clear();
        }
        expired
    }

    /// Offers every empty table to `party`, which returns how many customers
    /// to seat there (zero leaves it empty). Returns the total seated.
    pub fn fill_empty(&self, mut party: impl FnMut() -> usize) -> usize {
        let now = Instant::now();
        let mut tables = self.tables.write();
        let mut seated: usize = 0;
        for table in tables.iter_mut().filter(|t| t.active_customers == 0) {
            let count = party();
            table.seat(count, now);
            seated = seated.saturating_add(count);
        }
        seated
    }
}

/// Water-fills `count` customers onto tables holding `sorted` (ascending)
/// customers. Returns the level every table below it is raised to, plus how
/// many customers are left over; the leftover is always smaller than the
/// number of tables at that level.
fn fill_level(sorted: &[usize], count: usize) -> Option<(usize, usize)> {
    let mut level = *sorted.first()?;
    let mut remaining = count;
    // `sorted[..at_level]` are all raised to `level`.
    let mut at_level = 1;
    while let Some(&next) = sorted.get(at_level) {
        let cost = (next - level).saturating_mul(at_level);
        if cost > remaining {
            break;
        }
        remaining -= cost;
        level = next;
        at_level += 1;
    }
    let step = remaining / at_level;
    Some((level.saturating_add(step), remaining - step * at_level))
}
