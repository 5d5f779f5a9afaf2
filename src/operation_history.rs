//! Linear undo/redo history of reversible operations.
//!
//! [`OperationHistory`] keeps every recorded operation in one growable
//! sequence together with a cursor on the most recently executed entry:
//!
//! ```text
//! entries:  [a, b, c, d]
//!                  ^ cursor       a..=c executed, d is redoable
//!
//! record(e)
//! entries:  [a, b, c, e]          d is discarded, no branches are kept
//!                     ^ cursor
//! ```
//!
//! Recording executes the operation once and then either appends it or fuses
//! it into the entry under the cursor (see [`Operation::merge`]).

use std::{convert::Infallible, fmt, num::NonZeroUsize};

use tracing::{debug, trace};

use crate::{
    config::HistoryConfig,
    error::HistoryError,
    traits::operation::{BoxedOperation, Merge, Operation},
};

/// How a recorded operation ended up in the history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recorded {
    /// Stored as a new entry under the cursor.
    Appended,
    /// Absorbed by the entry that was already under the cursor.
    Fused,
}

pub struct OperationHistory<C: 'static, E: 'static = Infallible> {
    entries: Vec<BoxedOperation<C, E>>,
    /// Index of the last executed entry, `None` before the first one.
    cursor: Option<usize>,
    config: HistoryConfig,
    merge_broken: bool,
}

impl<C: 'static, E: 'static> OperationHistory<C, E> {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(HistoryConfig::default())
    }

    #[must_use]
    pub fn with_config(config: HistoryConfig) -> Self {
        Self {
            entries: Vec::new(),
            cursor: None,
            config,
            merge_broken: false,
        }
    }

    /// Rebuilds a history from previously stored entries.
    ///
    /// `position` is the index of the last executed entry, or `None` if none
    /// of them is currently applied.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::CursorOutOfBounds`] if `position` does not index
    /// one of `entries`.
    pub fn from_entries(
        entries: Vec<BoxedOperation<C, E>>,
        position: Option<usize>,
    ) -> Result<Self, HistoryError> {
        Self::from_entries_with_config(entries, position, HistoryConfig::default())
    }

    /// Same as [`from_entries`](Self::from_entries) with an explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::CursorOutOfBounds`] if `position` does not index
    /// one of `entries`, and [`HistoryError::LimitExceeded`] if there are more
    /// entries than `config.limit` allows.
    pub fn from_entries_with_config(
        entries: Vec<BoxedOperation<C, E>>,
        position: Option<usize>,
        config: HistoryConfig,
    ) -> Result<Self, HistoryError> {
        let len = entries.len();

        if let Some(position) = position {
            if position >= len {
                return Err(HistoryError::CursorOutOfBounds { position, len });
            }
        }

        if let Some(limit) = config.limit {
            if len > limit.get() {
                return Err(HistoryError::LimitExceeded { len, limit });
            }
        }

        trace!(stored = len, position = ?position, "restored history");

        Ok(Self {
            entries,
            cursor: position,
            config,
            merge_broken: false,
        })
    }

    /// Hands the stored entries and the current position to the caller,
    /// e.g. to persist a session. The inverse of [`from_entries`](Self::from_entries).
    #[must_use]
    pub fn into_entries(self) -> (Vec<BoxedOperation<C, E>>, Option<usize>) {
        (self.entries, self.cursor)
    }

    #[must_use]
    pub fn config(&self) -> HistoryConfig {
        self.config
    }

    /// Changes the entry limit. Lowering it evicts entries right away.
    pub fn set_limit(&mut self, limit: Option<NonZeroUsize>) {
        self.config.limit = limit;
        self.enforce_limit();
    }

    pub fn set_merge(&mut self, merge: bool) {
        self.config.merge = merge;
    }

    /// Executes `op` and records it, fusing it into the current entry when
    /// that entry accepts the merge.
    ///
    /// # Errors
    ///
    /// Returns the error of `op.execute`. The history is left untouched in
    /// that case and `op` is dropped.
    pub fn record<O>(&mut self, op: O, ctx: &mut C) -> Result<Recorded, E>
    where
        O: Operation<C, E>,
    {
        self.record_boxed(Box::new(op), ctx, true)
    }

    /// Executes `op` and always stores it as a new entry.
    ///
    /// # Errors
    ///
    /// Returns the error of `op.execute`. The history is left untouched in
    /// that case and `op` is dropped.
    pub fn record_unmerged<O>(&mut self, op: O, ctx: &mut C) -> Result<Recorded, E>
    where
        O: Operation<C, E>,
    {
        self.record_boxed(Box::new(op), ctx, false)
    }

    /// Executes an already boxed operation and records it.
    ///
    /// Steps, in order:
    /// 1. `op` is executed exactly once, whether or not it is merged later.
    /// 2. Every redoable entry after the cursor is discarded.
    /// 3. If `allow_merge` holds, merging is enabled in the config and no
    ///    [`break_merge`](Self::break_merge) is pending, the entry under the
    ///    cursor gets the chance to absorb `op`.
    /// 4. Otherwise `op` is appended and becomes the current entry.
    ///
    /// # Errors
    ///
    /// Returns the error of `op.execute`. The history is left untouched in
    /// that case and `op` is dropped.
    pub fn record_boxed(
        &mut self,
        mut op: BoxedOperation<C, E>,
        ctx: &mut C,
        allow_merge: bool,
    ) -> Result<Recorded, E> {
        op.execute(ctx)?;

        let executed = self.executed_count();
        if self.entries.len() > executed {
            trace!(
                discarded = self.entries.len() - executed,
                "discarding redoable entries"
            );
            self.entries.truncate(executed);
        }

        let merge_broken = std::mem::take(&mut self.merge_broken);
        if allow_merge && self.config.merge && !merge_broken {
            if let Some(current) = self.entries.last_mut() {
                match current.merge(op) {
                    Merge::Fused => {
                        debug!(
                            position = ?self.cursor,
                            description = %current.description(),
                            "fused operation into current entry"
                        );
                        return Ok(Recorded::Fused);
                    }
                    Merge::Rejected(rejected) => op = rejected,
                }
            }
        }

        debug!(
            position = self.entries.len(),
            description = %op.description(),
            "recorded operation"
        );
        self.entries.push(op);
        self.cursor = Some(self.entries.len() - 1);
        self.enforce_limit();

        Ok(Recorded::Appended)
    }

    /// Records every operation in order, with merging allowed.
    ///
    /// Returns how many new entries were appended. Stops at the first
    /// operation that fails to execute; the ones before it stay recorded.
    ///
    /// # Errors
    ///
    /// Returns the error of the first failing `execute`.
    pub fn record_all<I>(&mut self, ops: I, ctx: &mut C) -> Result<usize, E>
    where
        I: IntoIterator,
        I::Item: Operation<C, E>,
    {
        let mut appended = 0;
        for op in ops {
            if self.record(op, ctx)? == Recorded::Appended {
                appended += 1;
            }
        }

        Ok(appended)
    }

    /// Makes the next record start a new entry even if it would merge.
    pub fn break_merge(&mut self) {
        self.merge_broken = true;
    }

    /// Undoes the current entry and moves the cursor back by one.
    ///
    /// Returns `Ok(false)` without doing anything when nothing is executed.
    ///
    /// # Errors
    ///
    /// Returns the error of the entry's `undo`. The cursor stays on that entry.
    pub fn undo(&mut self, ctx: &mut C) -> Result<bool, E> {
        let Some(position) = self.cursor else {
            trace!("nothing to undo");
            return Ok(false);
        };

        let entry = &mut self.entries[position];
        entry.undo(ctx)?;
        debug!(position, description = %entry.description(), "undid operation");

        self.cursor = position.checked_sub(1);
        Ok(true)
    }

    /// Moves the cursor forward by one and executes that entry again.
    ///
    /// Returns `Ok(false)` without doing anything when there is no redoable entry.
    ///
    /// # Errors
    ///
    /// Returns the error of the entry's `execute`. The cursor does not move.
    pub fn redo(&mut self, ctx: &mut C) -> Result<bool, E> {
        let position = self.executed_count();
        let Some(entry) = self.entries.get_mut(position) else {
            trace!("nothing to redo");
            return Ok(false);
        };

        entry.execute(ctx)?;
        debug!(position, description = %entry.description(), "redid operation");

        self.cursor = Some(position);
        Ok(true)
    }

    /// Undoes every executed entry, newest first, and returns how many were undone.
    ///
    /// With `clear_history` the entries are dropped afterwards, so nothing can
    /// be redone.
    ///
    /// # Errors
    ///
    /// Returns the first `undo` error. The walk stops there and nothing is cleared.
    pub fn undo_all(&mut self, ctx: &mut C, clear_history: bool) -> Result<usize, E> {
        let mut undone = 0;
        while self.undo(ctx)? {
            undone += 1;
        }

        if clear_history {
            self.clear();
        }

        Ok(undone)
    }

    /// Drops every entry without undoing anything.
    pub fn clear(&mut self) {
        trace!(stored = self.entries.len(), "clearing history");
        self.entries.clear();
        self.cursor = None;
        self.merge_broken = false;
    }

    /// Index of the last executed entry, `None` at the beginning.
    #[must_use]
    pub fn position(&self) -> Option<usize> {
        self.cursor
    }

    #[must_use]
    pub fn stored_count(&self) -> usize {
        self.entries.len()
    }

    /// `true` when nothing can be undone.
    #[must_use]
    pub fn is_at_beginning(&self) -> bool {
        self.cursor.is_none()
    }

    /// `true` when nothing can be redone.
    #[must_use]
    pub fn is_at_end(&self) -> bool {
        self.executed_count() == self.entries.len()
    }

    /// The most recently executed entry.
    #[must_use]
    pub fn current(&self) -> Option<&dyn Operation<C, E>> {
        self.cursor.map(|position| &*self.entries[position])
    }

    #[must_use]
    pub fn entries(&self) -> &[BoxedOperation<C, E>] {
        &self.entries
    }

    /// Descriptions of the undoable entries, the next one to undo first.
    pub fn undo_descriptions(&self) -> impl Iterator<Item = std::borrow::Cow<'_, str>> {
        self.entries[..self.executed_count()]
            .iter()
            .rev()
            .map(|op| op.description())
    }

    /// Descriptions of the redoable entries, the next one to redo first.
    pub fn redo_descriptions(&self) -> impl Iterator<Item = std::borrow::Cow<'_, str>> {
        self.entries[self.executed_count()..]
            .iter()
            .map(|op| op.description())
    }

    fn executed_count(&self) -> usize {
        self.cursor.map_or(0, |position| position + 1)
    }

    /// Evicts the oldest executed entries first and only then the farthest
    /// redoable ones, so the kept entries stay contiguous around the cursor.
    fn enforce_limit(&mut self) {
        let Some(limit) = self.config.limit else {
            return;
        };

        let excess = self.entries.len().saturating_sub(limit.get());
        if excess == 0 {
            return;
        }

        let executed = self.executed_count();
        let from_front = excess.min(executed);
        let from_back = excess - from_front;

        self.entries.drain(..from_front);
        self.entries.truncate(self.entries.len() - from_back);
        self.cursor = (executed - from_front).checked_sub(1);

        debug!(
            evicted_oldest = from_front,
            evicted_redoable = from_back,
            limit = limit.get(),
            "evicted entries over the history limit"
        );
    }
}

impl<C: 'static, E: 'static> Default for OperationHistory<C, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: 'static, E: 'static> fmt::Debug for OperationHistory<C, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationHistory")
            .field("position", &self.cursor)
            .field("stored", &self.entries.len())
            .field("config", &self.config)
            .field("merge_broken", &self.merge_broken)
            .finish()
    }
}
