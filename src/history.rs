// Copyright 2025 the Airstroke Authors
// SPDX-License-Identifier: Apache-2.0

//! Bounded undo/redo action log.
//!
//! Every recorded action pairs the operation to reapply (redo) with
//! the operation that reverses it (undo). A single cursor separates
//! undoable entries (left of it) from redoable ones (right of it):
//! recording at a non-tail cursor discards the stale redo tail, and
//! the log evicts from the front once it exceeds its capacity.
//!
//! The manager only hands actions back — it never executes anything.
//! The caller replays the returned descriptor through its dispatcher,
//! which keeps local undo and peer-replicated undo identical.

use crate::rpc::{Method, Param};
use uuid::Uuid;

/// A recorded operation and its inverse.
#[derive(Debug, Clone, PartialEq)]
pub struct UndoRedoAction {
    pub id: Uuid,
    pub redo_method: Method,
    pub redo_param: Param,
    pub undo_method: Method,
    pub undo_param: Param,
}

impl UndoRedoAction {
    pub fn new(redo_param: Param, undo_param: Param) -> Self {
        Self {
            id: Uuid::new_v4(),
            redo_method: redo_param.method(),
            undo_method: undo_param.method(),
            redo_param,
            undo_param,
        }
    }
}

/// Predicate deciding which methods stay out of the log.
pub type ExclusionPredicate = fn(&Method) -> bool;

/// The default policy: transient, non-committing edits are excluded.
///
/// `AddStrokePoint`, `AddBezierStrokePoints` and `MoveControlPoint`
/// stream intermediate state while a gesture is still in flight;
/// undoing them individually would scrub through half-drawn strokes.
/// `FinishControlPoint` is also excluded: restoring the exact pre-edit
/// curve shape is not implemented, so rather than offer an undo that
/// approximates it, the edit is simply not undoable. Callers that want
/// different semantics pass their own predicate.
pub fn default_painting_exclusion(method: &Method) -> bool {
    matches!(
        method,
        Method::AddStrokePoint
            | Method::AddBezierStrokePoints
            | Method::MoveControlPoint
            | Method::FinishControlPoint
    )
}

/// Bounded log of undoable actions with a redo cursor.
#[derive(Debug)]
pub struct UndoRedoManager {
    actions: Vec<UndoRedoAction>,
    /// Next undo position; everything at and past it is redoable.
    current_index: usize,
    max_size: usize,
    should_exclude: Option<ExclusionPredicate>,
}

impl UndoRedoManager {
    /// A manager that records every action.
    pub fn new(max_size: usize) -> Self {
        Self {
            actions: Vec::new(),
            current_index: 0,
            max_size,
            should_exclude: None,
        }
    }

    /// A manager filtering actions through `predicate`.
    pub fn with_exclusion(max_size: usize, predicate: ExclusionPredicate) -> Self {
        Self {
            should_exclude: Some(predicate),
            ..Self::new(max_size)
        }
    }

    pub fn can_undo(&self) -> bool {
        self.current_index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.current_index < self.actions.len()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Append an action.
    ///
    /// Excluded methods are discarded silently. Recording after undos
    /// truncates the redoable tail first; exceeding capacity evicts
    /// the oldest entry. The cursor always lands at the tail.
    pub fn record(&mut self, action: UndoRedoAction) {
        if let Some(should_exclude) = self.should_exclude {
            if should_exclude(&action.redo_method) {
                return;
            }
        }

        if self.current_index < self.actions.len() {
            self.actions.truncate(self.current_index);
        }

        self.actions.push(action);

        if self.actions.len() > self.max_size {
            self.actions.remove(0);
        }

        self.current_index = self.actions.len();
    }

    /// Step the cursor back and return the action to reverse, or
    /// `None` when there is nothing to undo.
    pub fn undo(&mut self) -> Option<UndoRedoAction> {
        if !self.can_undo() {
            return None;
        }
        self.current_index -= 1;
        Some(self.actions[self.current_index].clone())
    }

    /// Return the action to reapply and step the cursor forward, or
    /// `None` when there is nothing to redo.
    pub fn redo(&mut self) -> Option<UndoRedoAction> {
        if !self.can_redo() {
            return None;
        }
        let action = self.actions[self.current_index].clone();
        self.current_index += 1;
        Some(action)
    }

    /// Drop the whole history.
    pub fn clear(&mut self) {
        self.actions.clear();
        self.current_index = 0;
    }
}
