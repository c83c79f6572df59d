//! Undo history.
//!
//! The history is a flat list of actions. User-visible steps are separated by
//! `Start` actions, and slot 0 is always a `Start`. A new action either
//! overwrites the trailing `Start` (joining the current step) or is written
//! after it (opening a new step); a fresh trailing `Start` always follows.
//!
//! Joining happens when the edit looks like continuous typing or deleting,
//! or while an explicit group opened with [`UndoHistory::begin_undo_action`]
//! is open. A save point or tentative point at the cursor always opens a new
//! step.
//!
//! Positions and lengths are kept in [`ScaledVector`]s and the text of each
//! action in a [`ScrapStack`].
//!
//! To undo, call [`UndoHistory::start_undo`] for the number of actions in the
//! step, then for each one read [`UndoHistory::undo_step`], apply its inverse
//! and call [`UndoHistory::completed_undo_step`]. Redo mirrors this.

mod scaled;
mod scrap;

use crate::error::{Error, Result};
use crate::event::{LogLevel, emit_log};

pub use scaled::ScaledVector;
pub use scrap::ScrapStack;

/// Largest removal that still joins a run of deletions: one keypress of
/// backspace or delete, which may remove a two byte CR LF.
pub const REMOVE_COALESCE_MAX: usize = 2;

/// Kind of an undo action.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ActionType {
    Insert,
    Remove,
    /// Step delimiter.
    #[default]
    Start,
    /// Action performed by the host; `position` holds its token.
    Container,
}

/// One recorded action, borrowing its text from the history.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Action<'a> {
    pub at: ActionType,
    pub may_coalesce: bool,
    pub position: usize,
    pub data: &'a [u8],
    /// Styles of removed text, one per byte of `data`. Empty when every
    /// byte had style 0 or none were recorded.
    pub styles: &'a [u8],
}

impl Action<'_> {
    /// Length of the text inserted or removed.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct UndoActionType {
    at: ActionType,
    may_coalesce: bool,
}

impl Default for UndoActionType {
    fn default() -> Self {
        Self {
            at: ActionType::Start,
            may_coalesce: true,
        }
    }
}

/// Action columns: kind flags, positions and lengths.
#[derive(Clone, Debug)]
struct UndoActions {
    types: Vec<UndoActionType>,
    positions: ScaledVector,
    lengths: ScaledVector,
}

impl UndoActions {
    fn with_len(length: usize) -> Self {
        Self {
            types: vec![UndoActionType::default(); length],
            positions: ScaledVector::zeroed(length),
            lengths: ScaledVector::zeroed(length),
        }
    }

    fn len(&self) -> usize {
        self.types.len()
    }

    fn resize(&mut self, length: usize) -> Result<()> {
        if length > self.types.len() {
            let extra = length - self.types.len();
            self.types
                .try_reserve(extra)
                .map_err(|e| Error::out_of_memory(extra, e))?;
        }
        self.positions.resize(length)?;
        self.lengths.resize(length)?;
        self.types.resize(length, UndoActionType::default());
        Ok(())
    }

    /// Widen the columns so `position` and `length` can be stored.
    fn prepare(&mut self, position: usize, length: usize) -> Result<()> {
        self.positions.widen_for(position)?;
        self.lengths.widen_for(length)
    }

    fn create_start(&mut self, index: usize) {
        if let Some(t) = self.types.get_mut(index) {
            *t = UndoActionType::default();
        }
        self.positions.clear_value_at(index);
        self.lengths.clear_value_at(index);
    }

    fn create(
        &mut self,
        index: usize,
        at: ActionType,
        position: usize,
        length: usize,
        may_coalesce: bool,
    ) -> Result<()> {
        self.prepare(position, length)?;
        if let Some(t) = self.types.get_mut(index) {
            *t = UndoActionType { at, may_coalesce };
        }
        self.positions.set_value_at(index, position)?;
        self.lengths.set_value_at(index, length)
    }

    fn at(&self, index: usize) -> ActionType {
        self.types.get(index).map_or(ActionType::Start, |t| t.at)
    }

    fn may_coalesce(&self, index: usize) -> bool {
        self.types.get(index).is_some_and(|t| t.may_coalesce)
    }

    fn set_may_coalesce(&mut self, index: usize, may_coalesce: bool) {
        if let Some(t) = self.types.get_mut(index) {
            t.may_coalesce = may_coalesce;
        }
    }

    fn size_in_bytes(&self) -> usize {
        self.types.len() * std::mem::size_of::<UndoActionType>()
            + self.positions.size_in_bytes()
            + self.lengths.size_in_bytes()
    }
}

/// Undo and redo log for one document.
#[derive(Clone, Debug)]
pub struct UndoHistory {
    actions: UndoActions,
    max_action: usize,
    current_action: usize,
    undo_sequence_depth: usize,
    save_point: Option<usize>,
    tentative_point: Option<usize>,
    detach: Option<usize>,
    scraps: ScrapStack,
}

impl Default for UndoHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl UndoHistory {
    #[must_use]
    pub fn new() -> Self {
        Self {
            actions: UndoActions::with_len(3),
            max_action: 0,
            current_action: 0,
            undo_sequence_depth: 0,
            save_point: Some(0),
            tentative_point: None,
            detach: None,
            scraps: ScrapStack::new(),
        }
    }

    /// Room for the two slots an append may write.
    fn ensure_undo_room(&mut self) -> Result<()> {
        if self.current_action + 2 >= self.actions.len() {
            self.actions.resize(self.actions.len() * 2)?;
        }
        Ok(())
    }

    /// Slot the next action goes into: the current slot to join the current
    /// step, the one after it to open a new step.
    fn append_target(
        &self,
        at: ActionType,
        position: usize,
        length: usize,
        may_coalesce: bool,
    ) -> usize {
        let current = self.current_action;
        if current == 0 {
            return 1;
        }
        if self.undo_sequence_depth > 0 {
            // Grouped actions always join unless the group just reopened.
            return if self.actions.may_coalesce(current) {
                current
            } else {
                current + 1
            };
        }

        // Container actions forward the coalesce state of the action before them.
        let mut previous = current - 1;
        while previous > 0
            && self.actions.at(previous) == ActionType::Container
            && self.actions.may_coalesce(previous)
        {
            previous -= 1;
        }
        let prev_at = self.actions.at(previous);
        let prev_position = self.actions.positions.value_at(previous);
        let prev_length = self.actions.lengths.value_at(previous);

        let joins = if self.save_point == Some(current)
            || self.tentative_point == Some(current)
            || !self.actions.may_coalesce(current)
            || !may_coalesce
            || !self.actions.may_coalesce(previous)
        {
            false
        } else if at == ActionType::Container || self.actions.at(current) == ActionType::Container
        {
            true
        } else if at != prev_at && prev_at != ActionType::Start {
            false
        } else {
            match at {
                // Typing: each insertion directly after the last.
                ActionType::Insert => position == prev_position + prev_length,
                // Backspace ends where the last removal started; delete stays put.
                ActionType::Remove => {
                    (1..=REMOVE_COALESCE_MAX).contains(&length)
                        && (position + length == prev_position || position == prev_position)
                }
                ActionType::Start | ActionType::Container => true,
            }
        };
        if joins { current } else { current + 1 }
    }

    /// Record an action.
    ///
    /// `data` is the text inserted or removed; for container actions
    /// `position` carries the host's token and `data` is empty. Returns
    /// whether the action opened a new undo step.
    pub fn append_action(
        &mut self,
        at: ActionType,
        position: usize,
        data: &[u8],
        may_coalesce: bool,
    ) -> Result<bool> {
        self.append_styled_action(at, position, data, &[], may_coalesce)
    }

    /// Record an action along with the styles of its text, so undoing a
    /// removal can restore them. `styles` is empty or as long as `data`.
    pub fn append_styled_action(
        &mut self,
        at: ActionType,
        position: usize,
        data: &[u8],
        styles: &[u8],
        may_coalesce: bool,
    ) -> Result<bool> {
        self.ensure_undo_room()?;
        let target = self.append_target(at, position, data.len(), may_coalesce);
        self.actions.prepare(position, data.len())?;
        self.scraps.reserve_styled(data.len(), styles)?;

        match self.save_point {
            Some(save_point) if self.current_action < save_point => {
                // Editing after undoing past the save point: it can never be reached again.
                self.save_point = None;
                if self.detach.is_none() {
                    self.detach = Some(self.current_action);
                }
            }
            _ => {
                if self.detach.is_some_and(|d| d > self.current_action) {
                    self.detach = Some(self.current_action);
                }
            }
        }

        let start_sequence = target != self.current_action;
        self.current_action = target;
        if !data.is_empty() {
            self.scraps.push_styled(data, styles)?;
        }
        self.actions
            .create(target, at, position, data.len(), may_coalesce)?;
        self.current_action += 1;
        self.actions.create_start(self.current_action);
        self.max_action = self.current_action;
        Ok(start_sequence)
    }

    /// Open a group; every action until the matching
    /// [`end_undo_action`](Self::end_undo_action) joins one step. Groups nest.
    pub fn begin_undo_action(&mut self) -> Result<()> {
        self.ensure_undo_room()?;
        if self.undo_sequence_depth == 0 {
            self.close_step();
        }
        self.undo_sequence_depth += 1;
        Ok(())
    }

    pub fn end_undo_action(&mut self) -> Result<()> {
        debug_assert!(self.undo_sequence_depth > 0, "unbalanced end_undo_action");
        self.ensure_undo_room()?;
        self.undo_sequence_depth = self.undo_sequence_depth.saturating_sub(1);
        if self.undo_sequence_depth == 0 {
            self.close_step();
        }
        Ok(())
    }

    /// Make sure the cursor sits on a `Start` that refuses to be joined.
    fn close_step(&mut self) {
        if self.actions.at(self.current_action) != ActionType::Start {
            self.current_action += 1;
            self.actions.create_start(self.current_action);
            self.max_action = self.current_action;
        }
        self.actions.set_may_coalesce(self.current_action, false);
    }

    /// Abandon any open groups without closing the step.
    pub fn drop_undo_sequence(&mut self) {
        self.undo_sequence_depth = 0;
    }

    #[must_use]
    pub fn undo_sequence_depth(&self) -> usize {
        self.undo_sequence_depth
    }

    /// Forget every action. The current state becomes the save point.
    pub fn delete_undo_history(&mut self) {
        self.max_action = 0;
        self.current_action = 0;
        self.actions.create_start(0);
        self.save_point = Some(0);
        self.tentative_point = None;
        self.detach = None;
        self.scraps = ScrapStack::new();
        emit_log(LogLevel::Debug, "undo history deleted");
    }

    /// Mark the current state as saved. Undo and redo move over it freely.
    pub fn set_save_point(&mut self) {
        self.save_point = Some(self.current_action);
        self.detach = None;
    }

    #[must_use]
    pub fn is_save_point(&self) -> bool {
        self.save_point == Some(self.current_action)
    }

    /// The saved state lies ahead (or is unreachable).
    #[must_use]
    pub fn before_save_point(&self) -> bool {
        self.save_point.is_none_or(|sp| sp > self.current_action)
    }

    /// The saved state lies ahead and redo can still reach it.
    #[must_use]
    pub fn before_reachable_save_point(&self) -> bool {
        self.detach.is_none() && self.save_point.is_some_and(|sp| sp > self.current_action)
    }

    #[must_use]
    pub fn after_save_point(&self) -> bool {
        self.save_point.is_some_and(|sp| sp <= self.current_action)
    }

    /// Edits were made on a branch that left the save point behind.
    #[must_use]
    pub fn after_detach_point(&self) -> bool {
        self.detach.is_some_and(|d| d < self.current_action)
    }

    /// Begin a composition that can be rolled back as a unit.
    pub fn tentative_start(&mut self) {
        self.tentative_point = Some(self.current_action);
    }

    /// Keep the composition and drop any redo history beyond it.
    pub fn tentative_commit(&mut self) {
        self.tentative_point = None;
        self.max_action = self.current_action;
        emit_log(LogLevel::Debug, "tentative composition committed");
    }

    #[must_use]
    pub fn tentative_active(&self) -> bool {
        self.tentative_point.is_some()
    }

    /// Number of action slots recorded since [`tentative_start`](Self::tentative_start),
    /// or `None` without an active composition. Leaves the cursor alone; use
    /// [`start_tentative_undo`](Self::start_tentative_undo) to roll back.
    #[must_use]
    pub fn tentative_steps(&self) -> Option<usize> {
        let tentative_point = self.tentative_point?;
        let mut current = self.current_action;
        if current > tentative_point && self.actions.at(current) == ActionType::Start {
            // Ignore the trailing start.
            current -= 1;
        }
        Some(current - tentative_point)
    }

    /// Step onto the last action of the composition and count the slots to
    /// undo to get back to the tentative point. Each slot is undone with
    /// [`undo_step`](Self::undo_step) and
    /// [`completed_undo_step`](Self::completed_undo_step) like a normal step.
    pub fn start_tentative_undo(&mut self) -> Option<usize> {
        let tentative_point = self.tentative_point?;
        if self.current_action > tentative_point
            && self.actions.at(self.current_action) == ActionType::Start
        {
            self.current_action -= 1;
        }
        Some(self.current_action.saturating_sub(tentative_point))
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.current_action > 0 && self.max_action > 0
    }

    /// Step onto the last action and count the actions in its step.
    pub fn start_undo(&mut self) -> usize {
        if self.current_action > 0 && self.actions.at(self.current_action) == ActionType::Start {
            self.current_action -= 1;
        }
        let mut act = self.current_action;
        while act > 0 && self.actions.at(act) != ActionType::Start {
            act -= 1;
        }
        self.current_action - act
    }

    /// The action to undo next.
    #[must_use]
    pub fn undo_step(&self) -> Action<'_> {
        let at = self.actions.at(self.current_action);
        let length = self.actions.lengths.value_at(self.current_action);
        Action {
            at,
            may_coalesce: self.actions.may_coalesce(self.current_action),
            position: self.actions.positions.value_at(self.current_action),
            data: self.scraps.text_before(length),
            styles: self.scraps.styles_before(length),
        }
    }

    pub fn completed_undo_step(&mut self) {
        debug_assert!(self.current_action > 0, "completed_undo_step with nothing to undo");
        let length = self.actions.lengths.value_at(self.current_action);
        self.scraps.move_back(length);
        self.current_action = self.current_action.saturating_sub(1);
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.max_action > self.current_action
    }

    /// Step past the leading `Start` and count the actions in the next step.
    pub fn start_redo(&mut self) -> usize {
        if self.current_action < self.max_action
            && self.actions.at(self.current_action) == ActionType::Start
        {
            self.current_action += 1;
        }
        let mut act = self.current_action;
        while act < self.max_action && self.actions.at(act) != ActionType::Start {
            act += 1;
        }
        act - self.current_action
    }

    /// The action to redo next.
    #[must_use]
    pub fn redo_step(&self) -> Action<'_> {
        let at = self.actions.at(self.current_action);
        let length = self.actions.lengths.value_at(self.current_action);
        Action {
            at,
            may_coalesce: self.actions.may_coalesce(self.current_action),
            position: self.actions.positions.value_at(self.current_action),
            data: self.scraps.text_after(length),
            styles: self.scraps.styles_after(length),
        }
    }

    pub fn completed_redo_step(&mut self) {
        debug_assert!(self.can_redo(), "completed_redo_step with nothing to redo");
        let length = self.actions.lengths.value_at(self.current_action);
        self.scraps.move_forward(length);
        self.current_action += 1;
    }

    /// Index of the undo cursor in the action list.
    #[must_use]
    pub fn current_action(&self) -> usize {
        self.current_action
    }

    /// Redo limit.
    #[must_use]
    pub fn max_action(&self) -> usize {
        self.max_action
    }

    /// Approximate memory held by the action columns and the text payloads.
    #[must_use]
    pub fn size_in_bytes(&self) -> usize {
        self.actions.size_in_bytes() + self.scraps.size_in_bytes()
    }
}
