//! Text cell store.
//!
//! [`CellBuffer`] owns the document bytes, one style byte per document byte,
//! the line index and the undo history. Every edit goes through
//! [`CellBuffer::insert_string`] or [`CellBuffer::delete_chars`], which keep
//! the three structures in step and record the edit for undo.

use crate::error::{Error, Result};
use crate::event::{LogLevel, emit_log};
use crate::gap::GapBuffer;
use crate::lines::{LineVector, PerLineRef};
use crate::options::CellBufferOptions;
use crate::undo::{Action, ActionType, UndoHistory};

use super::line_end::{
    LineEndTypes, UTF8_SEPARATOR_LENGTH, count_line_end_bytes, utf8_is_multibyte_line_end,
    utf8_is_nel, utf8_is_separator, utf8_is_trail_byte,
};

fn to_delta(length: usize) -> isize {
    isize::try_from(length).unwrap_or(isize::MAX)
}

fn log_failure(error: &Error) {
    emit_log(LogLevel::Error, &format!("edit failed: {error}"));
}

/// Walks text looking for line ends and adds a line after each one.
struct LineEndScan {
    line_insert: usize,
    ch_before_prev: u8,
    ch_prev: u8,
}

impl LineEndScan {
    /// Scan `text`, which now sits at `position`.
    fn scan(
        &mut self,
        lines: &mut LineVector,
        unicode: bool,
        position: usize,
        text: &[u8],
        at_line_start: bool,
    ) -> Result<()> {
        for (i, &ch) in text.iter().enumerate() {
            let after = position + i + 1;
            let ends_line = match ch {
                b'\r' => true,
                b'\n' if self.ch_prev == b'\r' => {
                    // Patch up what was the end of the line
                    lines.set_line_start(self.line_insert - 1, after);
                    false
                }
                b'\n' => true,
                _ => unicode && utf8_is_multibyte_line_end([self.ch_before_prev, self.ch_prev, ch]),
            };
            if ends_line {
                lines.insert_line(self.line_insert, after, at_line_start)?;
                self.line_insert += 1;
            }
            self.ch_before_prev = self.ch_prev;
            self.ch_prev = ch;
        }
        Ok(())
    }
}

/// The structures an edit has to keep consistent.
#[derive(Debug)]
struct Cells {
    substance: GapBuffer<u8>,
    style: GapBuffer<u8>,
    lines: LineVector,
    has_styles: bool,
    line_end_types: LineEndTypes,
}

impl Cells {
    fn unicode(&self) -> bool {
        self.line_end_types.contains(LineEndTypes::UNICODE)
    }

    /// Byte `back` places before `position`, 0 before the start.
    fn byte_before(&self, position: usize, back: usize) -> u8 {
        position
            .checked_sub(back)
            .map_or(0, |p| self.substance.value_at(p))
    }

    /// End of a multi-byte line end that starts before `position` and does
    /// not end before it.
    fn utf8_line_end_overlap(&self, position: usize) -> Option<usize> {
        let bytes = [
            self.byte_before(position, 2),
            self.byte_before(position, 1),
            self.substance.value_at(position),
            self.substance.value_at(position + 1),
        ];
        if utf8_is_separator(&bytes) || utf8_is_nel(&bytes[1..]) {
            Some(position + 1)
        } else if utf8_is_separator(&bytes[1..]) {
            Some(position + 2)
        } else {
            None
        }
    }

    /// Reserve everything inserting `text` can allocate in the buffers and
    /// the line index.
    fn reserve_insert(&mut self, text: &[u8]) -> Result<()> {
        self.substance.reserve(text.len())?;
        if self.has_styles {
            self.style.reserve(text.len())?;
        }
        // Splitting a CR LF or a multi-byte line end adds at most two more.
        self.lines
            .reserve(count_line_end_bytes(text, self.line_end_types) + 2)
    }

    /// Reserve what a deletion can allocate: joining the halves of a
    /// multi-byte line end adds a line.
    fn reserve_delete(&mut self) -> Result<()> {
        if self.unicode() {
            self.lines.reserve(1)?;
        }
        Ok(())
    }

    /// Insert `s` with `styles`, one per byte; empty `styles` means style 0.
    fn basic_insert_string(&mut self, position: usize, s: &[u8], styles: &[u8]) -> Result<()> {
        let Some(&ch_last) = s.last() else {
            return Ok(());
        };
        self.reserve_insert(s)?;
        let unicode = self.unicode();

        let ch_after = self.substance.value_at(position);
        let breaking_utf8_line_end = unicode
            && utf8_is_trail_byte(ch_after)
            && self.utf8_line_end_overlap(position).is_some();

        self.substance.insert_from_slice(position, s)?;
        if self.has_styles {
            if styles.len() == s.len() {
                self.style.insert_from_slice(position, styles)?;
            } else {
                self.style.insert_value(position, s.len(), 0)?;
            }
        }

        let line = self.lines.line_from_position(position);
        let at_line_start = self.lines.line_start(line) == position;
        // Point all the lines after the insertion point further along
        self.lines.insert_text(line, to_delta(s.len()));

        let mut scan = LineEndScan {
            line_insert: line + 1,
            ch_before_prev: self.byte_before(position, 2),
            ch_prev: self.byte_before(position, 1),
        };
        if scan.ch_prev == b'\r' && ch_after == b'\n' {
            // Splitting up a CR LF pair at position
            self.lines.insert_line(scan.line_insert, position, false)?;
            scan.line_insert += 1;
        }
        if breaking_utf8_line_end {
            self.lines.remove_line(scan.line_insert);
        }

        scan.scan(&mut self.lines, unicode, position, s, at_line_start)?;

        let end = position + s.len();
        if ch_after == b'\n' {
            if ch_last == b'\r' {
                // End of line already in buffer so drop the newly created one
                self.lines.remove_line(scan.line_insert - 1);
            }
        } else if unicode && !ch_after.is_ascii() {
            // A line end started by the insertion may finish in the text after it
            for j in 0..UTF8_SEPARATOR_LENGTH - 1 {
                let ch_at = self.substance.value_at(end + j);
                let back3 = [scan.ch_before_prev, scan.ch_prev, ch_at];
                if utf8_is_separator(&back3) || (j == 0 && utf8_is_nel(&back3[1..])) {
                    self.lines
                        .insert_line(scan.line_insert, end + j + 1, at_line_start)?;
                    scan.line_insert += 1;
                }
                scan.ch_before_prev = scan.ch_prev;
                scan.ch_prev = ch_at;
            }
        }
        Ok(())
    }

    fn basic_delete_chars(&mut self, position: usize, delete_length: usize) -> Result<()> {
        if delete_length == 0 {
            return Ok(());
        }
        self.reserve_delete()?;
        let unicode = self.unicode();

        let mut line_remove = self.lines.line_from_position(position) + 1;
        if position == 0 && delete_length == self.substance.len() {
            // Whole document: faster to reinitialise than to remove each line
            self.lines.init();
        } else {
            // Fix up line positions first; the text is still needed to find
            // which lines go.
            self.lines
                .insert_text(line_remove - 1, -to_delta(delete_length));
            let ch_before = self.byte_before(position, 1);
            let mut ch_next = self.substance.value_at(position);
            let mut ignore_nl = false;
            if ch_before == b'\r' && ch_next == b'\n' {
                // The CR now ends its line on its own
                self.lines.set_line_start(line_remove, position);
                line_remove += 1;
                ignore_nl = true;
            }
            if unicode
                && utf8_is_trail_byte(ch_next)
                && self.utf8_line_end_overlap(position).is_some()
            {
                self.lines.remove_line(line_remove);
            }

            let mut ch = ch_next;
            for i in 0..delete_length {
                ch_next = self.substance.value_at(position + i + 1);
                let removes_line = match ch {
                    b'\r' => ch_next != b'\n',
                    b'\n' if ignore_nl => {
                        // Further LFs are real deletions
                        ignore_nl = false;
                        false
                    }
                    b'\n' => true,
                    _ if unicode && !ch.is_ascii() => {
                        let next3 = [ch, ch_next, self.substance.value_at(position + i + 2)];
                        utf8_is_separator(&next3) || utf8_is_nel(&next3)
                    }
                    _ => false,
                };
                if removes_line {
                    self.lines.remove_line(line_remove);
                }
                ch = ch_next;
            }

            // The deletion may leave a CR next to an LF
            let ch_after = self.substance.value_at(position + delete_length);
            if ch_before == b'\r' && ch_after == b'\n' {
                self.lines.remove_line(line_remove - 1);
                self.lines.set_line_start(line_remove - 1, position + 1);
            }
        }

        self.substance.delete_range(position, delete_length);
        if self.has_styles {
            self.style.delete_range(position, delete_length);
        }

        if unicode {
            if let Some(end) = self.utf8_line_end_overlap(position) {
                // The deletion joined the two halves of a multi-byte line end
                let line = self.lines.line_from_position(position) + 1;
                self.lines.insert_line(line, end, false)?;
            }
        }
        Ok(())
    }

    /// Rebuild the line index from scratch.
    fn reset_line_ends(&mut self) -> Result<()> {
        let unicode = self.unicode();
        let types = self.line_end_types;
        let text = self.substance.buffer_pointer();
        self.lines.init();
        self.lines.reserve(count_line_end_bytes(text, types))?;
        self.lines.insert_text(0, to_delta(text.len()));
        let mut scan = LineEndScan {
            line_insert: 1,
            ch_before_prev: 0,
            ch_prev: 0,
        };
        scan.scan(&mut self.lines, unicode, 0, text, true)
    }
}

/// Document text with per-byte styles, a line index and undo history.
///
/// Positions are byte offsets. Reads past the end return 0 instead of
/// failing. Edits that cannot be applied (read-only buffer, range outside the
/// document) are rejected through the return value; only allocation failures
/// are reported as errors. Everything an edit can allocate, including room
/// in registered per-line observers, is reserved before the edit is recorded
/// or applied, so a failed edit leaves the buffer unchanged.
///
/// An edit made while a per-line observer is borrowed is nested inside
/// another use of that observer; it is refused with a warning and reported
/// like a read-only rejection.
///
/// # Example
///
/// ```
/// use gapcell::CellBuffer;
///
/// let mut buffer = CellBuffer::new();
/// buffer.insert_string(0, b"one\ntwo").unwrap();
/// assert_eq!(buffer.lines(), 2);
/// assert_eq!(buffer.line_start(1), 4);
///
/// buffer.undo().unwrap();
/// assert_eq!(buffer.length(), 0);
/// ```
#[derive(Debug)]
pub struct CellBuffer {
    cells: Cells,
    read_only: bool,
    collecting_undo: bool,
    start_sequence: bool,
    undo: UndoHistory,
}

impl Default for CellBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl CellBuffer {
    /// Create an empty buffer with default options.
    #[must_use]
    pub fn new() -> Self {
        Self::from_options(CellBufferOptions::default())
    }

    fn from_options(options: CellBufferOptions) -> Self {
        Self {
            cells: Cells {
                substance: GapBuffer::new(),
                style: GapBuffer::new(),
                lines: LineVector::new(),
                has_styles: options.has_styles,
                line_end_types: options.line_end_types,
            },
            read_only: false,
            collecting_undo: options.collect_undo,
            start_sequence: false,
            undo: UndoHistory::new(),
        }
    }

    /// Create an empty buffer, allocating `options.initial_capacity` bytes.
    pub fn with_options(options: CellBufferOptions) -> Result<Self> {
        let mut buffer = Self::from_options(options);
        if options.initial_capacity > 0 {
            buffer.allocate(options.initial_capacity)?;
        }
        Ok(buffer)
    }

    /// Byte at `position`, 0 outside the document.
    #[must_use]
    pub fn char_at(&self, position: usize) -> u8 {
        self.cells.substance.value_at(position)
    }

    /// Copy bytes starting at `position` into `buffer`.
    pub fn get_char_range(&self, buffer: &mut [u8], position: usize) {
        self.cells.substance.get_range(buffer, position);
    }

    /// Style of the byte at `position`, 0 outside the document or without styles.
    #[must_use]
    pub fn style_at(&self, position: usize) -> u8 {
        if self.cells.has_styles {
            self.cells.style.value_at(position)
        } else {
            0
        }
    }

    /// Copy styles starting at `position` into `buffer`.
    pub fn get_style_range(&self, buffer: &mut [u8], position: usize) {
        if self.cells.has_styles {
            self.cells.style.get_range(buffer, position);
        } else {
            buffer.fill(0);
        }
    }

    /// Whole document as one slice. Moves the gap to the end.
    pub fn buffer_pointer(&mut self) -> &[u8] {
        self.cells.substance.buffer_pointer()
    }

    /// Contiguous view of `range_length` bytes at `position`.
    pub fn range_pointer(&mut self, position: usize, range_length: usize) -> &[u8] {
        self.cells.substance.range_pointer(position, range_length)
    }

    #[must_use]
    pub fn gap_position(&self) -> usize {
        self.cells.substance.gap_position()
    }

    /// Copy of the document bytes.
    #[must_use]
    pub fn text(&self) -> Vec<u8> {
        self.cells.substance.to_vec()
    }

    #[must_use]
    pub fn length(&self) -> usize {
        self.cells.substance.len()
    }

    /// Make room for a document of `new_size` bytes.
    pub fn allocate(&mut self, new_size: usize) -> Result<()> {
        self.cells.substance.allocate(new_size)?;
        if self.cells.has_styles {
            self.cells.style.allocate(new_size)?;
        }
        Ok(())
    }

    #[must_use]
    pub fn has_styles(&self) -> bool {
        self.cells.has_styles
    }

    #[must_use]
    pub fn line_end_types(&self) -> LineEndTypes {
        self.cells.line_end_types
    }

    /// Change the recognised line ends, rebuilding the line index if they differ.
    ///
    /// Rebuilding resets every per-line observer.
    pub fn set_line_end_types(&mut self, types: LineEndTypes) -> Result<()> {
        if self.cells.line_end_types != types {
            if self.modification_blocked("line end change") {
                return Ok(());
            }
            self.cells.line_end_types = types;
            self.cells.reset_line_ends().inspect_err(log_failure)?;
            emit_log(
                LogLevel::Debug,
                &format!("line index rebuilt: {} lines", self.lines()),
            );
        }
        Ok(())
    }

    /// Register a per-line observer.
    pub fn add_per_line(&mut self, observer: PerLineRef) {
        self.cells.lines.add_per_line(observer);
    }

    /// Number of lines. An empty document has one.
    #[must_use]
    pub fn lines(&self) -> usize {
        self.cells.lines.lines()
    }

    /// Start of `line`; lines past the last yield the document length.
    #[must_use]
    pub fn line_start(&self, line: usize) -> usize {
        self.cells.lines.line_start(line)
    }

    #[must_use]
    pub fn line_from_position(&self, position: usize) -> usize {
        self.cells.lines.line_from_position(position)
    }

    /// Insert `s` at `position`.
    ///
    /// Returns the number of bytes inserted: 0 when the buffer is read-only,
    /// `position` is past the end or `s` is empty. New bytes get style 0.
    pub fn insert_string(&mut self, position: usize, s: &[u8]) -> Result<usize> {
        if self.read_only {
            emit_log(LogLevel::Warn, "insert rejected: buffer is read-only");
            return Ok(0);
        }
        if s.is_empty() || position > self.length() {
            return Ok(0);
        }
        if self.modification_blocked("insert") {
            return Ok(0);
        }
        self.try_insert(position, s).inspect_err(log_failure)?;
        Ok(s.len())
    }

    fn try_insert(&mut self, position: usize, s: &[u8]) -> Result<()> {
        self.cells.reserve_insert(s)?;
        if self.collecting_undo {
            self.start_sequence = self
                .undo
                .append_action(ActionType::Insert, position, s, true)?;
        }
        self.cells.basic_insert_string(position, s, &[])
    }

    /// Delete `delete_length` bytes at `position`.
    ///
    /// Returns false without changing anything when the buffer is read-only,
    /// the range is empty or it extends past the end.
    pub fn delete_chars(&mut self, position: usize, delete_length: usize) -> Result<bool> {
        if self.read_only {
            emit_log(LogLevel::Warn, "delete rejected: buffer is read-only");
            return Ok(false);
        }
        let in_range = position
            .checked_add(delete_length)
            .is_some_and(|end| end <= self.length());
        if delete_length == 0 || !in_range {
            return Ok(false);
        }
        if self.modification_blocked("delete") {
            return Ok(false);
        }
        self.try_delete(position, delete_length)
            .inspect_err(log_failure)?;
        Ok(true)
    }

    fn try_delete(&mut self, position: usize, delete_length: usize) -> Result<()> {
        self.cells.reserve_delete()?;
        if self.collecting_undo {
            let data = self.cells.substance.range_pointer(position, delete_length);
            let styles: &[u8] = if self.cells.has_styles {
                self.cells.style.range_pointer(position, delete_length)
            } else {
                &[]
            };
            self.start_sequence = self.undo.append_styled_action(
                ActionType::Remove,
                position,
                data,
                styles,
                true,
            )?;
        }
        self.cells.basic_delete_chars(position, delete_length)
    }

    /// Refuse an edit while a per-line observer is borrowed.
    fn modification_blocked(&self, what: &str) -> bool {
        if self.cells.lines.observers_available() {
            return false;
        }
        emit_log(
            LogLevel::Warn,
            &format!("{what} rejected: per-line data is in use"),
        );
        true
    }

    /// Set the style of one byte. Returns whether it changed; positions
    /// outside the document are ignored.
    pub fn set_style_at(&mut self, position: usize, style_value: u8) -> bool {
        if !self.cells.has_styles || position >= self.cells.style.len() {
            return false;
        }
        if self.cells.style.value_at(position) == style_value {
            return false;
        }
        self.cells.style.set_value_at(position, style_value);
        true
    }

    /// Set the style of `length` bytes at `position`, clipped to the document.
    /// Returns whether any byte changed.
    pub fn set_style_for(&mut self, position: usize, length: usize, style_value: u8) -> bool {
        if !self.cells.has_styles {
            return false;
        }
        let end = position.saturating_add(length).min(self.cells.style.len());
        let mut changed = false;
        for p in position..end {
            if self.cells.style.value_at(p) != style_value {
                self.cells.style.set_value_at(p, style_value);
                changed = true;
            }
        }
        changed
    }

    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    /// Whether the last recorded edit opened a new undo step.
    #[must_use]
    pub fn started_sequence(&self) -> bool {
        self.start_sequence
    }

    pub fn set_save_point(&mut self) {
        self.undo.set_save_point();
    }

    #[must_use]
    pub fn is_save_point(&self) -> bool {
        self.undo.is_save_point()
    }

    #[must_use]
    pub fn before_save_point(&self) -> bool {
        self.undo.before_save_point()
    }

    #[must_use]
    pub fn before_reachable_save_point(&self) -> bool {
        self.undo.before_reachable_save_point()
    }

    #[must_use]
    pub fn after_save_point(&self) -> bool {
        self.undo.after_save_point()
    }

    #[must_use]
    pub fn after_detach_point(&self) -> bool {
        self.undo.after_detach_point()
    }

    pub fn tentative_start(&mut self) {
        self.undo.tentative_start();
    }

    pub fn tentative_commit(&mut self) {
        self.undo.tentative_commit();
    }

    #[must_use]
    pub fn tentative_active(&self) -> bool {
        self.undo.tentative_active()
    }

    #[must_use]
    pub fn tentative_steps(&self) -> Option<usize> {
        self.undo.tentative_steps()
    }

    /// Roll back every action since [`tentative_start`](Self::tentative_start)
    /// and end the composition. Returns the number of action slots undone.
    pub fn tentative_undo(&mut self) -> Result<usize> {
        if !self.tentative_active() {
            return Ok(0);
        }
        if self.read_only {
            emit_log(LogLevel::Warn, "tentative undo rejected: buffer is read-only");
            return Ok(0);
        }
        if self.modification_blocked("tentative undo") {
            return Ok(0);
        }
        let steps = self.undo.start_tentative_undo().unwrap_or(0);
        for _ in 0..steps {
            self.perform_undo_step()?;
        }
        self.undo.tentative_commit();
        Ok(steps)
    }

    /// Turn undo recording on or off, returning the new state.
    pub fn set_undo_collection(&mut self, collect_undo: bool) -> bool {
        self.collecting_undo = collect_undo;
        self.collecting_undo
    }

    #[must_use]
    pub fn is_collecting_undo(&self) -> bool {
        self.collecting_undo
    }

    pub fn begin_undo_action(&mut self) -> Result<()> {
        self.undo.begin_undo_action()
    }

    pub fn end_undo_action(&mut self) -> Result<()> {
        self.undo.end_undo_action()
    }

    pub fn drop_undo_sequence(&mut self) {
        self.undo.drop_undo_sequence();
    }

    /// Record an action performed by the host, identified by `token`.
    pub fn add_undo_action(&mut self, token: usize, may_coalesce: bool) -> Result<()> {
        self.start_sequence = self
            .undo
            .append_action(ActionType::Container, token, &[], may_coalesce)
            .inspect_err(log_failure)?;
        Ok(())
    }

    pub fn delete_undo_history(&mut self) {
        self.undo.delete_undo_history();
    }

    /// The undo history, for inspection.
    #[must_use]
    pub fn undo_history(&self) -> &UndoHistory {
        &self.undo
    }

    /// Undo is possible: there is history and the buffer is writable.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.undo.can_undo() && !self.read_only
    }

    /// Number of actions in the step to undo.
    pub fn start_undo(&mut self) -> usize {
        self.undo.start_undo()
    }

    #[must_use]
    pub fn undo_step(&self) -> Action<'_> {
        self.undo.undo_step()
    }

    /// Revert the next action of the step started by [`start_undo`](Self::start_undo).
    ///
    /// Removed text gets back the styles it had. Per-line observers must not
    /// be borrowed while stepping.
    pub fn perform_undo_step(&mut self) -> Result<()> {
        let action = self.undo.undo_step();
        match action.at {
            ActionType::Insert => {
                let in_range = action.position + action.len() <= self.cells.substance.len();
                debug_assert!(in_range, "undo deletion past the end of the document");
                if in_range {
                    self.cells
                        .basic_delete_chars(action.position, action.len())
                        .inspect_err(log_failure)?;
                }
            }
            ActionType::Remove => self
                .cells
                .basic_insert_string(action.position, action.data, action.styles)
                .inspect_err(log_failure)?,
            ActionType::Start | ActionType::Container => {}
        }
        self.undo.completed_undo_step();
        Ok(())
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.undo.can_redo() && !self.read_only
    }

    /// Number of actions in the step to redo.
    pub fn start_redo(&mut self) -> usize {
        self.undo.start_redo()
    }

    #[must_use]
    pub fn redo_step(&self) -> Action<'_> {
        self.undo.redo_step()
    }

    /// Reapply the next action of the step started by [`start_redo`](Self::start_redo).
    pub fn perform_redo_step(&mut self) -> Result<()> {
        let action = self.undo.redo_step();
        match action.at {
            ActionType::Insert => self
                .cells
                .basic_insert_string(action.position, action.data, &[])
                .inspect_err(log_failure)?,
            ActionType::Remove => {
                let in_range = action.position + action.len() <= self.cells.substance.len();
                debug_assert!(in_range, "redo deletion past the end of the document");
                if in_range {
                    self.cells
                        .basic_delete_chars(action.position, action.len())
                        .inspect_err(log_failure)?;
                }
            }
            ActionType::Start | ActionType::Container => {}
        }
        self.undo.completed_redo_step();
        Ok(())
    }

    /// Undo one whole step. Returns the number of actions reverted.
    pub fn undo(&mut self) -> Result<usize> {
        if !self.can_undo() || self.modification_blocked("undo") {
            return Ok(0);
        }
        let steps = self.start_undo();
        for _ in 0..steps {
            self.perform_undo_step()?;
        }
        Ok(steps)
    }

    /// Redo one whole step. Returns the number of actions reapplied.
    pub fn redo(&mut self) -> Result<usize> {
        if !self.can_redo() || self.modification_blocked("redo") {
            return Ok(0);
        }
        let steps = self.start_redo();
        for _ in 0..steps {
            self.perform_redo_step()?;
        }
        Ok(steps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lines::{LineMarkers, LineState};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn buffer_with(text: &str) -> CellBuffer {
        let mut buffer = CellBuffer::new();
        buffer.insert_string(0, text.as_bytes()).unwrap();
        buffer
    }

    fn line_starts(buffer: &CellBuffer) -> Vec<usize> {
        (0..buffer.lines()).map(|l| buffer.line_start(l)).collect()
    }

    fn unicode_buffer(text: &str) -> CellBuffer {
        let options = CellBufferOptions {
            line_end_types: LineEndTypes::UNICODE,
            ..CellBufferOptions::default()
        };
        let mut buffer = CellBuffer::with_options(options).unwrap();
        buffer.insert_string(0, text.as_bytes()).unwrap();
        buffer
    }

    #[test]
    fn test_insert_and_query() {
        let mut buffer = buffer_with("Scintilla");
        assert_eq!(buffer.length(), 9);
        assert_eq!(buffer.lines(), 1);
        assert_eq!(buffer.char_at(0), b'S');
        assert_eq!(buffer.char_at(100), 0);
        let mut out = [0u8; 4];
        buffer.get_char_range(&mut out, 5);
        assert_eq!(&out, b"illa");
        assert_eq!(buffer.range_pointer(1, 3), b"cin");
        assert_eq!(buffer.buffer_pointer(), b"Scintilla");
    }

    #[test]
    fn test_rejected_edits() {
        let mut buffer = buffer_with("abc");
        assert_eq!(buffer.insert_string(4, b"x").unwrap(), 0);
        assert_eq!(buffer.insert_string(1, b"").unwrap(), 0);
        assert!(!buffer.delete_chars(2, 2).unwrap());
        assert!(!buffer.delete_chars(1, 0).unwrap());
        assert!(!buffer.delete_chars(usize::MAX, 2).unwrap());
        assert_eq!(buffer.text(), b"abc");
    }

    #[test]
    fn test_read_only() {
        let mut buffer = buffer_with("abc");
        buffer.set_read_only(true);
        assert!(buffer.is_read_only());
        assert_eq!(buffer.insert_string(0, b"x").unwrap(), 0);
        assert!(!buffer.delete_chars(0, 1).unwrap());
        assert!(!buffer.can_undo());
        assert_eq!(buffer.undo().unwrap(), 0);
        assert_eq!(buffer.text(), b"abc");

        buffer.set_read_only(false);
        assert!(buffer.can_undo());
    }

    #[test]
    fn test_line_ends() {
        let buffer = buffer_with("a\nb\r\nc\rd");
        assert_eq!(buffer.lines(), 4);
        assert_eq!(line_starts(&buffer), vec![0, 2, 5, 7]);
        assert_eq!(buffer.line_from_position(3), 1);
        assert_eq!(buffer.line_from_position(4), 1);
        assert_eq!(buffer.line_start(10), buffer.length());
    }

    #[test]
    fn test_split_and_rejoin_crlf() {
        let mut buffer = buffer_with("a\r\nb");
        assert_eq!(buffer.lines(), 2);
        buffer.insert_string(2, b"X").unwrap();
        assert_eq!(line_starts(&buffer), vec![0, 2, 4]);
        buffer.delete_chars(2, 1).unwrap();
        assert_eq!(line_starts(&buffer), vec![0, 3]);
    }

    #[test]
    fn test_insert_cr_before_lf() {
        let mut buffer = buffer_with("a\nb");
        buffer.insert_string(1, b"\r").unwrap();
        assert_eq!(buffer.text(), b"a\r\nb");
        assert_eq!(line_starts(&buffer), vec![0, 3]);
    }

    #[test]
    fn test_insert_lf_after_cr() {
        let mut buffer = buffer_with("a\rb");
        buffer.insert_string(2, b"\n").unwrap();
        assert_eq!(line_starts(&buffer), vec![0, 3]);
    }

    #[test]
    fn test_delete_start_of_crlf() {
        let mut buffer = buffer_with("a\r\nb");
        buffer.delete_chars(2, 1).unwrap();
        assert_eq!(buffer.text(), b"a\rb");
        assert_eq!(line_starts(&buffer), vec![0, 2]);
        buffer.delete_chars(1, 1).unwrap();
        assert_eq!(buffer.lines(), 1);
    }

    #[test]
    fn test_delete_across_lines() {
        let mut buffer = buffer_with("one\ntwo\nthree");
        assert_eq!(buffer.lines(), 3);
        buffer.delete_chars(2, 6).unwrap();
        assert_eq!(buffer.text(), b"onthree");
        assert_eq!(buffer.lines(), 1);
        assert_eq!(buffer.line_start(1), 7);
    }

    #[test]
    fn test_delete_everything() {
        let mut buffer = buffer_with("a\nb\nc");
        buffer.delete_chars(0, 5).unwrap();
        assert_eq!(buffer.length(), 0);
        assert_eq!(buffer.lines(), 1);
    }

    #[test]
    fn test_unicode_line_ends() {
        let buffer = unicode_buffer("a\u{2028}b\u{85}c\u{2029}d");
        assert_eq!(buffer.lines(), 4);
        assert_eq!(line_starts(&buffer), vec![0, 4, 7, 11]);

        let plain = buffer_with("a\u{2028}b");
        assert_eq!(plain.lines(), 1);
    }

    #[test]
    fn test_unicode_split_and_join() {
        let mut buffer = unicode_buffer("a\u{2028}b");
        buffer.insert_string(2, b"X").unwrap();
        assert_eq!(buffer.lines(), 1);
        buffer.delete_chars(2, 1).unwrap();
        assert_eq!(line_starts(&buffer), vec![0, 4]);

        // Completing a separator from the inserted side.
        let mut buffer = unicode_buffer("a");
        buffer.insert_string(1, &[0x80, 0xA8, b'z']).unwrap();
        assert_eq!(buffer.lines(), 1);
        buffer.insert_string(1, &[0xE2]).unwrap();
        assert_eq!(line_starts(&buffer), vec![0, 4]);
    }

    #[test]
    fn test_change_line_end_types() {
        let mut buffer = buffer_with("a\u{2028}b\nc");
        assert_eq!(buffer.lines(), 2);
        buffer.set_line_end_types(LineEndTypes::UNICODE).unwrap();
        assert_eq!(buffer.line_end_types(), LineEndTypes::UNICODE);
        assert_eq!(line_starts(&buffer), vec![0, 4, 6]);
        buffer.set_line_end_types(LineEndTypes::DEFAULT).unwrap();
        assert_eq!(line_starts(&buffer), vec![0, 6]);
    }

    #[test]
    fn test_styles() {
        let mut buffer = buffer_with("hello");
        assert!(buffer.set_style_for(1, 3, 7));
        assert!(!buffer.set_style_for(1, 3, 7));
        assert!(buffer.set_style_at(0, 2));
        assert!(!buffer.set_style_at(9, 2));
        let mut styles = [9u8; 6];
        buffer.get_style_range(&mut styles, 0);
        assert_eq!(styles, [2, 7, 7, 7, 0, 0]);

        // Inserted bytes start unstyled; the rest keep their style.
        buffer.insert_string(2, b"__").unwrap();
        assert_eq!(buffer.style_at(1), 7);
        assert_eq!(buffer.style_at(2), 0);
        assert_eq!(buffer.style_at(4), 7);
        buffer.delete_chars(0, 3).unwrap();
        assert_eq!(buffer.style_at(0), 0);
        assert_eq!(buffer.style_at(1), 7);
    }

    #[test]
    fn test_without_styles() {
        let mut buffer = CellBuffer::with_options(CellBufferOptions::without_styles()).unwrap();
        buffer.insert_string(0, b"abc").unwrap();
        assert!(!buffer.has_styles());
        assert!(!buffer.set_style_at(0, 1));
        assert!(!buffer.set_style_for(0, 3, 1));
        assert_eq!(buffer.style_at(0), 0);
        let mut styles = [5u8; 2];
        buffer.get_style_range(&mut styles, 0);
        assert_eq!(styles, [0, 0]);
    }

    #[test]
    fn test_initial_capacity() {
        let options = CellBufferOptions {
            initial_capacity: 1024,
            ..CellBufferOptions::default()
        };
        let mut buffer = CellBuffer::with_options(options).unwrap();
        assert_eq!(buffer.length(), 0);
        buffer.insert_string(0, b"x").unwrap();
        assert_eq!(buffer.text(), b"x");
    }

    #[test]
    fn test_undo_redo_scenario() {
        let mut buffer = buffer_with("Scintilla");
        assert!(buffer.can_undo());
        assert!(!buffer.can_redo());
        assert_eq!(buffer.undo().unwrap(), 1);
        assert_eq!(buffer.length(), 0);
        assert!(buffer.can_redo());
        assert_eq!(buffer.redo().unwrap(), 1);
        assert_eq!(buffer.text(), b"Scintilla");
    }

    #[test]
    fn test_undo_delete_restores_lines() {
        let mut buffer = buffer_with("one\ntwo\nthree");
        buffer.delete_chars(2, 6).unwrap();
        buffer.undo().unwrap();
        assert_eq!(buffer.text(), b"one\ntwo\nthree");
        assert_eq!(line_starts(&buffer), vec![0, 4, 8]);
        buffer.redo().unwrap();
        assert_eq!(buffer.text(), b"onthree");
    }

    #[test]
    fn test_manual_undo_steps() {
        let mut buffer = buffer_with("ab");
        buffer.delete_chars(1, 1).unwrap();
        let steps = buffer.start_undo();
        assert_eq!(steps, 1);
        let step = buffer.undo_step();
        assert_eq!(step.at, ActionType::Remove);
        assert_eq!(step.data, b"b");
        buffer.perform_undo_step().unwrap();
        assert_eq!(buffer.text(), b"ab");

        assert_eq!(buffer.start_redo(), 1);
        assert_eq!(buffer.redo_step().position, 1);
        buffer.perform_redo_step().unwrap();
        assert_eq!(buffer.text(), b"a");
    }

    #[test]
    fn test_typing_is_one_step() {
        let mut buffer = CellBuffer::new();
        for (i, ch) in b"abc".iter().enumerate() {
            buffer.insert_string(i, &[*ch]).unwrap();
        }
        assert!(!buffer.started_sequence());
        assert_eq!(buffer.undo().unwrap(), 3);
        assert_eq!(buffer.length(), 0);
        assert!(!buffer.can_undo());
    }

    #[test]
    fn test_container_action() {
        let mut buffer = buffer_with("a");
        buffer.add_undo_action(42, true).unwrap();
        buffer.insert_string(1, b"b").unwrap();
        assert_eq!(buffer.undo().unwrap(), 3);
        assert_eq!(buffer.length(), 0);
    }

    #[test]
    fn test_undo_collection_off() {
        let mut buffer = CellBuffer::new();
        assert!(!buffer.set_undo_collection(false));
        assert!(!buffer.is_collecting_undo());
        buffer.insert_string(0, b"abc").unwrap();
        assert!(!buffer.can_undo());
        buffer.set_undo_collection(true);
        buffer.insert_string(3, b"d").unwrap();
        buffer.undo().unwrap();
        assert_eq!(buffer.text(), b"abc");
    }

    #[test]
    fn test_delete_undo_history() {
        let mut buffer = buffer_with("abc");
        buffer.delete_undo_history();
        assert!(!buffer.can_undo());
        assert!(buffer.is_save_point());
        assert_eq!(buffer.undo_history().current_action(), 0);
    }

    #[test]
    fn test_save_points() {
        let mut buffer = buffer_with("a");
        buffer.set_save_point();
        buffer.insert_string(1, b"b").unwrap();
        assert!(!buffer.is_save_point());
        assert!(buffer.after_save_point());
        buffer.undo().unwrap();
        assert!(buffer.is_save_point());
        buffer.undo().unwrap();
        assert!(buffer.before_reachable_save_point());
        buffer.insert_string(0, b"z").unwrap();
        assert!(buffer.after_detach_point());
        assert!(buffer.before_save_point());
        assert!(!buffer.before_reachable_save_point());
    }

    #[test]
    fn test_tentative() {
        let mut buffer = buffer_with("a");
        buffer.tentative_start();
        assert!(buffer.tentative_active());
        buffer.insert_string(1, b"b").unwrap();
        assert!(buffer.started_sequence());
        assert_eq!(buffer.tentative_steps(), Some(1));
        buffer.tentative_commit();
        assert!(!buffer.tentative_active());
    }

    #[test]
    fn test_tentative_undo_rolls_back_composition() {
        let mut buffer = buffer_with("a");
        buffer.tentative_start();
        buffer.insert_string(1, b"b").unwrap();
        buffer.insert_string(0, b"xy").unwrap();
        assert_eq!(buffer.text(), b"xyab");
        assert_eq!(buffer.tentative_steps(), Some(3));

        assert_eq!(buffer.tentative_undo().unwrap(), 3);
        assert_eq!(buffer.text(), b"a");
        assert!(!buffer.tentative_active());
        assert!(!buffer.can_redo());
        assert_eq!(buffer.tentative_undo().unwrap(), 0);

        // Earlier history is still there.
        assert_eq!(buffer.undo().unwrap(), 1);
        assert_eq!(buffer.length(), 0);
    }

    #[test]
    fn test_undo_removal_restores_styles() {
        let mut buffer = buffer_with("abcd");
        buffer.set_style_for(0, 3, 5);
        buffer.delete_chars(0, 3).unwrap();
        assert_eq!(buffer.text(), b"d");

        buffer.undo().unwrap();
        assert_eq!(buffer.text(), b"abcd");
        let mut styles = [9u8; 4];
        buffer.get_style_range(&mut styles, 0);
        assert_eq!(styles, [5, 5, 5, 0]);

        buffer.redo().unwrap();
        buffer.undo().unwrap();
        buffer.get_style_range(&mut styles, 0);
        assert_eq!(styles, [5, 5, 5, 0]);
    }

    #[test]
    fn test_unicode_delete_with_observer() {
        let state = Rc::new(RefCell::new(LineState::new()));
        let options = CellBufferOptions {
            line_end_types: LineEndTypes::UNICODE,
            ..CellBufferOptions::default()
        };
        let mut buffer = CellBuffer::with_options(options).unwrap();
        buffer.add_per_line(state.clone());
        buffer.insert_string(0, &[b'a', 0xE2, b'X', 0x80, 0xA8, b'b']).unwrap();
        state.borrow_mut().set_line_state(0, 3).unwrap();
        assert_eq!(buffer.lines(), 1);
        let before = buffer.undo_history().current_action();

        // Removing X joins the halves of a line separator.
        assert!(buffer.delete_chars(2, 1).unwrap());
        assert_eq!(line_starts(&buffer), vec![0, 4]);
        assert_eq!(state.borrow().max_line_state(), 2);
        assert_eq!(buffer.undo_history().current_action(), before + 2);

        assert_eq!(buffer.undo().unwrap(), 1);
        assert_eq!(buffer.lines(), 1);
        assert_eq!(buffer.text(), [b'a', 0xE2, b'X', 0x80, 0xA8, b'b']);
    }

    #[test]
    fn test_edits_refused_while_observer_borrowed() {
        let state = Rc::new(RefCell::new(LineState::new()));
        let mut buffer = CellBuffer::new();
        buffer.add_per_line(state.clone());
        buffer.insert_string(0, b"a\nb").unwrap();

        let held = state.borrow();
        assert_eq!(buffer.insert_string(0, b"x\n").unwrap(), 0);
        assert!(!buffer.delete_chars(0, 2).unwrap());
        assert_eq!(buffer.undo().unwrap(), 0);
        assert_eq!(buffer.text(), b"a\nb");
        assert_eq!(held.line_state(0), 0);
        drop(held);

        assert_eq!(buffer.insert_string(0, b"x\n").unwrap(), 2);
        assert_eq!(buffer.lines(), 3);
    }

    #[test]
    fn test_grouped_edits() {
        let mut buffer = CellBuffer::new();
        buffer.begin_undo_action().unwrap();
        buffer.insert_string(0, b"hello").unwrap();
        buffer.delete_chars(0, 1).unwrap();
        buffer.insert_string(0, b"J").unwrap();
        buffer.end_undo_action().unwrap();
        assert_eq!(buffer.text(), b"Jello");
        assert_eq!(buffer.undo().unwrap(), 3);
        assert_eq!(buffer.length(), 0);

        buffer.begin_undo_action().unwrap();
        buffer.drop_undo_sequence();
        assert_eq!(buffer.undo_history().undo_sequence_depth(), 0);
    }

    #[test]
    fn test_line_state_follows_edits() {
        let state = Rc::new(RefCell::new(LineState::new()));
        let mut buffer = CellBuffer::new();
        buffer.add_per_line(state.clone());
        buffer.insert_string(0, b"a\nb\nc").unwrap();
        state.borrow_mut().set_line_state(2, 9).unwrap();
        buffer.delete_chars(0, 2).unwrap();
        assert_eq!(state.borrow().line_state(1), 9);
    }

    #[test]
    fn test_markers_follow_lines() {
        let markers = Rc::new(RefCell::new(LineMarkers::new()));
        let mut buffer = buffer_with("a\nb");
        buffer.add_per_line(markers.clone());
        let handle = markers
            .borrow_mut()
            .add_mark(1, 0, buffer.lines())
            .unwrap();
        buffer.insert_string(2, b"x\n").unwrap();
        assert_eq!(markers.borrow().line_from_handle(handle), Some(2));
        buffer.undo().unwrap();
        assert_eq!(markers.borrow().line_from_handle(handle), Some(1));
    }
}
