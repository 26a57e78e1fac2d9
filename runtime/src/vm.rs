//! The threaded virtual machine.
//!
//! Execution advances a set of logical threads through the program in
//! lockstep with the subject, one codepoint per round. Thread order is
//! load-bearing: the list index is the thread's priority, and which thread
//! reports a match under ambiguity falls directly out of that order, so
//! splits insert the forked thread immediately after the forking one.
//!
//! Two sparse sets bound the work done per round. `visited` records every
//! program offset some thread has owned during the current round; a thread
//! stepping onto an owned offset is redundant (a higher-priority thread
//! already carries that continuation) and is dropped. `visited_next` plays
//! the same role for the landing offsets of threads that consumed the
//! current codepoint, and the two swap when the cursor advances. Together
//! they keep the live set bounded by the program size and make zero-width
//! loops terminate.

use crate::classes::is_word;
use crate::cursor::Cursor;
use crate::sparse_set::SparseSet;
use crate::{Inst, Program, SEARCH_PREFIX_LEN};

/// Whether a match must cover the whole subject or may start anywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// The match must span the subject from begin to end. Execution enters
    /// the program past the search prefix.
    Full,
    /// The match may cover any substring. The compiled search prefix feeds
    /// a fresh entry thread at every position, with priority favoring the
    /// earliest entry.
    Search,
}

/// Execution options: the matching mode and whether to keep scanning after
/// the first accepted match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecOptions {
    pub mode: Mode,
    pub longest: bool,
}

impl ExecOptions {
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            longest: false,
        }
    }

    /// Keeps scanning after an accept, letting surviving equal-or-higher
    /// priority threads replace the recorded match with a longer one.
    pub fn longest(mut self) -> Self {
        self.longest = true;
        self
    }
}

impl Default for ExecOptions {
    fn default() -> Self {
        Self::new(Mode::Search)
    }
}

/// The save slots of an accepted match. Slots `2g` and `2g + 1` hold the
/// open and close byte offsets of capture group `g`; group 0 spans the
/// whole match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Captures {
    slots: Vec<Option<usize>>,
}

impl Captures {
    fn from_slots(slots: Vec<Option<usize>>) -> Self {
        Self { slots }
    }

    pub fn group_count(&self) -> usize {
        self.slots.len() / 2
    }

    /// The byte span of a capture group, or `None` if the group did not
    /// participate in the match.
    pub fn group(&self, group: usize) -> Option<(usize, usize)> {
        let start = (*self.slots.get(group * 2)?)?;
        let end = (*self.slots.get(group * 2 + 1)?)?;
        Some((start, end))
    }

    /// The matched text of a capture group within the subject the match was
    /// produced from.
    pub fn group_str<'s>(&self, subject: &'s str, group: usize) -> Option<&'s str> {
        self.group(group).map(|(start, end)| &subject[start..end])
    }
}

/// Runs a compiled program against a subject.
pub fn execute(program: &Program, subject: &str, options: ExecOptions) -> Option<Captures> {
    ThreadedVm::new(program).exec(subject, options)
}

#[derive(Debug)]
struct Thread {
    /// Program offset of the next instruction, or `None` once the thread
    /// has died and awaits compaction.
    ip: Option<usize>,
    saves: Vec<Option<usize>>,
}

enum StepResult {
    /// The thread consumed the current codepoint and waits for the next
    /// round at its landing offset.
    Consumed,
    /// The thread reached `Match`.
    Matched,
    /// A guard failed or the thread was deduplicated.
    Failed,
}

/// The executor. Holds the thread list and the per-round offset sets so
/// repeated executions reuse their allocations.
#[derive(Debug)]
pub struct ThreadedVm<'p> {
    program: &'p Program,
    threads: Vec<Thread>,
    visited: SparseSet,
    visited_next: SparseSet,
}

impl<'p> ThreadedVm<'p> {
    pub fn new(program: &'p Program) -> Self {
        let bound = program.bytecode.len() + 1;
        Self {
            program,
            threads: Vec::new(),
            visited: SparseSet::new(bound),
            visited_next: SparseSet::new(bound),
        }
    }

    /// Executes the program against the subject, returning the captures of
    /// the accepted match if there is one.
    pub fn exec(&mut self, subject: &str, options: ExecOptions) -> Option<Captures> {
        self.threads.clear();
        self.visited.clear();
        self.visited_next.clear();

        let entry = match options.mode {
            Mode::Search => 0,
            Mode::Full => SEARCH_PREFIX_LEN,
        };
        let initial_saves = vec![None; self.program.save_slot_count];
        self.add_thread(0, entry, initial_saves);

        let mut cursor = Cursor::new(subject);
        let mut found: Option<Vec<Option<usize>>> = None;

        while !cursor.at_end() {
            let mut i = 0;
            while i < self.threads.len() {
                match self.step(i, &cursor) {
                    StepResult::Consumed => {}
                    StepResult::Failed => self.threads[i].ip = None,
                    StepResult::Matched => {
                        if options.mode == Mode::Full {
                            // An accept that leaves input unread can never
                            // become a full match; the thread is done.
                        } else {
                            found = Some(std::mem::take(&mut self.threads[i].saves));
                            // lower-priority threads can no longer win
                            self.threads.truncate(i);
                            if !options.longest {
                                return found.map(Captures::from_slots);
                            }
                        }
                    }
                }
                i += 1;
            }

            self.threads.retain(|thread| thread.ip.is_some());
            if self.threads.is_empty() {
                return found.map(Captures::from_slots);
            }

            cursor.advance();
            std::mem::swap(&mut self.visited, &mut self.visited_next);
            self.visited_next.clear();
        }

        // The subject is exhausted; step the survivors once more so that
        // trailing zero-width assertions and Match are observed.
        let mut i = 0;
        while i < self.threads.len() {
            if let StepResult::Matched = self.step(i, &cursor) {
                found = Some(std::mem::take(&mut self.threads[i].saves));
                self.threads.truncate(i);
                break;
            }
            i += 1;
        }

        found.map(Captures::from_slots)
    }

    /// Executes non-consuming instructions for thread `i` until it consumes
    /// the current codepoint, accepts, or dies.
    ///
    /// New threads are inserted into the list mid-step, so the thread is
    /// re-indexed after every mutation rather than borrowed across one.
    fn step(&mut self, i: usize, cursor: &Cursor) -> StepResult {
        loop {
            let ip = match self.threads[i].ip {
                Some(ip) => ip,
                None => return StepResult::Failed,
            };
            let (inst, next_ip) = match self.program.decode_at(ip) {
                Ok(decoded) => decoded,
                Err(err) => panic!("malformed program: {}", err),
            };

            match inst {
                Inst::Literal(value) => {
                    return if cursor.current() == Some(value) {
                        self.consume(i, next_ip)
                    } else {
                        StepResult::Failed
                    };
                }
                Inst::AnyChar => {
                    return if cursor.current().is_some() {
                        self.consume(i, next_ip)
                    } else {
                        StepResult::Failed
                    };
                }
                Inst::Matcher(id) => {
                    let program = self.program;
                    let matcher = match program.matchers.get(id) {
                        Some(matcher) => matcher,
                        None => panic!("matcher id {} out of range", id),
                    };
                    let matched = cursor.current().map(|cp| matcher.matches(cp));
                    return match matched {
                        Some(true) => self.consume(i, next_ip),
                        _ => StepResult::Failed,
                    };
                }
                Inst::Jump(target) => {
                    if !self.try_claim(target as usize) {
                        return StepResult::Failed;
                    }
                    self.threads[i].ip = Some(target as usize);
                }
                Inst::SplitPrioritizeParent(target) => {
                    let saves = self.threads[i].saves.clone();
                    self.add_thread(i + 1, target as usize, saves);
                    if !self.try_claim(next_ip) {
                        return StepResult::Failed;
                    }
                    self.threads[i].ip = Some(next_ip);
                }
                Inst::SplitPrioritizeChild(target) => {
                    let saves = self.threads[i].saves.clone();
                    self.add_thread(i + 1, next_ip, saves);
                    if !self.try_claim(target as usize) {
                        return StepResult::Failed;
                    }
                    self.threads[i].ip = Some(target as usize);
                }
                Inst::Save(slot) => {
                    if !self.try_claim(next_ip) {
                        return StepResult::Failed;
                    }
                    let pos = cursor.pos();
                    let thread = &mut self.threads[i];
                    thread.saves[slot] = Some(pos);
                    thread.ip = Some(next_ip);
                }
                Inst::LineStart => {
                    if !is_line_start(cursor) || !self.try_claim(next_ip) {
                        return StepResult::Failed;
                    }
                    self.threads[i].ip = Some(next_ip);
                }
                Inst::LineEnd => {
                    if !is_line_end(cursor) || !self.try_claim(next_ip) {
                        return StepResult::Failed;
                    }
                    self.threads[i].ip = Some(next_ip);
                }
                Inst::WordBoundary => {
                    if !is_word_boundary(cursor) || !self.try_claim(next_ip) {
                        return StepResult::Failed;
                    }
                    self.threads[i].ip = Some(next_ip);
                }
                Inst::NotWordBoundary => {
                    if is_word_boundary(cursor) || !self.try_claim(next_ip) {
                        return StepResult::Failed;
                    }
                    self.threads[i].ip = Some(next_ip);
                }
                Inst::SubjectBegin => {
                    if !cursor.at_start() || !self.try_claim(next_ip) {
                        return StepResult::Failed;
                    }
                    self.threads[i].ip = Some(next_ip);
                }
                Inst::SubjectEnd => {
                    if !cursor.at_end() || !self.try_claim(next_ip) {
                        return StepResult::Failed;
                    }
                    self.threads[i].ip = Some(next_ip);
                }
                Inst::Match => {
                    self.threads[i].ip = None;
                    return StepResult::Matched;
                }
            }
        }
    }

    /// Inserts a forked thread at `index` unless the target offset is
    /// already owned this round.
    fn add_thread(&mut self, index: usize, ip: usize, saves: Vec<Option<usize>>) {
        if !self.try_claim(ip) {
            return;
        }
        self.threads.insert(index, Thread { ip: Some(ip), saves });
    }

    /// Claims a program offset for the current round. The first claimant
    /// owns the offset; later arrivals are redundant threads.
    fn try_claim(&mut self, ip: usize) -> bool {
        if self.visited.contains(ip) {
            return false;
        }
        self.visited.insert(ip);
        true
    }

    /// Records a consuming thread's landing offset for the next round.
    fn consume(&mut self, i: usize, landing: usize) -> StepResult {
        if self.visited_next.contains(landing) {
            return StepResult::Failed;
        }
        self.visited_next.insert(landing);
        self.threads[i].ip = Some(landing);
        StepResult::Consumed
    }
}

fn is_line_start(cursor: &Cursor) -> bool {
    cursor.at_start() || cursor.prev() == Some('\n')
}

fn is_line_end(cursor: &Cursor) -> bool {
    cursor.at_end() || cursor.current() == Some('\n')
}

/// A word boundary separates a word codepoint from a non-word one, with
/// the positions before the subject and after it counting as non-word.
fn is_word_boundary(cursor: &Cursor) -> bool {
    let before = cursor.prev().map(is_word).unwrap_or(false);
    let at = cursor.current().map(is_word).unwrap_or(false);
    before != at
}
