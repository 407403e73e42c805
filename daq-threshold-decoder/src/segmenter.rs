//! Event segmentation
//!
//! Groups the raw lines of a source file into event blocks. The DAQ sets the
//! "new event" bit (bit 7 of Rising Edge 1) on exactly one line per trigger
//! cycle; every following line up to the next marked line belongs to the same
//! cycle.
//!
//! The scan is a two-state machine:
//!
//! | state          | marker set              | marker unset          |
//! |----------------|-------------------------|-----------------------|
//! | `Idle`         | begin block → `Accumulating` | discard → `Idle` |
//! | `Accumulating` | emit block, begin new   | append                |

use crate::record::peek_event_start;

/// Scanner state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmenterState {
    /// No block is open
    Idle,
    /// A block is open and collecting lines
    Accumulating,
}

/// What to do with the current line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmenterAction {
    /// Drop the line (no block open and no start marker)
    Discard,
    /// Open a new block with the line
    Begin,
    /// Append the line to the open block
    Append,
    /// Close the open block, then open a new one with the line
    EmitAndBegin,
}

impl SegmenterState {
    /// Transition function of the scanner
    pub fn next(self, starts_event: bool) -> (SegmenterState, SegmenterAction) {
        match (self, starts_event) {
            (SegmenterState::Idle, false) => (SegmenterState::Idle, SegmenterAction::Discard),
            (SegmenterState::Idle, true) => (SegmenterState::Accumulating, SegmenterAction::Begin),
            (SegmenterState::Accumulating, false) => {
                (SegmenterState::Accumulating, SegmenterAction::Append)
            }
            (SegmenterState::Accumulating, true) => {
                (SegmenterState::Accumulating, SegmenterAction::EmitAndBegin)
            }
        }
    }
}

/// A contiguous run of raw lines belonging to one trigger cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventBlock<'a> {
    /// Position of the block in the file (0-based)
    pub index: usize,
    /// Line number of the first line in the source (1-based)
    pub first_line: usize,
    pub lines: Vec<&'a str>,
}

/// Result of segmenting a file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Segmentation<'a> {
    pub blocks: Vec<EventBlock<'a>>,
    /// Lines dropped because no block was open
    pub discarded: usize,
}

/// Split `lines` into event blocks, preserving file order
///
/// Blank lines are skipped without affecting the state.
pub fn segment_events<'a, S>(lines: &'a [S]) -> Segmentation<'a>
where
    S: AsRef<str>,
{
    let mut state = SegmenterState::Idle;
    let mut result = Segmentation::default();
    let mut current: Option<EventBlock<'a>> = None;

    for (i, line) in lines.iter().enumerate() {
        let line = line.as_ref();
        if line.trim().is_empty() {
            log::trace!("Skipping blank line {}", i + 1);
            continue;
        }

        let (next_state, action) = state.next(peek_event_start(line));
        match action {
            SegmenterAction::Discard => {
                log::trace!("Discarding line {} outside of any event", i + 1);
                result.discarded += 1;
            }
            SegmenterAction::Begin => {
                current = Some(new_block(result.blocks.len(), i, line));
            }
            SegmenterAction::Append => {
                if let Some(block) = current.as_mut() {
                    block.lines.push(line);
                }
            }
            SegmenterAction::EmitAndBegin => {
                if let Some(block) = current.take() {
                    result.blocks.push(block);
                }
                current = Some(new_block(result.blocks.len(), i, line));
            }
        }
        state = next_state;
    }

    if let Some(block) = current {
        result.blocks.push(block);
    }

    log::debug!(
        "Segmented {} lines into {} event blocks ({} discarded)",
        lines.len(),
        result.blocks.len(),
        result.discarded
    );

    result
}

fn new_block(index: usize, line_index: usize, line: &str) -> EventBlock<'_> {
    EventBlock {
        index,
        first_line: line_index + 1,
        lines: vec![line],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const START: &str = "687C4047 80 00 2B 00 00 00 00 00 67037CB8 000322.027 180516 A 03 0 +0053";
    const CONT: &str = "687C4047 00 00 00 00 3A 00 00 00 67037CB8 000322.027 180516 A 03 0 +0053";

    #[test]
    fn test_transitions() {
        use SegmenterAction::*;
        use SegmenterState::*;

        assert_eq!(Idle.next(false), (Idle, Discard));
        assert_eq!(Idle.next(true), (Accumulating, Begin));
        assert_eq!(Accumulating.next(false), (Accumulating, Append));
        assert_eq!(Accumulating.next(true), (Accumulating, EmitAndBegin));
    }

    #[test]
    fn test_single_event() {
        let lines = vec![START, CONT, CONT];
        let seg = segment_events(&lines);
        assert_eq!(seg.blocks.len(), 1);
        assert_eq!(seg.blocks[0].lines.len(), 3);
        assert_eq!(seg.blocks[0].first_line, 1);
        assert_eq!(seg.discarded, 0);
    }

    #[test]
    fn test_consecutive_events() {
        let lines = vec![START, CONT, START, START, CONT, CONT];
        let seg = segment_events(&lines);
        let sizes: Vec<usize> = seg.blocks.iter().map(|b| b.lines.len()).collect();
        assert_eq!(sizes, vec![2, 1, 3]);
        let indices: Vec<usize> = seg.blocks.iter().map(|b| b.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert_eq!(seg.blocks[2].first_line, 4);
    }

    #[test]
    fn test_leading_lines_discarded() {
        let lines = vec![CONT, CONT, START, CONT];
        let seg = segment_events(&lines);
        assert_eq!(seg.discarded, 2);
        assert_eq!(seg.blocks.len(), 1);
        assert_eq!(seg.blocks[0].first_line, 3);
    }

    #[test]
    fn test_blank_lines_skipped() {
        let lines = vec![String::from(START), String::new(), String::from(CONT), "  ".to_string()];
        let seg = segment_events(&lines);
        assert_eq!(seg.blocks.len(), 1);
        assert_eq!(seg.blocks[0].lines, vec![START, CONT]);
    }

    #[test]
    fn test_unreadable_marker_stays_in_block() {
        let lines = vec![START, "garbage", CONT];
        let seg = segment_events(&lines);
        assert_eq!(seg.blocks.len(), 1);
        assert_eq!(seg.blocks[0].lines.len(), 3);
    }

    #[test]
    fn test_empty_input() {
        let lines: Vec<&str> = Vec::new();
        let seg = segment_events(&lines);
        assert!(seg.blocks.is_empty());
    }
}
