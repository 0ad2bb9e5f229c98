//! A two-way tape that grows one blank cell at a time whenever the head crosses a boundary.

use std::collections::VecDeque;

use crate::types::{Direction, TAPE_PADDING};

/// A growable, head-addressable sequence of symbols.
///
/// The head index is always in range. Crossing the left boundary prepends a blank and
/// crossing the right one appends a blank; the tape never shrinks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tape {
    cells: VecDeque<char>,
    head: usize,
    blank: char,
}

impl Tape {
    pub fn new(blank: char) -> Self {
        let mut tape = Self {
            cells: VecDeque::new(),
            head: 0,
            blank,
        };
        tape.reset(&[]);
        tape
    }

    /// Clears the tape to `TAPE_PADDING` blanks, centers the head and writes `initial`
    /// starting at the head.
    pub fn reset(&mut self, initial: &[char]) {
        self.cells.clear();
        self.cells.resize(TAPE_PADDING, self.blank);
        self.head = TAPE_PADDING / 2;

        for (i, &symbol) in initial.iter().enumerate() {
            let index = self.head + i;
            if index < self.cells.len() {
                self.cells[index] = symbol;
            } else {
                self.cells.push_back(symbol);
            }
        }
    }

    /// Returns the symbol under the head.
    pub fn read(&self) -> char {
        self.cells[self.head]
    }

    /// Writes a symbol under the head.
    pub fn write(&mut self, symbol: char) {
        self.cells[self.head] = symbol;
    }

    /// Moves the head by one cell, growing the tape if the head would leave it.
    pub fn shift(&mut self, direction: Direction) {
        match direction {
            Direction::Left => {
                if self.head == 0 {
                    // Extend tape to the left
                    self.cells.push_front(self.blank);
                } else {
                    self.head -= 1;
                }
            }
            Direction::Right => {
                self.head += 1;
                if self.head >= self.cells.len() {
                    self.cells.push_back(self.blank);
                }
            }
        }
    }

    pub fn head(&self) -> usize {
        self.head
    }

    pub fn blank(&self) -> char {
        self.blank
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Returns all cells from the leftmost to the rightmost.
    pub fn cells(&self) -> Vec<char> {
        self.cells.iter().copied().collect()
    }

    /// Renders the tape with the blank padding on both ends trimmed.
    pub fn render(&self) -> String {
        let text: String = self.cells.iter().collect();
        text.trim_matches(self.blank).to_string()
    }

    /// Returns `radius` cells on each side of the head, with the head cell in brackets.
    ///
    /// ```text
    /// 0 1 [1] 0 _
    /// ```
    pub fn window(&self, radius: usize) -> String {
        let start = self.head.saturating_sub(radius);
        let end = (self.head + radius + 1).min(self.cells.len());

        (start..end)
            .map(|i| {
                if i == self.head {
                    format!("[{}]", self.cells[i])
                } else {
                    self.cells[i].to_string()
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_centers_head() {
        let mut tape = Tape::new('_');
        tape.reset(&['a', 'b']);

        assert_eq!(tape.len(), TAPE_PADDING);
        assert_eq!(tape.head(), TAPE_PADDING / 2);
        assert_eq!(tape.read(), 'a');
        assert_eq!(tape.render(), "ab");
    }

    #[test]
    fn test_reset_with_long_input_extends_tape() {
        let input: Vec<char> = std::iter::repeat('1').take(TAPE_PADDING).collect();
        let mut tape = Tape::new('_');
        tape.reset(&input);

        assert_eq!(tape.len(), TAPE_PADDING / 2 + TAPE_PADDING);
        assert_eq!(tape.render().len(), TAPE_PADDING);
    }

    #[test]
    fn test_shift_grows_on_both_ends() {
        let mut tape = Tape::new('_');
        tape.reset(&[]);

        for _ in 0..TAPE_PADDING {
            tape.shift(Direction::Left);
        }
        assert_eq!(tape.head(), 0);
        assert_eq!(tape.len(), TAPE_PADDING + TAPE_PADDING / 2);

        let len = tape.len();
        for _ in 0..len {
            tape.shift(Direction::Right);
        }
        assert_eq!(tape.head(), len);
        assert_eq!(tape.len(), len + 1);
        assert_eq!(tape.read(), '_');
    }

    #[test]
    fn test_write_and_window() {
        let mut tape = Tape::new('_');
        tape.reset(&['1', '0']);
        tape.write('x');
        tape.shift(Direction::Right);

        assert_eq!(tape.window(1), "x [0] _");
        assert_eq!(tape.render(), "x0");
    }
}
