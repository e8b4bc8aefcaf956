use crate::error::{Error, Result};

/// Cell count used when nothing else is configured.
pub const DEFAULT_MEMORY_SIZE: usize = 30_000;

/// Which way a pointer move goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
}

/// A fixed array of 8-bit cells and the data pointer into it.
///
/// Cell arithmetic wraps modulo 256. The data pointer does not wrap: a move
/// that would leave the array is refused before it happens, so `dp` is
/// always a valid index.
#[derive(Debug, Clone)]
pub struct Memory {
    cells: Vec<u8>,
    dp: usize,
}

impl Memory {
    /// Allocate `size` zeroed cells. A zero-cell memory is refused.
    pub fn new(size: usize) -> Result<Self> {
        if size == 0 {
            return Err(Error::MemNotInitialized);
        }
        Ok(Self {
            cells: vec![0u8; size],
            dp: 0,
        })
    }

    pub fn size(&self) -> usize {
        self.cells.len()
    }

    pub fn pointer(&self) -> usize {
        self.dp
    }

    pub fn cells(&self) -> &[u8] {
        &self.cells
    }

    /// Move the data pointer one cell, or fail with [`Error::MemOverflow`]
    /// leaving it where it was.
    pub fn move_pointer(&mut self, direction: Direction) -> Result<()> {
        let next = match direction {
            Direction::Left => self.dp.checked_sub(1),
            Direction::Right => Some(self.dp + 1).filter(|&p| p < self.cells.len()),
        };
        match next {
            Some(p) => {
                self.dp = p;
                Ok(())
            }
            None => Err(Error::MemOverflow {
                pointer: self.dp,
                size: self.cells.len(),
            }),
        }
    }

    #[inline(always)]
    pub fn increment_cell(&mut self) {
        let cell = &mut self.cells[self.dp];
        *cell = cell.wrapping_add(1);
    }

    #[inline(always)]
    pub fn decrement_cell(&mut self) {
        let cell = &mut self.cells[self.dp];
        *cell = cell.wrapping_sub(1);
    }

    #[inline(always)]
    pub fn read_cell(&self) -> u8 {
        self.cells[self.dp]
    }

    #[inline(always)]
    pub fn write_cell(&mut self, value: u8) {
        self.cells[self.dp] = value;
    }

    /// Zero every cell and put the pointer back at 0.
    pub fn reset(&mut self) {
        self.cells.fill(0);
        self.dp = 0;
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self {
            cells: vec![0u8; DEFAULT_MEMORY_SIZE],
            dp: 0,
        }
    }
}
