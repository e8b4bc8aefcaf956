use crate::error::Result;
use crate::lexer::lex;
use crate::symbol::Symbol;

/// The instruction stream and the instruction pointer walking it.
///
/// `ip` is signed: the backward loop scan may step it to -1 before
/// noticing there is nothing left to scan. The tape never dereferences
/// an out-of-range `ip`; [`Tape::current`] just returns `None`.
#[derive(Debug, Clone)]
pub struct Tape {
    symbols: Vec<Symbol>,
    ip: isize,
}

impl Tape {
    pub fn new(symbols: Vec<Symbol>) -> Self {
        Self { symbols, ip: 0 }
    }

    /// Lex `source` into a fresh tape.
    pub fn from_source(source: &str) -> Result<Self> {
        lex(source).map(Self::new)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    pub fn ip(&self) -> isize {
        self.ip
    }

    /// The symbol under `ip`, or `None` when `ip` is outside the stream.
    pub fn current(&self) -> Option<Symbol> {
        usize::try_from(self.ip)
            .ok()
            .and_then(|i| self.symbols.get(i).copied())
    }

    pub fn advance(&mut self) {
        self.ip += 1;
    }

    pub fn retreat(&mut self) {
        self.ip -= 1;
    }

    /// True while `0 <= ip < len`.
    pub fn in_bounds(&self) -> bool {
        self.ip >= 0 && (self.ip as usize) < self.symbols.len()
    }

    pub fn rewind(&mut self) {
        self.ip = 0;
    }

    /// Put `ip` back at a position saved earlier with [`Tape::ip`].
    pub fn seek(&mut self, ip: isize) {
        self.ip = ip;
    }
}
