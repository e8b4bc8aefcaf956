use tracing::debug;

use crate::error::{Error, Result};
use crate::symbol::{Symbol, is_valid_symbol};

/// Counts gathered while lexing, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LexStats {
    /// Characters scanned.
    pub text_size: usize,
    /// Characters kept.
    pub valid_symbols: usize,
}

/// Filter `source` down to its instruction symbols, in order.
///
/// Everything outside the alphabet (whitespace, letters, digits, comments)
/// is dropped. Fails with [`Error::NoCodeFound`] when nothing is left,
/// including when `source` is empty.
pub fn lex(source: &str) -> Result<Vec<Symbol>> {
    lex_with_stats(source).map(|(symbols, _)| symbols)
}

/// Like [`lex`], also returning the scan counts.
pub fn lex_with_stats(source: &str) -> Result<(Vec<Symbol>, LexStats)> {
    let symbols: Vec<Symbol> = source
        .chars()
        .filter(|&c| is_valid_symbol(c))
        .filter_map(Symbol::from_char)
        .collect();
    let stats = LexStats {
        text_size: source.chars().count(),
        valid_symbols: symbols.len(),
    };

    debug!(
        text_size = stats.text_size,
        valid_symbols = stats.valid_symbols,
        "lexer results"
    );

    if symbols.is_empty() {
        return Err(Error::NoCodeFound);
    }
    Ok((symbols, stats))
}
