/// The instruction alphabet, in ascending byte order.
///
/// Kept sorted so membership can be answered with a binary search.
pub const ALPHABET: [char; 8] = ['+', ',', '-', '.', '<', '>', '[', ']'];

/// One recognized instruction symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Symbol {
    /// `>`
    MoveRight,
    /// `<`
    MoveLeft,
    /// `+`
    Increment,
    /// `-`
    Decrement,
    /// `.`
    Output,
    /// `,`
    Input,
    /// `[`
    LoopStart,
    /// `]`
    LoopEnd,
}

impl Symbol {
    /// Classify a character, returning `None` for anything outside the alphabet.
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '>' => Some(Symbol::MoveRight),
            '<' => Some(Symbol::MoveLeft),
            '+' => Some(Symbol::Increment),
            '-' => Some(Symbol::Decrement),
            '.' => Some(Symbol::Output),
            ',' => Some(Symbol::Input),
            '[' => Some(Symbol::LoopStart),
            ']' => Some(Symbol::LoopEnd),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Symbol::MoveRight => '>',
            Symbol::MoveLeft => '<',
            Symbol::Increment => '+',
            Symbol::Decrement => '-',
            Symbol::Output => '.',
            Symbol::Input => ',',
            Symbol::LoopStart => '[',
            Symbol::LoopEnd => ']',
        }
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Returns true if `c` is one of the eight instruction symbols.
pub fn is_valid_symbol(c: char) -> bool {
    let (mut lo, mut hi) = (0, ALPHABET.len());
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        match ALPHABET[mid].cmp(&c) {
            std::cmp::Ordering::Equal => return true,
            std::cmp::Ordering::Less => lo = mid + 1,
            std::cmp::Ordering::Greater => hi = mid,
        }
    }
    false
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn validator_agrees_with_classifier(c in any::<char>()) {
            prop_assert_eq!(is_valid_symbol(c), Symbol::from_char(c).is_some());
        }
    }
}
