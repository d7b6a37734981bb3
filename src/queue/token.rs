//! # Token identifiers.
//!
//! A [`Token`] is the unit of work: an opaque, strictly increasing integer with
//! no payload. Tokens are minted by the source through [`TokenSequence`] and
//! consumed exactly once by one counter.

use std::fmt;

/// Opaque token identifier.
///
/// Ordering follows generation order: a token minted later always compares greater.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Token(u64);

impl Token {
    /// Wraps a raw identifier.
    #[inline]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw identifier.
    #[inline]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Token> for u64 {
    fn from(t: Token) -> Self {
        t.0
    }
}

/// Gap-free token counter starting at 1.
///
/// Owned by exactly one source, so no synchronization is involved.
#[derive(Debug)]
pub struct TokenSequence {
    next: u64,
}

impl TokenSequence {
    /// Creates a sequence whose first token is `1`.
    pub fn new() -> Self {
        Self { next: 1 }
    }

    /// Mints the next token.
    pub fn next_token(&mut self) -> Token {
        let t = Token(self.next);
        self.next = self.next.saturating_add(1);
        t
    }

    /// Number of tokens minted so far.
    pub fn minted(&self) -> u64 {
        self.next - 1
    }
}

impl Default for TokenSequence {
    fn default() -> Self {
        Self::new()
    }
}
