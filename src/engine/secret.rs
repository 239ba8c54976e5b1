use std::collections::BTreeSet;
use std::ops::Range;

use rand::Rng;
use rand::seq::SliceRandom;

/// Rendered in place of every hidden character.
pub const PLACEHOLDER: char = '_';
/// Typing this asks for a hint, so it is never treated as ignorable.
pub const HINT_CHAR: char = '?';

/// Whitespace and sentence punctuation are shown up front and never typed.
pub fn is_ignorable(ch: char) -> bool {
    ch != HINT_CHAR && (ch.is_whitespace() || matches!(ch, ',' | '.' | '!' | ';' | ':'))
}

pub fn chars_match(expected: char, typed: char) -> bool {
    expected == typed || expected.to_lowercase().eq(typed.to_lowercase())
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreparedSecret {
    pub secret: Vec<char>,
    pub pre_revealed: BTreeSet<usize>,
}

/// Unwraps `[...]` spans from the card text, remembering their inner positions.
///
/// A span closes at the first `]` after its `[` and may cross lines. An opening
/// bracket without a partner is kept as a literal character.
pub fn prepare(raw: &str) -> PreparedSecret {
    let chars: Vec<char> = raw.chars().collect();
    let mut secret = Vec::with_capacity(chars.len());
    let mut pre_revealed = BTreeSet::new();

    let mut i = 0;
    while i < chars.len() {
        if chars[i] == '['
            && let Some(len) = chars[i + 1..].iter().position(|&c| c == ']')
        {
            for &ch in &chars[i + 1..i + 1 + len] {
                pre_revealed.insert(secret.len());
                secret.push(ch);
            }
            i += len + 2;
            continue;
        }
        secret.push(chars[i]);
        i += 1;
    }

    PreparedSecret {
        secret,
        pre_revealed,
    }
}

/// The secret together with its mask.
///
/// A mask cell is either hidden or holds exactly the secret character at that
/// position, and a revealed cell never becomes hidden again.
#[derive(Clone, Debug)]
pub struct Board {
    secret: Vec<char>,
    revealed: Vec<bool>,
    pre_revealed: BTreeSet<usize>,
    hidden: usize,
}

impl Board {
    pub fn new(prepared: PreparedSecret) -> Self {
        let PreparedSecret {
            secret,
            pre_revealed,
        } = prepared;
        let revealed: Vec<bool> = secret
            .iter()
            .enumerate()
            .map(|(i, &ch)| is_ignorable(ch) || pre_revealed.contains(&i))
            .collect();
        let hidden = revealed.iter().filter(|&&r| !r).count();
        Self {
            secret,
            revealed,
            pre_revealed,
            hidden,
        }
    }

    pub fn from_text(raw: &str) -> Self {
        Self::new(prepare(raw))
    }

    pub fn len(&self) -> usize {
        self.secret.len()
    }

    pub fn is_empty(&self) -> bool {
        self.secret.is_empty()
    }

    pub fn secret(&self) -> &[char] {
        &self.secret
    }

    pub fn pre_revealed(&self) -> &BTreeSet<usize> {
        &self.pre_revealed
    }

    pub fn is_pre_revealed(&self, pos: usize) -> bool {
        self.pre_revealed.contains(&pos)
    }

    pub fn is_revealed(&self, pos: usize) -> bool {
        self.revealed.get(pos).copied().unwrap_or(false)
    }

    /// The mask character at `pos`: the secret character once revealed.
    pub fn cell(&self, pos: usize) -> Option<char> {
        self.is_revealed(pos).then(|| self.secret[pos])
    }

    pub fn mask_string(&self) -> String {
        (0..self.len())
            .map(|i| self.cell(i).unwrap_or(PLACEHOLDER))
            .collect()
    }

    pub fn hidden_count(&self) -> usize {
        self.hidden
    }

    pub fn is_complete(&self) -> bool {
        self.hidden == 0
    }

    /// Positions the cursor never stops on.
    pub fn is_skippable(&self, pos: usize) -> bool {
        is_ignorable(self.secret[pos]) || self.is_pre_revealed(pos) || self.revealed[pos]
    }

    /// Returns true if the position was hidden before.
    pub fn reveal(&mut self, pos: usize) -> bool {
        match self.revealed.get_mut(pos) {
            Some(cell) if !*cell => {
                *cell = true;
                self.hidden -= 1;
                true
            }
            _ => false,
        }
    }

    pub fn reveal_all(&mut self) {
        self.revealed.iter_mut().for_each(|cell| *cell = true);
        self.hidden = 0;
    }

    /// Contiguous alphanumeric runs.
    pub fn words(&self) -> Vec<Range<usize>> {
        let mut words = Vec::new();
        let mut start = None;
        for (i, ch) in self.secret.iter().enumerate() {
            match (ch.is_alphanumeric(), start) {
                (true, None) => start = Some(i),
                (false, Some(s)) => {
                    words.push(s..i);
                    start = None;
                }
                _ => {}
            }
        }
        if let Some(s) = start {
            words.push(s..self.secret.len());
        }
        words
    }

    pub fn reveal_first_letters(&mut self) {
        for word in self.words() {
            self.reveal(word.start);
        }
    }

    pub fn reveal_random_letters<R: Rng + ?Sized>(&mut self, n: usize, rng: &mut R) {
        let candidates: Vec<usize> = (0..self.len())
            .filter(|&i| !self.revealed[i] && self.secret[i].is_alphanumeric())
            .collect();
        let picked: Vec<usize> = candidates.choose_multiple(rng, n).copied().collect();
        for pos in picked {
            self.reveal(pos);
        }
    }

    pub fn reveal_random_words<R: Rng + ?Sized>(&mut self, n: usize, rng: &mut R) {
        let words = self.words();
        let picked: Vec<Range<usize>> = words.choose_multiple(rng, n).cloned().collect();
        for word in picked {
            for pos in word {
                self.reveal(pos);
            }
        }
    }
}
