//! The rotor wheel: a circular A-Z alphabet with a movable origin.
//!
//! Decoding a letter means taking its position in the plain alphabet
//! (`A` = 0 .. `Z` = 25) and counting that many steps forward from the
//! symbol currently sitting at the origin. Rotating the wheel only moves the
//! origin; the 26 symbols themselves never change.
//!
//! ```text
//! rest:        origin -> A B C D ... Z
//! rotate(2):   origin -> C D E F ... Z A B
//! decode('A') = 'C', decode('W') = 'Y'
//! ```

/// Number of symbols on the wheel.
pub const ALPHABET_LEN: usize = 26;

/// The canonical alphabet in wheel order.
pub const ALPHABET: [char; ALPHABET_LEN] = [
    'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M', 'N', 'O', 'P', 'Q', 'R', 'S',
    'T', 'U', 'V', 'W', 'X', 'Y', 'Z',
];

/// A rotating substitution wheel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotorWheel {
    symbols: [char; ALPHABET_LEN],
    /// Index into `symbols` of the position-0 symbol.
    origin: usize,
}

impl Default for RotorWheel {
    fn default() -> Self {
        Self::new()
    }
}

impl RotorWheel {
    /// Create a wheel at rest (origin on `'A'`).
    pub fn new() -> Self {
        RotorWheel {
            symbols: ALPHABET,
            origin: 0,
        }
    }

    /// Move the origin `n` positions: forward for positive `n`, backward for
    /// negative `n`. Any magnitude is accepted and wraps around the wheel.
    pub fn rotate(&mut self, n: i32) {
        let len = ALPHABET_LEN as i64;
        let steps = i64::from(n).rem_euclid(len);
        self.origin = ((self.origin as i64 + steps) % len) as usize;
    }

    /// Map a received symbol through the wheel.
    ///
    /// Spaces and anything outside `'A'..='Z'` pass through unchanged.
    pub fn decode(&self, symbol: char) -> char {
        match Self::position(symbol) {
            Some(k) => self.symbols[(self.origin + k) % ALPHABET_LEN],
            None => symbol,
        }
    }

    /// Inverse of [`decode`](Self::decode) for the current wheel state:
    /// `decode(encode(c)) == c` for every letter.
    pub fn encode(&self, symbol: char) -> char {
        match Self::position(symbol) {
            Some(k) => {
                let steps = (k + ALPHABET_LEN - self.origin) % ALPHABET_LEN;
                ALPHABET[steps]
            }
            None => symbol,
        }
    }

    /// The symbol currently at position 0.
    pub fn origin(&self) -> char {
        self.symbols[self.origin]
    }

    /// How far the origin sits from `'A'` (0-25).
    pub fn offset(&self) -> u8 {
        self.origin as u8
    }

    /// Return to the rest position.
    pub fn reset(&mut self) {
        self.origin = 0;
    }

    fn position(symbol: char) -> Option<usize> {
        if symbol.is_ascii_uppercase() {
            Some((symbol as u8 - b'A') as usize)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn letter_at(index: i64) -> char {
        ALPHABET[index.rem_euclid(ALPHABET_LEN as i64) as usize]
    }

    #[test]
    fn test_rest_is_identity() {
        let wheel = RotorWheel::new();
        for c in ALPHABET {
            assert_eq!(wheel.decode(c), c);
        }
        assert_eq!(wheel.origin(), 'A');
    }

    #[test]
    fn test_rotation_law() {
        for r in -60..=60 {
            let mut wheel = RotorWheel::new();
            wheel.rotate(r);
            for (k, c) in ALPHABET.iter().enumerate() {
                assert_eq!(
                    wheel.decode(*c),
                    letter_at(k as i64 + i64::from(r)),
                    "rotate({r}) then decode({c})"
                );
            }
        }
    }

    #[test]
    fn test_rotate_zero_is_noop() {
        let mut wheel = RotorWheel::new();
        wheel.rotate(5);
        let before = wheel.clone();
        wheel.rotate(0);
        assert_eq!(wheel, before);
    }

    #[test]
    fn test_rotate_round_trip() {
        for n in [1, 2, 13, 25, 26, 27, 100, -3, i32::MAX, i32::MIN + 1] {
            let mut wheel = RotorWheel::new();
            wheel.rotate(7);
            let before: Vec<char> = ALPHABET.iter().map(|c| wheel.decode(*c)).collect();
            wheel.rotate(n);
            wheel.rotate(-n);
            let after: Vec<char> = ALPHABET.iter().map(|c| wheel.decode(*c)).collect();
            assert_eq!(before, after, "rotate({n}) / rotate({})", -n);
        }
    }

    #[test]
    fn test_extreme_rotation() {
        let mut wheel = RotorWheel::new();
        wheel.rotate(i32::MIN);
        assert_eq!(wheel.origin(), letter_at(i64::from(i32::MIN)));
        wheel.rotate(i32::MAX);
        assert_eq!(wheel.origin(), letter_at(i64::from(i32::MIN) + i64::from(i32::MAX)));
    }

    #[test]
    fn test_space_is_never_enciphered() {
        let mut wheel = RotorWheel::new();
        for r in 0..30 {
            assert_eq!(wheel.decode(' '), ' ');
            assert_eq!(wheel.encode(' '), ' ');
            wheel.rotate(r);
        }
    }

    #[test]
    fn test_out_of_alphabet_passthrough() {
        let mut wheel = RotorWheel::new();
        wheel.rotate(4);
        for c in ['a', 'z', '0', '!', '@', '[', 'é'] {
            assert_eq!(wheel.decode(c), c);
        }
    }

    #[test]
    fn test_backward_rotation_wraps() {
        let mut wheel = RotorWheel::new();
        wheel.rotate(-2);
        assert_eq!(wheel.origin(), 'Y');
        assert_eq!(wheel.offset(), 24);
        assert_eq!(wheel.decode('A'), 'Y');
        assert_eq!(wheel.decode('W'), 'U');
    }

    #[test]
    fn test_encode_inverts_decode() {
        for r in 0..26 {
            let mut wheel = RotorWheel::new();
            wheel.rotate(r);
            for c in ALPHABET {
                assert_eq!(wheel.decode(wheel.encode(c)), c);
            }
        }
    }

    #[test]
    fn test_reset() {
        let mut wheel = RotorWheel::new();
        wheel.rotate(11);
        wheel.reset();
        assert_eq!(wheel, RotorWheel::new());
    }
}
