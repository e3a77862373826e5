//! Append-only buffer holding the decoded message.

/// Decoded characters in arrival order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageBuffer {
    chars: Vec<char>,
}

impl MessageBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a character at the tail.
    pub fn append(&mut self, c: char) {
        self.chars.push(c);
    }

    /// Iterate the message head to tail.
    pub fn render(&self) -> impl Iterator<Item = char> + '_ {
        self.chars.iter().copied()
    }

    /// Number of characters decoded so far.
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    /// Whether nothing has been decoded yet.
    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// Consume the buffer, producing the assembled message.
    pub fn into_string(self) -> String {
        self.chars.into_iter().collect()
    }
}

impl std::fmt::Display for MessageBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for c in self.render() {
            write!(f, "{c}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_preserves_order() {
        let mut buffer = MessageBuffer::new();
        for c in "HOLA MUNDO".chars() {
            buffer.append(c);
        }
        assert_eq!(buffer.render().collect::<String>(), "HOLA MUNDO");
        assert_eq!(buffer.len(), 10);
    }

    #[test]
    fn test_empty_render() {
        let buffer = MessageBuffer::new();
        assert!(buffer.is_empty());
        assert_eq!(buffer.render().count(), 0);
        assert_eq!(buffer.to_string(), "");
    }

    #[test]
    fn test_into_string_matches_display() {
        let mut buffer = MessageBuffer::new();
        buffer.append('O');
        buffer.append(' ');
        buffer.append('K');
        assert_eq!(buffer.to_string(), "O K");
        assert_eq!(buffer.into_string(), "O K");
    }
}
