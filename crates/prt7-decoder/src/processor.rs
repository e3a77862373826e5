//! Frame dispatch onto the rotor wheel and message buffer.

use prt7_protocol::Frame;
use serde::Serialize;

use crate::message::MessageBuffer;
use crate::rotor::RotorWheel;

/// What applying a frame did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Applied {
    /// A LOAD frame appended `output` (decoded from `input`).
    Decoded {
        /// Symbol as received.
        input: char,
        /// Symbol appended to the message.
        output: char,
    },
    /// A MAP frame moved the rotor.
    Rotated {
        /// Requested rotation.
        by: i32,
        /// Symbol at the origin afterwards.
        origin: char,
    },
}

/// Apply one frame: LOAD decodes and appends, MAP rotates.
pub fn apply(frame: Frame, wheel: &mut RotorWheel, buffer: &mut MessageBuffer) -> Applied {
    match frame {
        Frame::Load(input) => {
            let output = wheel.decode(input);
            buffer.append(output);
            Applied::Decoded { input, output }
        }
        Frame::Map(by) => {
            wheel.rotate(by);
            Applied::Rotated {
                by,
                origin: wheel.origin(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_appends_decoded() {
        let mut wheel = RotorWheel::new();
        let mut buffer = MessageBuffer::new();

        let applied = apply(Frame::Load('H'), &mut wheel, &mut buffer);
        assert_eq!(applied, Applied::Decoded { input: 'H', output: 'H' });
        assert_eq!(buffer.to_string(), "H");
        assert_eq!(wheel, RotorWheel::new());
    }

    #[test]
    fn test_map_rotates_only() {
        let mut wheel = RotorWheel::new();
        let mut buffer = MessageBuffer::new();

        let applied = apply(Frame::Map(2), &mut wheel, &mut buffer);
        assert_eq!(applied, Applied::Rotated { by: 2, origin: 'C' });
        assert!(buffer.is_empty());

        apply(Frame::Load('A'), &mut wheel, &mut buffer);
        assert_eq!(buffer.to_string(), "C");
    }

    #[test]
    fn test_load_space() {
        let mut wheel = RotorWheel::new();
        let mut buffer = MessageBuffer::new();
        apply(Frame::Map(9), &mut wheel, &mut buffer);
        apply(Frame::Load(' '), &mut wheel, &mut buffer);
        assert_eq!(buffer.to_string(), " ");
    }
}
