//! Command router: decodes a `(topic, payload)` pair into a [`Command`].
//!
//! Topics are resolved once to a [`Channel`] at the message boundary;
//! everything downstream dispatches on the enum.  The router is a pure
//! decode step: it never touches the outputs.
//!
//! ## Payload rules
//!
//! | Channel    | Payload                 | Result                          |
//! |------------|-------------------------|---------------------------------|
//! | Switch     | `on` / `off` (exact)    | `SetSwitch(true / false)`       |
//! | Switch     | anything else           | `UnrecognizedPayload`           |
//! | Brightness | decimal `0`–`5`         | `SetBrightnessLevel(n)`         |
//! | Brightness | other integer           | `LevelOutOfRange(n)`            |
//! | Brightness | non-numeric             | level 0 (lenient parse)         |
//! | other      |:                       | `UnknownTopic`                  |

use crate::config::{NodeConfig, TOPIC_CAP};
use crate::error::RouteError;

use super::commands::{BrightnessLevel, Command};

/// Logical channel identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Motion reports (publish only).
    Motion,
    /// On/off indicator control.
    Switch,
    /// Dimmable indicator control.
    Brightness,
}

impl Channel {
    /// Channels the node subscribes to, in subscription order.
    pub const CONTROL: [Channel; 2] = [Channel::Switch, Channel::Brightness];
}

/// Static mapping from [`Channel`] to wire topic, fixed at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicTable {
    motion: heapless::String<TOPIC_CAP>,
    switch: heapless::String<TOPIC_CAP>,
    brightness: heapless::String<TOPIC_CAP>,
}

impl TopicTable {
    pub fn from_config(config: &NodeConfig) -> Self {
        Self {
            motion: config.motion_topic.clone(),
            switch: config.switch_topic.clone(),
            brightness: config.brightness_topic.clone(),
        }
    }

    /// Wire topic for `channel`.
    pub fn topic(&self, channel: Channel) -> &str {
        match channel {
            Channel::Motion => &self.motion,
            Channel::Switch => &self.switch,
            Channel::Brightness => &self.brightness,
        }
    }

    /// Resolve a wire topic (exact, case-sensitive match).
    pub fn resolve(&self, topic: &str) -> Option<Channel> {
        [Channel::Motion, Channel::Switch, Channel::Brightness]
            .into_iter()
            .find(|&c| self.topic(c) == topic)
    }
}

/// Pure decoder from inbound messages to commands.
#[derive(Debug, Clone)]
pub struct CommandRouter {
    topics: TopicTable,
}

impl CommandRouter {
    pub fn new(topics: TopicTable) -> Self {
        Self { topics }
    }

    pub fn topics(&self) -> &TopicTable {
        &self.topics
    }

    /// Decode one inbound message.
    pub fn route(&self, topic: &str, payload: &[u8]) -> Result<Command, RouteError> {
        match self.topics.resolve(topic) {
            Some(Channel::Switch) => match payload {
                b"on" => Ok(Command::SetSwitch(true)),
                b"off" => Ok(Command::SetSwitch(false)),
                _ => Err(RouteError::UnrecognizedPayload),
            },
            Some(Channel::Brightness) => {
                let n = parse_decimal_lenient(payload);
                BrightnessLevel::new(n)
                    .map(Command::SetBrightnessLevel)
                    .ok_or(RouteError::LevelOutOfRange(n))
            }
            // The motion channel is ours to publish on, never a command source.
            Some(Channel::Motion) | None => Err(RouteError::UnknownTopic),
        }
    }
}

/// Permissive decimal parse in the manner of C `atol`.
///
/// Skips leading ASCII whitespace, accepts one optional sign, then consumes
/// digits until the first non-digit.  Yields 0 when no digits are present
/// and saturates at the `i32` bounds.  So `"abc"` is 0, `"3x"` is 3 and
/// `" -2"` is -2.
pub fn parse_decimal_lenient(bytes: &[u8]) -> i32 {
    let mut rest = bytes;
    while let [b, tail @ ..] = rest {
        if b.is_ascii_whitespace() || *b == 0x0B {
            rest = tail;
        } else {
            break;
        }
    }

    let negative = match rest {
        [b'-', tail @ ..] => {
            rest = tail;
            true
        }
        [b'+', tail @ ..] => {
            rest = tail;
            false
        }
        _ => false,
    };

    let mut value: i64 = 0;
    for &b in rest.iter().take_while(|b| b.is_ascii_digit()) {
        value = (value * 10 + i64::from(b - b'0')).min(i64::from(i32::MAX) + 1);
    }
    if negative {
        value = -value;
    }
    value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}
