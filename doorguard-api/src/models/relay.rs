use serde::{Deserialize, Serialize};

/// Body of `GET /status` on a relay device.
///
/// Only the relay channels are modelled, every other field the device
/// reports is ignored on decode.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelayStatus {
    pub relays: Vec<RelayEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unixtime: Option<i64>,
}

impl RelayStatus {
    /// State of channel 0, the only channel a contact is wired to.
    pub fn primary(&self) -> Option<&RelayEntry> {
        self.relays.first()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayEntry {
    /// Relay energized; an open contact in this system
    pub ison: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Turn {
    On,
    Off,
    Toggle,
}

impl Turn {
    pub fn as_str(&self) -> &'static str {
        match self {
            Turn::On => "on",
            Turn::Off => "off",
            Turn::Toggle => "toggle",
        }
    }

    /// Resolve the command against the current relay state.
    pub fn apply(&self, current: bool) -> bool {
        match self {
            Turn::On => true,
            Turn::Off => false,
            Turn::Toggle => !current,
        }
    }
}

impl From<bool> for Turn {
    fn from(on: bool) -> Self {
        if on { Turn::On } else { Turn::Off }
    }
}

/// Query string of `GET /relay/0`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TurnQuery {
    pub turn: Turn,
}
