// src/header.rs
use std::fmt;

use ethers::types::Address;
use ethers::utils::to_checksum;

/// Offsets below this count as being at the top of the page.
pub const AT_TOP_THRESHOLD: f64 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollState {
    AtTop,
    ScrollingUp,
    ScrollingDown,
}

impl fmt::Display for ScrollState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::AtTop => "at-top",
            Self::ScrollingUp => "scrolling-up",
            Self::ScrollingDown => "scrolling-down",
        })
    }
}

#[derive(Debug, Clone)]
pub struct ScrollTracker {
    previous: f64,
}

impl ScrollTracker {
    pub fn new(initial_offset: f64) -> Self {
        Self {
            previous: initial_offset,
        }
    }

    pub fn observe(&mut self, offset: f64) -> ScrollState {
        let direction = if self.previous < offset {
            ScrollState::ScrollingDown
        } else {
            ScrollState::ScrollingUp
        };
        self.previous = offset;

        if offset < AT_TOP_THRESHOLD {
            ScrollState::AtTop
        } else {
            direction
        }
    }
}

/// Page header state. Only a ghost header follows scrolling; a solid one keeps
/// the state computed at mount.
#[derive(Debug, Clone)]
pub struct Header {
    ghost: bool,
    tracker: ScrollTracker,
    state: ScrollState,
}

impl Header {
    pub fn new(ghost: bool, initial_offset: f64) -> Self {
        let mut tracker = ScrollTracker::new(initial_offset);
        let state = tracker.observe(initial_offset);
        Self {
            ghost,
            tracker,
            state,
        }
    }

    pub fn on_scroll(&mut self, offset: f64) -> ScrollState {
        if self.ghost {
            self.state = self.tracker.observe(offset);
        }
        self.state
    }

    pub fn scroll_state(&self) -> ScrollState {
        self.state
    }
}

/// Text of the header's wallet button.
pub fn wallet_label(account: Option<Address>, connecting: bool) -> String {
    match account {
        Some(address) => {
            let address = to_checksum(&address, None);
            format!("{}...{}", &address[..5], &address[address.len() - 4..])
        }
        None if connecting => "Loading..".to_string(),
        None => "Connect your wallet".to_string(),
    }
}
