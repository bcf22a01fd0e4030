use std::sync::mpsc::{self, Receiver, Sender};

/// Input for the headless host, in the order it should be applied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HostCommand {
    // Native events fired on the element with this `id`
    Click { target: String },
    Fire { target: String, event_type: String },
    // Output
    Snapshot,
    Shutdown,
}

impl HostCommand {
    pub fn click(target: impl Into<String>) -> Self {
        HostCommand::Click {
            target: target.into(),
        }
    }

    /// Element id and event type for commands that fire a native event.
    pub fn event(&self) -> Option<(&str, &str)> {
        match self {
            HostCommand::Click { target } => Some((target.as_str(), "click")),
            HostCommand::Fire { target, event_type } => {
                Some((target.as_str(), event_type.as_str()))
            }
            HostCommand::Snapshot | HostCommand::Shutdown => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HostEvent {
    // Host -> driver
    Delivered {
        target: String,
        event_type: String,
        listeners: usize,
        // DOM mutation records drained after delivery
        mutations: usize,
        render: u64,
    },
    Rejected {
        target: String,
        reason: String,
    },
    Snapshot {
        render: u64,
        html: String,
    },
    Stopped {
        render: u64,
    },
}

pub struct Bus {
    pub cmd_tx: Sender<HostCommand>,
    pub cmd_rx: Receiver<HostCommand>,
    pub evt_tx: Sender<HostEvent>, // shareable for command producers
    pub evt_rx: Receiver<HostEvent>,
}

impl Bus {
    pub fn new() -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (evt_tx, evt_rx) = mpsc::channel();
        Self {
            cmd_tx,
            cmd_rx,
            evt_tx,
            evt_rx,
        }
    }
}

impl Default for Bus {
    fn default() -> Self {
        Self::new()
    }
}
