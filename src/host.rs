//! Headless host: a document with a single mount point running checkers,
//! driven by commands from the bus.

use bus::{HostCommand, HostEvent};
use checkers::Game;
use clap::ValueEnum;
use dom::serialize::outer_html;
use dom::snapshot::{DomSnapshot, DomSnapshotOptions, NodeRef};
use dom::{Document, dispatch_event};
use runtime::{Runtime, RuntimeConfig, RuntimeError};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::mpsc::{Receiver, Sender};

pub const MOUNT_ID: &str = "root";

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Html,
    Outline,
}

pub struct Host {
    document: Rc<RefCell<Document>>,
    runtime: Runtime<Game>,
    format: Format,
}

impl Host {
    pub fn new(config: RuntimeConfig, format: Format) -> Result<Self, RuntimeError> {
        Self::with_game(Game::new(), config, format)
    }

    pub fn with_game(game: Game, config: RuntimeConfig, format: Format) -> Result<Self, RuntimeError> {
        let document = Rc::new(RefCell::new(page()?));
        let runtime = checkers::mount(Rc::clone(&document), MOUNT_ID, game, config)?;
        let initial = document.borrow_mut().take_mutations().len();
        log::debug!("mounted with {initial} mutation records");
        Ok(Self {
            document,
            runtime,
            format,
        })
    }

    /// Process commands until `Shutdown` or until every sender is gone.
    pub fn run(&self, commands: &Receiver<HostCommand>, events: &Sender<HostEvent>) {
        while let Ok(command) = commands.recv() {
            if command == HostCommand::Shutdown {
                break;
            }
            let event = self.handle(&command);
            if events.send(event).is_err() {
                log::warn!("host output closed; stopping");
                return;
            }
        }
        let _ = events.send(HostEvent::Stopped {
            render: self.runtime.render_count(),
        });
    }

    pub fn handle(&self, command: &HostCommand) -> HostEvent {
        if let Some((target, event_type)) = command.event() {
            return self.fire(target, event_type);
        }
        HostEvent::Snapshot {
            render: self.runtime.render_count(),
            html: self.render(),
        }
    }

    fn fire(&self, target: &str, event_type: &str) -> HostEvent {
        let node = self.document.borrow().get_element_by_id(target);
        let Some(node) = node else {
            return HostEvent::Rejected {
                target: target.to_string(),
                reason: "no element with this id".to_string(),
            };
        };
        match dispatch_event(&self.document, node, event_type) {
            Ok(listeners) => HostEvent::Delivered {
                target: target.to_string(),
                event_type: event_type.to_string(),
                listeners,
                // Nothing observes the records; keep the log from growing.
                mutations: self.document.borrow_mut().take_mutations().len(),
                render: self.runtime.render_count(),
            },
            Err(err) => HostEvent::Rejected {
                target: target.to_string(),
                reason: err.to_string(),
            },
        }
    }

    /// The mount element in the configured format.
    pub fn render(&self) -> String {
        let doc = self.document.borrow();
        let mount = self.runtime.mount_node();
        match self.format {
            Format::Html => outer_html(&doc, mount),
            Format::Outline => {
                DomSnapshot::new(NodeRef::new(&doc, mount), DomSnapshotOptions::default())
                    .render()
            }
        }
    }

    pub fn game(&self) -> Game {
        self.runtime.state().clone()
    }
}

/// `<html><body><div id="root"></div></body></html>`
fn page() -> Result<Document, RuntimeError> {
    let mut doc = Document::new();
    let html = doc.create_element("html");
    let body = doc.create_element("body");
    let mount = doc.create_element("div");
    doc.set_attribute(mount, "id", MOUNT_ID)?;
    let root = doc.root();
    doc.append_child(root, html)?;
    doc.append_child(html, body)?;
    doc.append_child(body, mount)?;
    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bus::Bus;
    use checkers::{Piece, Player, Pos};

    fn host(format: Format) -> Host {
        Host::new(RuntimeConfig::default(), format).unwrap()
    }

    #[test]
    fn clicks_move_a_piece() {
        let host = host(Format::Html);
        let bus = Bus::new();
        for square in ["5-2", "4-3"] {
            bus.cmd_tx.send(HostCommand::click(square)).unwrap();
        }
        bus.cmd_tx.send(HostCommand::Shutdown).unwrap();
        host.run(&bus.cmd_rx, &bus.evt_tx);

        let events: Vec<_> = bus.evt_rx.try_iter().collect();
        assert_eq!(events.len(), 3);
        assert!(matches!(
            &events[1],
            HostEvent::Delivered { target, listeners: 1, render: 3, .. } if target == "4-3"
        ));
        assert_eq!(events[2], HostEvent::Stopped { render: 3 });

        let game = host.game();
        let to: Pos = "4-3".parse().unwrap();
        assert_eq!(game.piece(to), Some(Piece::man(Player::One)));
        assert_eq!(game.turn, Player::Two);
    }

    #[test]
    fn repeated_clicks_leave_no_pending_mutations() {
        let host = host(Format::Html);
        assert!(host.document.borrow().mutations().is_empty());
        let mut drained = 0;
        for _ in 0..200 {
            let event = host.handle(&HostCommand::click("5-2"));
            let HostEvent::Delivered { mutations, .. } = event else {
                panic!("expected delivery, got {event:?}");
            };
            drained += mutations;
            assert!(host.document.borrow().mutations().is_empty());
        }
        // Selecting and deselecting the piece rewrites its marker class.
        assert!(drained > 0);
        assert_eq!(host.runtime.render_count(), 201);
    }

    #[test]
    fn unknown_square_is_rejected() {
        let host = host(Format::Html);
        let event = host.handle(&HostCommand::click("9-9"));
        assert!(matches!(event, HostEvent::Rejected { target, .. } if target == "9-9"));
        assert_eq!(host.game(), Game::new());
    }

    #[test]
    fn html_snapshot_contains_board() {
        let host = host(Format::Html);
        let HostEvent::Snapshot { render, html } = host.handle(&HostCommand::Snapshot) else {
            panic!("expected snapshot");
        };
        assert_eq!(render, 1);
        assert!(html.starts_with("<div id=\"root\"><div class=\"app\"><div class=\"board\">"));
        assert!(html.contains("<div id=\"5-0\" class=\"square black\"><div class=\"circle player-one\"></div></div>"));
        assert!(html.contains("Player one to move"));
    }

    #[test]
    fn outline_snapshot_is_indented() {
        let host = host(Format::Outline);
        let outline = host.render();
        let mut lines = outline.lines();
        assert_eq!(lines.next(), Some("<div id=\"root\">"));
        assert_eq!(lines.next(), Some("  <div class=\"app\">"));
        assert_eq!(lines.next(), Some("    <div class=\"board\">"));
    }
}
