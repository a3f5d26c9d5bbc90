//! Channel-backed collaborator handles
//!
//! A [`Link`] hands commands to the task that owns a transport (USB panel driver,
//! switcher protocol client) over an unbounded channel. Sends never block and
//! never wait for a response.

use anyhow::Result;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::panel::{Panel, PanelCommand};
use crate::switcher::{Switcher, SwitcherCommand};

/// Errors raised by a collaborator link
#[derive(Debug, Error)]
pub enum LinkError {
    #[error("{0} link closed")]
    Closed(&'static str),
}

/// Sending half of a collaborator link
#[derive(Debug)]
pub struct Link<T> {
    name: &'static str,
    tx: mpsc::UnboundedSender<T>,
}

impl<T> Link<T> {
    /// Create a link and the receiver the transport task drains
    pub fn channel(name: &'static str) -> (Self, mpsc::UnboundedReceiver<T>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { name, tx }, rx)
    }

    fn push(&self, item: T) -> Result<(), LinkError> {
        self.tx.send(item).map_err(|_| LinkError::Closed(self.name))
    }
}

impl Panel for Link<PanelCommand> {
    fn send(&mut self, command: PanelCommand) -> Result<()> {
        self.push(command)?;
        Ok(())
    }
}

impl Switcher for Link<SwitcherCommand> {
    fn send(&mut self, command: SwitcherCommand) -> Result<()> {
        self.push(command)?;
        Ok(())
    }
}
