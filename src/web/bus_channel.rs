//! Defines the messages between the web handlers and the task that owns the bus.

use crate::bus::{BusError, Message, VirtualBus};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

/// Represents a request sent from a web handler to the bus task.
#[derive(Debug)]
pub enum BusRequest {
    /// Run a combined transfer. The messages come back with read buffers filled.
    Transfer {
        messages: Vec<Message>,
        /// The channel to send the response back on.
        respond_to: oneshot::Sender<Result<Vec<Message>, BusError>>,
    },
    /// List the attached slave addresses.
    ListDevices {
        respond_to: oneshot::Sender<Vec<u8>>,
    },
}

/// Moves `bus` into a background task that serves requests until every
/// sender is dropped.
pub fn spawn_bus_task(mut bus: VirtualBus) -> (mpsc::Sender<BusRequest>, JoinHandle<VirtualBus>) {
    let (bus_tx, mut bus_rx) = mpsc::channel::<BusRequest>(16);
    let task = tokio::spawn(async move {
        while let Some(request) = bus_rx.recv().await {
            match request {
                BusRequest::Transfer {
                    mut messages,
                    respond_to,
                } => {
                    let result = bus.transfer(&mut messages).map(|_| messages);
                    let _ = respond_to.send(result);
                }
                BusRequest::ListDevices { respond_to } => {
                    let _ = respond_to.send(bus.addresses());
                }
            }
        }
        tracing::debug!("Bus task finished");
        bus
    });
    (bus_tx, task)
}
