use crate::common::Slot;
use crate::protocol::ServerMessage;
use crate::session::SessionRegistry;

/// Queue `batch` for every seated session, in order.
///
/// Returns the seats whose connection is gone so the caller can run them
/// through the departure path. A dead seat never stops delivery to the rest.
pub fn fan_out(registry: &SessionRegistry, batch: &[ServerMessage]) -> Vec<Slot> {
    let mut dead = Vec::new();
    for session in registry.list_active() {
        let delivered = batch
            .iter()
            .try_for_each(|msg| session.deliver(msg.clone()));
        if delivered.is_err() {
            log::warn!("delivery to {} failed, dropping session", session.slot());
            dead.push(session.slot());
        }
    }
    dead
}
