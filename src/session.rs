//! Communication session management
//!
//! This module defines the trait for tunneling notifications from the room
//! to connected clients. The tunnel abstraction allows for different
//! communication mechanisms while maintaining a consistent interface.

use super::game::UpdateMessage;

/// Trait for sending notifications through a communication tunnel
///
/// This trait abstracts the communication mechanism used to deliver
/// notifications to connected clients. Implementations might use
/// WebSockets, Server-Sent Events, or other real-time protocols. Delivery
/// is fire-and-forget; the room never waits for acknowledgment.
pub trait Tunnel {
    /// Sends a notification to the client
    ///
    /// # Arguments
    ///
    /// * `message` - The notification to send
    fn send_message(&self, message: &UpdateMessage);
}
