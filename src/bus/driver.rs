//! Abstraction over a CAN transport. Allows the bus to plug into various
//! controllers (on-chip TWAI, SPI-attached MCP2515, test doubles) without
//! assuming which; concrete drivers live with the embedding application.
use crate::bus::frame::RawCanFrame;
use crate::core::BaudRate;

/// Contract the bus depends on to install a transport and exchange frames.
///
/// `receive` is a non-blocking poll; push-based controllers are expected to
/// feed their interrupt traffic into a bounded queue behind it, with a
/// documented drop-oldest or drop-newest policy when the queue is full.
/// `send` must use a bounded wait when the transmit queue backs up, so a
/// stalled bus cannot hang the caller forever.
pub trait CanDriver {
    type Error: core::fmt::Debug;

    /// Bring the controller up at the requested bit rate.
    fn install(&mut self, baud_rate: BaudRate) -> Result<(), Self::Error>;

    /// Tear the controller down. Called by the bus on drop.
    fn uninstall(&mut self);

    /// Queue one frame for transmission.
    fn send(&mut self, frame: &RawCanFrame) -> Result<(), Self::Error>;

    /// Retrieve the next pending received frame, `None` when the queue is
    /// empty. Must never block.
    fn receive(&mut self) -> Option<RawCanFrame>;

    /// Drop any frames still waiting for transmission.
    fn clear_transmit_queue(&mut self) {}

    /// Drop any received frames not yet polled.
    fn clear_receive_queue(&mut self) {}
}
