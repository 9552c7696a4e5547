//! Test doubles to simulate the CAN transport during integration tests.
use std::collections::VecDeque;

use can_telem::bus::driver::CanDriver;
use can_telem::bus::frame::RawCanFrame;
use can_telem::core::BaudRate;

#[derive(Default)]
/// In-memory CAN driver reproducing the `CanDriver` trait behavior: sent
/// frames accumulate for inspection, received frames are injected up front.
pub struct LoopbackDriver {
    pub installed: Option<BaudRate>,
    pub uninstalled: bool,
    pub sent: Vec<RawCanFrame>,
    pub rx_queue: VecDeque<RawCanFrame>,
}

#[allow(dead_code)]
impl LoopbackDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a frame as if it had arrived from the wire.
    pub fn inject(&mut self, frame: RawCanFrame) {
        self.rx_queue.push_back(frame);
    }
}

impl CanDriver for LoopbackDriver {
    type Error = ();

    fn install(&mut self, baud_rate: BaudRate) -> Result<(), Self::Error> {
        self.installed = Some(baud_rate);
        Ok(())
    }

    fn uninstall(&mut self) {
        self.uninstalled = true;
    }

    fn send(&mut self, frame: &RawCanFrame) -> Result<(), Self::Error> {
        self.sent.push(*frame);
        Ok(())
    }

    fn receive(&mut self) -> Option<RawCanFrame> {
        self.rx_queue.pop_front()
    }

    fn clear_receive_queue(&mut self) {
        self.rx_queue.clear();
    }
}
