//! Deferred flush scheduling.
//!
//! A [`FrameQueue`] holds single-shot flush tickets until the next frame
//! boundary. Hosts drive frames either by calling
//! [`RealmStore::flush_frame`](crate::RealmStore::flush_frame) from their own
//! loop or by spawning a [`FrameDriver`].

mod driver;

pub use driver::{FrameDriver, SharedRealmStore, spawn_frame_driver};

use crate::core::FlushTicket;
use std::collections::VecDeque;
use std::time::Duration;

/// One frame at 60 FPS.
pub const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_micros(16_667);

#[derive(Debug, Default)]
pub struct FrameQueue {
    tickets: VecDeque<FlushTicket>,
    frames: u64,
}

impl FrameQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a ticket to run at the next frame.
    pub fn request(&mut self, ticket: FlushTicket) {
        self.tickets.push_back(ticket);
    }

    /// Take every ticket registered so far. Tickets requested after this call
    /// belong to the following frame.
    pub fn take_frame(&mut self) -> Vec<FlushTicket> {
        self.frames += 1;
        self.tickets.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.tickets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickets.is_empty()
    }

    /// Frames taken so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }
}
