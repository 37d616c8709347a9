//! One side of a module's attachment to a neighbor.

use super::layout::{BUS_SIZE, BusMessage, ModuleKind};

/// A live link to one neighbor.
///
/// Reads come from the buffer the neighbor delivered last frame; writes go to
/// the buffer the neighbor will read next frame. Out-of-range regions are
/// truncated rather than rejected.
pub trait ExpanderPeer {
    /// Declared identity of the neighbor.
    fn kind(&self) -> ModuleKind;

    /// Read `len` floats starting at `offset` from the neighbor's message.
    fn read_region(&self, offset: usize, len: usize) -> &[f32];

    /// Write `data` starting at `offset` into the message for the neighbor.
    fn write_region(&mut self, offset: usize, data: &[f32]);

    /// Mark the outgoing message as complete for this frame.
    fn request_flip(&mut self);
}

/// Double-buffered attachment point.
///
/// `producer` is owned by this module and written during its frame.
/// `consumer` holds what the neighbor produced. The host swaps a producer
/// into the neighbor's consumer after the frame when a flip was requested.
#[derive(Clone, Debug, Default)]
pub struct ExpanderPort {
    peer: Option<ModuleKind>,
    producer: BusMessage,
    consumer: BusMessage,
    flip_requested: bool,
}

impl ExpanderPort {
    /// An unattached port.
    pub fn new() -> Self {
        Self::default()
    }

    /// Kind of the attached neighbor, if any.
    pub fn peer_kind(&self) -> Option<ModuleKind> {
        self.peer
    }

    /// The link to the neighbor, when one is attached.
    pub fn peer(&mut self) -> Option<&mut dyn ExpanderPeer> {
        if self.peer.is_some() {
            Some(self)
        } else {
            None
        }
    }

    /// Attach or detach a neighbor. Changing neighbors drops whatever the old
    /// one delivered so it cannot leak into the new link.
    pub fn set_peer(&mut self, peer: Option<ModuleKind>) {
        if self.peer != peer {
            self.peer = peer;
            self.consumer.clear();
            self.producer.clear();
            self.flip_requested = false;
        }
    }

    /// Last message delivered by the neighbor.
    pub fn consumer(&self) -> &BusMessage {
        &self.consumer
    }

    /// Message being written for the neighbor.
    pub fn producer(&self) -> &BusMessage {
        &self.producer
    }

    /// Mutable access to the outgoing message.
    pub fn producer_mut(&mut self) -> &mut BusMessage {
        &mut self.producer
    }

    /// Whether a flip is pending.
    pub fn flip_requested(&self) -> bool {
        self.flip_requested
    }

    /// Host side: hand `from`'s producer to `to`'s consumer.
    ///
    /// The buffers are swapped, not copied; the writer zero-fills before its
    /// next write so the stale half it gets back is never observed.
    pub fn deliver(from: &mut ExpanderPort, to: &mut ExpanderPort) {
        if from.flip_requested {
            core::mem::swap(&mut from.producer, &mut to.consumer);
            from.flip_requested = false;
        }
    }
}

impl ExpanderPeer for ExpanderPort {
    fn kind(&self) -> ModuleKind {
        self.peer.unwrap_or(ModuleKind::Foreign)
    }

    fn read_region(&self, offset: usize, len: usize) -> &[f32] {
        let start = offset.min(BUS_SIZE);
        let end = offset.saturating_add(len).min(BUS_SIZE);
        &self.consumer.as_slice()[start..end]
    }

    fn write_region(&mut self, offset: usize, data: &[f32]) {
        let start = offset.min(BUS_SIZE);
        let end = offset.saturating_add(data.len()).min(BUS_SIZE);
        let n = end - start;
        self.producer.as_mut_slice()[start..end].copy_from_slice(&data[..n]);
    }

    fn request_flip(&mut self) {
        self.flip_requested = true;
    }
}
