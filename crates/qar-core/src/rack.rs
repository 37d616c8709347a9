//! Minimal host harness: an ordered row of modules sharing expander links.
//!
//! The rack plays the part of the modular host. It keeps modules in slot
//! order, tells every module who its neighbors are, calls each module once
//! per frame from left to right, and after the frame hands every requested
//! producer buffer to the neighbor that reads it.
//!
//! Modules are added and removed on the setup path only; [`Rack::process_frame`]
//! does not allocate.
//!
//! ```rust
//! use qar_core::{PassthroughExpander, Rack, RhythmEngine};
//!
//! let mut rack = Rack::new(48000.0);
//! let engine = rack.push(Box::new(RhythmEngine::new()));
//! rack.push(Box::new(PassthroughExpander::new()));
//!
//! rack.process_frame();
//! assert!(rack.module::<RhythmEngine>(engine).is_some());
//! ```

#[cfg(not(feature = "std"))]
use alloc::{boxed::Box, vec::Vec};
use core::any::Any;

use crate::bus::{ExpanderPort, ModuleKind};

/// Per-frame timing handed to every module.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProcessContext {
    /// Frames per second.
    pub sample_rate: f32,
    /// Seconds per frame.
    pub sample_time: f32,
}

impl ProcessContext {
    /// Context for a sample rate. Non-positive rates fall back to 48 kHz.
    pub fn new(sample_rate: f32) -> Self {
        let sample_rate = if sample_rate > 0.0 { sample_rate } else { 48000.0 };
        Self {
            sample_rate,
            sample_time: 1.0 / sample_rate,
        }
    }
}

/// Left and right attachment points of one module.
#[derive(Clone, Debug, Default)]
pub struct ExpanderPorts {
    /// Link to the module on the left.
    pub left: ExpanderPort,
    /// Link to the module on the right.
    pub right: ExpanderPort,
}

/// A module the rack can host.
pub trait RackModule: Any {
    /// Identity declared to neighbors.
    fn kind(&self) -> ModuleKind;

    /// Process one frame.
    fn process(&mut self, ctx: &ProcessContext, ports: &mut ExpanderPorts);

    /// Upcast for typed access.
    fn as_any(&self) -> &dyn Any;

    /// Upcast for typed mutable access.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

struct Slot {
    module: Box<dyn RackModule>,
    ports: ExpanderPorts,
}

/// An ordered row of modules.
pub struct Rack {
    slots: Vec<Slot>,
    ctx: ProcessContext,
    frame: u64,
}

impl Rack {
    /// Create an empty rack.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            slots: Vec::new(),
            ctx: ProcessContext::new(sample_rate),
            frame: 0,
        }
    }

    /// Append a module at the right end. Returns its slot.
    pub fn push(&mut self, module: Box<dyn RackModule>) -> usize {
        let slot = self.slots.len();
        self.insert(slot, module);
        slot
    }

    /// Insert a module at `slot`, shifting everything right of it.
    /// Out-of-range slots append.
    pub fn insert(&mut self, slot: usize, module: Box<dyn RackModule>) {
        let slot = slot.min(self.slots.len());
        #[cfg(feature = "tracing")]
        tracing::debug!("rack_insert: {} at slot {slot}", module.kind().name());
        self.slots.insert(
            slot,
            Slot {
                module,
                ports: ExpanderPorts::default(),
            },
        );
        self.relink();
    }

    /// Remove the module at `slot`.
    pub fn remove(&mut self, slot: usize) -> Option<Box<dyn RackModule>> {
        if slot >= self.slots.len() {
            return None;
        }
        let removed = self.slots.remove(slot);
        #[cfg(feature = "tracing")]
        tracing::debug!("rack_remove: {} from slot {slot}", removed.module.kind().name());
        self.relink();
        Some(removed.module)
    }

    /// Refresh every port's neighbor identity.
    fn relink(&mut self) {
        let kinds: Vec<ModuleKind> = self.slots.iter().map(|s| s.module.kind()).collect();
        for (i, slot) in self.slots.iter_mut().enumerate() {
            let left = i.checked_sub(1).map(|j| kinds[j]);
            let right = kinds.get(i + 1).copied();
            slot.ports.left.set_peer(left);
            slot.ports.right.set_peer(right);
        }
    }

    /// Number of modules.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the rack is empty.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Kind of the module at `slot`.
    pub fn kind_at(&self, slot: usize) -> Option<ModuleKind> {
        self.slots.get(slot).map(|s| s.module.kind())
    }

    /// Typed access to a module.
    pub fn module<T: RackModule>(&self, slot: usize) -> Option<&T> {
        self.slots.get(slot)?.module.as_any().downcast_ref::<T>()
    }

    /// Typed mutable access to a module.
    pub fn module_mut<T: RackModule>(&mut self, slot: usize) -> Option<&mut T> {
        self.slots.get_mut(slot)?.module.as_any_mut().downcast_mut::<T>()
    }

    /// Ports of the module at `slot`.
    pub fn ports(&self, slot: usize) -> Option<&ExpanderPorts> {
        self.slots.get(slot).map(|s| &s.ports)
    }

    /// Timing context.
    pub fn context(&self) -> ProcessContext {
        self.ctx
    }

    /// Frames processed so far.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Run every module for one frame, then deliver flipped buffers.
    pub fn process_frame(&mut self) {
        let ctx = self.ctx;
        for slot in &mut self.slots {
            slot.module.process(&ctx, &mut slot.ports);
        }
        for i in 1..self.slots.len() {
            let (left, right) = self.slots.split_at_mut(i);
            let a = &mut left[i - 1].ports;
            let b = &mut right[0].ports;
            ExpanderPort::deliver(&mut a.right, &mut b.left);
            ExpanderPort::deliver(&mut b.left, &mut a.right);
        }
        self.frame += 1;
    }

    /// Run `frames` frames.
    pub fn run(&mut self, frames: usize) {
        for _ in 0..frames {
            self.process_frame();
        }
    }
}
