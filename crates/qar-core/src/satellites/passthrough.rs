//! Identity satellite.

use super::{EngineView, Satellite};
use crate::bus::ModuleKind;

/// Forwards both directions and contributes nothing.
///
/// Useful as a spacer: inserting one between two modules changes no value
/// either side observes, only adds a frame of latency.
#[derive(Clone, Debug, Default)]
pub struct PassthroughExpander {
    view: EngineView,
}

impl PassthroughExpander {
    /// A new spacer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Last engine layout seen.
    pub fn engine_view(&self) -> &EngineView {
        &self.view
    }
}

impl Satellite for PassthroughExpander {
    const KIND: ModuleKind = ModuleKind::PassthroughExpander;

    fn write_toward_engine(&self, _msg: &mut [f32]) {}

    fn engine_view_mut(&mut self) -> &mut EngineView {
        &mut self.view
    }
}

impl_rack_module!(PassthroughExpander);
