//! Expander bus: the fixed-layout message shared between adjacent modules.
//!
//! Two pieces:
//!
//! - [`layout`]: where every module kind's data lives in a message, with typed
//!   accessors for each region.
//! - [`port`]: the double-buffered attachment point and the [`ExpanderPeer`]
//!   capability a module uses to talk to its neighbor.

pub mod layout;
pub mod port;

pub use layout::{
    BUS_SIZE, BusMessage, BusRegion, ENGINE_REGION, ENGINE_TRACK_STRIDE, EngineLayout,
    EngineTrackState, ModuleKind, PROBABILITY_REGION, PROBABILITY_TABLE, ROTATION_REGION,
    RegionLayout, RotationTable, STEP_TABLE_LEN, SWING_REGION, SWING_TABLE, StepTable,
};
pub use port::{ExpanderPeer, ExpanderPort};
