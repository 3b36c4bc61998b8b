pub mod engine;
pub mod graph;
pub mod niri;
pub mod resize;
pub mod utils;

pub use engine::{EventResponse, LayoutCommand, LayoutEngine, LayoutEvent};
pub use graph::{Direction, Orientation};
pub use niri::{
    ColumnWidth, NiriLayoutEngine, NodeId, ViewOffset, ViewportState, Visibility,
    WindowConstraints, WindowPlacement,
};
pub use resize::SizeChange;

pub use crate::model::virtual_workspace::{VirtualWorkspaceId, VirtualWorkspaceManager};
