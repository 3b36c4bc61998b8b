pub mod monitor_rule;
pub mod virtual_workspace;
pub mod workspace_name;

pub use monitor_rule::MonitorDescription;
pub use virtual_workspace::{VirtualWorkspace, VirtualWorkspaceId, VirtualWorkspaceManager};
pub use workspace_name::WorkspaceName;
