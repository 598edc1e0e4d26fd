pub mod config_store;
pub mod copy;
pub mod workspace_sync;

pub use config_store::{ConfigStore, DEFAULT_CONFIG_FILE};
pub use copy::copy_path_filtered;
pub use workspace_sync::{remap_destination, SyncSummary, WorkspaceSynchronizer, CNAME_FILE};
