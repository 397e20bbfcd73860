pub mod classify;
pub mod dedupe;
pub mod error;
pub mod execute;
pub mod fsops;
pub mod metadata;
pub mod model;
pub mod plan;
pub mod scan;
pub mod undo;

pub use classify::{category_for_extension, folder_name_for, Criterion, DateFormat};
pub use dedupe::identify_duplicates;
pub use error::ConfigError;
pub use execute::execute_plan;
pub use metadata::{MediaCapabilities, MetadataProvider, NullMetadataProvider};
pub use model::{
    DuplicateState, ExecutionOutcome, FileRecord, FolderNode, NamingOptions, OperationKind,
    OrganizationConfig, Plan, PlanEntry, UndoAction, UndoOutcome,
};
pub use plan::{build_plan, preview_tree};
pub use scan::{scan_directory, ScanDepth, ScanOptions, ScanOutput};
pub use undo::undo_actions;
