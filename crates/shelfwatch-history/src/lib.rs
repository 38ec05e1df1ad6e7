pub mod drive;
pub mod error;
pub mod local;
pub mod reconcile;
pub(crate) mod retry;
pub mod store;
pub mod sync;
pub mod table;

pub use drive::DriveStore;
pub use error::HistoryError;
pub use local::LocalDirStore;
pub use reconcile::{reconcile, ReconcileStats, Reconciled};
pub use store::{FileHandle, HistoryStore};
pub use sync::{sync_history, SyncReport};
pub use table::{decode_history_bytes, parse_csv, read_history, Table, HISTORY_COLUMNS};
