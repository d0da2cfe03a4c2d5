pub mod core;
pub mod exports;
pub mod imports;
pub mod reports;
pub mod scores;
pub mod students;

use crate::ipc::error::err;
use crate::ipc::types::AppState;
use crate::store::Store;

/// Everything except `health` and `workspace.select` needs an open store.
pub(crate) fn require_store<'a>(
    state: &'a AppState,
    id: &str,
) -> Result<&'a Store, serde_json::Value> {
    state
        .store
        .as_ref()
        .ok_or_else(|| err(id, "no_workspace", "no workspace selected", None))
}
