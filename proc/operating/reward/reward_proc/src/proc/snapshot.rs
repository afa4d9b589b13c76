//! 账本快照读写
//!
//! 快照为 JSON 格式的 `LedgerSnapshot`，读入后装载成内存仓储；
//! 写回时先写临时文件再改名，避免留下半截快照。

use std::path::Path;

use reward::{InMemoryStore, LedgerSnapshot};
use tracing::info;

use crate::proc::error::Result;

/// 读取快照并装载为内存仓储
pub fn load_store(path: &Path) -> Result<InMemoryStore> {
    let content = std::fs::read_to_string(path)?;
    let snapshot: LedgerSnapshot = serde_json::from_str(&content)?;
    let store = InMemoryStore::new(snapshot.into_tables()?);
    info!(
        path = %path.display(),
        locations = store.state().locations().count(),
        "账本快照已加载"
    );
    Ok(store)
}

/// 把内存仓储写回快照文件
pub fn save_store(path: &Path, store: &InMemoryStore) -> Result<()> {
    let snapshot = LedgerSnapshot::from_tables(store.state());
    let json = serde_json::to_string_pretty(&snapshot)?;

    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json)?;
    std::fs::rename(&tmp, path)?;
    info!(path = %path.display(), rewards = snapshot.rewards.len(), "账本快照已写回");
    Ok(())
}
