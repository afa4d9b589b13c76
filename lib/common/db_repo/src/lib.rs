pub mod adapter;
pub mod core;

// 导出核心仓储接口
pub use core::db_repo::{RepoError, Transactional};

// 导出适配器实现
pub use adapter::mem_repo::MemRepo;
