/// 仓储错误类型
///
/// 所有仓储实现共用；事务闭包返回任一错误都会导致整个事务回滚
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepoError {
    /// 记录未找到
    #[error("记录未找到: {0}")]
    NotFound(String),
    /// 记录已存在
    #[error("记录已存在: {0}")]
    AlreadyExists(String),
    /// 写入会破坏实体不变量（如 current > current_max）
    #[error("不变量被破坏: {0}")]
    InvariantViolation(String),
    /// 底层存储写入失败
    #[error("存储写入失败: {0}")]
    WriteFailed(String),
    /// 序列化失败
    #[error("序列化失败: {0}")]
    SerializationFailed(String),
    /// 反序列化失败
    #[error("反序列化失败: {0}")]
    DeserializationFailed(String),
}

impl RepoError {
    pub fn not_found(what: impl std::fmt::Display) -> Self { Self::NotFound(what.to_string()) }

    pub fn invariant(what: impl Into<String>) -> Self { Self::InvariantViolation(what.into()) }
}

/// 事务边界
///
/// 闭包内的所有写入要么全部生效，要么在闭包返回 `Err` 时全部丢弃。
/// 嵌套调用并入最外层事务。
pub trait Transactional: Sized {
    fn run_in_transaction<T, F>(&mut self, f: F) -> Result<T, RepoError>
    where
        F: FnOnce(&mut Self) -> Result<T, RepoError>;
}
