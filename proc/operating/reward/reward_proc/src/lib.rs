//! 奖励分配批处理进程
//!
//! 加载账本快照 → 运行分配引擎的批处理任务 → 输出运行报告并按需写回快照

pub mod proc;
