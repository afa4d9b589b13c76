//! 奖励分配领域层

pub mod entity;
pub mod repository;
pub mod service;

pub use entity::*;
pub use repository::*;
pub use service::*;
