//! 推荐关系与区域聚合

use base_types::{Amount, UserId};

/// 推荐关系
///
/// `ancestors` 为从根到直接推荐人的祖先序列（最近的在末尾），
/// 等价于以 "D" 分隔的推荐码路径。
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UserRecommend {
    /// 用户ID
    pub user_id: UserId,
    /// 祖先链（根在前）
    pub ancestors: Vec<UserId>,
}

impl UserRecommend {
    pub fn new(user_id: UserId, ancestors: Vec<UserId>) -> Self { Self { user_id, ancestors } }

    /// 根用户（无推荐人）
    pub fn root(user_id: UserId) -> Self { Self { user_id, ancestors: Vec::new() } }

    /// 物化路径：祖先链 + 自身
    pub fn path(&self) -> Vec<UserId> {
        let mut path = Vec::with_capacity(self.ancestors.len() + 1);
        path.extend_from_slice(&self.ancestors);
        path.push(self.user_id);
        path
    }

    /// 第 `level` 层上级（0 = 直接推荐人）
    pub fn ancestor_at(&self, level: usize) -> Option<UserId> {
        let len = self.ancestors.len();
        if level >= len {
            return None;
        }
        self.ancestors.get(len - 1 - level).copied()
    }

    /// 直接推荐人
    #[inline]
    pub fn sponsor(&self) -> Option<UserId> { self.ancestors.last().copied() }

    /// 由近到远遍历上级
    pub fn ancestors_nearest_first(&self) -> impl Iterator<Item = UserId> + '_ {
        self.ancestors.iter().rev().copied()
    }

    /// 推荐码字符串（"D1D2D3"）
    pub fn code(&self) -> String {
        self.ancestors.iter().map(|id| format!("D{}", id)).collect()
    }

    /// 解析推荐码；空串表示根用户，非法段落返回 None
    pub fn parse_code(user_id: UserId, code: &str) -> Option<Self> {
        let mut ancestors = Vec::new();
        for part in code.split('D').filter(|p| !p.is_empty()) {
            let id = part.parse::<u64>().ok()?;
            ancestors.push(UserId(id));
        }
        Some(Self { user_id, ancestors })
    }
}

/// 用户区域聚合
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UserArea {
    /// 用户ID
    pub user_id: UserId,
    /// 伞下业绩（不含自身）
    pub amount: Amount,
    /// 自身业绩
    pub self_amount: Amount,
    /// 团队等级
    pub level: u8,
}

impl UserArea {
    /// 该分支对上级贡献的总业绩
    #[inline]
    pub fn branch_amount(&self) -> Amount { self.amount + self.self_amount }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ancestor_levels_count_from_nearest() {
        let rec = UserRecommend::new(UserId(9), vec![UserId(1), UserId(2), UserId(3)]);
        assert_eq!(rec.ancestor_at(0), Some(UserId(3)));
        assert_eq!(rec.ancestor_at(2), Some(UserId(1)));
        assert_eq!(rec.ancestor_at(3), None);
        assert_eq!(rec.sponsor(), Some(UserId(3)));
    }

    #[test]
    fn code_round_trips_through_parse() {
        let rec = UserRecommend::new(UserId(9), vec![UserId(1), UserId(22)]);
        assert_eq!(rec.code(), "D1D22");
        assert_eq!(UserRecommend::parse_code(UserId(9), "D1D22"), Some(rec));
        assert_eq!(UserRecommend::parse_code(UserId(9), "D1Dx"), None);
        assert_eq!(UserRecommend::parse_code(UserId(9), ""), Some(UserRecommend::root(UserId(9))));
    }
}
