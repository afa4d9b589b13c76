//! 点位实体

use base_types::{Amount, LocationId, MICRO_UNIT, Timestamp, UserId};

/// 点位状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum LocationStatus {
    /// 运行中，可继续入账
    #[default]
    Running,
    /// 已出局，永不恢复
    Stopped,
}

/// 安置分支（上级点位下的第几条线）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Branch {
    One,
    Two,
    Three,
}

impl Branch {
    /// 由 `top_num`（1..=3）得到分支；0 或越界表示无上级
    pub const fn from_top_num(top_num: u8) -> Option<Self> {
        match top_num {
            1 => Some(Branch::One),
            2 => Some(Branch::Two),
            3 => Some(Branch::Three),
            _ => None,
        }
    }

    pub const fn index(self) -> u8 {
        match self {
            Branch::One => 1,
            Branch::Two => 2,
            Branch::Three => 3,
        }
    }
}

/// 点位实体
///
/// 一次投入形成的收益容量槽。金额字段均为定点最小单位，
/// 三条分支业绩 `total*` 以整业务单位计（与 `usdt / MICRO_UNIT` 同量纲）。
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Location {
    /// 点位ID
    pub id: LocationId,
    /// 所属用户
    pub user_id: UserId,
    /// 状态
    pub status: LocationStatus,
    /// 已累计收益
    pub current: Amount,
    /// 收益上限
    pub current_max: Amount,
    /// 已与兑换操作对账的容量
    pub current_max_new: Amount,
    /// 已累计的次级币收益
    #[cfg_attr(feature = "serde", serde(default))]
    pub current_secondary: Amount,
    /// 投入本金
    pub usdt: Amount,
    /// 上级安置点位
    pub top: Option<LocationId>,
    /// 在上级点位下的分支编号（1..=3，0 表示无）
    pub top_num: u8,
    /// 第一条线业绩
    pub total: Amount,
    /// 第二条线业绩
    pub total_two: Amount,
    /// 第三条线业绩
    pub total_three: Amount,
    /// 曾达到的最高区域档位
    pub last_level: u8,
    /// 出局倍率（百分比）
    pub out_rate: Amount,
    /// 出局时间
    pub stop_date: Option<Timestamp>,
    /// 创建时间
    pub created_at: Timestamp,
}

impl Location {
    /// 创建新点位（无安置上级、分支业绩为零）
    pub fn new(
        id: LocationId, user_id: UserId, usdt: Amount, current_max: Amount, created_at: Timestamp,
    ) -> Self {
        Self {
            id,
            user_id,
            status: LocationStatus::Running,
            current: 0,
            current_max,
            current_max_new: current_max,
            current_secondary: 0,
            usdt,
            top: None,
            top_num: 0,
            total: 0,
            total_two: 0,
            total_three: 0,
            last_level: 0,
            out_rate: 0,
            stop_date: None,
            created_at,
        }
    }

    /// 安置到上级点位的某条线下
    pub fn placed_under(mut self, top: LocationId, branch: Branch) -> Self {
        self.top = Some(top);
        self.top_num = branch.index();
        self
    }

    /// 设置三条线业绩
    pub fn with_totals(mut self, total: Amount, total_two: Amount, total_three: Amount) -> Self {
        self.total = total;
        self.total_two = total_two;
        self.total_three = total_three;
        self
    }

    #[inline]
    pub fn is_running(&self) -> bool { self.status == LocationStatus::Running }

    /// 剩余容量
    #[inline]
    pub fn remaining(&self) -> Amount { self.current_max - self.current }

    /// 本金（整业务单位），出局时从上级业绩中扣减的量
    #[inline]
    pub fn principal_units(&self) -> Amount { self.usdt / MICRO_UNIT }

    /// 上级指针（点位 + 分支）
    pub fn parent(&self) -> Option<(LocationId, Branch)> {
        self.top.zip(Branch::from_top_num(self.top_num))
    }

    /// 考核业绩：三条线中较小两条之和
    pub fn qualifying_pair(&self) -> Amount {
        let max = self.total.max(self.total_two).max(self.total_three);
        self.total + self.total_two + self.total_three - max
    }

    fn branch_total_mut(&mut self, branch: Branch) -> &mut Amount {
        match branch {
            Branch::One => &mut self.total,
            Branch::Two => &mut self.total_two,
            Branch::Three => &mut self.total_three,
        }
    }

    /// 应用一次容量/状态变更，校验实体不变量
    pub fn apply(&mut self, update: &LocationUpdate) -> Result<(), String> {
        if self.status == LocationStatus::Stopped {
            if update.status == LocationStatus::Running {
                return Err(format!("location {} already stopped", self.id));
            }
            if update.credit != 0 {
                return Err(format!("location {} stopped, credit {} refused", self.id, update.credit));
            }
        }
        if update.credit < 0 || update.max_new_delta < 0 {
            return Err(format!("location {} negative credit", self.id));
        }

        let next = self.current + update.credit;
        if next > self.current_max {
            return Err(format!(
                "location {} current {} exceeds max {}",
                self.id, next, self.current_max
            ));
        }
        if next == self.current_max && update.status == LocationStatus::Running {
            return Err(format!("location {} full but still running", self.id));
        }

        self.current = next;
        self.status = update.status;
        self.current_max_new += update.max_new_delta;
        self.current_secondary += update.secondary_delta;
        if update.stop_date.is_some() {
            self.stop_date = update.stop_date;
        }
        if let Some(level) = update.last_level {
            self.last_level = self.last_level.max(level);
        }
        Ok(())
    }

    /// 扣减已累计收益（价格下跌），不得低于零
    pub fn debit(&mut self, amount: Amount) -> Result<(), String> {
        if amount < 0 || amount > self.current {
            return Err(format!(
                "location {} debit {} out of range 0..={}",
                self.id, amount, self.current
            ));
        }
        self.current -= amount;
        Ok(())
    }

    /// 扣减某条线业绩，不得低于零
    pub fn subtract_branch(&mut self, branch: Branch, amount: Amount) -> Result<(), String> {
        let id = self.id;
        let slot = self.branch_total_mut(branch);
        if amount < 0 || *slot < amount {
            return Err(format!(
                "location {} branch {} total {} cannot drop by {}",
                id,
                branch.index(),
                *slot,
                amount
            ));
        }
        *slot -= amount;
        Ok(())
    }
}

/// 点位容量/状态变更
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationUpdate {
    /// 变更后状态
    pub status: LocationStatus,
    /// 本次入账
    pub credit: Amount,
    /// 对账容量增量
    pub max_new_delta: Amount,
    /// 次级币入账
    pub secondary_delta: Amount,
    /// 出局时间（仅出局时写入）
    pub stop_date: Option<Timestamp>,
    /// 区域档位（仅抬升）
    pub last_level: Option<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc() -> Location {
        Location::new(LocationId(1), UserId(1), 100 * MICRO_UNIT, 100, Timestamp(0))
            .with_totals(50, 20, 30)
    }

    fn credit(status: LocationStatus, credit: Amount) -> LocationUpdate {
        LocationUpdate {
            status,
            credit,
            max_new_delta: 0,
            secondary_delta: 0,
            stop_date: None,
            last_level: None,
        }
    }

    #[test]
    fn qualifying_pair_drops_largest_branch() {
        assert_eq!(loc().qualifying_pair(), 50);
    }

    #[test]
    fn apply_refuses_overflow_and_running_at_full() {
        let mut l = loc();
        assert!(l.apply(&credit(LocationStatus::Running, 101)).is_err());
        assert!(l.apply(&credit(LocationStatus::Running, 100)).is_err());
        assert!(l.apply(&credit(LocationStatus::Stopped, 100)).is_ok());
        assert_eq!(l.current, 100);
        assert!(l.apply(&credit(LocationStatus::Running, 0)).is_err());
    }

    #[test]
    fn last_level_never_decreases() {
        let mut l = loc();
        l.last_level = 3;
        let mut up = credit(LocationStatus::Running, 1);
        up.last_level = Some(2);
        l.apply(&up).unwrap();
        assert_eq!(l.last_level, 3);
    }

    #[test]
    fn branch_subtraction_never_goes_negative() {
        let mut l = loc();
        assert!(l.subtract_branch(Branch::Two, 21).is_err());
        l.subtract_branch(Branch::Two, 20).unwrap();
        assert_eq!(l.total_two, 0);
        assert!(l.debit(1).is_err());
    }
}
