//! 基础标识与时间类型定义
//!
//! 包含用户、点位、结算单等标识，以及毫秒级时间戳与业务日换算

use std::fmt;

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Offset, Utc};

/// 时间戳（Unix 毫秒）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub fn now() -> Self { Self(Utc::now().timestamp_millis()) }

    #[inline]
    pub const fn from_millis(millis: i64) -> Self { Self(millis) }

    #[inline]
    pub const fn as_millis(self) -> i64 { self.0 }

    /// 按给定 UTC 偏移（小时）换算业务日
    ///
    /// 业务日以偏移后的本地零点切分，默认部署为 UTC+8
    pub fn business_date(self, utc_offset_hours: i32) -> NaiveDate {
        let offset = fixed_offset(utc_offset_hours);
        DateTime::<Utc>::from_timestamp_millis(self.0)
            .unwrap_or_default()
            .with_timezone(&offset)
            .date_naive()
    }

    /// 业务日内某一时刻对应的时间戳
    pub fn at_business_time(
        date: NaiveDate,
        hour: u32,
        minute: u32,
        utc_offset_hours: i32,
    ) -> Option<Self> {
        let offset = fixed_offset(utc_offset_hours);
        date.and_hms_opt(hour, minute, 0)?
            .and_local_timezone(offset)
            .single()
            .map(|dt| Self(dt.timestamp_millis()))
    }

    pub fn plus_days(self, days: i64) -> Self {
        Self(self.0 + Duration::days(days).num_milliseconds())
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match DateTime::<Utc>::from_timestamp_millis(self.0) {
            Some(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S%.3f UTC")),
            None => write!(f, "{}ms", self.0),
        }
    }
}

fn fixed_offset(utc_offset_hours: i32) -> FixedOffset {
    FixedOffset::east_opt(utc_offset_hours * 3600).unwrap_or(Utc.fix())
}

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
        #[repr(transparent)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        #[cfg_attr(feature = "serde", serde(transparent))]
        pub struct $name(pub u64);

        impl From<u64> for $name {
            #[inline]
            fn from(id: u64) -> Self { Self(id) }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
        }
    };
}

id_type!(
    /// 用户ID
    UserId
);
id_type!(
    /// 点位ID（一次投入形成的收益容量槽）
    LocationId
);
id_type!(
    /// 结算单ID（提现/交易）
    SettlementId
);
id_type!(
    /// 奖励流水ID
    RewardId
);
id_type!(
    /// 价格变动记录ID
    PriceChangeId
);
