use serde::{Deserialize, Serialize};

/// 坐席目录中的坐席记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub current_customer_count: i64,
}

impl Agent {
    pub fn new(id: i64, name: impl Into<String>, current_customer_count: i64) -> Self {
        Self {
            id,
            name: name.into(),
            current_customer_count,
        }
    }
}

/// 每个坐席的并发接待上限
///
/// 配置中使用 `-1` 表示不限制。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum CapacityCeiling {
    Unlimited,
    Limited(i64),
}

impl CapacityCeiling {
    /// 关闭上限时使用的哨兵值
    pub const DISABLED: i64 = -1;

    /// 负载严格小于上限时才允许分配
    pub fn admits(&self, current_customer_count: i64) -> bool {
        match self {
            CapacityCeiling::Unlimited => true,
            CapacityCeiling::Limited(max) => current_customer_count < *max,
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, CapacityCeiling::Limited(_))
    }

    /// 传递给坐席目录的 `max_agent` 值
    pub fn as_raw(&self) -> i64 {
        (*self).into()
    }
}

impl From<i64> for CapacityCeiling {
    fn from(value: i64) -> Self {
        if value < 0 {
            CapacityCeiling::Unlimited
        } else {
            CapacityCeiling::Limited(value)
        }
    }
}

impl From<CapacityCeiling> for i64 {
    fn from(ceiling: CapacityCeiling) -> Self {
        match ceiling {
            CapacityCeiling::Unlimited => CapacityCeiling::DISABLED,
            CapacityCeiling::Limited(max) => max,
        }
    }
}

impl std::fmt::Display for CapacityCeiling {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CapacityCeiling::Unlimited => write!(f, "unlimited"),
            CapacityCeiling::Limited(max) => write!(f, "{max}"),
        }
    }
}
