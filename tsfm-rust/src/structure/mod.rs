//! 共有二级结构：碱基对坐标集合。
//!
//! 两种输入形式：
//! - 括号串（cove `#=CS` 行），经 [`bracket`] 中的臂状态机解析；
//! - 坐标列表文本（`A;0:72,1:71`），经 [`coords`] 解析。
//!
//! 两条路径都以 [`Structure::new`] 收尾，保证坐标规范化（i < j）且无重复配对。

use std::collections::HashSet;

use crate::error::{Result, TsfmError};

pub mod bracket;
pub mod coords;

pub use bracket::{parse_bracket, parse_cove};
pub use coords::parse_coords;

/// 三叶草结构中的螺旋臂
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Arm {
    /// 受体臂（A）
    Acceptor,
    /// D 臂
    D,
    /// 反密码子臂（C）
    Anticodon,
    /// T 臂
    T,
    /// 坐标列表中没有可识别标签的记录
    Unlabelled,
}

impl Arm {
    pub fn label(self) -> &'static str {
        match self {
            Arm::Acceptor => "A",
            Arm::D => "D",
            Arm::Anticodon => "C",
            Arm::T => "T",
            Arm::Unlabelled => "-",
        }
    }

    pub fn from_label(s: &str) -> Arm {
        match s.trim() {
            "A" => Arm::Acceptor,
            "D" => Arm::D,
            "C" => Arm::Anticodon,
            "T" => Arm::T,
            _ => Arm::Unlabelled,
        }
    }
}

/// 单个碱基对，0-based 比对列坐标，`i < j`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BasePair {
    pub i: usize,
    pub j: usize,
    pub arm: Arm,
}

impl BasePair {
    pub fn coord(&self) -> (usize, usize) {
        (self.i, self.j)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Structure {
    pairs: Vec<BasePair>,
}

impl Structure {
    /// 校验并规范化碱基对：交换为 i < j，拒绝自配对与重复使用的坐标，按 (i, j) 排序。
    pub fn new(pairs: Vec<BasePair>) -> Result<Self> {
        let mut seen: HashSet<usize> = HashSet::with_capacity(pairs.len() * 2);
        let mut out = Vec::with_capacity(pairs.len());
        for p in pairs {
            let (i, j) = if p.i <= p.j { (p.i, p.j) } else { (p.j, p.i) };
            if i == j {
                return Err(TsfmError::SelfPair(i));
            }
            for c in [i, j] {
                if !seen.insert(c) {
                    return Err(TsfmError::DoublyPaired(c));
                }
            }
            out.push(BasePair { i, j, arm: p.arm });
        }
        out.sort_by_key(BasePair::coord);
        Ok(Self { pairs: out })
    }

    pub fn pairs(&self) -> &[BasePair] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn coords(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.pairs.iter().map(BasePair::coord)
    }

    pub fn arm(&self, arm: Arm) -> impl Iterator<Item = &BasePair> + '_ {
        self.pairs.iter().filter(move |p| p.arm == arm)
    }


    /// 所有坐标必须落在 [0, len) 内
    pub fn check_bounds(&self, len: usize) -> Result<()> {
        match self.pairs.iter().map(|p| p.j).max() {
            Some(pos) if pos >= len => Err(TsfmError::CoordinateOutOfRange { pos, len }),
            _ => Ok(()),
        }
    }
}
