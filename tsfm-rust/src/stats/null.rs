//! 置换零分布：四张频数表（碱基对 info / 高度，单列 info / 高度）。
//!
//! 高度表中记录的是 `info × height`，与真实数据查询时使用的量一致。

use std::collections::BTreeMap;

use crate::alignment::Site;
use crate::entropy::InfoTable;

/// 非负有限值的频数表。键为 `f64::to_bits`，对非负数其顺序与数值顺序一致。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FreqTable {
    counts: BTreeMap<u64, u64>,
}

#[inline]
fn key(v: f64) -> Option<u64> {
    if !v.is_finite() || v < 0.0 {
        return None;
    }
    // -0.0 与 0.0 统一
    Some(if v == 0.0 { 0 } else { v.to_bits() })
}

impl FreqTable {
    pub fn push(&mut self, v: f64) {
        if let Some(k) = key(v) {
            *self.counts.entry(k).or_insert(0) += 1;
        }
    }

    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// 不同取值个数
    pub fn distinct(&self) -> usize {
        self.counts.len()
    }

    pub fn merge(mut self, other: FreqTable) -> FreqTable {
        for (k, c) in other.counts {
            *self.counts.entry(k).or_insert(0) += c;
        }
        self
    }

    /// 冻结为有序数组加后缀和，供 O(log n) 尾概率查询
    pub fn tail(&self) -> TailTable {
        let keys: Vec<f64> = self.counts.keys().map(|&k| f64::from_bits(k)).collect();
        let counts: Vec<u64> = self.counts.values().copied().collect();
        let mut suffix = vec![0u64; keys.len() + 1];
        for i in (0..counts.len()).rev() {
            suffix[i] = suffix[i + 1] + counts[i];
        }
        TailTable { keys, suffix }
    }
}

/// 冻结后的零分布，`suffix[i]` 为取值不小于 `keys[i]` 的样本数
#[derive(Debug, Clone, Default)]
pub struct TailTable {
    keys: Vec<f64>,
    suffix: Vec<u64>,
}

impl TailTable {
    pub fn total(&self) -> u64 {
        self.suffix.first().copied().unwrap_or(0)
    }

    /// 上尾经验概率 P(null ≥ point)。
    ///
    /// `point ≤ 0` 时为 1.0；空表为 1.0；超过零分布最大值为 0.0。
    pub fn p_value(&self, point: f64) -> f64 {
        if !(point > 0.0) {
            return 1.0;
        }
        let total = self.total();
        let max = match self.keys.last() {
            Some(&m) if total > 0 => m,
            _ => return 1.0,
        };
        if point > max {
            return 0.0;
        }
        let i = self.keys.partition_point(|&k| k < point);
        self.suffix[i] as f64 / total as f64
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NullDistribution {
    pub pair_info: FreqTable,
    pub pair_height: FreqTable,
    pub single_info: FreqTable,
    pub single_height: FreqTable,
}

impl NullDistribution {
    /// 单个置换副本的贡献
    pub fn from_table(table: &InfoTable) -> Self {
        let mut dist = NullDistribution::default();
        dist.record(table);
        dist
    }

    pub fn record(&mut self, table: &InfoTable) {
        for (site, scores) in table {
            let (info_t, height_t) = match site {
                Site::Pair(..) => (&mut self.pair_info, &mut self.pair_height),
                Site::Single(_) => (&mut self.single_info, &mut self.single_height),
            };
            for score in scores.values() {
                info_t.push(score.info);
                for &(_, h) in &score.height {
                    height_t.push(score.info * h);
                }
            }
        }
    }

    /// 合并两个分布，满足交换律与结合律
    pub fn merge(self, other: NullDistribution) -> NullDistribution {
        NullDistribution {
            pair_info: self.pair_info.merge(other.pair_info),
            pair_height: self.pair_height.merge(other.pair_height),
            single_info: self.single_info.merge(other.single_info),
            single_height: self.single_height.merge(other.single_height),
        }
    }

    pub fn tails(&self) -> NullTails {
        NullTails {
            pair_info: self.pair_info.tail(),
            pair_height: self.pair_height.tail(),
            single_info: self.single_info.tail(),
            single_height: self.single_height.tail(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct NullTails {
    pub pair_info: TailTable,
    pub pair_height: TailTable,
    pub single_info: TailTable,
    pub single_height: TailTable,
}

impl NullTails {
    /// 按位点类型选择 (info 表, 高度表)
    pub fn for_site(&self, site: Site) -> (&TailTable, &TailTable) {
        match site {
            Site::Pair(..) => (&self.pair_info, &self.pair_height),
            Site::Single(_) => (&self.single_info, &self.single_height),
        }
    }
}
