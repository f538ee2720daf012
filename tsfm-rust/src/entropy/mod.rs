//! 信息量与类别高度计算。
//!
//! 每个 (位点, 符号) 的计算流程：
//!
//! 1. 按 [`Weighting`] 变换各类别计数（direct 保持原值；inverse 先补伪计数再取 total / count）；
//! 2. 按 [`Estimator`] 估计前景熵；
//! 3. 期望背景熵：样本量不超过精确表长度时查表，否则用渐近值；
//! 4. `info = max(0, 期望背景熵 − 前景熵)`，高度为各类别富集比归一化。

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::alignment::{Alignment, ClassId, ClassTable, Site, Symbol};
use crate::error::TsfmError;

pub mod exact;
pub mod nsb;

/// Shannon 熵（bits）。输入为非负权重，内部归一化；零项与非有限项不计入。
pub fn shannon(weights: &[f64]) -> f64 {
    let total: f64 = weights.iter().filter(|w| w.is_finite() && **w > 0.0).sum();
    if total <= 0.0 {
        return 0.0;
    }
    weights
        .iter()
        .filter(|w| w.is_finite() && **w > 0.0)
        .map(|&w| {
            let p = w / total;
            -p * p.log2()
        })
        .sum()
}

/// Miller–Madow 一阶偏差校正后的期望熵：`H − (k−1)/(N·ln4)`
pub fn miller_madow(h: f64, k: usize, n: usize) -> f64 {
    h - (k as f64 - 1.0) / (4f64.ln() * n as f64)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Estimator {
    MillerMadow,
    #[default]
    Nsb,
}

impl FromStr for Estimator {
    type Err = TsfmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "nsb" => Ok(Estimator::Nsb),
            "miller" | "mm" | "miller-madow" => Ok(Estimator::MillerMadow),
            _ => Err(TsfmError::UnknownEstimator(s.to_string())),
        }
    }
}

impl fmt::Display for Estimator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Estimator::MillerMadow => write!(f, "Miller"),
            Estimator::Nsb => write!(f, "NSB"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Weighting {
    Direct,
    /// 以类别频率的倒数加权，抵消类别样本量不均
    Inverse,
}

impl Weighting {
    /// 变换后的计数：返回 (查表用样本量, 参与计算的 (类别, 权重))。
    ///
    /// 位点上无任何观测时返回 `None`。
    pub fn transform(self, counts: &[u32]) -> Option<(usize, Vec<(ClassId, f64)>)> {
        let n: u32 = counts.iter().sum();
        if n == 0 {
            return None;
        }
        match self {
            Weighting::Direct => {
                let present = counts
                    .iter()
                    .enumerate()
                    .filter(|(_, &c)| c > 0)
                    .map(|(id, &c)| (id, c as f64))
                    .collect();
                Some((n as usize, present))
            }
            Weighting::Inverse => {
                // 有类别缺席时所有类别各加一个伪观测
                let pseudo = u32::from(counts.iter().any(|&c| c == 0));
                let adjusted: Vec<u32> = counts.iter().map(|&c| c + pseudo).collect();
                let total: u32 = adjusted.iter().sum();
                let inverted = adjusted
                    .iter()
                    .enumerate()
                    .map(|(id, &c)| (id, total as f64 / c as f64))
                    .collect();
                Some((total as usize, inverted))
            }
        }
    }

    /// 背景类别权重：direct 为类别序列数，inverse 为 total / count
    pub fn background(self, classes: &ClassTable) -> Vec<f64> {
        match self {
            Weighting::Direct => classes.counts().iter().map(|&c| c as f64).collect(),
            Weighting::Inverse => classes.inverse_weights(),
        }
    }
}

/// 单个 (位点, 符号) 的统计量
#[derive(Debug, Clone, PartialEq)]
pub struct SiteScore {
    pub info: f64,
    /// 各类别归一化高度，和为 1
    pub height: Vec<(ClassId, f64)>,
}

pub type InfoTable = BTreeMap<Site, BTreeMap<Symbol, SiteScore>>;

/// 背景分布：熵与各类别的频率分数
#[derive(Debug, Clone)]
struct Background {
    entropy: f64,
    fraction: Vec<f64>,
    k: usize,
}

impl Background {
    fn new(weights: Vec<f64>) -> Self {
        let total: f64 = weights.iter().sum();
        Self {
            entropy: shannon(&weights),
            fraction: weights.iter().map(|&w| w / total).collect(),
            k: weights.len(),
        }
    }
}

/// direct/inverse 与两种估计器共用的计算管线
#[derive(Debug, Clone, Copy)]
pub struct InfoCalculator<'a> {
    pub estimator: Estimator,
    pub weighting: Weighting,
    /// 精确期望背景熵表，`exact[n - 1]` 对应样本量 n
    pub exact: &'a [f64],
}

impl<'a> InfoCalculator<'a> {
    pub fn new(estimator: Estimator, weighting: Weighting, exact: &'a [f64]) -> Self {
        Self { estimator, weighting, exact }
    }

    /// 对比对中所有位点与已观测符号计算信息量与高度
    pub fn compute(&self, aln: &Alignment) -> InfoTable {
        let bg = Background::new(self.weighting.background(aln.classes()));
        let mut table = InfoTable::new();
        for site in aln.sites() {
            let scores: BTreeMap<Symbol, SiteScore> = aln
                .tally(site)
                .into_iter()
                .filter_map(|(sym, counts)| self.score(&counts, &bg).map(|s| (sym, s)))
                .collect();
            if !scores.is_empty() {
                table.insert(site, scores);
            }
        }
        table
    }

    fn expected_background(&self, n: usize, bg: &Background) -> f64 {
        if n <= self.exact.len() {
            return self.exact[n - 1];
        }
        match self.estimator {
            Estimator::MillerMadow => miller_madow(bg.entropy, bg.k, n),
            Estimator::Nsb => bg.entropy,
        }
    }

    fn foreground(&self, weighted: &[(ClassId, f64)], k: usize) -> f64 {
        match self.estimator {
            Estimator::MillerMadow => {
                let w: Vec<f64> = weighted.iter().map(|&(_, w)| w).collect();
                shannon(&w)
            }
            Estimator::Nsb => {
                let mut dense = vec![0.0; k];
                for &(id, w) in weighted {
                    dense[id] = w;
                }
                nsb::entropy(&dense, k)
            }
        }
    }

    fn score(&self, counts: &[u32], bg: &Background) -> Option<SiteScore> {
        let (n, weighted) = self.weighting.transform(counts)?;
        let fg = self.foreground(&weighted, bg.k);
        let expected = self.expected_background(n, bg);
        let info = if expected - fg < 0.0 { 0.0 } else { expected - fg };
        if !info.is_finite() {
            return None;
        }

        let site_total: f64 = weighted.iter().map(|&(_, w)| w).sum();
        let raw: Vec<(ClassId, f64)> = weighted
            .iter()
            .filter(|&&(id, _)| bg.fraction[id] > 0.0)
            .map(|&(id, w)| (id, (w / site_total) / bg.fraction[id]))
            .filter(|(_, h)| h.is_finite())
            .collect();
        let norm: f64 = raw.iter().map(|&(_, h)| h).sum();
        if !(norm > 0.0 && norm.is_finite()) {
            return None;
        }
        let height = raw.into_iter().map(|(id, h)| (id, h / norm)).collect();
        Some(SiteScore { info, height })
    }
}
