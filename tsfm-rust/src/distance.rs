//! 结果记录之间的 rJSD 距离矩阵。
//!
//! 特征为 (是否反向, 位点, 符号)，含缺口符号的特征被排除。每个记录在每个特征上
//! 给出 info（bits）和各类别高度，统一四舍五入到 3 位小数。两记录的距离为
//!
//! ```text
//! Σ (b1 + b2) · sqrt(max(0, H(w1·d1 + w2·d2) − w1·H(d1) − w2·H(d2)))
//! ```
//!
//! 其中 b 为 info，w = b / (b1 + b2) 为归一化混合权重，d 为高度向量；
//! 两记录 info 均为 0 的特征跳过。相同记录之间的距离为 0。

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::alignment::{Site, Symbol};
use crate::result::ResultRecord;

type Feature = (bool, Site, Symbol);

#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    pub names: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

impl DistanceMatrix {
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.names.iter().position(|n| n == a)?;
        let j = self.names.iter().position(|n| n == b)?;
        Some(self.values[i][j])
    }
}

impl fmt::Display for DistanceMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for name in &self.names {
            write!(f, "\t{}", name)?;
        }
        writeln!(f)?;
        for (name, row) in self.names.iter().zip(&self.values) {
            write!(f, "{}", name)?;
            for v in row {
                write!(f, "\t{:.6}", v)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[inline]
fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}

/// 记录在一个特征上的 (bits, 高度向量)
fn profile(rec: &ResultRecord, feature: &Feature, classes: &[String]) -> (f64, Vec<f64>) {
    let (inverse, site, sym) = *feature;
    match rec.get(inverse, site, sym) {
        Some(s) => {
            let dist = classes
                .iter()
                .map(|c| {
                    s.heights
                        .iter()
                        .find(|h| &h.class == c)
                        .map(|h| round3(h.height))
                        .unwrap_or(0.0)
                })
                .collect();
            (round3(s.info), dist)
        }
        None => (0.0, vec![0.0; classes.len()]),
    }
}

fn entropy(dist: &[f64]) -> f64 {
    dist.iter().filter(|&&p| p != 0.0).map(|&p| -p * p.log2()).sum()
}

/// 单个特征上的 rJSD 贡献，`bits1`/`bits2` 为两记录在该特征上的 info
pub fn rjsd(d1: &[f64], d2: &[f64], bits1: f64, bits2: f64) -> f64 {
    let total = bits1 + bits2;
    if total <= 0.0 {
        return 0.0;
    }
    let (w1, w2) = (bits1 / total, bits2 / total);
    let mix: Vec<f64> = d1.iter().zip(d2).map(|(a, b)| w1 * a + w2 * b).collect();
    let step = entropy(&mix) - (w1 * entropy(d1) + w2 * entropy(d2));
    total * step.max(0.0).sqrt()
}

/// 计算一组命名结果记录两两之间的距离矩阵
pub fn rjsd_matrix(records: &[(&str, &ResultRecord)]) -> DistanceMatrix {
    let mut features: BTreeSet<Feature> = BTreeSet::new();
    let mut classes: BTreeSet<String> = BTreeSet::new();
    for (_, rec) in records {
        for inverse in [false, true] {
            for (&site, symbols) in rec.stats(inverse) {
                for (&sym, s) in symbols {
                    if sym.contains_gap() {
                        continue;
                    }
                    features.insert((inverse, site, sym));
                    classes.extend(s.heights.iter().map(|h| h.class.clone()));
                }
            }
        }
    }
    let classes: Vec<String> = classes.into_iter().collect();
    log::debug!("{} features over {} classes", features.len(), classes.len());

    let profiles: Vec<BTreeMap<&Feature, (f64, Vec<f64>)>> = records
        .iter()
        .map(|(_, rec)| features.iter().map(|f| (f, profile(rec, f, &classes))).collect())
        .collect();

    let n = records.len();
    let mut values = vec![vec![0.0; n]; n];
    for a in 0..n {
        for b in (a + 1)..n {
            let mut d = 0.0;
            for f in &features {
                let (pi1, d1) = &profiles[a][f];
                let (pi2, d2) = &profiles[b][f];
                if *pi1 == 0.0 && *pi2 == 0.0 {
                    continue;
                }
                d += rjsd(d1, d2, *pi1, *pi2);
            }
            values[a][b] = d;
            values[b][a] = d;
        }
    }
    DistanceMatrix {
        names: records.iter().map(|(name, _)| name.to_string()).collect(),
        values,
    }
}
