//! 多重检验校正。结果与输入顺序一致，校正值截断到 1。

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TsfmError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Correction {
    Bonferroni,
    Holm,
    Hommel,
    /// Benjamini–Hochberg FDR
    #[default]
    BenjaminiHochberg,
    /// Benjamini–Yekutieli FDR
    BenjaminiYekutieli,
    /// Simes–Hochberg 逐步上升
    Hochberg,
}

impl FromStr for Correction {
    type Err = TsfmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bonferroni" | "b" => Ok(Correction::Bonferroni),
            "holm" | "h" => Ok(Correction::Holm),
            "hommel" | "ho" => Ok(Correction::Hommel),
            "fdr_bh" | "bh" | "fdr_i" | "fdr_p" => Ok(Correction::BenjaminiHochberg),
            "fdr_by" | "by" | "fdr_n" => Ok(Correction::BenjaminiYekutieli),
            "simes-hochberg" | "hochberg-simes" | "hochberg" | "sh" => Ok(Correction::Hochberg),
            _ => Err(TsfmError::UnknownCorrection(s.to_string())),
        }
    }
}

impl fmt::Display for Correction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Correction::Bonferroni => "bonferroni",
            Correction::Holm => "holm",
            Correction::Hommel => "hommel",
            Correction::BenjaminiHochberg => "fdr_bh",
            Correction::BenjaminiYekutieli => "fdr_by",
            Correction::Hochberg => "simes-hochberg",
        };
        f.write_str(name)
    }
}

impl Correction {
    /// 对一组 p 值做校正，返回与输入等长、同序的校正值
    pub fn adjust(self, pvals: &[f64]) -> Vec<f64> {
        let n = pvals.len();
        if n == 0 {
            return Vec::new();
        }
        let nf = n as f64;

        // 升序排列的下标
        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&a, &b| pvals[a].total_cmp(&pvals[b]));
        let sorted: Vec<f64> = order.iter().map(|&i| pvals[i]).collect();

        let adjusted_sorted: Vec<f64> = match self {
            Correction::Bonferroni => sorted.iter().map(|&p| p * nf).collect(),
            Correction::Holm => {
                let mut acc = f64::NEG_INFINITY;
                sorted
                    .iter()
                    .enumerate()
                    .map(|(i, &p)| {
                        acc = acc.max(p * (n - i) as f64);
                        acc
                    })
                    .collect()
            }
            Correction::Hochberg => {
                let raw: Vec<f64> = sorted.iter().enumerate().map(|(i, &p)| p * (n - i) as f64).collect();
                reverse_cummin(raw)
            }
            Correction::BenjaminiHochberg => {
                let raw: Vec<f64> = sorted.iter().enumerate().map(|(i, &p)| p * nf / (i + 1) as f64).collect();
                reverse_cummin(raw)
            }
            Correction::BenjaminiYekutieli => {
                let cm: f64 = (1..=n).map(|i| 1.0 / i as f64).sum();
                let raw: Vec<f64> = sorted
                    .iter()
                    .enumerate()
                    .map(|(i, &p)| p * nf * cm / (i + 1) as f64)
                    .collect();
                reverse_cummin(raw)
            }
            Correction::Hommel => hommel(&sorted),
        };

        let mut out = vec![0.0; n];
        for (rank, &idx) in order.iter().enumerate() {
            out[idx] = adjusted_sorted[rank].min(1.0);
        }
        out
    }
}

/// 从尾部向前的累计最小值
fn reverse_cummin(mut v: Vec<f64>) -> Vec<f64> {
    let mut acc = f64::INFINITY;
    for x in v.iter_mut().rev() {
        acc = acc.min(*x);
        *x = acc;
    }
    v
}

/// Hommel 闭检验，输入须升序
fn hommel(sorted: &[f64]) -> Vec<f64> {
    let n = sorted.len();
    let mut a = sorted.to_vec();
    for m in (2..=n).rev() {
        let mf = m as f64;
        let tail = &sorted[n - m..];
        let cim = tail
            .iter()
            .enumerate()
            .map(|(i, &p)| mf * p / (i + 1) as f64)
            .fold(f64::INFINITY, f64::min);
        for x in &mut a[n - m..] {
            *x = x.max(cim);
        }
        for (x, &p) in a[..n - m].iter_mut().zip(&sorted[..n - m]) {
            *x = x.max((mf * p).min(cim));
        }
    }
    a
}
