//! 小样本精确期望熵表。
//!
//! 对样本量 n，枚举 n 个观测在 k 个类别上的全部计数组合，按多项分布加权
//! 求 Shannon 熵的期望。表项 `table[n - 1]` 对应样本量 n。

use rayon::prelude::*;
use statrs::function::factorial::ln_factorial;

use super::shannon;

/// 样本量 `n` 下、按 `probs` 抽样时前景熵的期望（bits）。
///
/// 只使用 `probs` 的前 `k` 项；概率为零的类别只能取零计数。
pub fn expected_entropy(n: usize, probs: &[f64], k: usize) -> f64 {
    let k = k.min(probs.len());
    if n == 0 || k == 0 {
        return 0.0;
    }
    let ln_p: Vec<f64> = probs[..k].iter().map(|&p| p.ln()).collect();
    let mut counts = vec![0u64; k];
    let mut acc = 0.0;
    enumerate(n as u64, 0, &ln_p, &mut counts, ln_factorial(n as u64), &mut acc);
    acc
}

fn enumerate(left: u64, idx: usize, ln_p: &[f64], counts: &mut [u64], ln_w: f64, acc: &mut f64) {
    let last = idx + 1 == counts.len();
    if last {
        counts[idx] = left;
        let w = ln_w - ln_factorial(left) + term(left, ln_p[idx]);
        if w.is_finite() {
            let freqs: Vec<f64> = counts.iter().map(|&c| c as f64).collect();
            *acc += w.exp() * shannon(&freqs);
        }
        return;
    }
    for c in 0..=left {
        counts[idx] = c;
        let w = ln_w - ln_factorial(c) + term(c, ln_p[idx]);
        if w.is_finite() {
            enumerate(left - c, idx + 1, ln_p, counts, w, acc);
        }
    }
    counts[idx] = 0;
}

/// c · ln p，约定 0 · ln 0 = 0
#[inline]
fn term(c: u64, ln_p: f64) -> f64 {
    if c == 0 {
        0.0
    } else {
        c as f64 * ln_p
    }
}

/// 用给定的精确校正函数并行计算样本量 1..=max_n 的表，结果按样本量顺序排列。
pub fn build_table_with<F>(max_n: usize, probs: &[f64], f: F) -> Vec<f64>
where
    F: Fn(usize, &[f64], usize) -> f64 + Sync,
{
    let k = probs.len();
    (1..=max_n)
        .into_par_iter()
        .map(|n| {
            let h = f(n, probs, k);
            log::debug!("{:2} {:07.5}", n, h);
            h
        })
        .collect()
}

pub fn build_table(max_n: usize, probs: &[f64]) -> Vec<f64> {
    build_table_with(max_n, probs, expected_entropy)
}
