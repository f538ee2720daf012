//! Nemenman–Shafee–Bialek 熵估计。
//!
//! 在对称 Dirichlet 先验族上对浓度参数 β 积分，先验取为使先验期望熵
//! ξ(β) = ψ(Kβ+1) − ψ(β+1) 在 (0, ln K) 上均匀分布。积分在 ln β 网格上进行：
//!
//! ```text
//! S_nsb = ∫ dξ ρ(β) S̄(β) / ∫ dξ ρ(β),    dξ = ξ'(β) β d(ln β)
//! ```
//!
//! 计数允许为非整数（inverse 统计中的反转计数）。

use statrs::function::gamma::{digamma, ln_gamma};
use std::f64::consts::LN_2;

const LN_BETA_MIN: f64 = -12.0;
const LN_BETA_MAX: f64 = 12.0;
const GRID: usize = 400;

/// ψ₁(x)，x > 0：递推到 x ≥ 6 后使用渐近展开
pub fn trigamma(mut x: f64) -> f64 {
    let mut acc = 0.0;
    while x < 6.0 {
        acc += 1.0 / (x * x);
        x += 1.0;
    }
    let x2 = 1.0 / (x * x);
    acc + 1.0 / x
        + x2 / 2.0
        + (1.0 / (x * x * x)) * (1.0 / 6.0 - x2 * (1.0 / 30.0 - x2 * (1.0 / 42.0 - x2 / 30.0)))
}

/// 在 β 处的边缘对数似然（省略与 β 无关的常数）
fn log_evidence(counts: &[f64], k: f64, n: f64, beta: f64) -> f64 {
    let kb = k * beta;
    let lg_beta = ln_gamma(beta);
    ln_gamma(kb) - ln_gamma(n + kb) + counts.iter().map(|&c| ln_gamma(c + beta) - lg_beta).sum::<f64>()
}

/// 给定 β 时的后验期望熵（nats）
fn posterior_mean(counts: &[f64], k: f64, n: f64, beta: f64) -> f64 {
    let total = n + k * beta;
    digamma(total + 1.0)
        - counts
            .iter()
            .map(|&c| (c + beta) / total * digamma(c + beta + 1.0))
            .sum::<f64>()
}

/// dξ/dβ
fn prior_density(k: f64, beta: f64) -> f64 {
    k * trigamma(k * beta + 1.0) - trigamma(beta + 1.0)
}

/// NSB 熵估计（bits）。`counts` 长度不足 `k` 时视为其余类别计数为零。
pub fn entropy(counts: &[f64], k: usize) -> f64 {
    if k <= 1 {
        return 0.0;
    }
    let mut full = counts.to_vec();
    full.resize(k, 0.0);
    let kf = k as f64;
    let n: f64 = full.iter().sum();

    let mut grid = Vec::with_capacity(GRID + 1);
    let mut max_log = f64::NEG_INFINITY;
    for t in 0..=GRID {
        let ln_beta = LN_BETA_MIN + (LN_BETA_MAX - LN_BETA_MIN) * t as f64 / GRID as f64;
        let beta = ln_beta.exp();
        let rho = log_evidence(&full, kf, n, beta);
        let jac = prior_density(kf, beta) * beta;
        if rho.is_finite() && rho > max_log {
            max_log = rho;
        }
        grid.push((rho, jac, beta));
    }

    let mut num = 0.0;
    let mut den = 0.0;
    for (rho, jac, beta) in grid {
        if !rho.is_finite() {
            continue;
        }
        let w = (rho - max_log).exp() * jac;
        num += w * posterior_mean(&full, kf, n, beta);
        den += w;
    }
    if den > 0.0 {
        num / den / LN_2
    } else {
        0.0
    }
}
