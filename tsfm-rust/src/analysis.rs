//! 分析流程：精确校正表 → 信息量与高度 → 置换零分布 → p 值与校正 → 结果记录。

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

use crate::alignment::Alignment;
use crate::entropy::{exact, Estimator, InfoCalculator, Weighting};
use crate::error::TsfmError;
use crate::permute;
use crate::result::{collect_stats, ResultRecord, RunMeta};
use crate::stats::{self, Correction};

/// 分析参数
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisOpt {
    pub estimator: Estimator,
    /// 同时计算 inverse 统计
    pub inverse: bool,
    /// 精确期望熵表覆盖的最大样本量；`None` 时只用渐近值
    pub exact_max: Option<usize>,
    /// 置换次数，0 表示不做显著性检验
    pub permutations: usize,
    /// 线程数，同时作为置换的分桶数
    pub threads: usize,
    pub correction: Correction,
    /// 置换主种子；`None` 时取系统熵
    pub seed: Option<u64>,
}

impl Default for AnalysisOpt {
    fn default() -> Self {
        Self {
            estimator: Estimator::default(),
            inverse: false,
            exact_max: None,
            permutations: 0,
            threads: std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1),
            correction: Correction::default(),
            seed: None,
        }
    }
}

/// 按背景类别分布构建精确期望熵表
pub fn exact_table(aln: &Alignment, weighting: Weighting, max_n: usize) -> Vec<f64> {
    let weights = weighting.background(aln.classes());
    let total: f64 = weights.iter().sum();
    let probs: Vec<f64> = weights.iter().map(|w| w / total).collect();
    exact::build_table(max_n, &probs)
}

/// 对一个序列家族运行完整分析
pub fn run(name: &str, aln: &Alignment, opt: &AnalysisOpt) -> Result<ResultRecord> {
    if aln.is_empty() {
        return Err(TsfmError::EmptyFamily.into());
    }
    let threads = opt.threads.max(1);
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .map_err(|e| anyhow!("cannot build thread pool with {} threads: {}", threads, e))?;

    log::info!(
        "{}: {} alignments, {} classes, {} base pairs",
        name,
        aln.len(),
        aln.classes().len(),
        aln.structure().len()
    );

    let mut rec = ResultRecord::new(name);
    rec.meta = RunMeta {
        created: Some(chrono::Utc::now().to_rfc3339()),
        estimator: Some(opt.estimator),
        correction: (opt.permutations > 0).then_some(opt.correction),
    };

    let weightings: &[Weighting] = if opt.inverse {
        &[Weighting::Direct, Weighting::Inverse]
    } else {
        &[Weighting::Direct]
    };
    // direct 与 inverse 使用同一批置换副本
    let seeds = permute::replicate_seeds(opt.permutations, opt.seed);

    pool.install(|| {
        for &weighting in weightings {
            let inverse = weighting == Weighting::Inverse;
            let exact = match opt.exact_max {
                Some(max) => {
                    log::info!("calculating sample size correction{}", if inverse { " for inverse" } else { "" });
                    exact_table(aln, weighting, max)
                }
                None => Vec::new(),
            };
            let calc = InfoCalculator::new(opt.estimator, weighting, &exact);

            log::info!(
                "calculating {}information statistics for {} using {} estimator",
                if inverse { "inverse " } else { "" },
                name,
                opt.estimator
            );
            let table = calc.compute(aln);

            let sig = if seeds.is_empty() {
                None
            } else {
                log::info!("calculating permutation information for {} replicates", seeds.len());
                let null = permute::null_distribution(aln, &calc, &seeds, threads);
                log::info!("calculating p-values");
                Some(stats::assess(&table, &null.tails(), opt.correction))
            };
            *rec.stats_mut(inverse) = collect_stats(aln, &table, sig.as_ref());
        }
    });
    Ok(rec)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alignment::{Site, Symbol};
    use crate::entropy::SiteScore;
    use crate::structure::parse_coords;

    #[test]
    fn default_options() {
        let opt = AnalysisOpt::default();
        assert_eq!(opt.estimator, Estimator::Nsb);
        assert_eq!(opt.correction, Correction::BenjaminiHochberg);
        assert_eq!(opt.permutations, 0);
        assert!(opt.threads >= 1);
        assert!(!opt.inverse);
    }

    #[test]
    fn options_survive_bincode() {
        let opt = AnalysisOpt { exact_max: Some(12), seed: Some(9), ..AnalysisOpt::default() };
        let bytes = bincode::serialize(&opt).unwrap();
        let back: AnalysisOpt = bincode::deserialize(&bytes).unwrap();
        assert_eq!(back, opt);
    }

    #[test]
    fn empty_family_is_rejected() {
        let aln = Alignment::new(parse_coords("").unwrap());
        let err = run("empty", &aln, &AnalysisOpt::default()).unwrap_err();
        assert_eq!(err.downcast_ref::<TsfmError>(), Some(&TsfmError::EmptyFamily));
    }

    #[test]
    fn exact_table_uses_normalised_background() {
        let s = parse_coords("").unwrap();
        let recs: Vec<(&str, &[u8])> = vec![("A", b"G"), ("A", b"G"), ("B", b"C"), ("B", b"C")];
        let aln = Alignment::from_records(s, recs).unwrap();
        let table = exact_table(&aln, Weighting::Direct, 2);
        assert_eq!(table.len(), 2);
        assert_eq!(table[0], 0.0);
        assert!((table[1] - 0.5).abs() < 1e-12);
        // 两类等量时 inverse 背景与 direct 相同
        assert_eq!(exact_table(&aln, Weighting::Inverse, 2), table);
    }

    /// A 类 4 条全为 G，B 类 2 条全为 C；inverse 背景权重为 (1.5, 3.0)，即 (1/3, 2/3)
    fn skewed() -> Alignment {
        let s = parse_coords("").unwrap();
        let recs: Vec<(&str, &[u8])> =
            vec![("A", b"G"), ("A", b"G"), ("A", b"G"), ("A", b"G"), ("B", b"C"), ("B", b"C")];
        Alignment::from_records(s, recs).unwrap()
    }

    fn assert_heights(score: &SiteScore, expected: &[f64]) {
        let got: Vec<f64> = score.height.iter().map(|&(_, h)| h).collect();
        assert_eq!(got.len(), expected.len());
        for (g, e) in got.iter().zip(expected) {
            assert!((g - e).abs() < 1e-9, "{:?} vs {:?}", got, expected);
        }
    }

    #[test]
    fn inverse_background_with_unequal_classes() {
        let aln = skewed();
        assert_eq!(Weighting::Inverse.background(aln.classes()), vec![1.5, 3.0]);
        let g = (Site::Single(0), Symbol::Single(b'G'));
        let c = (Site::Single(0), Symbol::Single(b'C'));

        // G: [4, 0] -> 加伪计数 [5, 1] -> 反转 (6/5, 6)，n = 6，前景 H(1/6, 5/6)
        // C: [0, 2] -> [1, 3] -> (4, 4/3)，n = 4，前景 H(3/4, 1/4)
        let bg = -(1.0 / 3.0 * (1.0f64 / 3.0).log2() + 2.0 / 3.0 * (2.0f64 / 3.0).log2());
        let fg_g = -(1.0 / 6.0 * (1.0f64 / 6.0).log2() + 5.0 / 6.0 * (5.0f64 / 6.0).log2());

        let mm = InfoCalculator::new(Estimator::MillerMadow, Weighting::Inverse, &[]).compute(&aln);
        let sg = &mm[&g.0][&g.1];
        let expected = bg - 1.0 / (6.0 * 4f64.ln()) - fg_g;
        assert!((sg.info - expected).abs() < 1e-9);
        assert!((sg.info - 0.148_048_83).abs() < 1e-6);
        // (1/6)/(1/3) : (5/6)/(2/3) = 0.5 : 1.25
        assert_heights(sg, &[0.5 / 1.75, 1.25 / 1.75]);
        let sc = &mm[&c.0][&c.1];
        assert_eq!(sc.info, 0.0);
        // (3/4)/(1/3) : (1/4)/(2/3) = 2.25 : 0.375
        assert_heights(sc, &[2.25 / 2.625, 0.375 / 2.625]);

        // 精确表按 (1/3, 2/3) 抽样：E[H] 在 n = 2 时为 2·(1/3)(2/3)·1 = 4/9
        let exact = exact_table(&aln, Weighting::Inverse, 6);
        assert_eq!(exact.len(), 6);
        assert!((exact[1] - 4.0 / 9.0).abs() < 1e-12);
        assert!((exact[3] - 0.696_927_468_868_707_4).abs() < 1e-9);
        assert!((exact[5] - 0.779_277_536_670_248_2).abs() < 1e-9);

        let ex = InfoCalculator::new(Estimator::MillerMadow, Weighting::Inverse, &exact).compute(&aln);
        let sg = &ex[&g.0][&g.1];
        assert!((sg.info - (exact[5] - fg_g)).abs() < 1e-9);
        assert!((sg.info - 0.129_255_115).abs() < 1e-6);
        assert_heights(sg, &[0.5 / 1.75, 1.25 / 1.75]);
        assert_eq!(ex[&c.0][&c.1].info, 0.0);
    }
}
