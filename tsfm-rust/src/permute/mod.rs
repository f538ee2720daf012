//! 类别标签置换与置换零分布的并行累积。
//!
//! 每个置换副本由一个 `u64` 种子完全确定：副本内先把标签随机分入
//! `pieces` 个桶，每个桶用独立重新播种的生成器洗牌后按桶顺序拼接。
//! 副本之间不共享可变状态，结果只通过 [`NullDistribution::merge`] 汇总。

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::alignment::{Alignment, ClassId};
use crate::entropy::InfoCalculator;
use crate::stats::NullDistribution;

/// 两阶段分桶洗牌，输出为 `labels` 的一个均匀随机排列
pub fn permuted<R: Rng>(labels: &[ClassId], pieces: usize, rng: &mut R) -> Vec<ClassId> {
    let pieces = pieces.max(1);
    let mut buckets: Vec<Vec<ClassId>> = vec![Vec::new(); pieces];
    for &label in labels {
        buckets[rng.gen_range(0..pieces)].push(label);
    }
    let mut out = Vec::with_capacity(labels.len());
    for mut bucket in buckets {
        let mut local = StdRng::seed_from_u64(rng.gen());
        bucket.shuffle(&mut local);
        out.extend(bucket);
    }
    out
}

/// 由主种子派生 `count` 个副本种子；无主种子时取系统熵
pub fn replicate_seeds(count: usize, seed: Option<u64>) -> Vec<u64> {
    let mut master = match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    };
    (0..count).map(|_| master.gen()).collect()
}

/// 单个置换副本
pub fn replicate(aln: &Alignment, seed: u64, pieces: usize) -> Alignment {
    let mut rng = StdRng::seed_from_u64(seed);
    aln.relabel(permuted(aln.labels(), pieces, &mut rng))
}

/// 对每个种子生成置换副本、计算信息表并累积零分布。
///
/// 在调用方所在的 rayon 线程池中执行。
pub fn null_distribution(
    aln: &Alignment,
    calc: &InfoCalculator<'_>,
    seeds: &[u64],
    pieces: usize,
) -> NullDistribution {
    seeds
        .par_iter()
        .map(|&seed| {
            let rep = replicate(aln, seed, pieces);
            NullDistribution::from_table(&calc.compute(&rep))
        })
        .reduce(NullDistribution::default, NullDistribution::merge)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entropy::{Estimator, Weighting};
    use crate::structure::parse_coords;

    fn family() -> Alignment {
        let s = parse_coords("0:3").unwrap();
        let recs: Vec<(&str, &[u8])> = vec![
            ("A", b"GAAC"), ("A", b"GACC"), ("A", b"GUAC"),
            ("B", b"AAAU"), ("B", b"AGAU"), ("C", b"CAAG"),
        ];
        Alignment::from_records(s, recs).unwrap()
    }

    fn sorted(mut v: Vec<ClassId>) -> Vec<ClassId> {
        v.sort_unstable();
        v
    }

    #[test]
    fn permutation_preserves_multiset() {
        let labels = vec![0, 0, 0, 1, 1, 2, 2, 2, 2];
        let mut rng = StdRng::seed_from_u64(7);
        for pieces in [1, 2, 4, 16] {
            let p = permuted(&labels, pieces, &mut rng);
            assert_eq!(sorted(p), labels);
        }
        assert!(permuted(&[], 3, &mut rng).is_empty());
    }

    #[test]
    fn permutation_is_roughly_uniform() {
        // 标签 0 出现在第一个位置的频率应约为 1/3
        let labels = vec![0, 1, 2];
        let mut rng = StdRng::seed_from_u64(11);
        let trials = 6000;
        let hits = (0..trials)
            .filter(|_| permuted(&labels, 2, &mut rng)[0] == 0)
            .count();
        let freq = hits as f64 / trials as f64;
        assert!((freq - 1.0 / 3.0).abs() < 0.03, "freq = {}", freq);
    }

    #[test]
    fn seeds_are_reproducible() {
        assert_eq!(replicate_seeds(5, Some(42)), replicate_seeds(5, Some(42)));
        assert_ne!(replicate_seeds(5, Some(42)), replicate_seeds(5, Some(43)));
        assert_eq!(replicate_seeds(0, None).len(), 0);
    }

    #[test]
    fn replicate_keeps_class_counts() {
        let aln = family();
        let rep = replicate(&aln, 3, 2);
        assert_eq!(rep.classes().counts(), aln.classes().counts());
        assert_eq!(sorted(rep.labels().to_vec()), sorted(aln.labels().to_vec()));
        assert_eq!(rep.len(), aln.len());
    }

    #[test]
    fn null_is_independent_of_replicate_order() {
        let aln = family();
        let calc = InfoCalculator::new(Estimator::MillerMadow, Weighting::Direct, &[]);
        let seeds = replicate_seeds(12, Some(5));
        let mut reversed = seeds.clone();
        reversed.reverse();
        let a = null_distribution(&aln, &calc, &seeds, 2);
        let b = null_distribution(&aln, &calc, &reversed, 2);
        assert_eq!(a, b);
        assert!(a.pair_info.total() > 0);
        assert!(a.single_height.total() >= a.single_info.total());
    }
}
