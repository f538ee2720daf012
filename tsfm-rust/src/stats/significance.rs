use std::collections::BTreeMap;

use crate::alignment::{ClassId, Site, Symbol};
use crate::entropy::InfoTable;

use super::multitest::Correction;
use super::null::NullTails;

/// 一个 (位点, 符号) 的显著性：info 的 p 值与各类别高度的 p 值
#[derive(Debug, Clone, PartialEq)]
pub struct Significance {
    pub p: f64,
    pub p_corrected: f64,
    /// (类别, p, 校正后 p)
    pub classes: Vec<(ClassId, f64, f64)>,
}

pub type SignificanceTable = BTreeMap<Site, BTreeMap<Symbol, Significance>>;

/// 为真实数据的信息表计算经验 p 值并做多重检验校正。
///
/// 碱基对与单列位点分别成池校正；info 与高度的 p 值也各自独立校正。
/// 高度的查询量为 `info × height`。
pub fn assess(table: &InfoTable, tails: &NullTails, correction: Correction) -> SignificanceTable {
    let mut out = SignificanceTable::new();
    for (&site, scores) in table {
        let (info_tail, height_tail) = tails.for_site(site);
        let entries = scores
            .iter()
            .map(|(&sym, score)| {
                let classes = score
                    .height
                    .iter()
                    .map(|&(id, h)| (id, height_tail.p_value(score.info * h), 0.0))
                    .collect();
                let sig = Significance {
                    p: info_tail.p_value(score.info),
                    p_corrected: 0.0,
                    classes,
                };
                (sym, sig)
            })
            .collect();
        out.insert(site, entries);
    }

    correct_pool(&mut out, true, correction);
    correct_pool(&mut out, false, correction);
    out
}

fn correct_pool(table: &mut SignificanceTable, pairs: bool, correction: Correction) {
    let info: Vec<f64> = pool(table, pairs).map(|s| s.p).collect();
    let info_adj = correction.adjust(&info);
    for (s, adj) in pool_mut(table, pairs).zip(info_adj) {
        s.p_corrected = adj;
    }

    let heights: Vec<f64> = pool(table, pairs)
        .flat_map(|s| s.classes.iter().map(|c| c.1))
        .collect();
    let mut heights_adj = correction.adjust(&heights).into_iter();
    for s in pool_mut(table, pairs) {
        for c in &mut s.classes {
            if let Some(adj) = heights_adj.next() {
                c.2 = adj;
            }
        }
    }
}

fn pool(table: &SignificanceTable, pairs: bool) -> impl Iterator<Item = &Significance> {
    table
        .iter()
        .filter(move |(site, _)| site.is_pair() == pairs)
        .flat_map(|(_, m)| m.values())
}

fn pool_mut(table: &mut SignificanceTable, pairs: bool) -> impl Iterator<Item = &mut Significance> {
    table
        .iter_mut()
        .filter(move |(site, _)| site.is_pair() == pairs)
        .flat_map(|(_, m)| m.values_mut())
}
