//! 结果记录：对外输出的统计量快照。
//!
//! 四类统计（碱基对、反向碱基对、单列、反向单列）按 direct / inverse 两张
//! [`SiteStats`] 存放，位点类型由 [`Site`] 区分。文本编码见 [`text`]，
//! 二进制快照使用 bincode。

use std::collections::BTreeMap;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::alignment::{Alignment, Site, Symbol};
use crate::entropy::{Estimator, InfoTable};
use crate::stats::{Correction, SignificanceTable};

pub mod text;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassHeight {
    pub class: String,
    pub height: f64,
    pub p: Option<f64>,
    pub p_corrected: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolStats {
    /// 位点上该符号的序列数
    pub count: usize,
    pub info: f64,
    pub p: Option<f64>,
    pub p_corrected: Option<f64>,
    /// 按高度降序
    pub heights: Vec<ClassHeight>,
}

pub type SiteStats = BTreeMap<Site, BTreeMap<Symbol, SymbolStats>>;

/// 运行元信息（可选）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunMeta {
    /// 生成时间（RFC 3339）
    pub created: Option<String>,
    pub estimator: Option<Estimator>,
    pub correction: Option<Correction>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub name: String,
    pub meta: RunMeta,
    pub direct: SiteStats,
    pub inverse: SiteStats,
}

impl ResultRecord {
    pub fn new(name: &str) -> Self {
        Self { name: name.to_string(), ..Default::default() }
    }

    pub fn stats(&self, inverse: bool) -> &SiteStats {
        if inverse {
            &self.inverse
        } else {
            &self.direct
        }
    }

    pub fn stats_mut(&mut self, inverse: bool) -> &mut SiteStats {
        if inverse {
            &mut self.inverse
        } else {
            &mut self.direct
        }
    }

    pub fn has_inverse(&self) -> bool {
        !self.inverse.is_empty()
    }

    /// 是否带有显著性检验结果
    pub fn has_p(&self) -> bool {
        self.direct
            .values()
            .chain(self.inverse.values())
            .flat_map(|m| m.values())
            .any(|s| s.p.is_some())
    }

    /// 碱基对位点或单列位点的迭代
    pub fn sites(&self, inverse: bool, pairs: bool) -> impl Iterator<Item = (&Site, &BTreeMap<Symbol, SymbolStats>)> {
        self.stats(inverse).iter().filter(move |(s, _)| s.is_pair() == pairs)
    }

    pub fn get(&self, inverse: bool, site: Site, symbol: Symbol) -> Option<&SymbolStats> {
        self.stats(inverse).get(&site)?.get(&symbol)
    }

    pub fn save_to_file(&self, path: &str) -> Result<()> {
        let mut f = std::fs::File::create(path)?;
        bincode::serialize_into(&mut f, self)?;
        Ok(())
    }

    pub fn load_from_file(path: &str) -> Result<Self> {
        let f = std::fs::File::open(path)?;
        let rec: Self = bincode::deserialize_from(f)?;
        Ok(rec)
    }
}

/// 由信息表（及可选的显著性表）整理出对外的统计量，类别以标签表示。
pub fn collect_stats(aln: &Alignment, table: &InfoTable, sig: Option<&SignificanceTable>) -> SiteStats {
    let classes = aln.classes();
    let mut out = SiteStats::new();
    for (&site, scores) in table {
        let tally = aln.tally(site);
        let mut per_symbol = BTreeMap::new();
        for (&sym, score) in scores {
            let count = tally.get(&sym).map(|c| c.iter().sum::<u32>() as usize).unwrap_or(0);
            let s = sig.and_then(|t| t.get(&site)).and_then(|m| m.get(&sym));
            let mut heights: Vec<ClassHeight> = score
                .height
                .iter()
                .map(|&(id, h)| {
                    let cp = s.and_then(|s| s.classes.iter().find(|c| c.0 == id));
                    ClassHeight {
                        class: classes.label(id).to_string(),
                        height: h,
                        p: cp.map(|c| c.1),
                        p_corrected: cp.map(|c| c.2),
                    }
                })
                .collect();
            heights.sort_by(|a, b| b.height.total_cmp(&a.height));
            per_symbol.insert(
                sym,
                SymbolStats {
                    count,
                    info: score.info,
                    p: s.map(|s| s.p),
                    p_corrected: s.map(|s| s.p_corrected),
                    heights,
                },
            );
        }
        out.insert(site, per_symbol);
    }
    out
}
