//! 观测模型：带功能类别标签的比对序列集合。
//!
//! 序列数据与结构以 `Arc` 共享，置换副本只替换类别标签向量，
//! 因而复制一个副本的代价是 O(序列数)。

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TsfmError};
use crate::structure::Structure;
use crate::util::rna;

pub type ClassId = usize;

/// 位点：单个比对列或一个碱基对
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Site {
    Pair(usize, usize),
    Single(usize),
}

impl Site {
    pub fn is_pair(&self) -> bool {
        matches!(self, Site::Pair(..))
    }
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Site::Pair(i, j) => write!(f, "({}, {})", i, j),
            Site::Single(i) => write!(f, "{}", i),
        }
    }
}

/// 位点上观测到的符号：单碱基或碱基对
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Symbol {
    Single(u8),
    Pair(u8, u8),
}

impl Symbol {
    pub fn parse(s: &str) -> Option<Symbol> {
        match s.as_bytes() {
            [a] => Some(Symbol::Single(*a)),
            [a, b] => Some(Symbol::Pair(*a, *b)),
            _ => None,
        }
    }

    pub fn is_pair(&self) -> bool {
        matches!(self, Symbol::Pair(..))
    }

    pub fn contains_gap(&self) -> bool {
        match *self {
            Symbol::Single(a) => a == rna::GAP,
            Symbol::Pair(a, b) => a == rna::GAP || b == rna::GAP,
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Symbol::Single(a) => write!(f, "{}", a as char),
            Symbol::Pair(a, b) => write!(f, "{}{}", a as char, b as char),
        }
    }
}

/// 类别标签与各类别序列数。ClassId 按首次出现顺序分配。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassTable {
    labels: Vec<String>,
    counts: Vec<usize>,
}

impl ClassTable {
    fn intern(&mut self, label: &str) -> ClassId {
        match self.id(label) {
            Some(id) => id,
            None => {
                self.labels.push(label.to_string());
                self.counts.push(0);
                self.labels.len() - 1
            }
        }
    }

    pub fn id(&self, label: &str) -> Option<ClassId> {
        self.labels.iter().position(|l| l == label)
    }

    pub fn label(&self, id: ClassId) -> &str {
        &self.labels[id]
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn counts(&self) -> &[usize] {
        &self.counts
    }

    /// 类别数 k
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    /// 反转权重 total / count，用于 inverse 统计
    pub fn inverse_weights(&self) -> Vec<f64> {
        let total = self.total() as f64;
        self.counts.iter().map(|&c| total / c as f64).collect()
    }

}

#[derive(Debug, Clone)]
pub struct Alignment {
    structure: Arc<Structure>,
    seqs: Arc<Vec<Vec<u8>>>,
    labels: Vec<ClassId>,
    classes: ClassTable,
    width: Option<usize>,
    pair_symbols: BTreeSet<Symbol>,
    single_symbols: BTreeSet<Symbol>,
}

impl Alignment {
    pub fn new(structure: Structure) -> Self {
        Self {
            structure: Arc::new(structure),
            seqs: Arc::new(Vec::new()),
            labels: Vec::new(),
            classes: ClassTable::default(),
            width: None,
            pair_symbols: BTreeSet::new(),
            single_symbols: BTreeSet::new(),
        }
    }

    pub fn from_records<'a, I>(structure: Structure, records: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a [u8])>,
    {
        let mut aln = Self::new(structure);
        for (class, seq) in records {
            aln.add(class, seq)?;
        }
        Ok(aln)
    }

    /// 追加一条序列。首条序列确定比对宽度，之后长度不一致返回
    /// [`TsfmError::ShapeMismatch`]；结构坐标越界在首条序列处报告。
    ///
    /// 类别标签不得为空或含空白，序列只接受可打印 ASCII，
    /// 二者都会原样写入结果文本。
    pub fn add(&mut self, class: &str, seq: &[u8]) -> Result<()> {
        if class.is_empty() || class.chars().any(char::is_whitespace) {
            return Err(TsfmError::InvalidLabel(class.to_string()));
        }
        let seq = rna::normalize_seq(seq);
        if let Some(pos) = seq.iter().position(|b| !b.is_ascii_graphic()) {
            return Err(TsfmError::InvalidSymbol { index: self.seqs.len(), pos, byte: seq[pos] });
        }
        match self.width {
            Some(w) if w != seq.len() => {
                return Err(TsfmError::ShapeMismatch {
                    expected: w,
                    found: seq.len(),
                    index: self.seqs.len(),
                });
            }
            Some(_) => {}
            None => {
                self.structure.check_bounds(seq.len())?;
                self.width = Some(seq.len());
            }
        }

        self.single_symbols.extend(seq.iter().map(|&b| Symbol::Single(b)));
        for (i, j) in self.structure.coords() {
            self.pair_symbols.insert(Symbol::Pair(seq[i], seq[j]));
        }

        let id = self.classes.intern(class);
        self.classes.counts[id] += 1;
        self.labels.push(id);
        Arc::make_mut(&mut self.seqs).push(seq);
        Ok(())
    }

    /// 以新的标签向量构造副本，结构与序列数据共享。
    ///
    /// `labels` 必须是当前标签的一个排列，类别计数因此保持不变。
    pub fn relabel(&self, labels: Vec<ClassId>) -> Alignment {
        debug_assert_eq!(labels.len(), self.labels.len());
        Alignment {
            structure: Arc::clone(&self.structure),
            seqs: Arc::clone(&self.seqs),
            labels,
            classes: self.classes.clone(),
            width: self.width,
            pair_symbols: self.pair_symbols.clone(),
            single_symbols: self.single_symbols.clone(),
        }
    }

    /// 序列条数
    pub fn len(&self) -> usize {
        self.seqs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seqs.is_empty()
    }

    /// 比对宽度（列数）
    pub fn width(&self) -> usize {
        self.width.unwrap_or(0)
    }

    pub fn structure(&self) -> &Structure {
        &self.structure
    }

    pub fn classes(&self) -> &ClassTable {
        &self.classes
    }

    pub fn labels(&self) -> &[ClassId] {
        &self.labels
    }

    pub fn pair_symbols(&self) -> &BTreeSet<Symbol> {
        &self.pair_symbols
    }

    pub fn single_symbols(&self) -> &BTreeSet<Symbol> {
        &self.single_symbols
    }

    /// 先全部碱基对位点，再全部单列位点
    pub fn sites(&self) -> impl Iterator<Item = Site> + '_ {
        self.structure
            .coords()
            .map(|(i, j)| Site::Pair(i, j))
            .chain((0..self.width()).map(Site::Single))
    }

    #[inline]
    pub fn symbol_at(&self, seq: usize, site: Site) -> Symbol {
        let s = &self.seqs[seq];
        match site {
            Site::Pair(i, j) => Symbol::Pair(s[i], s[j]),
            Site::Single(i) => Symbol::Single(s[i]),
        }
    }

    /// 每个类别中在 `site` 处符号等于 `symbol` 的序列数。
    pub fn count(&self, site: Site, symbol: Symbol) -> Vec<u32> {
        let mut counts = vec![0u32; self.classes.len()];
        for (idx, &class) in self.labels.iter().enumerate() {
            if self.symbol_at(idx, site) == symbol {
                counts[class] += 1;
            }
        }
        counts
    }

    /// 单次扫描得到位点上所有已观测符号的按类计数，等价于对每个符号调用 [`count`](Self::count)。
    pub fn tally(&self, site: Site) -> BTreeMap<Symbol, Vec<u32>> {
        let k = self.classes.len();
        let mut out: BTreeMap<Symbol, Vec<u32>> = BTreeMap::new();
        for (idx, &class) in self.labels.iter().enumerate() {
            let counts = out.entry(self.symbol_at(idx, site)).or_insert_with(|| vec![0u32; k]);
            counts[class] += 1;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structure::parse_coords;

    fn toy() -> Alignment {
        let s = parse_coords("0:3").unwrap();
        Alignment::from_records(
            s,
            [
                ("A", &b"GAAC"[..]),
                ("A", &b"GUAC"[..]),
                ("B", &b"AAAT"[..]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn add_builds_class_table_and_alphabets() {
        let aln = toy();
        assert_eq!(aln.len(), 3);
        assert_eq!(aln.width(), 4);
        assert_eq!(aln.classes().labels(), &["A".to_string(), "B".to_string()]);
        assert_eq!(aln.classes().counts(), &[2, 1]);
        let pairs: Vec<String> = aln.pair_symbols().iter().map(ToString::to_string).collect();
        assert_eq!(pairs, vec!["AU", "GC"]);
        let singles: Vec<String> = aln.single_symbols().iter().map(ToString::to_string).collect();
        assert_eq!(singles, vec!["A", "C", "G", "U"]);
    }

    #[test]
    fn count_single_and_pair() {
        let aln = toy();
        assert_eq!(aln.count(Site::Single(0), Symbol::Single(b'G')), vec![2, 0]);
        assert_eq!(aln.count(Site::Single(1), Symbol::Single(b'A')), vec![1, 1]);
        assert_eq!(aln.count(Site::Pair(0, 3), Symbol::Pair(b'A', b'U')), vec![0, 1]);
        assert_eq!(aln.count(Site::Pair(0, 3), Symbol::Pair(b'U', b'A')), vec![0, 0]);
    }

    #[test]
    fn tally_matches_count() {
        let aln = toy();
        for site in aln.sites() {
            for (sym, counts) in aln.tally(site) {
                assert_eq!(counts, aln.count(site, sym));
            }
        }
    }

    #[test]
    fn shape_mismatch_is_rejected() {
        let mut aln = toy();
        let err = aln.add("B", b"GAA").unwrap_err();
        assert_eq!(err, TsfmError::ShapeMismatch { expected: 4, found: 3, index: 3 });
        assert_eq!(aln.len(), 3);
    }

    #[test]
    fn structure_out_of_range() {
        let s = parse_coords("0:9").unwrap();
        let mut aln = Alignment::new(s);
        assert_eq!(
            aln.add("A", b"GAAC").unwrap_err(),
            TsfmError::CoordinateOutOfRange { pos: 9, len: 4 }
        );
    }

    #[test]
    fn relabel_shares_data() {
        let aln = toy();
        let swapped = aln.relabel(vec![1, 0, 0]);
        assert_eq!(swapped.count(Site::Single(0), Symbol::Single(b'G')), vec![1, 1]);
        assert_eq!(swapped.classes().counts(), aln.classes().counts());
        assert!(Arc::ptr_eq(&aln.seqs, &swapped.seqs));
    }

    #[test]
    fn inverse_weights_follow_class_sizes() {
        let aln = toy();
        assert_eq!(aln.classes().inverse_weights(), vec![1.5, 3.0]);
    }

    #[test]
    fn labels_with_whitespace_are_rejected() {
        let mut aln = toy();
        for label in ["class A", "B\t", "", " "] {
            let err = aln.add(label, b"GAAC").unwrap_err();
            assert_eq!(err, TsfmError::InvalidLabel(label.to_string()));
        }
        // 冒号可以出现在标签中
        aln.add("Thr:GGU", b"GAAC").unwrap();
        assert_eq!(aln.len(), 4);
    }

    #[test]
    fn non_printable_bytes_are_rejected() {
        let mut aln = toy();
        let err = aln.add("A", &[b'G', 0xc3, b'A', b'C']).unwrap_err();
        assert_eq!(err, TsfmError::InvalidSymbol { index: 3, pos: 1, byte: 0xc3 });
        let err = aln.add("A", b"GA C").unwrap_err();
        assert_eq!(err, TsfmError::InvalidSymbol { index: 3, pos: 2, byte: b' ' });
        // 失败的追加不改变已有数据
        assert_eq!(aln.len(), 3);
        assert_eq!(aln.classes().counts(), &[2, 1]);
    }

    #[test]
    fn symbol_parse_and_display() {
        assert_eq!(Symbol::parse("GC"), Some(Symbol::Pair(b'G', b'C')));
        assert_eq!(Symbol::parse("-"), Some(Symbol::Single(b'-')));
        assert_eq!(Symbol::parse("ABC"), None);
        assert!(Symbol::Pair(b'G', b'-').contains_gap());
        assert_eq!(Site::Pair(0, 72).to_string(), "(0, 72)");
    }
}
