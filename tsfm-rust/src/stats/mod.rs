//! 显著性检验：置换零分布、经验 p 值与多重检验校正。

pub mod multitest;
pub mod null;
pub mod significance;

pub use multitest::Correction;
pub use null::{FreqTable, NullDistribution, NullTails, TailTable};
pub use significance::{assess, Significance, SignificanceTable};
