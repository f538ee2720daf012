//! # tsfm-rust
//!
//! tRNA 结构–功能映射（tRNA Structure-Function Mapping）的 Rust 实现。
//!
//! 对带功能类别标签的一组比对序列，在每个单列位点与共有二级结构的每个碱基对上：
//!
//! - **信息量**：经有限样本校正（Miller–Madow 或 NSB）的功能信息（bits）
//! - **类别高度**：各功能类别对该信息的相对贡献，和为 1
//! - **显著性**：标签置换得到经验零分布，计算 p 值并做多重检验校正
//! - **inverse 统计**：以类别频率倒数加权，抵消类别样本量不均
//!
//! ## 快速示例
//!
//! ```rust,no_run
//! use tsfm_rust::alignment::Alignment;
//! use tsfm_rust::analysis::{self, AnalysisOpt};
//! use tsfm_rust::structure::parse_bracket;
//!
//! let structure = parse_bracket(">..<").unwrap();
//! let records: Vec<(&str, &[u8])> = vec![("A", b"GAAC"), ("B", b"AAAU")];
//! let aln = Alignment::from_records(structure, records).unwrap();
//!
//! let opt = AnalysisOpt { permutations: 100, seed: Some(1), ..AnalysisOpt::default() };
//! let result = analysis::run("toy", &aln, &opt).unwrap();
//! print!("{}", result.to_text());
//! ```
//!
//! ## 模块说明
//!
//! - [`structure`] — 括号串 / cove / 坐标列表解析为碱基对集合
//! - [`alignment`] — 序列与功能类别聚合，按类计数
//! - [`entropy`] — Shannon、Miller–Madow、NSB 估计与精确期望熵表
//! - [`permute`] — 标签置换与并行零分布累积
//! - [`stats`] — 经验 p 值与多重检验校正
//! - [`result`] — 结果记录的文本与二进制编码
//! - [`distance`] — 结果记录间的 rJSD 距离矩阵
//! - [`analysis`] — 参数与完整分析流程
//! - [`util`] — RNA 序列规范化

pub mod error;
pub mod util;
pub mod structure;
pub mod alignment;
pub mod entropy;
pub mod permute;
pub mod stats;
pub mod result;
pub mod distance;
pub mod analysis;

pub use error::TsfmError;
