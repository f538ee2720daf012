//! 演示如何在 library 模式下使用 tsfm-rust 计算功能信息与显著性。
//!
//! 运行方式：
//! ```bash
//! cargo run --example function_logo
//! ```

use tsfm_rust::alignment::{Alignment, Site, Symbol};
use tsfm_rust::analysis::{self, AnalysisOpt};
use tsfm_rust::distance;
use tsfm_rust::entropy::Estimator;
use tsfm_rust::structure::parse_cove;

const COVE: &str = "#=CS >>..>.....<.....<..<\n";

fn main() -> anyhow::Result<()> {
    // 1. 解析二级结构
    let structure = parse_cove(COVE)?;
    println!("碱基对: {:?}", structure.coords().collect::<Vec<_>>());

    // 2. 构建序列家族：两个功能类别在第 0/19 位配对上不同
    let mut records: Vec<(&str, &[u8])> = Vec::new();
    for _ in 0..6 {
        records.push(("A", b"GCAAUCCCCCGAAAAAUGGC"));
        records.push(("B", b"CGAAUCCCCCGAAAAAUGCG"));
    }
    records.push(("A", b"GCAAACCCCCUAAAAAUGGC"));
    let aln = Alignment::from_records(structure, records)?;
    println!("序列数: {}, 宽度: {}, 类别: {:?}", aln.len(), aln.width(), aln.classes().labels());

    // 3. 运行分析
    let opt = AnalysisOpt {
        estimator: Estimator::MillerMadow,
        inverse: true,
        exact_max: Some(8),
        permutations: 200,
        seed: Some(2024),
        ..AnalysisOpt::default()
    };
    let result = analysis::run("demo", &aln, &opt)?;

    if let Some(s) = result.get(false, Site::Pair(0, 19), Symbol::Pair(b'G', b'C')) {
        println!("\n(0, 19) GC: info={:.3} p={:?}", s.info, s.p);
        for h in &s.heights {
            println!("  {} -> {:.3}", h.class, h.height);
        }
    }

    // 4. 文本输出
    println!("\n{}", result.to_text());

    // 5. 与 NSB 估计的结果比较
    let nsb = analysis::run("demo-nsb", &aln, &AnalysisOpt { estimator: Estimator::Nsb, ..opt })?;
    let matrix = distance::rjsd_matrix(&[("miller", &result), ("nsb", &nsb)]);
    println!("rJSD 距离矩阵:\n{}", matrix);
    Ok(())
}
