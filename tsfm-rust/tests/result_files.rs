use tempfile::tempdir;

use tsfm_rust::alignment::{Alignment, Site, Symbol};
use tsfm_rust::analysis::{self, AnalysisOpt};
use tsfm_rust::distance::rjsd_matrix;
use tsfm_rust::entropy::Estimator;
use tsfm_rust::result::ResultRecord;
use tsfm_rust::structure::parse_cove;
use tsfm_rust::TsfmError;

fn family(flip: bool) -> Alignment {
    let s = parse_cove("#=CS >..>..<..<\n").unwrap();
    let mut recs: Vec<(&str, &[u8])> = Vec::new();
    for _ in 0..4 {
        recs.push(("A", b"GAAGAACAAC"));
        recs.push(("B", if flip { b"GAAGAACAAC" } else { b"CAAUAAAAAG" }));
        recs.push(("C", b"AAAUAAAAAU"));
    }
    Alignment::from_records(s, recs).unwrap()
}

fn analysed(name: &str, flip: bool) -> ResultRecord {
    let opt = AnalysisOpt {
        estimator: Estimator::MillerMadow,
        inverse: true,
        permutations: 10,
        threads: 2,
        seed: Some(3),
        ..AnalysisOpt::default()
    };
    analysis::run(name, &family(flip), &opt).unwrap()
}

#[test]
fn text_file_round_trip() {
    let rec = analysed("fam", false);
    let dir = tempdir().unwrap();
    let path = dir.path().join("fam_results.txt");
    let path = path.to_str().unwrap();
    rec.write_text_file(path).unwrap();

    let back = ResultRecord::read_text_file(path).unwrap();
    assert_eq!(back.name, "fam_results.txt");
    assert_eq!(back.meta.correction, rec.meta.correction);
    assert_eq!(back.to_text(), rec.to_text());

    for inverse in [false, true] {
        for (site, symbols) in rec.stats(inverse) {
            for (sym, s) in symbols {
                let b = back.get(inverse, *site, *sym).unwrap();
                assert_eq!(b.count, s.count);
                assert!((b.info - s.info).abs() <= 5e-4);
                assert!((b.p.unwrap() - s.p.unwrap()).abs() <= 5e-7);
                assert_eq!(b.heights.len(), s.heights.len());
                for (hb, hs) in b.heights.iter().zip(&s.heights) {
                    assert_eq!(hb.class, hs.class);
                    assert!((hb.height - hs.height).abs() <= 5e-4);
                }
            }
        }
    }
}

#[test]
fn binary_snapshot_round_trip() {
    let rec = analysed("fam", false);
    assert!(rec.meta.created.is_some());
    let dir = tempdir().unwrap();
    let path = dir.path().join("fam.tsfm");
    let path = path.to_str().unwrap();
    rec.save_to_file(path).unwrap();
    let back = ResultRecord::load_from_file(path).unwrap();
    assert_eq!(back, rec);
}

#[test]
fn missing_file_is_reported() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("absent.txt");
    let err = ResultRecord::read_text_file(path.to_str().unwrap()).unwrap_err();
    assert!(err.to_string().contains("cannot open result file"));
}

#[test]
fn distance_between_families() {
    let a = analysed("a", false);
    let a2 = analysed("a2", false);
    let b = analysed("b", true);
    let m = rjsd_matrix(&[("a", &a), ("a2", &a2), ("b", &b)]);
    assert_eq!(m.names, vec!["a", "a2", "b"]);
    assert!(m.get("a", "a2").unwrap().abs() < 1e-12);
    let d = m.get("a", "b").unwrap();
    assert!(d > 0.0);
    assert_eq!(m.get("b", "a"), Some(d));

    // 文本往返后的记录距离不变（数值已按 3 位小数比较）
    let a_text = ResultRecord::parse_text("a", &a.to_text()).unwrap();
    let m2 = rjsd_matrix(&[("a", &a_text), ("b", &b)]);
    assert!((m2.get("a", "b").unwrap() - d).abs() < 1e-9);
    assert!(a.get(false, Site::Pair(0, 9), Symbol::Pair(b'G', b'C')).is_some());
}

#[test]
fn class_labels_survive_text_round_trip() {
    let s = parse_cove("#=CS >..>..<..<\n").unwrap();
    let recs: Vec<(&str, &[u8])> = vec![
        ("Thr:GGU", b"GAAGAACAAC"),
        ("Thr:GGU", b"GAAGAACAAC"),
        ("ala/1", b"CAAUAAAAAG"),
        ("ala/1", b"CAAUAAAAAG"),
    ];
    let aln = Alignment::from_records(s.clone(), recs).unwrap();
    let opt = AnalysisOpt { permutations: 5, threads: 1, seed: Some(2), ..AnalysisOpt::default() };
    let rec = analysis::run("labels", &aln, &opt).unwrap();

    let back = ResultRecord::parse_text("labels", &rec.to_text()).unwrap();
    assert_eq!(back.to_text(), rec.to_text());
    let gc = back.get(false, Site::Pair(0, 9), Symbol::Pair(b'G', b'C')).unwrap();
    assert_eq!(gc.heights[0].class, "Thr:GGU");

    // 含空白的标签写出后无法回读，在加入序列时即被拒绝
    let recs: Vec<(&str, &[u8])> = vec![("class A", b"GAAGAACAAC"), ("B", b"CAAUAAAAAG")];
    let err = Alignment::from_records(s, recs).unwrap_err();
    assert_eq!(err, TsfmError::InvalidLabel("class A".to_string()));
}
