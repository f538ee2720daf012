//! 结果记录的制表符分隔文本编码。
//!
//! ```text
//! #bp   coord   state  N  info  [p-value  <校正方法>]  class:height[:p-value:<校正方法>]
//! bp:   (0, 3)  GC     2  0.811 [0.010000 0.020000]    A:0.750[:0.010000:0.030000] B:0.250...
//! ```
//!
//! 段落依次为 `#bp`、`#ibp`、`#ss`、`#iss`，反向段落只在有反向统计时输出。
//! info 与高度保留 3 位小数，p 值保留 6 位。

use std::fmt::Write as _;
use std::io::{BufRead, BufReader, Write};

use anyhow::anyhow;

use super::{ClassHeight, ResultRecord, SymbolStats};
use crate::alignment::{Site, Symbol};
use crate::error::{Result, TsfmError};
use crate::stats::Correction;

const SECTIONS: [(&str, bool, bool); 4] = [("bp", false, true), ("ibp", true, true), ("ss", false, false), ("iss", true, false)];

fn header(tag: &str, correction: Option<&str>) -> String {
    match correction {
        Some(c) => format!("#{}\tcoord\tstate\tN\tinfo\tp-value\t{}\tclass:height:p-value:{}", tag, c, c),
        None => format!("#{}\tcoord\tstate\tN\tinfo\tclass:height", tag),
    }
}

fn format_line(tag: &str, site: &Site, sym: &Symbol, s: &SymbolStats, with_p: bool) -> String {
    let mut line = format!("{}:\t{}\t{}\t{}\t{:05.3}", tag, site, sym, s.count, s.info);
    if with_p {
        let _ = write!(
            line,
            "\t{:08.6}\t{:08.6}",
            s.p.unwrap_or(1.0),
            s.p_corrected.unwrap_or(1.0)
        );
    }
    line.push('\t');
    let tokens: Vec<String> = s
        .heights
        .iter()
        .map(|h| {
            let mut t = format!("{}:{:05.3}", h.class, h.height);
            if with_p {
                let _ = write!(t, ":{:08.6}:{:08.6}", h.p.unwrap_or(1.0), h.p_corrected.unwrap_or(1.0));
            }
            t
        })
        .collect();
    line.push_str(&tokens.join(" "));
    line
}

impl ResultRecord {
    /// 写出文本编码
    pub fn write_text<W: Write>(&self, w: &mut W) -> std::io::Result<()> {
        let with_p = self.has_p();
        let correction = self
            .meta
            .correction
            .map(|c| c.to_string())
            .unwrap_or_else(|| "uncorrected".to_string());
        let corr = if with_p { Some(correction.as_str()) } else { None };

        for (tag, inverse, pairs) in SECTIONS {
            if inverse && !self.has_inverse() {
                continue;
            }
            writeln!(w, "{}", header(tag, corr))?;
            for (site, symbols) in self.sites(inverse, pairs) {
                for (sym, s) in symbols {
                    writeln!(w, "{}", format_line(tag, site, sym, s, with_p))?;
                }
            }
        }
        Ok(())
    }

    pub fn to_text(&self) -> String {
        let mut buf = Vec::new();
        // 写入 Vec 不会失败
        let _ = self.write_text(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    }

    pub fn write_text_file(&self, path: &str) -> anyhow::Result<()> {
        let f = std::fs::File::create(path)
            .map_err(|e| anyhow!("cannot create result file '{}': {}", path, e))?;
        let mut w = std::io::BufWriter::new(f);
        self.write_text(&mut w)?;
        w.flush()?;
        Ok(())
    }

    /// 解析文本编码；记录名由调用方给出
    pub fn parse_text(name: &str, text: &str) -> Result<ResultRecord> {
        let mut rec = ResultRecord::new(name);
        let mut with_p = false;
        for (idx, raw) in text.lines().enumerate() {
            let ln = idx + 1;
            let line = raw.trim_end_matches('\r');
            if line.trim().is_empty() {
                continue;
            }
            if let Some(head) = line.strip_prefix('#') {
                if head.contains("p-value") {
                    with_p = true;
                    let fields: Vec<&str> = head.split('\t').collect();
                    if let Some(name) = fields.get(6) {
                        rec.meta.correction = parse_correction(name)?;
                    }
                }
                continue;
            }
            let (inverse, site, sym, stats) = parse_line(line, ln, with_p)?;
            rec.stats_mut(inverse).entry(site).or_default().insert(sym, stats);
        }
        Ok(rec)
    }

    /// 读取文本结果文件，记录名取文件名
    pub fn read_text_file(path: &str) -> anyhow::Result<ResultRecord> {
        let f = std::fs::File::open(path)
            .map_err(|e| anyhow!("cannot open result file '{}': {}", path, e))?;
        let mut text = String::new();
        for line in BufReader::new(f).lines() {
            text.push_str(&line?);
            text.push('\n');
        }
        let name = path.rsplit('/').next().unwrap_or(path);
        let rec = ResultRecord::parse_text(name, &text)
            .map_err(|e| anyhow!("cannot parse result file '{}': {}", path, e))?;
        Ok(rec)
    }
}

fn bad(line: usize, msg: impl Into<String>) -> TsfmError {
    TsfmError::ResultFormat { line, msg: msg.into() }
}

fn parse_correction(name: &str) -> Result<Option<Correction>> {
    if name == "uncorrected" {
        return Ok(None);
    }
    name.parse().map(Some)
}

fn parse_f64(field: &str, line: usize, what: &str) -> Result<f64> {
    field.trim().parse().map_err(|_| bad(line, format!("invalid {} '{}'", what, field)))
}

fn parse_site(field: &str, pair: bool, line: usize) -> Result<Site> {
    let err = || bad(line, format!("invalid coordinate '{}'", field));
    if pair {
        let inner = field.trim().strip_prefix('(').and_then(|s| s.strip_suffix(')')).ok_or_else(err)?;
        let (a, b) = inner.split_once(',').ok_or_else(err)?;
        let i = a.trim().parse().map_err(|_| err())?;
        let j = b.trim().parse().map_err(|_| err())?;
        Ok(Site::Pair(i, j))
    } else {
        field.trim().parse().map(Site::Single).map_err(|_| err())
    }
}

fn parse_height(token: &str, line: usize, with_p: bool) -> Result<ClassHeight> {
    // 类别标签在最左侧，允许包含 ':'
    let parts: Vec<&str> = token.rsplitn(if with_p { 4 } else { 2 }, ':').collect();
    let expected = if with_p { 4 } else { 2 };
    if parts.len() != expected {
        return Err(bad(line, format!("invalid height token '{}'", token)));
    }
    let class = parts[expected - 1].to_string();
    let height = parse_f64(parts[expected - 2], line, "height")?;
    let (p, p_corrected) = if with_p {
        (Some(parse_f64(parts[1], line, "p-value")?), Some(parse_f64(parts[0], line, "p-value")?))
    } else {
        (None, None)
    };
    Ok(ClassHeight { class, height, p, p_corrected })
}

fn parse_line(line: &str, ln: usize, with_p: bool) -> Result<(bool, Site, Symbol, SymbolStats)> {
    let fields: Vec<&str> = line.split('\t').collect();
    let tag = fields[0].strip_suffix(':').ok_or_else(|| bad(ln, "missing record tag"))?;
    let (inverse, pair) = SECTIONS
        .iter()
        .find(|(t, _, _)| *t == tag)
        .map(|&(_, inv, pair)| (inv, pair))
        .ok_or_else(|| bad(ln, format!("unknown record tag '{}'", tag)))?;

    let expected = if with_p { 8 } else { 6 };
    if fields.len() != expected {
        return Err(bad(ln, format!("expected {} fields, found {}", expected, fields.len())));
    }
    let site = parse_site(fields[1], pair, ln)?;
    let sym = Symbol::parse(fields[2]).ok_or_else(|| bad(ln, format!("invalid state '{}'", fields[2])))?;
    if sym.is_pair() != pair {
        return Err(bad(ln, format!("state '{}' does not match record tag", fields[2])));
    }
    let count = fields[3].trim().parse().map_err(|_| bad(ln, format!("invalid count '{}'", fields[3])))?;
    let info = parse_f64(fields[4], ln, "info")?;
    let (p, p_corrected) = if with_p {
        (Some(parse_f64(fields[5], ln, "p-value")?), Some(parse_f64(fields[6], ln, "p-value")?))
    } else {
        (None, None)
    };
    let heights = fields[expected - 1]
        .split_whitespace()
        .map(|t| parse_height(t, ln, with_p))
        .collect::<Result<Vec<_>>>()?;
    Ok((inverse, site, sym, SymbolStats { count, info, p, p_corrected, heights }))
}
