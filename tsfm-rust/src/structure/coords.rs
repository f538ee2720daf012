use super::{Arm, BasePair, Structure};
use crate::error::{Result, TsfmError};

/// 坐标列表格式：每行 `[臂标签;]i:j,i:j,...`，空行与 `#` 注释行跳过。
pub fn parse_coords(text: &str) -> Result<Structure> {
    let mut pairs = Vec::new();
    for (ln, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let (arm, body) = match line.split_once(';') {
            Some((label, rest)) => (Arm::from_label(label), rest),
            None => (Arm::Unlabelled, line),
        };
        for token in body.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            let (i, j) = parse_pair(token).ok_or_else(|| TsfmError::MalformedCoordinate {
                line: ln + 1,
                token: token.to_string(),
            })?;
            pairs.push(BasePair { i, j, arm });
        }
    }
    Structure::new(pairs)
}

fn parse_pair(token: &str) -> Option<(usize, usize)> {
    let (a, b) = token.split_once(':')?;
    Some((a.trim().parse().ok()?, b.trim().parse().ok()?))
}
