//! 括号串的臂状态机。
//!
//! `>` 为开括号、`<` 为闭括号，其余字符不改变状态。自左向右扫描时维护：
//! - 未匹配开括号位置的栈；
//! - 臂状态 `Start -> AD -> D -> C -> CC -> T -> A`；
//! - T 臂计数：T 状态下压栈的开括号数，归零后下一个闭括号落入受体臂。
//!
//! 不在转移表中的括号被静默忽略。

use super::{Arm, BasePair, Structure};
use crate::error::{Result, TsfmError};

pub const OPEN: u8 = b'>';
pub const CLOSE: u8 = b'<';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArmState {
    Start,
    /// 受体臂 5' 端与 D 臂的开括号
    AD,
    D,
    C,
    /// 反密码子臂已开始闭合
    CC,
    T,
    A,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Open,
    Close(Arm),
    Ignore,
}

/// 转移表：(当前状态, 符号, T 臂计数) -> (下一状态, 动作)。
///
/// 匹配顺序即优先级；未列出的组合返回 `Ignore` 且状态不变。
pub fn transition(state: ArmState, sym: u8, t_open: usize) -> (ArmState, Action) {
    use ArmState::*;
    match (state, sym) {
        (Start | AD, OPEN) => (AD, Action::Open),
        (AD | D, CLOSE) => (D, Action::Close(Arm::D)),
        (D | C, OPEN) => (C, Action::Open),
        (C | CC, CLOSE) => (CC, Action::Close(Arm::Anticodon)),
        (CC | T, OPEN) => (T, Action::Open),
        (T, CLOSE) if t_open > 0 => (T, Action::Close(Arm::T)),
        (T | A, CLOSE) => (A, Action::Close(Arm::Acceptor)),
        _ => (state, Action::Ignore),
    }
}

/// 解析括号串为碱基对。
///
/// 合法状态下的闭括号遇到空栈时返回 [`TsfmError::UnmatchedClose`]；
/// 扫描结束后残留的开括号不报错。
pub fn parse_bracket(ss: &str) -> Result<Structure> {
    let mut stack: Vec<usize> = Vec::new();
    let mut pairs: Vec<BasePair> = Vec::new();
    let mut state = ArmState::Start;
    let mut t_open = 0usize;

    for (pos, &sym) in ss.as_bytes().iter().enumerate() {
        let (next, action) = transition(state, sym, t_open);
        match action {
            Action::Open => {
                stack.push(pos);
                if next == ArmState::T {
                    t_open += 1;
                }
            }
            Action::Close(arm) => {
                let i = stack.pop().ok_or(TsfmError::UnmatchedClose(pos))?;
                if arm == Arm::T {
                    t_open -= 1;
                }
                pairs.push(BasePair { i, j: pos, arm });
            }
            Action::Ignore => {}
        }
        state = next;
    }

    log::debug!("parsed {} base pairs from {} bracket symbols", pairs.len(), ss.len());
    Structure::new(pairs)
}

/// cove 格式：每行 `#=CS <括号片段>`，片段按行拼接后交给状态机。
pub fn parse_cove(text: &str) -> Result<Structure> {
    let mut ss = String::new();
    for line in text.lines() {
        let mut fields = line.split_whitespace();
        if fields.next() != Some("#=CS") {
            continue;
        }
        if let Some(run) = fields.next() {
            ss.push_str(run);
        }
    }
    parse_bracket(&ss)
}
