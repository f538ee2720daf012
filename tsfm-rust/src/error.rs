use thiserror::Error;

/// 结构解析、序列聚合与结果文件读取中的致命错误。
///
/// 数值退化（零计数位点、log(0)、校正表越界）不在此列，由计算模块就地处理。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TsfmError {
    #[error("unmatched closing bracket at position {0}")]
    UnmatchedClose(usize),
    #[error("malformed coordinate '{token}' on line {line}")]
    MalformedCoordinate { line: usize, token: String },
    #[error("coordinate {0} is paired with itself")]
    SelfPair(usize),
    #[error("coordinate {0} appears in more than one base pair")]
    DoublyPaired(usize),
    #[error("coordinate {pos} lies outside an alignment of length {len}")]
    CoordinateOutOfRange { pos: usize, len: usize },
    #[error("sequence {index} has length {found}, expected {expected}")]
    ShapeMismatch { expected: usize, found: usize, index: usize },
    #[error("class label '{0}' is empty or contains whitespace")]
    InvalidLabel(String),
    #[error("sequence {index} has non-printable byte 0x{byte:02x} at column {pos}")]
    InvalidSymbol { index: usize, pos: usize, byte: u8 },
    #[error("no sequences in family")]
    EmptyFamily,
    #[error("unknown multiple-testing correction '{0}'")]
    UnknownCorrection(String),
    #[error("unknown entropy estimator '{0}'")]
    UnknownEstimator(String),
    #[error("result file line {line}: {msg}")]
    ResultFormat { line: usize, msg: String },
}

pub type Result<T> = std::result::Result<T, TsfmError>;
