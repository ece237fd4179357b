use core::fmt::{self, Display, Formatter};

use crate::layout::Symbol;

/// 布局检查失败的原因。内核侧遇到即 panic，主机侧报告后以非零码退出
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LayoutError {
    /// 镜像起点不在平台基址上
    BaseMismatch { expected: usize, found: usize },
    /// ELF 入口点不是镜像起点
    EntryMismatch { expected: usize, found: usize },
    /// 该边界必须页对齐
    Unaligned { symbol: Symbol, addr: usize },
    /// `before` 的地址大于 `after`
    OutOfOrder { before: Symbol, after: Symbol },
    /// 相邻两段之间的空隙超过了对齐填充
    Gap { after: Symbol, before: Symbol, len: usize },
    /// 启动栈大小与配置不符
    StackSize { expected: usize, found: usize },
    /// 镜像越过了平台内存上限
    ExceedsMemory { end: usize, limit: usize },
    /// 地址计算越过了地址空间顶部
    AddressOverflow,
    /// 镜像中找不到边界符号
    MissingSymbol(Symbol),
    /// 跳板引用的符号无法解析
    UnresolvedSymbol(&'static str),
    /// 镜像里残留了应当丢弃的段，值为命中的段名前缀
    ForbiddenSection(&'static str),
    /// ELF 解析错误
    Elf(&'static str),
}

impl Display for LayoutError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            LayoutError::BaseMismatch { expected, found } => write!(
                f,
                "image starts at {:#x}, expected base address {:#x}",
                found, expected
            ),
            LayoutError::EntryMismatch { expected, found } => write!(
                f,
                "entry point {:#x} is not the image start {:#x}",
                found, expected
            ),
            LayoutError::Unaligned { symbol, addr } => write!(
                f,
                "{} = {:#x} is not page aligned",
                symbol.name(),
                addr
            ),
            LayoutError::OutOfOrder { before, after } => write!(
                f,
                "{} must not lie above {}",
                before.name(),
                after.name()
            ),
            LayoutError::Gap { after, before, len } => write!(
                f,
                "{:#x} bytes between {} and {} exceed alignment padding",
                len,
                after.name(),
                before.name()
            ),
            LayoutError::StackSize { expected, found } => write!(
                f,
                "boot stack is {:#x} bytes, expected {:#x}",
                found, expected
            ),
            LayoutError::ExceedsMemory { end, limit } => write!(
                f,
                "image ends at {:#x}, beyond memory end {:#x}",
                end, limit
            ),
            LayoutError::AddressOverflow => write!(f, "address computation overflowed"),
            LayoutError::MissingSymbol(symbol) => {
                write!(f, "boundary symbol {} is not defined", symbol.name())
            }
            LayoutError::UnresolvedSymbol(name) => write!(f, "unresolved symbol {}", name),
            LayoutError::ForbiddenSection(prefix) => {
                write!(f, "image still contains {}* sections", prefix)
            }
            LayoutError::Elf(msg) => write!(f, "malformed elf: {}", msg),
        }
    }
}

#[cfg(any(test, feature = "std"))]
impl std::error::Error for LayoutError {}
