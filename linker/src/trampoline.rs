//! 启动跳板：镜像中最先执行的两条指令。
//!
//! ```text
//! _start:
//!     la sp, boot_stack_top
//!     call rust_main
//! ```
//!
//! 只设置栈指针，然后转入高级语言入口，永不返回。
//! 若 `rust_main` 返回，行为未定义：`call` 之后没有任何指令。

use core::fmt::{self, Display, Formatter};

use crate::config::{BOOT_STACK_SIZE, PAGE_SIZE};
use crate::error::LayoutError;
use crate::layout::Symbol;

/// 镜像入口，链接脚本的 `ENTRY`
pub const ENTRY_SYMBOL: &str = "_start";
/// 高级语言入口
pub const KERNEL_MAIN: &str = "rust_main";

/// 跳板中的指令
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BootInstr {
    /// `la sp, symbol`，展开为 auipc + addi
    LoadStackPointer(&'static str),
    /// `call symbol`，展开为 auipc + jalr，写 ra
    Call(&'static str),
}

impl BootInstr {
    /// 未经链接器松弛时的编码长度
    pub fn size(&self) -> usize {
        8
    }
}

impl Display for BootInstr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            BootInstr::LoadStackPointer(symbol) => write!(f, "la sp, {}", symbol),
            BootInstr::Call(symbol) => write!(f, "call {}", symbol),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BootTrampoline {
    callee: &'static str,
}

impl Default for BootTrampoline {
    fn default() -> Self {
        Self::new()
    }
}

impl BootTrampoline {
    pub const fn new() -> Self {
        Self {
            callee: KERNEL_MAIN,
        }
    }

    pub fn callee(&self) -> &'static str {
        self.callee
    }

    pub fn instructions(&self) -> [BootInstr; 2] {
        [
            BootInstr::LoadStackPointer(Symbol::BootStackTop.name()),
            BootInstr::Call(self.callee),
        ]
    }

    /// `.text.entry` 的大小上限
    pub fn code_size(&self) -> usize {
        self.instructions().iter().map(BootInstr::size).sum()
    }

    /// 从 `entry` 处模拟执行跳板，直到控制权转出。
    ///
    /// `resolve` 给出符号地址；引用的符号无法解析时报错，相当于链接失败。
    pub fn run(
        &self,
        entry: usize,
        resolve: impl Fn(&str) -> Option<usize>,
    ) -> Result<BootTrace, LayoutError> {
        let mut hart = BootHart::new(entry);
        let program = self.instructions();
        for (i, instr) in program.iter().enumerate() {
            if let Some(target) = hart.step(instr, &resolve)? {
                return Ok(BootTrace {
                    entry,
                    stack_pointer: hart.sp,
                    link: hart.ra,
                    target,
                    pending: program.len() - i - 1,
                });
            }
        }
        // instructions() 总以 Call 结尾
        unreachable!()
    }
}

/// 跳板执行时可见的寄存器。只建模跳板会写的两个
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BootHart {
    pub pc: usize,
    pub sp: Option<usize>,
    pub ra: Option<usize>,
}

impl BootHart {
    pub fn new(pc: usize) -> Self {
        Self {
            pc,
            sp: None,
            ra: None,
        }
    }

    /// 执行一条指令；转移控制权时返回目标地址
    pub fn step(
        &mut self,
        instr: &BootInstr,
        resolve: impl Fn(&str) -> Option<usize>,
    ) -> Result<Option<usize>, LayoutError> {
        match *instr {
            BootInstr::LoadStackPointer(symbol) => {
                self.sp = Some(resolve(symbol).ok_or(LayoutError::UnresolvedSymbol(symbol))?);
                self.pc += instr.size();
                Ok(None)
            }
            BootInstr::Call(symbol) => {
                let target = resolve(symbol).ok_or(LayoutError::UnresolvedSymbol(symbol))?;
                self.ra = Some(self.pc + instr.size());
                self.pc = target;
                Ok(Some(target))
            }
        }
    }
}

/// 跳板执行结果
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BootTrace {
    pub entry: usize,
    /// 转出时的 sp
    pub stack_pointer: Option<usize>,
    /// `call` 写入的返回地址，指向跳板之外，不可返回
    pub link: Option<usize>,
    pub target: usize,
    /// 转出后跳板中尚未执行的指令数，恒为 0
    pub pending: usize,
}

/// 渲染 `entry.asm`：入口代码放进 `.text.entry`，启动栈放进 `.bss.stack`
impl Display for BootTrampoline {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "    .section .text.entry")?;
        writeln!(f, "    .globl {}", ENTRY_SYMBOL)?;
        writeln!(f, "{}:", ENTRY_SYMBOL)?;
        for instr in self.instructions().iter() {
            writeln!(f, "    {}", instr)?;
        }
        writeln!(f)?;
        writeln!(f, "    .section .bss.stack")?;
        writeln!(f, "    .balign {}", PAGE_SIZE)?;
        writeln!(f, "    .globl {}", Symbol::BootStack.name())?;
        writeln!(f, "{}:", Symbol::BootStack.name())?;
        writeln!(f, "    .space {}", BOOT_STACK_SIZE)?;
        writeln!(f, "    .globl {}", Symbol::BootStackTop.name())?;
        writeln!(f, "{}:", Symbol::BootStackTop.name())
    }
}
