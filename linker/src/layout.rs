use core::ops::Range;

use crate::address::VirtAddr;
use crate::config::{Board, BOOT_STACK_SIZE, PAGE_SIZE};
use crate::error::LayoutError;
use crate::region::{Region, RegionKind};

/// 链接脚本导出的边界符号，按地址从低到高排列
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Symbol {
    /// 镜像起点，等于平台基址
    Skernel,
    /// 代码段开始，首先放置 `.text.entry`
    Stext,
    /// 跳板开始，独占整页，之后会被映射到每个地址空间的最高页
    Strampoline,
    Etrampoline,
    Etext,
    Srodata,
    Erodata,
    Sdata,
    Edata,
    /// 零初始化区开始，启动栈位于其头部
    SbssWithStack,
    BootStack,
    BootStackTop,
    /// 普通 bss 开始，`clear_bss` 从这里清零
    Sbss,
    Ebss,
    /// kernel 结束，后面内存可供分配
    Ekernel,
}

impl Symbol {
    pub const ALL: [Symbol; 15] = [
        Symbol::Skernel,
        Symbol::Stext,
        Symbol::Strampoline,
        Symbol::Etrampoline,
        Symbol::Etext,
        Symbol::Srodata,
        Symbol::Erodata,
        Symbol::Sdata,
        Symbol::Edata,
        Symbol::SbssWithStack,
        Symbol::BootStack,
        Symbol::BootStackTop,
        Symbol::Sbss,
        Symbol::Ebss,
        Symbol::Ekernel,
    ];

    /// 链接脚本与汇编中使用的符号名
    pub fn name(self) -> &'static str {
        match self {
            Symbol::Skernel => "skernel",
            Symbol::Stext => "stext",
            Symbol::Strampoline => "strampoline",
            Symbol::Etrampoline => "etrampoline",
            Symbol::Etext => "etext",
            Symbol::Srodata => "srodata",
            Symbol::Erodata => "erodata",
            Symbol::Sdata => "sdata",
            Symbol::Edata => "edata",
            Symbol::SbssWithStack => "sbss_with_stack",
            Symbol::BootStack => "boot_stack",
            Symbol::BootStackTop => "boot_stack_top",
            Symbol::Sbss => "sbss",
            Symbol::Ebss => "ebss",
            Symbol::Ekernel => "ekernel",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|symbol| symbol.name() == name)
    }

    /// 需要落在页边界上的符号。`stext`/`skernel` 由基址保证，`sbss` 紧跟启动栈
    pub fn page_aligned(self) -> bool {
        !matches!(self, Symbol::Sbss)
    }
}

/// 内核镜像布局：所有边界符号的值。
///
/// 链接时确定，运行期只读。内核通过 [`KernelLayout::from_fn`] 从链接器符号构造一次，
/// 主机侧由 [`crate::plan`] 推算或从 ELF 符号表读取。
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct KernelLayout {
    pub skernel: usize,
    pub stext: usize,
    pub strampoline: usize,
    pub etrampoline: usize,
    pub etext: usize,
    pub srodata: usize,
    pub erodata: usize,
    pub sdata: usize,
    pub edata: usize,
    pub sbss_with_stack: usize,
    pub boot_stack: usize,
    pub boot_stack_top: usize,
    pub sbss: usize,
    pub ebss: usize,
    pub ekernel: usize,
}

impl KernelLayout {
    /// 逐个符号取地址
    pub fn from_fn(mut address_of: impl FnMut(Symbol) -> usize) -> Self {
        Self {
            skernel: address_of(Symbol::Skernel),
            stext: address_of(Symbol::Stext),
            strampoline: address_of(Symbol::Strampoline),
            etrampoline: address_of(Symbol::Etrampoline),
            etext: address_of(Symbol::Etext),
            srodata: address_of(Symbol::Srodata),
            erodata: address_of(Symbol::Erodata),
            sdata: address_of(Symbol::Sdata),
            edata: address_of(Symbol::Edata),
            sbss_with_stack: address_of(Symbol::SbssWithStack),
            boot_stack: address_of(Symbol::BootStack),
            boot_stack_top: address_of(Symbol::BootStackTop),
            sbss: address_of(Symbol::Sbss),
            ebss: address_of(Symbol::Ebss),
            ekernel: address_of(Symbol::Ekernel),
        }
    }

    /// 同 [`KernelLayout::from_fn`]，任一符号缺失即报错
    pub fn resolve(
        mut lookup: impl FnMut(Symbol) -> Option<usize>,
    ) -> Result<Self, LayoutError> {
        let mut missing = None;
        let layout = Self::from_fn(|symbol| match lookup(symbol) {
            Some(addr) => addr,
            None => {
                missing.get_or_insert(symbol);
                0
            }
        });
        match missing {
            Some(symbol) => Err(LayoutError::MissingSymbol(symbol)),
            None => Ok(layout),
        }
    }

    pub fn get(&self, symbol: Symbol) -> usize {
        match symbol {
            Symbol::Skernel => self.skernel,
            Symbol::Stext => self.stext,
            Symbol::Strampoline => self.strampoline,
            Symbol::Etrampoline => self.etrampoline,
            Symbol::Etext => self.etext,
            Symbol::Srodata => self.srodata,
            Symbol::Erodata => self.erodata,
            Symbol::Sdata => self.sdata,
            Symbol::Edata => self.edata,
            Symbol::SbssWithStack => self.sbss_with_stack,
            Symbol::BootStack => self.boot_stack,
            Symbol::BootStackTop => self.boot_stack_top,
            Symbol::Sbss => self.sbss,
            Symbol::Ebss => self.ebss,
            Symbol::Ekernel => self.ekernel,
        }
    }

    /// 按名字查符号，供跳板模拟解析 `boot_stack_top` 等
    pub fn symbol(&self, name: &str) -> Option<usize> {
        Symbol::from_name(name).map(|symbol| self.get(symbol))
    }

    pub fn region(&self, kind: RegionKind) -> Region {
        let (start, end) = match kind {
            RegionKind::Text => (self.stext, self.etext),
            RegionKind::Rodata => (self.srodata, self.erodata),
            RegionKind::Data => (self.sdata, self.edata),
            RegionKind::Bss => (self.sbss_with_stack, self.ebss),
        };
        Region {
            kind,
            start: VirtAddr(start),
            end: VirtAddr(end),
        }
    }

    /// 四个输出段，按地址顺序
    pub fn regions(&self) -> [Region; 4] {
        [
            self.region(RegionKind::Text),
            self.region(RegionKind::Rodata),
            self.region(RegionKind::Data),
            self.region(RegionKind::Bss),
        ]
    }

    pub fn trampoline(&self) -> Range<usize> {
        self.strampoline..self.etrampoline
    }

    pub fn boot_stack(&self) -> Range<usize> {
        self.boot_stack..self.boot_stack_top
    }

    /// 启动后需要清零的区间，不含正在使用的启动栈
    pub fn bss(&self) -> Range<usize> {
        self.sbss..self.ebss
    }

    /// 布局未经 [`KernelLayout::check`] 时也不会溢出，倒置的区间算作 0
    pub fn image_size(&self) -> usize {
        self.ekernel.saturating_sub(self.skernel)
    }

    /// 检查布局是否满足全部约束：
    ///
    /// 1. 镜像从平台基址开始，代码段即镜像起点；
    /// 2. 符号地址单调不减，启动栈非空；
    /// 3. 段边界与跳板两端页对齐；
    /// 4. 相邻段之间没有超过一页的空隙；
    /// 5. 启动栈为 [`BOOT_STACK_SIZE`]，镜像不越过内存上限。
    pub fn check(&self, board: Board) -> Result<(), LayoutError> {
        let base = board.base_address();
        for &symbol in [Symbol::Skernel, Symbol::Stext].iter() {
            if self.get(symbol) != base {
                return Err(LayoutError::BaseMismatch {
                    expected: base,
                    found: self.get(symbol),
                });
            }
        }

        for pair in Symbol::ALL.windows(2) {
            let (before, after) = (pair[0], pair[1]);
            if self.get(before) > self.get(after) {
                return Err(LayoutError::OutOfOrder { before, after });
            }
        }
        if self.boot_stack == self.boot_stack_top {
            return Err(LayoutError::OutOfOrder {
                before: Symbol::BootStackTop,
                after: Symbol::BootStack,
            });
        }

        for &symbol in Symbol::ALL.iter().filter(|symbol| symbol.page_aligned()) {
            let addr = self.get(symbol);
            if !VirtAddr(addr).aligned() {
                return Err(LayoutError::Unaligned { symbol, addr });
            }
        }

        let seams = [
            (Symbol::Etext, Symbol::Srodata),
            (Symbol::Erodata, Symbol::Sdata),
            (Symbol::Edata, Symbol::SbssWithStack),
            (Symbol::SbssWithStack, Symbol::BootStack),
            (Symbol::Ebss, Symbol::Ekernel),
        ];
        for &(after, before) in seams.iter() {
            let len = self.get(before) - self.get(after);
            if len >= PAGE_SIZE {
                return Err(LayoutError::Gap { after, before, len });
            }
        }

        let stack = self.boot_stack_top - self.boot_stack;
        if stack != BOOT_STACK_SIZE {
            return Err(LayoutError::StackSize {
                expected: BOOT_STACK_SIZE,
                found: stack,
            });
        }

        if self.ekernel > board.memory_end() {
            return Err(LayoutError::ExceedsMemory {
                end: self.ekernel,
                limit: board.memory_end(),
            });
        }
        Ok(())
    }
}
