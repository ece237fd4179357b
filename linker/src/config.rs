/// 内存页大小
pub const PAGE_SIZE: usize = 0x1000;
pub const PAGE_SIZE_BITS: usize = 0xc;

/// 启动栈大小，64 KiB，与板子无关
pub const BOOT_STACK_SIZE: usize = 4096 * 16;

/// 内核运行的平台。基址由平台的启动约定（SBI 跳转地址）决定
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Board {
    Qemu,
    K210,
}

impl Board {
    /// 镜像加载基址，`_start` 必须正好位于此处
    pub const fn base_address(self) -> usize {
        match self {
            Board::Qemu => 0x8020_0000,
            Board::K210 => 0x8002_0000,
        }
    }

    /// 物理内存上限，镜像不得越过
    pub const fn memory_end(self) -> usize {
        match self {
            Board::Qemu => 0x8080_0000,
            Board::K210 => 0x8060_0000,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Board::Qemu => "qemu",
            Board::K210 => "k210",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "qemu" => Some(Board::Qemu),
            "k210" => Some(Board::K210),
            _ => None,
        }
    }
}
