use lazy_static::lazy_static;
use linker::{KernelLayout, Symbol};

// 由 linker 指定，定义内核镜像的符号
extern "C" {
    /// 镜像开始
    fn skernel();
    /// 代码段开始
    fn stext();
    /// 跳板，独占一页
    fn strampoline();
    fn etrampoline();
    fn etext();
    /// 只读数据段
    fn srodata();
    fn erodata();
    /// 数据段
    fn sdata();
    fn edata();
    fn sbss_with_stack();
    /// 启动栈，定义在 entry.asm
    fn boot_stack();
    fn boot_stack_top();
    fn sbss();
    fn ebss();
    /// kernel 结束，后面内存可供应用使用
    fn ekernel();
}

fn address_of(symbol: Symbol) -> usize {
    match symbol {
        Symbol::Skernel => skernel as usize,
        Symbol::Stext => stext as usize,
        Symbol::Strampoline => strampoline as usize,
        Symbol::Etrampoline => etrampoline as usize,
        Symbol::Etext => etext as usize,
        Symbol::Srodata => srodata as usize,
        Symbol::Erodata => erodata as usize,
        Symbol::Sdata => sdata as usize,
        Symbol::Edata => edata as usize,
        Symbol::SbssWithStack => sbss_with_stack as usize,
        Symbol::BootStack => boot_stack as usize,
        Symbol::BootStackTop => boot_stack_top as usize,
        Symbol::Sbss => sbss as usize,
        Symbol::Ebss => ebss as usize,
        Symbol::Ekernel => ekernel as usize,
    }
}

/// 直接从链接器符号读出布局，不经过 lazy_static
pub fn locate() -> KernelLayout {
    KernelLayout::from_fn(address_of)
}

lazy_static! {
    /// 链接时确定的镜像布局，第一次访问时读出，此后只读
    pub static ref KERNEL_LAYOUT: KernelLayout = locate();
}

pub fn print_layout() {
    for region in KERNEL_LAYOUT.regions().iter() {
        let (first, end) = region.pages();
        info!(
            "{:<7} [{:#x}, {:#x}) {} pages {:?}",
            region.kind.name(),
            region.start.0,
            region.end.0,
            end.0 - first.0,
            region.permission()
        );
    }
    let trampoline = KERNEL_LAYOUT.trampoline();
    info!("trampoline [{:#x}, {:#x})", trampoline.start, trampoline.end);
    let stack = KERNEL_LAYOUT.boot_stack();
    info!("boot_stack [{:#x}, {:#x})", stack.start, stack.end);
    info!(
        "kernel image {:#x} bytes, ends at {:#x}",
        KERNEL_LAYOUT.image_size(),
        KERNEL_LAYOUT.ekernel
    );
}
