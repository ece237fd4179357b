#![no_std] // 告知编译器不使用 std 库，而使用 core
#![no_main] // 没有一般意义上的 main，入口是 entry.asm 中的 _start

#[macro_use]
extern crate log;

#[macro_use]
mod console;
mod config;
mod lang_items;
mod layout;
mod logging;
mod sbi;

use layout::KERNEL_LAYOUT;

// 入口汇编由 build.rs 生成：设置 sp 为 boot_stack_top 后 call rust_main。
// 它被放在 .text.entry，链接脚本保证这是镜像的第一条指令
core::arch::global_asm!(include_str!(concat!(env!("OUT_DIR"), "/entry.asm")));

/// 清零 [sbss, ebss)。启动栈在 sbss 之前，此时正在使用，不能清。
/// KERNEL_LAYOUT 本身在 bss 里，这里直接读一次链接器符号
fn clear_bss() {
    let bss = layout::locate().bss();
    unsafe {
        core::slice::from_raw_parts_mut(bss.start as *mut u8, bss.len()).fill(0);
    }
}

/// 高级语言入口，由跳板以 `call` 进入，不带参数，永不返回。
///
/// 跳板之后没有任何指令：从这里返回是未定义行为，所以签名是 `-> !`。
#[no_mangle]
pub extern "C" fn rust_main() -> ! {
    // lazy_static 的状态也在 bss 里，必须先清零再使用 KERNEL_LAYOUT
    clear_bss();
    logging::init();
    println!("[kernel] Hello, world!");

    if let Err(err) = KERNEL_LAYOUT.check(config::BOARD) {
        panic!("kernel image layout violated: {}", err);
    }
    layout::print_layout();

    // 当前栈帧必然落在启动栈内
    let marker = 0u8;
    let here = &marker as *const u8 as usize;
    assert!(
        KERNEL_LAYOUT.boot_stack().contains(&here),
        "running outside the boot stack: {:#x}",
        here
    );
    debug!(
        "sp near {:#x}, {} bytes of boot stack used",
        here,
        KERNEL_LAYOUT.boot_stack_top - here
    );
    debug!(
        "supervisor interrupts enabled: {}",
        riscv::register::sstatus::read().sie()
    );

    info!("[kernel] boot layout verified on {}", config::BOARD.name());
    sbi::shutdown()
}
