//! 这个板块为内核提供链接脚本与启动跳板的文本，以及依赖于这份布局的检查。
//!
//! 内核的 build.rs 依赖此板块生成两份文件：
//!
//! - [`LinkerScript`] 渲染 `linker.ld`，排布 `.text` `.rodata` `.data` `.bss`
//!   并导出边界符号（[`Symbol`]）；
//! - [`BootTrampoline`] 渲染 `entry.asm`，即 `_start` 处设置栈指针并转入
//!   `rust_main` 的两条指令，以及 64 KiB 的启动栈。
//!
//! 内核启动后用 [`KernelLayout`] 保存边界符号。主机侧可以用 [`plan`] 按脚本规则推算布局，
//! 或打开 `std` 特性用 `elf::inspect` 检查链接好的镜像。
#![cfg_attr(not(any(test, feature = "std")), no_std)]

mod address;
mod config;
#[cfg(any(test, feature = "std"))]
pub mod elf;
mod error;
mod layout;
mod plan;
mod region;
mod script;
mod trampoline;

pub use address::{VirtAddr, VirtPageNum};
pub use config::{Board, BOOT_STACK_SIZE, PAGE_SIZE, PAGE_SIZE_BITS};
pub use error::LayoutError;
pub use layout::{KernelLayout, Symbol};
pub use plan::{plan, SectionSizes};
pub use region::{MapPermission, Region, RegionKind};
pub use script::{LinkerScript, DISCARDED};
pub use trampoline::{BootHart, BootInstr, BootTrace, BootTrampoline, ENTRY_SYMBOL, KERNEL_MAIN};
