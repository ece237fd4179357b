use core::fmt::{self, Display, Formatter};

use crate::config::{Board, BOOT_STACK_SIZE, PAGE_SIZE};
use crate::trampoline::ENTRY_SYMBOL;

/// 链接时丢弃的输入段（名字前缀）。调试与回溯信息在镜像中没有运行期用途
pub const DISCARDED: [&str; 3] = [".eh_frame", ".debug", ".comment"];

/// 内核链接脚本。
///
/// build.rs 将其渲染为 `linker.ld`：
///
/// ```ignore
/// let ld = PathBuf::from(env::var_os("OUT_DIR").unwrap()).join("linker.ld");
/// fs::write(&ld, LinkerScript::new(Board::Qemu).to_string())?;
/// println!("cargo:rustc-link-arg=-T{}", ld.display());
/// ```
///
/// 段顺序固定为 `.text` `.rodata` `.data` `.bss`，每段结束处对齐到页。
/// `.text` 内先放 `.text.entry`，再放独占整页的 `.text.trampoline`；
/// `.bss` 内先放 `.bss.stack`（启动栈），再标记 `sbss`。
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct LinkerScript {
    board: Board,
}

impl LinkerScript {
    pub fn new(board: Board) -> Self {
        Self { board }
    }

    pub fn base_address(&self) -> usize {
        self.board.base_address()
    }
}

impl Display for LinkerScript {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            r#"OUTPUT_ARCH(riscv)
ENTRY({entry})
BASE_ADDRESS = {base:#x};
MEMORY_END = {end:#x};

SECTIONS
{{
    . = BASE_ADDRESS;
    skernel = .;

    stext = .;
    .text : {{
        *(.text.entry)
        . = ALIGN({page});
        strampoline = .;
        *(.text.trampoline);
        . = ALIGN({page});
        etrampoline = .;
        *(.text .text.*)
    }}

    . = ALIGN({page});
    etext = .;
    srodata = .;
    .rodata : {{
        *(.rodata .rodata.*)
        *(.srodata .srodata.*)
    }}

    . = ALIGN({page});
    erodata = .;
    sdata = .;
    .data : {{
        *(.data .data.*)
        *(.sdata .sdata.*)
    }}

    . = ALIGN({page});
    edata = .;
    sbss_with_stack = .;
    .bss : {{
        *(.bss.stack)
        sbss = .;
        *(.bss .bss.*)
        *(.sbss .sbss.*)
    }}

    . = ALIGN({page});
    ebss = .;
    ekernel = .;

    /DISCARD/ : {{
"#,
            entry = ENTRY_SYMBOL,
            base = self.base_address(),
            end = self.board.memory_end(),
            page = PAGE_SIZE,
        )?;
        for prefix in DISCARDED.iter() {
            writeln!(f, "        *({}*)", prefix)?;
        }
        write!(
            f,
            r#"    }}
}}

ASSERT(skernel == BASE_ADDRESS, "image does not start at the base address");
ASSERT(strampoline % {page} == 0, "trampoline is not page aligned");
ASSERT(boot_stack_top - boot_stack == {stack}, "boot stack size mismatch");
ASSERT(ekernel <= MEMORY_END, "kernel image exceeds platform memory");
"#,
            page = PAGE_SIZE,
            stack = BOOT_STACK_SIZE,
        )
    }
}
