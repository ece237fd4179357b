use crate::address::VirtAddr;
use crate::config::BOOT_STACK_SIZE;
use crate::error::LayoutError;
use crate::layout::KernelLayout;
use crate::script::LinkerScript;
use crate::trampoline::BootTrampoline;

/// 各组输入段的总字节数（不含对齐填充）
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct SectionSizes {
    /// `.text.entry`，即跳板代码 `_start`
    pub entry: usize,
    /// `.text.trampoline`
    pub trampoline: usize,
    /// 其余 `.text .text.*`
    pub text: usize,
    pub rodata: usize,
    pub data: usize,
    /// 启动栈之外的 `.bss .bss.* .sbss .sbss.*`
    pub bss: usize,
}

impl SectionSizes {
    /// 只有入口代码的最小镜像
    pub fn minimal() -> Self {
        Self {
            entry: BootTrampoline::new().code_size(),
            ..Self::default()
        }
    }
}

/// 游标，对应链接脚本中的 `.`
struct Cursor(VirtAddr);

impl Cursor {
    fn here(&self) -> usize {
        (self.0).0
    }

    fn advance(&mut self, len: usize) -> Result<usize, LayoutError> {
        self.0 = self.0.offset(len).ok_or(LayoutError::AddressOverflow)?;
        Ok(self.here())
    }

    /// `. = ALIGN(4096);`
    fn align(&mut self) -> Result<usize, LayoutError> {
        self.0 = self.0.align_up().ok_or(LayoutError::AddressOverflow)?;
        Ok(self.here())
    }
}

/// 按链接脚本的规则为给定大小的输入段分配地址，得到链接后应有的边界符号。
///
/// 只做地址推算，不检查内存上限等约束，结果交给 [`KernelLayout::check`]。
pub fn plan(script: &LinkerScript, sizes: &SectionSizes) -> Result<KernelLayout, LayoutError> {
    let mut dot = Cursor(VirtAddr(script.base_address()));
    let skernel = dot.here();
    let stext = skernel;

    dot.advance(sizes.entry)?;
    let strampoline = dot.align()?;
    dot.advance(sizes.trampoline)?;
    let etrampoline = dot.align()?;
    dot.advance(sizes.text)?;

    let etext = dot.align()?;
    let srodata = etext;
    dot.advance(sizes.rodata)?;

    let erodata = dot.align()?;
    let sdata = erodata;
    dot.advance(sizes.data)?;

    let edata = dot.align()?;
    let sbss_with_stack = edata;
    // entry.asm 中启动栈自身按页对齐
    let boot_stack = dot.align()?;
    let boot_stack_top = dot.advance(BOOT_STACK_SIZE)?;
    let sbss = boot_stack_top;
    dot.advance(sizes.bss)?;

    let ebss = dot.align()?;
    let ekernel = ebss;

    Ok(KernelLayout {
        skernel,
        stext,
        strampoline,
        etrampoline,
        etext,
        srodata,
        erodata,
        sdata,
        edata,
        sbss_with_stack,
        boot_stack,
        boot_stack_top,
        sbss,
        ebss,
        ekernel,
    })
}

#[cfg(test)]
mod tests {
    use rand::Rng;

    use super::*;
    use crate::config::{Board, PAGE_SIZE};
    use crate::layout::Symbol;

    #[test]
    fn qemu_entry_scenario() {
        let script = LinkerScript::new(Board::Qemu);
        let sizes = SectionSizes {
            text: 0x2345,
            rodata: 0x800,
            data: 0x10,
            bss: 0x3000,
            ..SectionSizes::minimal()
        };
        let layout = plan(&script, &sizes).unwrap();
        assert_eq!(layout.check(Board::Qemu), Ok(()));

        // 入口就是基址，跳板从入口代码之后的第一个页边界开始
        assert_eq!(layout.symbol("skernel"), Some(0x8020_0000));
        assert_eq!(layout.stext, 0x8020_0000);
        assert_eq!(layout.strampoline, 0x8020_1000);
        assert_eq!(layout.strampoline % PAGE_SIZE, 0);
        assert!(layout.strampoline >= layout.stext + sizes.entry);
        // 空跳板不占页
        assert_eq!(layout.etrampoline, layout.strampoline);
        assert_eq!(layout.srodata, 0x8020_4000);
        assert_eq!(layout.srodata % PAGE_SIZE, 0);
        assert_eq!(layout.sdata, 0x8020_5000);
        assert_eq!(layout.boot_stack, 0x8020_6000);
        assert_eq!(layout.boot_stack_top, 0x8021_6000);
        assert_eq!(layout.ekernel, 0x8021_9000);
    }

    #[test]
    fn trampoline_alignment_is_independent_of_text() {
        let script = LinkerScript::new(Board::Qemu);
        let sizes = SectionSizes {
            trampoline: 0x96,
            text: 0x10,
            ..SectionSizes::minimal()
        };
        let layout = plan(&script, &sizes).unwrap();
        assert_eq!(layout.trampoline(), 0x8020_1000..0x8020_2000);
        // 跳板之后的代码只有 0x10 字节，仍然独占跳板之外的一页
        assert_eq!(layout.etext, 0x8020_3000);
        assert_eq!(layout.check(Board::Qemu), Ok(()));
    }

    #[test]
    fn empty_sections_collapse_to_boundaries() {
        let script = LinkerScript::new(Board::K210);
        let layout = plan(&script, &SectionSizes::minimal()).unwrap();
        assert_eq!(layout.check(Board::K210), Ok(()));
        assert_eq!(layout.srodata, layout.erodata);
        assert_eq!(layout.sdata, layout.edata);
        assert_eq!(layout.sbss, layout.ebss);
        assert_eq!(layout.image_size(), PAGE_SIZE + BOOT_STACK_SIZE);
    }

    #[test]
    fn oversized_image_is_rejected() {
        let script = LinkerScript::new(Board::K210);
        let sizes = SectionSizes {
            data: Board::K210.memory_end() - Board::K210.base_address(),
            ..SectionSizes::minimal()
        };
        let layout = plan(&script, &sizes).unwrap();
        assert!(matches!(
            layout.check(Board::K210),
            Err(LayoutError::ExceedsMemory { .. })
        ));
    }

    #[test]
    fn overflow_is_an_error() {
        let script = LinkerScript::new(Board::Qemu);
        let sizes = SectionSizes {
            rodata: usize::MAX - 0x1000,
            ..SectionSizes::minimal()
        };
        assert_eq!(plan(&script, &sizes), Err(LayoutError::AddressOverflow));
    }

    #[test]
    fn random_sizes_keep_invariants() {
        let mut rng = rand::thread_rng();
        let script = LinkerScript::new(Board::Qemu);
        for _ in 0..200 {
            let sizes = SectionSizes {
                entry: rng.gen_range(1..0x40),
                trampoline: rng.gen_range(0..0x2000),
                text: rng.gen_range(0..0x40000),
                rodata: rng.gen_range(0..0x10000),
                data: rng.gen_range(0..0x10000),
                bss: rng.gen_range(0..0x40000),
            };
            let layout = plan(&script, &sizes).unwrap();
            assert_eq!(layout.check(Board::Qemu), Ok(()), "{:?}", sizes);

            let regions = layout.regions();
            for region in regions.iter() {
                assert!(region.is_page_aligned(), "{:?}", region);
            }
            for pair in regions.windows(2) {
                assert_eq!(pair[0].end, pair[1].start);
            }
            // 每段只多出对齐填充
            assert!(regions[1].len() - sizes.rodata < PAGE_SIZE);
            assert!(regions[2].len() - sizes.data < PAGE_SIZE);
            assert_eq!(layout.get(Symbol::BootStackTop) - layout.get(Symbol::BootStack), 65536);
            assert!(layout.bss().len() >= sizes.bss);
        }
    }
}
