//! 链接产物检查：从 ELF 中读出边界符号与段表，验证布局。

use std::convert::TryFrom;

use xmas_elf::sections::{SectionData, ShType, SHF_ALLOC};
use xmas_elf::symbol_table::Entry;
use xmas_elf::ElfFile;

use crate::config::Board;
use crate::error::LayoutError;
use crate::layout::{KernelLayout, Symbol};
use crate::script::DISCARDED;

/// ELF 段表中的一项
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SectionInfo {
    pub name: String,
    pub addr: usize,
    pub size: usize,
    /// 是否会被加载进内存
    pub alloc: bool,
}

#[derive(Clone, Debug)]
pub struct ImageReport {
    pub board: Board,
    pub entry: usize,
    pub sections: Vec<SectionInfo>,
    pub layout: KernelLayout,
}

impl ImageReport {
    /// 会被加载的段
    pub fn loaded(&self) -> impl Iterator<Item = &SectionInfo> {
        self.sections.iter().filter(|section| section.alloc)
    }
}

const ELF64_HEADER_SIZE: usize = 64;
const SECTION_HEADER_SIZE: u64 = 64;
const SYMBOL_SIZE: u64 = 24;
const TRUNCATED: &str = "section data lies outside the file";

/// 文件中 [offset, offset + size) 的字节，越界时报错
fn file_range(bytes: &[u8], offset: u64, size: u64) -> Result<&[u8], LayoutError> {
    let start = usize::try_from(offset).map_err(|_| LayoutError::Elf(TRUNCATED))?;
    let len = usize::try_from(size).map_err(|_| LayoutError::Elf(TRUNCATED))?;
    let end = start.checked_add(len).ok_or(LayoutError::Elf(TRUNCATED))?;
    bytes.get(start..end).ok_or(LayoutError::Elf(TRUNCATED))
}

/// 字符串表中 index 处必须有一个以 NUL 结尾的串
fn has_str(table: &[u8], index: u32) -> bool {
    table
        .get(index as usize..)
        .map_or(false, |rest| rest.contains(&0))
}

/// xmas-elf 只校验文件头，段表与各段数据按文件给出的偏移直接切片。
/// 先确认它们都在文件之内，截断或损坏的镜像得到 `LayoutError::Elf`
fn check_section_table(elf: &ElfFile, bytes: &[u8]) -> Result<(), LayoutError> {
    let pt2 = &elf.header.pt2;
    let count = pt2.sh_count();
    if count == 0 {
        return Err(LayoutError::Elf("no section headers"));
    }
    if u64::from(pt2.sh_entry_size()) != SECTION_HEADER_SIZE {
        return Err(LayoutError::Elf("unexpected section header size"));
    }
    file_range(bytes, pt2.sh_offset(), u64::from(count) * SECTION_HEADER_SIZE)?;
    if pt2.sh_str_index() >= count {
        return Err(LayoutError::Elf("section name table index out of range"));
    }

    let shstrtab = elf
        .section_header(pt2.sh_str_index())
        .map_err(LayoutError::Elf)?;
    let names = file_range(bytes, shstrtab.offset(), shstrtab.size())?;
    for header in elf.section_iter() {
        match header.get_type().map_err(LayoutError::Elf)? {
            ShType::Null => continue,
            ShType::NoBits => {}
            _ => {
                file_range(bytes, header.offset(), header.size())?;
            }
        }
        if !has_str(names, header.name()) {
            return Err(LayoutError::Elf("section name out of range"));
        }
    }
    Ok(())
}

/// 检查链接好的内核 ELF：
///
/// - 段表中不得残留调试与回溯信息；
/// - 入口点等于镜像起点；
/// - 符号表中的边界符号满足 [`KernelLayout::check`]。
pub fn inspect(bytes: &[u8], board: Board) -> Result<ImageReport, LayoutError> {
    if bytes.len() < ELF64_HEADER_SIZE {
        return Err(LayoutError::Elf("truncated elf header"));
    }
    let elf = ElfFile::new(bytes).map_err(LayoutError::Elf)?;
    check_section_table(&elf, bytes)?;

    let mut sections = Vec::new();
    for header in elf.section_iter() {
        if header.get_type().map_err(LayoutError::Elf)? == ShType::Null {
            continue;
        }
        let name = header.get_name(&elf).map_err(LayoutError::Elf)?;
        if let Some(prefix) = DISCARDED.iter().find(|prefix| name.starts_with(*prefix)) {
            return Err(LayoutError::ForbiddenSection(*prefix));
        }
        sections.push(SectionInfo {
            name: name.to_string(),
            addr: header.address() as usize,
            size: header.size() as usize,
            alloc: header.flags() & SHF_ALLOC != 0,
        });
    }

    let symtab = elf
        .find_section_by_name(".symtab")
        .ok_or(LayoutError::Elf("no .symtab section"))?;
    if symtab.size() % SYMBOL_SIZE != 0
        || (bytes.as_ptr() as usize).wrapping_add(symtab.offset() as usize) % 8 != 0
    {
        return Err(LayoutError::Elf("malformed symbol table"));
    }
    let strtab: &[u8] = match elf.find_section_by_name(".strtab") {
        Some(header) => file_range(bytes, header.offset(), header.size())?,
        None => &[],
    };
    let entries = match symtab.get_data(&elf).map_err(LayoutError::Elf)? {
        SectionData::SymbolTable64(entries) => entries,
        _ => return Err(LayoutError::Elf("expected a 64-bit symbol table")),
    };
    let mut found = [None; Symbol::ALL.len()];
    for entry in entries.iter() {
        if !has_str(strtab, entry.name()) {
            continue;
        }
        let name = match entry.get_name(&elf) {
            Ok(name) => name,
            Err(_) => continue,
        };
        if let Some(symbol) = Symbol::from_name(name) {
            found[symbol as usize] = Some(entry.value() as usize);
        }
    }
    let layout = KernelLayout::resolve(|symbol| found[symbol as usize])?;
    layout.check(board)?;

    let entry = elf.header.pt2.entry_point() as usize;
    if entry != layout.skernel {
        return Err(LayoutError::EntryMismatch {
            expected: layout.skernel,
            found: entry,
        });
    }

    Ok(ImageReport {
        board,
        entry,
        sections,
        layout,
    })
}
