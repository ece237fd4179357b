use core::fmt::{self, Debug, Formatter};

use crate::config::{PAGE_SIZE, PAGE_SIZE_BITS};

/// 虚拟地址。内核镜像恒等映射，边界符号的值同时也是物理地址
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq)]
pub struct VirtAddr(pub usize);

/// 虚拟页号
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq)]
pub struct VirtPageNum(pub usize);

impl Debug for VirtAddr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_fmt(format_args!("VA:{:#x}", self.0))
    }
}
impl Debug for VirtPageNum {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_fmt(format_args!("VPN:{:#x}", self.0))
    }
}

impl VirtAddr {
    /// 按页向下对齐(当前页)
    pub fn floor(&self) -> VirtPageNum {
        VirtPageNum(self.0 >> PAGE_SIZE_BITS)
    }

    /// 按页向上对齐（下一页）
    pub fn ceil(&self) -> VirtPageNum {
        VirtPageNum((self.0 >> PAGE_SIZE_BITS) + (self.page_offset() != 0) as usize)
    }

    /// 页内偏移
    pub fn page_offset(&self) -> usize {
        self.0 & (PAGE_SIZE - 1)
    }

    /// 正好对齐的地址（页内偏移为0）
    pub fn aligned(&self) -> bool {
        self.page_offset() == 0
    }

    /// 与链接脚本中的 `ALIGN(4096)` 相同；越过地址空间顶部时返回 None
    pub fn align_up(&self) -> Option<VirtAddr> {
        if self.aligned() {
            return Some(*self);
        }
        self.0
            .checked_add(PAGE_SIZE - self.page_offset())
            .map(VirtAddr)
    }

    pub fn offset(&self, len: usize) -> Option<VirtAddr> {
        self.0.checked_add(len).map(VirtAddr)
    }
}

impl From<usize> for VirtAddr {
    fn from(v: usize) -> Self {
        Self(v)
    }
}
impl From<VirtAddr> for usize {
    fn from(v: VirtAddr) -> Self {
        v.0
    }
}
impl From<VirtPageNum> for VirtAddr {
    fn from(v: VirtPageNum) -> Self {
        Self(v.0 << PAGE_SIZE_BITS)
    }
}
