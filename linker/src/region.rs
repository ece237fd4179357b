use core::fmt::{self, Debug, Formatter};

use bitflags::*;

use crate::address::{VirtAddr, VirtPageNum};

bitflags! {
    /// 逻辑段映射后的访问权限，即 PTEFlags 的 R/W/X 子集
    pub struct MapPermission: u8 {
        /// read
        const R = 1 << 1;
        /// write
        const W = 1 << 2;
        /// execute
        const X = 1 << 3;
    }
}

/// 内核镜像中的四类输出段，顺序即镜像中的先后顺序
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum RegionKind {
    Text,
    Rodata,
    Data,
    /// 含启动栈
    Bss,
}

impl RegionKind {
    pub const ALL: [RegionKind; 4] = [
        RegionKind::Text,
        RegionKind::Rodata,
        RegionKind::Data,
        RegionKind::Bss,
    ];

    /// 输出段名
    pub fn name(self) -> &'static str {
        match self {
            RegionKind::Text => ".text",
            RegionKind::Rodata => ".rodata",
            RegionKind::Data => ".data",
            RegionKind::Bss => ".bss",
        }
    }

    /// 内核地址空间恒等映射该段时使用的权限
    pub fn permission(self) -> MapPermission {
        match self {
            RegionKind::Text => MapPermission::R | MapPermission::X,
            RegionKind::Rodata => MapPermission::R,
            RegionKind::Data | RegionKind::Bss => MapPermission::R | MapPermission::W,
        }
    }
}

/// 一段连续的地址区间 [start, end)
#[derive(Copy, Clone, PartialEq, Eq)]
pub struct Region {
    pub kind: RegionKind,
    pub start: VirtAddr,
    pub end: VirtAddr,
}

impl Region {
    pub fn len(&self) -> usize {
        self.end.0.saturating_sub(self.start.0)
    }

    pub fn contains(&self, va: VirtAddr) -> bool {
        self.start <= va && va < self.end
    }

    /// 两端都落在页边界上，才能按页单独设置保护
    pub fn is_page_aligned(&self) -> bool {
        self.start.aligned() && self.end.aligned()
    }

    /// 覆盖该段的页号区间 [floor(start), ceil(end))
    pub fn pages(&self) -> (VirtPageNum, VirtPageNum) {
        (self.start.floor(), self.end.ceil())
    }

    pub fn permission(&self) -> MapPermission {
        self.kind.permission()
    }
}

impl Debug for Region {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{:#x}, {:#x})",
            self.kind.name(),
            self.start.0,
            self.end.0
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permissions_follow_section_kind() {
        assert!(RegionKind::Text.permission().contains(MapPermission::X));
        assert!(!RegionKind::Text.permission().contains(MapPermission::W));
        assert_eq!(RegionKind::Rodata.permission(), MapPermission::R);
        assert_eq!(
            RegionKind::Bss.permission(),
            RegionKind::Data.permission()
        );
        for kind in RegionKind::ALL.iter() {
            assert!(kind.permission().contains(MapPermission::R));
        }
    }

    #[test]
    fn region_bounds() {
        let region = Region {
            kind: RegionKind::Data,
            start: VirtAddr(0x8020_3000),
            end: VirtAddr(0x8020_5000),
        };
        assert_eq!(region.len(), 0x2000);
        assert!(region.is_page_aligned());
        assert!(region.contains(VirtAddr(0x8020_3000)));
        assert!(!region.contains(VirtAddr(0x8020_5000)));
        assert_eq!(region.pages(), (VirtPageNum(0x80203), VirtPageNum(0x80205)));
        assert_eq!(
            format!("{:?}", region),
            ".data [0x80203000, 0x80205000)"
        );
    }
}
