use linker::Board;

/// 运行平台，决定链接基址与内存上限，需与 build.rs 的选择一致
#[cfg(feature = "board_k210")]
pub const BOARD: Board = Board::K210;
#[cfg(not(feature = "board_k210"))]
pub const BOARD: Board = Board::Qemu;
