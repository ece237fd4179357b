use std::env;
use std::fs;
use std::io::Result;
use std::path::PathBuf;

use linker::{Board, BootTrampoline, LinkerScript};

/*
    build.rs 被 cargo build 使用：生成链接脚本与入口汇编，二者都来自 linker 板块
*/
fn main() {
    emit_layout().unwrap(); // build 出错直接 panic
}

fn board() -> Board {
    if env::var_os("CARGO_FEATURE_BOARD_K210").is_some() {
        Board::K210
    } else {
        Board::Qemu
    }
}

fn emit_layout() -> Result<()> {
    let out = PathBuf::from(env::var_os("OUT_DIR").unwrap());
    let board = board();

    let ld = out.join("linker.ld");
    fs::write(&ld, LinkerScript::new(board).to_string())?;
    // main.rs 通过 include_str! 嵌入
    fs::write(out.join("entry.asm"), BootTrampoline::new().to_string())?;
    println!("board: {}, linker script: {}", board.name(), ld.display());

    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=../linker/src");
    println!("cargo:rerun-if-env-changed=LOG");
    // 只有交叉编译到内核目标时才换链接脚本
    if env::var("CARGO_CFG_TARGET_ARCH").map_or(false, |arch| arch == "riscv64") {
        println!("cargo:rustc-link-arg=-T{}", ld.display());
    }
    Ok(())
}
