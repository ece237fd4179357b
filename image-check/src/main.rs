use std::fs;
use std::process;

use clap::{App, Arg, ArgMatches};
use linker::elf::{self, ImageReport};
use linker::{Board, BootTrampoline, LinkerScript};

fn app() -> App<'static, 'static> {
    App::new("image-check")
        .version("0.1.0")
        .about("Check the memory layout of a linked kernel image")
        .arg(
            Arg::with_name("elf")
                .short("e")
                .long("elf")
                .takes_value(true)
                .required_unless("print")
                .help("Kernel ELF built from os/ (before objcopy)"),
        )
        .arg(
            Arg::with_name("board")
                .short("b")
                .long("board")
                .takes_value(true)
                .possible_values(&["qemu", "k210"])
                .default_value("qemu")
                .help("Platform the image was linked for"),
        )
        .arg(
            Arg::with_name("print")
                .short("p")
                .long("print")
                .takes_value(true)
                .possible_values(&["script", "entry"])
                .help("Print the generated linker.ld or entry.asm and exit"),
        )
}

fn board_of(matches: &ArgMatches) -> Board {
    matches
        .value_of("board")
        .and_then(Board::from_name)
        .unwrap_or(Board::Qemu)
}

fn render_report(path: &str, report: &ImageReport) -> String {
    let layout = &report.layout;
    let mut out = String::new();
    out.push_str(&format!(
        "{}: entry {:#x}, board {}\n",
        path,
        report.entry,
        report.board.name()
    ));
    out.push_str("loaded sections:\n");
    for section in report.loaded() {
        out.push_str(&format!(
            "    {:<16} [{:#x}, {:#x})\n",
            section.name,
            section.addr,
            section.addr.saturating_add(section.size)
        ));
    }
    out.push_str("regions:\n");
    for region in layout.regions().iter() {
        let (first, end) = region.pages();
        out.push_str(&format!(
            "    {:?} {} pages {:?}\n",
            region,
            end.0 - first.0,
            region.permission()
        ));
    }
    let trampoline = layout.trampoline();
    out.push_str(&format!(
        "trampoline [{:#x}, {:#x})\n",
        trampoline.start, trampoline.end
    ));
    let stack = layout.boot_stack();
    out.push_str(&format!(
        "boot_stack [{:#x}, {:#x}) {} bytes\n",
        stack.start,
        stack.end,
        stack.len()
    ));
    out.push_str(&format!(
        "image {:#x} bytes, ekernel {:#x}: ok\n",
        layout.image_size(),
        layout.ekernel
    ));
    out
}

fn main() {
    let matches = app().get_matches();
    let board = board_of(&matches);

    if let Some(what) = matches.value_of("print") {
        match what {
            "script" => print!("{}", LinkerScript::new(board)),
            _ => print!("{}", BootTrampoline::new()),
        }
        return;
    }

    let path = matches.value_of("elf").unwrap();
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) => {
            eprintln!("cannot read {}: {}", path, err);
            process::exit(2);
        }
    };
    match elf::inspect(&bytes, board) {
        Ok(report) => print!("{}", render_report(path, &report)),
        Err(err) => {
            eprintln!("{}: {}", path, err);
            process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn board_defaults_to_qemu() {
        let matches = app().get_matches_from(vec!["image-check", "-e", "os"]);
        assert_eq!(board_of(&matches), Board::Qemu);
        assert_eq!(matches.value_of("elf"), Some("os"));
    }

    #[test]
    fn print_needs_no_elf() {
        let matches = app().get_matches_from(vec!["image-check", "--print", "script", "-b", "k210"]);
        assert_eq!(board_of(&matches), Board::K210);
        assert_eq!(matches.value_of("print"), Some("script"));
    }

    #[test]
    fn report_survives_huge_section_sizes() {
        use linker::elf::SectionInfo;
        use linker::{plan, SectionSizes};

        let layout = plan(&LinkerScript::new(Board::Qemu), &SectionSizes::minimal()).unwrap();
        let report = ImageReport {
            board: Board::Qemu,
            entry: layout.skernel,
            sections: vec![SectionInfo {
                name: ".text".to_string(),
                addr: usize::MAX - 0x10,
                size: 0x100,
                alloc: true,
            }],
            layout,
        };
        let text = render_report("os", &report);
        assert!(text.contains(&format!("[{:#x}, {:#x})", usize::MAX - 0x10, usize::MAX)));
        assert!(text.contains(".text [0x80200000, 0x80201000) 1 pages"));
        assert!(text.ends_with(": ok\n"));
    }

    #[test]
    fn unknown_board_is_rejected() {
        assert!(app()
            .get_matches_from_safe(vec!["image-check", "-e", "os", "-b", "virt"])
            .is_err());
        assert!(app().get_matches_from_safe(vec!["image-check"]).is_err());
    }
}
