use std::{
    ffi::OsStr,
    ffi::OsString,
    fs,
    io::Read,
    path::{Path, PathBuf},
    process,
};

use clap::Parser as ClapParser;
use oxc_span::SourceType;

use classhook_rs::{ClassHook, HookEmit, TransformOptions};

#[derive(Debug, ClapParser)]
#[command(name = "classhook", about = "Rewrites derived classes to invoke Parent.onInherited (Rust rewrite)")]
struct Cli {
    /// The JS/TS file to transform
    input_filename: PathBuf,

    /// Suppress status output to stderr
    #[arg(short = 'q', long = "quiet")]
    quiet: bool,

    /// Emit the full hook protocol inline at every class instead of a shared helper
    #[arg(long = "inline")]
    inline: bool,

    /// Write transformed source to output filename. <input_filename>-hooked.js is used if no filename is provided
    #[arg(short = 'o', long = "output", num_args = 0..=1, default_missing_value = "")]
    output: Option<OsString>,
}

fn main() {
    let cli = Cli::parse();

    let input_path = cli.input_filename;
    let source_text = match read_file_to_string_with_capacity(&input_path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("[-] Critical Error: Failed to read {}: {e}", input_path.display());
            process::exit(1);
        }
    };

    let source_type = match SourceType::from_path(&input_path) {
        Ok(st) => st,
        Err(e) => {
            eprintln!(
                "[-] Critical Error: Failed to determine source type for {}: {e}",
                input_path.display()
            );
            process::exit(1);
        }
    };

    if !cli.quiet {
        eprintln!("[!] Transforming {}...", input_path.display());
    }

    let classhook = ClassHook::default();
    let result = match classhook.transform(
        &source_text,
        TransformOptions {
            emit: if cli.inline { HookEmit::Inline } else { HookEmit::SharedHelper },
            source_type: Some(source_type),
            filename_for_source_type: None,
        },
    ) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("[-] Critical Error: {e}");
            process::exit(1);
        }
    };

    if !cli.quiet && !result.modified {
        eprintln!("[!] No derived classes found; output is unchanged");
    }

    let output_text = result.code;

    let output_path = resolve_output_path(&input_path, cli.output.as_deref());
    let output_to_file = cli.output.is_some();

    if output_to_file {
        if let Err(e) = fs::write(&output_path, output_text.as_bytes()) {
            eprintln!("[-] Critical Error: Failed to write {}: {e}", output_path.display());
            process::exit(1);
        }
        if !cli.quiet {
            eprintln!("[+] Saved {}", output_path.display());
        }
    } else {
        print!("{output_text}");
    }
}

fn read_file_to_string_with_capacity(path: &Path) -> std::io::Result<String> {
    let mut file = fs::File::open(path)?;
    let cap = file.metadata().ok().and_then(|m| usize::try_from(m.len()).ok()).unwrap_or(0);
    let mut s = String::with_capacity(cap.saturating_add(1));
    file.read_to_string(&mut s)?;
    Ok(s)
}

fn resolve_output_path(input_path: &Path, output: Option<&OsStr>) -> PathBuf {
    match output {
        None => default_output_path(input_path),
        Some(v) if v.is_empty() => default_output_path(input_path),
        Some(v) => PathBuf::from(v),
    }
}

fn default_output_path(input_path: &Path) -> PathBuf {
    input_path.with_file_name(format!(
        "{}-hooked.js",
        input_path.file_name().and_then(|s| s.to_str()).unwrap_or("output")
    ))
}
