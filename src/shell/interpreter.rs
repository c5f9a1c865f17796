// src/shell/interpreter.rs

//! Interpreter detection from the first bytes of an executable.

use std::io::Read;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::fs::FileSystem;
use crate::shell::environment::ShellEnvironment;
use crate::shell::prepare::find_on_search_path;

const HEADER_LEN: u64 = 256;
const ELF_MAGIC: &[u8] = &[0x7F, b'E', b'L', b'F'];

/// Interpreter that must be placed in front of `file`, if any.
///
/// - ELF binaries (and anything else with NUL bytes in its header) run
///   directly.
/// - `#!` scripts run directly unless the interpreter lives under `/usr` or
///   `/bin`, does not exist, and a binary with the same name is on the
///   search path; then that binary is used.
/// - Readable text files without a shebang run under the fallback shell.
/// - Unreadable or tiny files are left to the OS.
pub fn interpreter_for(
    fs: &dyn FileSystem,
    file: &Path,
    env: &dyn ShellEnvironment,
) -> Option<PathBuf> {
    let header = read_header(fs, file)?;
    if header.len() <= 4 {
        return None;
    }

    // ELF, or some other binary format the OS knows better than we do.
    if header.starts_with(ELF_MAGIC) || header.contains(&0) {
        return None;
    }

    if let Some(rest) = header.strip_prefix(b"#!") {
        let interpreter = shebang_interpreter(rest)?;
        if !(interpreter.starts_with("/usr") || interpreter.starts_with("/bin")) {
            return None;
        }
        if fs.is_executable(Path::new(&interpreter)) {
            return None;
        }

        let name = Path::new(&interpreter).file_name()?.to_str()?.to_string();
        let remapped = find_on_search_path(fs, env, &name);
        debug!(
            file = %file.display(),
            %interpreter,
            remapped = ?remapped,
            "shebang interpreter not executable; looked up on search path"
        );
        return remapped;
    }

    Some(env.fallback_shell())
}

fn read_header(fs: &dyn FileSystem, file: &Path) -> Option<Vec<u8>> {
    let reader = fs.open_read(file).ok()?;
    let mut header = Vec::with_capacity(HEADER_LEN as usize);
    reader.take(HEADER_LEN).read_to_end(&mut header).ok()?;
    Some(header)
}

/// First token after `#!`, skipping leading blanks.
fn shebang_interpreter(rest: &[u8]) -> Option<String> {
    let line = rest.split(|b| *b == b'\n').next()?;
    let text = String::from_utf8_lossy(line);
    text.split_whitespace().next().map(str::to_string)
}
