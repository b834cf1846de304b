use std::path::PathBuf;
use std::process::{Command, Output};
use std::{env, fs};

/// What a program run is expected to produce on stdout, and whether the
/// interpreter should exit successfully.
pub struct Expected<'a> {
    pub stdout: &'a str,
    pub success: bool,
}

impl Expected<'_> {
    pub fn assert_matches(self, output: &Output) {
        assert_eq!(
            self.stdout,
            String::from_utf8_lossy(&output.stdout),
            "stderr was: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        assert_eq!(
            self.success,
            output.status.success(),
            "stderr was: {}",
            String::from_utf8_lossy(&output.stderr)
        );
    }
}

/// Writes `source` to a temp file and runs the wick binary on it.
pub fn run_program(name: &str, source: &str) -> Output {
    let path = program_path(name);
    fs::write(&path, source).expect("failed to write the test program");

    let output = Command::new(env!("CARGO_BIN_EXE_wick"))
        .arg(&path)
        .output()
        .expect("failed to run the wick binary");

    let _ = fs::remove_file(&path);
    output
}

pub fn stderr_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

fn program_path(name: &str) -> PathBuf {
    env::temp_dir().join(format!("wick-{name}-{}.wk", std::process::id()))
}
