// build.rs
use std::process::Command;

/// Trimmed stdout of a git command, or "unknown" outside a checkout.
fn git_output(args: &[&str]) -> String {
    Command::new("git")
        .args(args)
        .output()
        .ok()
        .filter(|output| output.status.success())
        .and_then(|output| String::from_utf8(output.stdout).ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

fn main() {
    let branch = git_output(&["rev-parse", "--abbrev-ref", "HEAD"]);
    let commit = git_output(&["rev-parse", "--short", "HEAD"]);

    // Shown by `healthreport --version`
    println!("cargo:rustc-env=HEALTHREPORT_GIT_BRANCH={}", branch);
    println!("cargo:rustc-env=HEALTHREPORT_GIT_COMMIT={}", commit);
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs");
}
