//! Canned specifications, code blobs and packager replies

use serde_json::json;
use specsmith_types::*;

pub const HELLO_WORLD_SPEC: &str = "Build a hello-world CLI.";

pub const HELLO_WORLD_CODE: &str = "# main.py\nprint(\"Hello, world!\")\n";

/// The files the packager is expected to extract from [`HELLO_WORLD_CODE`]
pub fn hello_world_files() -> PackageResult {
    PackageResult {
        files: vec![GeneratedFile::new("main.py", "print(\"Hello, world!\")\n")],
    }
}

/// JSON reply a packager model would give for `files`
pub fn package_reply(files: &[(&str, &str)]) -> String {
    let files: Vec<_> = files
        .iter()
        .map(|(path, content)| json!({ "path": path, "content": content }))
        .collect();
    json!({ "files": files }).to_string()
}

/// [`package_reply`] for [`hello_world_files`]
pub fn hello_world_package_reply() -> String {
    package_reply(&[("main.py", "print(\"Hello, world!\")\n")])
}

/// `count` distinct code versions, `code v1` .. `code vN`
pub fn code_versions(count: usize) -> Vec<String> {
    (1..=count).map(|n| format!("code v{}", n)).collect()
}
