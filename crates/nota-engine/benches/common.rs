// Benchmark helper functions - Rust's dead code analysis doesn't understand
// that these are used by benchmark files in the same directory
// See: https://users.rust-lang.org/t/cargo-rustc-benches-awarnings/110111/2
#[allow(dead_code)]
pub fn generate_note_content(size: usize) -> String {
    let base = "== Title\n\n# Section\n\nParagraph with *some* content and a #tag on 2024-01-01.\n\n- Bullet point\n  - Nested item with `code`\n- Another item\n  continued\n\n1. First\n2. Second\n\n```rust\nfn example() {\n    println!(\"Hello\");\n}\n```\n\n";
    base.repeat(size)
}

#[allow(dead_code)]
pub fn generate_nested_list(depth: usize, width: usize) -> String {
    let mut content = String::new();
    for level in 0..depth {
        let indent = "  ".repeat(level);
        for i in 0..width {
            content.push_str(&format!("{indent}- Item {i} at level {level}\n"));
        }
    }
    content
}
