//! CLI output formatting.
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.
//!
//! ```text
//! photo.jpg → thumb.jpg
//!     4000x3000 → 800x600 jpg (48213 bytes)
//! ```

use crate::imaging::{Dimensions, ResizeResult};
use crate::store::StoredImage;

fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{line}");
    }
}

pub fn format_resize_output(
    input: &str,
    output: &str,
    source: Dimensions,
    result: &ResizeResult,
) -> Vec<String> {
    vec![
        format!("{input} → {output}"),
        format!(
            "    {}x{} → {}x{} {} ({} bytes)",
            source.width,
            source.height,
            result.width,
            result.height,
            result.encoding,
            result.bytes.len()
        ),
    ]
}

pub fn print_resize_output(input: &str, output: &str, source: Dimensions, result: &ResizeResult) {
    print_lines(&format_resize_output(input, output, source, result));
}

pub fn format_size_output(dims: Dimensions) -> Vec<String> {
    vec![format!("{}x{}", dims.width, dims.height)]
}

pub fn print_size_output(dims: Dimensions) {
    print_lines(&format_size_output(dims));
}

pub fn format_store_output(stored: &StoredImage) -> Vec<String> {
    vec![
        format!("Stored {}", stored.filename),
        format!("    Path: {}", stored.path.display()),
        format!("    Size: {}x{}", stored.width, stored.height),
    ]
}

pub fn print_store_output(stored: &StoredImage) {
    print_lines(&format_store_output(stored));
}
