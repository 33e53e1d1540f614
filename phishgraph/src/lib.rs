// Include handlers module directly from handlers.rs
#[path = "handlers.rs"]
pub mod handlers;

// Re-export commonly used helpers for convenience
pub use handlers::{
    LabeledPage, encode_pages, load_config, load_lines, load_pages, load_urls_from_file,
    write_jsonl,
};
