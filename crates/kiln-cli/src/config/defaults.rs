use std::path::PathBuf;

pub fn default_src_dir() -> PathBuf {
    PathBuf::from("src")
}

pub fn default_pages_dir() -> PathBuf {
    PathBuf::from("src/pages")
}

pub fn default_out_dir() -> PathBuf {
    PathBuf::from("public")
}

pub fn default_cache_dir() -> PathBuf {
    PathBuf::from(".cache")
}

pub fn default_host() -> String {
    "localhost".to_string()
}

pub fn default_port() -> u16 {
    8000
}

pub fn default_debounce_ms() -> u64 {
    300 // matches kiln_core::DEFAULT_DEBOUNCE
}

pub fn default_watch_ignore() -> Vec<String> {
    vec!["node_modules".to_string(), "*.log".to_string(), "*.swp".to_string()]
}
