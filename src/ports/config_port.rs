//! Configuration access port.
//!
//! Sectioned key/value lookup. Values are read as raw strings so callers
//! can reject ones that do not parse; `get_bool` falls back to `default`
//! when the key is absent or unrecognized.

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool;
}
