//! Configuration access port trait.

/// Raw string lookup; typed parsing and validation live in the domain.
pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
}
