pub mod debounce;
pub mod input;
pub mod surface;
