pub mod canvas;
pub mod gui;
pub mod inference;
pub mod logging;
pub mod settings;
