pub mod console;
pub mod status_panel;
pub mod wall;
