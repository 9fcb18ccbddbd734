//! Terminal interface: the command list, the output panel and the dialogs

pub mod app;
pub mod form;
mod key_handler;
pub mod log_state;
pub mod output_state;
mod output_widget;
mod render;
mod toolbar;
