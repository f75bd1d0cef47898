//! Terminal front end for the study desk: slash commands in, study panel and
//! message log out.

mod command;
mod feeders;
mod input;
mod styles;
mod transcript;
mod tui;
mod view;

pub use tui::run;
