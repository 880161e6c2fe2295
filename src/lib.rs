//! marksect: a marked-section editor for telephony server configuration files.
//!
//! Sections are runs of lines between `;--- NAME ---` and `;/--- NAME ---` comment
//! lines. The [`store`] functions list, read, create, replace and delete them as pure
//! text transforms; [`section_file`] and [`edit_plan`] apply those transforms to files
//! on disk. The [`monitor`] and [`logs`] modules hold the state the dashboard relays to
//! its clients.
#![allow(clippy::multiple_crate_versions)]

pub mod config;
pub mod edit_plan;
pub mod error;
pub mod logs;
pub mod monitor;
pub mod reload;
pub mod scanner;
pub mod section;
pub mod section_file;
pub mod sentinel;
pub mod store;

pub use error::{Error, Result};
pub use section::Section;
pub use section_file::SectionFile;
