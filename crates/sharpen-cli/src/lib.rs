//! Sharpen CLI - batch and interactive front end for the sharpen engine
//!
//! This crate wires the `sharpen-core` pipeline to the filesystem, including
//! source discovery, timestamped backups, persisted settings, batch runs and
//! the dot-command session behind the `sharpen` binary.

pub mod backup;
pub mod batch;
pub mod config;
pub mod scanner;
pub mod selection;
pub mod session;

// Re-export commonly used types for convenience
pub use backup::{BackupError, BackupManager, BACKUP_DIR_NAME};
pub use batch::{RunOptions, RunSummary};
pub use config::{Settings, SettingsError};
pub use scanner::{scan, ScanError};
pub use selection::RuleSelection;
pub use session::{DefaultNotifier, Session, SessionCommand, SessionNotifier};
