//! Error types for the justice system

use std::{io::Error as IoError, path::PathBuf};
use thiserror::Error;

use crate::types::Identity;

/// Ban folder storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to create ban folder {0}: {1}")]
    DirectoryCreate(PathBuf, IoError),

    #[error("Failed to read directory {0}: {1}")]
    DirectoryRead(PathBuf, IoError),

    #[error("Failed to read file {0}: {1}")]
    FileRead(PathBuf, IoError),

    #[error("Failed to create file {0}: {1}")]
    FileCreate(PathBuf, IoError),

    #[error("Failed to write to file {0}: {1}")]
    FileWrite(PathBuf, IoError),

    #[error("Failed to sync file {0}: {1}")]
    FileSync(PathBuf, IoError),

    #[error("Failed to rename file from {0} to {1}: {2}")]
    FileRename(PathBuf, PathBuf, IoError),

    #[error("Failed to serialize ban record for {0}: {1}")]
    Serialization(Identity, serde_json::Error),

    #[error("Failed to deserialize file {0}: {1}")]
    Deserialization(PathBuf, serde_json::Error),
}

/// Why a complaint command could not be parsed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MalformedKind {
    #[error("expected exactly 2 quote characters, found {0}")]
    QuoteCount(usize),

    #[error("missing command keyword")]
    MissingKeyword,
}

/// User-facing complaint rejections. These are answered with a reply to the
/// reporter and never treated as system faults.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ComplaintError {
    #[error("Malformed complaint: {0}")]
    Malformed(#[from] MalformedKind),

    #[error("Player not found: {0}")]
    PlayerNotFound(String),

    #[error("Players cannot report themselves")]
    SelfReport,
}

/// Top level error for the justice system
#[derive(Debug, Error)]
pub enum JusticeError {
    #[error("Complaint rejected: {0}")]
    Complaint(#[from] ComplaintError),

    #[error("Persistence failure: {0}")]
    Persistence(#[from] StorageError),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

pub type StorageResult<T> = Result<T, StorageError>;
pub type JusticeResult<T> = Result<T, JusticeError>;
