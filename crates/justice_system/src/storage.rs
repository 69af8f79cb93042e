//! Durable ban storage
//!
//! One JSON file per banned identity inside the ban folder.

use std::fmt::Write as _;
use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

use crate::error::{StorageError, StorageResult};
use crate::types::{ExclusionRecord, Identity};

const FILE_PREFIX: &str = "ban-";
const FILE_SUFFIX: &str = ".json";

/// Backing store for permanent bans
pub trait ExclusionBackend: Send + Sync + std::fmt::Debug {
    /// Load every readable ban record. A single unreadable or corrupt record
    /// is skipped, only failing to enumerate the store is an error.
    fn load_all(&self) -> StorageResult<Vec<ExclusionRecord>>;

    /// Durably persist one ban record
    fn save(&self, record: &ExclusionRecord) -> StorageResult<()>;
}

/// JSON file per ban, named `ban-<identity>.json`
#[derive(Debug)]
pub struct JsonExclusionBackend {
    ban_folder: PathBuf,
}

impl JsonExclusionBackend {
    /// Open the ban folder, creating it if it doesn't exist
    pub fn new(ban_folder: impl Into<PathBuf>) -> StorageResult<Self> {
        let ban_folder = ban_folder.into();
        if !ban_folder.exists() {
            fs::create_dir_all(&ban_folder)
                .map_err(|e| StorageError::DirectoryCreate(ban_folder.clone(), e))?;
            info!("Created ban folder: {}", ban_folder.display());
        }

        Ok(Self { ban_folder })
    }

    pub fn ban_folder(&self) -> &Path {
        &self.ban_folder
    }

    /// Path of the file holding the ban for `identity`
    pub fn record_path(&self, identity: &Identity) -> PathBuf {
        self.ban_folder.join(file_name_for(identity))
    }

    fn load_record_file(&self, path: &Path) -> StorageResult<ExclusionRecord> {
        let contents =
            fs::read_to_string(path).map_err(|e| StorageError::FileRead(path.to_path_buf(), e))?;

        serde_json::from_str(&contents)
            .map_err(|e| StorageError::Deserialization(path.to_path_buf(), e))
    }
}

impl ExclusionBackend for JsonExclusionBackend {
    #[instrument(skip(self), fields(folder = %self.ban_folder.display()))]
    fn load_all(&self) -> StorageResult<Vec<ExclusionRecord>> {
        let mut records = Vec::new();
        let entries = fs::read_dir(&self.ban_folder)
            .map_err(|e| StorageError::DirectoryRead(self.ban_folder.clone(), e))?;

        for entry in entries {
            let entry = entry.map_err(|e| StorageError::DirectoryRead(self.ban_folder.clone(), e))?;
            let path = entry.path();
            if !is_record_file(&path) {
                continue;
            }

            match self.load_record_file(&path) {
                Ok(record) => {
                    if record.count as usize != record.reporter_identities.len() {
                        warn!(
                            "Ban record {} has count {} but {} reporters",
                            path.display(),
                            record.count,
                            record.reporter_identities.len()
                        );
                    }
                    debug!("Loaded ban for {}", record.offender_identity);
                    records.push(record);
                }
                Err(e) => {
                    warn!("Skipping unreadable ban record: {}", e);
                    continue;
                }
            }
        }

        Ok(records)
    }

    #[instrument(skip(self, record), fields(identity = %record.offender_identity))]
    fn save(&self, record: &ExclusionRecord) -> StorageResult<()> {
        let path = self.record_path(&record.offender_identity);
        let temp_path = path.with_extension("tmp");

        let json = serde_json::to_string_pretty(record)
            .map_err(|e| StorageError::Serialization(record.offender_identity.clone(), e))?;

        let mut file = fs::File::create(&temp_path)
            .map_err(|e| StorageError::FileCreate(temp_path.clone(), e))?;

        file.write_all(json.as_bytes())
            .map_err(|e| StorageError::FileWrite(temp_path.clone(), e))?;

        file.sync_all()
            .map_err(|e| StorageError::FileSync(temp_path.clone(), e))?;

        // Atomic rename
        fs::rename(&temp_path, &path)
            .map_err(|e| StorageError::FileRename(temp_path, path.clone(), e))?;

        info!("Saved ban record: {}", path.display());
        Ok(())
    }
}

/// Deterministic file name for an identity.
///
/// Anything outside `[A-Za-z0-9.-]` is written as `_xx` (hex byte) so the
/// mapping stays injective and portable, e.g. IPv6 colons.
pub fn file_name_for(identity: &Identity) -> String {
    let mut name = String::with_capacity(FILE_PREFIX.len() + identity.as_str().len() + FILE_SUFFIX.len());
    name.push_str(FILE_PREFIX);
    for byte in identity.as_str().bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'.' || byte == b'-' {
            name.push(byte as char);
        } else {
            let _ = write!(name, "_{byte:02x}");
        }
    }
    name.push_str(FILE_SUFFIX);
    name
}

fn is_record_file(path: &Path) -> bool {
    path.is_file()
        && path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with(FILE_PREFIX) && name.ends_with(FILE_SUFFIX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ComplaintRecord;
    use tempfile::TempDir;

    fn sample_ban(identity: &str) -> ExclusionRecord {
        let mut record = ComplaintRecord::new(identity.into(), "Bob", "10.0.0.1".into(), "wallhack");
        record.push("10.0.0.2".into(), "aimbot");
        record.into_exclusion()
    }

    #[test]
    fn test_file_names() {
        assert_eq!(file_name_for(&"10.0.0.5".into()), "ban-10.0.0.5.json");
        assert_eq!(file_name_for(&"::1".into()), "ban-_3a_3a1.json");
        // Escaping the escape character keeps distinct identities distinct
        assert_ne!(file_name_for(&"a_3a".into()), file_name_for(&"a:".into()));
    }

    #[test]
    fn test_creates_missing_folder() {
        let dir = TempDir::new().unwrap();
        let folder = dir.path().join("nested").join("bans");
        let backend = JsonExclusionBackend::new(&folder).unwrap();

        assert!(folder.is_dir());
        assert!(backend.load_all().unwrap().is_empty());
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let backend = JsonExclusionBackend::new(dir.path()).unwrap();
        let ban = sample_ban("10.0.0.9");

        backend.save(&ban).unwrap();
        assert!(backend.record_path(&ban.offender_identity).is_file());
        assert!(!backend.record_path(&ban.offender_identity).with_extension("tmp").exists());

        let loaded = backend.load_all().unwrap();
        assert_eq!(loaded, vec![ban]);
    }

    #[test]
    fn test_corrupt_and_foreign_files_are_skipped() {
        let dir = TempDir::new().unwrap();
        let backend = JsonExclusionBackend::new(dir.path()).unwrap();
        backend.save(&sample_ban("10.0.0.9")).unwrap();

        fs::write(dir.path().join("ban-broken.json"), "{ not json").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignore me").unwrap();
        fs::write(dir.path().join("other.json"), "{}").unwrap();

        let loaded = backend.load_all().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].offender_identity.as_str(), "10.0.0.9");
    }

    #[test]
    fn test_reads_hand_written_record() {
        let dir = TempDir::new().unwrap();
        let backend = JsonExclusionBackend::new(dir.path()).unwrap();
        let json = r#"{
            "offenderDisplayName": "Mallory",
            "offenderIdentity": "172.16.0.3",
            "count": 1,
            "reasons": ["speedhack"],
            "reporterIdentities": ["172.16.0.4"]
        }"#;
        fs::write(dir.path().join("ban-172.16.0.3.json"), json).unwrap();

        let loaded = backend.load_all().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].offender_display_name, "Mallory");
        assert_eq!(loaded[0].reasons, vec!["speedhack"]);
    }
}
