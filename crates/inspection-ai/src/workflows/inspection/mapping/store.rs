use super::TradeMappingEntry;
use crate::workflows::inspection::domain::{Trade, UnknownTrade};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Persistence boundary for the trade mapping registry.
pub trait MappingStore: Send + Sync {
    fn load_all(&self) -> Result<Vec<TradeMappingEntry>, MappingStoreError>;
    fn save_all(&self, entries: &[TradeMappingEntry]) -> Result<(), MappingStoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum MappingStoreError {
    #[error("failed to access trade mapping file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid trade mapping CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("trade mapping row {line}: {source}")]
    InvalidTrade { line: u64, source: UnknownTrade },
    #[error("trade mapping file must have raw_label/canonical_trade or Room/Component/Trade columns")]
    UnsupportedLayout,
    #[error("mapping store unavailable: {0}")]
    Unavailable(String),
}

/// CSV file holding `raw_label,canonical_trade,active` rows.
///
/// The legacy master-mapping layout (`Room,Component,Trade`) is read as well; each
/// pair becomes a `"Room / Component"` label. Saving always writes the native layout.
#[derive(Debug, Clone)]
pub struct CsvMappingStore {
    path: PathBuf,
}

impl CsvMappingStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_else(|| "trade_mappings.csv".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

fn write_file(path: &Path, entries: &[TradeMappingEntry]) -> Result<(), MappingStoreError> {
    let mut file = std::fs::File::create(path)?;
    write_entries(&mut file, entries)?;
    file.sync_all()?;
    Ok(())
}

impl MappingStore for CsvMappingStore {
    fn load_all(&self) -> Result<Vec<TradeMappingEntry>, MappingStoreError> {
        if !self.path.exists() {
            warn!(path = %self.path.display(), "trade mapping file missing; starting empty");
            return Ok(Vec::new());
        }
        let file = std::fs::File::open(&self.path)?;
        let entries = read_entries(file)?;
        info!(path = %self.path.display(), entries = entries.len(), "trade mappings loaded");
        Ok(entries)
    }

    /// Writes a sibling temp file and renames it over the live file, so a failed
    /// save leaves the previous mappings in place.
    fn save_all(&self, entries: &[TradeMappingEntry]) -> Result<(), MappingStoreError> {
        let staging = self.staging_path();
        if let Err(err) = write_file(&staging, entries) {
            std::fs::remove_file(&staging).ok();
            return Err(err);
        }
        std::fs::rename(&staging, &self.path)?;
        info!(path = %self.path.display(), entries = entries.len(), "trade mappings saved");
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct MappingRow {
    raw_label: String,
    canonical_trade: String,
    #[serde(default = "default_active")]
    active: bool,
}

#[derive(Debug, Deserialize)]
struct LegacyMappingRow {
    #[serde(rename = "Room")]
    room: String,
    #[serde(rename = "Component")]
    component: String,
    #[serde(rename = "Trade", default)]
    trade: String,
}

fn default_active() -> bool {
    true
}

pub fn read_entries<R: Read>(reader: R) -> Result<Vec<TradeMappingEntry>, MappingStoreError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = csv_reader.headers()?.clone();
    let has = |name: &str| headers.iter().any(|header| header == name);

    let mut entries = Vec::new();
    if has("raw_label") && has("canonical_trade") {
        for (index, row) in csv_reader.deserialize::<MappingRow>().enumerate() {
            let row = row?;
            let canonical_trade = parse_trade(&row.canonical_trade, index)?;
            entries.push(TradeMappingEntry {
                raw_label: row.raw_label,
                canonical_trade,
                active: row.active,
            });
        }
    } else if has("Room") && has("Component") && has("Trade") {
        for (index, row) in csv_reader.deserialize::<LegacyMappingRow>().enumerate() {
            let row = row?;
            // Unassigned components are left for an admin to map.
            if row.trade.is_empty() {
                continue;
            }
            let canonical_trade = parse_trade(&row.trade, index)?;
            entries.push(TradeMappingEntry {
                raw_label: format!("{} / {}", row.room, row.component),
                canonical_trade,
                active: true,
            });
        }
    } else {
        return Err(MappingStoreError::UnsupportedLayout);
    }

    Ok(entries)
}

pub fn write_entries<W: Write>(
    writer: W,
    entries: &[TradeMappingEntry],
) -> Result<(), MappingStoreError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for entry in entries {
        csv_writer.serialize(MappingRow {
            raw_label: entry.raw_label.clone(),
            canonical_trade: entry.canonical_trade.label().to_string(),
            active: entry.active,
        })?;
    }
    csv_writer.flush()?;
    Ok(())
}

fn parse_trade(value: &str, index: usize) -> Result<Trade, MappingStoreError> {
    value
        .parse::<Trade>()
        .map_err(|source| MappingStoreError::InvalidTrade {
            line: index as u64 + 2,
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn reads_native_layout_with_inactive_rows() {
        let csv = "raw_label,canonical_trade,active\nsparky,Electrical,true\nhvac-old,plumbing,false\n";
        let entries = read_entries(Cursor::new(csv)).expect("parse");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].canonical_trade, Trade::Electrical);
        assert_eq!(entries[1].canonical_trade, Trade::Plumbing);
        assert!(!entries[1].active);
    }

    #[test]
    fn reads_legacy_master_mapping_and_skips_blank_trades() {
        let csv = "Room,Component,Trade\nBathroom,Toilet,Plumbing\nBalcony,Balustrade,Carpentry & Joinery\nLaundry,Dryer Vent,\n";
        let entries = read_entries(Cursor::new(csv)).expect("parse");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].raw_label, "Bathroom / Toilet");
        assert_eq!(entries[1].canonical_trade, Trade::CarpentryAndJoinery);
    }

    #[test]
    fn rejects_unknown_trades_with_line_number() {
        let csv = "raw_label,canonical_trade\nsparky,Electrical\nducts,HVAC\n";
        match read_entries(Cursor::new(csv)) {
            Err(MappingStoreError::InvalidTrade { line, source }) => {
                assert_eq!(line, 3);
                assert_eq!(source, UnknownTrade("HVAC".to_string()));
            }
            other => panic!("expected invalid trade, got {other:?}"),
        }
    }

    #[test]
    fn rejects_unrecognized_layout() {
        let error = read_entries(Cursor::new("label,trade\nx,y\n")).expect_err("layout");
        assert!(matches!(error, MappingStoreError::UnsupportedLayout));
    }

    #[test]
    fn written_entries_read_back() {
        let entries = vec![
            TradeMappingEntry {
                raw_label: "tiler".to_string(),
                canonical_trade: Trade::FlooringTiles,
                active: false,
            },
        ];
        let mut buffer = Vec::new();
        write_entries(&mut buffer, &entries).expect("write");
        let text = String::from_utf8(buffer).expect("utf8");
        assert_eq!(text, "raw_label,canonical_trade,active\ntiler,Flooring - Tiles,false\n");
        assert_eq!(read_entries(Cursor::new(text)).expect("read"), entries);
    }

    fn scratch_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("inspection-ai-{}-{name}", std::process::id()))
    }

    #[test]
    fn save_replaces_file_and_leaves_no_staging_file() {
        let path = scratch_path("save-replaces.csv");
        std::fs::write(&path, "raw_label,canonical_trade,active\nsparky,Electrical,true\n")
            .expect("seed file");
        let store = CsvMappingStore::new(&path);
        let entries = vec![TradeMappingEntry {
            raw_label: "tiler".to_string(),
            canonical_trade: Trade::FlooringTiles,
            active: true,
        }];

        store.save_all(&entries).expect("save");
        let reloaded = store.load_all().expect("reload");
        let staging_left = store.staging_path().exists();
        std::fs::remove_file(&path).ok();

        assert_eq!(reloaded, entries);
        assert!(!staging_left);
    }

    #[test]
    fn failed_save_keeps_the_previous_file() {
        let path = scratch_path("failed-save.csv");
        let original = "raw_label,canonical_trade,active\nsparky,Electrical,true\n";
        std::fs::write(&path, original).expect("seed file");
        let store = CsvMappingStore::new(&path);
        // A directory squatting on the staging path makes the write fail.
        std::fs::create_dir_all(store.staging_path()).expect("block staging path");

        let result = store.save_all(&[TradeMappingEntry {
            raw_label: "tiler".to_string(),
            canonical_trade: Trade::FlooringTiles,
            active: true,
        }]);
        let contents = std::fs::read_to_string(&path).expect("file still readable");
        std::fs::remove_dir_all(store.staging_path()).ok();
        std::fs::remove_file(&path).ok();

        assert!(matches!(result, Err(MappingStoreError::Io(_))));
        assert_eq!(contents, original);
    }

    #[test]
    fn missing_file_loads_empty() {
        let store = CsvMappingStore::new("./does-not-exist-mappings.csv");
        assert!(store.load_all().expect("missing file tolerated").is_empty());
    }
}
