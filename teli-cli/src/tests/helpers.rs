//! Test helpers for throwaway collection databases.

use super::*;
use teli_core::{CollectionStore, ItemMetadata, RankedItem, Rating};
use tempfile::TempDir;

/// A collection database inside a temporary directory.
pub(super) struct TempCollection {
    _dir: TempDir,
    root: Utf8PathBuf,
    db: Utf8PathBuf,
}

impl TempCollection {
    pub(super) fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 workspace");
        let db = root.join("teli.db");
        Self {
            _dir: dir,
            root,
            db,
        }
    }

    pub(super) fn db(&self) -> &Utf8Path {
        &self.db
    }

    pub(super) fn path(&self, name: &str) -> Utf8PathBuf {
        self.root.join(name)
    }

    pub(super) fn open(&self) -> SqliteCollectionStore {
        open_store(&self.db).expect("open collection")
    }

    /// Seed the collection with `(id, rating, title)` entries.
    pub(super) fn seed(&self, entries: &[(u64, i64, &str)]) {
        let mut store = self.open();
        for (id, rating, title) in entries {
            let item = RankedItem::new(*id, Rating::new(*rating))
                .with_metadata(ItemMetadata::titled(*title));
            store.append(item).expect("append item");
        }
    }
}

pub(super) fn output(buffer: Vec<u8>) -> String {
    String::from_utf8(buffer).expect("stdout utf-8")
}
