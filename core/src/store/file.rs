//! JSON-file save back-end: `slot_<n>.json` plus a `slot_<n>.summary.json`
//! sidecar per slot.
//!
//! RULES:
//!   - Both files are written to `.tmp` siblings first. Renaming the
//!     document into place is the only commit point.
//!   - A failure before that rename leaves the previous save untouched.
//!   - A sidecar that cannot be replaced after the commit is removed; the
//!     summary is then rebuilt from the document.

use super::{SaveBackend, SlotRecord, SlotSummary};
use crate::{document::UnifiedDocument, error::HavenResult, types::SlotId};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub struct JsonFileSaveBackend {
    dir: PathBuf,
}

impl JsonFileSaveBackend {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn slot_path(&self, slot: SlotId) -> PathBuf {
        self.dir.join(format!("slot_{slot}.json"))
    }

    fn summary_path(&self, slot: SlotId) -> PathBuf {
        self.dir.join(format!("slot_{slot}.summary.json"))
    }

    fn slot_of(file_name: &str) -> Option<SlotId> {
        file_name
            .strip_prefix("slot_")?
            .strip_suffix(".json")
            .filter(|stem| !stem.contains('.'))?
            .parse()
            .ok()
    }

    /// Summary for `slot`: the sidecar if it is readable, otherwise built
    /// from the document itself.
    fn summary_for(&self, slot: SlotId) -> Option<SlotSummary> {
        let sidecar = fs::read_to_string(self.summary_path(slot))
            .ok()
            .and_then(|text| serde_json::from_str::<SlotSummary>(&text).ok());
        if let Some(summary) = sidecar {
            return Some(SlotSummary { slot, ..summary });
        }
        let text = fs::read_to_string(self.slot_path(slot)).ok()?;
        let doc = UnifiedDocument::from_json(&text).ok().flatten()?;
        Some(SlotSummary::from_document(slot, &doc))
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    path.with_extension("json.tmp")
}

/// Best-effort cleanup of a leftover file.
fn discard(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        if e.kind() != io::ErrorKind::NotFound {
            log::warn!("could not remove {}: {e}", path.display());
        }
    }
}

/// Write both temp files, then rename the document into place.
fn stage_and_commit(record: &SlotRecord, doc_tmp: &Path, summary_tmp: &Path, doc_path: &Path) -> HavenResult<()> {
    let summary = serde_json::to_string_pretty(&record.summary)?;
    fs::write(doc_tmp, &record.document)?;
    fs::write(summary_tmp, summary)?;
    fs::rename(doc_tmp, doc_path)?;
    Ok(())
}

impl SaveBackend for JsonFileSaveBackend {
    fn write(&mut self, record: &SlotRecord) -> HavenResult<()> {
        fs::create_dir_all(&self.dir)?;
        let slot = record.summary.slot;
        let (doc_path, summary_path) = (self.slot_path(slot), self.summary_path(slot));
        let (doc_tmp, summary_tmp) = (tmp_path(&doc_path), tmp_path(&summary_path));

        if let Err(e) = stage_and_commit(record, &doc_tmp, &summary_tmp, &doc_path) {
            discard(&doc_tmp);
            discard(&summary_tmp);
            return Err(e);
        }

        // Committed. The sidecar is only a cache from here on.
        if let Err(e) = fs::rename(&summary_tmp, &summary_path) {
            log::warn!("slot {slot}: summary sidecar not replaced ({e}); it will be rebuilt from the document");
            discard(&summary_tmp);
            discard(&summary_path);
        }
        Ok(())
    }

    fn read(&self, slot: SlotId) -> HavenResult<Option<String>> {
        match fs::read_to_string(self.slot_path(slot)) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn summaries(&self) -> HavenResult<Vec<SlotSummary>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut slots: Vec<SlotId> = Vec::new();
        for entry in entries {
            let name = entry?.file_name();
            if let Some(slot) = name.to_str().and_then(Self::slot_of) {
                slots.push(slot);
            }
        }
        slots.sort_unstable();
        Ok(slots.into_iter().filter_map(|slot| self.summary_for(slot)).collect())
    }

    fn remove(&mut self, slot: SlotId) -> HavenResult<bool> {
        let mut removed = false;
        for path in [self.slot_path(slot), self.summary_path(slot)] {
            match fs::remove_file(&path) {
                Ok(()) => removed = true,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(removed)
    }
}
