use super::*;
use crate::Error;
use crate::model::Bundle;
use crate::training::TrainingRecord;
use crate::*;
use anyhow::Context;
use chrono::DateTime;
use chrono::Utc;
use std::fs::File;
use std::fs::OpenOptions;
use std::io::ErrorKind;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::time::SystemTime;

/// Same-second collisions tried before giving up on a filename.
const MAX_SUFFIX: usize = 1000;

/// Datasets, model bundles and training logs under one root.
#[derive(Debug, Clone)]
pub struct Store {
    root: PathBuf,
}

impl Store {
    /// Opens the store, creating its directories as needed.
    pub fn open(root: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let store = Self { root: root.into() };
        for dir in [store.models(), store.logs(), store.datasets()] {
            std::fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
        }
        Ok(store)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
    pub fn models(&self) -> PathBuf {
        self.root.join(MODELS_DIR)
    }
    pub fn logs(&self) -> PathBuf {
        self.root.join(LOGS_DIR)
    }
    pub fn datasets(&self) -> PathBuf {
        self.root.join(DATASETS_DIR)
    }

    // ------------------------------------------------------------------
    // datasets
    // ------------------------------------------------------------------

    /// Validates and stores an uploaded CSV verbatim.
    pub fn save_dataset(&self, bytes: &[u8]) -> Result<(String, Frame), Error> {
        let frame = Frame::parse(bytes)?;
        if frame.height() == 0 {
            return Err(Error::invalid("Dataset is empty"));
        }
        if frame.width() < MIN_DATASET_COLUMNS {
            return Err(Error::invalid(format!(
                "Dataset should have at least {} columns, got {}",
                MIN_DATASET_COLUMNS,
                frame.width()
            )));
        }
        let stem = format!("dataset_{}", stamp());
        let (path, mut file) = claim(&self.datasets(), &stem, "csv")?;
        file.write_all(bytes)
            .and_then(|_| file.sync_all())
            .inspect_err(|_| discard(&path))?;
        let filename = file_name(&path);
        log::info!("stored dataset {} {:?}", filename, frame.shape());
        Ok((filename, frame))
    }

    pub fn dataset_exists(&self, filename: &str) -> Result<bool, Error> {
        Ok(self.datasets().join(plain(filename)?).is_file())
    }

    pub fn load_dataset(&self, filename: &str) -> Result<Frame, Error> {
        let path = self.datasets().join(plain(filename)?);
        if !path.is_file() {
            return Err(Error::not_found("Dataset not found"));
        }
        Ok(Frame::read(&path)?)
    }

    /// Every readable `.csv` in the datasets directory, by filename.
    pub fn list_datasets(&self) -> anyhow::Result<Vec<DatasetInfo>> {
        Ok(scan(&self.datasets(), "csv")?
            .iter()
            .filter_map(|path| self.probe_dataset(path))
            .collect())
    }

    fn probe_dataset(&self, path: &Path) -> Option<DatasetInfo> {
        let (created, size) = stat(path)?;
        let header = Frame::header(path)
            .inspect_err(|e| log::warn!("skipping dataset {}: {:#}", path.display(), e))
            .ok()?;
        Some(DatasetInfo {
            filename: file_name(path),
            upload_date: created,
            file_size: size,
            columns: header.len(),
            sample_columns: header.into_iter().take(10).collect(),
        })
    }

    // ------------------------------------------------------------------
    // models
    // ------------------------------------------------------------------

    /// Writes `<name>_<stamp>.bin`; never overwrites an existing bundle.
    pub fn save_model(&self, bundle: &Bundle, name: &str) -> Result<PathBuf, Error> {
        let name = plain(name)?;
        let bytes = bundle.encode()?;
        let stem = format!("{}_{}", name, stamp());
        let (path, mut file) = claim(&self.models(), &stem, MODEL_EXTENSION)?;
        file.write_all(&bytes)
            .and_then(|_| file.sync_all())
            .inspect_err(|_| discard(&path))?;
        log::info!("saved model to {}", path.display());
        Ok(path)
    }

    pub fn load_model(&self, path: &Path) -> anyhow::Result<Bundle> {
        Bundle::load(path)
    }

    /// Removes a bundle written by a run that later failed.
    pub fn remove_model(&self, path: &Path) {
        discard(path);
    }

    /// Every `.bin` in the models directory, by filename. Unreadable files are
    /// skipped; undecodable bundles are listed without config or metrics.
    pub fn list_models(&self) -> anyhow::Result<Vec<ModelInfo>> {
        Ok(scan(&self.models(), MODEL_EXTENSION)?
            .iter()
            .filter_map(|path| self.probe_model(path))
            .collect())
    }

    fn probe_model(&self, path: &Path) -> Option<ModelInfo> {
        let (created, size) = stat(path)?;
        let bundle = Bundle::load(path)
            .inspect_err(|e| log::warn!("listing {} without metadata: {:#}", path.display(), e))
            .ok();
        Some(ModelInfo {
            model_name: path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default(),
            file_path: path.display().to_string(),
            creation_date: created,
            file_size: size,
            config: bundle.as_ref().map(|b| b.config.clone()),
            metrics: bundle.as_ref().map(|b| b.metrics),
        })
    }

    /// Deletes every bundle whose filename starts with `prefix`.
    pub fn delete_models(&self, prefix: &str) -> Result<Vec<String>, Error> {
        let matches = self.matching(prefix)?;
        if matches.is_empty() {
            return Err(Error::not_found("Model not found"));
        }
        let mut deleted = Vec::with_capacity(matches.len());
        for path in matches {
            std::fs::remove_file(&path)?;
            log::info!("deleted model {}", path.display());
            deleted.push(file_name(&path));
        }
        Ok(deleted)
    }

    /// The most recently created bundle whose filename starts with `prefix`.
    pub fn download_model(&self, prefix: &str) -> Result<(String, Vec<u8>), Error> {
        let path = self
            .matching(prefix)?
            .into_iter()
            .filter_map(|path| stat(&path).map(|(created, _)| (created, path)))
            .max()
            .map(|(_, path)| path)
            .ok_or_else(|| Error::not_found("Model not found"))?;
        let bytes = std::fs::read(&path)?;
        Ok((file_name(&path), bytes))
    }

    fn matching(&self, prefix: &str) -> Result<Vec<PathBuf>, Error> {
        let prefix = plain(prefix)?;
        Ok(scan(&self.models(), MODEL_EXTENSION)?
            .into_iter()
            .filter(|path| file_name(path).starts_with(prefix))
            .collect())
    }

    // ------------------------------------------------------------------
    // logs
    // ------------------------------------------------------------------

    pub fn save_log(&self, record: &TrainingRecord) -> anyhow::Result<PathBuf> {
        let path = self.logs().join(format!("{}.json", plain(&record.job_id)?));
        let json = serde_json::to_string_pretty(record).context("serialize training record")?;
        std::fs::write(&path, json).with_context(|| format!("write {}", path.display()))?;
        Ok(path)
    }
}

/// Accepts a bare file name; anything that could escape its directory is invalid.
pub(crate) fn plain(name: &str) -> Result<&str, Error> {
    let bad = name.is_empty()
        || name.starts_with('.')
        || name.contains(['/', '\\', '\0'])
        || name.contains("..");
    match bad {
        true => Err(Error::invalid(format!("Invalid file name '{}'", name))),
        false => Ok(name),
    }
}

fn stamp() -> String {
    chrono::Local::now().format(TIMESTAMP_FORMAT).to_string()
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Creates `<stem>.<ext>`, or `<stem>_<n>.<ext>` if taken.
fn claim(dir: &Path, stem: &str, extension: &str) -> std::io::Result<(PathBuf, File)> {
    for n in 0..MAX_SUFFIX {
        let path = match n {
            0 => dir.join(format!("{}.{}", stem, extension)),
            n => dir.join(format!("{}_{}.{}", stem, n, extension)),
        };
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((path, file)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e),
        }
    }
    Err(std::io::Error::new(
        ErrorKind::AlreadyExists,
        format!("no free filename for {} in {}", stem, dir.display()),
    ))
}

fn discard(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        log::warn!("could not remove {}: {}", path.display(), e);
    }
}

/// Regular files in `dir` with the given extension, sorted by name.
fn scan(dir: &Path, extension: &str) -> anyhow::Result<Vec<PathBuf>> {
    let mut paths = std::fs::read_dir(dir)
        .with_context(|| format!("read {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file())
        .filter(|path| path.extension().is_some_and(|e| e == extension))
        .collect::<Vec<_>>();
    paths.sort();
    Ok(paths)
}

/// Creation time (modification time where unsupported) and size.
fn stat(path: &Path) -> Option<(DateTime<Utc>, u64)> {
    std::fs::metadata(path)
        .inspect_err(|e| log::warn!("skipping {}: {}", path.display(), e))
        .ok()
        .map(|meta| {
            let created = meta
                .created()
                .or_else(|_| meta.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            (DateTime::<Utc>::from(created), meta.len())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Transformation;

    fn csv(columns: usize, rows: usize) -> Vec<u8> {
        let header = (0..columns).map(|c| format!("c{}", c)).collect::<Vec<_>>().join(",");
        let lines = (0..rows).map(|r| {
            (0..columns)
                .map(|c| (r * columns + c).to_string())
                .collect::<Vec<_>>()
                .join(",")
        });
        std::iter::once(header)
            .chain(lines)
            .map(|line| line + "\n")
            .collect::<String>()
            .into_bytes()
    }

    fn store() -> (tempfile::TempDir, Store) {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path()).unwrap();
        (dir, store)
    }

    #[test]
    fn narrow_datasets_are_rejected() {
        let (_dir, store) = store();
        let err = store.save_dataset(&csv(59, 3)).unwrap_err();
        assert!(matches!(err, Error::Invalid(ref m) if m.contains("at least 60")));
        assert!(store.list_datasets().unwrap().is_empty());
    }
    #[test]
    fn empty_datasets_are_rejected() {
        let (_dir, store) = store();
        assert!(matches!(store.save_dataset(&csv(60, 0)), Err(Error::Invalid(ref m)) if m == "Dataset is empty"));
        assert!(matches!(store.save_dataset(b""), Err(Error::Invalid(_))));
    }
    #[test]
    fn accepted_dataset_is_listed_and_loadable() {
        let (_dir, store) = store();
        let (filename, frame) = store.save_dataset(&csv(60, 3)).unwrap();
        assert!(filename.starts_with("dataset_") && filename.ends_with(".csv"));
        assert_eq!(frame.shape(), (3, 60));
        let listed = store.list_datasets().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].filename, filename);
        assert_eq!(listed[0].columns, 60);
        assert_eq!(listed[0].sample_columns.len(), 10);
        assert_eq!(store.load_dataset(&filename).unwrap(), frame);
    }
    #[test]
    fn same_second_uploads_do_not_collide() {
        let (_dir, store) = store();
        let (a, _) = store.save_dataset(&csv(60, 1)).unwrap();
        let (b, _) = store.save_dataset(&csv(60, 2)).unwrap();
        assert_ne!(a, b);
        assert_eq!(store.list_datasets().unwrap().len(), 2);
    }
    #[test]
    fn dataset_lookup_rejects_paths() {
        let (_dir, store) = store();
        assert!(matches!(store.load_dataset("missing.csv"), Err(Error::NotFound(_))));
        assert!(matches!(store.load_dataset("../secret.csv"), Err(Error::Invalid(_))));
        assert!(!store.dataset_exists("missing.csv").unwrap());
    }
    #[test]
    fn models_save_list_download_delete() {
        let (_dir, store) = store();
        let bundle = Bundle::fixture(Transformation::Standard, true);
        let first = store.save_model(&bundle, "blend").unwrap();
        let second = store.save_model(&bundle, "blend").unwrap();
        assert_ne!(first, second);
        let listed = store.list_models().unwrap();
        assert_eq!(listed.len(), 2);
        assert!(listed.iter().all(|m| m.config.is_some() && m.metrics.is_some()));
        let (name, bytes) = store.download_model("blend").unwrap();
        assert!(name.starts_with("blend_"));
        assert!(Bundle::decode(&bytes).is_ok());
        let deleted = store.delete_models("blend").unwrap();
        assert_eq!(deleted.len(), 2);
        assert!(matches!(store.delete_models("blend"), Err(Error::NotFound(_))));
        assert!(matches!(store.download_model("blend"), Err(Error::NotFound(_))));
    }
    #[test]
    fn undecodable_models_are_listed_bare() {
        let (_dir, store) = store();
        std::fs::write(store.models().join("broken.bin"), b"junk").unwrap();
        std::fs::write(store.models().join("notes.txt"), b"ignored").unwrap();
        let listed = store.list_models().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].model_name, "broken");
        assert!(listed[0].config.is_none());
        assert!(listed[0].metrics.is_none());
    }
    #[test]
    fn model_names_must_be_plain() {
        let (_dir, store) = store();
        let bundle = Bundle::fixture(Transformation::None, false);
        assert!(matches!(store.save_model(&bundle, "../up"), Err(Error::Invalid(_))));
        assert!(matches!(store.delete_models("a/b"), Err(Error::Invalid(_))));
    }
}
