//! Persistence of trained parameters.
use crate::ParamSnapshot;
use anyhow::Result;
use log::info;
use std::{
    fs::{self, File},
    io::{BufReader, Write},
    path::{Path, PathBuf},
};

/// Saves and restores parameter snapshots.
pub trait Saver {
    /// Saves `snapshot`, tagged with the number of completed episodes.
    fn save(&mut self, episodes: usize, snapshot: &ParamSnapshot) -> Result<()>;

    /// Restores the last saved snapshot, if any.
    fn load(&mut self) -> Result<Option<ParamSnapshot>>;
}

/// A saver that keeps nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSaver;

impl Saver for NullSaver {
    fn save(&mut self, _episodes: usize, _snapshot: &ParamSnapshot) -> Result<()> {
        Ok(())
    }

    fn load(&mut self) -> Result<Option<ParamSnapshot>> {
        Ok(None)
    }
}

/// Writes snapshots as YAML files under a model directory.
///
/// A save with `episodes = 120` writes `<model_dir>/120/params.yaml` and
/// overwrites `<model_dir>/latest/params.yaml`, which is what
/// [`Saver::load`] reads back.
#[derive(Debug, Clone)]
pub struct FileSaver {
    model_dir: PathBuf,
}

impl FileSaver {
    const FILE_NAME: &'static str = "params.yaml";

    /// Constructs a saver rooted at `model_dir`.
    pub fn new(model_dir: impl AsRef<Path>) -> Self {
        Self {
            model_dir: model_dir.as_ref().to_path_buf(),
        }
    }

    fn write(dir: &Path, snapshot: &ParamSnapshot) -> Result<()> {
        fs::create_dir_all(dir)?;
        let mut file = File::create(dir.join(Self::FILE_NAME))?;
        file.write_all(serde_yaml::to_string(snapshot)?.as_bytes())?;
        Ok(())
    }
}

impl Saver for FileSaver {
    fn save(&mut self, episodes: usize, snapshot: &ParamSnapshot) -> Result<()> {
        let dir = self.model_dir.join(episodes.to_string());
        Self::write(&dir, snapshot)?;
        Self::write(&self.model_dir.join("latest"), snapshot)?;
        info!("Saved parameters in {:?}", &dir);
        Ok(())
    }

    fn load(&mut self) -> Result<Option<ParamSnapshot>> {
        let path = self.model_dir.join("latest").join(Self::FILE_NAME);
        if !path.exists() {
            return Ok(None);
        }
        let rdr = BufReader::new(File::open(&path)?);
        let snapshot: ParamSnapshot = serde_yaml::from_reader(rdr)?;
        info!("Loaded parameters from {:?}", &path);
        Ok(Some(snapshot))
    }
}
