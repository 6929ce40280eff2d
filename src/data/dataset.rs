use std::error::Error;
use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tempfile::NamedTempFile;

use super::index::{Coded, Indexed};
use super::{Continent, Country, Language, StateGroup};

pub const CONTINENTS_FILE: &str = "continents.json";
pub const COUNTRIES_FILE: &str = "countries.json";
pub const STATES_FILE: &str = "states.json";
pub const LANGUAGES_FILE: &str = "languages.json";

#[derive(Debug)]
pub enum LoadErrorKind {
    Io(io::Error),
    Json(serde_json::Error),
}

/// A dataset file that couldn't be read. Fatal at startup.
#[derive(Debug)]
pub struct LoadError {
    pub file: PathBuf,
    pub kind: LoadErrorKind,
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.kind {
            LoadErrorKind::Io(e) => write!(f, "could not read {}: {}", self.file.display(), e),
            LoadErrorKind::Json(e) => write!(f, "malformed {}: {}", self.file.display(), e),
        }
    }
}

impl Error for LoadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.kind {
            LoadErrorKind::Io(e) => Some(e),
            LoadErrorKind::Json(e) => Some(e),
        }
    }
}

/// All four collections. States live in a side table keyed by country code.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dataset {
    pub continents: Indexed<Continent>,
    pub countries: Indexed<Country>,
    pub states: Indexed<StateGroup>,
    pub languages: Indexed<Language>,
}

impl Dataset {
    pub fn new(
        continents: Vec<Continent>,
        countries: Vec<Country>,
        states: Vec<StateGroup>,
        languages: Vec<Language>,
    ) -> Self {
        Self {
            continents: continents.into(),
            countries: countries.into(),
            states: states.into(),
            languages: languages.into(),
        }
    }

    pub fn load(dir: &Path) -> Result<Self, LoadError> {
        let dataset = Self {
            continents: read_collection(&dir.join(CONTINENTS_FILE))?,
            countries: read_collection(&dir.join(COUNTRIES_FILE))?,
            states: read_collection(&dir.join(STATES_FILE))?,
            languages: read_collection(&dir.join(LANGUAGES_FILE))?,
        };
        info!(
            "loaded {} continents, {} countries, {} state groups, {} languages from {}",
            dataset.continents.len(),
            dataset.countries.len(),
            dataset.states.len(),
            dataset.languages.len(),
            dir.display()
        );
        Ok(dataset)
    }

    /// Rewrites every collection file under `dir`. Each file is replaced
    /// atomically; the set of four is not.
    pub fn save(&self, dir: &Path) -> io::Result<()> {
        write_collection(&dir.join(CONTINENTS_FILE), &self.continents)?;
        write_collection(&dir.join(COUNTRIES_FILE), &self.countries)?;
        write_collection(&dir.join(STATES_FILE), &self.states)?;
        write_collection(&dir.join(LANGUAGES_FILE), &self.languages)?;
        debug!("saved dataset to {}", dir.display());
        Ok(())
    }
}

fn read_collection<T>(path: &Path) -> Result<Indexed<T>, LoadError>
where
    T: DeserializeOwned + Coded,
{
    let file = File::open(path).map_err(|e| LoadError {
        file: path.to_owned(),
        kind: LoadErrorKind::Io(e),
    })?;
    let items: Vec<T> = serde_json::from_reader(BufReader::new(file)).map_err(|e| LoadError {
        file: path.to_owned(),
        kind: LoadErrorKind::Json(e),
    })?;
    trace!("read {} records from {}", items.len(), path.display());
    Ok(Indexed::new(items))
}

// Write to a sibling temp file and rename over the target so a crash never
// leaves a truncated collection behind.
fn write_collection<T: Serialize>(path: &Path, value: &T) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        serde_json::to_writer_pretty(&mut writer, value)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
    }
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
