use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError, RwLock};

use itertools::Itertools;
use tokio::sync::broadcast;

use super::{
    Continent, ContinentPatch, Country, CountryPatch, CountryRef, DataError, Dataset, EntityKind,
    Language, LoadError, NewContinent, NewCountry, NewState, Result, State,
};

const COUNTRY_ADDED_CAPACITY: usize = 64;

/// The in-memory dataset shared by every request.
///
/// Reads run concurrently against the current snapshot; every mutation holds
/// the write lock for its whole check-then-modify sequence, so writes are
/// serialized and a failed write leaves the dataset untouched.
///
/// Mutations only mark the store dirty. When a persistence directory is set,
/// [`DatasetStore::flush`] writes the collections back out.
#[derive(Debug)]
pub struct DatasetStore {
    dataset: RwLock<Dataset>,
    persist_dir: Option<PathBuf>,
    dirty: AtomicBool,
    flush_lock: Mutex<()>,
    country_added: broadcast::Sender<Country>,
}

impl DatasetStore {
    pub fn new(dataset: Dataset) -> Self {
        let (country_added, _) = broadcast::channel(COUNTRY_ADDED_CAPACITY);
        Self {
            dataset: RwLock::new(dataset),
            persist_dir: None,
            dirty: AtomicBool::new(false),
            flush_lock: Mutex::new(()),
            country_added,
        }
    }

    /// Loads the dataset from `dir`; with `persist`, flushes go back to the
    /// same files.
    pub fn open(dir: &Path, persist: bool) -> std::result::Result<Self, LoadError> {
        let store = Self::new(Dataset::load(dir)?);
        Ok(if persist {
            store.persist_to(dir)
        } else {
            store
        })
    }

    pub fn persist_to(mut self, dir: &Path) -> Self {
        self.persist_dir = Some(dir.to_owned());
        self
    }

    /// Runs `f` against the current dataset under the read lock.
    pub fn read<R>(&self, f: impl FnOnce(&Dataset) -> R) -> R {
        // Records are plain values, so a panic mid-write can't leave them
        // half-built; recover from poisoning.
        let dataset = self.dataset.read().unwrap_or_else(PoisonError::into_inner);
        f(&dataset)
    }

    fn write<R>(&self, f: impl FnOnce(&mut Dataset) -> Result<R>) -> Result<R> {
        let mut dataset = self.dataset.write().unwrap_or_else(PoisonError::into_inner);
        let result = f(&mut dataset)?;
        self.dirty.store(true, Ordering::Release);
        Ok(result)
    }

    pub fn continents(&self) -> Vec<Continent> {
        self.read(|ds| ds.continents.all().to_vec())
    }

    pub fn continent(&self, code: &str) -> Option<Continent> {
        self.read(|ds| ds.continents.find(code).cloned())
    }

    pub fn countries(&self) -> Vec<Country> {
        self.read(|ds| ds.countries.all().to_vec())
    }

    pub fn country(&self, code: &str) -> Option<Country> {
        self.read(|ds| ds.countries.find(code).cloned())
    }

    pub fn languages(&self) -> Vec<Language> {
        self.read(|ds| ds.languages.all().to_vec())
    }

    pub fn language(&self, code: &str) -> Option<Language> {
        self.read(|ds| ds.languages.find(code).cloned())
    }

    /// The side-table list for `country_code`, or empty if there is none.
    pub fn states(&self, country_code: &str) -> Vec<State> {
        self.read(|ds| super::resolve::country_states(ds, country_code).to_vec())
    }

    pub fn search_countries(&self, search: &str) -> Vec<Country> {
        self.read(|ds| {
            super::resolve::search_countries(ds, search)
                .cloned()
                .collect()
        })
    }

    /// Rejects a code that is already taken. Subscribers to
    /// [`DatasetStore::subscribe_country_added`] get the new record.
    pub fn create_country(&self, new: NewCountry) -> Result<Country> {
        debug!("create country {} ({})", new.code, new.name);
        let country = self.write(|ds| {
            if ds.countries.contains(&new.code) {
                return Err(DataError::duplicate(EntityKind::Country, &new.code));
            }
            let country = Country::from(new);
            ds.countries.push(country.clone());
            Ok(country)
        })?;
        if self.country_added.send(country.clone()).is_err() {
            trace!("no countryAdded subscribers for {}", country.code);
        }
        Ok(country)
    }

    pub fn update_country(&self, code: &str, patch: CountryPatch) -> Result<Country> {
        debug!("update country {}: {:?}", code, patch);
        self.write(|ds| {
            if let Some(new_code) = &patch.code {
                if new_code != code && ds.countries.contains(new_code) {
                    return Err(DataError::duplicate(EntityKind::Country, new_code));
                }
            }
            ds.countries
                .update(code, |country| country.apply(patch))
                .cloned()
                .ok_or_else(|| DataError::not_found(EntityKind::Country, code))
        })
    }

    /// Continent references and the states side table are left alone; any
    /// reference to the deleted code becomes dangling.
    pub fn delete_country(&self, code: &str) -> Result<bool> {
        debug!("delete country {}", code);
        self.write(|ds| {
            ds.countries
                .remove(code)
                .map(|_| true)
                .ok_or_else(|| DataError::not_found(EntityKind::Country, code))
        })
    }

    pub fn create_continent(&self, new: NewContinent) -> Result<Continent> {
        debug!(
            "create continent {} ({}) with countries [{}]",
            new.code,
            new.name,
            new.countries.iter().join(", ")
        );
        self.write(|ds| {
            if ds.continents.contains(&new.code) {
                return Err(DataError::duplicate(EntityKind::Continent, &new.code));
            }
            let continent = Continent {
                countries: country_refs(ds, new.countries),
                code: new.code,
                name: new.name,
            };
            ds.continents.push(continent.clone());
            Ok(continent)
        })
    }

    pub fn update_continent(&self, code: &str, patch: ContinentPatch) -> Result<Continent> {
        debug!("update continent {}: {:?}", code, patch);
        self.write(|ds| {
            if let Some(new_code) = &patch.code {
                if new_code != code && ds.continents.contains(new_code) {
                    return Err(DataError::duplicate(EntityKind::Continent, new_code));
                }
            }
            let countries = patch.countries.map(|codes| country_refs(ds, codes));
            ds.continents
                .update(code, |continent| {
                    if let Some(code) = patch.code {
                        continent.code = code;
                    }
                    if let Some(name) = patch.name {
                        continent.name = name;
                    }
                    if let Some(countries) = countries {
                        continent.countries = countries;
                    }
                })
                .cloned()
                .ok_or_else(|| DataError::not_found(EntityKind::Continent, code))
        })
    }

    pub fn delete_continent(&self, code: &str) -> Result<bool> {
        debug!("delete continent {}", code);
        self.write(|ds| {
            ds.continents
                .remove(code)
                .map(|_| true)
                .ok_or_else(|| DataError::not_found(EntityKind::Continent, code))
        })
    }

    /// The country must already have a side-table entry.
    pub fn create_state(&self, new: NewState) -> Result<State> {
        debug!(
            "create state {} ({}) in {}",
            new.code, new.name, new.country_code
        );
        self.write(|ds| {
            let group = ds
                .states
                .find_mut(&new.country_code)
                .ok_or_else(|| DataError::not_found(EntityKind::Country, &new.country_code))?;
            if group.position(&new.code).is_some() {
                return Err(DataError::DuplicateState {
                    country_code: new.country_code,
                    code: new.code,
                });
            }
            let state = State {
                code: new.code,
                name: new.name,
            };
            group.states.push(state.clone());
            Ok(state)
        })
    }

    pub fn update_state(&self, country_code: &str, code: &str, name: String) -> Result<State> {
        debug!("update state {} in {} to {:?}", code, country_code, name);
        self.write(|ds| {
            let group = ds
                .states
                .find_mut(country_code)
                .ok_or_else(|| DataError::not_found(EntityKind::Country, country_code))?;
            let i = group
                .position(code)
                .ok_or_else(|| state_not_found(country_code, code))?;
            group.states[i].name = name;
            Ok(group.states[i].clone())
        })
    }

    pub fn delete_state(&self, country_code: &str, code: &str) -> Result<bool> {
        debug!("delete state {} from {}", code, country_code);
        self.write(|ds| {
            let group = ds
                .states
                .find_mut(country_code)
                .ok_or_else(|| DataError::not_found(EntityKind::Country, country_code))?;
            let i = group
                .position(code)
                .ok_or_else(|| state_not_found(country_code, code))?;
            group.states.remove(i);
            Ok(true)
        })
    }

    pub fn subscribe_country_added(&self) -> broadcast::Receiver<Country> {
        self.country_added.subscribe()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }

    pub fn persist_dir(&self) -> Option<&Path> {
        self.persist_dir.as_deref()
    }

    /// Writes the dataset to the persistence directory if anything changed
    /// since the last flush. Returns whether files were written.
    pub fn flush(&self) -> Result<bool> {
        let Some(dir) = &self.persist_dir else {
            return Ok(false);
        };
        let _flushing = self.flush_lock.lock().unwrap_or_else(PoisonError::into_inner);
        if !self.dirty.swap(false, Ordering::AcqRel) {
            return Ok(false);
        }
        let snapshot = self.read(Dataset::clone);
        if let Err(e) = snapshot.save(dir) {
            self.dirty.store(true, Ordering::Release);
            return Err(e.into());
        }
        info!("flushed dataset to {}", dir.display());
        Ok(true)
    }
}

fn state_not_found(country_code: &str, code: &str) -> DataError {
    DataError::StateNotFound {
        country_code: country_code.to_string(),
        code: code.to_string(),
    }
}

// Unknown codes are kept as dangling references named after their code.
fn country_refs(dataset: &Dataset, codes: Vec<String>) -> Vec<CountryRef> {
    codes
        .into_iter()
        .map(|code| {
            let name = match dataset.countries.find(&code) {
                Some(country) => country.name.clone(),
                None => {
                    warn!("continent references unknown country {}", code);
                    code.clone()
                }
            };
            CountryRef { code, name }
        })
        .collect()
}
