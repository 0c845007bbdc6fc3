use std::path::Path;

use figment::{
    providers::{Data, Format, Json, Yaml},
    value::{Dict, Map},
    Error, Metadata, Profile, Provider,
};

/// A file-backed provider whose contents are read eagerly.
///
/// Reading up front means a missing or malformed file is reported when the source is added, rather than later when
/// the merged configuration is extracted.
pub struct FileProvider {
    data: Map<Profile, Dict>,
    metadata: Metadata,
}

impl FileProvider {
    pub fn from_yaml<P>(path: P) -> Result<Self, Error>
    where
        P: AsRef<Path>,
    {
        Self::from_format::<Yaml, _>("YAML file", path)
    }

    pub fn from_json<P>(path: P) -> Result<Self, Error>
    where
        P: AsRef<Path>,
    {
        Self::from_format::<Json, _>("JSON file", path)
    }

    fn from_format<F, P>(name: &'static str, path: P) -> Result<Self, Error>
    where
        F: Format,
        P: AsRef<Path>,
    {
        let file_data = std::fs::read_to_string(path.as_ref()).map_err(|e| e.to_string())?;
        let data = Data::<F>::string(&file_data).data()?;

        Ok(Self {
            data,
            metadata: Metadata::from(name, path.as_ref()),
        })
    }
}

impl Provider for FileProvider {
    fn metadata(&self) -> Metadata {
        self.metadata.clone()
    }

    fn data(&self) -> Result<Map<Profile, Dict>, Error> {
        Ok(self.data.clone())
    }
}
