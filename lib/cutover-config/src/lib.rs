//! Primitives for loading typed configuration data.
#![deny(warnings)]
#![deny(missing_docs)]

use std::{borrow::Cow, collections::HashSet, sync::Arc};

use cutover_error::GenericError;
use figment::{
    error::Kind,
    providers::{Env, Serialized},
    Figment, Provider,
};
use serde::{Deserialize, Serialize};
use snafu::{ResultExt as _, Snafu};
use tracing::debug;

mod provider;
use self::provider::FileProvider;

/// A configuration error.
#[derive(Debug, Snafu)]
#[snafu(context(suffix(false)))]
pub enum ConfigurationError {
    /// Environment variable prefix was empty.
    #[snafu(display("Environment variable prefix must not be empty."))]
    EmptyPrefix,

    /// Requested field was missing from the configuration.
    #[snafu(display("Missing field '{}' in configuration. {}", field, help_text))]
    MissingField {
        /// Help text describing how to set the missing field.
        help_text: String,

        /// Name of the missing field.
        field: Cow<'static, str>,
    },

    /// Requested field's data type was not the expected data type.
    #[snafu(display(
        "Expected value for field '{}' to be '{}', got '{}' instead.",
        field,
        expected_ty,
        actual_ty
    ))]
    InvalidFieldType {
        /// Name of the invalid field.
        ///
        /// This is a period-separated path to the field.
        field: String,

        /// Expected data type.
        expected_ty: String,

        /// Actual data type.
        actual_ty: String,
    },

    /// Generic configuration error.
    #[snafu(display("Failed to query configuration."))]
    Generic {
        /// Error source.
        source: GenericError,
    },
}

impl From<figment::Error> for ConfigurationError {
    fn from(e: figment::Error) -> Self {
        from_figment_error(&HashSet::new(), e)
    }
}

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
enum LookupSource {
    /// The configuration key is looked up in a form suitable for environment variables.
    Environment { prefix: String },
}

impl LookupSource {
    fn transform_key(&self, key: &str) -> String {
        match self {
            // The prefix is already uppercased with a trailing underscore by the time it gets here.
            LookupSource::Environment { prefix } => format!("{}{}", prefix, key.replace('.', "_").to_uppercase()),
        }
    }
}

struct BoxedProvider(Box<dyn Provider + Send + Sync>);

impl Provider for BoxedProvider {
    fn metadata(&self) -> figment::Metadata {
        self.0.metadata()
    }

    fn data(&self) -> Result<figment::value::Map<figment::Profile, figment::value::Dict>, figment::Error> {
        self.0.data()
    }
}

/// A configuration loader that can pull from various sources.
///
/// Sources are layered in the order they are added: values from sources added later take precedence over values from
/// sources added earlier. Once all sources are added, the merged configuration is deserialized into a typed value with
/// [`into_typed`][Self::into_typed].
///
/// # Supported sources
///
/// - YAML file
/// - JSON file
/// - environment variables (must be prefixed; see [`from_environment`][Self::from_environment])
/// - static values (see [`add_static_values`][Self::add_static_values])
#[derive(Default)]
pub struct ConfigurationLoader {
    lookup_sources: HashSet<LookupSource>,
    providers: Vec<BoxedProvider>,
}

impl ConfigurationLoader {
    /// Loads the given YAML configuration file.
    ///
    /// # Errors
    ///
    /// If the file could not be read, or if the file is not valid YAML, an error will be returned.
    pub fn from_yaml<P>(mut self, path: P) -> Result<Self, ConfigurationError>
    where
        P: AsRef<std::path::Path>,
    {
        let provider = FileProvider::from_yaml(&path).map_err(GenericError::from).context(Generic)?;
        self.providers.push(BoxedProvider(Box::new(provider)));
        Ok(self)
    }

    /// Attempts to load the given YAML configuration file, ignoring any errors.
    ///
    /// Errors include the file not existing, not being readable/accessible, and not being valid YAML.
    pub fn try_from_yaml<P>(mut self, path: P) -> Self
    where
        P: AsRef<std::path::Path>,
    {
        match FileProvider::from_yaml(&path) {
            Ok(provider) => self.providers.push(BoxedProvider(Box::new(provider))),
            Err(e) => {
                debug!(error = %e, file_path = %path.as_ref().to_string_lossy(), "Unable to read YAML configuration file. Ignoring.");
            }
        }
        self
    }

    /// Loads the given JSON configuration file.
    ///
    /// # Errors
    ///
    /// If the file could not be read, or if the file is not valid JSON, an error will be returned.
    pub fn from_json<P>(mut self, path: P) -> Result<Self, ConfigurationError>
    where
        P: AsRef<std::path::Path>,
    {
        let provider = FileProvider::from_json(&path).map_err(GenericError::from).context(Generic)?;
        self.providers.push(BoxedProvider(Box::new(provider)));
        Ok(self)
    }

    /// Attempts to load the given JSON configuration file, ignoring any errors.
    ///
    /// Errors include the file not existing, not being readable/accessible, and not being valid JSON.
    pub fn try_from_json<P>(mut self, path: P) -> Self
    where
        P: AsRef<std::path::Path>,
    {
        match FileProvider::from_json(&path) {
            Ok(provider) => self.providers.push(BoxedProvider(Box::new(provider))),
            Err(e) => {
                debug!(error = %e, file_path = %path.as_ref().to_string_lossy(), "Unable to read JSON configuration file. Ignoring.");
            }
        }
        self
    }

    /// Loads configuration from environment variables.
    ///
    /// The prefix given will have an underscore appended to it if it does not already end with one. For example, with a
    /// prefix of `app`, any environment variable starting with `app_` would be matched.
    ///
    /// The prefix is case-insensitive.
    ///
    /// # Errors
    ///
    /// If the prefix is empty, or the environment could not be read, an error will be returned.
    pub fn from_environment(mut self, prefix: &'static str) -> Result<Self, ConfigurationError> {
        if prefix.is_empty() {
            return Err(ConfigurationError::EmptyPrefix);
        }

        let prefix = if prefix.ends_with('_') {
            prefix.to_string()
        } else {
            format!("{}_", prefix)
        };

        // `Env` isn't `Send + Sync`, so we snapshot it into a serialized provider.
        let values = Env::prefixed(&prefix).data()?;
        if let Some(default_dict) = values.get(&figment::Profile::Default) {
            self.providers
                .push(BoxedProvider(Box::new(Serialized::defaults(default_dict.clone()))));
            self.lookup_sources.insert(LookupSource::Environment {
                prefix: prefix.to_uppercase(),
            });
        }
        Ok(self)
    }

    /// Adds a set of static values.
    ///
    /// `values` must serialize to a map, where each key is a top-level configuration key. This is primarily useful for
    /// providing programmatic overrides, or for building configuration in tests.
    pub fn add_static_values<T>(mut self, values: T) -> Self
    where
        T: Serialize + Send + Sync + 'static,
    {
        let provider = Serialized::defaults(values);
        self.providers.push(BoxedProvider(Box::new(provider)));
        self
    }

    /// Consumes the configuration loader, deserializing it as `T`.
    ///
    /// ## Errors
    ///
    /// If the configuration could not be deserialized into `T`, an error will be returned.
    pub fn into_typed<T>(self) -> Result<T, ConfigurationError>
    where
        T: for<'de> Deserialize<'de>,
    {
        self.into_generic().as_typed()
    }

    /// Consumes the configuration loader and wraps the merged sources in a generic wrapper.
    pub fn into_generic(self) -> GenericConfiguration {
        let figment = self
            .providers
            .into_iter()
            .fold(Figment::new(), |figment, provider| figment.admerge(provider));

        GenericConfiguration {
            inner: Arc::new(Inner {
                figment,
                lookup_sources: self.lookup_sources,
            }),
        }
    }
}

#[derive(Debug)]
struct Inner {
    figment: Figment,
    lookup_sources: HashSet<LookupSource>,
}

/// A generic configuration object.
///
/// This represents the merged configuration derived from [`ConfigurationLoader`] in its raw form. It is cheaply
/// cloneable, and can be handed to multiple components which each extract their own typed view of it.
#[derive(Clone, Debug)]
pub struct GenericConfiguration {
    inner: Arc<Inner>,
}

impl GenericConfiguration {
    /// Gets a configuration value by key.
    ///
    /// The key must be in the form of `a.b.c`, where periods (`.`) are used to indicate a nested lookup.
    ///
    /// ## Errors
    ///
    /// If the key does not exist in the configuration, or if the value could not be deserialized into `T`, an error
    /// variant will be returned.
    pub fn get_typed<T>(&self, key: &str) -> Result<T, ConfigurationError>
    where
        T: for<'de> Deserialize<'de>,
    {
        self.inner
            .figment
            .extract_inner(key)
            .map_err(|e| from_figment_error(&self.inner.lookup_sources, e))
    }

    /// Gets a configuration value by key, if it exists.
    ///
    /// ## Errors
    ///
    /// If the value exists but could not be deserialized into `T`, an error will be returned.
    pub fn try_get_typed<T>(&self, key: &str) -> Result<Option<T>, ConfigurationError>
    where
        T: for<'de> Deserialize<'de>,
    {
        match self.get_typed(key) {
            Ok(value) => Ok(Some(value)),
            Err(ConfigurationError::MissingField { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Attempts to deserialize the entire configuration as `T`.
    ///
    /// ## Errors
    ///
    /// If the value could not be deserialized into `T`, an error will be returned.
    pub fn as_typed<T>(&self) -> Result<T, ConfigurationError>
    where
        T: for<'de> Deserialize<'de>,
    {
        self.inner
            .figment
            .extract()
            .map_err(|e| from_figment_error(&self.inner.lookup_sources, e))
    }
}

fn from_figment_error(lookup_sources: &HashSet<LookupSource>, e: figment::Error) -> ConfigurationError {
    match e.kind {
        Kind::MissingField(field) => {
            let mut valid_keys = lookup_sources
                .iter()
                .map(|source| source.transform_key(&field))
                .collect::<Vec<_>>();

            valid_keys.insert(0, field.to_string());

            let help_text = format!("Try setting `{}`.", valid_keys.join("` or `"));

            ConfigurationError::MissingField { help_text, field }
        }
        Kind::InvalidType(actual_ty, expected_ty) => ConfigurationError::InvalidFieldType {
            field: e.path.join("."),
            expected_ty,
            actual_ty: actual_ty.to_string(),
        },
        _ => ConfigurationError::Generic { source: e.into() },
    }
}
