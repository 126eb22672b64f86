//! Generic data containers: named, JSON-valued property bags used to persist
//! sources and controls.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{ComposerError, ComposerResult};

/// An ordered map of named properties.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GenericDataContainer {
    properties: BTreeMap<String, serde_json::Value>,
}

impl GenericDataContainer {
    /// Creates an empty container.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value` under `name`, replacing any previous value.
    pub fn set_property<T: Serialize + ?Sized>(
        &mut self,
        name: impl Into<String>,
        value: &T,
    ) -> ComposerResult<()> {
        self.properties
            .insert(name.into(), serde_json::to_value(value)?);
        Ok(())
    }

    /// Reads the property `name` as a `T`.
    ///
    /// Fails with `InvalidInput` if the property is missing and `TypeMismatch`
    /// if it holds a value of another shape.
    pub fn get_property<T: DeserializeOwned>(&self, name: &str) -> ComposerResult<T> {
        let value = self.properties.get(name).ok_or_else(|| {
            ComposerError::invalid_input(format!("property '{name}' is not set in the container"))
        })?;
        T::deserialize(value).map_err(|e| {
            ComposerError::type_mismatch(format!(
                "property '{name}' has an unexpected type: {e}"
            ))
        })
    }

    /// Returns true if `name` is set.
    pub fn has_property(&self, name: &str) -> bool {
        self.properties.contains_key(name)
    }

    /// Property names in order.
    pub fn property_names(&self) -> impl Iterator<Item = &str> {
        self.properties.keys().map(String::as_str)
    }

    /// Number of properties.
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Returns true if the container holds no property.
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::Spectrum;

    #[test]
    fn test_set_and_get_property() {
        let mut container = GenericDataContainer::new();
        let spectrum = Spectrum::new(vec![0.0, 100.0], vec![1e-3, 2e-3]).unwrap();
        container.set_property("sound_composer_source", &spectrum).unwrap();
        container.set_property("gain", &3.5).unwrap();

        assert!(container.has_property("gain"));
        assert_eq!(container.get_property::<f64>("gain").unwrap(), 3.5);
        assert_eq!(
            container
                .get_property::<Spectrum>("sound_composer_source")
                .unwrap(),
            spectrum
        );
        assert_eq!(
            container.property_names().collect::<Vec<_>>(),
            vec!["gain", "sound_composer_source"]
        );
    }

    #[test]
    fn test_missing_property_is_invalid_input() {
        let container = GenericDataContainer::new();
        assert!(matches!(
            container.get_property::<f64>("duration"),
            Err(ComposerError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_wrong_shape_is_type_mismatch() {
        let mut container = GenericDataContainer::new();
        container.set_property("duration", "three seconds").unwrap();
        assert!(matches!(
            container.get_property::<f64>("duration"),
            Err(ComposerError::TypeMismatch(_))
        ));
    }
}
