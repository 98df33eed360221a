use crate::*;
use serde::Deserialize;
use serde::Serialize;

type Properties = [f64; N_PROPERTIES];

/// One blend: five volume fractions and ten properties per component.
///
/// Field names match the JSON accepted by the prediction endpoints. Property
/// lists are fixed-size arrays, so a list of the wrong length never
/// deserializes; fraction bounds are checked by [`BlendSample::validate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlendSample {
    pub component1_fraction: f64,
    pub component2_fraction: f64,
    pub component3_fraction: f64,
    pub component4_fraction: f64,
    pub component5_fraction: f64,
    pub component1_properties: Properties,
    pub component2_properties: Properties,
    pub component3_properties: Properties,
    pub component4_properties: Properties,
    pub component5_properties: Properties,
}

impl BlendSample {
    /// Every fraction and every property set to the same value.
    pub fn uniform(fraction: f64, property: f64) -> Self {
        Self::from(([fraction; N_COMPONENTS], [[property; N_PROPERTIES]; N_COMPONENTS]))
    }

    pub fn fractions(&self) -> [f64; N_COMPONENTS] {
        [
            self.component1_fraction,
            self.component2_fraction,
            self.component3_fraction,
            self.component4_fraction,
            self.component5_fraction,
        ]
    }

    pub fn properties(&self) -> [&Properties; N_COMPONENTS] {
        [
            &self.component1_properties,
            &self.component2_properties,
            &self.component3_properties,
            &self.component4_properties,
            &self.component5_properties,
        ]
    }

    /// Fractions must lie in [0, 1]; they are not required to sum to 1.
    pub fn validate(&self) -> Result<(), Error> {
        self.fractions()
            .iter()
            .enumerate()
            .find(|(_, f)| !(0.0..=1.0).contains(*f))
            .map_or(Ok(()), |(i, f)| {
                Err(Error::invalid(format!(
                    "component{}_fraction must be between 0 and 1, got {}",
                    i + 1,
                    f
                )))
            })?;
        self.properties()
            .iter()
            .flat_map(|props| props.iter())
            .all(|p| p.is_finite())
            .then_some(())
            .ok_or_else(|| Error::invalid("component properties must be finite numbers"))
    }

    /// The flat feature row in [`feature_columns`] order.
    pub fn row(&self) -> [f64; N_FEATURES] {
        let mut row = [0.0; N_FEATURES];
        row[..N_COMPONENTS].copy_from_slice(&self.fractions());
        self.properties()
            .iter()
            .enumerate()
            .for_each(|(i, props)| {
                let start = N_COMPONENTS + i * N_PROPERTIES;
                row[start..start + N_PROPERTIES].copy_from_slice(&props[..]);
            });
        row
    }
}

impl From<([f64; N_COMPONENTS], [Properties; N_COMPONENTS])> for BlendSample {
    fn from((fractions, properties): ([f64; N_COMPONENTS], [Properties; N_COMPONENTS])) -> Self {
        Self {
            component1_fraction: fractions[0],
            component2_fraction: fractions[1],
            component3_fraction: fractions[2],
            component4_fraction: fractions[3],
            component5_fraction: fractions[4],
            component1_properties: properties[0],
            component2_properties: properties[1],
            component3_properties: properties[2],
            component4_properties: properties[3],
            component5_properties: properties[4],
        }
    }
}
