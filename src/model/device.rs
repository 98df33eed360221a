use serde::Deserialize;
use serde::Serialize;
use std::fmt::Display;
use std::fmt::Formatter;
use std::str::FromStr;

/// Requested placement for fitting and inference.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preference {
    #[default]
    Auto,
    Cpu,
    Cuda,
}

impl FromStr for Preference {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "cpu" => Ok(Self::Cpu),
            "cuda" => Ok(Self::Cuda),
            other => Err(anyhow::anyhow!("unknown device preference '{}'", other)),
        }
    }
}

/// Where a pipeline actually runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    #[default]
    Cpu,
    Cuda,
}

impl Device {
    /// Whether the regression backend can execute on a CUDA device.
    /// The linfa backend is CPU-only.
    pub fn cuda_available() -> bool {
        false
    }
    /// Best device the backend supports.
    pub fn best() -> Self {
        if Self::cuda_available() {
            Self::Cuda
        } else {
            Self::Cpu
        }
    }
    /// Resolves a preference, falling back to CPU when CUDA is unavailable.
    pub fn resolve(preference: Preference) -> Self {
        match preference {
            Preference::Auto => Self::best(),
            Preference::Cpu => Self::Cpu,
            Preference::Cuda if Self::cuda_available() => Self::Cuda,
            Preference::Cuda => {
                log::warn!("cuda requested but unavailable, falling back to cpu");
                Self::Cpu
            }
        }
    }
}

impl Display for Device {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cpu => write!(f, "cpu"),
            Self::Cuda => write!(f, "cuda"),
        }
    }
}

/// Moves a pipeline component and everything it owns onto a device.
///
/// Implemented for the closed set of pipeline parts (bundle, estimator,
/// target transform). Each implementation visits only the children it knows
/// about; anything else a component holds is left untouched.
pub trait Place {
    fn place(&mut self, device: Device);
}

impl<T: Place> Place for Option<T> {
    fn place(&mut self, device: Device) {
        if let Some(inner) = self {
            inner.place(device);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preferences_resolve_to_supported_devices() {
        assert_eq!(Device::resolve(Preference::Auto), Device::Cpu);
        assert_eq!(Device::resolve(Preference::Cpu), Device::Cpu);
        assert_eq!(Device::resolve(Preference::Cuda), Device::Cpu);
    }
    #[test]
    fn preferences_parse_lowercase() {
        let pref = serde_json::from_str::<Preference>("\"cuda\"").unwrap();
        assert_eq!(pref, Preference::Cuda);
        assert!(serde_json::from_str::<Preference>("\"tpu\"").is_err());
        assert_eq!(Device::Cuda.to_string(), "cuda");
    }
    #[test]
    fn preferences_parse_from_flags() {
        assert_eq!("CPU".parse::<Preference>().unwrap(), Preference::Cpu);
        assert!("gpu".parse::<Preference>().is_err());
    }
}
