// Compile-time configuration (SPEC_FULL.md §4.11 / ambient "Configuration"
// row): viewport metrics for vh/vw resolution plus the parser's resource
// limits.
//
// Mirrors the teacher's config.rs shape (a small serde-derived struct with
// a `Default` impl holding sane numbers) but scoped to what this engine
// actually needs instead of the teacher's dashboard-wide settings.

use serde::{Deserialize, Serialize};

use crate::dimension::Viewport;

/// Resource limits the parser/assembler enforce while compiling a single
/// expression, grounded on
/// original_source/aplcore/include/apl/datagrammar/databindingerrors.h's
/// BCI-overflow and recursion-limit error kinds.
#[derive(Copy, Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Maximum nested expression depth before the parser gives up rather
    /// than overflow the native call stack.
    pub max_nesting_depth: usize,
    /// Maximum number of data-pool entries a single expression may emit.
    pub max_data_pool_size: usize,
}

impl Default for Limits {
    fn default() -> Limits {
        Limits { max_nesting_depth: 256, max_data_pool_size: 1 << 16 }
    }
}

#[derive(Copy, Clone, Debug, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub viewport: Viewport,
    pub limits: Limits,
}

impl Serialize for Viewport {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;
        let mut s = serializer.serialize_struct("Viewport", 2)?;
        s.serialize_field("width", &self.width)?;
        s.serialize_field("height", &self.height)?;
        s.end()
    }
}

impl<'de> Deserialize<'de> for Viewport {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            #[serde(default)]
            width: f64,
            #[serde(default)]
            height: f64,
        }
        let raw = Raw::deserialize(deserializer)?;
        Ok(Viewport { width: raw.width, height: raw.height })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_zero_viewport() {
        let cfg = Config::default();
        assert_eq!(cfg.viewport.width, 0.0);
        assert_eq!(cfg.limits.max_nesting_depth, 256);
    }

    #[test]
    fn round_trips_through_ron() {
        let cfg = Config { viewport: Viewport { width: 1080.0, height: 1920.0 }, limits: Limits::default() };
        let text = ron::to_string(&cfg).expect("serialize");
        let back: Config = ron::from_str(&text).expect("deserialize");
        assert_eq!(back.viewport.width, 1080.0);
    }
}
