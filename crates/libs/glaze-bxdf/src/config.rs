//! Material configuration files.

use crate::closure::ClosureTree;
use base::error::Error;
use serde::{Deserialize, Serialize};
use std::{path::Path, str::FromStr};

/// A material read from a `.toml` file.
///
/// ```toml
/// [closure]
/// model = "surface_layer"
/// roughness = 0.3
/// distribution = "ggx"
///
/// [closure.substrate]
/// model = "lambert"
/// reflectance = [0.8, 0.8, 0.8]
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MaterialConfig {
    /// Optional name of the material.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Root of the closure tree.
    pub closure: ClosureTree,
}

impl MaterialConfig {
    /// Load [`MaterialConfig`] from a .toml file.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let string = std::fs::read_to_string(path).map_err(|err| Error::io(path, err))?;
        let config = Self::from_str(&string)?;
        log::info!("Loaded material configuration: {}", path.display());
        log::info!("    - Name: {}", config.name.as_deref().unwrap_or("<unnamed>"));
        log::info!(
            "    - Root closure: {} ({} node(s))",
            config.closure.model(),
            config.closure.node_count()
        );
        log::debug!("    - Closure tree: {:?}", config.closure);
        Ok(config)
    }

    /// Checks every parameter of the closure tree.
    pub fn validate(&self) -> Result<(), Error> { self.closure.validate() }

    /// Serialises the configuration back to TOML.
    pub fn to_toml(&self) -> Result<String, Error> {
        toml::to_string(self).map_err(|err| Error::Parse(err.to_string()))
    }
}

impl FromStr for MaterialConfig {
    type Err = Error;

    /// Parses and validates a configuration.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let config: MaterialConfig =
            toml::from_str(s).map_err(|err| Error::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        brdf::{FresnelMode, LambertianParams, SurfaceLayerParams},
        distro::MicrofacetDistroKind,
    };
    use base::Spectrum;

    const LAYERED: &str = r#"
name = "varnished wood"

[closure]
model = "surface_layer"
roughness = 0.3
anisotropy = 0.5
distribution = "ggx"
fresnel_mode = "dielectric"
reflectance = [1.0, 1.0, 1.0]
ior = 1.5

[closure.substrate]
model = "lambert"
reflectance = [0.8, 0.6, 0.4]
"#;

    #[test]
    fn parse_layered_material() {
        let config = MaterialConfig::from_str(LAYERED).unwrap();
        assert_eq!(config.name.as_deref(), Some("varnished wood"));
        match &config.closure {
            ClosureTree::SurfaceLayer(params) => {
                assert_eq!(params.roughness, 0.3);
                assert_eq!(params.distribution, MicrofacetDistroKind::TrowbridgeReitz);
                assert_eq!(params.fresnel_mode, FresnelMode::Dielectric);
                assert_eq!(params.ior, 1.5);
                assert_eq!(
                    *params.substrate,
                    ClosureTree::Lambert(LambertianParams {
                        reflectance: Spectrum::new(0.8, 0.6, 0.4)
                    })
                );
            },
            other => panic!("unexpected closure {other:?}"),
        }
    }

    #[test]
    fn omitted_fields_take_defaults() {
        let config = MaterialConfig::from_str(
            r#"
[closure]
model = "surface_layer"
fresnel_mode = "metallic"
distribution = "bk"

[closure.substrate]
model = "lambert"
"#,
        )
        .unwrap();
        let expected = SurfaceLayerParams {
            fresnel_mode: FresnelMode::Conductor,
            ..Default::default()
        };
        assert_eq!(config.closure, ClosureTree::SurfaceLayer(expected));
    }

    #[test]
    fn mixtures_round_trip() {
        let source = r#"
[closure]
model = "mix"

[[closure.components]]
weight = 0.25
[closure.components.closure]
model = "lambert"
reflectance = [0.5, 0.5, 0.5]

[[closure.components]]
weight = 0.75
[closure.components.closure]
model = "surface_layer"
roughness = 0.5
[closure.components.closure.substrate]
model = "lambert"
"#;
        let config = MaterialConfig::from_str(source).unwrap();
        assert_eq!(config.closure.node_count(), 4);
        let again = MaterialConfig::from_str(&config.to_toml().unwrap()).unwrap();
        assert_eq!(again, config);
    }

    #[test]
    fn invalid_configurations_are_rejected() {
        let out_of_range = LAYERED.replace("roughness = 0.3", "roughness = 1.3");
        assert!(matches!(
            MaterialConfig::from_str(&out_of_range),
            Err(Error::InvalidParameter {
                name: "roughness",
                ..
            })
        ));

        let bad_ior = LAYERED.replace("ior = 1.5", "ior = 0.0");
        assert!(matches!(
            MaterialConfig::from_str(&bad_ior),
            Err(Error::InvalidParameter { name: "ior", .. })
        ));

        let bad_substrate = LAYERED.replace("[0.8, 0.6, 0.4]", "[0.8, -0.6, 0.4]");
        assert!(MaterialConfig::from_str(&bad_substrate).is_err());

        let unknown_model = LAYERED.replace("model = \"lambert\"", "model = \"phong\"");
        assert!(matches!(
            MaterialConfig::from_str(&unknown_model),
            Err(Error::Parse(_))
        ));

        let missing = MaterialConfig::load(Path::new("/definitely/not/here.toml"));
        assert!(matches!(missing, Err(Error::Io { .. })));
    }
}
