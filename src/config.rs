//! Configuration loading.
//!
//! Parameters live in a JSON file mirroring [`ReconParams`]; omitted fields
//! fall back to their defaults, so a file only needs the values that differ
//! from the reference instrument.

use std::fs;
use std::path::Path;

use crate::error::ConfigError;
use crate::params::ReconParams;

/// Read, parse and validate a parameter file.
pub fn load_params(path: &Path) -> Result<ReconParams, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let params: ReconParams =
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    params.validate()?;
    Ok(params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(name: &str, contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(name);
        let mut f = fs::File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn loads_partial_file_over_defaults() {
        let path = write_temp(
            "lfr_partial_params.json",
            r#"{ "grouping": { "z_step_um": 0.05 }, "progress_interval": 10 }"#,
        );
        let params = load_params(&path).unwrap();
        assert_eq!(params.grouping.z_step_um, 0.05);
        assert_eq!(params.progress_interval, 10);
        assert_eq!(params.fit.min_rays_after, 3);
    }

    #[test]
    fn invalid_values_fail_validation() {
        let path = write_temp(
            "lfr_invalid_params.json",
            r#"{ "assign": { "radius_px": -5.0 } }"#,
        );
        assert!(matches!(
            load_params(&path),
            Err(ConfigError::NonPositive { name, .. }) if name == "assign.radius_px"
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let path = Path::new("/definitely/not/here.json");
        assert!(matches!(load_params(path), Err(ConfigError::Io { .. })));
    }
}
