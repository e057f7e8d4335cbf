use std::path::Path;
use std::path::PathBuf;

use yaml_rust::Yaml;

use super::errors::ConfigError;


pub fn str_to_absolute_path(path_str: &str, default_base_dir: &Path) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        return path;
    } else {
        return [default_base_dir, Path::new(&path)].iter().collect();
    }
}

fn invalid(field: &str, value: &Yaml) -> ConfigError {
    ConfigError::InvalidValue {
        field: String::from(field),
        value: format!("{:?}", value),
    }
}

/// None if the key is absent, an error if it's present with the wrong type.
pub fn get_str<'a>(yaml_cfg: &'a Yaml, field: &str) -> Result<Option<&'a str>, ConfigError> {
    let value = &yaml_cfg[field];
    if value.is_badvalue() || value.is_null() {
        return Ok(None);
    }
    match value.as_str() {
        Some(ss) => Ok(Some(ss)),
        None => Err(invalid(field, value)),
    }
}

pub fn get_u64(yaml_cfg: &Yaml, field: &str) -> Result<Option<u64>, ConfigError> {
    let value = &yaml_cfg[field];
    if value.is_badvalue() || value.is_null() {
        return Ok(None);
    }
    match value.as_i64() {
        Some(ii) if ii >= 0 => Ok(Some(ii as u64)),
        _ => Err(invalid(field, value)),
    }
}

/// Accepts integers too, since yaml parses `2` and `2.0` differently.
pub fn get_f64(yaml_cfg: &Yaml, field: &str) -> Result<Option<f64>, ConfigError> {
    let value = &yaml_cfg[field];
    if value.is_badvalue() || value.is_null() {
        return Ok(None);
    }
    match (value.as_f64(), value.as_i64()) {
        (Some(ff), _) => Ok(Some(ff)),
        (None, Some(ii)) => Ok(Some(ii as f64)),
        _ => Err(invalid(field, value)),
    }
}

pub fn get_bool(yaml_cfg: &Yaml, field: &str) -> Result<Option<bool>, ConfigError> {
    let value = &yaml_cfg[field];
    if value.is_badvalue() || value.is_null() {
        return Ok(None);
    }
    match value.as_bool() {
        Some(bb) => Ok(Some(bb)),
        None => Err(invalid(field, value)),
    }
}

pub fn require<T>(value: Option<T>, field: &str) -> Result<T, ConfigError> {
    match value {
        Some(vv) => Ok(vv),
        None => Err(ConfigError::MissingField(String::from(field))),
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use yaml_rust::YamlLoader;

    #[test]
    fn test_relative_paths() {
        let base = Path::new("/data/scenario");
        assert_eq!(str_to_absolute_path("groups.csv", base),
                   PathBuf::from("/data/scenario/groups.csv"));
        assert_eq!(str_to_absolute_path("/tmp/groups.csv", base), PathBuf::from("/tmp/groups.csv"));
    }

    #[test]
    fn test_typed_getters() {
        let docs = YamlLoader::load_from_str("aa: 3\nbb: 2.5\ncc: hello\ndd: true\nee: -1").unwrap();
        let yaml_cfg = &docs[0];

        assert_eq!(get_u64(yaml_cfg, "aa").unwrap(), Some(3));
        assert_eq!(get_f64(yaml_cfg, "aa").unwrap(), Some(3.));
        assert_eq!(get_f64(yaml_cfg, "bb").unwrap(), Some(2.5));
        assert_eq!(get_str(yaml_cfg, "cc").unwrap(), Some("hello"));
        assert_eq!(get_bool(yaml_cfg, "dd").unwrap(), Some(true));
        assert_eq!(get_str(yaml_cfg, "missing").unwrap(), None);

        assert!(get_u64(yaml_cfg, "ee").is_err());
        assert!(get_u64(yaml_cfg, "cc").is_err());
        assert!(get_bool(yaml_cfg, "aa").is_err());
        assert!(matches!(require::<u64>(None, "seed"), Err(ConfigError::MissingField(_))));
    }
}
