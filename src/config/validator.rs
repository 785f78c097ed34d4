//! Controller config validation, run when a controller is built.

use crate::config::ControllerConfig;
use crate::error::ConfigError;
use regex::Regex;

/// Path prefixes are "" or a sequence of `/segment` parts; `{}`/`:` parameters are not allowed.
const PATH_PATTERN: &str = r"^(/[A-Za-z0-9_.~-]+)*/?$";

pub fn validate(config: &ControllerConfig) -> Result<(), ConfigError> {
    if config.model_type.is_none() {
        return Err(ConfigError::MissingModelType {
            controller: config.path.clone(),
        });
    }
    validate_path(&config.path)?;
    if config.body_limit == 0 {
        return Err(ConfigError::Load("body_limit must be greater than zero".into()));
    }
    Ok(())
}

pub fn validate_path(path: &str) -> Result<(), ConfigError> {
    let re = Regex::new(PATH_PATTERN).map_err(|e| ConfigError::Load(e.to_string()))?;
    if !re.is_match(path) {
        return Err(ConfigError::InvalidPath(path.to_string()));
    }
    Ok(())
}

/// Strip a trailing slash: "/people/" -> "/people", "/" -> "".
pub fn normalize_path(path: &str) -> String {
    path.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_model_type_is_rejected() {
        let err = validate(&ControllerConfig::new("/people")).unwrap_err();
        assert!(matches!(err, ConfigError::MissingModelType { controller } if controller == "/people"));
    }

    #[test]
    fn placeholder_model_type_passes() {
        let config = ControllerConfig::new("/people").generic_model("T");
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn paths() {
        for ok in ["", "/", "/people", "/api/v1/people/", "/a-b_c.d"] {
            assert!(validate_path(ok).is_ok(), "{ok}");
        }
        for bad in ["people", "/people/:id", "/people/{id}", "//x", "/a b"] {
            assert!(matches!(validate_path(bad), Err(ConfigError::InvalidPath(_))), "{bad}");
        }
        assert_eq!(normalize_path("/people/"), "/people");
        assert_eq!(normalize_path("/"), "");
    }

    #[test]
    fn zero_body_limit_is_rejected() {
        let config = ControllerConfig::new("/x").generic_model("T").body_limit(0);
        assert!(matches!(validate(&config), Err(ConfigError::Load(_))));
    }
}
