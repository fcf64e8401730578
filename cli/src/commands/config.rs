use beholder_core::error::{ErrorBody, codes};
use serde_json::json;

use crate::util::{
    ConnectionOverrides, EXIT_OK, EXIT_USAGE, config_path, load_file_config, mask_key,
    print_error, print_json, resolve_config,
};

/// Show the effective connection settings and where they come from.
pub fn run(overrides: &ConnectionOverrides) -> i32 {
    let path = config_path();
    let file = match load_file_config(&path) {
        Ok(file) => file,
        Err(e) => {
            print_error(&ErrorBody::new(codes::CONFIG_ERROR, e.to_string()));
            return EXIT_USAGE;
        }
    };

    match resolve_config(overrides, file.as_ref()) {
        Ok(config) => {
            print_json(&json!({
                "api_url": config.base_url().as_str(),
                "api_key": mask_key(config.api_key()),
                "timeout_secs": config.timeout().as_secs(),
                "config_path": path.to_string_lossy(),
                "config_file_present": file.is_some(),
            }));
            EXIT_OK
        }
        Err(e) => {
            print_error(
                &ErrorBody::new(codes::CONFIG_ERROR, e.to_string()).with_docs_hint(format!(
                    "Set --api-url/--api-key, BEHOLDER_API_URL/BEHOLDER_API_KEY, or {}",
                    path.display()
                )),
            );
            EXIT_USAGE
        }
    }
}
