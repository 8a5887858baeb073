use reqwest::Url;

use crate::config::{parse_origin, InterceptorConfig};
use crate::error::Error;

/// Decides which URLs get credentials attached and their responses inspected.
#[derive(Debug, Clone)]
pub struct Scope {
    app_origin: String,
    backend_origins: Vec<String>,
    api_prefixes: Vec<String>,
    sign_in_path: String,
}

impl Scope {
    pub fn from_config(config: &InterceptorConfig) -> Result<Self, Error> {
        let app_origin = parse_origin(&config.app_origin)?.origin().ascii_serialization();
        let backend_origins = config
            .backend_origins
            .iter()
            .map(|o| parse_origin(o).map(|url| url.origin().ascii_serialization()))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Scope {
            app_origin,
            backend_origins,
            api_prefixes: config
                .api_prefixes
                .iter()
                .filter(|p| !p.is_empty())
                .cloned()
                .collect(),
            sign_in_path: config.sign_in_path.clone(),
        })
    }

    /// API paths on the application origin are always in scope, the sign-in
    /// route included. Backend origins are in scope except for sign-in.
    /// Everything else is left alone.
    pub fn contains(&self, url: &Url) -> bool {
        let origin = url.origin().ascii_serialization();

        if origin == self.app_origin
            && self
                .api_prefixes
                .iter()
                .any(|prefix| url.path().starts_with(prefix.as_str()))
        {
            return true;
        }

        self.backend_origins.contains(&origin)
            && (self.sign_in_path.is_empty() || !url.as_str().contains(&self.sign_in_path))
    }
}
