use std::sync::Arc;

use authfetch::config::{config_schema, load_config, ConfigV1, InterceptorConfig};
use authfetch::interceptor::{AuthInterceptor, Collaborators, Fetch};
use authfetch::sinks::{LoggingNavigator, SharedIdentity};
use authfetch::store::{MemoryEphemeralStorage, MemoryTokenStore, TokenStore};
use authfetch::threads::{ThreadListStatus, ThreadsClient};
use authfetch::utils::logger::init_logging;
use authfetch::{Error, RefreshCoordinator};
use reqwest::{Method, Request, Url};
use tracing::{error, info};

const USAGE: &str = "usage: authfetch <url> | authfetch --threads | authfetch --schema";

#[tokio::main]
async fn main() {
    let arg = std::env::args().nth(1);

    if arg.as_deref() == Some("--schema") {
        match config_schema() {
            Ok(schema) => println!("{}", schema),
            Err(e) => {
                eprintln!("{}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    let Some(target) = arg else {
        eprintln!("{}", USAGE);
        std::process::exit(2);
    };

    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = init_logging(&config.logging) {
        eprintln!("{}", e);
        std::process::exit(1);
    }

    let result = if target == "--threads" {
        list_threads(config).await
    } else {
        run(config.interceptor, &target).await
    };
    if let Err(e) = result {
        error!(error = %e, "request failed");
        std::process::exit(1);
    }
}

struct Session {
    interceptor: AuthInterceptor<reqwest::Client>,
    store: Arc<MemoryTokenStore>,
    identity: Arc<SharedIdentity>,
}

fn build_session(config: InterceptorConfig) -> Result<Session, Error> {
    let store = Arc::new(MemoryTokenStore::new());
    let identity = Arc::new(SharedIdentity::new());
    let collaborators = Collaborators {
        store: store.clone(),
        coordinator: RefreshCoordinator::new(),
        identity: identity.clone(),
        navigator: Arc::new(LoggingNavigator),
        ephemeral: Arc::new(MemoryEphemeralStorage::new()),
    };
    let interceptor = AuthInterceptor::new(reqwest::Client::new(), config, collaborators)?;
    Ok(Session {
        interceptor,
        store,
        identity,
    })
}

async fn list_threads(config: ConfigV1) -> Result<(), Error> {
    let app_origin = config.interceptor.app_origin.clone();
    let session = build_session(config.interceptor)?;
    let threads = ThreadsClient::new(&session.interceptor, &app_origin, &config.threads.path)?;

    match threads.fetch_threads().await {
        ThreadListStatus::Success => {
            for thread in threads.threads() {
                println!(
                    "{}\t{}",
                    thread.thread_id,
                    thread.description.unwrap_or_default()
                );
            }
            Ok(())
        }
        status => {
            error!(status = ?status, "thread list not loaded");
            std::process::exit(1);
        }
    }
}

async fn run(config: InterceptorConfig, target: &str) -> Result<(), Error> {
    let url = Url::parse(target).map_err(|e| Error::Config(format!("invalid url: {}", e)))?;
    let Session {
        interceptor,
        store,
        identity,
    } = build_session(config)?;
    info!(
        url = url.as_str(),
        in_scope = interceptor.scope().contains(&url),
        "sending request"
    );

    let response = interceptor.fetch(Request::new(Method::GET, url)).await?;
    info!(
        status = response.status().as_u16(),
        tokens_stored = store.access_token().is_some(),
        user_id = %identity.current().map(|i| i.user_id).unwrap_or_default(),
        "response received"
    );
    Ok(())
}
