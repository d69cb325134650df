use std::time::{Instant, SystemTime};

use chrono::Utc;
use lambda_runtime::{service_fn, Context, Error, LambdaEvent};
use serde_json::Value;
use tenant_nuke_lambda::adapters::cfn_response::HttpResponseSignaler;
use tenant_nuke_lambda::adapters::secrets::SecretsManagerCredentials;
use tenant_nuke_lambda::adapters::zia::ZiaConnector;
use tenant_nuke_lambda::config::{CredentialsProvider, RuntimeConfig, StaticCredentials};
use tenant_nuke_lambda::handlers::{handle_event, Collaborators, InvocationContext};
use tenant_nuke_lambda::logging::init_logging;

struct RuntimeDependencies {
    connector: ZiaConnector,
    signaler: HttpResponseSignaler,
    secrets_client: aws_sdk_secretsmanager::Client,
}

fn invocation_context(context: &Context) -> InvocationContext {
    let remaining = context
        .deadline()
        .duration_since(SystemTime::now())
        .unwrap_or_default();

    InvocationContext {
        request_id: context.request_id.clone(),
        log_stream_name: context.env_config.log_stream.clone(),
        deadline: Some(Instant::now() + remaining),
        now: Utc::now(),
    }
}

async fn handle_request(
    event: LambdaEvent<Value>,
    deps: &RuntimeDependencies,
) -> Result<Value, Error> {
    let config = RuntimeConfig::from_env();
    let context = invocation_context(&event.context);

    let credentials: Box<dyn CredentialsProvider> =
        match (&config.credentials, &config.credentials_secret_id) {
            (Some(credentials), _) => Box::new(StaticCredentials(Some(credentials.clone()))),
            (None, Some(secret_id)) => Box::new(SecretsManagerCredentials::new(
                deps.secrets_client.clone(),
                secret_id.clone(),
            )),
            (None, None) => Box::new(StaticCredentials(None)),
        };

    let collaborators = Collaborators {
        connector: &deps.connector,
        credentials: credentials.as_ref(),
        signaler: &deps.signaler,
    };

    Ok(handle_event(
        event.payload,
        &context,
        &config,
        &collaborators,
    )?)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_logging();

    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let http = reqwest::Client::builder().build()?;
    let deps = RuntimeDependencies {
        connector: ZiaConnector::new(http.clone()),
        signaler: HttpResponseSignaler::new(http),
        secrets_client: aws_sdk_secretsmanager::Client::new(&aws_config),
    };
    let deps = &deps;

    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| async move {
        handle_request(event, deps).await
    }))
    .await
}
