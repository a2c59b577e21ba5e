use fmu_sim_lambda::{
    config::RunnerConfig,
    event::FailureResponse,
    fmu::FmuBackend,
    handler,
    storage::S3Storage,
};
use lambda_runtime::{service_fn, LambdaEvent};
use serde_json::Value;

#[tokio::main]
async fn main() -> Result<(), lambda_runtime::Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let storage = S3Storage::new(aws_sdk_s3::Client::new(&aws_config));
    let config = RunnerConfig::from_env();
    let backend = FmuBackend;

    let storage = &storage;
    let config = &config;
    let backend = &backend;
    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| async move {
        let response = match handler::handle(&event.payload, config, storage, backend).await {
            Ok(success) => serde_json::to_value(success)?,
            Err(err) => {
                log::error!("Run failed: {err}");
                serde_json::to_value(FailureResponse::from_error(&err))?
            }
        };
        Ok::<Value, lambda_runtime::Error>(response)
    }))
    .await
}
