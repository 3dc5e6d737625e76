//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{
        DbAdapter, GitHubContentsClient, GitHubSettings, InMemorySessionStore,
        OpenAiChatAdapter, OpenAiDescriptionAdapter, PortfolioPublisher,
    },
    config::{Config, LlmProvider, SessionBackend},
    error::ApiError,
    web::{router, state::AppState},
};
use async_openai::{
    config::{AzureConfig, OpenAIConfig},
    Client,
};
use portfolio_copilot_core::ports::{ChatModel, DescriptionWriter, SessionStore, UpdatePublisher};
use portfolio_copilot_core::{DialogueEngine, ToolCallingLoop, ToolHandlers, DEFAULT_SYSTEM_PROMPT};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Session Storage ---
    let store: Arc<dyn SessionStore> = match &config.session_backend {
        SessionBackend::Postgres { database_url } => {
            info!("Connecting to database...");
            let db_pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(database_url)
                .await?;
            let db_adapter = DbAdapter::new(db_pool);
            info!("Running database migrations...");
            db_adapter.run_migrations().await?;
            info!("Database migrations complete.");
            Arc::new(db_adapter)
        }
        SessionBackend::Memory => {
            warn!("Using the in-memory session store; sessions are lost on restart.");
            Arc::new(InMemorySessionStore::new())
        }
    };

    // --- 3. Initialize Model Adapters ---
    let http_client = reqwest::Client::builder()
        .timeout(config.http_timeout)
        .build()?;
    let (chat_model, describer) = match &config.llm {
        LlmProvider::OpenAi { api_key, api_base } => {
            let mut openai_config = OpenAIConfig::new().with_api_key(api_key);
            if let Some(api_base) = api_base {
                openai_config = openai_config.with_api_base(api_base);
            }
            let client = Client::with_config(openai_config).with_http_client(http_client.clone());
            let chat_model: Arc<dyn ChatModel> =
                Arc::new(OpenAiChatAdapter::new(client.clone(), config.chat_model.clone()));
            let describer: Arc<dyn DescriptionWriter> =
                Arc::new(OpenAiDescriptionAdapter::new(client, config.description_model.clone()));
            (chat_model, describer)
        }
        LlmProvider::Azure {
            endpoint,
            api_key,
            api_version,
            deployment,
        } => {
            info!(deployment = %deployment, "Using Azure OpenAI.");
            let azure_config = AzureConfig::new()
                .with_api_base(endpoint)
                .with_api_key(api_key)
                .with_api_version(api_version)
                .with_deployment_id(deployment);
            let client = Client::with_config(azure_config).with_http_client(http_client.clone());
            let chat_model: Arc<dyn ChatModel> =
                Arc::new(OpenAiChatAdapter::new(client.clone(), config.chat_model.clone()));
            let describer: Arc<dyn DescriptionWriter> =
                Arc::new(OpenAiDescriptionAdapter::new(client, config.description_model.clone()));
            (chat_model, describer)
        }
    };

    // --- 4. Initialize the Publisher ---
    if config.github_token.is_none() {
        warn!("GITHUB_TOKEN is not set; commits to the portfolio repository will be refused.");
    }
    let github = GitHubContentsClient::new(GitHubSettings {
        api_base: config.github_api_base.clone(),
        owner: config.github_owner.clone(),
        repo: config.github_repo.clone(),
        branch: config.github_branch.clone(),
        token: config.github_token.clone(),
        timeout: config.http_timeout,
    })?;
    let publisher: Arc<dyn UpdatePublisher> = Arc::new(
        PortfolioPublisher::new(github, config.portfolio_path.clone()).with_describer(describer),
    );

    // --- 5. Build the Shared AppState ---
    let app_state = Arc::new(AppState {
        config: config.clone(),
        dialogue: DialogueEngine::new(store.clone(), publisher.clone(), config.dialogue_settings()),
        agent: ToolCallingLoop::new(
            store,
            chat_model,
            ToolHandlers::new(publisher.clone()),
            DEFAULT_SYSTEM_PROMPT,
        ),
        publisher,
    });

    // --- 6. Create the Web Router ---
    let app = router(app_state);

    // --- 7. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    if cfg!(feature = "swagger-ui") {
        info!(
            "Swagger UI available at http://{}/swagger-ui",
            config.bind_address
        );
    }
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
