use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use jobreach::collectors::CollectorRegistry;
use jobreach::collectors::runner::JobScraper;
use jobreach::collectors::session::HttpBrowser;
use jobreach::config::{Command, Config};
use jobreach::dispatch::MailDispatcher;
use jobreach::dispatch::smtp::SmtpMailer;
use jobreach::generator::ContentGenerator;
use jobreach::llm::ChatClient;
use jobreach::models::profile::ApplicantProfile;
use jobreach::pipeline::ApplicationPipeline;
use jobreach::pipeline::batches::BatchRegistry;
use jobreach::routes::{self, AppState};

fn init_tracing(format: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("jobreach=info,tower_http=info"));

    if format.eq_ignore_ascii_case("json") {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

fn build_dispatcher(config: &Config) -> MailDispatcher {
    let timeout = config.pipeline_settings().dispatch_timeout;
    let (Some(username), Some(password), Some(from)) = (
        config.smtp_username.as_deref().filter(|v| !v.trim().is_empty()),
        config.smtp_password.as_deref().filter(|v| !v.trim().is_empty()),
        config.email_from.as_deref().filter(|v| !v.trim().is_empty()),
    ) else {
        return MailDispatcher::unconfigured(timeout);
    };

    match SmtpMailer::new(&config.smtp_server, config.smtp_port, username, password, timeout) {
        Ok(mailer) => MailDispatcher::new(Arc::new(mailer), from, timeout),
        Err(e) => {
            tracing::error!("Failed to set up SMTP transport: {e}");
            MailDispatcher::unconfigured(timeout)
        }
    }
}

fn build_state(config: &Config) -> AppState {
    let settings = config.pipeline_settings();

    let launcher = Arc::new(HttpBrowser::new(&config.user_agent, settings.source_timeout));
    let scraper = Arc::new(JobScraper::new(
        CollectorRegistry::with_defaults(),
        launcher,
        settings,
    ));

    let llm = ChatClient::new(
        config.groq_api_key.clone(),
        &config.groq_base_url,
        &config.groq_model,
    );
    tracing::info!(model = llm.model(), "Completion client ready");
    let generator = Arc::new(ContentGenerator::new(Arc::new(llm), settings.llm_timeout));
    let dispatcher = Arc::new(build_dispatcher(config));

    let pipeline = Arc::new(ApplicationPipeline::new(
        scraper.clone(),
        generator.clone(),
        generator.clone(),
        dispatcher.clone(),
        settings,
    ));

    AppState {
        scraper,
        generator,
        dispatcher,
        pipeline,
        batches: BatchRegistry::new(),
        config: Arc::new(config.public_view()),
    }
}

async fn read_profile(path: &std::path::Path) -> anyhow::Result<ApplicantProfile> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading profile {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing profile {}", path.display()))
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::parse();
    init_tracing(&config.log_format);

    for name in config.missing_settings() {
        tracing::warn!("{name} is not set; dependent features will be degraded");
    }

    let state = build_state(&config);

    match config.resolved_command() {
        Command::Serve { listen_addr } => {
            let app = routes::router(state)
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive());

            let listener = tokio::net::TcpListener::bind(&listen_addr).await?;
            tracing::info!("Listening on {}", listen_addr);
            axum::serve(listener, app).await?;
        }
        Command::Discover { search } => {
            let query = search.to_query()?;
            let jobs = state.scraper.discover(&query).await;
            print_json(&jobs)?;
        }
        Command::Run { search, profile } => {
            let query = search.to_query()?;
            let profile = read_profile(&profile).await?;

            let cancel = CancellationToken::new();
            let on_ctrl_c = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::info!("Interrupt received, stopping after the current posting");
                    on_ctrl_c.cancel();
                }
            });

            let report = state.pipeline.run_batch(&query, &profile, &cancel).await;
            print_json(&report)?;
        }
        Command::Probe => {
            let ok = state.dispatcher.probe().await;
            println!("SMTP connection: {}", if ok { "ok" } else { "failed" });
            if !ok {
                std::process::exit(1);
            }
        }
        Command::Status => {
            print_json(&state.pipeline.stage_status())?;
            print_json(state.config.as_ref())?;
        }
    }

    Ok(())
}
