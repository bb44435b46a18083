use anyhow::Context;
use clap::Parser;
use stocksignal_core::domain::symbol::Symbol;
use stocksignal_core::error::{classify, raw_model_output};
use stocksignal_core::pipeline::Pipeline;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "stocksignal_worker")]
struct Args {
    /// Ticker or topic to analyze. Repeat for several; they run one after another.
    #[arg(long = "symbol", required = true)]
    symbols: Vec<String>,

    /// Deliver each recommendation instead of printing it.
    #[arg(long)]
    notify: bool,

    /// Recipient address (e.g. whatsapp:+15551234567). Defaults to USER_WHATSAPP_NUMBER.
    #[arg(long, requires = "notify")]
    to: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = stocksignal_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();
    let symbols = args
        .symbols
        .iter()
        .map(|s| Symbol::parse(s))
        .collect::<anyhow::Result<Vec<_>>>()
        .context("invalid --symbol")?;

    let pipeline = Pipeline::from_settings(&settings)?;
    if args.notify && !pipeline.delivery_enabled() {
        anyhow::bail!(
            "--notify requires TWILIO_ACCOUNT_SID, TWILIO_AUTH_TOKEN and TWILIO_WHATSAPP_NUMBER"
        );
    }

    let mut failed = Vec::new();
    for symbol in &symbols {
        let result = if args.notify {
            run_notify(&pipeline, symbol, args.to.as_deref()).await
        } else {
            run_enrich(&pipeline, symbol).await
        };

        if let Err(err) = result {
            sentry_anyhow::capture_anyhow(&err);
            let kind = classify(&err);
            tracing::error!(
                %symbol,
                ?kind,
                error = %err,
                raw_output = raw_model_output(&err),
                "symbol run failed"
            );
            failed.push(symbol.to_string());
        }
    }

    anyhow::ensure!(
        failed.is_empty(),
        "{} of {} symbols failed: {}",
        failed.len(),
        symbols.len(),
        failed.join(", ")
    );
    Ok(())
}

async fn run_enrich(pipeline: &Pipeline, symbol: &Symbol) -> anyhow::Result<()> {
    let enrichment = pipeline.enrich(symbol).await?;
    tracing::info!(
        %symbol,
        action = %enrichment.recommendation.action,
        articles = enrichment.articles.len(),
        "enrichment complete"
    );
    println!("{}", serde_json::to_string_pretty(&enrichment)?);
    Ok(())
}

async fn run_notify(pipeline: &Pipeline, symbol: &Symbol, to: Option<&str>) -> anyhow::Result<()> {
    let outcome = pipeline.notify(symbol, to).await?;
    tracing::info!(
        %symbol,
        action = %outcome.action,
        delivery_id = %outcome.delivery_id,
        recipient = %outcome.recipient,
        "notification sent"
    );
    Ok(())
}

fn init_sentry(settings: &stocksignal_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
