use std::sync::Arc;

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use leadform::config::{Args, Command};
use leadform::i18n::Language;
use leadform::{
    AppContext, Clock, Decision, FileStore, KeyValueStore, LeadForm, LocaleStore, RateLimiter,
    ReqwestWebhook, SubmissionController, SystemClock,
};

// this is main async function with tokio
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (before anything else)
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    let default_filter = if args.verbose {
        "leadform=info"
    } else {
        "leadform=warn"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let profile_dir = args.profile_dir();
    let store: Arc<dyn KeyValueStore> = Arc::new(
        FileStore::open(&profile_dir)
            .with_context(|| format!("failed to open profile at {}", profile_dir.display()))?,
    );

    let result = match &args.command {
        Command::Submit {
            name,
            email,
            message,
        } => submit(&args, store, LeadForm::new(name, email, message)).await,
        Command::Status => status(&args, store),
        Command::Lang { language } => lang(store, language.as_deref()),
    };

    if args.print_metrics {
        print!("{}", leadform::metrics::render()?);
    }

    result
}

async fn submit(
    args: &Args,
    store: Arc<dyn KeyValueStore>,
    mut form: LeadForm,
) -> anyhow::Result<()> {
    let webhook = ReqwestWebhook::new(&args.webhook_url, args.timeout())?;
    tracing::info!("Submitting to {}", webhook.url());

    let ctx = AppContext::new(store, Arc::new(SystemClock), Arc::new(webhook))
        .with_rate_limit(args.rate_limit())
        .with_display_timeout(args.display_timeout());
    let controller = SubmissionController::new(&ctx);

    let outcome = controller.submit(&mut form).await;

    // Validation errors carry no state message
    if let Some(message) = controller.state().message() {
        if outcome.is_ok() {
            println!("{}", message);
        } else {
            eprintln!("{}", message);
        }
    }

    outcome.map_err(Into::into)
}

fn status(args: &Args, store: Arc<dyn KeyValueStore>) -> anyhow::Result<()> {
    let locale = LocaleStore::load(store.clone());
    let limiter = RateLimiter::with_config(store, args.rate_limit());
    let now = SystemClock.now_ms();

    let mut record = limiter.load();
    record.prune(now, args.rate_limit().window_ms());

    println!("Language:          {}", locale.language());
    println!(
        "Sends in window:   {}/{}",
        record.attempts.len(),
        args.max_attempts
    );
    match record.active_block(now).and_then(DateTime::<Utc>::from_timestamp_millis) {
        Some(until) => println!("Blocked until:     {}", until.to_rfc3339()),
        None => println!("Blocked until:     -"),
    }
    match limiter.peek(now) {
        Decision::Allowed => println!("Next submission:   allowed"),
        Decision::Denied { remaining, .. } => println!(
            "Next submission:   refused ({})",
            locale.wait_message(remaining)
        ),
    }
    Ok(())
}

fn lang(store: Arc<dyn KeyValueStore>, language: Option<&str>) -> anyhow::Result<()> {
    let locale = LocaleStore::load(store);
    match language {
        None => {}
        Some("toggle") => {
            locale.toggle();
        }
        Some(code) => locale.set_language(code.parse::<Language>()?),
    }
    println!("{} (toggle: {})", locale.language(), locale.toggle_label());
    Ok(())
}
