use std::env;

use thiserror::Error;
use tradingview::config::{PASSWORD_ENV, USERNAME_ENV};
use tradingview::{Config, TradingView, UsernameValidation, ValidateUsername};

static TV_USERNAME: &str = "apidev7loper@gmail.com";
static TV_PASSWORD: &str = "!jBmb(+1+LSH-aJ'h;cB";

/// Which step of the smoke run gave up.
#[derive(Debug, Error)]
enum SmokeFailure {
    #[error("no se pudo cargar la configuración: {0}")]
    Load(#[source] tradingview::Error),

    #[error("no se pudo inicializar el cliente: {0}")]
    Construction(#[source] tradingview::Error),

    #[error("falló la validación de usuario: {0}")]
    Validation(#[source] tradingview::Error),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    export_credentials();

    println!("🚀 Probando TradingView Access Management");
    println!("{}", "=".repeat(50));

    if let Err(e) = run(TradingView::new).await {
        println!("❌ Error: {e}");
        print_trace(&e);
    }
}

/// The client reads its credentials through `Config::from_env`, so export
/// them for the remainder of the process before anything is constructed.
fn export_credentials() {
    unsafe {
        env::set_var(USERNAME_ENV, TV_USERNAME);
        env::set_var(PASSWORD_ENV, TV_PASSWORD);
    }
}

async fn run<C, F>(make_client: F) -> Result<UsernameValidation, SmokeFailure>
where
    C: ValidateUsername,
    F: FnOnce(Config) -> tradingview::Result<C>,
{
    let config = Config::from_env().map_err(SmokeFailure::Load)?;
    println!("✅ Configuración cargada correctamente");

    println!("🔄 Inicializando cliente tradingview...");
    let client = make_client(config).map_err(SmokeFailure::Construction)?;
    println!("✅ Cliente inicializado");

    println!("🔍 Probando validación de usuario...");
    let result = client
        .validate_username(TV_USERNAME)
        .await
        .map_err(SmokeFailure::Validation)?;
    println!("{}", result_line(TV_USERNAME, &result));

    println!("✅ ¡Proyecto funcionando correctamente!");
    Ok(result)
}

fn result_line(username: &str, result: &UsernameValidation) -> String {
    format!(
        "Resultado de validación para '{username}': {}",
        if result.valid { "True" } else { "False" }
    )
}

/// Walks the error source chain, the closest thing to a stack trace the
/// failure carries.
fn print_trace(failure: &SmokeFailure) {
    let mut source: Option<&dyn std::error::Error> = Some(failure);
    let mut depth = 0;
    while let Some(err) = source {
        println!("  {depth}: {err}");
        source = err.source();
        depth += 1;
    }
}
