use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let port = std::env::var("PORT").ok();
    let addr = mock_server::bind_addr(port.as_deref());
    let listener = TcpListener::bind(&addr).await?;
    mock_server::run(listener).await
}
