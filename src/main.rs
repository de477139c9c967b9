use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rainbow_posts::{config::Config, routes, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置
    dotenv::dotenv().ok();
    let config = Config::from_env()?;

    // 初始化日志，生产环境输出 JSON
    let filter = tracing_subscriber::EnvFilter::new(&config.log_level);
    if config.is_production() {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    info!("Starting Rainbow-Posts service...");

    // 初始化数据库连接和所有服务
    let app_state = Arc::new(AppState::new(config.clone()).await?);
    let app = routes::app(app_state);

    // 启动主服务器
    let addr = format!("{}:{}", config.server_host, config.server_port);
    info!("Starting server on http://{}", addr);

    axum::Server::bind(&addr.parse()?)
        .serve(app.into_make_service())
        .await?;

    Ok(())
}
