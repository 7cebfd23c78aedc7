use anyhow::Result;

use afterclass_submit::utils::logging;
use afterclass_submit::{App, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    logging::init();

    // 加载配置
    let config = Config::from_env();

    // 初始化应用并做一次离线队列补送
    App::initialize(config).await?.run().await?;

    Ok(())
}
