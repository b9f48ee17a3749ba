use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    calboard::tui::run().await
}
