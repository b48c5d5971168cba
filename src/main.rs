#[tokio::main]
async fn main() -> anyhow::Result<()> {
    examgate_rust::run().await
}
