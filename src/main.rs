#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = worksheet_grading::run().await {
        eprintln!("worksheet-grading fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
