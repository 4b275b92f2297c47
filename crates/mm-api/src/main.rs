#[tokio::main]
async fn main() {
    if let Err(err) = mm_api::run().await {
        eprintln!("mm-api failed: {err}");
        std::process::exit(1);
    }
}
