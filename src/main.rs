#[tokio::main]
async fn main() {
    if let Err(e) = practice_backend::run().await {
        eprintln!("practice-server failed to start: {}", e);
        std::process::exit(1);
    }
}
