//! Binary entrypoint for the HomeBase client.

#[tokio::main]
async fn main() {
    let exit_code = homebase_cli::run().await;
    std::process::exit(exit_code);
}
