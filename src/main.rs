#[tokio::main]
async fn main() {
    let code = mainline::cli::run(std::env::args_os()).await;

    std::process::exit(code)
}
