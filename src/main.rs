use std::process::ExitCode;

const DEFAULT_PORT: u16 = 8080;

#[tokio::main]
async fn main() -> ExitCode {
    let port = match std::env::args().nth(1) {
        Some(arg) => match arg.parse::<u16>() {
            Ok(port) => port,
            Err(_) => {
                eprintln!("usage: proxy [port]");
                return ExitCode::FAILURE;
            }
        },
        None => DEFAULT_PORT,
    };

    if let Err(err) = syslab::proxy::run(port).await {
        eprintln!("proxy exited: {err}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
