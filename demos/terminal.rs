//! Terminal front end
//!
//! A minimal presentation layer for the session controller:
//! - renders the progress line from the published state
//! - prints new log lines whenever the controller asks for a scroll
//! - prints the backend's final log and the finished files
//!
//! ```bash
//! cargo run --example terminal -- https://example.com/watch?v=1 --audio --base-url http://127.0.0.1:5001
//! ```

use std::io::Write;
use std::time::Duration;
use ytdlp_client::{Config, DownloadMode, SessionController, UiSignal};

struct Args {
    url: String,
    mode: DownloadMode,
    playlist: bool,
    base_url: Option<String>,
}

fn parse_args() -> Result<Args, Box<dyn std::error::Error>> {
    let mut url = None;
    let mut mode = DownloadMode::Video;
    let mut playlist = false;
    let mut base_url = None;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--audio" => mode = DownloadMode::Audio,
            "--mode" => mode = args.next().ok_or("--mode needs a value")?.parse()?,
            "--playlist" => playlist = true,
            "--base-url" => base_url = Some(args.next().ok_or("--base-url needs a value")?),
            other => url = Some(other.to_string()),
        }
    }

    Ok(Args {
        url: url.unwrap_or_default(),
        mode,
        playlist,
        base_url,
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = parse_args()?;
    let config = match args.base_url {
        Some(base) => Config::with_base_url(base),
        None => Config::default(),
    };
    let controller = SessionController::new(config)?;

    // Progress line
    let mut state = controller.watch();
    tokio::spawn(async move {
        while state.changed().await.is_ok() {
            let s = state.borrow().clone();
            let p = &s.progress;
            print!(
                "\r{:>10} {:>5.1}%  {:>12}  ETA {:>8}  {:>10}",
                format!("{:?}", p.status),
                p.percent,
                p.speed.as_deref().unwrap_or("-"),
                p.eta.as_deref().unwrap_or("-"),
                p.size.as_deref().unwrap_or("-"),
            );
            std::io::stdout().flush().ok();
        }
    });

    // Log view: print whatever is new since the last scroll
    let mut signals = controller.subscribe();
    let log_view = controller.clone();
    tokio::spawn(async move {
        let mut printed = 0usize;
        while let Ok(signal) = signals.recv().await {
            match signal {
                UiSignal::RevealProgress => println!("Download started"),
                UiSignal::HideProgress => printed = 0,
                UiSignal::ScrollLog => {
                    let logs = log_view.snapshot().logs;
                    // a replaced log can be shorter than what was printed
                    if logs.len() < printed {
                        printed = 0;
                    }
                    for line in &logs[printed..] {
                        println!("\n  {line}");
                    }
                    printed = logs.len();
                }
            }
        }
    });

    if let Err(e) = controller.start(args.url, args.mode, args.playlist).await {
        eprintln!("\n{}", controller.snapshot().error.unwrap_or_else(|| e.to_string()));
        return Ok(());
    }

    let finished = tokio::select! {
        finished = controller.wait_until_idle() => finished?,
        stopped = ytdlp_client::run_with_shutdown(controller.clone()) => {
            stopped?;
            println!("\nStopped following the download");
            return Ok(());
        }
    };
    println!();

    if let Some(error) = &finished.error {
        eprintln!("{error}");
        return Ok(());
    }

    let final_log = tokio::time::timeout(Duration::from_secs(10), controller.wait_for_final_log());
    let logs = match final_log.await {
        Ok(done) => done?.logs,
        Err(_) => {
            eprintln!("server log unavailable, showing streamed lines");
            controller.snapshot().logs
        }
    };
    println!("--- log ---");
    for line in logs {
        println!("{line}");
    }

    match controller.downloaded_files().await {
        Ok(files) => {
            println!("--- files ---");
            for file in files {
                println!("{:>12}  {}", file.size, file.name);
            }
        }
        Err(e) => eprintln!("could not list files: {e}"),
    }

    controller.shutdown().await?;
    Ok(())
}
