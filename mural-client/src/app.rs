use std::io::Write;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use crate::client::MuralClient;
use crate::common::{ClientCommand, ClientEvent};
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::ui::timers;
use crate::ui::TerminalApp;

/// Starts the status poller and runs the terminal until `quit` or end of
/// input.
pub async fn run(config: ClientConfig) -> Result<(), ClientError> {
    let client = MuralClient::from_config(&config)?;
    log::info!(
        "Client started with {} nodes on {}",
        client.nodes().len(),
        config.host
    );

    // Background loops -> event loop
    let (event_tx, mut event_rx) = mpsc::channel::<ClientEvent>(100);
    let poller = timers::spawn_status_poller(
        client.api().clone(),
        client.nodes().to_vec(),
        config.status_poll_interval(),
        event_tx.clone(),
    );

    let mut app = TerminalApp::new(client, config.auto_refresh_interval(), event_tx);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("Distributed mural. Type 'help' for the list of commands.");
    show_prompt(&app);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => {
                        println!();
                        println!("{}", app.execute(ClientCommand::Quit).await);
                        break;
                    }
                    Err(err) => {
                        log::error!("Failed to read input: {err}");
                        break;
                    }
                };
                match ClientCommand::parse(&line) {
                    Ok(None) => {}
                    Ok(Some(ClientCommand::Quit)) => {
                        println!("{}", app.execute(ClientCommand::Quit).await);
                        break;
                    }
                    Ok(Some(command)) => println!("{}", app.execute(command).await),
                    Err(err) => println!("{}", app.reject(&err)),
                }
                show_prompt(&app);
            }
            Some(event) = event_rx.recv() => {
                if let Some(output) = app.handle_event(event) {
                    println!();
                    println!("{output}");
                    show_prompt(&app);
                }
            }
        }
    }

    poller.abort();
    Ok(())
}

fn show_prompt(app: &TerminalApp) {
    print!("{}", app.prompt());
    if let Err(err) = std::io::stdout().flush() {
        log::warn!("Failed to flush stdout: {err}");
    }
}
