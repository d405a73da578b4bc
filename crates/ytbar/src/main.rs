//! ytbar entrypoint: run a media downloader and show its progress.

mod app;
mod child_process;
mod events;
mod monitor;
mod terminal;
mod ui;
mod widgets;
#[path = "runtime_config.rs"]
mod runtime_config;

use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use clap::builder::NonEmptyStringValueParser;
use clap::Parser;
use crossterm::event::{self, Event, KeyEventKind};
use ratatui::backend::Backend;
use ratatui::Terminal;
use tracing::{debug, info, warn};
use ytbar_core::Config;

use crate::app::{App, Command, Outcome};
use crate::child_process::DownloadProcess;
use crate::events::Message;
use crate::runtime_config::{init_tracing, load_config};
use crate::terminal::TerminalGuard;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// URL or id of the video to download
    #[arg(long, value_parser = NonEmptyStringValueParser::new())]
    url: String,

    /// Path to config.toml
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = load_config(&args).context("load config")?;
    init_tracing(&config);
    info!(url = %args.url, program = %config.downloader.program, "starting download");

    let (ui_tx, ui_rx) = mpsc::channel::<Message>();
    let mut process = DownloadProcess::spawn(&config.downloader, &args.url, ui_tx.clone())?;

    let outcome = run_session(&config, ui_tx, &ui_rx);

    match stop_downloader(outcome, &mut process, &config, &ui_rx)? {
        Outcome::Finished => {
            info!("download finished");
            Ok(())
        }
        Outcome::Cancelled => {
            info!("download cancelled");
            Ok(())
        }
        Outcome::Failed(err) => Err(anyhow!(err)),
    }
}

/// Tie the downloader's lifetime to the session: it never outlives the program.
///
/// A completed session may still be merging, so it gets `merge_timeout` to
/// finish before the usual terminate-then-kill shutdown.
fn stop_downloader(
    outcome: Result<Outcome>,
    process: &mut DownloadProcess,
    config: &Config,
    ui_rx: &Receiver<Message>,
) -> Result<Outcome> {
    let finished = matches!(outcome, Ok(Outcome::Finished));
    if finished && process.is_running() {
        println!("Waiting for the downloader to finish merging...");
        if !process.wait_timeout(config.downloader.merge_timeout()) {
            warn!("merge did not finish in time; stopping downloader");
        }
    }
    process.shutdown(config.ui.shutdown_timeout());

    if !finished {
        return outcome;
    }
    match late_failure(ui_rx) {
        Some(err) => Ok(Outcome::Failed(format!("merge failed: {err}"))),
        None => Ok(Outcome::Finished),
    }
}

// Exit report that arrived after the UI loop stopped listening.
fn late_failure(ui_rx: &Receiver<Message>) -> Option<String> {
    ui_rx.try_iter().find_map(|message| match message {
        Message::ProcessExited(report) if !report.success => Some(report.describe()),
        _ => None,
    })
}

fn run_session(config: &Config, ui_tx: Sender<Message>, ui_rx: &Receiver<Message>) -> Result<Outcome> {
    let mut terminal_guard = TerminalGuard::new(config.ui.alternate_screen, ui::VIEWPORT_HEIGHT)
        .context("initialize terminal")?;
    let mut app = App::new(config, Instant::now());

    if let Ok((columns, rows)) = crossterm::terminal::size() {
        app.update(Message::Resize(columns, rows));
    }

    spawn_input_thread(ui_tx.clone());
    spawn_ticker(ui_tx.clone(), config.ui.tick_interval(), Message::StopwatchTick);
    spawn_ticker(ui_tx, config.ui.frame_interval(), |_| Message::ProgressFrame);

    let result = run_app(terminal_guard.terminal_mut(), &mut app, ui_rx);
    terminal_guard.restore().context("restore terminal")?;
    result?;

    Ok(app.outcome())
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App, ui_rx: &Receiver<Message>) -> Result<()> {
    redraw(terminal, app)?;

    // Set once the download phase completes; the loop keeps drawing until it passes.
    let mut deadline: Option<Instant> = None;

    loop {
        let message = match deadline {
            Some(at) => match ui_rx.recv_timeout(at.saturating_duration_since(Instant::now())) {
                Ok(message) => message,
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                    return Ok(())
                }
            },
            None => match ui_rx.recv() {
                Ok(message) => message,
                Err(_) => return Ok(()),
            },
        };

        // Idle animation frames change nothing on screen.
        let needs_redraw = message != Message::ProgressFrame || app.progress().is_animating();
        let command = app.update(message);

        if needs_redraw {
            redraw(terminal, app)?;
        }

        match command {
            Command::None => {}
            Command::Quit => return Ok(()),
            Command::QuitAfter(delay) => {
                debug!(?delay, "scheduling exit");
                deadline.get_or_insert_with(|| Instant::now() + delay);
            }
        }
    }
}

fn redraw<B: Backend>(terminal: &mut Terminal<B>, app: &App) -> Result<()> {
    terminal
        .draw(|frame| ui::draw(frame, app))
        .map_err(|err| anyhow!("failed to draw frame: {err}"))?;
    Ok(())
}

fn spawn_input_thread(ui_tx: Sender<Message>) {
    // Forward blocking terminal events to the UI thread; exit on channel close.
    thread::spawn(move || loop {
        let message = match event::read() {
            Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => Message::Key(key),
            Ok(Event::Resize(columns, rows)) => Message::Resize(columns, rows),
            Ok(_) => continue,
            Err(err) => {
                let _ = ui_tx.send(Message::InternalError(format!(
                    "terminal input failed: {err}"
                )));
                break;
            }
        };
        if ui_tx.send(message).is_err() {
            break;
        }
    });
}

fn spawn_ticker(ui_tx: Sender<Message>, interval: Duration, make: fn(Instant) -> Message) {
    thread::spawn(move || loop {
        thread::sleep(interval);
        if ui_tx.send(make(Instant::now())).is_err() {
            break;
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;
    use clap::CommandFactory;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use ratatui::backend::TestBackend;
    use ytbar_core::{DownloaderConfig, ExitReport};

    fn test_terminal() -> Terminal<TestBackend> {
        Terminal::new(TestBackend::new(40, ui::VIEWPORT_HEIGHT)).expect("test terminal")
    }

    fn key() -> Message {
        Message::Key(KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE))
    }

    fn config_with_delay(finish_delay_ms: u64) -> Config {
        let mut config = Config::default();
        config.ui.finish_delay_ms = finish_delay_ms;
        config
    }

    fn screen_text(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        let mut text = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                text.push_str(buffer[(x, y)].symbol());
            }
            text.push('\n');
        }
        text
    }

    #[test]
    fn key_press_ends_the_loop_within_one_message() {
        let (tx, rx) = mpsc::channel();
        let mut app = App::new(&Config::default(), Instant::now());
        tx.send(Message::ProgressUpdate(0.25)).expect("send progress");
        tx.send(key()).expect("send key");
        tx.send(Message::ProgressUpdate(0.75)).expect("send progress");

        run_app(&mut test_terminal(), &mut app, &rx).expect("run loop");

        assert_eq!(app.percent(), 0.25);
        assert_eq!(app.outcome(), Outcome::Cancelled);
        // The update queued behind the key was never consumed.
        assert_eq!(rx.try_iter().count(), 1);
    }

    #[test]
    fn merge_exits_after_the_finish_delay() {
        let (tx, rx) = mpsc::channel();
        let mut app = App::new(&config_with_delay(150), Instant::now());
        let mut terminal = test_terminal();
        tx.send(Message::MergeSignal("Download finished, begin merge".to_string()))
            .expect("send merge");

        let start = Instant::now();
        run_app(&mut terminal, &mut app, &rx).expect("run loop");
        let took = start.elapsed();

        assert!(took >= Duration::from_millis(150), "exited after {took:?}");
        assert!(took < Duration::from_secs(3), "exited after {took:?}");
        assert_eq!(app.outcome(), Outcome::Finished);
        assert!(screen_text(&terminal).contains("Finished in"));
        drop(tx);
    }

    #[test]
    fn messages_during_the_finish_delay_do_not_extend_it() {
        let (tx, rx) = mpsc::channel();
        let mut app = App::new(&config_with_delay(200), Instant::now());
        tx.send(Message::MergeSignal("merging".to_string())).expect("send merge");
        let feeder = thread::spawn(move || {
            for _ in 0..30 {
                thread::sleep(Duration::from_millis(20));
                if tx
                    .send(Message::ProcessExited(ExitReport {
                        code: Some(0),
                        success: true,
                        stderr_tail: None,
                    }))
                    .is_err()
                {
                    break;
                }
            }
        });

        let start = Instant::now();
        run_app(&mut test_terminal(), &mut app, &rx).expect("run loop");
        let took = start.elapsed();
        drop(rx);
        let _ = feeder.join();

        assert!(took >= Duration::from_millis(200), "exited after {took:?}");
        assert!(took < Duration::from_millis(550), "exited after {took:?}");
    }

    #[test]
    fn key_during_finish_delay_quits_immediately() {
        let (tx, rx) = mpsc::channel();
        let mut app = App::new(&config_with_delay(10_000), Instant::now());
        tx.send(Message::MergeSignal("merging".to_string())).expect("send merge");
        tx.send(key()).expect("send key");

        let start = Instant::now();
        run_app(&mut test_terminal(), &mut app, &rx).expect("run loop");
        assert!(start.elapsed() < Duration::from_secs(2));
        assert_eq!(app.outcome(), Outcome::Finished);
        drop(tx);
    }

    #[test]
    fn closed_channel_ends_the_loop() {
        let (tx, rx) = mpsc::channel::<Message>();
        drop(tx);
        let mut app = App::new(&Config::default(), Instant::now());
        run_app(&mut test_terminal(), &mut app, &rx).expect("run loop");
        assert_eq!(app.outcome(), Outcome::Cancelled);
    }

    #[test]
    fn error_message_is_drawn_before_exit() {
        let (tx, rx) = mpsc::channel();
        let mut app = App::new(&Config::default(), Instant::now());
        let mut terminal = test_terminal();
        tx.send(Message::InternalError("input closed".to_string()))
            .expect("send error");

        run_app(&mut terminal, &mut app, &rx).expect("run loop");
        assert!(screen_text(&terminal).contains("Error: input closed"));
        drop(tx);
    }

    #[cfg(unix)]
    #[test]
    fn completed_session_stops_a_merge_that_overruns() {
        let (tx, rx) = mpsc::channel();
        let mut config = Config::default();
        config.downloader = DownloaderConfig {
            program: "sh".to_string(),
            args: vec!["-c".to_string(), "exec sleep 30".to_string()],
            merge_timeout_ms: 100,
            ..DownloaderConfig::default()
        };
        let mut process =
            DownloadProcess::spawn(&config.downloader, "target", tx).expect("spawn sh");

        let start = Instant::now();
        let outcome = stop_downloader(Ok(Outcome::Finished), &mut process, &config, &rx)
            .expect("outcome");
        assert!(start.elapsed() < Duration::from_secs(3));
        assert!(!process.is_running());
        assert_eq!(
            outcome,
            Outcome::Failed("merge failed: downloader terminated by signal".to_string())
        );
    }

    #[cfg(unix)]
    #[test]
    fn cancelled_session_terminates_the_downloader() {
        let (tx, rx) = mpsc::channel();
        let mut config = Config::default();
        config.downloader.program = "sh".to_string();
        config.downloader.args = vec!["-c".to_string(), "exec sleep 30".to_string()];
        let mut process =
            DownloadProcess::spawn(&config.downloader, "target", tx).expect("spawn sh");

        let outcome = stop_downloader(Ok(Outcome::Cancelled), &mut process, &config, &rx)
            .expect("outcome");
        assert_eq!(outcome, Outcome::Cancelled);
        assert!(!process.is_running());
    }

    #[test]
    fn late_failure_reads_queued_exit_report() {
        let (tx, rx) = mpsc::channel();
        tx.send(Message::ProgressFrame).expect("send frame");
        tx.send(Message::ProcessExited(ExitReport {
            code: Some(1),
            success: false,
            stderr_tail: Some("ERROR: Postprocessing: ffmpeg not found".to_string()),
        }))
        .expect("send exit");
        assert_eq!(
            late_failure(&rx),
            Some("downloader exited with status 1: ERROR: Postprocessing: ffmpeg not found".to_string())
        );
        assert_eq!(late_failure(&rx), None);
    }

    #[test]
    fn cli_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn url_is_required() {
        let err = Args::try_parse_from(["ytbar"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn empty_url_is_rejected() {
        assert!(Args::try_parse_from(["ytbar", "--url", ""]).is_err());
    }

    #[test]
    fn url_and_config_are_parsed() {
        let args = Args::try_parse_from([
            "ytbar",
            "--url",
            "dQw4w9WgXcQ",
            "--config",
            "/tmp/ytbar.toml",
        ])
        .expect("parse args");
        assert_eq!(args.url, "dQw4w9WgXcQ");
        assert_eq!(args.config, Some(PathBuf::from("/tmp/ytbar.toml")));
    }
}
