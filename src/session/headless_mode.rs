//! Headless mode execution

use super::{
    SessionData,
    messages::{print_session_exit_success, print_session_shutdown, print_session_starting},
};
use crate::sync::{Section, SectionState};
use std::error::Error;

/// Prints a section the way the dashboard would show it.
pub fn print_section(session: &SessionData, section: Section) {
    let renderer = &session.renderer;
    let slot = renderer.slot(section);
    println!("== {} [{}]", section.title(), slot.state.label());
    match &slot.state {
        SectionState::Populated { .. } => {
            for widget in renderer.widgets(section) {
                println!("  {}", widget);
            }
        }
        SectionState::Empty { message } => println!("  {}", message),
        SectionState::Error { message, detail } => {
            println!("  {} ({})", message, detail)
        }
        SectionState::Loading { .. } => println!("  {}", section.loading_message()),
        SectionState::Idle => {}
    }
    if let Some(notice) = &slot.notice {
        println!("  [{:?}] {}", notice.level, notice.message);
    }
}

/// Runs the session without a terminal UI
///
/// Every active section is refreshed at once and then on its periodic timer.
/// Activity events are printed as they arrive until Ctrl+C.
pub async fn run_headless_mode(mut session: SessionData) -> Result<(), Box<dyn Error>> {
    print_session_starting("headless", &session.server_url);

    // Trigger shutdown on Ctrl+C
    let shutdown_sender_clone = session.shutdown_sender.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = shutdown_sender_clone.send(());
        }
    });
    let mut shutdown_receiver = session.shutdown_sender.subscribe();

    let sections = session.sections.clone();
    for section in &sections {
        session.renderer.refresh(*section);
    }
    session.renderer.start_periodic(&sections);

    loop {
        tokio::select! {
            Some(event) = session.event_receiver.recv() => {
                if event.should_display() {
                    println!("{}", event);
                }
            }
            applied = session.renderer.pump() => {
                if !applied {
                    break;
                }
            }
            _ = shutdown_receiver.recv() => {
                break;
            }
        }
    }

    print_session_shutdown();
    session.renderer.shutdown();
    for section in &sections {
        print_section(&session, *section);
    }
    print_session_exit_success();

    Ok(())
}
