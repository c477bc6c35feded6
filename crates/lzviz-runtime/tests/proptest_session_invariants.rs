//! Property-based tests for the session state machine.
//!
//! 1. **Cursor bounds**: under arbitrary commands the cursor stays in
//!    `[-1, len - 1]`.
//! 2. **Playback ends at the end**: cursor movement and elapsed time only
//!    stop a running clock from the last step.
//! 3. **Output tracks the cursor**: the projected cumulative output always
//!    holds exactly `cursor + 1` symbols.
//! 4. **Latest wins**: whatever order responses arrive in, only the most
//!    recent submission is ever applied.

use lzviz_core::Cue;
use lzviz_runtime::{
    Command, CompressionTransport, Controller, DiagnosticConfig, LocalTransport, NullPresenter,
    Session, SessionOptions,
};
use proptest::prelude::*;
use web_time::Duration;

// ── Strategies ──────────────────────────────────────────────────────────

fn command_strategy() -> impl Strategy<Value = Command> {
    prop_oneof![
        4 => Just(Command::StepForward),
        3 => Just(Command::StepBack),
        2 => Just(Command::TogglePlay),
        1 => (0u32..12).prop_map(Command::SetSpeed),
        1 => Just(Command::Reset),
        2 => (-3isize..40).prop_map(Command::Seek),
        1 => Just(Command::GoToStart),
        1 => Just(Command::GoToEnd),
        3 => (0u64..3000).prop_map(|ms| Command::AdvanceTime(Duration::from_millis(ms))),
    ]
}

fn input_strategy() -> impl Strategy<Value = String> {
    "[ab]{1,6}[a-d ]{0,24}"
}

// ── Properties ──────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn session_invariants_hold(
        input in input_strategy(),
        commands in prop::collection::vec(command_strategy(), 0..60),
    ) {
        let mut ctl = Controller::new(
            Session::new(SessionOptions::default()),
            NullPresenter,
            Vec::<Cue>::new(),
            DiagnosticConfig::default(),
        );
        ctl.submit_with(&input, &LocalTransport::default()).unwrap();
        let len = ctl.session().log().len() as isize;

        for command in commands {
            let was_playing = ctl.session().is_playing();
            let moves_only = !matches!(
                command,
                Command::TogglePlay | Command::Reset | Command::SetSpeed(_)
            );
            // Out-of-range speeds are rejected; everything else succeeds.
            let _ = ctl.handle(command);
            let session = ctl.session();
            let position = session.cursor().position();
            prop_assert!((-1..len).contains(&position));
            if was_playing && moves_only && !session.is_playing() {
                prop_assert_eq!(position, len - 1);
            }
            let view = session.view();
            prop_assert_eq!(view.cumulative_output.len() as isize, position + 1);
        }
    }

    #[test]
    fn latest_submission_wins(
        inputs in prop::collection::vec("[a-c]{1,10}", 2..6),
        rotate in 0usize..6,
    ) {
        let transport = LocalTransport::default();
        let mut session = Session::default();
        let tickets: Vec<_> = inputs
            .iter()
            .map(|input| session.begin_submit(input).unwrap())
            .collect();

        // Deliver in a rotated order.
        let mut delivery = tickets.clone();
        delivery.rotate_left(rotate % tickets.len());
        for ticket in &delivery {
            let _ = session.complete_submit(ticket.generation, transport.compress(&ticket.data));
        }

        let newest = tickets.last().unwrap();
        prop_assert_eq!(session.log().original(), newest.data.as_bytes());
        prop_assert_eq!(session.pending(), None);
    }
}
