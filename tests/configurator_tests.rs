//! Configurator tests: menu, edits, hints and gate discipline

mod common;

use common::{ready_engine, value_of, CountingGate, RecordingEngine, ScriptedTerminal};
use radar_presence::configurator::ConfiguratorError;
use radar_presence::{CancelToken, Configurator, Parameter, TerminalError};

const MENU: &str = "Select a setting to configure\n\
                    'r': Set presence max range (2.00)\n\
                    's': Set sensitivity (medium)\n\
                    \n";

const HINT: &str = "Press '?' to list all radar presence settings\n";

#[test]
fn test_menu_shows_current_values() {
    let engine = ready_engine();
    let gate = CountingGate::new();
    let terminal = ScriptedTerminal::new(b"");
    let idle = CancelToken::new();
    let mut ui = Configurator::new(&engine, &gate, &terminal);

    ui.handle_key(b'?', &idle).unwrap();

    assert_eq!(terminal.output(), MENU);
    gate.assert_balanced();
}

#[test]
fn test_menu_shows_unknown_for_unreadable_value() {
    let engine = RecordingEngine::new(ready_engine()).with_failing_reads();
    let gate = CountingGate::new();
    let terminal = ScriptedTerminal::new(b"");
    let ui = Configurator::new(&engine, &gate, &terminal);

    ui.print_menu().unwrap();

    assert_eq!(
        terminal.output(),
        "Select a setting to configure\n\
         'r': Set presence max range (unknown)\n\
         's': Set sensitivity (unknown)\n\
         \n"
    );
}

#[test]
fn test_set_range_ok() {
    let engine = ready_engine();
    let gate = CountingGate::new();
    let terminal = ScriptedTerminal::new(b"5.5\r");
    let idle = CancelToken::new();
    let mut ui = Configurator::new(&engine, &gate, &terminal);

    ui.handle_key(b'r', &idle).unwrap();

    assert_eq!(
        terminal.output(),
        "Enter range [0.66-10.2]m, press enter\n5.5\r\nOK\n"
    );
    assert_eq!(value_of(&engine, Parameter::MaxRange), "5.50");
    gate.assert_balanced();
}

#[test]
fn test_set_range_bounds_inclusive() {
    let engine = ready_engine();
    let gate = CountingGate::new();
    let terminal = ScriptedTerminal::new(b"0.66\r10.2\r");
    let idle = CancelToken::new();
    let mut ui = Configurator::new(&engine, &gate, &terminal);

    ui.handle_key(b'r', &idle).unwrap();
    assert_eq!(value_of(&engine, Parameter::MaxRange), "0.66");
    ui.handle_key(b'r', &idle).unwrap();
    assert_eq!(value_of(&engine, Parameter::MaxRange), "10.20");

    assert_eq!(terminal.output().matches("OK\n").count(), 2);
}

#[test]
fn test_set_range_out_of_bounds_is_error() {
    let engine = ready_engine();
    let gate = CountingGate::new();
    let terminal = ScriptedTerminal::new(b"12\r");
    let idle = CancelToken::new();
    let mut ui = Configurator::new(&engine, &gate, &terminal);

    ui.handle_key(b'r', &idle).unwrap();

    assert!(terminal.output().ends_with("12\r\nERROR\n"));
    // Previous value survives a rejected edit
    assert_eq!(value_of(&engine, Parameter::MaxRange), "2.00");
    gate.assert_balanced();
}

#[test]
fn test_set_range_not_numeric_is_error() {
    let engine = ready_engine();
    let gate = CountingGate::new();
    let terminal = ScriptedTerminal::new(b"far\r");
    let idle = CancelToken::new();
    let mut ui = Configurator::new(&engine, &gate, &terminal);

    ui.handle_key(b'r', &idle).unwrap();

    assert!(terminal.output().ends_with("ERROR\n"));
    assert_eq!(value_of(&engine, Parameter::MaxRange), "2.00");
}

#[test]
fn test_set_sensitivity() {
    let engine = ready_engine();
    let gate = CountingGate::new();
    let terminal = ScriptedTerminal::new(b"high\rHIGH\r");
    let idle = CancelToken::new();
    let mut ui = Configurator::new(&engine, &gate, &terminal);

    ui.handle_key(b's', &idle).unwrap();
    assert_eq!(
        terminal.output(),
        "Set Sensitivity: 'high', 'medium' or 'low'\nhigh\r\nOK\n"
    );
    assert_eq!(value_of(&engine, Parameter::Sensitivity), "high");

    terminal.clear_output();
    ui.handle_key(b's', &idle).unwrap();
    assert!(terminal.output().ends_with("ERROR\n"));
    assert_eq!(value_of(&engine, Parameter::Sensitivity), "high");
}

#[test]
fn test_whitespace_is_stripped_from_value() {
    let engine = ready_engine();
    let gate = CountingGate::new();
    let terminal = ScriptedTerminal::new(b" lo\tw \r");
    let idle = CancelToken::new();
    let mut ui = Configurator::new(&engine, &gate, &terminal);

    ui.handle_key(b's', &idle).unwrap();

    // Whitespace is echoed even though it is not kept
    assert!(terminal.output().ends_with(" lo\tw \r\nOK\n"));
    assert_eq!(value_of(&engine, Parameter::Sensitivity), "low");
}

#[test]
fn test_unknown_key_prints_hint() {
    let engine = RecordingEngine::new(ready_engine());
    let gate = CountingGate::new();
    let terminal = ScriptedTerminal::new(b"");
    let idle = CancelToken::new();
    let mut ui = Configurator::new(&engine, &gate, &terminal);

    ui.handle_key(b'x', &idle).unwrap();

    assert_eq!(terminal.output(), HINT);
    assert!(engine.calls().is_empty());
    gate.assert_balanced();
}

#[test]
fn test_edit_runs_muted() {
    let engine = ready_engine();
    let gate = CountingGate::new();
    let terminal = ScriptedTerminal::new(b"3\r");
    let idle = CancelToken::new();
    let mut ui = Configurator::new(&engine, &gate, &terminal);

    ui.handle_key(b'r', &idle).unwrap();

    // One acquisition covers prompt, echo and result
    assert_eq!(gate.acquired(), 1);
    assert_eq!(gate.released(), 1);
}

#[test]
fn test_run_stops_when_port_closes() {
    let engine = ready_engine();
    let gate = CountingGate::new();
    let terminal = ScriptedTerminal::new(b"x?");
    let cancel = CancelToken::new();
    let mut ui = Configurator::new(&engine, &gate, &terminal);

    let err = ui.run(&cancel).unwrap_err();

    assert_eq!(err, ConfiguratorError::Terminal(TerminalError::Closed));
    let expected = format!("{MENU}{HINT}{MENU}Exiting terminal ui\n");
    assert_eq!(terminal.output(), expected);
    gate.assert_balanced();
}

#[test]
fn test_run_stops_when_cancelled() {
    let engine = ready_engine();
    let gate = CountingGate::new();
    let terminal = ScriptedTerminal::open(b"");
    let cancel = CancelToken::new();
    cancel.cancel();
    let mut ui = Configurator::new(&engine, &gate, &terminal);

    ui.run(&cancel).unwrap();

    assert_eq!(terminal.output(), format!("{MENU}Exiting terminal ui\n"));
    gate.assert_balanced();
}

#[test]
fn test_closed_port_mid_edit_keeps_gate_balanced() {
    let engine = RecordingEngine::new(ready_engine());
    let gate = CountingGate::new();
    let terminal = ScriptedTerminal::new(b"r4.");
    let cancel = CancelToken::new();
    let mut ui = Configurator::new(&engine, &gate, &terminal);

    let err = ui.run(&cancel).unwrap_err();

    assert_eq!(err.code(), "C02");
    assert_eq!(engine.count("set_parameter"), 0);
    gate.assert_balanced();
}

#[test]
fn test_cancel_abandons_edit_in_progress() {
    let engine = RecordingEngine::new(ready_engine());
    let gate = CountingGate::new();
    let terminal = ScriptedTerminal::open(b"4.");
    let cancel = CancelToken::new();
    let mut ui = Configurator::new(&engine, &gate, &terminal);

    std::thread::scope(|s| {
        s.spawn(|| {
            while terminal.pending_input() > 0 {
                std::thread::sleep(std::time::Duration::from_millis(1));
            }
            std::thread::sleep(std::time::Duration::from_millis(30));
            cancel.cancel();
        });
        ui.handle_key(b'r', &cancel).unwrap();
    });

    // Partial value is dropped, nothing reaches the engine
    assert_eq!(
        terminal.output(),
        "Enter range [0.66-10.2]m, press enter\n4.\n"
    );
    assert_eq!(engine.count("set_parameter"), 0);
    assert_eq!(value_of(&engine, Parameter::MaxRange), "2.00");
    gate.assert_balanced();
}
