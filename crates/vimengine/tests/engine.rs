use std::collections::HashMap;
use std::time::Duration;

use vimengine::errors::EngineError;
use vimengine::key::parse_keys;
use vimengine::prelude::*;

#[derive(Default)]
struct LogHost {
    log: Vec<String>,
    registers: HashMap<Register, String>,
    errors: Vec<String>,
    messages: Vec<String>,
}

impl LogHost {
    fn record(&mut self, cmd: &Command, args: &OperatorArguments) {
        let entry = match cmd.motion() {
            Some(m) => format!("{} {} {}", cmd.action().name(), m.action().name(), m.count()),
            None => format!("{} {}", cmd.action().name(), args.count0),
        };

        self.log.push(entry);
    }
}

impl EditorHost for LogHost {
    type Caret = ();

    fn execute(&mut self, cmd: &Command, args: &OperatorArguments) -> bool {
        self.record(cmd, args);
        true
    }

    fn carets(&self) -> Vec<()> {
        vec![()]
    }

    fn execute_for_caret(&mut self, _: &(), cmd: &Command, args: &OperatorArguments) -> bool {
        self.record(cmd, args);
        true
    }

    fn get_register(&self, register: &Register) -> Option<String> {
        self.registers.get(register).cloned()
    }

    fn set_register(&mut self, register: &Register, text: String, append: bool) {
        let entry = self.registers.entry(*register).or_default();

        if !append {
            entry.clear();
        }

        entry.push_str(&text);
    }

    fn enter_visual_mode(&mut self, submode: SubMode, select: bool) {
        self.log.push(format!("enter {submode:?} {select}"));
    }

    fn exit_visual_mode(&mut self) {
        self.log.push("exit".into());
    }

    fn report_error(&mut self, err: &EngineError) {
        self.errors.push(err.to_string());
    }

    fn show_message(&mut self, msg: &str) {
        self.messages.push(msg.to_string());
    }
}

fn setup(vimrc: &str) -> Engine<LogHost> {
    let _ = env_logger::builder().is_test(true).try_init();

    let mut engine = Engine::new(LogHost::default());
    engine.source(vimrc).unwrap();
    engine
}

fn type_keys(engine: &mut Engine<LogHost>, keys: &str) -> InputStatus {
    let mut status = InputStatus::Idle;

    for key in parse_keys(keys).unwrap() {
        status = engine.input_key(key);
    }

    status
}

fn take(engine: &mut Engine<LogHost>) -> Vec<String> {
    std::mem::take(&mut engine.host_mut().log)
}

#[test]
fn test_operator_motion_counts() {
    let mut engine = setup("");

    type_keys(&mut engine, "2d3w");
    assert_eq!(take(&mut engine), vec!["operator.delete motion.word 6"]);

    type_keys(&mut engine, "3yy");
    assert_eq!(take(&mut engine), vec!["operator.yank motion.current-line 3"]);

    type_keys(&mut engine, "d0");
    assert_eq!(take(&mut engine), vec!["operator.delete motion.line-start 0"]);
}

#[test]
fn test_ambiguous_mapping_timeout() {
    let mut engine = setup("nnoremap , x\nnnoremap ,, X");

    assert_eq!(
        type_keys(&mut engine, ","),
        InputStatus::Pending { timeout: Some(Duration::from_millis(1000)) }
    );
    assert!(take(&mut engine).is_empty());

    assert_eq!(engine.timeout_expired(), InputStatus::Idle);
    assert_eq!(take(&mut engine), vec!["edit.delete-char 0"]);

    assert_eq!(type_keys(&mut engine, ",,"), InputStatus::Idle);
    assert_eq!(take(&mut engine), vec!["edit.delete-char-back 0"]);

    engine.execute_ex("set timeoutlen=250");
    assert_eq!(
        type_keys(&mut engine, ","),
        InputStatus::Pending { timeout: Some(Duration::from_millis(250)) }
    );
    engine.cancel();

    engine.execute_ex("set notimeout");
    assert_eq!(type_keys(&mut engine, ","), InputStatus::Idle);
    assert_eq!(take(&mut engine), vec!["edit.delete-char 0"]);
}

#[test]
fn test_operator_key_mappings() {
    let mut engine = setup("nnoremap d x\nnnoremap dd X");

    type_keys(&mut engine, "d");
    assert!(take(&mut engine).is_empty());
    engine.timeout_expired();
    assert_eq!(take(&mut engine), vec!["edit.delete-char 0"]);

    type_keys(&mut engine, "dd");
    assert_eq!(take(&mut engine), vec!["edit.delete-char-back 0"]);

    // A key that can't extend the mapping fires the shorter one first.
    type_keys(&mut engine, "dj");
    assert_eq!(take(&mut engine), vec!["edit.delete-char 0", "motion.down 0"]);
}

#[test]
fn test_failed_mapping_prefix() {
    let mut engine = setup("nmap jj x\nnmap kk X");

    type_keys(&mut engine, "jkk");
    assert_eq!(take(&mut engine), vec!["motion.down 0", "edit.delete-char-back 0"]);
}

#[test]
fn test_recursive_mapping() {
    let mut engine = setup("nmap a b\nnmap b a");

    assert_eq!(type_keys(&mut engine, "a"), InputStatus::Idle);
    assert_eq!(engine.host().errors, vec!["E223: recursive mapping"]);
    assert!(take(&mut engine).is_empty());

    engine.execute_ex("nunmap b");
    type_keys(&mut engine, "a");
    assert_eq!(take(&mut engine), vec!["motion.word-back 0"]);
}

#[test]
fn test_macro_replay() {
    let mut engine = setup("");

    type_keys(&mut engine, "qa3dwq");
    assert_eq!(engine.host().registers[&Register::Named('a')], "3dw");
    assert_eq!(engine.show_mode(), "");

    take(&mut engine);
    type_keys(&mut engine, "2@a");
    assert_eq!(take(&mut engine), vec![
        "operator.delete motion.word 3",
        "operator.delete motion.word 3"
    ]);
}

#[test]
fn test_recording_shown() {
    let mut engine = setup("");

    type_keys(&mut engine, "qb");
    assert_eq!(engine.show_mode(), "recording @b");

    type_keys(&mut engine, "i");
    assert_eq!(engine.show_mode(), "-- INSERT --recording @b");
}

#[test]
fn test_keymodel() {
    let mut engine = setup("set keymodel=startsel,stopsel");

    type_keys(&mut engine, "<S-Right>");
    assert_eq!(engine.mode(), ModeState::new(Mode::Visual, SubMode::VisualCharacter));

    type_keys(&mut engine, "<Right>");
    assert_eq!(engine.mode(), ModeState::from(Mode::Normal));

    assert_eq!(take(&mut engine), vec![
        "enter VisualCharacter false",
        "motion.shift-right 0",
        "exit",
        "motion.right 0"
    ]);

    engine.execute_ex("set selectmode=key");
    type_keys(&mut engine, "<S-Right>");
    assert_eq!(engine.mode(), ModeState::new(Mode::Select, SubMode::VisualCharacter));
}

#[test]
fn test_set_errors_on_command_line() {
    let mut engine = setup("");

    type_keys(&mut engine, ":set history=abc<CR>");
    type_keys(&mut engine, ":set guicursor=n:verx<CR>");
    type_keys(&mut engine, ":set nohistory<CR>");

    assert_eq!(engine.host().errors, vec![
        "E521: Number required after =: history=abc",
        "E548: Digit expected: n:verx",
        "E518: Unknown option: nohistory"
    ]);
    assert_eq!(engine.accessor().get_int("history"), 50);
}

#[test]
fn test_map_listing() {
    let mut engine = setup("nnoremap ,, X\nimap jk <Esc>");

    type_keys(&mut engine, ":nmap<CR>");
    assert_eq!(engine.host().messages.len(), 1);
    assert!(engine.host().messages[0].contains(",,"));

    type_keys(&mut engine, ":mapclear<CR>");
    type_keys(&mut engine, ":nmap<CR>");
    assert_eq!(engine.host().messages.last().unwrap(), "No mapping found");
    assert_eq!(engine.mappings().mappings(MappedModes::I, &[]).len(), 1);
}

#[test]
fn test_command_line_display() {
    let mut engine = setup("");

    type_keys(&mut engine, "d/fo");
    assert_eq!(engine.command_line(), Some("/fo".into()));
    assert_eq!(engine.mode(), ModeState::from(Mode::CommandLine));

    type_keys(&mut engine, "o<CR>");
    assert_eq!(engine.command_line(), None);
    assert_eq!(take(&mut engine), vec!["operator.delete motion.search-forward 0"]);
    assert_eq!(engine.host().registers[&Register::LastSearch], "foo");
}
