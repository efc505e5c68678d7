use assert_cmd::Command;
use std::process::Output;

fn run(args: &[&str], stdin: &str) -> Output {
    Command::cargo_bin("pdp11-emu")
        .unwrap()
        .args(args)
        .write_stdin(stdin)
        .output()
        .unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn halt_prints_statistics() {
    let output = run(&[], "0\n");
    assert!(output.status.success());

    let text = stdout(&output);
    assert!(text.starts_with("execution statistics (in decimal):\n"));
    assert!(text.contains("  instructions executed     = 1\n"));
    assert!(text.contains("  instruction words fetched = 1\n"));
    assert!(text.contains("  branches taken            = 0\n"));
}

#[test]
fn trace_shows_each_instruction() {
    // MOV #2, R2 ; SOB R2, . ; HALT
    let output = run(&["-t"], "012702 000002 077201 000000\n");
    assert!(output.status.success());

    let text = stdout(&output);
    assert!(text.starts_with("\ninstruction trace:\n"));
    assert!(text.contains("at 00000, mov instruction sm 2, sr 7 dm 0 dr 2\n"));
    assert!(text.contains("at 00004, sob instruction reg 2 with offset 001\n"));
    assert!(text.contains("at 00006, halt instruction\n"));
    assert!(text.contains("  branches taken            = 1 (50.0%)\n"));
}

#[test]
fn verbose_dumps_memory() {
    let output = run(&["-v"], "010001\n000000\n");
    assert!(output.status.success());

    let text = stdout(&output);
    assert!(text.starts_with("reading words in octal from stdin:\n  0010001\n  0000000\n"));
    assert!(text.contains("  nzvc bits = 4'b0100\n"));
    assert!(text.contains("first 20 words of memory after execution halts:\n  00000: 010001\n"));
}

#[test]
fn trace_and_verbose_conflict() {
    let output = run(&["-t", "-v"], "0\n");
    assert!(!output.status.success());
}

#[test]
fn bad_instruction_exits_nonzero() {
    let output = run(&[], "010001 170000 0\n");
    assert!(!output.status.success());

    let text = stdout(&output);
    assert!(text.contains("BAD INSTRUCTION AT PC = 000002\n"));
    assert!(!text.contains("execution statistics"));
}

#[test]
fn bad_instruction_follows_trace_prefix() {
    let output = run(&["-t"], "010001 170000 0\n");
    assert!(!output.status.success());

    let text = stdout(&output);
    assert!(text.contains("at 00000, mov instruction sm 0, sr 0 dm 0 dr 1\nat 00002, \nBAD INSTRUCTION AT PC = 000002\n"));
    assert!(!text.contains("execution statistics"));
    // The reporter owns the message; nothing is logged at the default level
    assert!(String::from_utf8_lossy(&output.stderr).is_empty());
}

#[test]
fn oversized_word_is_rejected() {
    let output = run(&[], "200000\n");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("does not fit in 16 bits"));
}

#[test]
fn step_limit_stops_endless_loop() {
    let output = run(&["--max-steps", "5"], "077001 0\n");
    assert_eq!(output.status.code(), Some(2));
    assert!(stdout(&output).contains("  instructions executed     = 5\n"));
}

#[test]
fn json_report() {
    let output = run(&["--json"], "0\n");
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(value["statistics"]["instruction_words_fetched"], 1);
    assert_eq!(value["registers"][7], 2);
}
