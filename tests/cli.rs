use std::process::Command;

fn combined_output(args: &[&str]) -> (Option<i32>, String) {
    let output = Command::new(env!("CARGO_BIN_EXE_probe"))
        .args(args)
        .output()
        .unwrap();
    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    text.push_str(&String::from_utf8_lossy(&output.stderr));
    (output.status.code(), text)
}

#[test]
fn bad_arguments_are_logged_like_discovery_failures() {
    for args in &[
        &["--timeout", "0"][..],
        &["--bind", "nowhere"][..],
        &["host:notaport"][..],
    ] {
        let (code, text) = combined_output(args);
        assert_eq!(code, Some(1), "{:?}: {}", args, text);
        assert!(text.contains("invalid configuration"), "{:?}: {}", args, text);
        assert!(!text.contains("InvalidConfig("), "{:?}: {}", args, text);
    }
}

#[test]
fn unreachable_server_exits_with_status_one() {
    let (code, text) = combined_output(&[
        "--timeout",
        "0.2",
        "--bind",
        "127.0.0.1",
        "--port",
        "0",
        "stun.invalid",
    ]);
    assert_eq!(code, Some(1), "{}", text);
    assert!(text.contains("couldn't get external address"), "{}", text);
}
