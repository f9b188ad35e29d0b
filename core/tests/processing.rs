use lcm_core::{Batch, Config, ErrorCode, Lambda, OwnedBatch, process, register, setup};
use mlua::Lua;

fn with_lambda(lambda_id: i32, source: &str) -> Lua {
    let lua = Lua::new();
    setup(&lua, Config::new()).expect("setup");
    register(&lua, &Lambda::new(lambda_id, source.as_bytes())).expect("register");
    lua
}

fn run(lua: &Lua, lambda_id: i32, batch_id: i32, payload: &[u8]) -> (ErrorCode, Option<OwnedBatch>) {
    let mut out = None;
    let res = process(lua, &Batch::new(lambda_id, batch_id, payload), |b| {
        assert!(out.is_none(), "sink called twice");
        out = Some(b.to_owned_batch());
    });
    (lcm_core::status_code(&res), out)
}

#[test]
fn uppercase_lambda() {
    let lua = with_lambda(2, "lcm:register(function (batch)\n  return batch:upper()\nend)");
    let (code, out) = run(&lua, 2, 1, b"hello");
    assert_eq!(code, ErrorCode::Ok);
    let out = out.expect("result batch");
    assert_eq!(out.lambda_id, 2);
    assert_eq!(out.batch_id, 1);
    assert_eq!(out.payload, b"HELLO");
}

#[test]
fn binary_payloads_round_trip() {
    let lua = with_lambda(4, "lcm:register(function(b) return b:reverse() end)");
    let payload = [0u8, 255, 10, 0, 128, 7];
    let (code, out) = run(&lua, 4, 11, &payload);
    assert_eq!(code, ErrorCode::Ok);
    let mut expected = payload.to_vec();
    expected.reverse();
    assert_eq!(out.unwrap().payload, expected);

    let (code, out) = run(&lua, 4, 12, b"");
    assert_eq!(code, ErrorCode::Ok);
    assert!(out.unwrap().payload.is_empty());
}

#[test]
fn unknown_lambda_never_calls_sink() {
    let lua = with_lambda(1, "lcm:register(function(b) return b end)");
    let (code, out) = run(&lua, 99, 1, b"x");
    assert_eq!(code, ErrorCode::LambdaNotFound);
    assert!(out.is_none());
}

#[test]
fn non_string_results_are_no_result() {
    let cases = [
        "return 42",
        "return 1.5",
        "return true",
        "return nil",
        "return {}",
        "return",
        "",
    ];
    for body in cases {
        let src = format!("lcm:register(function(b) {} end)", body);
        let lua = with_lambda(1, &src);
        let (code, out) = run(&lua, 1, 1, b"x");
        assert_eq!(code, ErrorCode::NoResult, "case {:?}", body);
        assert!(out.is_none(), "sink called for case {:?}", body);
    }
}

#[test]
fn only_the_first_return_value_counts() {
    let lua = with_lambda(1, "lcm:register(function(b) return b .. '!', 'ignored' end)");
    let (code, out) = run(&lua, 1, 1, b"hey");
    assert_eq!(code, ErrorCode::Ok);
    assert_eq!(out.unwrap().payload, b"hey!");

    let lua = with_lambda(1, "lcm:register(function(b) return 1, 'second' end)");
    assert_eq!(run(&lua, 1, 1, b"hey").0, ErrorCode::NoResult);
}

#[test]
fn failing_batch_leaves_lambda_registered() {
    let lua = with_lambda(
        3,
        "lcm:register(function(b)\n  if b == 'bad' then error('rejected: ' .. b) end\n  return b\nend)",
    );
    let mut detail = None;
    let res = process(&lua, &Batch::new(3, 1, b"bad"), |_| panic!("sink must not run"));
    if let Err(e) = &res {
        detail = e.detail().map(str::to_string);
    }
    assert_eq!(lcm_core::status_code(&res), ErrorCode::RuntimeError);
    assert!(detail.unwrap_or_default().contains("rejected: bad"));

    let (code, out) = run(&lua, 3, 2, b"good");
    assert_eq!(code, ErrorCode::Ok);
    assert_eq!(out.unwrap().payload, b"good");
}

#[test]
fn payload_errors_keep_runtime_code() {
    let lua = with_lambda(1, "lcm:register(function(b) error(b) end)");
    let (code, out) = run(&lua, 1, 1, b"upstream said: error in error handling");
    assert_eq!(code, ErrorCode::RuntimeError);
    assert!(out.is_none());
}

#[test]
fn lambdas_do_not_cross_talk() {
    let lua = Lua::new();
    setup(&lua, Config::new()).unwrap();
    register(&lua, &Lambda::new(1, b"lcm:register(function(b) return 'one:' .. b end)")).unwrap();
    register(&lua, &Lambda::new(2, b"lcm:register(function(b) return 'two:' .. b end)")).unwrap();

    let order = [(2, 10), (1, 11), (2, 12), (1, 13)];
    for (lambda_id, batch_id) in order {
        let (code, out) = run(&lua, lambda_id, batch_id, b"x");
        assert_eq!(code, ErrorCode::Ok);
        let out = out.unwrap();
        assert_eq!((out.lambda_id, out.batch_id), (lambda_id, batch_id));
        let expected: &[u8] = if lambda_id == 1 { b"one:x" } else { b"two:x" };
        assert_eq!(out.payload, expected);
    }
}

#[test]
fn callback_state_persists_between_batches() {
    let src = "local n = 0\nlcm:register(function(b)\n  n = n + 1\n  return tostring(n) .. ':' .. b\nend)";
    let lua = with_lambda(8, src);
    assert_eq!(run(&lua, 8, 1, b"a").1.unwrap().payload, b"1:a");
    assert_eq!(run(&lua, 8, 2, b"b").1.unwrap().payload, b"2:b");
}

#[test]
fn process_sets_context_ids_without_reset() {
    let lua = with_lambda(
        6,
        "lcm:register(function(b) return b end)",
    );
    let ctx = lcm_core::context_of(&lua).unwrap();
    run(&lua, 6, 42, b"x");
    assert_eq!((ctx.current_lambda_id(), ctx.current_batch_id()), (6, 42));
    run(&lua, 77, 43, b"x");
    assert_eq!((ctx.current_lambda_id(), ctx.current_batch_id()), (77, 43));
}
