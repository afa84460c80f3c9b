use super::*;

/// Depth of a right-nested chain `(((...)))`, computed recursively.
fn nesting_depth(n: u32) -> u32 {
    ensure_sufficient_stack(|| if n == 0 { 0 } else { 1 + nesting_depth(n - 1) })
}

#[test]
fn shallow_nesting() {
    assert_eq!(nesting_depth(16), 16);
}

#[test]
fn deep_nesting_does_not_overflow() {
    assert_eq!(nesting_depth(200_000), 200_000);
}

#[test]
fn propagates_results() {
    let result: Result<u8, String> = ensure_sufficient_stack(|| Err("fail".to_owned()));
    assert_eq!(result, Err("fail".to_owned()));
}
