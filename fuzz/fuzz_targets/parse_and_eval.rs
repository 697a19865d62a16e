#![no_main]

use dicetree::{evaluate, parse};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let expr = std::string::String::from_utf8_lossy(data);
    if let Ok(ast) = parse(&expr, true) {
        let _ = evaluate(&ast);
    }
});
