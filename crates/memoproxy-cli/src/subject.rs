//! Demo subject with one slow and one cheap operation

use std::thread;
use std::time::Duration;

use memoproxy::{Args, MethodTable, Value};

/// Subject whose `im_heavy` call is deliberately slow
pub struct ExampleSubject;

/// Wrap [`ExampleSubject`] for the proxy
pub fn example_subject() -> MethodTable<ExampleSubject> {
    MethodTable::named("ExampleSubject", ExampleSubject)
        .method("im_heavy", |_, args| {
            let delay_ms = args.int(0)?.max(0) as u64;
            thread::sleep(Duration::from_millis(delay_ms));
            Ok(Value::from("Finally my result is here !"))
        })
        .method("fib", |_, args| {
            let n = args.int(0)?;
            if !(0..=91).contains(&n) {
                return Err(format!("fib({}) is out of range", n).into());
            }
            Ok(Value::Int(fib(n as u32)))
        })
}

fn fib(n: u32) -> i64 {
    let (mut a, mut b) = (0i64, 1i64);
    for _ in 0..n {
        let next = a + b;
        a = b;
        b = next;
    }
    a
}
