#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![forbid(unsafe_code)]

use dicetree::{Number, roll};

use std::io::{self, Write};

fn main() {
    println!("dicetree REPL. Type a dice expression and press Enter. Ctrl-C to exit.");

    loop {
        print!("> ");
        io::stdout().flush().unwrap();

        let mut input = String::new();
        match io::stdin().read_line(&mut input) {
            Ok(_) => {
                let trimmed = input.trim();
                if trimmed.is_empty() {
                    continue;
                }
                match roll(trimmed) {
                    Ok(result) => {
                        println!("Result: {}", result.tree.total());
                        println!("{}", result.result);
                        if let Some(comment) = &result.comment {
                            println!("Comment: {comment}");
                        }
                    }
                    Err(e) => eprintln!("Error: {}", e),
                }
            }
            Err(error) => {
                eprintln!("Error reading input: {}", error);
                break;
            }
        }
    }
}
