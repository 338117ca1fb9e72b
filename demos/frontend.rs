use pinc::{error::Diagnostics, lex::Lexer, parse, source, target};

fn main() {
    let stdin = std::io::stdin();
    let mut stdin = stdin.lock();

    let (start, stream) = source::consume(&mut stdin, "<stdin>");
    let lexer = Lexer::new(start.clone(), stream);

    let diagnostics = match lexer.try_exhaustive() {
        Err(errors) => Diagnostics::from(errors).kind("Lexical error"),

        Ok(tokens) => {
            print!("Tokens: {:#?}\n\n", tokens);

            match parse::parse(tokens.iter(), start) {
                Err(error) => Diagnostics::from(error).kind("Syntax error"),

                Ok(program) => {
                    print!("Ast: {:#?}\n\n", program);

                    match program.analyze() {
                        Err(error) => Diagnostics::from(error).kind("Semantic error"),

                        Ok(symbols) => {
                            println!("Symbols: {:#?}\n", symbols);
                            println!("PWM: {:#?}\n", target::PwmChannels::allocate(&program.setup_commands));
                            print!("{}", target::generate(&program));
                            Diagnostics::default()
                        }
                    }
                }
            }
        }
    };

    if !diagnostics.is_empty() {
        eprint!("{}", diagnostics);
    }
}
