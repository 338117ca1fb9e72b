//! Análisis sintáctico.
//!
//! Parser descendente recursivo con backtracking limitado. Cada regla
//! puede fallar de forma débil (la regla no aplica en esta posición y
//! se puede intentar otra) o estricta (la regla aplicaba, pero la
//! entrada está mal formada). [`Parser::attempt()`] ejecuta una regla
//! sobre una copia del parser y solo avanza si la regla tuvo éxito.
//!
//! Las expresiones no se conservan como árboles sino como el texto C++
//! equivalente: cada operación binaria se encierra entre paréntesis,
//! de manera que `100 + (20 * 2)` resulta en `(100+((20*2)))`.

use std::{iter::Peekable, marker::PhantomData};
use thiserror::Error;

use crate::{
    ast::{Command, PinDirection, Program, VarType, VariableDeclaration},
    lex::{Keyword, Token},
    source::{Located, Location},
};

#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ParserError {
    #[error("Expected {0}, found {1} instead")]
    UnexpectedToken(Token, Token),

    #[error("Expected {0}, none was found instead")]
    MissingToken(Token),

    #[error("Expected identifier")]
    ExpectedId,

    #[error("Expected any of `inteiro`, `texto`, `booleano`")]
    ExpectedType,

    #[error("Expected `saida` or `entrada`")]
    ExpectedDirection,

    #[error("Expected a command or `fim`")]
    ExpectedCommand,

    #[error("Expected an expression")]
    ExpectedExpr,

    #[error("Expected an identifier or literal")]
    ExpectedOperand,

    #[error("Expected an integer literal")]
    ExpectedInteger,

    #[error("Commands inside `se` and `enquanto` blocks are not supported")]
    NestedBlock,

    #[error("Unexpected input after the `repita` block")]
    TrailingInput,

    #[error("Abrupt end of program")]
    UnexpectedEof,
}

pub trait TokenStream<'a>: Iterator<Item = &'a Located<Token>> + Clone {}

impl<'a, I> TokenStream<'a> for I where I: Iterator<Item = &'a Located<Token>> + Clone {}

/// Construye un [`Program`] a partir de un flujo de tokens.
///
/// `start` es la ubicación de inicio del código fuente, usada para
/// reportar errores en programas vacíos.
pub fn parse<'a, I: TokenStream<'a>>(
    tokens: I,
    start: Location,
) -> Result<Program, Located<ParserError>> {
    let mut parser = Parser {
        tokens: tokens.peekable(),
        last_known: start,
        lifetime_hack: PhantomData,
    };

    parser.program().map_err(Failure::coerce)
}

#[derive(Clone)]
struct Parser<'a, I: TokenStream<'a>> {
    tokens: Peekable<I>,
    last_known: Location,
    lifetime_hack: PhantomData<&'a ()>,
}

enum Failure {
    Weak(Located<ParserError>),
    Strict(Located<ParserError>),
}

impl Failure {
    fn weak(self) -> Self {
        Failure::Weak(self.coerce())
    }

    fn strict(self) -> Self {
        Failure::Strict(self.coerce())
    }

    fn coerce(self) -> Located<ParserError> {
        match self {
            Failure::Weak(error) => error,
            Failure::Strict(error) => error,
        }
    }
}

type Parse<T> = Result<T, Failure>;

impl<'a, I: TokenStream<'a>> Parser<'a, I> {
    fn program(&mut self) -> Parse<Program> {
        let mut declarations = Vec::new();
        while let Some(Token::Keyword(Keyword::Var)) = self.peek() {
            declarations.extend(self.declaration()?);
        }

        self.keyword(Keyword::Config)?;
        let setup_commands = self.command_block()?;

        self.keyword(Keyword::Repita)?;
        let loop_commands = self.command_block()?;

        if self.peek().is_some() {
            self.next()?;
            return self.fail(ParserError::TrailingInput);
        }

        Ok(Program {
            declarations,
            setup_commands,
            loop_commands,
        })
    }

    fn declaration(&mut self) -> Parse<Vec<VariableDeclaration>> {
        self.keyword(Keyword::Var)?;
        let typ = self.typ()?;

        self.expect(Token::Colon)?;
        let names = self.comma_separated(Parser::id)?;
        self.expect(Token::Semicolon)?;

        let declarations = names
            .into_iter()
            .map(|name| VariableDeclaration::new(name, typ))
            .collect();

        Ok(declarations)
    }

    fn typ(&mut self) -> Parse<VarType> {
        match self.next()?.into_inner() {
            Token::Keyword(Keyword::Inteiro) => Ok(VarType::Integer),
            Token::Keyword(Keyword::Texto) => Ok(VarType::Text),
            Token::Keyword(Keyword::Booleano) => Ok(VarType::Boolean),
            _ => self.fail(ParserError::ExpectedType),
        }
    }

    /// Comandos hasta un `fim`, el cual se consume.
    fn command_block(&mut self) -> Parse<Vec<Command>> {
        let mut commands = Vec::new();
        loop {
            match self.attempt(Parser::command) {
                Ok(command) => commands.push(command),
                Err(Failure::Weak(error)) => {
                    self.keyword(Keyword::Fim)
                        .map_err(|_| Failure::Strict(error))?;

                    break Ok(commands);
                }

                Err(error) => break Err(error),
            }
        }
    }

    fn command(&mut self) -> Parse<Command> {
        use Keyword::*;

        let keyword = match self.lookahead(|s| s.next().map(Located::into_inner))? {
            Token::Id(_) => return self.assignment(),
            Token::Keyword(keyword) => keyword,

            _ => {
                self.next()?;
                return self
                    .fail(ParserError::ExpectedCommand)
                    .map_err(Failure::weak);
            }
        };

        let command = match keyword {
            Configurar => {
                self.next()?;
                let pin = self.id()?;
                self.keyword(Como)?;
                let direction = self.direction()?;

                Command::ConfigurePin { pin, direction }
            }

            ConfigurarPwm => {
                self.next()?;
                let pin = self.id()?;
                self.keyword(Com)?;
                self.keyword(Frequencia)?;
                let frequency = self.integer()?;

                self.optional(|s| s.expect(Token::Comma).map_err(Failure::weak))?;
                self.keyword(Resolucao)?;
                let resolution = self.integer()?;

                Command::ConfigurePwm {
                    pin,
                    frequency,
                    resolution,
                }
            }

            AjustarPwm => {
                self.next()?;
                let pin = self.id()?;
                self.keyword(Com)?;
                self.keyword(Valor)?;
                let value = self.expr().map_err(Failure::strict)?;

                Command::AdjustPwm { pin, value }
            }

            ConectarWifi => {
                self.next()?;
                let ssid = self.operand()?;
                let password = self.operand()?;

                Command::ConnectWifi { ssid, password }
            }

            Esperar => {
                self.next()?;
                let time = self.expr().map_err(Failure::strict)?;

                Command::Wait { time }
            }

            Ligar => {
                self.next()?;
                Command::TurnOn { pin: self.id()? }
            }

            Desligar => {
                self.next()?;
                Command::TurnOff { pin: self.id()? }
            }

            EnviarHttp => {
                self.next()?;
                let url = self.operand()?;
                let data = self.operand()?;

                Command::SendHttp { url, data }
            }

            ConfigurarSerial => {
                self.next()?;
                Command::ConfigureSerial {
                    baud: self.integer()?,
                }
            }

            EscreverSerial => {
                self.next()?;
                let message = self.expr().map_err(Failure::strict)?;

                Command::WriteSerial { message }
            }

            LerSerial => {
                self.next()?;
                Command::ReadSerial
            }

            // Los cuerpos de estos bloques no se modelan, por lo cual
            // se rechazan en vez de descartarlos en silencio
            Se => {
                self.next()?;
                let condition = self.expr().map_err(Failure::strict)?;
                self.keyword(Entao)?;
                self.empty_body()?;

                return Ok(Command::Conditional { condition });
            }

            Enquanto => {
                self.next()?;
                let condition = self.expr().map_err(Failure::strict)?;
                self.empty_body()?;

                return Ok(Command::WhileLoop { condition });
            }

            _ => {
                self.next()?;
                return self
                    .fail(ParserError::ExpectedCommand)
                    .map_err(Failure::weak);
            }
        };

        self.expect(Token::Semicolon)?;
        Ok(command)
    }

    fn assignment(&mut self) -> Parse<Command> {
        let target = self.id()?;
        self.expect(Token::Assign)?;

        let read = |s: &mut Self, keyword: Keyword| -> Parse<String> {
            s.keyword(keyword).map_err(Failure::weak)?;
            s.id()
        };

        let command = if let Some(pin) = self.optional(|s| read(s, Keyword::LerDigital))? {
            Command::ReadDigital { target, pin }
        } else if let Some(pin) = self.optional(|s| read(s, Keyword::LerAnalogico))? {
            Command::ReadAnalog { target, pin }
        } else {
            let value = self.expr().map_err(Failure::strict)?;
            Command::Assign { target, value }
        };

        self.expect(Token::Semicolon)?;
        Ok(command)
    }

    fn empty_body(&mut self) -> Parse<()> {
        match self.next()?.into_inner() {
            Token::Keyword(Keyword::Fim) => Ok(()),
            _ => self.fail(ParserError::NestedBlock),
        }
    }

    fn direction(&mut self) -> Parse<PinDirection> {
        match self.next()?.into_inner() {
            Token::Keyword(Keyword::Saida) => Ok(PinDirection::Output),
            Token::Keyword(Keyword::Entrada) => Ok(PinDirection::Input),
            _ => self.fail(ParserError::ExpectedDirection),
        }
    }

    /// `sum (comparison sum)?`
    fn expr(&mut self) -> Parse<String> {
        use Token::*;

        let lhs = self.sum()?;
        let comparison = [Equal, NotEqual, Less, LessOrEqual, Greater, GreaterOrEqual];

        match self.optional(|s| s.operator(&comparison))? {
            None => Ok(lhs),
            Some(operator) => {
                let rhs = self.sum().map_err(Failure::strict)?;
                Ok(format!("({}{}{})", lhs, operator, rhs))
            }
        }
    }

    fn sum(&mut self) -> Parse<String> {
        self.left_assoc(&[Token::Plus, Token::Minus], Parser::term)
    }

    fn term(&mut self) -> Parse<String> {
        self.left_assoc(&[Token::Times, Token::Div], Parser::unary)
    }

    fn unary(&mut self) -> Parse<String> {
        match self.optional(|s| s.expect(Token::Minus).map_err(Failure::weak))? {
            Some(()) => Ok(format!("(-{})", self.unary().map_err(Failure::strict)?)),
            None => self.atom(),
        }
    }

    fn atom(&mut self) -> Parse<String> {
        match self.next()?.into_inner() {
            Token::IntLiteral(integer) => Ok(integer.to_string()),
            Token::StrLiteral(string) => Ok(format!("\"{}\"", string)),
            Token::Id(id) => Ok(id),
            Token::Keyword(Keyword::Verdadeiro) => Ok(String::from("true")),
            Token::Keyword(Keyword::Falso) => Ok(String::from("false")),

            Token::OpenParen => {
                let inner = self.expr().map_err(Failure::strict)?;
                self.expect(Token::CloseParen)?;

                Ok(format!("({})", inner))
            }

            _ => self.fail(ParserError::ExpectedExpr).map_err(Failure::weak),
        }
    }

    fn left_assoc<F>(&mut self, operators: &[Token], mut operand: F) -> Parse<String>
    where
        F: FnMut(&mut Self) -> Parse<String>,
    {
        let mut lhs = operand(self)?;
        loop {
            match self.optional(|s| s.operator(operators))? {
                None => break Ok(lhs),
                Some(operator) => {
                    let rhs = operand(self).map_err(Failure::strict)?;
                    lhs = format!("({}{}{})", lhs, operator, rhs);
                }
            }
        }
    }

    fn operator(&mut self, operators: &[Token]) -> Parse<&'static str> {
        let token = self.next().map_err(Failure::weak)?.into_inner();
        match token.operator() {
            Some(operator) if operators.contains(&token) => Ok(operator),
            _ => self.fail(ParserError::ExpectedExpr).map_err(Failure::weak),
        }
    }

    /// Un único literal o identificador, sin operadores.
    fn operand(&mut self) -> Parse<String> {
        match self.next()?.into_inner() {
            Token::StrLiteral(string) => Ok(format!("\"{}\"", string)),
            Token::Id(id) => Ok(id),
            Token::IntLiteral(integer) => Ok(integer.to_string()),
            _ => self.fail(ParserError::ExpectedOperand),
        }
    }

    fn integer(&mut self) -> Parse<i32> {
        match self.next()?.into_inner() {
            Token::IntLiteral(integer) => Ok(integer),
            _ => self.fail(ParserError::ExpectedInteger),
        }
    }

    fn optional<T, F>(&mut self, rule: F) -> Parse<Option<T>>
    where
        F: FnOnce(&mut Self) -> Parse<T>,
    {
        match self.attempt(rule) {
            Err(Failure::Weak(_)) => Ok(None),
            result => Ok(Some(result?)),
        }
    }

    fn attempt<T, F>(&mut self, rule: F) -> Parse<T>
    where
        F: FnOnce(&mut Self) -> Parse<T>,
    {
        let mut fork = self.clone();

        let result = rule(&mut fork);
        if result.is_ok() {
            *self = fork;
        }

        result
    }

    fn lookahead<T, F>(&mut self, rule: F) -> Parse<T>
    where
        F: FnOnce(&mut Self) -> Parse<T>,
    {
        rule(&mut self.clone())
    }

    fn comma_separated<T, F>(&mut self, mut rule: F) -> Parse<Vec<T>>
    where
        F: FnMut(&mut Self) -> Parse<T>,
    {
        let mut items = vec![rule(self).map_err(Failure::strict)?];

        loop {
            match self.attempt(|s| s.expect(Token::Comma).map_err(Failure::weak)) {
                Err(Failure::Weak(_)) => break Ok(items),
                result => {
                    result?;
                    items.push(rule(self).map_err(Failure::strict)?);
                }
            }
        }
    }

    fn id(&mut self) -> Parse<String> {
        match self.next()?.into_inner() {
            Token::Id(id) => Ok(id),
            _ => self.fail(ParserError::ExpectedId),
        }
    }

    fn keyword(&mut self, keyword: Keyword) -> Parse<()> {
        self.expect(Token::Keyword(keyword))
    }

    fn expect(&mut self, token: Token) -> Parse<()> {
        match self.next().map(Located::into_inner) {
            Ok(found) if found == token => Ok(()),
            Ok(found) => self.fail(ParserError::UnexpectedToken(token, found)),
            Err(_) => self.fail(ParserError::MissingToken(token)),
        }
    }

    fn peek(&mut self) -> Option<&Token> {
        self.tokens.peek().map(|token| token.val())
    }

    fn next(&mut self) -> Parse<Located<Token>> {
        match self.tokens.next() {
            Some(token) => {
                self.last_known = token.location().clone();
                Ok(token.clone())
            }

            None => self.fail(ParserError::UnexpectedEof),
        }
    }

    fn fail<T>(&self, error: ParserError) -> Parse<T> {
        Err(Failure::Strict(Located::at(error, self.last_known.clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{lex::Lexer, source};

    fn parse_text(text: &str) -> Result<Program, ParserError> {
        let (start, stream) = source::consume(text.as_bytes(), "<test>");
        let tokens = Lexer::new(start.clone(), stream)
            .try_exhaustive()
            .expect("lexical error");

        parse(tokens.iter(), start).map_err(Located::into_inner)
    }

    fn setup_of(commands: &str) -> Vec<Command> {
        let text = format!("config\n{}\nfim\nrepita\nfim\n", commands);
        parse_text(&text).unwrap().setup_commands
    }

    #[test]
    fn declarations_share_a_type() {
        let program = parse_text(
            "var inteiro: ledPin, brilho;\nvar texto: ssid;\nconfig fim repita fim",
        )
        .unwrap();

        assert_eq!(
            program.declarations,
            [
                VariableDeclaration::new("ledPin", VarType::Integer),
                VariableDeclaration::new("brilho", VarType::Integer),
                VariableDeclaration::new("ssid", VarType::Text),
            ]
        );
    }

    #[test]
    fn expressions_are_parenthesized() {
        let commands = setup_of("brilho = 100 + (20 * 2);\nbrilho = brilho + 1 - -3;");
        assert_eq!(
            commands,
            [
                Command::Assign {
                    target: "brilho".into(),
                    value: "(100+((20*2)))".into(),
                },
                Command::Assign {
                    target: "brilho".into(),
                    value: "((brilho+1)-(-3))".into(),
                },
            ]
        );
    }

    #[test]
    fn negation_never_forms_decrement() {
        let commands = setup_of("y = - -x;\nx = 5 - -3;\nx = -(a+1) * -b;");
        let values: Vec<_> = commands
            .into_iter()
            .map(|command| match command {
                Command::Assign { value, .. } => value,
                other => panic!("unexpected {:?}", other),
            })
            .collect();

        assert_eq!(values, ["(-(-x))", "(5-(-3))", "((-((a+1)))*(-b))"]);
        assert!(values.iter().all(|value| !value.contains("--")));
    }

    #[test]
    fn comparisons_and_literals() {
        let commands = setup_of("ok = a * 2 >= b / 3;\nok = verdadeiro;\nsaudacao = \"oi\";");
        let values: Vec<_> = commands
            .into_iter()
            .map(|command| match command {
                Command::Assign { value, .. } => value,
                other => panic!("unexpected {:?}", other),
            })
            .collect();

        assert_eq!(values, ["((a*2)>=(b/3))", "true", "\"oi\""]);
    }

    #[test]
    fn reads_are_not_assignments() {
        let commands = setup_of("estado = lerDigital botao;\nnivel = lerAnalogico sensor;");
        assert_eq!(
            commands,
            [
                Command::ReadDigital {
                    target: "estado".into(),
                    pin: "botao".into(),
                },
                Command::ReadAnalog {
                    target: "nivel".into(),
                    pin: "sensor".into(),
                },
            ]
        );
    }

    #[test]
    fn hardware_commands() {
        let commands = setup_of(
            "configurar led como saida;
             configurar botao como entrada;
             configurarPWM led com frequencia 5000 resolucao 8;
             configurarPWM motor com frequencia 1000, resolucao 10;
             ajustarPWM led com valor brilho / 2;
             ligar led;
             desligar led;",
        );

        assert_eq!(
            commands,
            [
                Command::ConfigurePin {
                    pin: "led".into(),
                    direction: PinDirection::Output,
                },
                Command::ConfigurePin {
                    pin: "botao".into(),
                    direction: PinDirection::Input,
                },
                Command::ConfigurePwm {
                    pin: "led".into(),
                    frequency: 5000,
                    resolution: 8,
                },
                Command::ConfigurePwm {
                    pin: "motor".into(),
                    frequency: 1000,
                    resolution: 10,
                },
                Command::AdjustPwm {
                    pin: "led".into(),
                    value: "(brilho/2)".into(),
                },
                Command::TurnOn { pin: "led".into() },
                Command::TurnOff { pin: "led".into() },
            ]
        );
    }

    #[test]
    fn network_and_serial_commands() {
        let commands = setup_of(
            "conectarWifi ssid senha;
             enviarHttp \"http://exemplo.com\" dados;
             configurarSerial 115200;
             escreverSerial \"pronto\";
             lerSerial;
             esperar 1000;",
        );

        assert_eq!(
            commands,
            [
                Command::ConnectWifi {
                    ssid: "ssid".into(),
                    password: "senha".into(),
                },
                Command::SendHttp {
                    url: "\"http://exemplo.com\"".into(),
                    data: "dados".into(),
                },
                Command::ConfigureSerial { baud: 115200 },
                Command::WriteSerial {
                    message: "\"pronto\"".into(),
                },
                Command::ReadSerial,
                Command::Wait {
                    time: "1000".into(),
                },
            ]
        );
    }

    #[test]
    fn empty_blocks_are_placeholders() {
        let commands = setup_of("se x > 1 entao fim\nenquanto verdadeiro fim");
        assert_eq!(
            commands,
            [
                Command::Conditional {
                    condition: "(x>1)".into(),
                },
                Command::WhileLoop {
                    condition: "true".into(),
                },
            ]
        );
    }

    #[test]
    fn nested_commands_are_rejected() {
        let error = parse_text("config se x entao ligar led; fim fim repita fim").unwrap_err();
        assert!(matches!(error, ParserError::NestedBlock), "{:?}", error);
    }

    #[test]
    fn missing_semicolon() {
        let error = parse_text("config esperar 10 fim repita fim").unwrap_err();
        assert!(
            matches!(error, ParserError::UnexpectedToken(Token::Semicolon, _)),
            "{:?}",
            error
        );
    }

    #[test]
    fn unknown_command() {
        let error = parse_text("config como; fim repita fim").unwrap_err();
        assert!(matches!(error, ParserError::ExpectedCommand), "{:?}", error);
    }

    #[test]
    fn missing_repita() {
        let error = parse_text("config fim").unwrap_err();
        assert!(
            matches!(error, ParserError::MissingToken(Token::Keyword(Keyword::Repita))),
            "{:?}",
            error
        );
    }

    #[test]
    fn trailing_input() {
        let error = parse_text("config fim repita fim ligar").unwrap_err();
        assert!(matches!(error, ParserError::TrailingInput), "{:?}", error);
    }
}
