//! Análisis léxico.
//!
//! # Tokenization
//! Esta es la primera fase del compilador. Descompone un [`InputStream`]
//! (flujo de caracteres) en tokens. Los espacios en blanco y los comentarios
//! de la forma `// ...` se descartan. Cada token emitido está asociado a una
//! ubicación en el código fuente original.
//!
//! # Reglas importantes del lenguaje
//! - Las palabras clave son case-insensitive: `configurarPWM`,
//!   `CONFIGURARPWM` y `configurarpwm` son la misma palabra clave.
//! - Los identificadores conservan mayúsculas y minúsculas, ya que se
//!   emiten tal cual en C++.
//! - Los literales de texto se conservan crudos, incluyendo secuencias
//!   de escape, y no pueden extenderse más allá de una línea.
//!
//! # Errores
//! Ante un error, el lexer descarta el resto de la línea y continúa en la
//! siguiente. Esto permite reportar más de un error por ejecución.

use crate::source::{InputStream, Located, Location};
use std::{
    fmt::{self, Display},
    str::FromStr,
};

use thiserror::Error;

// Case-insensitive
pub use unicase::Ascii as NoCase;

/// Literal entero máximo.
const INT_MAX: i32 = i32::MAX;

/// Error de escaneo.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum LexerError {
    /// Error de E/S originado por el [`InputStream`].
    #[error("I/O error")]
    Input(#[from] std::io::Error),

    /// Carácter desconocido o inesperado en el flujo de entrada.
    #[error("Bad character {0:?} in input stream")]
    BadChar(char),

    /// Se esperaba un carácter específico en esta posición.
    #[error("Expected {0:?}")]
    Expected(char),

    /// Una constante entera se encuentra fuera de rango.
    #[error("Integer literal overflow, valid range is [0, {}]", INT_MAX)]
    IntOverflow,

    /// Un literal de texto llegó al final de la línea sin cerrarse.
    #[error("Unterminated string literal")]
    UnterminatedString,
}

/// Objeto resultante del análisis léxico.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Identificador.
    Id(String),

    /// Palabra clave.
    Keyword(Keyword),

    /// Literal de entero.
    IntLiteral(i32),

    /// Literal de texto, sin las comillas que lo delimitan.
    StrLiteral(String),

    /// `=`
    Assign,

    /// `==`
    Equal,

    /// `!=`
    NotEqual,

    /// `<`
    Less,

    /// `<=`
    LessOrEqual,

    /// `>`
    Greater,

    /// `>=`
    GreaterOrEqual,

    /// `:`
    Colon,

    /// `;`
    Semicolon,

    /// `,`
    Comma,

    /// `+`
    Plus,

    /// `-`
    Minus,

    /// `*`
    Times,

    /// `/`
    Div,

    /// `(`
    OpenParen,

    /// `)`
    CloseParen,
}

impl Token {
    /// Texto con el que este token se reproduce dentro de una expresión.
    pub fn operator(&self) -> Option<&'static str> {
        use Token::*;

        let string = match self {
            Equal => "==",
            NotEqual => "!=",
            Less => "<",
            LessOrEqual => "<=",
            Greater => ">",
            GreaterOrEqual => ">=",
            Plus => "+",
            Minus => "-",
            Times => "*",
            Div => "/",
            _ => return None,
        };

        Some(string)
    }
}

impl Display for Token {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Token::*;

        match self {
            Id(id) => write!(fmt, "identifier `{}`", id),
            Keyword(keyword) => write!(fmt, "keyword `{}`", keyword),
            IntLiteral(integer) => write!(fmt, "literal `{}`", integer),
            StrLiteral(string) => write!(fmt, "literal `\"{}\"`", string),
            Assign => fmt.write_str("`=`"),
            Colon => fmt.write_str("`:`"),
            Semicolon => fmt.write_str("`;`"),
            Comma => fmt.write_str("`,`"),
            OpenParen => fmt.write_str("`(`"),
            CloseParen => fmt.write_str("`)`"),
            operator => write!(fmt, "`{}`", operator.operator().unwrap_or("?")),
        }
    }
}

/// Una palabra clave.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Keyword {
    Var,
    Inteiro,
    Texto,
    Booleano,
    Config,
    Repita,
    Fim,
    Configurar,
    Como,
    Saida,
    Entrada,
    ConfigurarPwm,
    AjustarPwm,
    Com,
    Frequencia,
    Resolucao,
    Valor,
    ConectarWifi,
    Esperar,
    Ligar,
    Desligar,
    EnviarHttp,
    ConfigurarSerial,
    EscreverSerial,
    LerSerial,
    LerDigital,
    LerAnalogico,
    Se,
    Entao,
    Senao,
    Enquanto,
    Verdadeiro,
    Falso,
}

const KEYWORDS: &[(&str, Keyword)] = {
    use Keyword::*;

    &[
        ("var",              Var),
        ("inteiro",          Inteiro),
        ("texto",            Texto),
        ("booleano",         Booleano),
        ("config",           Config),
        ("repita",           Repita),
        ("fim",              Fim),
        ("configurar",       Configurar),
        ("como",             Como),
        ("saida",            Saida),
        ("entrada",          Entrada),
        ("configurarPWM",    ConfigurarPwm),
        ("ajustarPWM",       AjustarPwm),
        ("com",              Com),
        ("frequencia",       Frequencia),
        ("resolucao",        Resolucao),
        ("valor",            Valor),
        ("conectarWifi",     ConectarWifi),
        ("esperar",          Esperar),
        ("ligar",            Ligar),
        ("desligar",         Desligar),
        ("enviarHttp",       EnviarHttp),
        ("configurarSerial", ConfigurarSerial),
        ("escreverSerial",   EscreverSerial),
        ("lerSerial",        LerSerial),
        ("lerDigital",       LerDigital),
        ("lerAnalogico",     LerAnalogico),
        ("se",               Se),
        ("entao",            Entao),
        ("senao",            Senao),
        ("enquanto",         Enquanto),
        ("verdadeiro",       Verdadeiro),
        ("falso",            Falso),
    ]
};

impl Display for Keyword {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        let string = KEYWORDS
            .iter()
            .find(|&&(_, keyword)| keyword == *self)
            .map(|&(name, _)| name)
            .unwrap_or("?");

        fmt.write_str(string)
    }
}

impl FromStr for Keyword {
    type Err = ();

    fn from_str(string: &str) -> Result<Self, Self::Err> {
        KEYWORDS
            .iter()
            .find(|&&(name, _)| NoCase::new(name) == NoCase::new(string))
            .map(|&(_, keyword)| keyword)
            .ok_or(())
    }
}

/// Máquina de estados para análisis léxico.
///
/// La salida del lexer, así como su siguiente estado, se define a partir
/// de tanto su estado actual como el siguiente carácter encontrado en el
/// flujo de entrada.
pub struct Lexer<S: Iterator> {
    source: std::iter::Peekable<S>,
    state: State,
    start: Location,
    next: Location,
}

/// Posibles estados del lexer.
enum State {
    /// Estado que ocurre antes de encontrar el inicio de un token.
    Start,

    /// Estado de error.
    Error,

    /// Estado de completitud; siempre emite el token incluido,
    /// consume la entrada actual y pasa a [`State::Start`].
    Complete(Token),

    /// Se encontró `/`. Si sigue otro `/` se trata de un comentario.
    Slash,

    /// Comentario de línea.
    ///
    /// Este estado vuelve a [`State::Start`] al encontrar `'\n'`.
    Comment,

    /// Se encontró uno de `=`, `<`, `>`, `!`, que podría continuar con `=`.
    Compare(char),

    /// Constante entera.
    Integer(i32),

    /// Término que puede ser un identificador o una palabra clave.
    Word(String),

    /// Dentro de un literal de texto.
    Str(String),

    /// Dentro de un literal de texto, inmediatamente después de `\`.
    StrEscape(String),
}

impl<S: InputStream> Lexer<S> {
    /// Crea un lexer en estado inicial a partir de un flujo.
    pub fn new(start: Location, source: S) -> Self {
        let next = start.clone();
        Lexer {
            source: source.peekable(),
            state: State::Start,
            start,
            next,
        }
    }

    /// Reduce la entrada a sea una secuencia de tokens o una secuencia
    /// de errores.
    ///
    /// En caso de que ocurra al menos un error, el lexer dejará de
    /// acumular tokens y continuará solamente para recolectar errores.
    pub fn try_exhaustive(mut self) -> Result<Vec<Located<Token>>, Vec<Located<LexerError>>> {
        let mut tokens = Vec::new();

        while let Some(result) = self.next() {
            match result {
                Ok(token) => tokens.push(token),
                Err(error) => {
                    drop(tokens);

                    let mut errors = vec![error];
                    errors.extend(self.filter_map(Result::err));

                    return Err(errors);
                }
            }
        }

        Ok(tokens)
    }

    /// Intenta construir un siguiente token.
    fn lex(&mut self) -> Result<Option<(Token, Location)>, LexerError> {
        use {State::*, Token::*};

        let mut last_accepted = self.start.clone();
        let token = loop {
            // Se espera un siguiente carácter, fallando si hay error de E/S
            let next_char = match self.source.peek() {
                None => None,
                Some(Ok((c, _))) => Some(*c),
                Some(Err(_)) => match self.source.next() {
                    Some(Err(error)) => break Err(error.into()),
                    _ => unreachable!(),
                },
            };

            // La posición de origen se mueve junto a la posición
            // siguiente siempre que no se haya encontrado una
            // frontera de token
            if let Start = self.state {
                self.start = self.next.clone();
            }

            match (&mut self.state, next_char) {
                // Condiciones de error: se descarta la línea donde
                // ocurrió el error. Al llegar al final de la línea
                // el lexer se recupera y reinicia.
                (Error, None) => return Ok(None),
                (Error, Some('\n')) => self.state = Start,
                (Error, Some(_)) => (),

                // Tokens triviales
                (Start, None) => return Ok(None),
                (Start, Some(':')) => self.state = Complete(Colon),
                (Start, Some(';')) => self.state = Complete(Semicolon),
                (Start, Some(',')) => self.state = Complete(Comma),
                (Start, Some('+')) => self.state = Complete(Plus),
                (Start, Some('-')) => self.state = Complete(Minus),
                (Start, Some('*')) => self.state = Complete(Times),
                (Start, Some('(')) => self.state = Complete(OpenParen),
                (Start, Some(')')) => self.state = Complete(CloseParen),
                (Start, Some('/')) => self.state = Slash,
                (Start, Some('"')) => self.state = Str(String::new()),

                (Start, Some(c @ ('=' | '<' | '>' | '!'))) => self.state = Compare(c),

                // Identificadores y palabras clave
                (Start, Some(c)) if c.is_ascii_alphabetic() || c == '_' => {
                    self.state = Word(c.to_string())
                }

                // Inicio de una constante numérica. No se consume el
                // dígito, ya que el estado de constante entera se
                // encarga de acumularlo.
                (Start, Some(c)) if c.is_ascii_digit() => {
                    self.state = Integer(0);
                    continue;
                }

                // Espacios en blanco y caracteres inesperados
                (Start, Some(c)) if c.is_whitespace() => (),
                (Start, Some(c)) => break Err(LexerError::BadChar(c)),

                // Emisión retardada de tokens cualesquiera
                (Complete(value), _) => break Ok(std::mem::replace(value, Plus)),

                (Slash, Some('/')) => self.state = Comment,
                (Slash, _) => break Ok(Div),

                // Los comentarios descartan la línea donde ocurren
                (Comment, Some('\n')) => self.state = Start,
                (Comment, Some(_)) => (),
                (Comment, None) => self.state = Start,

                // Operadores de uno o dos caracteres
                (Compare(first), Some('=')) => {
                    let token = match first {
                        '=' => Equal,
                        '!' => NotEqual,
                        '<' => LessOrEqual,
                        _ => GreaterOrEqual,
                    };

                    self.state = Complete(token);
                }

                (Compare('='), _) => break Ok(Assign),
                (Compare('<'), _) => break Ok(Less),
                (Compare('>'), _) => break Ok(Greater),
                (Compare(_), _) => break Err(LexerError::Expected('=')),

                // Acumulación dígito por dígito de constantes enteras
                (Integer(accumulated), Some(digit)) if digit.is_ascii_digit() => {
                    let digit = digit as i32 - '0' as i32;

                    match accumulated
                        .checked_mul(10)
                        .and_then(|n| n.checked_add(digit))
                    {
                        Some(result) => *accumulated = result,
                        None => break Err(LexerError::IntOverflow),
                    }
                }

                // Si sigue algo que no es un dígito, la constante ha terminado
                (Integer(integer), _) => break Ok(IntLiteral(*integer)),

                // Extensión de términos
                (Word(word), Some(c)) if is_word_char(c) => word.push(c),

                // Si sigue algo que no puede formar parte del término, ha terminado
                (Word(word), _) => match self::Keyword::from_str(word) {
                    Ok(keyword) => break Ok(Keyword(keyword)),
                    Err(()) => break Ok(Id(std::mem::take(word))),
                },

                // Literales de texto
                (Str(_), None) | (Str(_), Some('\n')) => {
                    break Err(LexerError::UnterminatedString)
                }

                (Str(string), Some('"')) => {
                    let string = std::mem::take(string);
                    self.state = Complete(StrLiteral(string));
                }

                (Str(string), Some('\\')) => {
                    let mut string = std::mem::take(string);
                    string.push('\\');
                    self.state = StrEscape(string);
                }

                (Str(string), Some(c)) => string.push(c),

                (StrEscape(_), None) | (StrEscape(_), Some('\n')) => {
                    break Err(LexerError::UnterminatedString)
                }

                (StrEscape(string), Some(c)) => {
                    let mut string = std::mem::take(string);
                    string.push(c);
                    self.state = Str(string);
                }
            }

            // Si no hubo `continue`, aquí se consume el carácter que
            // se observó con lookahead anteriormente
            if let Some(Ok((_, next_position))) = self.source.next() {
                last_accepted = std::mem::replace(&mut self.next, next_position);
            }
        };

        token.map(|token| Some((token, last_accepted)))
    }
}

impl<S: InputStream> Iterator for Lexer<S> {
    type Item = Result<Located<Token>, Located<LexerError>>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.lex() {
            Ok(None) => None,
            Ok(Some((token, last_accepted))) => {
                self.state = State::Start;

                let location = Location::span(self.start.clone(), &last_accepted);
                Some(Ok(Located::at(token, location)))
            }

            Err(error) => {
                self.state = State::Error;
                Some(Err(Located::at(error, self.next.clone())))
            }
        }
    }
}

/// Determina si un carácter puede pertenecer a un término.
fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}
